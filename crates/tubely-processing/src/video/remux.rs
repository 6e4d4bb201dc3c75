use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use super::tool::{run_tool, MediaToolError};

/// Sibling path the remuxed file is written to: `<input>.processing`.
pub fn remux_output_path(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(".processing");
    PathBuf::from(name)
}

/// Rewrites a container for progressive playback without re-encoding.
#[async_trait]
pub trait Remuxer: Send + Sync {
    async fn remux(&self, input: &Path, output: &Path) -> Result<(), MediaToolError>;
}

/// `Remuxer` backed by ffmpeg: stream copy with `-movflags faststart`.
#[derive(Debug, Clone)]
pub struct FfmpegRemuxer {
    ffmpeg_path: String,
    timeout: Duration,
}

impl FfmpegRemuxer {
    pub fn new(ffmpeg_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Remuxer for FfmpegRemuxer {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
    ))]
    async fn remux(&self, input: &Path, output: &Path) -> Result<(), MediaToolError> {
        let start = std::time::Instant::now();

        run_tool(
            &self.ffmpeg_path,
            [
                OsStr::new("-y"),
                OsStr::new("-i"),
                input.as_os_str(),
                OsStr::new("-c"),
                OsStr::new("copy"),
                OsStr::new("-movflags"),
                OsStr::new("faststart"),
                OsStr::new("-f"),
                OsStr::new("mp4"),
                output.as_os_str(),
            ],
            self.timeout,
        )
        .await?;

        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(MediaToolError::MissingOutput(output.to_path_buf()));
        }

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            "Faststart remux completed"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_is_sibling() {
        assert_eq!(
            remux_output_path(Path::new("/tmp/tubely-upload-abc.mp4")),
            PathBuf::from("/tmp/tubely-upload-abc.mp4.processing")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_remux_failure() {
        let remuxer = FfmpegRemuxer::new("false", Duration::from_secs(5));
        let err = remuxer
            .remux(Path::new("/tmp/in.mp4"), Path::new("/tmp/in.mp4.processing"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaToolError::Failed { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_remux_without_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.mp4.processing");
        let remuxer = FfmpegRemuxer::new("true", Duration::from_secs(5));
        let err = remuxer
            .remux(&dir.path().join("in.mp4"), &output)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaToolError::MissingOutput(p) if p == output));
    }
}

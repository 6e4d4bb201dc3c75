use std::ffi::OsStr;
use std::io;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;

const MAX_STDERR_CHARS: usize = 2048;

#[derive(Debug, thiserror::Error)]
pub enum MediaToolError {
    #[error("Failed to execute {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} timed out after {after:?}")]
    Timeout { tool: String, after: Duration },

    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Failed to parse tool output: {0}")]
    InvalidOutput(String),

    #[error("No video stream found")]
    NoVideoStream,

    #[error("Expected output file was not produced: {0:?}")]
    MissingOutput(PathBuf),
}

/// Run an external tool to completion, bounded by `timeout`.
///
/// The child is killed if the timeout fires or the calling future is dropped.
pub(crate) async fn run_tool<I, S>(
    program: &str,
    args: I,
    timeout: Duration,
) -> Result<Output, MediaToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let start = std::time::Instant::now();

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(timeout, child).await {
        Ok(result) => result.map_err(|source| MediaToolError::Spawn {
            tool: program.to_string(),
            source,
        })?,
        Err(_) => {
            tracing::warn!(
                tool = %program,
                timeout_secs = timeout.as_secs_f64(),
                "Media tool timed out"
            );
            return Err(MediaToolError::Timeout {
                tool: program.to_string(),
                after: timeout,
            });
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MediaToolError::Failed {
            tool: program.to_string(),
            status: output.status.to_string(),
            stderr: stderr.trim().chars().take(MAX_STDERR_CHARS).collect(),
        });
    }

    tracing::debug!(
        tool = %program,
        duration_ms = start.elapsed().as_millis(),
        "Media tool finished"
    );

    Ok(output)
}

//! Scratch staging for uploads.
//!
//! The probe and remux steps need a real file on disk, so the inbound stream is
//! copied into a per-request scratch file first. Every path the request creates is
//! registered with a [`ScratchSpace`], which deletes them all when dropped.

use std::io;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWrite, AsyncWriteExt};

const SCRATCH_PREFIX: &str = "tubely-upload-";
const COPY_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("Upload exceeds the maximum size of {max} bytes")]
    TooLarge { max: u64 },

    #[error("Failed to create scratch file in {dir}: {source}")]
    Create {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error while staging upload: {0}")]
    Io(#[from] io::Error),
}

/// Owns the scratch files of one request and removes them on drop.
#[derive(Debug)]
pub struct ScratchSpace {
    dir: PathBuf,
    paths: Vec<PathBuf>,
}

impl ScratchSpace {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            paths: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Register a path for deletion. The file does not have to exist yet.
    pub fn track(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl Drop for ScratchSpace {
    fn drop(&mut self) {
        for path in self.paths.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::debug!(path = %path.display(), "Removed scratch file"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(
                    error = %e,
                    path = %path.display(),
                    "Failed to remove scratch file"
                ),
            }
        }
    }
}

/// Chunked copy that fails once more than `max_bytes` have been read. Flushes `writer`.
pub(crate) async fn copy_limited<R, W>(
    reader: &mut R,
    writer: &mut W,
    max_bytes: u64,
) -> Result<u64, StagingError>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut size: u64 = 0;

    loop {
        let read = reader.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        size += read as u64;
        if size > max_bytes {
            return Err(StagingError::TooLarge { max: max_bytes });
        }
        writer.write_all(&buffer[..read]).await?;
    }

    writer.flush().await?;
    Ok(size)
}

/// A fully written scratch copy of the upload, rewound to the start.
#[derive(Debug)]
pub struct StagedFile {
    pub path: PathBuf,
    pub size: u64,
    pub file: tokio::fs::File,
}

/// Copy `reader` into a new scratch file named `tubely-upload-*.{extension}`.
///
/// The copy is chunked and stops with [`StagingError::TooLarge`] as soon as more
/// than `max_bytes` have been read. The scratch path is tracked before any byte is
/// written, so a failed copy is cleaned up with the rest of the request.
pub async fn stage_upload<R>(
    scratch: &mut ScratchSpace,
    reader: &mut R,
    extension: &str,
    max_bytes: u64,
) -> Result<StagedFile, StagingError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let suffix = format!(".{}", extension);
    let named = tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .suffix(&suffix)
        .tempfile_in(scratch.dir())
        .map_err(|source| StagingError::Create {
            dir: scratch.dir().to_path_buf(),
            source,
        })?;
    let (std_file, path) = named.keep().map_err(|e| StagingError::Io(e.error))?;
    scratch.track(path.clone());

    let mut file = tokio::fs::File::from_std(std_file);
    let size = copy_limited(reader, &mut file, max_bytes).await?;
    file.seek(io::SeekFrom::Start(0)).await?;

    tracing::debug!(path = %path.display(), size_bytes = size, "Upload staged");

    Ok(StagedFile { path, size, file })
}

//! In-memory stand-ins for the database, object store and media tools.

use std::collections::HashMap;
use std::path::Path;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tubely_core::{AppError, StorageBackend, Video};
use tubely_db::VideoRepository;
use tubely_processing::{MediaToolError, Remuxer, VideoDimensions, VideoProber};
use tubely_storage::{Storage, StorageError, StorageResult};
use uuid::Uuid;

/// Video records keyed by id.
#[derive(Default)]
pub struct MemoryVideos {
    videos: Mutex<HashMap<Uuid, Video>>,
    fail_updates: bool,
    updates: AtomicUsize,
}

impl MemoryVideos {
    pub fn failing_updates(mut self) -> Self {
        self.fail_updates = true;
        self
    }

    pub fn insert(&self, video: Video) {
        self.videos.lock().unwrap().insert(video.id, video);
    }

    pub fn find(&self, id: Uuid) -> Option<Video> {
        self.videos.lock().unwrap().get(&id).cloned()
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoRepository for MemoryVideos {
    async fn get(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        Ok(self.find(id))
    }

    async fn update(&self, video: &Video) -> Result<(), AppError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates {
            return Err(AppError::Internal("connection reset".to_string()));
        }
        let mut videos = self.videos.lock().unwrap();
        match videos.get_mut(&video.id) {
            Some(existing) => {
                *existing = video.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Video {} not found", video.id))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub content_type: String,
    pub content_length: Option<u64>,
    pub data: Vec<u8>,
}

/// Object store that keeps everything in a map and builds S3-style URLs.
pub struct MemoryStorage {
    bucket: String,
    region: String,
    fail: bool,
    objects: Mutex<HashMap<String, StoredObject>>,
    puts: AtomicUsize,
}

impl MemoryStorage {
    pub fn new(bucket: &str, region: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            region: region.to_string(),
            fail: false,
            objects: Mutex::new(HashMap::new()),
            puts: AtomicUsize::new(0),
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn objects(&self) -> HashMap<String, StoredObject> {
        self.objects.lock().unwrap().clone()
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn put_stream(
        &self,
        key: &str,
        content_type: &str,
        content_length: Option<u64>,
        mut reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(StorageError::UploadFailed("access denied".to_string()));
        }
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                content_type: content_type.to_string(),
                content_length,
                data,
            },
        );
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.bucket, self.region, key
        )
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

/// Reports fixed dimensions, or "no video stream" when none are set.
pub struct FixedProber {
    dimensions: Option<VideoDimensions>,
    calls: AtomicUsize,
}

impl FixedProber {
    pub fn new(dimensions: Option<VideoDimensions>) -> Self {
        Self {
            dimensions,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn landscape() -> Self {
        Self::new(Some(VideoDimensions {
            width: 1920,
            height: 1080,
        }))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoProber for FixedProber {
    async fn probe(&self, path: &Path) -> Result<VideoDimensions, MediaToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(path.exists(), "probed file must be staged on disk");
        self.dimensions.ok_or(MediaToolError::NoVideoStream)
    }
}

/// Copies input to output and appends a marker, like a faststart rewrite would change bytes.
#[derive(Default)]
pub struct CopyRemuxer {
    fail: bool,
    calls: AtomicUsize,
}

pub const REMUX_MARKER: &[u8] = b"+faststart";

impl CopyRemuxer {
    /// Leaves a truncated output behind and reports an ffmpeg failure.
    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Remuxer for CopyRemuxer {
    async fn remux(&self, input: &Path, output: &Path) -> Result<(), MediaToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            tokio::fs::write(output, b"partial")
                .await
                .map_err(|_| MediaToolError::MissingOutput(output.to_path_buf()))?;
            return Err(MediaToolError::Failed {
                tool: "ffmpeg".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "moov atom not found".to_string(),
            });
        }
        let mut data = tokio::fs::read(input)
            .await
            .map_err(|_| MediaToolError::MissingOutput(input.to_path_buf()))?;
        data.extend_from_slice(REMUX_MARKER);
        tokio::fs::write(output, data)
            .await
            .map_err(|_| MediaToolError::MissingOutput(output.to_path_buf()))?;
        Ok(())
    }
}

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::AsyncRead;
use tubely_core::{models::Video, AppError, Config};
use tubely_db::VideoRepository;
use tubely_storage::asset_file_name;

use super::pipeline::IncomingUpload;
use crate::staging::{copy_limited, StagingError};
use crate::validator::MediaTypeValidator;

/// Writes thumbnails under the assets root and points the video at them.
///
/// Files are served by the API under `/assets`, so the URL is
/// `{assets_base_url}/{id}.{ext}`.
pub struct ThumbnailUploader {
    validator: MediaTypeValidator,
    assets_root: PathBuf,
    assets_base_url: String,
    max_upload_bytes: u64,
    videos: Arc<dyn VideoRepository>,
}

impl ThumbnailUploader {
    pub fn new(
        validator: MediaTypeValidator,
        assets_root: PathBuf,
        assets_base_url: String,
        max_upload_bytes: u64,
        videos: Arc<dyn VideoRepository>,
    ) -> Self {
        Self {
            validator,
            assets_root,
            assets_base_url,
            max_upload_bytes,
            videos,
        }
    }

    pub fn from_config(config: &Config, videos: Arc<dyn VideoRepository>) -> Self {
        Self::new(
            MediaTypeValidator::new(config.media.thumbnail_allowed_content_types.clone()),
            config.media.assets_root.clone(),
            format!("http://localhost:{}/assets", config.base.server_port),
            config.media.max_thumbnail_size_bytes as u64,
            videos,
        )
    }

    #[tracing::instrument(skip(self, video, upload), fields(video_id = %video.id, user_id = %video.user_id))]
    pub async fn run<R>(
        &self,
        mut video: Video,
        mut upload: IncomingUpload<R>,
    ) -> Result<Video, AppError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let media_type = self
            .validator
            .validate(upload.content_type.as_deref())
            .map_err(|e| AppError::InvalidMediaType(e.to_string()))?;

        tokio::fs::create_dir_all(&self.assets_root).await?;

        let file_name = asset_file_name(&media_type.extension);
        let path = self.assets_root.join(&file_name);
        let mut file = tokio::fs::File::create(&path).await?;

        let size = match copy_limited(&mut upload.reader, &mut file, self.max_upload_bytes).await {
            Ok(size) => size,
            Err(e) => {
                drop(file);
                if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                    tracing::warn!(
                        error = %remove_err,
                        path = %path.display(),
                        "Failed to remove partial thumbnail"
                    );
                }
                return Err(match e {
                    StagingError::TooLarge { .. } => AppError::PayloadTooLarge(e.to_string()),
                    other => AppError::Internal(format!("Failed to write thumbnail: {}", other)),
                });
            }
        };

        let url = format!("{}/{}", self.assets_base_url.trim_end_matches('/'), file_name);
        video.set_thumbnail_url(url);
        self.videos
            .update(&video)
            .await
            .map_err(|e| AppError::RecordUpdateFailed(e.to_string()))?;

        tracing::info!(
            path = %path.display(),
            size_bytes = size,
            "Thumbnail stored"
        );

        Ok(video)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use tempfile::tempdir;
    use tubely_core::ErrorMetadata;
    use uuid::Uuid;

    #[derive(Default)]
    struct MemoryVideos {
        updates: Mutex<Vec<Video>>,
    }

    #[async_trait]
    impl VideoRepository for MemoryVideos {
        async fn get(&self, _id: Uuid) -> Result<Option<Video>, AppError> {
            Ok(None)
        }

        async fn update(&self, video: &Video) -> Result<(), AppError> {
            self.updates.lock().unwrap().push(video.clone());
            Ok(())
        }
    }

    fn video() -> Video {
        let now = Utc::now();
        Video {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Boots".to_string(),
            description: Some("A pair of boots".to_string()),
            thumbnail_url: None,
            video_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn uploader(root: PathBuf, videos: Arc<MemoryVideos>) -> ThumbnailUploader {
        ThumbnailUploader::new(
            MediaTypeValidator::new(vec!["image/jpeg".to_string(), "image/png".to_string()]),
            root,
            "http://localhost:8091/assets".to_string(),
            1024,
            videos,
        )
    }

    #[tokio::test]
    async fn test_thumbnail_written_and_url_set() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("assets");
        let videos = Arc::new(MemoryVideos::default());
        let uploader = uploader(root.clone(), videos.clone());

        let updated = uploader
            .run(
                video(),
                IncomingUpload {
                    content_type: Some("image/png".to_string()),
                    reader: std::io::Cursor::new(b"png bytes".to_vec()),
                },
            )
            .await
            .unwrap();

        let url = updated.thumbnail_url.clone().unwrap();
        let file_name = url
            .strip_prefix("http://localhost:8091/assets/")
            .unwrap()
            .to_string();
        assert!(file_name.ends_with(".png"));
        assert_eq!(std::fs::read(root.join(&file_name)).unwrap(), b"png bytes");
        assert_eq!(videos.updates.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_non_image() {
        let dir = tempdir().unwrap();
        let videos = Arc::new(MemoryVideos::default());
        let uploader = uploader(dir.path().to_path_buf(), videos.clone());

        let err = uploader
            .run(
                video(),
                IncomingUpload {
                    content_type: Some("video/mp4".to_string()),
                    reader: std::io::Cursor::new(b"mp4".to_vec()),
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.http_status_code(), 400);
        assert!(videos.updates.lock().unwrap().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_oversized_thumbnail_removed() {
        let dir = tempdir().unwrap();
        let videos = Arc::new(MemoryVideos::default());
        let uploader = uploader(dir.path().to_path_buf(), videos.clone());

        let err = uploader
            .run(
                video(),
                IncomingUpload {
                    content_type: Some("image/jpeg".to_string()),
                    reader: std::io::Cursor::new(vec![0u8; 4096]),
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.http_status_code(), 413);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert!(videos.updates.lock().unwrap().is_empty());
    }
}

//! Video upload pipeline: validate → stage → probe → remux → key → upload → record.
//!
//! Stages run strictly in order for one request. The first failure aborts the
//! rest, and every scratch file is removed on the way out regardless of outcome.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::AsyncRead;
use tubely_core::{models::Video, AppError, Config};
use tubely_db::VideoRepository;
use tubely_storage::{video_storage_key, Storage, StorageError};

use crate::staging::{stage_upload, ScratchSpace, StagingError};
use crate::validator::{MediaTypeValidator, ValidationError};
use crate::video::{remux_output_path, MediaToolError, Remuxer, VideoProber};

/// Position of a request in the upload pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Validating,
    Staging,
    Probing,
    Remuxing,
    KeyDerivation,
    Uploading,
    RecordUpdating,
    Done,
}

impl Display for UploadStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            UploadStage::Validating => "validating",
            UploadStage::Staging => "staging",
            UploadStage::Probing => "probing",
            UploadStage::Remuxing => "remuxing",
            UploadStage::KeyDerivation => "key_derivation",
            UploadStage::Uploading => "uploading",
            UploadStage::RecordUpdating => "record_updating",
            UploadStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Why a pipeline run failed. Each variant belongs to exactly one stage.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    InvalidMediaType(ValidationError),

    #[error(transparent)]
    Staging(StagingError),

    #[error("Probe failed: {0}")]
    Probe(#[source] MediaToolError),

    #[error("Remux failed: {0}")]
    Remux(#[source] MediaToolError),

    #[error("Store upload failed: {0}")]
    StoreUpload(#[source] StorageError),

    #[error("Record update failed: {0}")]
    RecordUpdate(#[source] AppError),
}

impl PipelineError {
    pub fn stage(&self) -> UploadStage {
        match self {
            PipelineError::InvalidMediaType(_) => UploadStage::Validating,
            PipelineError::Staging(_) => UploadStage::Staging,
            PipelineError::Probe(_) => UploadStage::Probing,
            PipelineError::Remux(_) => UploadStage::Remuxing,
            PipelineError::StoreUpload(_) => UploadStage::Uploading,
            PipelineError::RecordUpdate(_) => UploadStage::RecordUpdating,
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidMediaType(e) => AppError::InvalidMediaType(e.to_string()),
            PipelineError::Staging(e @ StagingError::TooLarge { .. }) => {
                AppError::PayloadTooLarge(e.to_string())
            }
            PipelineError::Staging(e) => AppError::StagingFailed(e.to_string()),
            PipelineError::Probe(e) => AppError::ProbeFailed(e.to_string()),
            PipelineError::Remux(e) => AppError::RemuxFailed(e.to_string()),
            PipelineError::StoreUpload(e) => AppError::StoreUploadFailed(e.to_string()),
            PipelineError::RecordUpdate(e) => AppError::RecordUpdateFailed(e.to_string()),
        }
    }
}

/// A file part as received: the declared content type plus its byte stream.
pub struct IncomingUpload<R> {
    pub content_type: Option<String>,
    pub reader: R,
}

/// Runs one video upload end to end. Holds no per-request state.
pub struct UploadPipeline {
    validator: MediaTypeValidator,
    scratch_dir: PathBuf,
    max_upload_bytes: u64,
    prober: Arc<dyn VideoProber>,
    remuxer: Arc<dyn Remuxer>,
    storage: Arc<dyn Storage>,
    videos: Arc<dyn VideoRepository>,
}

impl UploadPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        validator: MediaTypeValidator,
        scratch_dir: PathBuf,
        max_upload_bytes: u64,
        prober: Arc<dyn VideoProber>,
        remuxer: Arc<dyn Remuxer>,
        storage: Arc<dyn Storage>,
        videos: Arc<dyn VideoRepository>,
    ) -> Self {
        Self {
            validator,
            scratch_dir,
            max_upload_bytes,
            prober,
            remuxer,
            storage,
            videos,
        }
    }

    /// Build from configuration; the collaborators are supplied by the caller.
    pub fn from_config(
        config: &Config,
        prober: Arc<dyn VideoProber>,
        remuxer: Arc<dyn Remuxer>,
        storage: Arc<dyn Storage>,
        videos: Arc<dyn VideoRepository>,
    ) -> Self {
        Self::new(
            MediaTypeValidator::new(config.media.video_allowed_content_types.clone()),
            config.scratch_dir(),
            config.media.max_video_size_bytes as u64,
            prober,
            remuxer,
            storage,
            videos,
        )
    }

    /// Run every stage for `video`, returning the record with its new `video_url`.
    ///
    /// The caller has already authenticated the user and checked ownership.
    #[tracing::instrument(skip(self, video, upload), fields(video_id = %video.id, user_id = %video.user_id))]
    pub async fn run<R>(
        &self,
        mut video: Video,
        mut upload: IncomingUpload<R>,
    ) -> Result<Video, PipelineError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let start = std::time::Instant::now();
        let mut scratch = ScratchSpace::new(&self.scratch_dir);

        let result = self.execute(&mut scratch, &mut video, &mut upload).await;
        drop(scratch);

        match result {
            Ok(()) => {
                enter(UploadStage::Done);
                tracing::info!(
                    duration_ms = start.elapsed().as_millis(),
                    video_url = video.video_url.as_deref().unwrap_or_default(),
                    "Video upload completed"
                );
                Ok(video)
            }
            Err(e) => {
                tracing::warn!(
                    stage = %e.stage(),
                    error = %e,
                    duration_ms = start.elapsed().as_millis(),
                    "Video upload failed"
                );
                Err(e)
            }
        }
    }

    async fn execute<R>(
        &self,
        scratch: &mut ScratchSpace,
        video: &mut Video,
        upload: &mut IncomingUpload<R>,
    ) -> Result<(), PipelineError>
    where
        R: AsyncRead + Unpin + Send,
    {
        enter(UploadStage::Validating);
        let media_type = self
            .validator
            .validate(upload.content_type.as_deref())
            .map_err(PipelineError::InvalidMediaType)?;

        enter(UploadStage::Staging);
        let staged = stage_upload(
            scratch,
            &mut upload.reader,
            &media_type.extension,
            self.max_upload_bytes,
        )
        .await
        .map_err(PipelineError::Staging)?;
        let staged_path = staged.path;
        drop(staged.file);

        enter(UploadStage::Probing);
        let dimensions = self
            .prober
            .probe(&staged_path)
            .await
            .map_err(PipelineError::Probe)?;
        let aspect = dimensions.aspect_ratio();

        enter(UploadStage::Remuxing);
        let remuxed_path = remux_output_path(&staged_path);
        scratch.track(remuxed_path.clone());
        self.remuxer
            .remux(&staged_path, &remuxed_path)
            .await
            .map_err(PipelineError::Remux)?;

        enter(UploadStage::KeyDerivation);
        let key = video_storage_key(aspect, &media_type.extension);
        tracing::debug!(storage_key = %key, aspect = %aspect, "Storage key derived");

        enter(UploadStage::Uploading);
        let file = tokio::fs::File::open(&remuxed_path)
            .await
            .map_err(|e| PipelineError::StoreUpload(StorageError::IoError(e)))?;
        let content_length = file.metadata().await.ok().map(|m| m.len());
        self.storage
            .put_stream(&key, &media_type.declared, content_length, Box::pin(file))
            .await
            .map_err(PipelineError::StoreUpload)?;

        enter(UploadStage::RecordUpdating);
        video.set_video_url(self.storage.public_url(&key));
        self.videos
            .update(video)
            .await
            .map_err(PipelineError::RecordUpdate)?;

        Ok(())
    }
}

fn enter(stage: UploadStage) {
    tracing::debug!(stage = %stage, "Upload stage");
}

//! Tubely Processing Library
//!
//! The media ingestion pipeline: content-type validation, scratch staging,
//! geometry probing (ffprobe), faststart remuxing (ffmpeg) and the sequential
//! upload pipeline that ties them to storage and the video repository.

pub mod staging;
pub mod upload;
pub mod validator;
pub mod video;

pub use staging::{stage_upload, ScratchSpace, StagedFile, StagingError};
pub use upload::{IncomingUpload, PipelineError, ThumbnailUploader, UploadPipeline, UploadStage};
pub use validator::{normalize_mime_type, AcceptedMediaType, MediaTypeValidator, ValidationError};
pub use video::{
    remux_output_path, FfmpegRemuxer, FfprobeProber, MediaToolError, Remuxer, VideoDimensions,
    VideoProber,
};

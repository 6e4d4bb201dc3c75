//! Upload flows for videos and thumbnails.

mod pipeline;
mod thumbnail;

pub use pipeline::{IncomingUpload, PipelineError, UploadPipeline, UploadStage};
pub use thumbnail::ThumbnailUploader;

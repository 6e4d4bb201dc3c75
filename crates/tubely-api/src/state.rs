//! Application state shared by every handler.

use std::sync::Arc;

use tubely_core::Config;
use tubely_db::VideoRepository;
use tubely_processing::{ThumbnailUploader, UploadPipeline};
use tubely_storage::Storage;

use crate::auth::JwtService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub jwt: Arc<JwtService>,
    pub videos: Arc<dyn VideoRepository>,
    pub storage: Arc<dyn Storage>,
    pub pipeline: Arc<UploadPipeline>,
    pub thumbnails: Arc<ThumbnailUploader>,
}

impl AppState {
    /// Wire the upload pipeline and thumbnail uploader from their collaborators.
    pub fn new(
        config: Config,
        videos: Arc<dyn VideoRepository>,
        storage: Arc<dyn Storage>,
        prober: Arc<dyn tubely_processing::VideoProber>,
        remuxer: Arc<dyn tubely_processing::Remuxer>,
    ) -> Self {
        let pipeline = UploadPipeline::from_config(
            &config,
            prober,
            remuxer,
            storage.clone(),
            videos.clone(),
        );
        let thumbnails = ThumbnailUploader::from_config(&config, videos.clone());

        Self {
            jwt: Arc::new(JwtService::new(&config.base.jwt_secret)),
            config: Arc::new(config),
            videos,
            storage,
            pipeline: Arc::new(pipeline),
            thumbnails: Arc::new(thumbnails),
        }
    }
}

//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;

use std::sync::Arc;

use anyhow::{Context, Result};
use tubely_core::Config;
use tubely_db::PgVideoRepository;
use tubely_processing::{FfmpegRemuxer, FfprobeProber};

use crate::state::AppState;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_tracing().context("Failed to initialize tracing")?;
    tracing::info!(
        environment = %config.base.environment,
        "Configuration loaded and validated successfully"
    );

    let pool = database::setup_database(&config).await?;
    let storage = storage::setup_storage(&config).await?;
    storage::ensure_directories(&config).await?;

    let timeout = config.media_tool_timeout();
    let prober = Arc::new(FfprobeProber::new(config.media.ffprobe_path.clone(), timeout));
    let remuxer = Arc::new(FfmpegRemuxer::new(config.media.ffmpeg_path.clone(), timeout));
    let videos = Arc::new(PgVideoRepository::new(pool));

    let state = Arc::new(AppState::new(config, videos, storage, prober, remuxer));
    let router = routes::build_router(state.clone())?;

    Ok((state, router))
}

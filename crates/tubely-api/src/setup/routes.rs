//! Route configuration and setup

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tubely_core::Config;

use crate::handlers;
use crate::middleware::{error_details_middleware, ErrorDetailsConfig};
use crate::state::AppState;

/// Room for multipart boundaries and part headers on top of the largest file.
const MULTIPART_OVERHEAD_BYTES: usize = 16 * 1024 * 1024;

/// Build the application router. Tests drive this directly.
pub fn build_router(state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let config = state.config.clone();
    let cors = setup_cors(&config)?;
    let error_details = Arc::new(ErrorDetailsConfig::from_config(&config));

    // The stager enforces the per-upload ceiling; this only bounds the raw body.
    let body_limit = config
        .media
        .max_video_size_bytes
        .max(config.media.max_thumbnail_size_bytes)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    let upload_routes = Router::new()
        .route(
            "/api/videos/{video_id}/upload",
            post(handlers::video_upload::upload_video),
        )
        .route(
            "/api/thumbnail_upload/{video_id}",
            post(handlers::thumbnail_upload::upload_thumbnail),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit));

    let app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(upload_routes)
        .nest_service("/assets", ServeDir::new(&config.media.assets_root))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(axum::middleware::from_fn_with_state(
                    error_details,
                    error_details_middleware,
                )),
        )
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    let cors = if config.base.cors_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .base
            .cors_origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}

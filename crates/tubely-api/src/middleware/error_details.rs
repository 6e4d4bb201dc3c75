use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tubely_core::Config;

use crate::error::DetailedError;

/// Whether error responses may carry `details` and `error_type`
#[derive(Clone, Debug)]
pub struct ErrorDetailsConfig {
    pub is_production: bool,
}

impl ErrorDetailsConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            is_production: config.is_production(),
        }
    }
}

/// Error details middleware
/// Swaps in the detailed error body outside production
pub async fn error_details_middleware(
    State(config): State<Arc<ErrorDetailsConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let Some(DetailedError(body)) = response.extensions_mut().remove::<DetailedError>() else {
        return response;
    };
    if config.is_production {
        return response;
    }

    (response.status(), Json(body)).into_response()
}

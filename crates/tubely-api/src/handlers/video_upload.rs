use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    Json,
};
use tubely_core::{models::VideoResponse, AppError};
use uuid::Uuid;

use super::{incoming_upload, load_owned_video};
use crate::auth::AuthUser;
use crate::error::HttpAppError;
use crate::state::AppState;

const VIDEO_FIELD: &str = "video";

/// `POST /api/videos/{video_id}/upload`
///
/// The id is parsed before authentication, and ownership is checked before the
/// body is read, so a rejected request never touches scratch space.
#[tracing::instrument(skip_all, fields(video_id = %video_id))]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    auth: Result<AuthUser, HttpAppError>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VideoResponse>, HttpAppError> {
    let video_id = Uuid::parse_str(&video_id)?;
    let auth = auth?;
    let video = load_owned_video(&state, video_id, auth.user_id).await?;

    tracing::info!(user_id = %auth.user_id, "Uploading video");

    let mut multipart = multipart?;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }

        let updated = state.pipeline.run(video, incoming_upload(field)).await?;
        return Ok(Json(VideoResponse::from(updated)));
    }

    Err(AppError::InvalidInput(format!("Missing '{}' form field", VIDEO_FIELD)).into())
}

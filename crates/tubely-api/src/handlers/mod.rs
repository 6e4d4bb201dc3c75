pub mod health;
pub mod thumbnail_upload;
pub mod video_upload;

use std::io;

use axum::extract::multipart::Field;
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use tubely_core::{models::Video, AppError};
use tubely_processing::IncomingUpload;
use uuid::Uuid;

use crate::state::AppState;

/// Load the video and check that `user_id` owns it.
pub(crate) async fn load_owned_video(
    state: &AppState,
    video_id: Uuid,
    user_id: Uuid,
) -> Result<Video, AppError> {
    let video = state
        .videos
        .get(video_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;

    if !video.is_owned_by(user_id) {
        return Err(AppError::Forbidden(
            "You don't own this video".to_string(),
        ));
    }

    Ok(video)
}

/// Adapt a multipart field into a streaming upload without buffering it.
pub(crate) fn incoming_upload(
    field: Field<'_>,
) -> IncomingUpload<impl tokio::io::AsyncRead + Unpin + Send + '_> {
    let content_type = field.content_type().map(str::to_string);
    let stream = Box::pin(field.map_err(io::Error::other));

    IncomingUpload {
        content_type,
        reader: StreamReader::new(stream),
    }
}

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

use super::auth::AdminSession;
use super::error::ApiError;

/// Multipart field carrying the image
const FILE_FIELD: &str = "file";

/// Headroom over the image limit for multipart framing
pub const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
    pub filename: String,
}

fn multipart_error(err: MultipartError, limit_bytes: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::validation_field(
            "file",
            format!("File size exceeds {}MB limit", limit_bytes / (1024 * 1024)),
        );
    }
    ApiError::bad_request(err.body_text())
}

/// Upload a portfolio image
///
/// POST /api/upload (multipart, field `file`)
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    _session: AdminSession,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let limit = state.images.max_bytes();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        state.images.check_type(&content_type)?;

        let data = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
        let stored = state
            .images
            .save(file_name.as_deref(), &content_type, &data)
            .await?;

        return Ok(Json(UploadResponse {
            success: true,
            url: stored.url,
            filename: stored.filename,
        }));
    }

    Err(ApiError::bad_request("No file provided"))
}

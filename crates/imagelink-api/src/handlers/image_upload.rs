use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use imagelink_core::models::Image;
use imagelink_services::ByteSource;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::extract_multipart_file;

/// Upload image handler
///
/// Reads the `file` field of the multipart body, stores it at the rendering
/// provider under a fresh id and records the returned canonical locator.
///
/// # Errors
/// - `InvalidParameter` - missing file, empty filename or disallowed extension
/// - `PayloadTooLarge` - file exceeds the configured size limit
/// - `UpstreamStoreFailure` - provider or metadata store failure
#[utoipa::path(
    post,
    path = "/api/v1/upload",
    tag = "images",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Image uploaded successfully", body = Image),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 502, description = "Upstream store failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_image"))]
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let (data, filename) = extract_multipart_file(multipart).await?;
    tracing::debug!(filename = %filename, size_bytes = data.len(), "Multipart file received");

    let source: ByteSource = Box::pin(Cursor::new(data));
    let image = state.image_service.upload(source, &filename).await?;

    Ok((StatusCode::CREATED, Json(image)))
}

//! Transform endpoints
//!
//! Each endpoint hands the image id and its body to the orchestrator, which
//! looks the image up before the body's parameters are parsed, and answers
//! with the composed delivery URL. Nothing is stored and no image bytes are
//! read.

pub mod requests;

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

pub use requests::{
    CompressRequest, ConvertRequest, CropRequest, FilterRequest, FlipRequest, ResizeRequest,
    RotateRequest, TransformBody, TransformResponse, WatermarkRequest,
};

async fn run_transform<B>(
    state: &AppState,
    body: B,
) -> Result<Json<TransformResponse>, HttpAppError>
where
    B: TransformBody + Send,
{
    let id = body.image_id();
    let url = state
        .image_service
        .transform_with(id, move || body.into_operation())
        .await?;
    Ok(Json(TransformResponse {
        url: url.into_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/resize",
    tag = "transform",
    request_body = ResizeRequest,
    responses(
        (status = 200, description = "Composed URL", body = TransformResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 404, description = "Image not found", body = ErrorResponse)
    )
)]
pub async fn resize(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<ResizeRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    run_transform(&state, body).await
}

#[utoipa::path(
    post,
    path = "/api/v1/convert",
    tag = "transform",
    request_body = ConvertRequest,
    responses(
        (status = 200, description = "Composed URL", body = TransformResponse),
        (status = 400, description = "Invalid format", body = ErrorResponse),
        (status = 404, description = "Image not found", body = ErrorResponse)
    )
)]
pub async fn convert(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<ConvertRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    run_transform(&state, body).await
}

#[utoipa::path(
    post,
    path = "/api/v1/filter",
    tag = "transform",
    request_body = FilterRequest,
    responses(
        (status = 200, description = "Composed URL", body = TransformResponse),
        (status = 400, description = "Unsupported filter", body = ErrorResponse),
        (status = 404, description = "Image not found", body = ErrorResponse)
    )
)]
pub async fn filter(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<FilterRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    run_transform(&state, body).await
}

#[utoipa::path(
    post,
    path = "/api/v1/crop",
    tag = "transform",
    request_body = CropRequest,
    responses(
        (status = 200, description = "Composed URL", body = TransformResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 404, description = "Image not found", body = ErrorResponse)
    )
)]
pub async fn crop(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<CropRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    run_transform(&state, body).await
}

#[utoipa::path(
    post,
    path = "/api/v1/rotate",
    tag = "transform",
    request_body = RotateRequest,
    responses(
        (status = 200, description = "Composed URL", body = TransformResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 404, description = "Image not found", body = ErrorResponse)
    )
)]
pub async fn rotate(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<RotateRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    run_transform(&state, body).await
}

#[utoipa::path(
    post,
    path = "/api/v1/flip",
    tag = "transform",
    request_body = FlipRequest,
    responses(
        (status = 200, description = "Composed URL", body = TransformResponse),
        (status = 400, description = "Invalid flip axis", body = ErrorResponse),
        (status = 404, description = "Image not found", body = ErrorResponse)
    )
)]
pub async fn flip(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<FlipRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    run_transform(&state, body).await
}

#[utoipa::path(
    post,
    path = "/api/v1/watermark",
    tag = "transform",
    request_body = WatermarkRequest,
    responses(
        (status = 200, description = "Composed URL", body = TransformResponse),
        (status = 400, description = "Missing or invalid overlay", body = ErrorResponse),
        (status = 404, description = "Image not found", body = ErrorResponse)
    )
)]
pub async fn watermark(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<WatermarkRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    run_transform(&state, body).await
}

#[utoipa::path(
    post,
    path = "/api/v1/compress",
    tag = "transform",
    request_body = CompressRequest,
    responses(
        (status = 200, description = "Composed URL", body = TransformResponse),
        (status = 400, description = "Invalid quality", body = ErrorResponse),
        (status = 404, description = "Image not found", body = ErrorResponse)
    )
)]
pub async fn compress(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<CompressRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    run_transform(&state, body).await
}

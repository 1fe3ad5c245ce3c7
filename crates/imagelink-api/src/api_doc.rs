//! OpenAPI documentation.
//! Paths in handler annotations carry the full versioned prefix (`crate::constants::API_PREFIX`).

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use imagelink_core::models;

/// Returns the OpenAPI document served next to the RapiDoc UI.
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "imagelink API",
        version = "0.1.0",
        description = "Image delivery API. Originals are stored at a rendering provider; transform endpoints answer with a delivery URL carrying one transformation directive. All endpoints are versioned under /api/v1/."
    ),
    paths(
        // Images
        handlers::image_upload::upload_image,
        handlers::image_get::get_image,
        // Transformations
        handlers::transform::resize,
        handlers::transform::convert,
        handlers::transform::filter,
        handlers::transform::crop,
        handlers::transform::rotate,
        handlers::transform::flip,
        handlers::transform::watermark,
        handlers::transform::compress,
        // Health
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::Image,
            handlers::transform::ResizeRequest,
            handlers::transform::ConvertRequest,
            handlers::transform::FilterRequest,
            handlers::transform::CropRequest,
            handlers::transform::RotateRequest,
            handlers::transform::FlipRequest,
            handlers::transform::WatermarkRequest,
            handlers::transform::CompressRequest,
            handlers::transform::TransformResponse,
            handlers::health::HealthResponse,
            // Error
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "images", description = "Image upload and metadata"),
        (name = "transform", description = "Delivery URLs for transformed variants"),
        (name = "health", description = "Liveness checks")
    )
)]
pub struct ApiDoc;

//! Route table and HTTP middleware

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use imagelink_core::Config;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::api_doc::get_openapi_spec;
use crate::constants::{API_PREFIX, MULTIPART_OVERHEAD_BYTES, OPENAPI_JSON_PATH};
use crate::handlers;
use crate::state::AppState;

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload", post(handlers::image_upload::upload_image))
        .route("/images/{id}", get(handlers::image_get::get_image))
        .route("/resize", post(handlers::transform::resize))
        .route("/convert", post(handlers::transform::convert))
        .route("/filter", post(handlers::transform::filter))
        .route("/crop", post(handlers::transform::crop))
        .route("/rotate", post(handlers::transform::rotate))
        .route("/flip", post(handlers::transform::flip))
        .route("/watermark", post(handlers::transform::watermark))
        .route("/compress", post(handlers::transform::compress))
}

/// Application routes with body limits and API docs, without CORS or tracing.
///
/// Tests drive this router directly against in-memory collaborators.
pub fn app_router(state: Arc<AppState>) -> Router {
    let body_limit = state.max_file_size_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .nest(API_PREFIX, api_routes())
        .route("/health", get(handlers::health::health_check))
        .merge(
            utoipa_rapidoc::RapiDoc::with_openapi(OPENAPI_JSON_PATH, get_openapi_spec())
                .path("/docs"),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(state)
}

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;

    let app = app_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}

//! Service and repository wiring

use std::sync::Arc;

use anyhow::{Context, Result};
use imagelink_core::Config;
use imagelink_services::{create_provider, ImageRepository, ImageService, UploadLimits};
use sqlx::PgPool;

use crate::state::AppState;

/// Build the rendering provider, the metadata repository and the image service.
pub async fn initialize_services(config: &Config, pool: PgPool) -> Result<Arc<AppState>> {
    let provider = create_provider(config)
        .await
        .context("Failed to initialize rendering provider")?;
    tracing::info!(backend = %provider.backend_type(), "Rendering provider initialized");

    let repository = Arc::new(ImageRepository::new(pool));
    let image_service =
        ImageService::with_default_encoder(repository, provider, UploadLimits::from_config(config));

    Ok(Arc::new(AppState::new(image_service)))
}

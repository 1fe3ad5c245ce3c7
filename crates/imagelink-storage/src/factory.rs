use std::sync::Arc;

use imagelink_core::Config;

use crate::{
    CloudinaryProvider, LocalProvider, ProviderBackend, RenderingProvider, StorageError,
    StorageResult,
};

/// Create a rendering provider based on configuration
pub async fn create_provider(config: &Config) -> StorageResult<Arc<dyn RenderingProvider>> {
    match config.rendering_backend() {
        ProviderBackend::Cloudinary => {
            let cloud_name = required(&config.cloudinary_cloud_name, "CLOUDINARY_CLOUD_NAME")?;
            let api_key = required(&config.cloudinary_api_key, "CLOUDINARY_API_KEY")?;
            let api_secret = required(&config.cloudinary_secret, "CLOUDINARY_SECRET")?;

            let provider = CloudinaryProvider::new(
                cloud_name,
                api_key,
                api_secret,
                config.cloudinary_folder.clone(),
                config.max_file_size_bytes(),
            )?;
            Ok(Arc::new(provider))
        }

        ProviderBackend::Local => {
            let base_path = required(&config.local_storage_path, "LOCAL_STORAGE_PATH")?;
            let base_url = required(&config.local_storage_base_url, "LOCAL_STORAGE_BASE_URL")?;

            let provider =
                LocalProvider::new(base_path, base_url, config.max_file_size_bytes()).await?;
            Ok(Arc::new(provider))
        }
    }
}

fn required(value: &Option<String>, name: &str) -> StorageResult<String> {
    value
        .clone()
        .ok_or_else(|| StorageError::ConfigError(format!("{} not configured", name)))
}

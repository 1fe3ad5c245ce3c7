//! Configuration module
//!
//! Settings come from environment variables (after loading `.env` through
//! dotenvy). [`Config::from_env`] reads them and [`Config::validate`] checks
//! the combinations that only make sense together.

use std::collections::HashMap;
use std::env;

use crate::locator::INSERTION_MARKER;
use crate::provider_types::ProviderBackend;

const SERVER_PORT: u16 = 8080;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_FILE_SIZE_MB: usize = 10;
const DEFAULT_CLOUDINARY_FOLDER: &str = "image-service/originals";

/// Server-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub app_name: String,
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    pub database_url: String,
    pub rendering_backend: ProviderBackend,
    // Cloudinary
    pub cloudinary_cloud_name: Option<String>,
    pub cloudinary_api_key: Option<String>,
    pub cloudinary_secret: Option<String>,
    pub cloudinary_folder: String,
    // Local filesystem
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Uploads
    pub max_file_size_bytes: usize,
    pub allowed_extensions: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an explicit variable map instead of the process environment.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup<F>(var: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = var("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        if is_production_name(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            app_name: var("APP_NAME").unwrap_or_else(|| "imagelink".to_string()),
            server_port: var("PORT")
                .unwrap_or_else(|| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            environment,
        };

        let rendering_backend = var("RENDERING_BACKEND")
            .unwrap_or_else(|| ProviderBackend::Cloudinary.to_string())
            .parse::<ProviderBackend>()?;

        let max_file_size_mb = var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|| MAX_FILE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_FILE_SIZE_MB);

        let allowed_extensions = var("ALLOWED_EXTENSIONS")
            .unwrap_or_else(|| "jpg,jpeg,png,gif,webp".to_string())
            .split(',')
            .map(|s| s.trim().trim_start_matches('.').to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Config {
            base,
            database_url: var("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?,
            rendering_backend,
            cloudinary_cloud_name: var("CLOUDINARY_CLOUD_NAME"),
            cloudinary_api_key: var("CLOUDINARY_API_KEY"),
            cloudinary_secret: var("CLOUDINARY_SECRET"),
            cloudinary_folder: var("CLOUDINARY_FOLDER")
                .unwrap_or_else(|| DEFAULT_CLOUDINARY_FOLDER.to_string()),
            local_storage_path: var("LOCAL_STORAGE_PATH"),
            local_storage_base_url: var("LOCAL_STORAGE_BASE_URL"),
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            allowed_extensions,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }

        if self.allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!(
                "ALLOWED_EXTENSIONS must list at least one extension"
            ));
        }

        match self.rendering_backend {
            ProviderBackend::Cloudinary => {
                if self.cloudinary_cloud_name.is_none()
                    || self.cloudinary_api_key.is_none()
                    || self.cloudinary_secret.is_none()
                {
                    return Err(anyhow::anyhow!(
                        "CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_SECRET must be set when using the cloudinary backend"
                    ));
                }
                if has_marker_segment(&self.cloudinary_folder) {
                    return Err(anyhow::anyhow!(
                        "CLOUDINARY_FOLDER must not have a path segment named '{}'",
                        INSERTION_MARKER.trim_matches('/')
                    ));
                }
            }
            ProviderBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using the local backend"
                    ));
                }
                match self.local_storage_base_url.as_deref() {
                    None => {
                        return Err(anyhow::anyhow!(
                            "LOCAL_STORAGE_BASE_URL must be set when using the local backend"
                        ));
                    }
                    Some(url) if url.contains(INSERTION_MARKER) => {
                        return Err(anyhow::anyhow!(
                            "LOCAL_STORAGE_BASE_URL must not contain '{}'",
                            INSERTION_MARKER
                        ));
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_name(&self.base.environment)
    }

    // Convenience getters for common fields
    pub fn app_name(&self) -> &str {
        &self.base.app_name
    }

    pub fn server_port(&self) -> u16 {
        self.base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.base.cors_origins
    }

    pub fn db_max_connections(&self) -> u32 {
        self.base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.base.db_timeout_seconds
    }

    pub fn environment(&self) -> &str {
        &self.base.environment
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn rendering_backend(&self) -> ProviderBackend {
        self.rendering_backend
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_bytes
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }
}

/// A folder segment equal to the marker word would put the marker twice
/// into every delivery URL.
fn has_marker_segment(folder: &str) -> bool {
    let marker = INSERTION_MARKER.trim_matches('/');
    folder.split('/').any(|segment| segment == marker)
}

fn is_production_name(environment: &str) -> bool {
    let environment = environment.to_lowercase();
    environment == "production" || environment == "prod"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn cloudinary_vars() -> HashMap<String, String> {
        vars(&[
            ("DATABASE_URL", "postgres://localhost/imagelink"),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_API_KEY", "key"),
            ("CLOUDINARY_SECRET", "secret"),
        ])
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_map(&cloudinary_vars()).unwrap();
        assert_eq!(config.server_port(), 8080);
        assert_eq!(config.app_name(), "imagelink");
        assert_eq!(config.cors_origins(), ["*".to_string()]);
        assert_eq!(config.db_max_connections(), 10);
        assert_eq!(config.db_timeout_seconds(), 30);
        assert_eq!(config.rendering_backend(), ProviderBackend::Cloudinary);
        assert_eq!(config.cloudinary_folder, "image-service/originals");
        assert_eq!(config.max_file_size_bytes(), 10 * 1024 * 1024);
        assert_eq!(
            config.allowed_extensions(),
            ["jpg", "jpeg", "png", "gif", "webp"].map(String::from)
        );
        assert!(!config.is_production());
        config.validate().unwrap();
    }

    #[test]
    fn test_database_url_is_required() {
        let mut map = cloudinary_vars();
        map.remove("DATABASE_URL");
        assert!(Config::from_map(&map).is_err());
    }

    #[test]
    fn test_validate_rejects_non_postgres_url() {
        let mut map = cloudinary_vars();
        map.insert("DATABASE_URL".to_string(), "mysql://localhost/db".to_string());
        let config = Config::from_map(&map).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cloudinary_credentials_are_required() {
        let mut map = cloudinary_vars();
        map.remove("CLOUDINARY_SECRET");
        let config = Config::from_map(&map).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cloudinary_folder_must_not_contain_marker_segment() {
        for folder in ["upload", "a/upload/b", "originals/upload"] {
            let mut map = cloudinary_vars();
            map.insert("CLOUDINARY_FOLDER".to_string(), folder.to_string());
            let config = Config::from_map(&map).unwrap();
            assert!(config.validate().is_err(), "{:?} should be rejected", folder);
        }

        for folder in ["uploads", "my-upload/originals", "a/b"] {
            let mut map = cloudinary_vars();
            map.insert("CLOUDINARY_FOLDER".to_string(), folder.to_string());
            let config = Config::from_map(&map).unwrap();
            config.validate().unwrap();
        }
    }

    #[test]
    fn test_local_backend() {
        let map = vars(&[
            ("DATABASE_URL", "postgresql://localhost/imagelink"),
            ("RENDERING_BACKEND", "local"),
            ("LOCAL_STORAGE_PATH", "/tmp/imagelink"),
            ("LOCAL_STORAGE_BASE_URL", "http://localhost:8080/media"),
        ]);
        let config = Config::from_map(&map).unwrap();
        assert_eq!(config.rendering_backend(), ProviderBackend::Local);
        config.validate().unwrap();
    }

    #[test]
    fn test_local_base_url_must_not_contain_marker() {
        let map = vars(&[
            ("DATABASE_URL", "postgresql://localhost/imagelink"),
            ("RENDERING_BACKEND", "local"),
            ("LOCAL_STORAGE_PATH", "/tmp/imagelink"),
            ("LOCAL_STORAGE_BASE_URL", "http://localhost:8080/upload/media"),
        ]);
        let config = Config::from_map(&map).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let mut map = cloudinary_vars();
        map.insert("RENDERING_BACKEND".to_string(), "s3".to_string());
        assert!(Config::from_map(&map).is_err());
    }

    #[test]
    fn test_wildcard_cors_forbidden_in_production() {
        let mut map = cloudinary_vars();
        map.insert("ENVIRONMENT".to_string(), "production".to_string());
        assert!(Config::from_map(&map).is_err());

        map.insert(
            "CORS_ORIGINS".to_string(),
            "https://app.example.com, https://admin.example.com".to_string(),
        );
        let config = Config::from_map(&map).unwrap();
        assert!(config.is_production());
        assert_eq!(config.cors_origins().len(), 2);
    }

    #[test]
    fn test_allowed_extensions_are_normalized() {
        let mut map = cloudinary_vars();
        map.insert("ALLOWED_EXTENSIONS".to_string(), " .PNG, jpg ,".to_string());
        let config = Config::from_map(&map).unwrap();
        assert_eq!(config.allowed_extensions(), ["png", "jpg"].map(String::from));
    }
}

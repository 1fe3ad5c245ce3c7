use std::path::{Path, PathBuf};

use async_trait::async_trait;
use imagelink_core::INSERTION_MARKER;
use tokio::fs;
use tokio::io::AsyncReadExt;

use crate::traits::{ByteSource, RenderingProvider, StorageError, StorageResult, StoredAsset};
use crate::ProviderBackend;

/// Directory (and URL segment) originals are written to
const ORIGINALS_DIR: &str = "originals";

/// Local filesystem provider
///
/// Files land at `{base_path}/originals/{public_id}.{ext}` and are addressed
/// as `{base_url}/upload/originals/{public_id}.{ext}`, so a server mounted at
/// `base_url` that understands directives can render variants from them.
#[derive(Clone)]
pub struct LocalProvider {
    base_path: PathBuf,
    base_url: String,
    max_file_size_bytes: usize,
}

impl LocalProvider {
    /// Create a new LocalProvider instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/imagelink")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:8080/media")
    /// * `max_file_size_bytes` - Largest accepted upload
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        max_file_size_bytes: usize,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        if base_url.contains(INSERTION_MARKER) {
            return Err(StorageError::ConfigError(format!(
                "Base URL must not contain '{}': {}",
                INSERTION_MARKER, base_url
            )));
        }

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalProvider {
            base_path,
            base_url,
            max_file_size_bytes,
        })
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// Rejects keys that could escape the base storage directory.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.contains("..") || storage_key.starts_with('/') || storage_key.contains('\\')
        {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let path = self.base_path.join(storage_key);
        if path.strip_prefix(&self.base_path).is_err() {
            return Err(StorageError::InvalidKey(
                "Storage key resolves outside storage directory".to_string(),
            ));
        }

        Ok(path)
    }

    fn generate_key(public_id: &str, extension: &str) -> StorageResult<String> {
        let valid = !public_id.is_empty()
            && public_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidKey(format!(
                "Invalid public id: {}",
                public_id
            )));
        }
        Ok(format!("{}/{}.{}", ORIGINALS_DIR, public_id, extension))
    }

    /// Generate the canonical locator for a key
    fn generate_url(&self, key: &str) -> String {
        format!(
            "{}{}{}",
            self.base_url.trim_end_matches('/'),
            INSERTION_MARKER,
            key
        )
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

/// Lower-cased extension of `filename`, used as the stored format.
fn file_extension(filename: &str) -> StorageResult<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_lowercase())
        .ok_or_else(|| StorageError::InvalidKey(format!("File has no usable extension: {}", filename)))
}

#[async_trait]
impl RenderingProvider for LocalProvider {
    async fn store(
        &self,
        public_id: &str,
        filename: &str,
        source: ByteSource,
    ) -> StorageResult<StoredAsset> {
        let format = file_extension(filename)?;
        let key = Self::generate_key(public_id, &format)?;
        let path = self.key_to_path(&key)?;
        let start = std::time::Instant::now();

        self.ensure_parent_dir(&path).await?;

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        let mut limited = source.take(self.max_file_size_bytes as u64 + 1);
        let bytes_copied = tokio::io::copy(&mut limited, &mut file).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to write stream to file {}: {}",
                path.display(),
                e
            ))
        })?;

        if bytes_copied > self.max_file_size_bytes as u64 {
            drop(file);
            if let Err(e) = fs::remove_file(&path).await {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove oversized upload");
            }
            return Err(StorageError::TooLarge(self.max_file_size_bytes));
        }

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        let canonical_locator = self.generate_url(&key);

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = bytes_copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local provider upload successful"
        );

        Ok(StoredAsset {
            canonical_locator,
            format,
        })
    }

    fn backend_type(&self) -> ProviderBackend {
        ProviderBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    const BASE_URL: &str = "http://localhost:8080/media";

    fn source(data: &[u8]) -> ByteSource {
        Box::pin(Cursor::new(data.to_vec()))
    }

    #[tokio::test]
    async fn test_local_provider_store() {
        let dir = tempdir().unwrap();
        let provider = LocalProvider::new(dir.path(), BASE_URL.to_string(), 1024)
            .await
            .unwrap();

        let asset = provider
            .store("abc-123", "Photo.JPG", source(b"fake jpeg bytes"))
            .await
            .unwrap();

        assert_eq!(
            asset.canonical_locator,
            "http://localhost:8080/media/upload/originals/abc-123.jpg"
        );
        assert_eq!(asset.format, "jpg");

        let written = std::fs::read(dir.path().join("originals/abc-123.jpg")).unwrap();
        assert_eq!(written, b"fake jpeg bytes");
    }

    #[tokio::test]
    async fn test_locator_has_single_marker() {
        let dir = tempdir().unwrap();
        let provider = LocalProvider::new(dir.path(), format!("{}/", BASE_URL), 1024)
            .await
            .unwrap();

        let asset = provider.store("id", "a.png", source(b"x")).await.unwrap();
        assert_eq!(asset.canonical_locator.matches(INSERTION_MARKER).count(), 1);
    }

    #[tokio::test]
    async fn test_rejects_oversized_upload() {
        let dir = tempdir().unwrap();
        let provider = LocalProvider::new(dir.path(), BASE_URL.to_string(), 4)
            .await
            .unwrap();

        let err = provider
            .store("big", "big.png", source(b"12345"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::TooLarge(4)));
        assert!(!dir.path().join("originals/big.png").exists());
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let dir = tempdir().unwrap();
        let provider = LocalProvider::new(dir.path(), BASE_URL.to_string(), 1024)
            .await
            .unwrap();

        for public_id in ["../escape", "a/b", "", "x y"] {
            let err = provider
                .store(public_id, "a.png", source(b"x"))
                .await
                .unwrap_err();
            assert!(matches!(err, StorageError::InvalidKey(_)), "{}", public_id);
        }
    }

    #[tokio::test]
    async fn test_rejects_missing_extension() {
        let dir = tempdir().unwrap();
        let provider = LocalProvider::new(dir.path(), BASE_URL.to_string(), 1024)
            .await
            .unwrap();

        let err = provider
            .store("id", "noextension", source(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn test_base_url_with_marker_is_rejected() {
        let dir = tempdir().unwrap();
        let result =
            LocalProvider::new(dir.path(), "http://localhost/upload/x".to_string(), 1024).await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }

    #[test]
    fn test_backend_type() {
        assert_eq!(
            LocalProvider {
                base_path: PathBuf::from("/tmp"),
                base_url: BASE_URL.to_string(),
                max_file_size_bytes: 1,
            }
            .backend_type(),
            ProviderBackend::Local
        );
    }
}

//! Rendering provider abstraction
//!
//! This module defines the RenderingProvider trait that all upload backends must implement.

use std::pin::Pin;

use async_trait::async_trait;
use imagelink_core::AppError;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::ProviderBackend;

/// Readable byte source for uploads: a multipart field, a file, an in-memory buffer.
pub type ByteSource = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Upload exceeds the {0} byte limit")]
    TooLarge(usize),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::TooLarge(limit) => AppError::PayloadTooLarge(format!(
                "File exceeds the maximum upload size of {} bytes",
                limit
            )),
            other => AppError::upstream_with_source("Rendering provider failed to store the image", other),
        }
    }
}

/// What the provider reports about a stored original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    /// Delivery URL of the untransformed asset; contains the insertion marker exactly once
    pub canonical_locator: String,
    /// Codec tag, e.g. "jpg"
    pub format: String,
}

/// Rendering provider abstraction
///
/// Every backend stores originals under a caller-chosen public id and hands
/// back a locator into which transformation directives can be spliced.
#[async_trait]
pub trait RenderingProvider: Send + Sync {
    /// Store the bytes read from `source` under `public_id`.
    ///
    /// # Arguments
    /// * `public_id` - Identifier the asset is addressed by at the provider
    /// * `filename` - Original client filename, used for the extension
    /// * `source` - Bytes of the image; read until EOF
    ///
    /// # Returns
    /// The canonical locator and detected format on success
    async fn store(
        &self,
        public_id: &str,
        filename: &str,
        source: ByteSource,
    ) -> StorageResult<StoredAsset>;

    /// Get the provider backend type
    fn backend_type(&self) -> ProviderBackend;
}

/// Read `source` to the end, failing once more than `max_bytes` arrive.
pub async fn read_limited(source: ByteSource, max_bytes: usize) -> StorageResult<Vec<u8>> {
    let mut data = Vec::new();
    source
        .take(max_bytes as u64 + 1)
        .read_to_end(&mut data)
        .await?;

    if data.len() > max_bytes {
        return Err(StorageError::TooLarge(max_bytes));
    }
    Ok(data)
}

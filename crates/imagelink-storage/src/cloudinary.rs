//! Cloudinary upload provider
//!
//! Uploads originals through the signed upload API:
//! `POST {api_base}/v1_1/{cloud_name}/image/upload` with a multipart body.
//! The returned `secure_url` is the canonical locator; Cloudinary serves
//! transformed variants when a directive is spliced in after `/upload/`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::traits::{
    read_limited, ByteSource, RenderingProvider, StorageError, StorageResult, StoredAsset,
};
use crate::ProviderBackend;

const DEFAULT_API_BASE: &str = "https://api.cloudinary.com";
const UPLOAD_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    format: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Signed-upload client for one Cloudinary cloud.
#[derive(Clone)]
pub struct CloudinaryProvider {
    http_client: Client,
    api_base: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder: String,
    max_file_size_bytes: usize,
}

impl CloudinaryProvider {
    pub fn new(
        cloud_name: String,
        api_key: String,
        api_secret: String,
        folder: String,
        max_file_size_bytes: usize,
    ) -> StorageResult<Self> {
        if cloud_name.is_empty() || api_key.is_empty() || api_secret.is_empty() {
            return Err(StorageError::ConfigError(
                "Cloudinary cloud name, API key and secret must not be empty".to_string(),
            ));
        }

        let http_client = Client::builder()
            .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                StorageError::ConfigError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            api_base: DEFAULT_API_BASE.to_string(),
            cloud_name,
            api_key,
            api_secret,
            folder,
            max_file_size_bytes,
        })
    }

    /// Point the client at a different API host.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/v1_1/{}/image/upload",
            self.api_base.trim_end_matches('/'),
            self.cloud_name
        )
    }

    /// SHA-256 request signature.
    ///
    /// Parameters are sorted by name, joined as `k=v` pairs with `&`, and the
    /// API secret is appended before hashing.
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted = params.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let to_sign = sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl RenderingProvider for CloudinaryProvider {
    async fn store(
        &self,
        public_id: &str,
        filename: &str,
        source: ByteSource,
    ) -> StorageResult<StoredAsset> {
        let start = std::time::Instant::now();
        let data = read_limited(source, self.max_file_size_bytes).await?;
        let size_bytes = data.len();

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&[
            ("folder", self.folder.as_str()),
            ("public_id", public_id),
            ("timestamp", timestamp.as_str()),
        ]);

        let file_part = Part::bytes(data).file_name(filename.to_string());
        let form = Form::new()
            .part("file", file_part)
            .text("public_id", public_id.to_string())
            .text("folder", self.folder.clone())
            .text("timestamp", timestamp)
            .text("api_key", self.api_key.clone())
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        let response = self
            .http_client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Cloudinary request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            tracing::error!(
                status = %status,
                public_id = %public_id,
                error = %message,
                "Cloudinary upload rejected"
            );
            return Err(StorageError::BackendError(format!(
                "Cloudinary upload returned {}: {}",
                status, message
            )));
        }

        let uploaded: UploadResponse = response.json().await.map_err(|e| {
            StorageError::BackendError(format!("Failed to parse Cloudinary response: {}", e))
        })?;

        tracing::info!(
            public_id = %public_id,
            url = %uploaded.secure_url,
            size_bytes = size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Cloudinary upload successful"
        );

        Ok(StoredAsset {
            canonical_locator: uploaded.secure_url,
            format: uploaded.format.to_lowercase(),
        })
    }

    fn backend_type(&self) -> ProviderBackend {
        ProviderBackend::Cloudinary
    }
}

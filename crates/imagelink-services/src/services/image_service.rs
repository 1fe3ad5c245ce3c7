//! Transform orchestrator
//!
//! Looks up the stored image, asks the directive encoder for a token and
//! splices it into the image's canonical locator. Nothing is persisted and no
//! pixels are touched; the result is a URL the rendering provider will serve.

use std::path::Path;
use std::sync::Arc;

use imagelink_core::locator::{self, ComposedLocator};
use imagelink_core::models::{Image, TransformOperation, TransformRequest};
use imagelink_core::{AppError, Config, DirectiveEncoder, DirectiveGrammar};
use imagelink_db::MetadataStore;
use imagelink_storage::{ByteSource, RenderingProvider};
use uuid::Uuid;

const DEFAULT_MAX_FILE_SIZE_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Upload acceptance rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_file_size_bytes: usize,
    /// Lower-case extensions without the leading dot
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

impl UploadLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_file_size_bytes: config.max_file_size_bytes(),
            allowed_extensions: config.allowed_extensions().to_vec(),
        }
    }

    /// Check the filename and return its lower-cased extension.
    pub fn validate_filename(&self, filename: &str) -> Result<String, AppError> {
        if filename.trim().is_empty() {
            return Err(AppError::InvalidParameter(
                "Filename is required".to_string(),
            ));
        }

        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .ok_or_else(|| {
                AppError::InvalidParameter(format!("File has no extension: {}", filename))
            })?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(AppError::InvalidParameter(format!(
                "Invalid file extension '{}'. Allowed extensions: {}",
                extension,
                self.allowed_extensions.join(", ")
            )));
        }

        Ok(extension)
    }
}

/// Keeps lookup failures in the upstream-failure kind whatever the store reported.
fn into_upstream(err: AppError) -> AppError {
    match err {
        AppError::UpstreamStoreFailure { .. } => err,
        other => AppError::upstream_with_source("Metadata store request failed", other),
    }
}

/// Transform orchestrator and upload coordinator.
///
/// Holds only shared handles to its collaborators, so it is cheap to clone
/// and safe to call from any number of tasks at once.
#[derive(Clone)]
pub struct ImageService {
    store: Arc<dyn MetadataStore>,
    provider: Arc<dyn RenderingProvider>,
    encoder: Arc<dyn DirectiveEncoder>,
    limits: UploadLimits,
}

impl ImageService {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        provider: Arc<dyn RenderingProvider>,
        encoder: Arc<dyn DirectiveEncoder>,
        limits: UploadLimits,
    ) -> Self {
        Self {
            store,
            provider,
            encoder,
            limits,
        }
    }

    /// Service using the built-in provider grammar.
    pub fn with_default_encoder(
        store: Arc<dyn MetadataStore>,
        provider: Arc<dyn RenderingProvider>,
        limits: UploadLimits,
    ) -> Self {
        Self::new(store, provider, Arc::new(DirectiveGrammar), limits)
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    /// Compose the delivery URL for one transformation of a stored image.
    ///
    /// # Errors
    /// - `ImageNotFound` if the id is unknown; nothing is encoded in that case
    /// - `UpstreamStoreFailure` if the metadata lookup fails
    /// - any validation error of the encoder, unchanged
    /// - `MalformedLocator` if the stored locator cannot take a directive
    #[tracing::instrument(
        skip(self, request),
        fields(operation = request.operation.kind(), image_id = %request.id)
    )]
    pub async fn transform(&self, request: &TransformRequest) -> Result<ComposedLocator, AppError> {
        let image = self.lookup(request.id).await?;
        self.compose_for(&image, &request.operation)
    }

    /// Like [`transform`](Self::transform) for operations still in wire form.
    ///
    /// `build` runs only once the image is known to exist, so parameter
    /// errors never mask `ImageNotFound`.
    #[tracing::instrument(skip(self, build), fields(image_id = %id, operation = tracing::field::Empty))]
    pub async fn transform_with<F>(&self, id: Uuid, build: F) -> Result<ComposedLocator, AppError>
    where
        F: FnOnce() -> Result<TransformOperation, AppError> + Send,
    {
        let image = self.lookup(id).await?;
        let operation = build()?;
        tracing::Span::current().record("operation", operation.kind());
        self.compose_for(&image, &operation)
    }

    async fn lookup(&self, id: Uuid) -> Result<Image, AppError> {
        self.store
            .get_by_id(id)
            .await
            .map_err(into_upstream)?
            .ok_or_else(|| AppError::ImageNotFound(id.to_string()))
    }

    fn compose_for(
        &self,
        image: &Image,
        operation: &TransformOperation,
    ) -> Result<ComposedLocator, AppError> {
        let token = self.encoder.encode(operation)?;
        let composed = locator::compose(&image.canonical_locator, &token)?;

        tracing::debug!(directive = %token, url = %composed, "Transformation locator composed");
        Ok(composed)
    }

    /// Fetch the stored record of an image.
    #[tracing::instrument(skip(self), fields(image_id = %id))]
    pub async fn get_metadata(&self, id: Uuid) -> Result<Image, AppError> {
        self.lookup(id).await
    }

    /// Store a new original at the rendering provider and record it.
    ///
    /// # Errors
    /// - `InvalidParameter` for an empty filename or a disallowed extension
    /// - `PayloadTooLarge` when the source exceeds the configured limit
    /// - `UpstreamStoreFailure` when the provider or the metadata store fails
    /// - `MalformedLocator` when the provider returns a locator that cannot take directives
    #[tracing::instrument(skip(self, source), fields(filename = %filename, image_id = tracing::field::Empty))]
    pub async fn upload(&self, source: ByteSource, filename: &str) -> Result<Image, AppError> {
        let extension = self.limits.validate_filename(filename)?;

        let id = Uuid::new_v4();
        tracing::Span::current().record("image_id", tracing::field::display(id));

        let asset = self
            .provider
            .store(&id.to_string(), filename, source)
            .await?;

        locator::decompose(&asset.canonical_locator)?;

        let format = if asset.format.is_empty() {
            extension
        } else {
            asset.format
        };
        let image = Image::new(id, asset.canonical_locator, format);

        self.store.create(&image).await.map_err(into_upstream)?;

        tracing::info!(
            backend = %self.provider.backend_type(),
            format = %image.format,
            "Image uploaded"
        );
        Ok(image)
    }
}

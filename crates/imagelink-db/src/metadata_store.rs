//! Metadata store capability
//!
//! The orchestrator only needs two things from persistence: record a freshly
//! uploaded image and look one up by id. Keeping that behind a trait lets the
//! service run against PostgreSQL in production and a map in tests.

use async_trait::async_trait;
use imagelink_core::models::Image;
use imagelink_core::AppError;
use uuid::Uuid;

use crate::db::ImageRepository;

#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Persist a new image record and return its id.
    ///
    /// Fails with `UpstreamStoreFailure` if the id is already taken.
    async fn create(&self, image: &Image) -> Result<Uuid, AppError>;

    /// Fetch an image record, `None` when the id is unknown.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Image>, AppError>;
}

#[async_trait]
impl MetadataStore for ImageRepository {
    async fn create(&self, image: &Image) -> Result<Uuid, AppError> {
        self.create(image).await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Image>, AppError> {
        self.get_by_id(id).await
    }
}

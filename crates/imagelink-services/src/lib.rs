//! imagelink services layer
//!
//! Hosts the transform orchestrator, [`ImageService`], and re-exports the
//! collaborators it is built from so the API crate depends on a single facade.
//! Keep coordination here; keep thin HTTP handling in imagelink-api.

pub mod services;

pub use imagelink_db::{ImageRepository, InMemoryImageStore, MetadataStore};
pub use imagelink_storage::{
    create_provider, ByteSource, RenderingProvider, StorageError, StorageResult, StoredAsset,
};
pub use services::{ImageService, UploadLimits};

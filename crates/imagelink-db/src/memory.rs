//! In-memory metadata store

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use imagelink_core::models::Image;
use imagelink_core::AppError;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::metadata_store::MetadataStore;

/// Keeps image records in a shared map. Clones share the same records.
#[derive(Clone, Default)]
pub struct InMemoryImageStore {
    images: Arc<RwLock<HashMap<Uuid, Image>>>,
}

impl InMemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing records.
    pub fn with_images(images: impl IntoIterator<Item = Image>) -> Self {
        let images = images.into_iter().map(|image| (image.id, image)).collect();
        Self {
            images: Arc::new(RwLock::new(images)),
        }
    }

    pub async fn len(&self) -> usize {
        self.images.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.images.read().await.is_empty()
    }
}

#[async_trait]
impl MetadataStore for InMemoryImageStore {
    async fn create(&self, image: &Image) -> Result<Uuid, AppError> {
        let mut images = self.images.write().await;
        if images.contains_key(&image.id) {
            return Err(AppError::upstream(format!(
                "Image {} already exists",
                image.id
            )));
        }
        images.insert(image.id, image.clone());
        Ok(image.id)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Image>, AppError> {
        Ok(self.images.read().await.get(&id).cloned())
    }
}

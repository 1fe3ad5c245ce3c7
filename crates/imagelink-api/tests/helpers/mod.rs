//! Test helpers: build AppState and router for integration tests.
//!
//! Collaborators are in-memory (metadata) and a local provider on a temp
//! directory (originals), so no database or network is needed.
//! Run from workspace root: `cargo test -p imagelink-api`.

#![allow(dead_code)]

pub mod fixtures;

use std::sync::Arc;

use axum_test::TestServer;
use imagelink_api::constants;
use imagelink_api::setup::app_router;
use imagelink_api::AppState;
use imagelink_core::models::Image;
use imagelink_services::{ImageService, InMemoryImageStore, UploadLimits};
use imagelink_storage::LocalProvider;
use tempfile::TempDir;
use uuid::Uuid;

pub const MEDIA_BASE_URL: &str = "http://localhost:8080/media";
pub const CDN_LOCATOR: &str = "https://res.cloudinary.com/demo/image/upload/sample.jpg";

/// API path prefix for tests (e.g. `/api/v1/resize`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server, store handle, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub store: InMemoryImageStore,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Put a record straight into the store, bypassing the upload path.
    pub async fn seed_image(&self, canonical_locator: &str) -> Image {
        use imagelink_services::MetadataStore;

        let image = Image::new(Uuid::new_v4(), canonical_locator.to_string(), "jpg".to_string());
        self.store.create(&image).await.expect("seed image");
        image
    }
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with_limits(UploadLimits::default()).await
}

pub async fn setup_test_app_with_limits(limits: UploadLimits) -> TestApp {
    let temp_dir = TempDir::new().expect("temp dir");
    let provider = LocalProvider::new(
        temp_dir.path(),
        MEDIA_BASE_URL.to_string(),
        limits.max_file_size_bytes,
    )
    .await
    .expect("local provider");

    let store = InMemoryImageStore::new();
    let service =
        ImageService::with_default_encoder(Arc::new(store.clone()), Arc::new(provider), limits);
    let state = Arc::new(AppState::new(service));

    let server = TestServer::new(app_router(state)).expect("test server");

    TestApp {
        server,
        store,
        _temp_dir: temp_dir,
    }
}

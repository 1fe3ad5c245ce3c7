use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use imagelink_core::directive;
use imagelink_core::locator;
use imagelink_core::models::{FlipAxis, Image, ImageFilter, TransformOperation, TransformRequest};
use imagelink_core::{AppError, DirectiveEncoder, DirectiveToken, ProviderBackend};
use imagelink_services::{
    ByteSource, ImageService, InMemoryImageStore, MetadataStore, RenderingProvider, StorageError,
    StorageResult, StoredAsset, UploadLimits,
};
use imagelink_storage::LocalProvider;
use uuid::Uuid;

const CANONICAL: &str = "https://cdn.example/v1/upload/abc.jpg";

/// Delegates to the real grammar and remembers every operation it saw.
#[derive(Default)]
struct RecordingEncoder {
    seen: Mutex<Vec<TransformOperation>>,
}

impl RecordingEncoder {
    fn calls(&self) -> Vec<TransformOperation> {
        self.seen.lock().unwrap().clone()
    }
}

impl DirectiveEncoder for RecordingEncoder {
    fn encode(&self, operation: &TransformOperation) -> Result<DirectiveToken, AppError> {
        self.seen.lock().unwrap().push(operation.clone());
        directive::encode(operation)
    }
}

/// Pretends to upload and answers with a CDN-style locator.
struct StubProvider {
    fail: bool,
}

#[async_trait]
impl RenderingProvider for StubProvider {
    async fn store(
        &self,
        public_id: &str,
        filename: &str,
        _source: ByteSource,
    ) -> StorageResult<StoredAsset> {
        if self.fail {
            return Err(StorageError::BackendError("service unavailable".to_string()));
        }
        let ext = filename.rsplit('.').next().unwrap_or("jpg").to_lowercase();
        Ok(StoredAsset {
            canonical_locator: format!("https://cdn.example/v1/upload/{}.{}", public_id, ext),
            format: ext,
        })
    }

    fn backend_type(&self) -> ProviderBackend {
        ProviderBackend::Cloudinary
    }
}

/// Metadata store whose every call fails.
struct BrokenStore;

#[async_trait]
impl MetadataStore for BrokenStore {
    async fn create(&self, _image: &Image) -> Result<Uuid, AppError> {
        Err(AppError::upstream("connection refused"))
    }

    async fn get_by_id(&self, _id: Uuid) -> Result<Option<Image>, AppError> {
        Err(AppError::upstream("connection refused"))
    }
}

fn source(data: &[u8]) -> ByteSource {
    Box::pin(Cursor::new(data.to_vec()))
}

fn stored_image(locator: &str) -> Image {
    Image::new(Uuid::new_v4(), locator.to_string(), "jpg".to_string())
}

fn service_with(
    store: Arc<dyn MetadataStore>,
    encoder: Arc<RecordingEncoder>,
) -> ImageService {
    ImageService::new(
        store,
        Arc::new(StubProvider { fail: false }),
        encoder,
        UploadLimits::default(),
    )
}

// =========================================================================
// TRANSFORM
// =========================================================================

#[tokio::test]
async fn test_transform_resize_example() {
    let image = stored_image(CANONICAL);
    let store = Arc::new(InMemoryImageStore::with_images([image.clone()]));
    let service = service_with(store, Arc::new(RecordingEncoder::default()));

    let request = TransformRequest::new(
        image.id,
        TransformOperation::Resize {
            width: 100,
            height: 200,
        },
    );
    let url = service.transform(&request).await.unwrap();
    assert_eq!(
        url.as_str(),
        "https://cdn.example/v1/upload/w_100,h_200,c_fill/abc.jpg"
    );
}

#[tokio::test]
async fn test_transform_watermark_example() {
    let image = stored_image(CANONICAL);
    let store = Arc::new(InMemoryImageStore::with_images([image.clone()]));
    let service = service_with(store, Arc::new(RecordingEncoder::default()));

    let request = TransformRequest::new(
        image.id,
        TransformOperation::Watermark {
            overlay_id: "logo_1".to_string(),
        },
    );
    let url = service.transform(&request).await.unwrap();
    assert_eq!(
        url.as_str(),
        "https://cdn.example/v1/upload/l_logo_1,g_south_east,x_10,y_10,w_150/abc.jpg"
    );
}

#[tokio::test]
async fn test_unknown_image_fails_before_encoding() {
    let encoder = Arc::new(RecordingEncoder::default());
    let service = service_with(Arc::new(InMemoryImageStore::new()), encoder.clone());

    let request = TransformRequest::new(Uuid::new_v4(), TransformOperation::Rotate { angle: 90 });
    let err = service.transform(&request).await.unwrap_err();

    assert!(matches!(err, AppError::ImageNotFound(_)));
    assert!(encoder.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_image_fails_before_parameters_are_parsed() {
    let encoder = Arc::new(RecordingEncoder::default());
    let service = service_with(Arc::new(InMemoryImageStore::new()), encoder.clone());
    let built = AtomicBool::new(false);

    let err = service
        .transform_with(Uuid::new_v4(), || {
            built.store(true, Ordering::SeqCst);
            Err(AppError::UnsupportedFilter("sepia".to_string()))
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ImageNotFound(_)));
    assert!(!built.load(Ordering::SeqCst));
    assert!(encoder.calls().is_empty());
}

#[tokio::test]
async fn test_transform_with_known_image() {
    let image = stored_image(CANONICAL);
    let store = Arc::new(InMemoryImageStore::with_images([image.clone()]));
    let service = service_with(store, Arc::new(RecordingEncoder::default()));

    let url = service
        .transform_with(image.id, || {
            Ok(TransformOperation::Flip {
                axis: "vertical".parse()?,
            })
        })
        .await
        .unwrap();
    assert_eq!(url.as_str(), "https://cdn.example/v1/upload/a_vflip/abc.jpg");

    let err = service
        .transform_with(image.id, || {
            Ok(TransformOperation::Flip {
                axis: "diagonal".parse()?,
            })
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidFlipAxis(_)));
}

#[tokio::test]
async fn test_store_failure_is_upstream_failure() {
    let encoder = Arc::new(RecordingEncoder::default());
    let service = service_with(Arc::new(BrokenStore), encoder.clone());

    let request = TransformRequest::new(Uuid::new_v4(), TransformOperation::Rotate { angle: 90 });
    let err = service.transform(&request).await.unwrap_err();

    assert!(matches!(err, AppError::UpstreamStoreFailure { .. }));
    assert!(encoder.calls().is_empty());
}

#[tokio::test]
async fn test_validation_errors_propagate_unchanged() {
    let image = stored_image(CANONICAL);
    let store = Arc::new(InMemoryImageStore::with_images([image.clone()]));
    let service = service_with(store, Arc::new(RecordingEncoder::default()));

    let cases = vec![
        TransformOperation::Resize {
            width: 0,
            height: 10,
        },
        TransformOperation::Watermark {
            overlay_id: String::new(),
        },
        TransformOperation::Convert {
            format: String::new(),
        },
    ];
    let mut errors = Vec::new();
    for operation in cases {
        let request = TransformRequest::new(image.id, operation);
        errors.push(service.transform(&request).await.unwrap_err());
    }

    assert!(matches!(errors[0], AppError::InvalidParameter(_)));
    assert!(matches!(errors[1], AppError::MissingWatermarkOverlay));
    assert!(matches!(errors[2], AppError::InvalidParameter(_)));
}

#[tokio::test]
async fn test_malformed_stored_locator() {
    let image = stored_image("https://cdn.example/v1/abc.jpg");
    let store = Arc::new(InMemoryImageStore::with_images([image.clone()]));
    let service = service_with(store, Arc::new(RecordingEncoder::default()));

    let request = TransformRequest::new(
        image.id,
        TransformOperation::Filter {
            filter: ImageFilter::Sharpen,
        },
    );
    let err = service.transform(&request).await.unwrap_err();
    assert!(matches!(err, AppError::MalformedLocator(_)));
}

#[tokio::test]
async fn test_dispatch_passes_operation_to_encoder() {
    let image = stored_image(CANONICAL);
    let store = Arc::new(InMemoryImageStore::with_images([image.clone()]));
    let encoder = Arc::new(RecordingEncoder::default());
    let service = service_with(store, encoder.clone());

    let operation = TransformOperation::Flip {
        axis: FlipAxis::Vertical,
    };
    let url = service
        .transform(&TransformRequest::new(image.id, operation.clone()))
        .await
        .unwrap();

    assert_eq!(encoder.calls(), vec![operation.clone()]);
    assert_eq!(locator::parse_locator(url.as_str()).unwrap(), operation);
}

#[tokio::test]
async fn test_transform_is_deterministic() {
    let image = stored_image(CANONICAL);
    let store = Arc::new(InMemoryImageStore::with_images([image.clone()]));
    let service = service_with(store, Arc::new(RecordingEncoder::default()));

    let request = TransformRequest::new(
        image.id,
        TransformOperation::Compress {
            quality: String::new(),
        },
    );
    let first = service.transform(&request).await.unwrap();
    let second = service.transform(&request).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.as_str(), "https://cdn.example/v1/upload/q_auto,f_auto/abc.jpg");
}

#[tokio::test]
async fn test_concurrent_transforms_agree() {
    let image = stored_image(CANONICAL);
    let store = Arc::new(InMemoryImageStore::with_images([image.clone()]));
    let service = service_with(store, Arc::new(RecordingEncoder::default()));

    let mut handles = Vec::new();
    for i in 0..64u32 {
        let service = service.clone();
        let id = image.id;
        handles.push(tokio::spawn(async move {
            let operation = if i % 2 == 0 {
                TransformOperation::Crop {
                    width: 300,
                    height: 200,
                    x: 10,
                    y: 20,
                }
            } else {
                TransformOperation::Filter {
                    filter: ImageFilter::Blur,
                }
            };
            service
                .transform(&TransformRequest::new(id, operation))
                .await
                .unwrap()
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let url = handle.await.unwrap();
        let expected = if i % 2 == 0 {
            "https://cdn.example/v1/upload/c_crop,w_300,h_200,x_10,y_20/abc.jpg"
        } else {
            "https://cdn.example/v1/upload/e_blur:200/abc.jpg"
        };
        assert_eq!(url.as_str(), expected);
    }
}

// =========================================================================
// METADATA & UPLOAD
// =========================================================================

#[tokio::test]
async fn test_get_metadata() {
    let image = stored_image(CANONICAL);
    let store = Arc::new(InMemoryImageStore::with_images([image.clone()]));
    let service = service_with(store, Arc::new(RecordingEncoder::default()));

    assert_eq!(service.get_metadata(image.id).await.unwrap(), image);
    assert!(matches!(
        service.get_metadata(Uuid::new_v4()).await,
        Err(AppError::ImageNotFound(_))
    ));
}

#[tokio::test]
async fn test_upload_then_transform() {
    let store = Arc::new(InMemoryImageStore::new());
    let service = service_with(store.clone(), Arc::new(RecordingEncoder::default()));

    let image = service.upload(source(b"png bytes"), "photo.PNG").await.unwrap();
    assert_eq!(image.format, "png");
    assert_eq!(
        image.canonical_locator,
        format!("https://cdn.example/v1/upload/{}.png", image.id)
    );
    assert_eq!(store.get_by_id(image.id).await.unwrap(), Some(image.clone()));

    let url = service
        .transform(&TransformRequest::new(
            image.id,
            TransformOperation::Rotate { angle: -90 },
        ))
        .await
        .unwrap();
    assert_eq!(
        url.as_str(),
        format!("https://cdn.example/v1/upload/a_-90/{}.png", image.id)
    );
}

#[tokio::test]
async fn test_upload_rejects_disallowed_extension() {
    let store = Arc::new(InMemoryImageStore::new());
    let service = service_with(store.clone(), Arc::new(RecordingEncoder::default()));

    let err = service.upload(source(b"x"), "notes.txt").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidParameter(_)));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_upload_provider_failure() {
    let store = Arc::new(InMemoryImageStore::new());
    let service = ImageService::with_default_encoder(
        store.clone(),
        Arc::new(StubProvider { fail: true }),
        UploadLimits::default(),
    );

    let err = service.upload(source(b"x"), "a.jpg").await.unwrap_err();
    assert!(matches!(err, AppError::UpstreamStoreFailure { .. }));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_upload_metadata_failure() {
    let service = ImageService::with_default_encoder(
        Arc::new(BrokenStore),
        Arc::new(StubProvider { fail: false }),
        UploadLimits::default(),
    );

    let err = service.upload(source(b"x"), "a.jpg").await.unwrap_err();
    assert!(matches!(err, AppError::UpstreamStoreFailure { .. }));
}

#[tokio::test]
async fn test_upload_too_large_with_local_provider() {
    let dir = tempfile::tempdir().unwrap();
    let provider = LocalProvider::new(dir.path(), "http://localhost:8080/media".to_string(), 8)
        .await
        .unwrap();
    let limits = UploadLimits {
        max_file_size_bytes: 8,
        ..UploadLimits::default()
    };
    let store = Arc::new(InMemoryImageStore::new());
    let service = ImageService::with_default_encoder(store.clone(), Arc::new(provider), limits);

    let err = service
        .upload(source(b"way more than eight bytes"), "a.gif")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PayloadTooLarge(_)));
    assert!(store.is_empty().await);

    let image = service.upload(source(b"small"), "b.gif").await.unwrap();
    let url = service
        .transform(&TransformRequest::new(
            image.id,
            TransformOperation::Convert {
                format: "WEBP".to_string(),
            },
        ))
        .await
        .unwrap();
    assert_eq!(
        url.as_str(),
        format!(
            "http://localhost:8080/media/upload/f_webp/originals/{}.gif",
            image.id
        )
    );
}

//! imagelink storage library
//!
//! Upload side of the rendering provider. A [`RenderingProvider`] takes the
//! bytes of an original image, stores them under a public id and reports the
//! canonical locator the provider will later serve transformed variants from.
//!
//! Backends:
//! - [`CloudinaryProvider`]: signed uploads to the Cloudinary upload API
//! - [`LocalProvider`]: files on the local filesystem, served under `{base_url}/upload/`

pub mod cloudinary;
pub mod factory;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use cloudinary::CloudinaryProvider;
pub use factory::create_provider;
pub use imagelink_core::ProviderBackend;
pub use local::LocalProvider;
pub use traits::{
    read_limited, ByteSource, RenderingProvider, StorageError, StorageResult, StoredAsset,
};

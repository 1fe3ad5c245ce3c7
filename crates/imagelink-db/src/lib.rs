//! imagelink database layer
//!
//! The [`MetadataStore`] capability maps an image id to its stored record.
//! [`ImageRepository`] backs it with PostgreSQL; [`InMemoryImageStore`] keeps
//! records in process memory for tests and local runs.

pub mod db;
pub mod memory;
pub mod metadata_store;

pub use db::ImageRepository;
pub use memory::InMemoryImageStore;
pub use metadata_store::MetadataStore;

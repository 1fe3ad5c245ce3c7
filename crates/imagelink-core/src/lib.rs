//! imagelink core library
//!
//! This crate provides the domain models, error types, configuration and the
//! transformation directive engine (encoder and locator composer) shared by
//! all imagelink components.

pub mod config;
pub mod directive;
pub mod error;
pub mod locator;
pub mod models;
pub mod provider_types;

// Re-export commonly used types
pub use config::{BaseConfig, Config};
pub use directive::{DirectiveEncoder, DirectiveGrammar, DirectiveToken};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use locator::{ComposedLocator, INSERTION_MARKER};
pub use models::{FlipAxis, Image, ImageFilter, TransformOperation, TransformRequest};
pub use provider_types::ProviderBackend;

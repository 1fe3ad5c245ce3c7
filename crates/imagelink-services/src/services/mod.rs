pub mod image_service;

pub use image_service::{ImageService, UploadLimits};

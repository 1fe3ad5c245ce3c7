//! Database repositories
//
// Image records
pub mod image;

pub use image::ImageRepository;

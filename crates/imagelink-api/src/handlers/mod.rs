pub mod health;
pub mod image_get;
pub mod image_upload;
pub mod transform;

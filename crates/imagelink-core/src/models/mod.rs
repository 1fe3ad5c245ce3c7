pub mod image;
pub mod transform;

pub use image::Image;
pub use transform::{FlipAxis, ImageFilter, TransformOperation, TransformRequest};

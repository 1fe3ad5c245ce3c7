//! JSON bodies of the transform endpoints.
//!
//! Every body names the stored image by `id` and carries the parameters of
//! exactly one operation, still in wire form. They are parsed into a
//! [`TransformOperation`] only after the image has been found, so an unknown
//! id is reported as such whatever the parameters look like.

use imagelink_core::{AppError, FlipAxis, ImageFilter, TransformOperation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A transform request body as received from the client.
pub trait TransformBody {
    /// Stored image the operation applies to
    fn image_id(&self) -> Uuid;

    /// Parse the wire parameters into the operation.
    fn into_operation(self) -> Result<TransformOperation, AppError>;
}

/// Pixel value from the wire; negative or oversized values are invalid.
fn pixels(name: &str, value: i64) -> Result<u32, AppError> {
    u32::try_from(value).map_err(|_| {
        AppError::InvalidParameter(format!(
            "{} must be between 0 and {} (got {})",
            name,
            u32::MAX,
            value
        ))
    })
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResizeRequest {
    pub id: Uuid,
    #[schema(example = 300)]
    pub width: i64,
    #[schema(example = 200)]
    pub height: i64,
}

impl TransformBody for ResizeRequest {
    fn image_id(&self) -> Uuid {
        self.id
    }

    fn into_operation(self) -> Result<TransformOperation, AppError> {
        Ok(TransformOperation::Resize {
            width: pixels("width", self.width)?,
            height: pixels("height", self.height)?,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ConvertRequest {
    pub id: Uuid,
    /// Target codec, case-insensitive (e.g. "webp", "PNG")
    #[schema(example = "webp")]
    pub format: String,
}

impl TransformBody for ConvertRequest {
    fn image_id(&self) -> Uuid {
        self.id
    }

    fn into_operation(self) -> Result<TransformOperation, AppError> {
        Ok(TransformOperation::Convert {
            format: self.format,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FilterRequest {
    pub id: Uuid,
    /// One of "grayscale", "blur", "sharpen" (case-insensitive)
    #[schema(example = "grayscale")]
    pub filter: String,
}

impl TransformBody for FilterRequest {
    fn image_id(&self) -> Uuid {
        self.id
    }

    fn into_operation(self) -> Result<TransformOperation, AppError> {
        let filter: ImageFilter = self.filter.parse()?;
        Ok(TransformOperation::Filter { filter })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CropRequest {
    pub id: Uuid,
    pub width: i64,
    pub height: i64,
    #[serde(default)]
    pub x: i64,
    #[serde(default)]
    pub y: i64,
}

impl TransformBody for CropRequest {
    fn image_id(&self) -> Uuid {
        self.id
    }

    fn into_operation(self) -> Result<TransformOperation, AppError> {
        Ok(TransformOperation::Crop {
            width: pixels("width", self.width)?,
            height: pixels("height", self.height)?,
            x: pixels("x", self.x)?,
            y: pixels("y", self.y)?,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RotateRequest {
    pub id: Uuid,
    /// Degrees; any integer, the provider normalizes
    #[schema(example = 90)]
    pub angle: i32,
}

impl TransformBody for RotateRequest {
    fn image_id(&self) -> Uuid {
        self.id
    }

    fn into_operation(self) -> Result<TransformOperation, AppError> {
        Ok(TransformOperation::Rotate { angle: self.angle })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FlipRequest {
    pub id: Uuid,
    /// "horizontal" or "vertical"
    #[schema(example = "horizontal")]
    pub flip_axis: String,
}

impl TransformBody for FlipRequest {
    fn image_id(&self) -> Uuid {
        self.id
    }

    fn into_operation(self) -> Result<TransformOperation, AppError> {
        let axis: FlipAxis = self.flip_axis.parse()?;
        Ok(TransformOperation::Flip { axis })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WatermarkRequest {
    pub id: Uuid,
    /// Public id of the overlay asset at the provider
    #[serde(default)]
    #[schema(example = "logo")]
    pub watermark: String,
}

impl TransformBody for WatermarkRequest {
    fn image_id(&self) -> Uuid {
        self.id
    }

    fn into_operation(self) -> Result<TransformOperation, AppError> {
        Ok(TransformOperation::Watermark {
            overlay_id: self.watermark,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CompressRequest {
    pub id: Uuid,
    /// Quality hint; omitted or empty means "auto"
    #[serde(default)]
    #[schema(example = "80")]
    pub quality: String,
}

impl TransformBody for CompressRequest {
    fn image_id(&self) -> Uuid {
        self.id
    }

    fn into_operation(self) -> Result<TransformOperation, AppError> {
        Ok(TransformOperation::Compress {
            quality: self.quality,
        })
    }
}

/// Body returned by every transform endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransformResponse {
    /// Composed delivery URL
    #[schema(
        example = "https://res.cloudinary.com/demo/image/upload/w_300,h_200,c_fill/sample.jpg"
    )]
    pub url: String,
}

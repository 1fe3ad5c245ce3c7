//! Typed transform requests.
//!
//! A [`TransformRequest`] selects exactly one operation for one stored image.
//! Free-form strings from the wire (filter names, flip axes) are parsed into
//! closed enums here so the encoder only ever matches on known cases.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;

/// Named filters the rendering provider understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFilter {
    Grayscale,
    Blur,
    Sharpen,
}

impl FromStr for ImageFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "grayscale" => Ok(ImageFilter::Grayscale),
            "blur" => Ok(ImageFilter::Blur),
            "sharpen" => Ok(ImageFilter::Sharpen),
            _ => Err(AppError::UnsupportedFilter(s.to_string())),
        }
    }
}

impl Display for ImageFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ImageFilter::Grayscale => write!(f, "grayscale"),
            ImageFilter::Blur => write!(f, "blur"),
            ImageFilter::Sharpen => write!(f, "sharpen"),
        }
    }
}

/// Mirror axis for flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlipAxis {
    Horizontal,
    Vertical,
}

impl FromStr for FlipAxis {
    type Err = AppError;

    /// Only the exact lowercase names are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "horizontal" => Ok(FlipAxis::Horizontal),
            "vertical" => Ok(FlipAxis::Vertical),
            _ => Err(AppError::InvalidFlipAxis(s.to_string())),
        }
    }
}

impl Display for FlipAxis {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FlipAxis::Horizontal => write!(f, "horizontal"),
            FlipAxis::Vertical => write!(f, "vertical"),
        }
    }
}

/// One transformation, with its operation-specific parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOperation {
    /// Fit-fill to exactly `width` x `height`
    Resize { width: u32, height: u32 },
    /// Deliver in another codec (case-insensitive tag)
    Convert { format: String },
    Filter { filter: ImageFilter },
    /// Cut a `width` x `height` region starting at (`x`, `y`)
    Crop {
        width: u32,
        height: u32,
        x: u32,
        y: u32,
    },
    /// Degrees, passed through as-is; the provider normalizes
    Rotate { angle: i32 },
    Flip { axis: FlipAxis },
    /// Composite another stored asset on top, addressed by its public id
    Watermark { overlay_id: String },
    /// Quality hint; empty means "auto"
    Compress { quality: String },
}

impl TransformOperation {
    /// Short operation name, used in logs and spans.
    pub fn kind(&self) -> &'static str {
        match self {
            TransformOperation::Resize { .. } => "resize",
            TransformOperation::Convert { .. } => "convert",
            TransformOperation::Filter { .. } => "filter",
            TransformOperation::Crop { .. } => "crop",
            TransformOperation::Rotate { .. } => "rotate",
            TransformOperation::Flip { .. } => "flip",
            TransformOperation::Watermark { .. } => "watermark",
            TransformOperation::Compress { .. } => "compress",
        }
    }
}

/// A request to derive one variant of a stored image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRequest {
    pub id: Uuid,
    pub operation: TransformOperation,
}

impl TransformRequest {
    pub fn new(id: Uuid, operation: TransformOperation) -> Self {
        Self { id, operation }
    }
}

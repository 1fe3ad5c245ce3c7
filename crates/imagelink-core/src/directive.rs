//! Transformation directive encoder and parser
//!
//! Maps one typed [`TransformOperation`] to the directive token the rendering
//! provider reads out of a delivery URL, and reads such a token back.
//!
//! The grammar is a comma-separated list of `key_value` fields:
//!
//! | operation | token |
//! |---|---|
//! | resize | `w_{w},h_{h},c_fill` |
//! | convert | `f_{format}` |
//! | filter | `e_grayscale`, `e_blur:200`, `e_sharpen` |
//! | crop | `c_crop,w_{w},h_{h},x_{x},y_{y}` |
//! | rotate | `a_{angle}` |
//! | flip | `a_hflip`, `a_vflip` |
//! | watermark | `l_{overlay},g_south_east,x_10,y_10,w_150` |
//! | compress | `q_{quality},f_auto` |
//!
//! Every caller-supplied string is checked against a safe-character pattern
//! before it is embedded, so a token can never carry a `/`, a `,` of its own,
//! or the locator insertion marker.
//!
//! # Example
//!
//! ```rust
//! use imagelink_core::directive;
//!
//! let token = directive::resize(100, 200).unwrap();
//! assert_eq!(token.as_str(), "w_100,h_200,c_fill");
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use regex::Regex;

use crate::error::AppError;
use crate::models::{FlipAxis, ImageFilter, TransformOperation};

/// Blur strength sent with `e_blur`
pub const BLUR_STRENGTH: u32 = 200;

/// Fixed placement of watermark overlays: bottom-right corner, 10px margins, 150px wide
pub const WATERMARK_PLACEMENT: &str = "g_south_east,x_10,y_10,w_150";

/// Quality used when the caller leaves it empty
pub const DEFAULT_QUALITY: &str = "auto";

const MAX_FORMAT_LENGTH: usize = 16;
const MAX_OVERLAY_ID_LENGTH: usize = 255;
const MAX_QUALITY_LENGTH: usize = 32;

const FORMAT_PATTERN: &str = r"^[a-z0-9]+$";
const OVERLAY_ID_PATTERN: &str = r"^[a-zA-Z0-9_\-\.:]+$";
const QUALITY_PATTERN: &str = r"^[a-zA-Z0-9:_]+$";

/// A validated, grammar-conformant directive for exactly one operation.
///
/// Only this module can build one, so any token handed to the locator
/// composer has passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectiveToken(String);

impl DirectiveToken {
    fn new(token: String) -> Self {
        DirectiveToken(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for DirectiveToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DirectiveToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Encodes operations into directive tokens.
///
/// This is the seam the transform orchestrator dispatches through; new
/// provider grammars plug in by implementing it.
pub trait DirectiveEncoder: Send + Sync {
    fn encode(&self, operation: &TransformOperation) -> Result<DirectiveToken, AppError>;
}

/// The provider grammar documented at the top of this module.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectiveGrammar;

impl DirectiveEncoder for DirectiveGrammar {
    fn encode(&self, operation: &TransformOperation) -> Result<DirectiveToken, AppError> {
        encode(operation)
    }
}

/// Encode any operation.
pub fn encode(operation: &TransformOperation) -> Result<DirectiveToken, AppError> {
    match operation {
        TransformOperation::Resize { width, height } => resize(*width, *height),
        TransformOperation::Convert { format } => convert(format),
        TransformOperation::Filter { filter: f } => Ok(filter(*f)),
        TransformOperation::Crop {
            width,
            height,
            x,
            y,
        } => crop(*width, *height, *x, *y),
        TransformOperation::Rotate { angle } => Ok(rotate(*angle)),
        TransformOperation::Flip { axis } => Ok(flip(*axis)),
        TransformOperation::Watermark { overlay_id } => watermark(overlay_id),
        TransformOperation::Compress { quality } => compress(quality),
    }
}

/// Fit-fill to `width` x `height`.
///
/// # Errors
/// `InvalidParameter` if either dimension is zero.
pub fn resize(width: u32, height: u32) -> Result<DirectiveToken, AppError> {
    ensure_positive_dimensions(width, height)?;
    Ok(DirectiveToken::new(format!("w_{},h_{},c_fill", width, height)))
}

/// Deliver in `format`, lower-cased.
///
/// # Errors
/// `InvalidParameter` if the format is empty, too long, or not alphanumeric.
pub fn convert(format: &str) -> Result<DirectiveToken, AppError> {
    if format.is_empty() {
        return Err(AppError::InvalidParameter(
            "Target format is required".to_string(),
        ));
    }
    let format = format.to_lowercase();
    if format.len() > MAX_FORMAT_LENGTH || !matches_pattern(&format, FORMAT_PATTERN)? {
        return Err(AppError::InvalidParameter(format!(
            "Invalid target format: {}. Use letters and digits only, up to {} characters",
            format, MAX_FORMAT_LENGTH
        )));
    }
    Ok(DirectiveToken::new(format!("f_{}", format)))
}

/// Apply one of the fixed filters.
pub fn filter(filter: ImageFilter) -> DirectiveToken {
    let token = match filter {
        ImageFilter::Grayscale => "e_grayscale".to_string(),
        ImageFilter::Blur => format!("e_blur:{}", BLUR_STRENGTH),
        ImageFilter::Sharpen => "e_sharpen".to_string(),
    };
    DirectiveToken::new(token)
}

/// Parse a filter name and encode it.
///
/// # Errors
/// `UnsupportedFilter` for anything outside grayscale, blur and sharpen.
pub fn filter_named(name: &str) -> Result<DirectiveToken, AppError> {
    Ok(filter(name.parse()?))
}

/// Cut a `width` x `height` region at (`x`, `y`).
///
/// # Errors
/// `InvalidParameter` if either dimension is zero.
pub fn crop(width: u32, height: u32, x: u32, y: u32) -> Result<DirectiveToken, AppError> {
    ensure_positive_dimensions(width, height)?;
    Ok(DirectiveToken::new(format!("c_crop,w_{},h_{},x_{},y_{}", width, height, x, y)))
}

/// Rotate by `angle` degrees. Any value is accepted.
pub fn rotate(angle: i32) -> DirectiveToken {
    DirectiveToken::new(format!("a_{}", angle))
}

/// Mirror along `axis`.
pub fn flip(axis: FlipAxis) -> DirectiveToken {
    let token = match axis {
        FlipAxis::Horizontal => "a_hflip",
        FlipAxis::Vertical => "a_vflip",
    };
    DirectiveToken::new(token.to_string())
}

/// Parse an axis name and encode it.
///
/// # Errors
/// `InvalidFlipAxis` unless the name is exactly "horizontal" or "vertical".
pub fn flip_named(axis: &str) -> Result<DirectiveToken, AppError> {
    Ok(flip(axis.parse()?))
}

/// Overlay the asset `overlay_id` at the fixed watermark placement.
///
/// # Errors
/// - `MissingWatermarkOverlay` if `overlay_id` is empty
/// - `InvalidParameter` if it holds anything but letters, digits, `_ - . :`
pub fn watermark(overlay_id: &str) -> Result<DirectiveToken, AppError> {
    if overlay_id.is_empty() {
        return Err(AppError::MissingWatermarkOverlay);
    }
    if overlay_id.len() > MAX_OVERLAY_ID_LENGTH
        || !matches_pattern(overlay_id, OVERLAY_ID_PATTERN)?
    {
        return Err(AppError::InvalidParameter(format!(
            "Invalid watermark overlay id: {}. Allowed: letters, digits, underscore (_), hyphen (-), dot (.), colon (:)",
            overlay_id
        )));
    }
    Ok(DirectiveToken::new(format!("l_{},{}", overlay_id, WATERMARK_PLACEMENT)))
}

/// Compress at `quality` with automatic format selection.
///
/// An empty quality means [`DEFAULT_QUALITY`].
///
/// # Errors
/// `InvalidParameter` if the quality holds anything but letters, digits, `:` and `_`.
pub fn compress(quality: &str) -> Result<DirectiveToken, AppError> {
    let quality = if quality.is_empty() {
        DEFAULT_QUALITY
    } else {
        quality
    };
    if quality.len() > MAX_QUALITY_LENGTH || !matches_pattern(quality, QUALITY_PATTERN)? {
        return Err(AppError::InvalidParameter(format!(
            "Invalid quality: {}. Use e.g. auto, auto:good or 60",
            quality
        )));
    }
    Ok(DirectiveToken::new(format!("q_{},f_auto", quality)))
}

/// Read a directive token back into the operation it encodes.
///
/// Only canonical tokens are accepted: the parsed operation must encode back
/// to the exact same string.
///
/// # Example
///
/// ```rust
/// use imagelink_core::directive;
/// use imagelink_core::TransformOperation;
///
/// let op = directive::parse("w_100,h_200,c_fill").unwrap();
/// assert_eq!(op, TransformOperation::Resize { width: 100, height: 200 });
/// ```
pub fn parse(token: &str) -> Result<TransformOperation, AppError> {
    let fields: Vec<&str> = token.split(',').collect();

    let operation = match fields.as_slice() {
        [w, h, "c_fill"] => TransformOperation::Resize {
            width: parse_field(w, "w")?,
            height: parse_field(h, "h")?,
        },
        ["c_crop", w, h, x, y] => TransformOperation::Crop {
            width: parse_field(w, "w")?,
            height: parse_field(h, "h")?,
            x: parse_field(x, "x")?,
            y: parse_field(y, "y")?,
        },
        [quality, "f_auto"] => TransformOperation::Compress {
            quality: field_value(quality, "q")?.to_string(),
        },
        [overlay, placement @ ..] if overlay.starts_with("l_") => {
            if placement.join(",") != WATERMARK_PLACEMENT {
                return Err(unknown_directive(token));
            }
            TransformOperation::Watermark {
                overlay_id: field_value(overlay, "l")?.to_string(),
            }
        }
        [single] => parse_single_field(single, token)?,
        _ => return Err(unknown_directive(token)),
    };

    if encode(&operation)?.as_str() != token {
        return Err(AppError::InvalidParameter(format!(
            "Directive is not in canonical form: {}",
            token
        )));
    }

    Ok(operation)
}

fn parse_single_field(field: &str, token: &str) -> Result<TransformOperation, AppError> {
    let (key, value) = field
        .split_once('_')
        .ok_or_else(|| unknown_directive(token))?;

    match (key, value) {
        ("f", format) => Ok(TransformOperation::Convert {
            format: format.to_string(),
        }),
        ("e", "grayscale") => Ok(TransformOperation::Filter {
            filter: ImageFilter::Grayscale,
        }),
        ("e", "sharpen") => Ok(TransformOperation::Filter {
            filter: ImageFilter::Sharpen,
        }),
        ("e", effect) if effect.starts_with("blur:") => Ok(TransformOperation::Filter {
            filter: ImageFilter::Blur,
        }),
        ("e", effect) => Err(AppError::UnsupportedFilter(effect.to_string())),
        ("a", "hflip") => Ok(TransformOperation::Flip {
            axis: FlipAxis::Horizontal,
        }),
        ("a", "vflip") => Ok(TransformOperation::Flip {
            axis: FlipAxis::Vertical,
        }),
        ("a", angle) => Ok(TransformOperation::Rotate {
            angle: angle
                .parse::<i32>()
                .map_err(|_| AppError::InvalidParameter(format!("Invalid angle: {}", angle)))?,
        }),
        _ => Err(unknown_directive(token)),
    }
}

/// Value of a `key_value` field, checking the key.
fn field_value<'a>(field: &'a str, key: &str) -> Result<&'a str, AppError> {
    match field.split_once('_') {
        Some((k, v)) if k == key => Ok(v),
        _ => Err(AppError::InvalidParameter(format!(
            "Expected field '{}_', found: {}",
            key, field
        ))),
    }
}

fn parse_field(field: &str, key: &str) -> Result<u32, AppError> {
    let value = field_value(field, key)?;
    value
        .parse::<u32>()
        .map_err(|_| AppError::InvalidParameter(format!("Invalid value for '{}': {}", key, value)))
}

fn unknown_directive(token: &str) -> AppError {
    AppError::InvalidParameter(format!("Unknown directive: {}", token))
}

fn ensure_positive_dimensions(width: u32, height: u32) -> Result<(), AppError> {
    if width == 0 || height == 0 {
        return Err(AppError::InvalidParameter(format!(
            "Width and height must be greater than 0 (got {}x{})",
            width, height
        )));
    }
    Ok(())
}

fn matches_pattern(value: &str, pattern: &str) -> Result<bool, AppError> {
    let re = Regex::new(pattern)
        .map_err(|e| AppError::Internal(format!("Failed to compile validation regex: {}", e)))?;
    Ok(re.is_match(value))
}

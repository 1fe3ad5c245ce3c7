//! Error types module
//!
//! All failures of the directive engine and its collaborators are unified
//! under [`AppError`]. Each variant is a distinct kind so the transport layer
//! can tell "not found" apart from "invalid input" apart from "the upstream
//! store broke".
//!
//! The `From<sqlx::Error>` conversion is gated behind the `sqlx` feature.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like oversized uploads
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
/// This trait allows errors to self-describe their HTTP response characteristics
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "IMAGE_NOT_FOUND")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Image not found: {0}")]
    ImageNotFound(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    #[error("Invalid flip axis: {0}")]
    InvalidFlipAxis(String),

    #[error("Missing watermark overlay id")]
    MissingWatermarkOverlay,

    #[error("Malformed locator: {0}")]
    MalformedLocator(String),

    #[error("Upstream store failure: {message}")]
    UpstreamStoreFailure {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Upstream failure without an underlying error value.
    pub fn upstream(message: impl Into<String>) -> Self {
        AppError::UpstreamStoreFailure {
            message: message.into(),
            source: None,
        }
    }

    /// Upstream failure carrying the error that caused it.
    pub fn upstream_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        AppError::UpstreamStoreFailure {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::upstream_with_source("Metadata store query failed", err)
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidParameter(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidParameter(format!("UUID parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
/// client_message stays per-variant for dynamic content.
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::ImageNotFound(_) => (
            404,
            "IMAGE_NOT_FOUND",
            false,
            Some("Verify the image ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidParameter(_) => (
            400,
            "INVALID_PARAMETER",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::UnsupportedFilter(_) => (
            400,
            "UNSUPPORTED_FILTER",
            false,
            Some("Use one of: grayscale, blur, sharpen"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidFlipAxis(_) => (
            400,
            "INVALID_FLIP_AXIS",
            false,
            Some("Use 'horizontal' or 'vertical'"),
            false,
            LogLevel::Debug,
        ),
        AppError::MissingWatermarkOverlay => (
            400,
            "MISSING_WATERMARK_OVERLAY",
            false,
            Some("Provide the public id of the overlay image"),
            false,
            LogLevel::Debug,
        ),
        AppError::MalformedLocator(_) => (
            500,
            "MALFORMED_LOCATOR",
            false,
            Some("Contact support if this error persists"),
            true,
            LogLevel::Error,
        ),
        AppError::UpstreamStoreFailure { .. } => (
            502,
            "UPSTREAM_STORE_FAILURE",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::PayloadTooLarge(_) => (
            413,
            "PAYLOAD_TOO_LARGE",
            false,
            Some("Reduce file size and upload again"),
            false,
            LogLevel::Warn,
        ),
        AppError::Internal(_) => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::ImageNotFound(_) => "ImageNotFound",
            AppError::InvalidParameter(_) => "InvalidParameter",
            AppError::UnsupportedFilter(_) => "UnsupportedFilter",
            AppError::InvalidFlipAxis(_) => "InvalidFlipAxis",
            AppError::MissingWatermarkOverlay => "MissingWatermarkOverlay",
            AppError::MalformedLocator(_) => "MalformedLocator",
            AppError::UpstreamStoreFailure { .. } => "UpstreamStoreFailure",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::Internal(_) => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::ImageNotFound(_) => "Image not found".to_string(),
            AppError::InvalidParameter(ref msg) => msg.clone(),
            AppError::UnsupportedFilter(ref name) => format!("Unsupported filter: {}", name),
            AppError::InvalidFlipAxis(ref axis) => format!("Invalid flip axis: {}", axis),
            AppError::MissingWatermarkOverlay => "Missing watermark overlay id".to_string(),
            AppError::MalformedLocator(_) => "Stored asset locator is malformed".to_string(),
            AppError::UpstreamStoreFailure { .. } => "Failed to reach the image store".to_string(),
            AppError::PayloadTooLarge(ref msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_not_found() {
        let err = AppError::ImageNotFound("abc".to_string());
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "IMAGE_NOT_FOUND");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "Image not found");
        assert!(!err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_validation_kinds_are_distinct_client_errors() {
        let errors = [
            AppError::InvalidParameter("width must be positive".to_string()),
            AppError::UnsupportedFilter("sepia".to_string()),
            AppError::InvalidFlipAxis("diagonal".to_string()),
            AppError::MissingWatermarkOverlay,
        ];
        let codes: Vec<&str> = errors.iter().map(|e| e.error_code()).collect();
        assert_eq!(
            codes,
            vec![
                "INVALID_PARAMETER",
                "UNSUPPORTED_FILTER",
                "INVALID_FLIP_AXIS",
                "MISSING_WATERMARK_OVERLAY"
            ]
        );
        for err in &errors {
            assert_eq!(err.http_status_code(), 400);
            assert!(!err.is_recoverable());
        }
    }

    #[test]
    fn test_error_metadata_upstream_failure() {
        let err = AppError::upstream_with_source(
            "Metadata store query failed",
            anyhow::anyhow!("connection reset"),
        );
        assert_eq!(err.http_status_code(), 502);
        assert_eq!(err.error_code(), "UPSTREAM_STORE_FAILURE");
        assert!(err.is_recoverable());
        assert!(err.is_sensitive());
        assert_eq!(err.client_message(), "Failed to reach the image store");
        assert!(err.detailed_message().contains("Caused by: connection reset"));
    }

    #[test]
    fn test_malformed_locator_is_server_side() {
        let err = AppError::MalformedLocator("no marker".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert!(err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_error_type_names() {
        assert_eq!(AppError::MissingWatermarkOverlay.error_type(), "MissingWatermarkOverlay");
        assert_eq!(
            AppError::upstream("down").error_type(),
            "UpstreamStoreFailure"
        );
    }
}

//! API constants

/// API base path prefix (version-independent)
pub const API_BASE: &str = "/api";

/// Current API version
pub const API_VERSION: &str = "v1";

/// Prefix of every versioned route
pub const API_PREFIX: &str = "/api/v1";

/// Where the OpenAPI document is served
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

/// Room for multipart framing on top of the file itself
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

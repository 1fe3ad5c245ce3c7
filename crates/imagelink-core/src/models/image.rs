use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A stored image: the provider's canonical locator for the untransformed
/// asset plus the codec tag reported at upload time.
///
/// Records are created once by the upload path and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Image {
    pub id: Uuid,
    /// Provider resource URL of the original asset
    pub canonical_locator: String,
    /// Codec tag, e.g. "jpg"
    pub format: String,
    pub uploaded_at: DateTime<Utc>,
}

impl Image {
    pub fn new(id: Uuid, canonical_locator: String, format: String) -> Self {
        Self {
            id,
            canonical_locator,
            format,
            uploaded_at: Utc::now(),
        }
    }
}

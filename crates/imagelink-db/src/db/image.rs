//! Image repository: create and read rows of the images table.

use imagelink_core::models::Image;
use imagelink_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Repository for the images table.
#[derive(Clone)]
pub struct ImageRepository {
    pool: PgPool,
}

impl ImageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new image record and return its id.
    #[tracing::instrument(skip(self, image), fields(db.table = "images", db.record_id = %image.id))]
    pub async fn create(&self, image: &Image) -> Result<Uuid, AppError> {
        let id: Uuid = sqlx::query_scalar::<Postgres, Uuid>(
            r#"
            INSERT INTO images (id, canonical_locator, format, uploaded_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(image.id)
        .bind(&image.canonical_locator)
        .bind(&image.format)
        .bind(image.uploaded_at)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(image_id = %id, "Image record created");
        Ok(id)
    }

    /// Fetch an image by id.
    #[tracing::instrument(skip(self), fields(db.table = "images", db.record_id = %id))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Image>, AppError> {
        let image = sqlx::query_as::<Postgres, Image>(
            "SELECT id, canonical_locator, format, uploaded_at FROM images WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(image)
    }
}

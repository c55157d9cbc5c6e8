use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query_as, query_scalar, FromRow, QueryBuilder, Row};
use tracing::{debug, instrument};

use super::{location_columns, location_from_columns};
use crate::{
    application::{
        dto::image_dto::ImageDTO, error::ApplicationError,
        repositories::image_repository::ImageRepository,
    },
    domain::models::image::{Image, ImageMetadata, NewImage, UpdatedImage},
};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Every column but `payload`, for reads that must not drag image bytes along.
const METADATA_COLUMNS: &str = "id, name, url, content_type, size, file_path, created_at, updated_at";

pub struct PgImageRepository {
    pool: sqlx::PgPool,
}

impl PgImageRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn migrate(&self) -> Result<(), ApplicationError> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| ApplicationError::DatabaseError(e.to_string()))
    }
}

#[async_trait]
impl ImageRepository for PgImageRepository {
    async fn create_image(&self, image: NewImage) -> Result<Image, ApplicationError> {
        let query = r#"
            INSERT INTO images (
                name, url, content_type, size, file_path, payload,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
        "#;

        let (file_path, payload) = location_columns(&image.location);
        let now = Utc::now();

        let created: Image = query_as::<_, Image>(query)
            .bind(&image.name)
            .bind(&image.url)
            .bind(&image.content_type)
            .bind(std::cmp::min(image.size, i64::MAX as u64) as i64)
            .bind(file_path)
            .bind(payload)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ApplicationError::DatabaseError(e.to_string()))?;

        debug!("Inserted image row {}", created.metadata.id);
        Ok(created)
    }

    async fn get_image(&self, id: i64) -> Result<Image, ApplicationError> {
        let query = "SELECT * FROM images WHERE id = $1";

        let fetched: Image = query_as::<_, Image>(query)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(fetched)
    }

    async fn get_image_by_name(&self, name: &str) -> Result<Image, ApplicationError> {
        let query = "SELECT * FROM images WHERE name = $1 ORDER BY id LIMIT 1";

        let fetched: Image = query_as::<_, Image>(query)
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        Ok(fetched)
    }

    async fn get_metadata(&self, id: i64) -> Result<ImageMetadata, ApplicationError> {
        let query = format!("SELECT {} FROM images WHERE id = $1", METADATA_COLUMNS);

        let fetched: ImageMetadata = query_as::<_, ImageMetadata>(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(fetched)
    }

    async fn list_images(&self) -> Result<Vec<ImageMetadata>, ApplicationError> {
        let query = format!("SELECT {} FROM images ORDER BY id", METADATA_COLUMNS);

        let rows: Vec<ImageMetadata> = query_as::<_, ImageMetadata>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ApplicationError::DatabaseError(e.to_string()))?;

        Ok(rows)
    }

    async fn count_images(&self) -> Result<u64, ApplicationError> {
        let count: i64 = query_scalar("SELECT COUNT(*) FROM images")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }

    async fn update_image(&self, image: ImageDTO) -> Result<UpdatedImage, ApplicationError> {
        let mut image = image;
        image.sanitize();

        if image.is_empty() {
            return Ok(UpdatedImage {
                image: self.get_image(image.id).await?,
                replaced: None,
            });
        }

        let (file_path, payload) = match &image.location {
            Some(location) => {
                let (file_path, payload) = location_columns(location);
                (Some(file_path), Some(payload))
            }
            None => (None, None),
        };

        // The row lock serializes concurrent updates, so each one hands back
        // exactly the location it displaced.
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "WITH previous AS (SELECT id, file_path, payload FROM images WHERE id = ",
        );
        builder.push_bind(image.id);
        builder.push(" FOR UPDATE) UPDATE images SET ");
        let mut separated = builder.separated(", ");

        if let Some(name) = &image.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name);
        }
        if let Some(content_type) = &image.content_type {
            separated.push("content_type = ");
            separated.push_bind_unseparated(content_type);
        }
        if let Some(size) = image.size {
            separated.push("size = ");
            separated.push_bind_unseparated(size as i64);
        }
        if let (Some(file_path), Some(payload)) = (file_path, payload) {
            // Both columns are written together to keep exactly one non-null.
            separated.push("file_path = ");
            separated.push_bind_unseparated(file_path);
            separated.push("payload = ");
            separated.push_bind_unseparated(payload);
        }
        separated.push("updated_at = ");
        separated.push_bind_unseparated(Utc::now());

        builder.push(
            " FROM previous WHERE images.id = previous.id \
             RETURNING images.*, previous.file_path AS previous_file_path, \
             previous.payload AS previous_payload",
        );

        let row = builder.build().fetch_one(&self.pool).await?;
        let updated = Image::from_row(&row)?;
        let replaced = if image.location.is_some() {
            Some(location_from_columns(
                updated.metadata.id,
                row.try_get("previous_file_path")?,
                row.try_get("previous_payload")?,
            )?)
        } else {
            None
        };

        Ok(UpdatedImage {
            image: updated,
            replaced,
        })
    }

    async fn delete_image(&self, id: i64) -> Result<ImageMetadata, ApplicationError> {
        let query = format!(
            "DELETE FROM images WHERE id = $1 RETURNING {}",
            METADATA_COLUMNS
        );

        let deleted: ImageMetadata = query_as::<_, ImageMetadata>(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::image::ImageLocation;

    async fn connect() -> PgImageRepository {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for this test");
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .unwrap();
        let repo = PgImageRepository::new(pool);
        repo.migrate().await.unwrap();
        repo
    }

    #[tokio::test]
    #[ignore = "needs a Postgres database in DATABASE_URL"]
    async fn postgres_crud_cycle() {
        let repo = connect().await;

        let created = repo
            .create_image(NewImage {
                name: "pg-test.png".to_string(),
                url: "/api/images/view/filename/pg-test.png".to_string(),
                content_type: "image/png".to_string(),
                size: 3,
                location: ImageLocation::Inline(vec![1, 2, 3]),
            })
            .await
            .unwrap();
        let id = created.metadata.id;
        assert_eq!(created.location, ImageLocation::Inline(vec![1, 2, 3]));

        let listed = repo.list_images().await.unwrap();
        assert!(listed.iter().any(|m| m.id == id));

        let mut update = ImageDTO::for_update(id);
        update.location = Some(ImageLocation::Inline(vec![9]));
        update.size = Some(1);
        let updated = repo.update_image(update).await.unwrap();
        assert_eq!(updated.replaced, Some(ImageLocation::Inline(vec![1, 2, 3])));
        assert_eq!(updated.image.location, ImageLocation::Inline(vec![9]));
        assert_eq!(updated.image.metadata.url, created.metadata.url);
        assert!(repo.count_images().await.unwrap() >= 1);

        repo.delete_image(id).await.unwrap();
        assert!(matches!(repo.get_image(id).await, Err(ApplicationError::NotFound)));
        assert!(matches!(repo.delete_image(id).await, Err(ApplicationError::NotFound)));
    }
}

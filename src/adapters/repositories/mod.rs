mod memory_image_repository;
mod pg_image_repository;

pub use memory_image_repository::InMemoryImageRepository;
pub use pg_image_repository::PgImageRepository;

use std::path::PathBuf;

use sqlx::{postgres::PgRow, FromRow, Row};

use crate::domain::{
    config::local::Provider,
    models::image::{Image, ImageLocation, ImageMetadata},
};

impl FromRow<'_, PgRow> for ImageMetadata {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let size: i64 = row.try_get("size")?;
        let file_path: Option<String> = row.try_get("file_path")?;

        Ok(ImageMetadata {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            url: row.try_get("url")?,
            content_type: row.try_get("content_type")?,
            size: size.max(0) as u64,
            provider: if file_path.is_some() {
                Provider::Disk
            } else {
                Provider::Inline
            },
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl FromRow<'_, PgRow> for Image {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let metadata = ImageMetadata::from_row(row)?;
        let location = location_from_columns(
            metadata.id,
            row.try_get("file_path")?,
            row.try_get("payload")?,
        )?;

        Ok(Image { metadata, location })
    }
}

/// Rebuilds a location from the `(file_path, payload)` column pair.
pub(crate) fn location_from_columns(
    id: i64,
    file_path: Option<String>,
    payload: Option<Vec<u8>>,
) -> Result<ImageLocation, sqlx::Error> {
    match (file_path, payload) {
        (Some(path), None) => Ok(ImageLocation::File(PathBuf::from(path))),
        (None, Some(payload)) => Ok(ImageLocation::Inline(payload)),
        _ => Err(sqlx::Error::Decode(
            format!("image {} must have exactly one of file_path, payload", id).into(),
        )),
    }
}

/// Splits a location into the `(file_path, payload)` column pair.
pub(crate) fn location_columns(location: &ImageLocation) -> (Option<String>, Option<&[u8]>) {
    match location {
        ImageLocation::File(path) => (Some(path.to_string_lossy().into_owned()), None),
        ImageLocation::Inline(payload) => (None, Some(payload.as_slice())),
    }
}

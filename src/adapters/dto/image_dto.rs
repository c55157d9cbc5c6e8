use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{config::local::Provider, models::image::ImageMetadata};

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub id: i64,
    pub name: String,
    pub url: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
    pub size: u64,
    pub provider: Provider,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<ImageMetadata> for ImageResponse {
    fn from(metadata: ImageMetadata) -> Self {
        Self {
            id: metadata.id,
            name: metadata.name,
            url: metadata.url,
            content_type: metadata.content_type,
            size: metadata.size,
            provider: metadata.provider,
            created_at: metadata.created_at,
            updated_at: metadata.updated_at,
        }
    }
}

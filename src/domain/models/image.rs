use std::path::PathBuf;

use chrono::{DateTime, Utc};
use crate::domain::config::local::Provider;

/// Where the bytes of an image live. A record has exactly one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageLocation {
    File(PathBuf),
    Inline(Vec<u8>),
}

impl ImageLocation {
    pub fn provider(&self) -> Provider {
        match self {
            ImageLocation::File(_) => Provider::Disk,
            ImageLocation::Inline(_) => Provider::Inline,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageMetadata {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub content_type: String,
    pub size: u64,
    pub provider: Provider,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Image {
    pub metadata: ImageMetadata,
    pub location: ImageLocation,
}

/// Result of a record update. `replaced` is the location the record pointed
/// at before, when the update swapped it out.
#[derive(Debug, Clone)]
pub struct UpdatedImage {
    pub image: Image,
    pub replaced: Option<ImageLocation>,
}

#[derive(Debug, Clone)]
pub struct NewImage {
    pub name: String,
    pub url: String,
    pub content_type: String,
    pub size: u64,
    pub location: ImageLocation,
}

#[derive(Debug, Clone)]
pub struct ImageContent {
    pub metadata: ImageMetadata,
    pub content: Vec<u8>,
}

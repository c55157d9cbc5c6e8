use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::{
    application::{
        dto::image_dto::ImageDTO, error::ApplicationError,
        repositories::image_repository::ImageRepository, services::StorageService,
    },
    domain::{
        config::local::Provider,
        models::{
            file::{sanitize_filename, FileData},
            image::{Image, ImageContent, ImageLocation, ImageMetadata, NewImage},
        },
    },
    services::StorageError,
};

pub const VIEW_BY_NAME_PATH: &str = "/api/images/view/filename";

/// Coordinates byte storage and the record store.
///
/// Bytes are always written before the record that points at them, and
/// removed before the record that owned them, so a failed call never leaves a
/// record without bytes.
pub struct ImageService {
    repository: Arc<dyn ImageRepository>,
    storage: Arc<dyn StorageService>,
}

impl ImageService {
    pub fn new(repository: Arc<dyn ImageRepository>, storage: Arc<dyn StorageService>) -> Self {
        Self {
            repository,
            storage,
        }
    }

    pub fn provider(&self) -> Provider {
        self.storage.provider()
    }

    pub async fn upload(
        &self,
        file: FileData,
        size_limit: Option<u64>,
    ) -> Result<ImageMetadata, ApplicationError> {
        if let Some(limit) = size_limit {
            if !file.validate_size(limit) {
                return Err(ApplicationError::PayloadTooLarge { limit });
            }
        }

        let name = sanitize_filename(&file.filename).ok_or_else(|| {
            ApplicationError::BadRequest(format!("Unusable filename: {:?}", file.filename))
        })?;
        let file = FileData { filename: name, ..file };

        let location = self.storage.store(&file).await?;

        let new_image = NewImage {
            url: format!(
                "{}/{}",
                VIEW_BY_NAME_PATH,
                urlencoding::encode(&file.filename)
            ),
            content_type: file.content_type(),
            size: file.size(),
            name: file.filename,
            location: location.clone(),
        };

        match self.repository.create_image(new_image).await {
            Ok(image) => {
                info!(
                    "Stored image {} ({}, {} bytes, {})",
                    image.metadata.id,
                    image.metadata.name,
                    image.metadata.size,
                    image.metadata.provider.as_str()
                );
                Ok(image.metadata)
            }
            Err(e) => {
                if let Err(cleanup) = self.release(&location).await {
                    error!("Failed to remove bytes of rejected upload: {}", cleanup);
                }
                Err(e)
            }
        }
    }

    pub async fn fetch_by_id(&self, id: i64) -> Result<ImageContent, ApplicationError> {
        debug!("Fetching image {}", id);
        let image = self.repository.get_image(id).await?;
        self.load(image).await
    }

    pub async fn fetch_by_name(&self, name: &str) -> Result<ImageContent, ApplicationError> {
        debug!("Fetching image by name {}", name);
        let image = self.repository.get_image_by_name(name).await?;
        self.load(image).await
    }

    pub async fn get_metadata(&self, id: i64) -> Result<ImageMetadata, ApplicationError> {
        self.repository.get_metadata(id).await
    }

    pub async fn list_metadata(&self) -> Result<Vec<ImageMetadata>, ApplicationError> {
        self.repository.list_images().await
    }

    pub async fn count(&self) -> Result<u64, ApplicationError> {
        self.repository.count_images().await
    }

    /// Replaces the bytes of an image, optionally renaming it.
    ///
    /// The new bytes get their own location. Whatever location the record
    /// swap displaced is released afterwards, so concurrent updates of one id
    /// each clean up after themselves. `url` is never rewritten.
    pub async fn update(
        &self,
        id: i64,
        file: FileData,
        new_name: Option<String>,
    ) -> Result<ImageMetadata, ApplicationError> {
        let current = self.repository.get_metadata(id).await?;

        let name = match new_name {
            Some(raw) => Some(sanitize_filename(&raw).ok_or_else(|| {
                ApplicationError::BadRequest(format!("Unusable filename: {:?}", raw))
            })?),
            None => None,
        };
        // Content type and extension follow the name the record will carry.
        let file = FileData {
            filename: name
                .clone()
                .unwrap_or_else(|| current.name.clone()),
            ..file
        };

        let location = self.storage.store(&file).await?;

        let mut update = ImageDTO::for_update(id);
        update.name = name;
        update.content_type = Some(file.content_type());
        update.size = Some(file.size());
        update.location = Some(location.clone());

        let updated = match self.repository.update_image(update).await {
            Ok(updated) => updated,
            Err(e) => {
                if let Err(cleanup) = self.release(&location).await {
                    error!("Failed to remove bytes of rejected update: {}", cleanup);
                }
                return Err(e);
            }
        };

        if let Some(replaced) = &updated.replaced {
            if let Err(e) = self.release(replaced).await {
                warn!("Image {} updated but old bytes were not released: {}", id, e);
            }
        }

        info!(
            "Updated image {} ({}, {} bytes)",
            id, updated.image.metadata.name, updated.image.metadata.size
        );
        Ok(updated.image.metadata)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApplicationError> {
        let image = self.repository.get_image(id).await?;

        self.release(&image.location).await?;
        self.repository.delete_image(id).await?;

        info!("Deleted image {} ({})", id, image.metadata.name);
        Ok(())
    }

    /// Inline records carry their bytes, whichever backend is configured.
    async fn load(&self, image: Image) -> Result<ImageContent, ApplicationError> {
        let content = match image.location {
            ImageLocation::Inline(payload) => payload,
            location @ ImageLocation::File(_) => self.storage.read(&location).await?,
        };
        Ok(ImageContent {
            metadata: image.metadata,
            content,
        })
    }

    async fn release(&self, location: &ImageLocation) -> Result<(), StorageError> {
        match location {
            ImageLocation::Inline(_) => Ok(()),
            ImageLocation::File(_) => self.storage.remove(location).await,
        }
    }
}

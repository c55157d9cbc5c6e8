use async_trait::async_trait;

use crate::{
    application::{dto::image_dto::ImageDTO, error::ApplicationError},
    domain::models::image::{Image, ImageMetadata, NewImage, UpdatedImage},
};

#[async_trait]
pub trait ImageRepository: Send + Sync {
    async fn create_image(&self, image: NewImage) -> Result<Image, ApplicationError>;
    async fn get_image(&self, id: i64) -> Result<Image, ApplicationError>;
    /// Names are not unique; the oldest record with the name wins.
    async fn get_image_by_name(&self, name: &str) -> Result<Image, ApplicationError>;
    async fn get_metadata(&self, id: i64) -> Result<ImageMetadata, ApplicationError>;
    async fn list_images(&self) -> Result<Vec<ImageMetadata>, ApplicationError>;
    async fn count_images(&self) -> Result<u64, ApplicationError>;
    /// Applies a partial update. When the location changes, the swap happens
    /// atomically and the previous location is handed back to the caller.
    async fn update_image(&self, image: ImageDTO) -> Result<UpdatedImage, ApplicationError>;
    async fn delete_image(&self, id: i64) -> Result<ImageMetadata, ApplicationError>;
}

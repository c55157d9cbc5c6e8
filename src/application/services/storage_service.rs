use async_trait::async_trait;

use crate::{
    domain::{
        config::local::Provider,
        models::{file::FileData, image::ImageLocation},
    },
    services::StorageError,
};

#[async_trait]
pub trait StorageService: Send + Sync {
    fn provider(&self) -> Provider;
    async fn store(&self, file_data: &FileData) -> Result<ImageLocation, StorageError>;
    async fn read(&self, location: &ImageLocation) -> Result<Vec<u8>, StorageError>;
    /// Removing bytes that are already gone succeeds.
    async fn remove(&self, location: &ImageLocation) -> Result<(), StorageError>;
}

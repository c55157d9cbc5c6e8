use async_trait::async_trait;

use crate::{
    application::services::StorageService,
    domain::{
        config::local::Provider,
        models::{file::FileData, image::ImageLocation},
    },
    services::{disk_storage::DiskStorageService, error::StorageError},
};

/// Keeps image bytes in the record itself. New writes never touch the
/// filesystem; an attached disk store only serves files written before the
/// provider was switched.
#[derive(Default)]
pub struct InlineStorageService {
    files: Option<DiskStorageService>,
}

impl InlineStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files(files: DiskStorageService) -> Self {
        Self { files: Some(files) }
    }

    fn files(&self) -> Result<&DiskStorageService, StorageError> {
        self.files.as_ref().ok_or(StorageError::ProviderMismatch {
            expected: Provider::Inline,
            found: Provider::Disk,
        })
    }
}

#[async_trait]
impl StorageService for InlineStorageService {
    fn provider(&self) -> Provider {
        Provider::Inline
    }

    async fn store(&self, file_data: &FileData) -> Result<ImageLocation, StorageError> {
        Ok(ImageLocation::Inline(file_data.content.clone()))
    }

    async fn read(&self, location: &ImageLocation) -> Result<Vec<u8>, StorageError> {
        match location {
            ImageLocation::Inline(payload) => Ok(payload.clone()),
            ImageLocation::File(_) => self.files()?.read(location).await,
        }
    }

    async fn remove(&self, location: &ImageLocation) -> Result<(), StorageError> {
        match location {
            ImageLocation::Inline(_) => Ok(()),
            ImageLocation::File(_) => self.files()?.remove(location).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[tokio::test]
    async fn bytes_live_in_the_location() {
        let storage = InlineStorageService::new();
        let file = FileData::new(b"payload".to_vec(), "a.gif".to_string(), None);

        let location = storage.store(&file).await.unwrap();

        assert_eq!(location, ImageLocation::Inline(b"payload".to_vec()));
        assert_eq!(storage.read(&location).await.unwrap(), b"payload");
        storage.remove(&location).await.unwrap();
    }

    #[tokio::test]
    async fn file_locations_need_attached_files() {
        let storage = InlineStorageService::new();
        let location = ImageLocation::File(PathBuf::from("/tmp/a.png"));

        assert!(matches!(
            storage.read(&location).await,
            Err(StorageError::ProviderMismatch {
                expected: Provider::Inline,
                found: Provider::Disk
            })
        ));
    }

    #[tokio::test]
    async fn serves_and_removes_files_left_by_disk_provider() {
        let dir = tempfile::tempdir().unwrap();
        let disk = DiskStorageService::init(dir.path()).await.unwrap();
        let file = FileData::new(b"on disk".to_vec(), "a.png".to_string(), None);
        let location = disk.store(&file).await.unwrap();

        let storage = InlineStorageService::with_files(disk);

        assert_eq!(storage.read(&location).await.unwrap(), b"on disk");
        storage.remove(&location).await.unwrap();
        assert!(matches!(
            storage.read(&location).await,
            Err(StorageError::NotFound(_))
        ));
        // New writes still go inline.
        assert!(matches!(
            storage.store(&file).await.unwrap(),
            ImageLocation::Inline(_)
        ));
    }
}

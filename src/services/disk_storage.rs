use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    application::services::StorageService,
    domain::{
        config::local::Provider,
        models::{file::FileData, image::ImageLocation},
    },
    services::error::StorageError,
};

/// Keeps image bytes as files under a single directory.
///
/// Every stored file gets a fresh `<uuid>[.<ext>]` name, so two uploads with the
/// same original filename never touch the same path.
pub struct DiskStorageService {
    directory: PathBuf,
}

impl DiskStorageService {
    /// Creates the storage directory if needed. Must run before the first write.
    pub async fn init(directory: impl AsRef<Path>) -> Result<Self, StorageError> {
        let directory = directory.as_ref();
        fs::create_dir_all(directory).await?;
        let directory = fs::canonicalize(directory).await?;
        info!("Disk image storage ready at {}", directory.display());
        Ok(Self { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn generate_file_path(&self, file_data: &FileData) -> PathBuf {
        let key = Uuid::new_v4();
        let file_name = match file_data.extension() {
            Some(ext) => format!("{}.{}", key, ext),
            None => key.to_string(),
        };
        self.directory.join(file_name)
    }

    fn owned_path<'a>(&self, location: &'a ImageLocation) -> Result<&'a Path, StorageError> {
        match location {
            ImageLocation::File(path) if path.starts_with(&self.directory) => Ok(path.as_path()),
            ImageLocation::File(path) => Err(StorageError::InternalError(format!(
                "path {} is outside of {}",
                path.display(),
                self.directory().display()
            ))),
            ImageLocation::Inline(_) => Err(StorageError::ProviderMismatch {
                expected: Provider::Disk,
                found: Provider::Inline,
            }),
        }
    }
}

#[async_trait]
impl StorageService for DiskStorageService {
    fn provider(&self) -> Provider {
        Provider::Disk
    }

    async fn store(&self, file_data: &FileData) -> Result<ImageLocation, StorageError> {
        let path = self.generate_file_path(file_data);

        debug!("Writing {} bytes to {}", file_data.size(), path.display());
        match write_or_discard(&path, &file_data.content).await {
            Ok(()) => Ok(ImageLocation::File(path)),
            Err(ref e) if e.kind() == ErrorKind::NotFound => {
                // Directory was removed underneath us.
                fs::create_dir_all(&self.directory).await?;
                write_or_discard(&path, &file_data.content).await?;
                Ok(ImageLocation::File(path))
            }
            Err(other) => Err(other.into()),
        }
    }

    async fn read(&self, location: &ImageLocation) -> Result<Vec<u8>, StorageError> {
        let path = self.owned_path(location)?;

        debug!("Reading image file {}", path.display());
        match fs::read(path).await {
            Ok(data) => Ok(data),
            Err(ref e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.display().to_string()))
            }
            Err(other) => Err(other.into()),
        }
    }

    async fn remove(&self, location: &ImageLocation) -> Result<(), StorageError> {
        let path = self.owned_path(location)?;

        match fs::remove_file(path).await {
            Ok(()) => {
                debug!("Deleted {}", path.display());
                Ok(())
            }
            Err(ref e) if e.kind() == ErrorKind::NotFound => {
                debug!("File not found (already deleted): {}", path.display());
                Ok(())
            }
            Err(other) => Err(other.into()),
        }
    }
}

/// Writes `content` to `path`. A write that fails midway leaves no file behind.
async fn write_or_discard(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let Err(e) = fs::write(path, content).await else {
        return Ok(());
    };

    match fs::remove_file(path).await {
        Ok(()) => debug!("Discarded partial write {}", path.display()),
        Err(ref cleanup) if cleanup.kind() == ErrorKind::NotFound => {}
        Err(cleanup) => warn!("Cannot discard partial write {}: {}", path.display(), cleanup),
    }
    Err(e)
}

mod disk_storage;
mod error;
mod inline_storage;

pub use disk_storage::DiskStorageService;
pub use error::StorageError;
pub use inline_storage::InlineStorageService;

use std::sync::Arc;

use crate::{
    application::services::StorageService,
    domain::config::local::{LocalConfig, Provider},
};

pub async fn create_storage_service(
    config: &LocalConfig,
) -> Result<Arc<dyn StorageService>, StorageError> {
    match config.provider {
        Provider::Disk => {
            let service = DiskStorageService::init(&config.storage_dir).await?;
            Ok(Arc::new(service))
        }
        Provider::Inline => {
            // Files from an earlier disk deployment stay readable and deletable.
            if tokio::fs::try_exists(&config.storage_dir).await? {
                let files = DiskStorageService::init(&config.storage_dir).await?;
                Ok(Arc::new(InlineStorageService::with_files(files)))
            } else {
                Ok(Arc::new(InlineStorageService::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn factory_selects_configured_provider() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = LocalConfig {
            storage_dir: dir.path().join("images"),
            ..Default::default()
        };

        let disk = create_storage_service(&config).await.unwrap();
        assert_eq!(disk.provider(), Provider::Disk);
        assert!(config.storage_dir.is_dir());

        config.provider = Provider::Inline;
        let inline = create_storage_service(&config).await.unwrap();
        assert_eq!(inline.provider(), Provider::Inline);

        config.storage_dir = dir.path().join("never-created");
        let inline = create_storage_service(&config).await.unwrap();
        assert_eq!(inline.provider(), Provider::Inline);
        assert!(!config.storage_dir.exists());
    }
}

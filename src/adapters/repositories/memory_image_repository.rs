use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    application::{
        dto::image_dto::ImageDTO, error::ApplicationError,
        repositories::image_repository::ImageRepository,
    },
    domain::models::image::{Image, ImageMetadata, NewImage, UpdatedImage},
};

#[derive(Default)]
struct MemoryState {
    last_id: i64,
    images: BTreeMap<i64, Image>,
}

/// Record store kept in process memory. Ids are handed out from a counter
/// that only ever grows, so deleted ids are never reused.
#[derive(Default)]
pub struct InMemoryImageRepository {
    state: Mutex<MemoryState>,
}

impl InMemoryImageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ImageRepository for InMemoryImageRepository {
    async fn create_image(&self, image: NewImage) -> Result<Image, ApplicationError> {
        let mut state = self.lock();
        state.last_id += 1;

        let now = Utc::now();
        let created = Image {
            metadata: ImageMetadata {
                id: state.last_id,
                name: image.name,
                url: image.url,
                content_type: image.content_type,
                size: image.size,
                provider: image.location.provider(),
                created_at: now,
                updated_at: now,
            },
            location: image.location,
        };
        state.images.insert(created.metadata.id, created.clone());
        Ok(created)
    }

    async fn get_image(&self, id: i64) -> Result<Image, ApplicationError> {
        self.lock()
            .images
            .get(&id)
            .cloned()
            .ok_or(ApplicationError::NotFound)
    }

    async fn get_image_by_name(&self, name: &str) -> Result<Image, ApplicationError> {
        self.lock()
            .images
            .values()
            .find(|image| image.metadata.name == name)
            .cloned()
            .ok_or(ApplicationError::NotFound)
    }

    async fn get_metadata(&self, id: i64) -> Result<ImageMetadata, ApplicationError> {
        self.lock()
            .images
            .get(&id)
            .map(|image| image.metadata.clone())
            .ok_or(ApplicationError::NotFound)
    }

    async fn list_images(&self) -> Result<Vec<ImageMetadata>, ApplicationError> {
        Ok(self
            .lock()
            .images
            .values()
            .map(|image| image.metadata.clone())
            .collect())
    }

    async fn count_images(&self) -> Result<u64, ApplicationError> {
        Ok(self.lock().images.len() as u64)
    }

    async fn update_image(&self, image: ImageDTO) -> Result<UpdatedImage, ApplicationError> {
        let mut image = image;
        image.sanitize();

        let mut state = self.lock();
        let stored = state
            .images
            .get_mut(&image.id)
            .ok_or(ApplicationError::NotFound)?;

        if let Some(name) = image.name {
            stored.metadata.name = name;
        }
        if let Some(content_type) = image.content_type {
            stored.metadata.content_type = content_type;
        }
        if let Some(size) = image.size {
            stored.metadata.size = size;
        }
        let replaced = image.location.map(|location| {
            stored.metadata.provider = location.provider();
            std::mem::replace(&mut stored.location, location)
        });
        stored.metadata.updated_at = Utc::now();

        Ok(UpdatedImage {
            image: stored.clone(),
            replaced,
        })
    }

    async fn delete_image(&self, id: i64) -> Result<ImageMetadata, ApplicationError> {
        self.lock()
            .images
            .remove(&id)
            .map(|image| image.metadata)
            .ok_or(ApplicationError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::domain::{config::local::Provider, models::image::ImageLocation};

    fn new_image(name: &str, payload: &[u8]) -> NewImage {
        NewImage {
            name: name.to_string(),
            url: format!("/api/images/view/filename/{}", name),
            content_type: "image/png".to_string(),
            size: payload.len() as u64,
            location: ImageLocation::Inline(payload.to_vec()),
        }
    }

    #[tokio::test]
    async fn create_assigns_increasing_ids() {
        let repo = InMemoryImageRepository::new();

        let a = repo.create_image(new_image("a.png", b"a")).await.unwrap();
        let b = repo.create_image(new_image("b.png", b"b")).await.unwrap();

        assert_eq!(a.metadata.id, 1);
        assert_eq!(b.metadata.id, 2);
        assert_eq!(a.metadata.provider, Provider::Inline);
        assert_eq!(repo.get_image(1).await.unwrap().location, ImageLocation::Inline(b"a".to_vec()));
    }

    #[tokio::test]
    async fn deleted_ids_are_not_reused() {
        let repo = InMemoryImageRepository::new();
        let a = repo.create_image(new_image("a.png", b"a")).await.unwrap();

        let deleted = repo.delete_image(a.metadata.id).await.unwrap();
        assert_eq!(deleted.id, a.metadata.id);

        let b = repo.create_image(new_image("a.png", b"a")).await.unwrap();
        assert_ne!(b.metadata.id, a.metadata.id);
        assert!(matches!(
            repo.get_image(a.metadata.id).await,
            Err(ApplicationError::NotFound)
        ));
    }

    #[tokio::test]
    async fn list_keeps_insertion_order() {
        let repo = InMemoryImageRepository::new();
        for name in ["c.png", "a.png", "b.png"] {
            repo.create_image(new_image(name, b"x")).await.unwrap();
        }

        let names: Vec<String> = repo
            .list_images()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();

        assert_eq!(names, vec!["c.png", "a.png", "b.png"]);
    }

    #[tokio::test]
    async fn lookup_by_name_prefers_oldest() {
        let repo = InMemoryImageRepository::new();
        let first = repo.create_image(new_image("same.png", b"1")).await.unwrap();
        repo.create_image(new_image("same.png", b"2")).await.unwrap();

        let found = repo.get_image_by_name("same.png").await.unwrap();

        assert_eq!(found.metadata.id, first.metadata.id);
        assert!(matches!(
            repo.get_image_by_name("other.png").await,
            Err(ApplicationError::NotFound)
        ));
    }

    #[tokio::test]
    async fn partial_update_touches_only_given_fields() {
        let repo = InMemoryImageRepository::new();
        let created = repo.create_image(new_image("a.png", b"old")).await.unwrap();

        let mut update = ImageDTO::for_update(created.metadata.id);
        update.size = Some(4);
        update.location = Some(ImageLocation::File(PathBuf::from("/srv/images/x.png")));
        let UpdatedImage { image: updated, replaced } = repo.update_image(update).await.unwrap();

        assert_eq!(replaced, Some(ImageLocation::Inline(b"old".to_vec())));
        assert_eq!(updated.location, ImageLocation::File(PathBuf::from("/srv/images/x.png")));
        assert_eq!(updated.metadata.name, "a.png");
        assert_eq!(updated.metadata.url, created.metadata.url);
        assert_eq!(updated.metadata.content_type, "image/png");
        assert_eq!(updated.metadata.size, 4);
        assert_eq!(updated.metadata.provider, Provider::Disk);
        assert_eq!(updated.metadata.created_at, created.metadata.created_at);
        assert!(updated.metadata.updated_at >= created.metadata.updated_at);
    }

    #[tokio::test]
    async fn update_without_location_replaces_nothing() {
        let repo = InMemoryImageRepository::new();
        let created = repo.create_image(new_image("a.png", b"old")).await.unwrap();

        let mut update = ImageDTO::for_update(created.metadata.id);
        update.name = Some("b.png".to_string());
        let updated = repo.update_image(update).await.unwrap();

        assert!(updated.replaced.is_none());
        assert_eq!(updated.image.metadata.name, "b.png");
        assert_eq!(updated.image.location, created.location);
    }

    #[tokio::test]
    async fn count_follows_creates_and_deletes() {
        let repo = InMemoryImageRepository::new();
        assert_eq!(repo.count_images().await.unwrap(), 0);

        let a = repo.create_image(new_image("a.png", b"a")).await.unwrap();
        repo.create_image(new_image("b.png", b"b")).await.unwrap();
        assert_eq!(repo.count_images().await.unwrap(), 2);

        repo.delete_image(a.metadata.id).await.unwrap();
        assert_eq!(repo.count_images().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let repo = InMemoryImageRepository::new();

        assert!(matches!(repo.get_metadata(9).await, Err(ApplicationError::NotFound)));
        assert!(matches!(
            repo.update_image(ImageDTO::for_update(9)).await,
            Err(ApplicationError::NotFound)
        ));
        assert!(matches!(repo.delete_image(9).await, Err(ApplicationError::NotFound)));
    }
}

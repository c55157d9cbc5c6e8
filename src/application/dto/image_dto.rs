use crate::domain::models::image::ImageLocation;

/// Partial update of an image record. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ImageDTO {
    pub id: i64,
    pub name: Option<String>,
    pub content_type: Option<String>,
    pub size: Option<u64>,
    pub location: Option<ImageLocation>,
}

impl ImageDTO {
    pub fn for_update(id: i64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.content_type.is_none()
            && self.size.is_none()
            && self.location.is_none()
    }

    pub fn sanitize(&mut self) {
        if let Some(size) = self.size {
            self.size = Some(std::cmp::min(size, i64::MAX as u64));
        }
    }
}

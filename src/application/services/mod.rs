mod image_service;
mod storage_service;

pub use image_service::ImageService;
pub use storage_service::StorageService;

pub mod image_repository;

pub mod health_controller;
pub mod image_controller;

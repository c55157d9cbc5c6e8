use axum::extract::FromRef;
use std::sync::Arc;

use crate::{application::services::ImageService, domain::config::local::LocalConfig};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub config: Arc<LocalConfig>,
    pub image_service: Arc<ImageService>,
}

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};

use crate::adapters::{
    controllers::{health_controller::HealthController, image_controller::ImageController},
    state::AppState,
};

/// Builds every route of the service. Cross-cutting layers (CORS, tracing)
/// are added by the caller.
pub fn create_router(app_state: AppState) -> Router {
    let image_routes = Router::new()
        .route("/api/images", get(ImageController::list_images))
        .route("/api/images/{id}", get(ImageController::get_image))
        .route(
            "/api/images/upload/limited",
            post(ImageController::upload_limited),
        )
        .route(
            "/api/images/upload/unlimited",
            post(ImageController::upload_unlimited),
        )
        .route("/api/images/view/id/{id}", get(ImageController::view_by_id))
        .route(
            "/api/images/view/filename/{name}",
            get(ImageController::view_by_filename),
        )
        .route(
            "/api/images/update/{id}",
            put(ImageController::update_image),
        )
        .route(
            "/api/images/delete/{id}",
            delete(ImageController::delete_image),
        )
        // Upload size is governed by the service, not by axum's 2 MB default.
        .layer(DefaultBodyLimit::disable());

    Router::new()
        .route("/api/health", get(HealthController::health_check))
        .merge(image_routes)
        .with_state(app_state)
}

mod adapters;
mod application;
mod domain;
mod services;

use std::sync::Arc;

use adapters::{
    repositories::{InMemoryImageRepository, PgImageRepository},
    router::create_router,
    state::AppState,
};
use application::{repositories::image_repository::ImageRepository, services::ImageService};
use domain::config::local::LocalConfig;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = LocalConfig::from_env().expect("ERROR: Invalid configuration");

    tracing::info!(
        "Starting image-upload-service with {} storage and {} record store",
        config.provider.as_str(),
        config.record_store()
    );

    // Configure CORS
    let cors = if let Some(origins) = &config.cors_allowed_origins {
        let origins: Vec<_> = origins
            .iter()
            .map(|s| s.parse().expect("Invalid CORS origin"))
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // Allow all origins if not specified (only for development)
        CorsLayer::permissive()
    };

    let repository: Arc<dyn ImageRepository> = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(std::time::Duration::from_secs(30))
                .connect(database_url)
                .await
                .expect("ERROR: Failed to connect to PostgreSQL database. Check DATABASE_URL and network connectivity.");

            let repository = PgImageRepository::new(pool);
            repository
                .migrate()
                .await
                .expect("ERROR: Failed to run database migrations");
            tracing::info!("Database connection established");
            Arc::new(repository)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, image records are kept in memory only");
            Arc::new(InMemoryImageRepository::new())
        }
    };

    // The storage directory is created here, before the first request.
    let storage_service = services::create_storage_service(&config)
        .await
        .expect("Failed to create storage service");

    let port = config.port;
    let app_state = AppState {
        config: Arc::new(config),
        image_service: Arc::new(ImageService::new(repository, storage_service)),
    };

    let router = create_router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start the server
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .expect("Failed to bind to port");

    tracing::info!("Server listening on 0.0.0.0:{}", port);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

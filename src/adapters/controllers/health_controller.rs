use axum::{extract::State, Json};
use serde::Serialize;
use sysinfo::System;
use tracing::info;

use crate::{adapters::state::AppState, application::error::ApplicationError};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub provider: String,
    #[serde(rename = "recordStore")]
    pub record_store: String,
    #[serde(rename = "uploadSizeLimit")]
    pub upload_size_limit: u64,
    #[serde(rename = "imageCount")]
    pub image_count: u64,
    pub metrics: SystemMetrics,
}

#[derive(Debug, Serialize)]
pub struct SystemMetrics {
    #[serde(rename = "cpuUsagePercent")]
    pub cpu_usage_percent: f32,
    #[serde(rename = "memoryUsedBytes")]
    pub memory_used_bytes: u64,
    #[serde(rename = "memoryTotalBytes")]
    pub memory_total_bytes: u64,
    #[serde(rename = "memoryUsagePercent")]
    pub memory_usage_percent: f32,
}

pub struct HealthController;

impl HealthController {
    /// GET /api/health
    pub async fn health_check(
        State(app_state): State<AppState>,
    ) -> Result<Json<HealthResponse>, ApplicationError> {
        info!("Health check requested");

        // Also proves the record store answers.
        let image_count = app_state.image_service.count().await?;

        let mut sys = System::new();
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        let memory_used = sys.used_memory();
        let memory_total = sys.total_memory();
        let memory_usage_percent = if memory_total > 0 {
            (memory_used as f32 / memory_total as f32) * 100.0
        } else {
            0.0
        };

        Ok(Json(HealthResponse {
            status: "healthy".to_string(),
            provider: app_state.image_service.provider().as_str().to_string(),
            record_store: app_state.config.record_store().to_string(),
            upload_size_limit: app_state.config.upload_size_limit,
            image_count,
            metrics: SystemMetrics {
                cpu_usage_percent: sys.global_cpu_usage(),
                memory_used_bytes: memory_used,
                memory_total_bytes: memory_total,
                memory_usage_percent,
            },
        }))
    }
}

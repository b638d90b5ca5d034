// handlers/public/mod.rs - Public handlers (no authentication required)

use axum::extract::State;
use serde::Serialize;
use tracing::warn;

use crate::config::Environment;
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::routes::AppState;

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub environment: Environment,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: &'static str,
}

/// GET / - service name and version
pub async fn root(State(state): State<AppState>) -> ApiResult<ServiceInfo> {
    Ok(ApiResponse::success(ServiceInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment,
    }))
}

/// GET /health - 200 when the database answers, 503 otherwise
pub async fn health(State(state): State<AppState>) -> ApiResult<HealthStatus> {
    DatabaseManager::health_check(&state.pool).await.map_err(|e| {
        warn!("Health check failed: {}", e);
        ApiError::ServiceUnavailable("Database temporarily unavailable".to_string())
    })?;

    Ok(ApiResponse::success(HealthStatus {
        status: "ok",
        database: "connected",
    }))
}

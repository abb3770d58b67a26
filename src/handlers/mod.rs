//! # API Handlers
//!
//! This module contains all the HTTP endpoint handlers for the repolink API.

use axum::{extract::State, http::StatusCode, response::Json};

use crate::db;
use crate::error::ApiError;
use crate::models::ServiceInfo;
use crate::server::AppState;

pub mod connectors;
pub mod files;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Liveness/readiness probe backed by a database round trip
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Database unreachable", body = ApiError)
    ),
    tag = "root"
)]
pub async fn healthz(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    db::health_check(&state.db).await.map_err(|e| {
        tracing::error!("Health check failed: {:?}", e);
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Database unreachable",
        )
    })?;

    Ok(StatusCode::OK)
}

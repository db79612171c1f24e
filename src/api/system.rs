//! Health and status endpoints.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, SystemStatus};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthReadyResponse {
    pub ready: bool,
    pub database: bool,
}

/// `GET /api/system/health`
pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::success(HealthResponse { status: "ok" }))
}

/// `GET /api/system/health/ready`
///
/// Readiness probe that checks database connectivity.
pub async fn health_ready(State(state): State<Arc<AppState>>) -> Response {
    let database = state.store().ping().await.is_ok();

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ApiResponse::success(HealthReadyResponse {
            ready: database,
            database,
        })),
    )
        .into_response()
}

/// `GET /api/system/status`
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SystemStatus>>, ApiError> {
    let users = state.store().count_users().await?;
    let items = state.store().list_items().await?.len();

    Ok(Json(ApiResponse::success(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        users,
        items,
    })))
}

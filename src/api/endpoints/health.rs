//! Welcome and health check endpoints.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct WelcomeResponse {
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// `GET /`
pub async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the Community Health Tracker API",
    })
}

/// `GET /health`: liveness plus a database round trip.
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
    }))
}

//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::pdf::PoolStatus;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
    pub browser_pool: PoolStatus,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.store.ping().await {
        Ok(()) => "connected",
        Err(_) => "disconnected",
    };
    let browser_pool = state.renderer.health();
    let status = if database == "connected" && !browser_pool.closed {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        browser_pool,
    })
}

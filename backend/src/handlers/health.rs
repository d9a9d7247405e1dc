//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub farm_api: String,
    pub utc_offset: String,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    // Check the farm API answers
    let farm_api = match state.source.billing_defaults().await {
        Ok(_) => "connected".to_string(),
        Err(_) => "unreachable".to_string(),
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        farm_api,
        utc_offset: state.calendar.offset().to_string(),
    })
}

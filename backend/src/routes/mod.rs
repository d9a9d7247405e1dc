//! Route definitions for the milk collection console

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Unit conversion and dashboard
        .nest("/milk", milk_routes())
        // Production entry
        .nest("/milk-productions", production_routes())
        // Deliveries to buyers
        .nest("/milk-deliveries", delivery_routes())
        // Period reports
        .nest("/reports", report_routes())
}

fn milk_routes() -> Router<AppState> {
    Router::new()
        .route("/convert", post(handlers::convert_quantity))
        .route("/daily-summary", get(handlers::get_daily_summary))
}

fn production_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_production))
        .route("/bulk", post(handlers::create_productions_bulk))
        .route("/:id", put(handlers::update_production))
}

fn delivery_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_delivery))
        .route("/:id", put(handlers::update_delivery))
}

fn report_routes() -> Router<AppState> {
    Router::new().route("/production", get(handlers::get_production_report))
}

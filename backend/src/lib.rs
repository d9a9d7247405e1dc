//! Milk Collection Console - Backend
//!
//! HTTP front for recording milkings and deliveries on top of the farm
//! API, with conflict-gated batch entry, daily shift totals and period
//! reports.

use std::sync::Arc;

use axum::{routing::get, Router};
use shared::{Clock, LocalCalendar};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod routes;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use external::{FarmApiClient, FarmDataSource, InMemoryFarmData};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn FarmDataSource>,
    pub config: Arc<Config>,
    pub calendar: LocalCalendar,
    pub clock: Arc<dyn Clock>,
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Milk Collection Console API v1.0"
}

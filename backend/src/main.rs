//! Milk Collection Console - Backend Server

use std::{net::SocketAddr, sync::Arc};

use milk_collection_backend::{create_app, AppState, Config, FarmApiClient};
use shared::SystemClock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "milk_collection_backend=debug,shared=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Milk Collection Console");
    tracing::info!("Environment: {}", config.environment);

    let calendar = config.calendar.local_calendar()?;
    tracing::info!(utc_offset = %calendar.offset(), "local calendar configured");

    let farm_api = FarmApiClient::new(&config.farm_api)?;
    tracing::info!(base_url = %config.farm_api.base_url, "farm API client ready");

    let state = AppState {
        source: Arc::new(farm_api),
        config: Arc::new(config.clone()),
        calendar,
        clock: Arc::new(SystemClock),
    };

    let app = create_app(state);

    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((host, config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

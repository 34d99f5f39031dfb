mod alerts;
mod api;
mod config;
mod db;
mod error;
mod models;
mod realtime;
mod sms;
mod triangulation;

use std::sync::Arc;

use config::AppConfig;
use realtime::Broadcaster;
use sms::AfricasTalkingGateway;
use tracing::info;
use triangulation::SimulatedEstimator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load config
    let config = AppConfig::load()?;

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .init();

    info!("Starting GuardianCall backend...");

    // Init DB
    let pool = db::init_pool(&config.database_url).await?;
    info!("Connected to database");

    let broadcaster = Broadcaster::new(config.broadcast_capacity);
    let estimator = Arc::new(SimulatedEstimator::default());
    let gateway = Arc::new(AfricasTalkingGateway::new(&config));

    let state = api::AppState::new(pool, broadcaster, estimator, gateway);
    let app = api::create_router(state);

    let addr = format!("{}:{}", config.http_host, config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("GuardianCall backend listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

use anyhow::Result;
use plumecast::{PlumecastConfig, telemetry, web};

#[tokio::main]
async fn main() -> Result<()> {
    let config = PlumecastConfig::load()?;
    telemetry::init(&config.logging)?;

    tracing::info!("Starting plumecast {}", plumecast::VERSION);
    web::run(&config).await
}

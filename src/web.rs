use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::api::{self, AppState, SharedState};
use crate::config::PlumecastConfig;

/// Full application router with the API nested under `/api`
pub fn app(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new().nest("/api", api::router(state)).layer(cors)
}

/// Serve on an already bound listener until the server stops
pub async fn serve(listener: TcpListener, state: SharedState) -> crate::Result<()> {
    axum::serve(listener, app(state)).await?;
    Ok(())
}

pub async fn run(config: &PlumecastConfig) -> Result<()> {
    let state = Arc::new(AppState::from_config(config)?);

    let addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://{}", addr);
    match config.remote.base_url.as_deref() {
        Some(url) => tracing::info!("Remote dispersion model at {}", url),
        None => tracing::info!("No remote dispersion model configured, using local estimates"),
    }

    serve(listener, state).await?;
    Ok(())
}

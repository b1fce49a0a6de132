use std::sync::Arc;

use anyhow::Context;

use stockbridge_api::app::{build_app, services::AppServices};
use stockbridge_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockbridge_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!(?config, "configuration loaded");

    let services = AppServices::from_config(&config)
        .await
        .context("failed to initialise stores")?;
    let app = build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

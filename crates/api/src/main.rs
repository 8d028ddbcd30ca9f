use std::sync::Arc;

use anyhow::Context;

use itembox_api::{app, config::ApiConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    itembox_observability::init();

    let config = ApiConfig::from_env();
    let services = app::services::build_services(&config).await?;
    let app = app::build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

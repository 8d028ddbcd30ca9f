use std::sync::Arc;

use anyhow::Context;

use itembox_auth::{Hs256TokenCodec, TokenCodec};
use itembox_infra::{InMemoryStore, PostgresStore, Store};

use crate::config::ApiConfig;

/// Shared collaborators handed to every handler.
#[derive(Clone)]
pub struct AppServices {
    pub store: Arc<dyn Store>,
    pub codec: Arc<dyn TokenCodec>,
}

impl AppServices {
    pub fn new(store: Arc<dyn Store>, codec: Arc<dyn TokenCodec>) -> Self {
        Self { store, codec }
    }

    /// In-memory wiring (dev/test).
    pub fn in_memory(jwt_secret: &str) -> Self {
        Self::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(Hs256TokenCodec::new(jwt_secret)),
        )
    }
}

/// Wire the store selected by configuration: Postgres when `DATABASE_URL`
/// is set, otherwise in-memory.
pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set; using in-memory store");
        return Ok(AppServices::in_memory(&config.jwt_secret));
    };

    let store = PostgresStore::connect(database_url)
        .await
        .context("failed to connect to Postgres")?;
    store.migrate().await.context("failed to create schema")?;
    tracing::info!("using Postgres store");

    Ok(AppServices::new(
        Arc::new(store),
        Arc::new(Hs256TokenCodec::new(&config.jwt_secret)),
    ))
}

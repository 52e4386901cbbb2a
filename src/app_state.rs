use std::sync::Arc;

use crate::{
    config::Config,
    error::AppResult,
    store::{CatalogStore, MemoryStore, SqliteStore},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CatalogStore>,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let store = SqliteStore::new(&config.database.url, config.cache.capacity).await?;
        store.init().await?;

        Ok(Self {
            store: Arc::new(store),
            config,
        })
    }

    /// Dev/test state backed by the in-memory store.
    pub fn in_memory(config: Config) -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            config,
        }
    }
}

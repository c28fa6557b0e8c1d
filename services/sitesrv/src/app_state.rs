//! Application state shared across handlers

use std::sync::Arc;
use std::time::Instant;

use common::sqlite::SqliteClient;
use tracing::info;

use crate::config::Config;
use crate::error::{Result, SiteSrvError};
use crate::store::SiteStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: Arc<SqliteClient>,
    pub store: SiteStore,
    started_at: Instant,
}

impl AppState {
    /// Open the configured database, prepare the schema, and assemble
    /// shared state
    pub async fn new(config: Config) -> Result<Self> {
        let client = SqliteClient::new(&config.database.path)
            .await
            .map_err(|e| SiteSrvError::storage(format!("Failed to open database: {e}")))?;
        Self::with_client(config, Arc::new(client)).await
    }

    /// Assemble state over an already opened database connection
    pub async fn with_client(config: Config, client: Arc<SqliteClient>) -> Result<Self> {
        let store = SiteStore::new(client.clone());
        store.init_schema().await?;

        info!("Database ready at {}", client.path());

        Ok(Self {
            config: Arc::new(config),
            client,
            store,
            started_at: Instant::now(),
        })
    }

    /// Seconds elapsed since state creation
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    #[tokio::test]
    async fn test_state_over_memory_database() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let client = Arc::new(SqliteClient::from_pool(pool));
        let state = AppState::with_client(Config::default(), client).await.unwrap();

        assert_eq!(state.store.count().await.unwrap(), 0);
        assert_eq!(state.config.service.name, "sitesrv");
    }
}

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::Mutex;

use crate::config::{AppConfig, StorageMode};
use crate::rotation::Session;
use crate::schemes::services::restore_session;
use crate::storage::{MealStore, MemoryStore, PgStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn MealStore>,
    /// Active scheme, working pool and pending recommendations.
    pub session: Arc<Mutex<Session>>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let store: Arc<dyn MealStore> = match (config.storage_mode, &config.database_url) {
            (StorageMode::Postgres, Some(url)) => {
                let db = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(config.db_max_connections)
                    .connect(url)
                    .await
                    .context("connecting to postgres")?;
                sqlx::migrate!("./migrations")
                    .run(&db)
                    .await
                    .context("running migrations")?;
                Arc::new(PgStore::new(db))
            }
            (StorageMode::Postgres, None) => anyhow::bail!("DATABASE_URL is not set"),
            (StorageMode::Memory, _) => {
                tracing::warn!("using in-memory storage; data is lost on restart");
                Arc::new(MemoryStore::new())
            }
        };

        Self::from_parts(Arc::new(config), store).await
    }

    /// Restores the active scheme from saved settings before serving.
    pub async fn from_parts(config: Arc<AppConfig>, store: Arc<dyn MealStore>) -> anyhow::Result<Self> {
        let mut session = Session::new();
        restore_session(store.as_ref(), &mut session)
            .await
            .context("restoring the active scheme")?;
        Ok(Self {
            config,
            store,
            session: Arc::new(Mutex::new(session)),
        })
    }

    #[cfg(test)]
    pub async fn fake() -> Self {
        Self::from_parts(
            Arc::new(AppConfig::memory()),
            Arc::new(MemoryStore::new()),
        )
        .await
        .expect("memory store seeds a default scheme")
    }
}

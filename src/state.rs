use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::auth::{
    clock::{Clock, SystemClock},
    jwt::JwtKeys,
};
use crate::config::{AppConfig, StoreBackend};
use crate::users::{memory::MemoryUserStore, repo::PgUserStore, repo::UserStore};

/// Collaborators every request needs. Built once in `main`, read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: Arc<JwtKeys>,
    pub clock: Arc<dyn Clock>,
    pub users: Arc<dyn UserStore>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let users: Arc<dyn UserStore> = match config.store {
            StoreBackend::Memory => {
                tracing::warn!("using in-memory user store; data is lost on restart");
                Arc::new(MemoryUserStore::new())
            }
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL missing for postgres store")?;
                let db = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;

                if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                    tracing::warn!(error = %e, "migration failed; continuing");
                }
                Arc::new(PgUserStore::new(db))
            }
        };

        Ok(Self::from_parts(config, Arc::new(SystemClock), users))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        clock: Arc<dyn Clock>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        let keys = Arc::new(JwtKeys::from_config(&config.jwt));
        Self {
            config,
            keys,
            clock,
            users,
        }
    }

    /// In-memory store and a caller-supplied clock; no database or env needed.
    #[cfg(test)]
    pub fn fake(clock: Arc<dyn Clock>) -> Self {
        let config = Arc::new(AppConfig {
            store: StoreBackend::Memory,
            database_url: None,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 30,
            },
        });
        Self::from_parts(config, clock, Arc::new(MemoryUserStore::new()))
    }
}

use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::auth::jwt::JwtKeys;
use crate::config::AppConfig;
use crate::users::{memory::MemoryUserStore, pg::PgUserStore, repo::UserStore};

/// Applies `./migrations`. The users table only exists through them, so a
/// failure aborts startup.
pub async fn run_migrations(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub jwt: JwtKeys,
}

impl AppState {
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let store = match &config.database_url {
            Some(url) => {
                let db = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;

                run_migrations(&db).await?;
                Arc::new(PgUserStore::new(db)) as Arc<dyn UserStore>
            }
            None => {
                tracing::warn!("DATABASE_URL not set; users are kept in memory");
                Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>
            }
        };

        Ok(Self::from_parts(store, config))
    }

    pub fn from_parts(store: Arc<dyn UserStore>, config: &AppConfig) -> Self {
        Self {
            store,
            jwt: JwtKeys::from_config(&config.jwt),
        }
    }

    #[cfg(test)]
    pub fn in_memory(secret: &str) -> Self {
        let config = AppConfig {
            database_url: None,
            jwt: crate::config::JwtConfig {
                secret: secret.into(),
            },
            host: "127.0.0.1".into(),
            port: 0,
        };
        Self::from_parts(Arc::new(MemoryUserStore::new()), &config)
    }
}

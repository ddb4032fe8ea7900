//! Shared application state.

use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    auth::{HeaderIdentity, SharedIdentityStrategy},
    config::Config,
    db::{PgRepository, Repository, UnconfiguredRepository},
    Error, Result,
};

/// Shared application state passed to all handlers.
///
/// The repository and the identity strategy are both trait objects selected
/// once at process start; handlers only see the contracts.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub identity: SharedIdentityStrategy,
    pub repo: Arc<dyn Repository>,
}

impl AppState {
    /// Initialize the application state, connecting to Postgres when a
    /// database URL is configured.
    pub async fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);

        let repo: Arc<dyn Repository> = match &config.database.url {
            Some(url) => {
                let pool = create_db_pool(&config, url).await?;

                tracing::info!("Running database migrations...");
                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .map_err(|e| Error::Internal(format!("migration failed: {e}")))?;

                Arc::new(PgRepository::new(
                    pool,
                    Duration::from_secs(config.database.ping_timeout_seconds),
                ))
            }
            None => {
                tracing::warn!(
                    "no database URL configured; store-backed endpoints will fail"
                );
                Arc::new(UnconfiguredRepository)
            }
        };

        Ok(Self::with_repository(config, repo))
    }

    /// Assemble state around an existing repository. Used by tests to wire
    /// the real router to an in-memory store.
    pub fn with_repository(config: Arc<Config>, repo: Arc<dyn Repository>) -> Self {
        Self {
            config,
            identity: Arc::new(HeaderIdentity),
            repo,
        }
    }
}

async fn create_db_pool(config: &Config, url: &str) -> Result<PgPool> {
    tracing::info!("Creating database connection pool...");

    let pool = sqlx::postgres::PgPoolOptions::new()
        .min_connections(config.database.pool_min_size)
        .max_connections(config.database.pool_max_size)
        .acquire_timeout(Duration::from_secs(config.database.pool_timeout_seconds))
        .connect(url)
        .await
        .map_err(Error::Database)?;

    tracing::info!(
        "Database pool created (min: {}, max: {})",
        config.database.pool_min_size,
        config.database.pool_max_size
    );

    Ok(pool)
}

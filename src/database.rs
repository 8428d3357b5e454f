use sqlx::migrate::MigrateError;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("DATABASE_URL must be set for postgres storage")]
    MissingUrl,
    #[error("failed to connect to postgres: {0}")]
    Connect(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migrate(#[from] MigrateError),
}

#[derive(Clone)]
pub struct Database {
    pub pool: Pool<Postgres>,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let url = config.url.as_deref().ok_or(DatabaseError::MissingUrl)?;
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(url)
            .await?;

        info!("Connected to postgres (pool size {})", config.pool_size);
        Ok(Database { pool })
    }

    /// Схема: пользователи, фильмы, кинотеатры, сеансы, брони и избранное.
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        info!("Applying booking schema migrations");
        sqlx::migrate!("./src/migrations").run(&self.pool).await?;
        Ok(())
    }
}

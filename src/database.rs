use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;

#[derive(Clone)]
pub struct Database {
    pub pool: Pool<Postgres>,
}

impl Database {
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .connect(url)
            .await?;

        info!(pool_size = config.pool_size, "database pool ready");
        Ok(Database { pool })
    }

    /// Applies the schema and the seed catalog.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("running database migrations");
        sqlx::migrate!("./src/migrations").run(&self.pool).await?;
        info!("migrations completed");
        Ok(())
    }
}

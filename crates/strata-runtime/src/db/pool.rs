use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use tracing::debug;

use strata_core::config::DatabaseConfig;
use strata_core::context::ExecContext;
use strata_core::error::{Result, StrataError};

/// Database handle. Acquired once at startup, passed to every operation, and
/// released with [`Database::close`] at shutdown.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    config: DatabaseConfig,
}

impl Database {
    /// Open a connection pool from configuration.
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self> {
        if !config.url.starts_with("sqlite:") {
            return Err(StrataError::Config(format!(
                "Unsupported database url '{}': expected a sqlite: url",
                config.url
            )));
        }

        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| {
                StrataError::Config(format!("Invalid database url '{}': {}", config.url, e))
            })?
            .create_if_missing(config.create_if_missing)
            .busy_timeout(Duration::from_secs(config.busy_timeout_secs))
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(config.pool_timeout_secs))
            .connect_with(options)
            .await
            .map_err(|e| StrataError::Database(format!("Failed to connect to database: {}", e)))?;

        debug!(url = %config.url, "Database connected");

        Ok(Self {
            pool,
            config: config.clone(),
        })
    }

    /// Open a private in-memory database.
    ///
    /// The pool holds exactly one connection that never expires, since the data
    /// lives only as long as that connection.
    pub async fn in_memory() -> Result<Self> {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            pool_size: 1,
            ..Default::default()
        };

        let options = SqliteConnectOptions::from_str(&config.url)?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StrataError::Database(format!("Failed to open in-memory database: {}", e)))?;

        Ok(Self { pool, config })
    }

    /// The underlying pool, usable anywhere an executor is expected.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Start a transaction. Dropping it without committing rolls it back.
    pub async fn begin(&self, ctx: &ExecContext) -> Result<Transaction<'static, Sqlite>> {
        ctx.run("begin transaction", async {
            self.pool.begin().await.map_err(StrataError::from)
        })
        .await
    }

    /// Check database connectivity.
    pub async fn health_check(&self, ctx: &ExecContext) -> Result<()> {
        ctx.run("health check", async {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map_err(|e| StrataError::Database(format!("Health check failed: {}", e)))
        })
        .await?;
        Ok(())
    }

    /// Close all connections gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("Database closed");
    }
}

/// Type alias for the pool type.
pub type DatabasePool = SqlitePool;

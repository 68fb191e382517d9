//! Acquire-on-start, release-on-shutdown scope shared by every command.

use strata_core::config::StrataConfig;
use strata_core::context::ExecContext;
use strata_core::error::Result;
use strata_runtime::migrations::{load_migrations, MigrationRunner};
use strata_runtime::Database;
use tracing::{debug, warn};

/// An open database plus the migration set the binary knows about.
pub struct Strata {
    config: StrataConfig,
    db: Database,
    runner: MigrationRunner,
}

impl Strata {
    /// Load the migration set, then open the database.
    ///
    /// Scripts are parsed before connecting so a malformed script fails fast.
    pub async fn start(config: StrataConfig) -> Result<Self> {
        let migrations = load_migrations(config.migrations.dir.as_deref())?;
        debug!(count = migrations.len(), "Migration set loaded");

        let db = Database::from_config(&config.database).await?;
        let runner = MigrationRunner::new(db.clone(), migrations);

        Ok(Self { config, db, runner })
    }

    pub fn config(&self) -> &StrataConfig {
        &self.config
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn runner(&self) -> &MigrationRunner {
        &self.runner
    }

    /// Gate for every command that reads or writes application tables.
    pub async fn require_current(&self, ctx: &ExecContext) -> Result<()> {
        self.runner.ensure_current(ctx).await.inspect_err(|_| {
            warn!("Database is not at the latest migration, run `strata migrate up` first");
        })
    }

    pub async fn shutdown(self) {
        self.db.close().await;
    }
}

//! Migration runner: reconciles history with the known scripts, applies what is
//! pending in one transaction, and answers the startup gate.

use std::collections::HashSet;

use sqlx::{Sqlite, Transaction};
use tracing::{debug, info, warn};

use strata_core::context::ExecContext;
use strata_core::error::{Result, StrataError};
use strata_core::migration::{self, ChangeScript, MigrationPlan, MigrationSet};

use super::store::{self, AppliedMigration};
use crate::db::{self, Database};

/// Migrations applied by one `migrate_up` call, in application order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub applied: Vec<AppliedMigration>,
}

impl MigrationReport {
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }
}

/// A known script with no history record yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMigration {
    pub identifier: i64,
    pub name: String,
    pub has_down: bool,
}

/// Side-by-side view of history and the known scripts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationStatus {
    /// History records, ascending.
    pub applied: Vec<AppliedMigration>,
    /// Known scripts with no record, ascending.
    pub pending: Vec<PendingMigration>,
    /// History records for identifiers no known script carries.
    pub unknown: Vec<AppliedMigration>,
}

pub struct MigrationRunner {
    db: Database,
    migrations: MigrationSet,
}

impl MigrationRunner {
    pub fn new(db: Database, migrations: MigrationSet) -> Self {
        Self { db, migrations }
    }

    pub fn migrations(&self) -> &MigrationSet {
        &self.migrations
    }

    /// Read history and decide what `migrate_up` would do.
    pub async fn plan(&self, ctx: &ExecContext) -> Result<MigrationPlan> {
        let history = store::applied(ctx, self.db.pool()).await?;
        let identifiers: Vec<i64> = history.iter().map(|m| m.identifier).collect();
        migration::plan(&identifiers, &self.migrations)
    }

    /// Bring the schema up to the latest known script.
    ///
    /// Either every pending script is applied and recorded, or nothing is.
    pub async fn migrate_up(&self, ctx: &ExecContext) -> Result<MigrationReport> {
        let plan = self.plan(ctx).await?;
        let pending = plan.pending(&self.migrations);

        match plan {
            MigrationPlan::UpToDate => {
                info!(known = self.migrations.len(), "Database schema is up to date");
                return Ok(MigrationReport::default());
            }
            MigrationPlan::Bootstrap => {
                info!(pending = pending.len(), "No migration history, bootstrapping schema");
            }
            MigrationPlan::Resume { applied } => {
                info!(applied, pending = pending.len(), "Resuming migrations");
            }
        }

        self.apply(ctx, pending).await
    }

    /// Apply `pending` in order inside a single transaction.
    ///
    /// Cancellation and the deadline are honoured up to the last script. The
    /// commit itself runs outside them, so a reported `Timeout` or `Cancelled`
    /// always means nothing was committed.
    pub async fn apply(&self, ctx: &ExecContext, pending: &[ChangeScript]) -> Result<MigrationReport> {
        if pending.is_empty() {
            return Ok(MigrationReport::default());
        }

        let mut tx = self.db.begin(ctx).await?;

        match apply_in(ctx, &mut tx, pending).await {
            Ok(applied) => {
                tx.commit().await?;
                info!(count = applied.len(), "Migrations committed");
                Ok(MigrationReport { applied })
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "Failed to roll back migration transaction");
                }
                warn!(error = %e, "Migrations rolled back");
                Err(e)
            }
        }
    }

    /// Whether the latest history record is the latest known script.
    pub async fn is_current(&self, ctx: &ExecContext) -> Result<bool> {
        let latest = store::latest(ctx, self.db.pool()).await?;
        let current = migration::is_latest(latest.as_ref().map(|m| m.identifier), &self.migrations);

        debug!(
            applied = ?latest.map(|m| m.identifier),
            known = ?self.migrations.latest().map(|s| s.identifier()),
            current,
            "Checked schema version"
        );
        Ok(current)
    }

    /// Refuse to proceed against a database that is not at the latest schema.
    pub async fn ensure_current(&self, ctx: &ExecContext) -> Result<()> {
        if self.is_current(ctx).await? {
            Ok(())
        } else {
            Err(StrataError::InvalidState(
                "database schema is not current, run `strata migrate up` first".into(),
            ))
        }
    }

    pub async fn status(&self, ctx: &ExecContext) -> Result<MigrationStatus> {
        let history = store::applied(ctx, self.db.pool()).await?;

        let recorded: HashSet<i64> = history.iter().map(|m| m.identifier).collect();
        let known: HashSet<i64> = self.migrations.iter().map(|s| s.identifier()).collect();

        let pending = self
            .migrations
            .iter()
            .filter(|s| !recorded.contains(&s.identifier()))
            .map(|s| PendingMigration {
                identifier: s.identifier(),
                name: s.name().to_string(),
                has_down: s.has_down(),
            })
            .collect();

        let unknown = history
            .iter()
            .filter(|m| !known.contains(&m.identifier))
            .cloned()
            .collect();

        Ok(MigrationStatus {
            applied: history,
            pending,
            unknown,
        })
    }
}

async fn apply_in(
    ctx: &ExecContext,
    tx: &mut Transaction<'static, Sqlite>,
    pending: &[ChangeScript],
) -> Result<Vec<AppliedMigration>> {
    let mut applied = Vec::with_capacity(pending.len());

    for script in pending {
        debug!(name = script.name(), identifier = script.identifier(), "Applying migration");

        let rows_affected = db::execute(ctx, &mut **tx, script.up())
            .await
            .map_err(|e| failed(script, e))?;

        let mut record = AppliedMigration::new(script.identifier(), script.name());
        store::record(ctx, &mut **tx, &mut record)
            .await
            .map_err(|e| failed(script, e))?;

        info!(
            name = script.name(),
            identifier = script.identifier(),
            rows_affected,
            "Migration applied"
        );
        applied.push(record);
    }

    Ok(applied)
}

fn failed(script: &ChangeScript, source: StrataError) -> StrataError {
    StrataError::MigrationFailed {
        name: script.name().to_string(),
        source: Box::new(source),
    }
}

//! Persistence of which change scripts have been applied.
//!
//! Every function takes an executor so it can run against the pool or inside the
//! applier's transaction. A missing history table is the bootstrap state and reads
//! as "nothing applied".

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};
use strata_macros::Entity;

use strata_core::context::ExecContext;
use strata_core::error::Result;

use crate::db::{self, now_nanos};

/// Name of the history table.
pub const HISTORY_TABLE: &str = "schema_migrations";

const SELECT_APPLIED: &str = "SELECT * FROM schema_migrations ORDER BY identifier";
const SELECT_LATEST: &str = "SELECT * FROM schema_migrations ORDER BY identifier DESC LIMIT 1";
const INSERT_APPLIED: &str =
    "INSERT INTO schema_migrations (identifier, name, created_at, updated_at) VALUES (?, ?, ?, ?)";

/// Proof that one change script was executed against this database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Entity)]
pub struct AppliedMigration {
    pub id: i64,
    pub identifier: i64,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl AppliedMigration {
    pub fn new(identifier: i64, name: impl Into<String>) -> Self {
        let now = now_nanos();
        Self {
            id: 0,
            identifier,
            name: name.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn applied_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.created_at)
    }
}

/// All applied migrations, ascending by identifier.
pub async fn applied<'e, X>(ctx: &ExecContext, executor: X) -> Result<Vec<AppliedMigration>>
where
    X: Executor<'e, Database = Sqlite>,
{
    match db::select(ctx, executor, SELECT_APPLIED, &[]).await {
        Err(e) if e.is_table_not_found() => Ok(Vec::new()),
        other => other,
    }
}

/// The applied migration with the highest identifier.
pub async fn latest<'e, X>(ctx: &ExecContext, executor: X) -> Result<Option<AppliedMigration>>
where
    X: Executor<'e, Database = Sqlite>,
{
    match db::select::<AppliedMigration, _>(ctx, executor, SELECT_LATEST, &[]).await {
        Ok(rows) => Ok(rows.into_iter().next()),
        Err(e) if e.is_table_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Append a history record and assign its id.
pub async fn record<'e, X>(ctx: &ExecContext, executor: X, migration: &mut AppliedMigration) -> Result<()>
where
    X: Executor<'e, Database = Sqlite>,
{
    db::insert(ctx, executor, INSERT_APPLIED, migration).await
}

//! Change scripts, their ordering, and reconciliation against applied history.

mod plan;
mod script;
mod set;

pub use plan::{is_latest, plan, MigrationPlan};
pub use script::{parse_identifier, ChangeScript, DOWN_MARKER, UP_MARKER};
pub use set::{is_migration_resource, MigrationSet, MigrationSource};

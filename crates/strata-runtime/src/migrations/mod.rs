//! Schema migrations: packaged scripts, the applied-history store, and the runner.

mod builtin;
mod runner;
mod source;
pub mod store;

pub use builtin::{builtin_migrations, BUILTIN_MIGRATIONS};
pub use runner::{MigrationReport, MigrationRunner, MigrationStatus, PendingMigration};
pub use source::{load_migrations, load_migrations_from_dir};
pub use store::AppliedMigration;

//! SQLite-backed runtime: database handle, entity mapper, schema migrations, and
//! signed artifacts.

pub mod db;
pub mod migrations;
pub mod signing;

pub use db::Database;
pub use migrations::{
    load_migrations, load_migrations_from_dir, AppliedMigration, MigrationReport,
    MigrationRunner, MigrationStatus, PendingMigration,
};
pub use signing::SignedBinary;

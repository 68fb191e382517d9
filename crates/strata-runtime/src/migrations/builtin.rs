//! Built-in change scripts.
//!
//! These create the tables the runtime itself needs. They are packaged into the
//! binary and ordered together with any application scripts.

use strata_core::error::Result;
use strata_core::migration::{MigrationSet, MigrationSource};

/// Packaged scripts, keyed by their path in the migration namespace.
pub const BUILTIN_MIGRATIONS: &[MigrationSource] = &[
    MigrationSource::new(
        "core/1771180375-create-schema-migrations.sql",
        include_str!("../../migrations/core/1771180375-create-schema-migrations.sql"),
    ),
    MigrationSource::new(
        "signing/1771266775-create-signed-binaries.sql",
        include_str!("../../migrations/signing/1771266775-create-signed-binaries.sql"),
    ),
];

/// Parse every built-in script into an ordered set.
pub fn builtin_migrations() -> Result<MigrationSet> {
    MigrationSet::from_sources(BUILTIN_MIGRATIONS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_migrations_parse() {
        let set = builtin_migrations().unwrap();
        assert_eq!(set.len(), BUILTIN_MIGRATIONS.len());

        let ids: Vec<i64> = set.iter().map(|s| s.identifier()).collect();
        assert_eq!(ids, vec![1771180375, 1771266775]);
    }

    #[test]
    fn test_history_table_created_first() {
        let set = builtin_migrations().unwrap();
        let first = &set.scripts()[0];

        assert!(first.up().contains("CREATE TABLE schema_migrations"));
        assert!(set.iter().all(|s| !s.up().trim().is_empty()));
        assert!(set.iter().all(|s| s.has_down()));
    }
}

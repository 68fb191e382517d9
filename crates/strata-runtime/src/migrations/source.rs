use std::fs;
use std::path::Path;

use tracing::debug;

use strata_core::error::{Result, StrataError};
use strata_core::migration::{ChangeScript, MigrationSet};

use super::builtin::builtin_migrations;

/// Load change scripts from a directory laid out as `<group>/<file>.sql`.
///
/// A missing directory is an empty set. Files at the top level, deeper nesting,
/// and anything not ending in `.sql` are ignored.
pub fn load_migrations_from_dir(dir: &Path) -> Result<MigrationSet> {
    MigrationSet::new(read_dir_scripts(dir)?)
}

/// Built-in scripts together with any found under `dir`.
///
/// External scripts must sort after every built-in one, since the built-in set
/// creates the history table the applier writes to.
pub fn load_migrations(dir: Option<&Path>) -> Result<MigrationSet> {
    let builtin = builtin_migrations()?;
    let Some(dir) = dir else {
        return Ok(builtin);
    };

    let external = read_dir_scripts(dir)?;
    if let Some(floor) = builtin.latest() {
        if let Some(early) = external.iter().find(|s| s.identifier() <= floor.identifier()) {
            return Err(StrataError::Config(format!(
                "migration '{}' in {} must have an identifier greater than {} ('{}')",
                early.name(),
                dir.display(),
                floor.identifier(),
                floor.name()
            )));
        }
    }

    let mut scripts = builtin.scripts().to_vec();
    scripts.extend(external);
    MigrationSet::new(scripts)
}

fn read_dir_scripts(dir: &Path) -> Result<Vec<ChangeScript>> {
    if !dir.exists() {
        debug!(dir = %dir.display(), "Migrations directory does not exist");
        return Ok(Vec::new());
    }

    let mut scripts = Vec::new();

    for group in fs::read_dir(dir)? {
        let group = group?.path();
        if !group.is_dir() {
            continue;
        }
        let group_name = file_name(&group)?;

        for entry in fs::read_dir(&group)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().map(|e| e != "sql").unwrap_or(true) {
                continue;
            }

            let name = format!("{}/{}", group_name, file_name(&path)?);
            let contents = fs::read_to_string(&path)?;
            scripts.push(ChangeScript::parse(name, &contents)?);
        }
    }

    debug!(count = scripts.len(), dir = %dir.display(), "Loaded migrations from directory");
    Ok(scripts)
}

fn file_name(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| StrataError::Config(format!("Invalid migration path: {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::builtin::BUILTIN_MIGRATIONS;
    use tempfile::TempDir;

    const UP: &str = "-- migrate up\nSELECT 1;\n-- migrate down\nSELECT 0;\n";

    fn write(dir: &Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_load_from_nonexistent_dir() {
        let set = load_migrations_from_dir(Path::new("/nonexistent/path")).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_load_two_level_layout_sorted() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "billing/300-invoices.sql", UP);
        write(dir.path(), "core/100-users.sql", UP);
        write(dir.path(), "core/200-posts.sql", UP);

        let set = load_migrations_from_dir(dir.path()).unwrap();
        let names: Vec<&str> = set.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec!["core/100-users.sql", "core/200-posts.sql", "billing/300-invoices.sql"]
        );
    }

    #[test]
    fn test_load_ignores_other_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "core/1-first.sql", UP);
        write(dir.path(), "core/readme.txt", "not a migration");
        write(dir.path(), "core/2-backup.sql.bak", UP);
        write(dir.path(), "3-top-level.sql", UP);
        write(dir.path(), "core/nested/4-deep.sql", UP);

        let set = load_migrations_from_dir(dir.path()).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.scripts()[0].identifier(), 1);
    }

    #[test]
    fn test_load_crlf_script() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "core/7-windows.sql",
            "-- migrate up\r\nCREATE TABLE t (id INTEGER);\r\n-- migrate down\r\nDROP TABLE t;\r\n",
        );

        let set = load_migrations_from_dir(dir.path()).unwrap();
        let script = &set.scripts()[0];
        assert!(script.up().contains("CREATE TABLE t"));
        assert!(!script.up().contains("DROP TABLE"));
        assert!(script.has_down());
    }

    #[test]
    fn test_duplicate_across_groups_rejected() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "core/5-a.sql", UP);
        write(dir.path(), "extra/5-b.sql", UP);

        let err = load_migrations_from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, StrataError::DuplicateMigration { identifier: 5, .. }));
    }

    #[test]
    fn test_external_script_before_builtin_rejected() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "app/1900000000-widgets.sql", UP);
        write(dir.path(), "app/100-users.sql", UP);

        let err = load_migrations(Some(dir.path())).unwrap_err();
        assert!(matches!(err, StrataError::Config(ref m) if m.contains("app/100-users.sql")));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_external_script_sharing_builtin_identifier_rejected() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "app/1771266775-clash.sql", UP);

        let err = load_migrations(Some(dir.path())).unwrap_err();
        assert!(matches!(err, StrataError::Config(ref m) if m.contains("app/1771266775-clash.sql")));
    }

    #[test]
    fn test_load_migrations_includes_builtin() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "app/1900000000-widgets.sql", UP);

        let builtin_only = load_migrations(None).unwrap();
        assert_eq!(builtin_only.len(), BUILTIN_MIGRATIONS.len());

        let combined = load_migrations(Some(dir.path())).unwrap();
        assert_eq!(combined.len(), BUILTIN_MIGRATIONS.len() + 1);
        assert_eq!(combined.latest().unwrap().name(), "app/1900000000-widgets.sql");
    }
}

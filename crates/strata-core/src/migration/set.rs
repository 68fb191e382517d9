use tracing::debug;

use super::script::ChangeScript;
use crate::error::{Result, StrataError};

/// A packaged migration resource: its path in the migration namespace and its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationSource {
    pub name: &'static str,
    pub contents: &'static str,
}

impl MigrationSource {
    pub const fn new(name: &'static str, contents: &'static str) -> Self {
        Self { name, contents }
    }
}

/// Whether a resource path has the `<group>/<file>.sql` shape.
pub fn is_migration_resource(name: &str) -> bool {
    let mut parts = name.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(group), Some(file), None) => {
            !group.is_empty() && file.len() > ".sql".len() && file.ends_with(".sql")
        }
        _ => false,
    }
}

/// Every known change script, ascending by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSet {
    scripts: Vec<ChangeScript>,
}

impl MigrationSet {
    /// Order scripts by identifier.
    ///
    /// Two scripts sharing an identifier have no defined order, so that is rejected.
    pub fn new(mut scripts: Vec<ChangeScript>) -> Result<Self> {
        scripts.sort_by_key(|s| s.identifier());

        if let Some(pair) = scripts
            .windows(2)
            .find(|pair| pair[0].identifier() == pair[1].identifier())
        {
            return Err(StrataError::DuplicateMigration {
                identifier: pair[0].identifier(),
                first: pair[0].name().to_string(),
                second: pair[1].name().to_string(),
            });
        }

        Ok(Self { scripts })
    }

    /// Parse packaged resources. Paths outside the `<group>/<file>.sql` pattern are
    /// not migrations and are skipped.
    pub fn from_sources(sources: &[MigrationSource]) -> Result<Self> {
        let mut scripts = Vec::with_capacity(sources.len());

        for source in sources {
            if !is_migration_resource(source.name) {
                debug!(name = source.name, "Skipping non-migration resource");
                continue;
            }
            scripts.push(ChangeScript::parse(source.name, source.contents)?);
        }

        Self::new(scripts)
    }

    pub fn scripts(&self) -> &[ChangeScript] {
        &self.scripts
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    /// The script with the highest identifier.
    pub fn latest(&self) -> Option<&ChangeScript> {
        self.scripts.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChangeScript> {
        self.scripts.iter()
    }
}

impl<'a> IntoIterator for &'a MigrationSet {
    type Item = &'a ChangeScript;
    type IntoIter = std::slice::Iter<'a, ChangeScript>;

    fn into_iter(self) -> Self::IntoIter {
        self.scripts.iter()
    }
}

use thiserror::Error;

/// Core error type for strata operations.
#[derive(Error, Debug)]
pub enum StrataError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid migration name '{name}': expected a leading numeric identifier")]
    InvalidMigrationName { name: String },

    #[error("Duplicate migration identifier {identifier}: '{first}' and '{second}'")]
    DuplicateMigration {
        identifier: i64,
        first: String,
        second: String,
    },

    #[error(
        "More migrations have been applied ({applied}) than exist in the codebase ({known})"
    )]
    HistoryAhead { applied: usize, known: usize },

    #[error("No common migration found: history starts at {applied}, codebase starts at {known}")]
    NoCommonMigration { applied: i64, known: i64 },

    #[error(
        "Migration history diverges from the codebase at position {position}: applied {applied}, expected {expected}"
    )]
    HistoryDiverged {
        position: usize,
        applied: i64,
        expected: i64,
    },

    #[error("Migration '{name}' failed: {source}")]
    MigrationFailed {
        name: String,
        #[source]
        source: Box<StrataError>,
    },

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("No field for column '{column}' on {entity}")]
    UnmappedColumn { entity: &'static str, column: String },

    #[error("Mapping error: {0}")]
    Mapping(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQL error: {0}")]
    Sql(sqlx::Error),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StrataError {
    /// Errors that mean code and database disagree, or the code itself is wrong.
    /// Retrying cannot fix these.
    pub fn is_fatal(&self) -> bool {
        match self {
            StrataError::Config(_)
            | StrataError::InvalidMigrationName { .. }
            | StrataError::DuplicateMigration { .. }
            | StrataError::HistoryAhead { .. }
            | StrataError::NoCommonMigration { .. }
            | StrataError::HistoryDiverged { .. }
            | StrataError::UnmappedColumn { .. }
            | StrataError::Mapping(_) => true,
            StrataError::MigrationFailed { source, .. } => source.is_fatal(),
            _ => false,
        }
    }

    /// Errors a caller may retry by re-running the whole operation later.
    pub fn is_transient(&self) -> bool {
        match self {
            StrataError::Timeout(_)
            | StrataError::Cancelled(_)
            | StrataError::Database(_)
            | StrataError::Io(_) => true,
            StrataError::Sql(e) => matches!(
                e,
                sqlx::Error::Io(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            ),
            StrataError::MigrationFailed { source, .. } => source.is_transient(),
            _ => false,
        }
    }

    pub fn is_table_not_found(&self) -> bool {
        matches!(self, StrataError::TableNotFound(_))
    }

    pub fn is_duplicate_entry(&self) -> bool {
        matches!(self, StrataError::DuplicateEntry(_))
    }
}

impl From<sqlx::Error> for StrataError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db_err) => {
                let message = db_err.message();
                if message.contains("no such table") {
                    StrataError::TableNotFound(message.to_string())
                } else if db_err.is_unique_violation()
                    || message.contains("UNIQUE constraint failed")
                {
                    StrataError::DuplicateEntry(message.to_string())
                } else {
                    StrataError::Sql(e)
                }
            }
            sqlx::Error::PoolTimedOut => {
                StrataError::Timeout("timed out acquiring a database connection".into())
            }
            _ => StrataError::Sql(e),
        }
    }
}

/// Result type alias using StrataError.
pub type Result<T> = std::result::Result<T, StrataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_fatal() {
        let err = StrataError::HistoryAhead {
            applied: 3,
            known: 2,
        };
        assert!(err.is_fatal());
        assert!(!err.is_transient());

        let err = StrataError::NoCommonMigration {
            applied: 1,
            known: 2,
        };
        assert!(err.is_fatal());
    }

    #[test]
    fn test_timeouts_are_transient() {
        assert!(StrataError::Timeout("select".into()).is_transient());
        assert!(StrataError::Cancelled("select".into()).is_transient());
        assert!(!StrataError::Timeout("select".into()).is_fatal());
    }

    #[test]
    fn test_wrapped_migration_failure_keeps_classification() {
        let err = StrataError::MigrationFailed {
            name: "core/1-init.sql".into(),
            source: Box::new(StrataError::Timeout("exec".into())),
        };
        assert!(err.is_transient());
        assert!(err.to_string().contains("core/1-init.sql"));
    }

    #[test]
    fn test_pool_timeout_classified_as_timeout() {
        let err = StrataError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StrataError::Timeout(_)));
    }

    #[test]
    fn test_row_not_found_stays_sql() {
        let err = StrataError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StrataError::Sql(_)));
        assert!(!err.is_table_not_found());
        assert!(!err.is_duplicate_entry());
    }
}

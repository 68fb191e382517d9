mod database;

pub use database::DatabaseConfig;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use crate::error::{Result, StrataError};

static ENV_VAR_PATTERN: LazyLock<regex_lite::Regex> =
    LazyLock::new(|| regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

/// Root configuration for strata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrataConfig {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Where migration scripts come from.
    #[serde(default)]
    pub migrations: MigrationsConfig,

    /// Per-command execution limits.
    #[serde(default)]
    pub command: CommandConfig,
}

impl StrataConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| StrataError::Config(format!("Failed to read config file: {}", e)))?;

        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let content = substitute_env_vars(content);

        toml::from_str(&content)
            .map_err(|e| StrataError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Default configuration pointing at the given database.
    pub fn default_with_database_url(url: &str) -> Self {
        Self {
            database: DatabaseConfig {
                url: url.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Migration source configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationsConfig {
    /// Directory laid out as `<group>/<digits>-<description>.sql`, loaded
    /// alongside the packaged scripts.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Command execution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Deadline for a single command, in seconds.
    #[serde(default = "default_command_timeout")]
    pub timeout_secs: u64,
}

impl CommandConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_command_timeout(),
        }
    }
}

fn default_command_timeout() -> u64 {
    1
}

/// Substitute `${VAR}` placeholders with environment values.
/// Unknown variables are left as written.
fn substitute_env_vars(content: &str) -> String {
    let mut result = content.to_string();

    for cap in ENV_VAR_PATTERN.captures_iter(content) {
        let var_name = &cap[1];
        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StrataConfig::default_with_database_url("sqlite::memory:");
        assert_eq!(config.database.url, "sqlite::memory:");
        assert!(config.migrations.dir.is_none());
        assert_eq!(config.command.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_parse_empty_config() {
        let config = StrataConfig::parse_toml("").unwrap();
        assert_eq!(config.database.url, "sqlite://app.db");
        assert_eq!(config.command.timeout_secs, 1);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [database]
            url = "sqlite://data/analytics.db"
            pool_size = 2

            [migrations]
            dir = "db/migrations"

            [command]
            timeout_secs = 10
        "#;

        let config = StrataConfig::parse_toml(toml).unwrap();
        assert_eq!(config.database.url, "sqlite://data/analytics.db");
        assert_eq!(config.database.pool_size, 2);
        assert_eq!(
            config.migrations.dir.as_deref(),
            Some(Path::new("db/migrations"))
        );
        assert_eq!(config.command.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("STRATA_TEST_DB_PATH", "/tmp/strata-test.db");

        let toml = r#"
            [database]
            url = "sqlite://${STRATA_TEST_DB_PATH}"
        "#;

        let config = StrataConfig::parse_toml(toml).unwrap();
        assert_eq!(config.database.url, "sqlite:///tmp/strata-test.db");

        std::env::remove_var("STRATA_TEST_DB_PATH");
    }

    #[test]
    fn test_unknown_env_var_left_untouched() {
        let result = substitute_env_vars("url = \"${STRATA_SURELY_UNSET_VAR}\"");
        assert_eq!(result, "url = \"${STRATA_SURELY_UNSET_VAR}\"");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = StrataConfig::parse_toml("[database\nurl = 1").unwrap_err();
        assert!(matches!(err, StrataError::Config(_)));
    }
}

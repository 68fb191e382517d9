mod migrate;
mod sign;

pub use migrate::MigrateCommand;
pub use sign::{CheckSignCommand, SignCommand};

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use strata::Strata;
use strata_core::config::StrataConfig;
use strata_core::context::ExecContext;

/// STRATA - versioned SQLite schemas and signed binaries
#[derive(Parser)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path.
    #[arg(short, long, default_value = "strata.toml", global = true)]
    pub config: PathBuf,

    /// Database url (overrides config).
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Deadline for the command in seconds (overrides config).
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Manage database migrations.
    Migrate(MigrateCommand),

    /// Record a binary as signed.
    Sign(SignCommand),

    /// Check whether a binary has been signed.
    CheckSign(CheckSignCommand),
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        dotenvy::dotenv().ok();
        init_tracing(self.verbose);

        let mut config = self.load_config()?;
        if let Some(timeout) = self.timeout {
            config.command.timeout_secs = timeout;
        }

        let root = ExecContext::background();
        let interrupt = root.cancellation_token();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling");
                interrupt.cancel();
            }
        });

        let timeout = config.command.timeout();
        let strata = Strata::start(config).await?;

        let result = match self.command {
            Commands::Migrate(cmd) => cmd.execute(&root, timeout, &strata).await,
            Commands::Sign(cmd) => cmd.execute(&root, timeout, &strata).await,
            Commands::CheckSign(cmd) => cmd.execute(&root, timeout, &strata).await,
        };

        strata.shutdown().await;
        result
    }

    /// Read the config file, or fall back to defaults when only a url is given.
    fn load_config(&self) -> Result<StrataConfig> {
        let mut config = if self.config.exists() {
            debug!(path = %self.config.display(), "Loading configuration");
            StrataConfig::from_file(&self.config)?
        } else if let Some(url) = &self.database_url {
            StrataConfig::default_with_database_url(url)
        } else {
            anyhow::bail!(
                "Configuration file not found: {}\nPass --database-url or create the file.",
                self.config.display()
            );
        };

        if let Some(url) = &self.database_url {
            config.database.url = url.clone();
        }
        Ok(config)
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .init();
}

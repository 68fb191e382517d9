use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use console::style;

use strata::Strata;
use strata_core::context::ExecContext;
use strata_runtime::signing;

/// Record the SHA-256 digest of a file as signed.
#[derive(Parser)]
pub struct SignCommand {
    /// File to sign.
    #[arg(short, long)]
    pub file_path: PathBuf,
}

impl SignCommand {
    pub async fn execute(self, root: &ExecContext, timeout: Duration, strata: &Strata) -> Result<()> {
        strata.require_current(root).await?;

        let ctx = root.child_with_timeout(timeout);
        let signed = signing::sign_file(&ctx, strata.db(), &self.file_path).await?;

        println!(
            "  {} Signed {} ({})",
            style("✓").green(),
            style(self.file_path.display()).cyan(),
            style(&signed.hash).dim()
        );
        Ok(())
    }
}

/// Check whether the digest of a file has been signed.
#[derive(Parser)]
pub struct CheckSignCommand {
    /// File to check.
    #[arg(short, long)]
    pub file_path: PathBuf,
}

impl CheckSignCommand {
    pub async fn execute(self, root: &ExecContext, timeout: Duration, strata: &Strata) -> Result<()> {
        strata.require_current(root).await?;

        let ctx = root.child_with_timeout(timeout);
        match signing::check_file(&ctx, strata.db(), &self.file_path).await? {
            Some(signed) => println!(
                "  {} {} was signed at {}",
                style("✓").green(),
                style(self.file_path.display()).cyan(),
                signed.signed_at().to_rfc3339()
            ),
            None => println!(
                "  {} {} is not signed",
                style("○").yellow(),
                style(self.file_path.display()).cyan()
            ),
        }
        Ok(())
    }
}

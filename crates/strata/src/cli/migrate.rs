use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;

use strata::Strata;
use strata_core::context::ExecContext;

/// Manage database migrations.
#[derive(Parser)]
pub struct MigrateCommand {
    #[command(subcommand)]
    pub action: MigrateAction,
}

#[derive(Subcommand)]
pub enum MigrateAction {
    /// Apply every pending migration in one transaction.
    Up,

    /// Show migration status.
    Status,

    /// Exit with an error unless the database is at the latest migration.
    Check,
}

impl MigrateCommand {
    pub async fn execute(self, root: &ExecContext, timeout: Duration, strata: &Strata) -> Result<()> {
        let ctx = root.child_with_timeout(timeout);
        let runner = strata.runner();

        match self.action {
            MigrateAction::Up => {
                header("Migrations");

                let report = runner.migrate_up(&ctx).await?;

                if report.is_empty() {
                    println!("  {} Database schema is up to date", style("ℹ").blue());
                } else {
                    for m in &report.applied {
                        println!("  {} Applied: {}", style("✓").green(), style(&m.name).cyan());
                    }
                    println!();
                    println!(
                        "  {} Applied {} migration(s)",
                        style("✓").green(),
                        report.applied.len()
                    );
                }
                println!();
            }

            MigrateAction::Status => {
                header("Migration Status");

                let status = runner.status(&ctx).await?;

                if status.applied.is_empty() && status.pending.is_empty() {
                    println!("  {} No migrations found", style("ℹ").blue());
                    return Ok(());
                }

                if !status.applied.is_empty() {
                    println!("  {} Applied:", style("✓").green());
                    for m in &status.applied {
                        println!(
                            "    {} {} ({})",
                            style(&m.name).cyan(),
                            style("at").dim(),
                            m.applied_at().format("%Y-%m-%d %H:%M:%S")
                        );
                    }
                }

                if !status.pending.is_empty() {
                    if !status.applied.is_empty() {
                        println!();
                    }
                    println!("  {} Pending:", style("○").yellow());
                    for p in &status.pending {
                        let down_marker = if p.has_down {
                            style("↓").green().to_string()
                        } else {
                            style("-").dim().to_string()
                        };
                        println!("    {} {}", down_marker, style(&p.name).yellow());
                    }
                }

                if !status.unknown.is_empty() {
                    println!();
                    println!("  {} Applied but unknown to this binary:", style("!").red());
                    for m in &status.unknown {
                        println!("    {} {}", style("→").dim(), style(&m.name).red());
                    }
                }

                println!();
                println!(
                    "  {} {} applied, {} pending",
                    style("ℹ").blue(),
                    status.applied.len(),
                    status.pending.len()
                );
                println!();
                println!(
                    "  {} = has down migration, {} = no down migration",
                    style("↓").green(),
                    style("-").dim()
                );
                println!();
            }

            MigrateAction::Check => {
                strata.require_current(&ctx).await?;
                println!("  {} Database is at the latest migration", style("✓").green());
            }
        }

        Ok(())
    }
}

fn header(title: &str) {
    println!();
    println!("  {} {}", style("STRATA").bold().cyan(), title);
    println!();
}

//! New command implementation

use anyhow::{Context, Result};

use crate::cli::{GlobalArgs, ListArgs, ListOutput};
use crate::commands::common::{load_migrator, print_migrations, MigrationRow};

/// Execute the new command
pub fn execute(args: &ListArgs, global: &GlobalArgs) -> Result<()> {
    let migrator = load_migrator(global)?;
    let pending = migrator.pending()?;
    let total = pending.len();
    let shown = match args.limit() {
        Some(limit) => &pending[..limit.min(total)],
        None => &pending[..],
    };

    match args.output {
        ListOutput::Json => {
            let rows: Vec<MigrationRow> =
                shown.iter().map(|m| MigrationRow::new(m, None)).collect();
            let json =
                serde_json::to_string_pretty(&rows).context("Failed to serialize to JSON")?;
            println!("{json}");
        }
        ListOutput::Table => {
            if pending.is_empty() {
                println!("No new migrations found. Your system is up-to-date.");
                return Ok(());
            }
            if shown.len() < total {
                println!(
                    "Showing {} out of {total} new migrations:",
                    shown.len()
                );
            } else {
                println!("Found {total} new migration(s):");
            }
            print_migrations(shown);
        }
    }
    Ok(())
}

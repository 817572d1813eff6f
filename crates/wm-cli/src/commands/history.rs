//! History command implementation

use anyhow::{Context, Result};

use crate::cli::{GlobalArgs, ListArgs, ListOutput};
use crate::commands::common::{load_migrator, MigrationRow};

/// Execute the history command
pub fn execute(args: &ListArgs, global: &GlobalArgs) -> Result<()> {
    let migrator = load_migrator(global)?;
    let history = migrator.history(args.limit())?;

    match args.output {
        ListOutput::Json => {
            let rows: Vec<MigrationRow> = history
                .iter()
                .map(|entry| MigrationRow::new(&entry.migration, entry.applied_at_utc()))
                .collect();
            let json =
                serde_json::to_string_pretty(&rows).context("Failed to serialize to JSON")?;
            println!("{json}");
        }
        ListOutput::Table => {
            if history.is_empty() {
                println!("No migration has been done before.");
                return Ok(());
            }
            match args.limit() {
                Some(_) => println!("Showing the last {} applied migrations:", history.len()),
                None => println!(
                    "Total {} migrations have been applied before:",
                    history.len()
                ),
            }
            for entry in history.iter() {
                let applied_at = entry
                    .applied_at_utc()
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                println!("  ({applied_at}) {}", entry.migration);
            }
        }
    }
    Ok(())
}

//! Adopt-legacy command implementation

use anyhow::{Context, Result};
use wm_ledger::Layout;

use crate::cli::GlobalArgs;
use crate::commands::common::{load_project, migrations_word, open_ledger};

/// Execute the adopt-legacy command
pub fn execute(global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let ledger = open_ledger(&project, global)?;
    let table = &project.config.migration_table;

    match ledger.layout()? {
        Layout::Missing => {
            println!("No migration history table '{table}' yet. Nothing to do.");
            return Ok(());
        }
        Layout::Tracked => {
            println!("Table '{table}' already tracks locations. Nothing to do.");
            return Ok(());
        }
        Layout::Legacy => {}
    }

    let adopted = ledger
        .adopt_legacy()
        .context("Failed to convert legacy migration history")?;
    println!(
        "Converted '{table}': {adopted} applied {} assigned to {}.",
        migrations_word(adopted),
        project.config.primary_location
    );
    Ok(())
}

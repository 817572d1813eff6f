//! Redo command implementation

use anyhow::Result;

use crate::cli::{GlobalArgs, StepArgs};
use crate::commands::common::{load_migrator, migrations_word, print_migrations};

/// Execute the redo command
pub fn execute(args: &StepArgs, global: &GlobalArgs) -> Result<()> {
    let migrator = load_migrator(global)?;

    let redone = migrator.redo(args.limit())?;
    if redone.is_empty() {
        println!("No migration has been done before.");
        return Ok(());
    }

    println!("{} {} redone:", redone.len(), migrations_word(redone.len()));
    print_migrations(&redone);
    Ok(())
}

//! Down command implementation

use anyhow::Result;

use crate::cli::{GlobalArgs, StepArgs};
use crate::commands::common::{load_migrator, migrations_word, print_migrations};

/// Execute the down command
pub fn execute(args: &StepArgs, global: &GlobalArgs) -> Result<()> {
    let migrator = load_migrator(global)?;

    let reverted = migrator.down(args.limit())?;
    if reverted.is_empty() {
        println!("No migration has been done before.");
        return Ok(());
    }

    println!(
        "{} {} reverted:",
        reverted.len(),
        migrations_word(reverted.len())
    );
    print_migrations(&reverted);
    Ok(())
}

//! Up command implementation

use anyhow::Result;

use crate::cli::{GlobalArgs, UpArgs};
use crate::commands::common::{load_migrator, migrations_word, print_migrations};

/// Execute the up command
pub fn execute(args: &UpArgs, global: &GlobalArgs) -> Result<()> {
    let migrator = load_migrator(global)?;

    let mut pending = migrator.pending()?;
    if pending.is_empty() {
        println!("No new migrations found. Your system is up-to-date.");
        return Ok(());
    }
    let total = pending.len();
    if let Some(limit) = args.limit.filter(|&n| n > 0) {
        pending.truncate(limit);
    }

    if pending.len() == total {
        println!("Total {total} new {} to be applied:", migrations_word(total));
    } else {
        println!(
            "Total {} out of {total} new migrations to be applied:",
            pending.len()
        );
    }
    print_migrations(&pending);
    println!();

    let applied = migrator.up(Some(pending.len()))?;
    println!(
        "{} {} applied.",
        applied.len(),
        migrations_word(applied.len())
    );
    Ok(())
}

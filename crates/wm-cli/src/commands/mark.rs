//! Mark command implementation

use anyhow::Result;
use wm_exec::MarkOutcome;

use crate::cli::{GlobalArgs, MarkArgs};
use crate::commands::common::{load_migrator, migrations_word, print_migrations};

/// Execute the mark command
pub fn execute(args: &MarkArgs, global: &GlobalArgs) -> Result<()> {
    let migrator = load_migrator(global)?;

    match migrator.mark(&args.target)? {
        MarkOutcome::Recorded(recorded) => {
            println!(
                "{} {} marked as applied:",
                recorded.len(),
                migrations_word(recorded.len())
            );
            print_migrations(&recorded);
        }
        MarkOutcome::Forgotten(forgotten) if forgotten.is_empty() => {
            println!("Already at {}. Nothing to do.", args.target);
        }
        MarkOutcome::Forgotten(forgotten) => {
            println!(
                "{} {} removed from history:",
                forgotten.len(),
                migrations_word(forgotten.len())
            );
            print_migrations(&forgotten);
        }
    }
    Ok(())
}

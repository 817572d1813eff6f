//! wm-exec - Migration execution for Waymark
//!
//! Turns located migrations into runnable [`Migration`] values through a
//! [`LoaderRegistry`], and drives apply/revert batches with the [`Migrator`],
//! committing each step together with its ledger row.

pub mod error;
pub mod migrator;
pub mod registry;
pub mod script;
pub mod traits;

pub use error::{Direction, ExecError, ExecResult};
pub use migrator::{MarkOutcome, Migrator};
pub use registry::LoaderRegistry;
pub use script::{SqlScript, SqlScriptLoader};
pub use traits::{Migration, MigrationLoader};

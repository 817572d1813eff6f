//! Migration capability traits

use crate::error::ExecResult;
use duckdb::Connection;
use std::path::Path;
use wm_core::MigrationRef;

/// A unit of change with a forward and a backward action.
///
/// Implementations run against the target database; the driver wraps each
/// call in a transaction together with the matching ledger write.
pub trait Migration {
    /// Apply the change
    fn up(&self, conn: &Connection) -> ExecResult<()>;

    /// Revert the change
    fn down(&self, conn: &Connection) -> ExecResult<()>;
}

/// Builds a [`Migration`] for a located migration file.
pub trait MigrationLoader {
    /// Load the migration `migration`, whose file lives at `path`
    fn load(&self, migration: &MigrationRef, path: &Path) -> ExecResult<Box<dyn Migration>>;
}

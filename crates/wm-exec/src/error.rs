//! Error types for wm-exec

use std::fmt;
use thiserror::Error;
use wm_core::CoreError;
use wm_ledger::LedgerError;

/// Direction of a migration step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Migration execution errors
#[derive(Error, Debug)]
pub enum ExecError {
    /// Configuration, location, or identifier error
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Ledger error, passed through unchanged
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Migration script could not be read (X001)
    #[error("[X001] Failed to read migration script {path}: {source}")]
    ScriptRead {
        path: String,
        source: std::io::Error,
    },

    /// A migration's SQL failed (X002)
    #[error("[X002] Migration {migration} failed during {direction}")]
    Statement {
        migration: String,
        direction: Direction,
        #[source]
        source: duckdb::Error,
    },

    /// Migration has no down section (X003)
    #[error("[X003] Migration {migration} cannot be reverted: it has no down section")]
    Irreversible { migration: String },

    /// `mark` target matches nothing (X004)
    #[error("[X004] No pending or applied migration matches '{target}'")]
    UnknownTarget { target: String },

    /// `mark` target name exists in several locations (X005)
    #[error("[X005] Migration '{name}' exists in several locations ({locations}); pass its token instead")]
    AmbiguousTarget { name: String, locations: String },

    /// A batch stopped part way (X006)
    #[error("[X006] Migration {migration} failed ({direction}) after {completed} successful step(s)")]
    StepFailed {
        migration: String,
        direction: Direction,
        completed: usize,
        #[source]
        source: Box<ExecError>,
    },
}

/// Result type alias for ExecError
pub type ExecResult<T> = Result<T, ExecError>;

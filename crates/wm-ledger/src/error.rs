//! Error types for the migration ledger.

use thiserror::Error;

/// Migration ledger errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Failed to open or create the database (L001).
    #[error("[L001] Ledger database connection failed: {0}")]
    ConnectionError(String),

    /// A stored row does not decode into a migration reference (L002).
    #[error("[L002] Corrupt history row in '{table}' (version '{version}', alias '{alias}'): {reason}")]
    CorruptHistory {
        table: String,
        version: String,
        alias: String,
        reason: String,
    },

    /// `record` called for a migration that is already recorded (L003).
    #[error("[L003] Migration {name} from '{location}' is already recorded as applied")]
    DuplicateApply { name: String, location: String },

    /// `forget` called for a migration that was never recorded (L004).
    #[error("[L004] Migration {name} from '{location}' is not recorded as applied; nothing to revert")]
    MissingRevert { name: String, location: String },

    /// History table lacks location tracking (L005).
    #[error("[L005] History table '{table}' predates multi-location tracking; run `wm adopt-legacy` to assign its rows to '{primary}', or set disable_multi_location_lookup")]
    LegacyHistory { table: String, primary: String },

    /// Table exists but is not shaped like a history table (L006).
    #[error("[L006] Table '{table}' is not a migration history table (columns: {columns})")]
    UnrecognizedTable { table: String, columns: String },

    /// Value exceeds the width of a history column (L007).
    #[error("[L007] Value for history column '{column}' is {len} characters, limit is {limit}: {value}")]
    ValueTooLong {
        column: &'static str,
        value: String,
        len: usize,
        limit: usize,
    },

    /// DuckDB driver error with preserved source chain (L008).
    #[error("[L008] Ledger storage error during {operation}")]
    Storage {
        operation: String,
        #[source]
        source: duckdb::Error,
    },

    /// Transaction management error (L009).
    #[error("[L009] Ledger transaction failed: {0}")]
    TransactionError(String),
}

/// Result type alias for [`LedgerError`].
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Build a mapper that wraps a DuckDB error with the failed operation.
pub(crate) fn storage(operation: impl Into<String>) -> impl FnOnce(duckdb::Error) -> LedgerError {
    let operation = operation.into();
    move |source| LedgerError::Storage { operation, source }
}

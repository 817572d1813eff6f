//! Error types for wm-core

use thiserror::Error;

/// Core error type for Waymark
#[derive(Error, Debug)]
pub enum CoreError {
    /// W001: Configuration file not found
    #[error("[W001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// W002: Failed to parse configuration file
    #[error("[W002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// W003: Invalid configuration value
    #[error("[W003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// W004: A location refers to an alias that is not registered
    #[error("[W004] Unknown alias '{alias}' in location '{location}'")]
    UnknownAlias { alias: String, location: String },

    /// W005: A configured location does not resolve to a readable directory
    #[error("[W005] Migration location '{location}' ({path}) is not a readable directory: {reason}")]
    LocationUnreadable {
        location: String,
        path: String,
        reason: String,
    },

    /// W006: A string is not a canonical migration name
    #[error("[W006] Invalid migration name '{name}': expected m<yymmdd>_<hhmmss>_<slug>")]
    InvalidMigrationName { name: String },

    /// W007: A migration token could not be decoded into (name, location)
    #[error("[W007] Corrupt migration token '{token}': {reason}")]
    InvalidToken { token: String, reason: String },

    /// W008: Migration script for a known reference is missing on disk
    #[error("[W008] Migration '{name}' not found in location '{location}' (expected {path})")]
    ScriptNotFound {
        name: String,
        location: String,
        path: String,
    },

    /// W009: IO error
    #[error("[W009] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// W010: IO error with file path context
    #[error("[W010] IO error at {path}: {source}")]
    IoWithPath {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<serde_yaml::Error> for CoreError {
    fn from(err: serde_yaml::Error) -> Self {
        CoreError::ConfigParseError {
            message: err.to_string(),
        }
    }
}

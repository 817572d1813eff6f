//! Strongly-typed, validated migration name.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::sync::OnceLock;

/// Name of the bootstrap row written when the ledger table is created.
///
/// It is shaped like a real name so that legacy tables stay readable, but the
/// locator never yields it and the applied set never contains it.
pub const BASE_MIGRATION: &str = "m000000_000000_base";

/// Pattern for canonical migration names
static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_regex() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(r"^m[0-9]{6}_[0-9]{6}_.*$").expect("valid regex"))
}

/// Canonical migration identifier: `m<yymmdd>_<hhmmss>_<slug>`.
///
/// Names sort by their embedded creation timestamp first and slug second, so
/// plain lexicographic order is apply order. A name is only unique within a
/// single location; see [`crate::MigrationRef`] for the global identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MigrationName(String);

impl MigrationName {
    /// Parse and validate a migration name.
    pub fn parse(name: impl Into<String>) -> CoreResult<Self> {
        let name = name.into();
        if name_regex().is_match(&name) {
            Ok(Self(name))
        } else {
            Err(CoreError::InvalidMigrationName { name })
        }
    }

    /// Mint a new name for `slug` created at `at`.
    ///
    /// The slug must be non-empty and consist of word characters only.
    pub fn generate(slug: &str, at: DateTime<Utc>) -> CoreResult<Self> {
        let valid = !slug.is_empty() && slug.chars().all(|c| c.is_alphanumeric() || c == '_');
        if !valid {
            return Err(CoreError::InvalidMigrationName {
                name: slug.to_string(),
            });
        }
        Self::parse(format!("m{}_{slug}", at.format("%y%m%d_%H%M%S")))
    }

    /// The bootstrap marker name.
    pub fn base() -> Self {
        Self(BASE_MIGRATION.to_string())
    }

    /// Extract a migration name from a file name ending in `.{extension}`.
    ///
    /// Returns `None` for anything that is not a candidate migration file.
    pub fn from_file_name(file_name: &str, extension: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(extension)?.strip_suffix('.')?;
        Self::parse(stem).ok()
    }

    /// `true` for the bootstrap marker.
    pub fn is_base(&self) -> bool {
        self.0 == BASE_MIGRATION
    }

    /// Return the underlying name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for MigrationName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        MigrationName::parse(s).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<&str> for MigrationName {
    type Error = CoreError;
    fn try_from(s: &str) -> CoreResult<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MigrationName {
    type Error = CoreError;
    fn try_from(s: String) -> CoreResult<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for MigrationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MigrationName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for MigrationName {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for MigrationName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for MigrationName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for MigrationName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

//! Migration locations and alias resolution.
//!
//! A [`Location`] is the name a migration directory is known by, e.g.
//! `@app/migrations` or `@vendor/acme/blog/migrations`. It is what the ledger
//! stores next to each applied migration, so it must resolve to the same
//! directory on every run. The filesystem path is derived on demand through
//! the [`AliasResolver`].

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};

/// Alias that always points at the project root unless overridden.
pub const APP_ALIAS: &str = "@app";

/// Strongly-typed wrapper for a migration location alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Location(String);

impl Location {
    /// Create a new `Location`, panicking in debug builds if it is empty.
    ///
    /// Prefer [`try_new`](Self::try_new) when handling untrusted input.
    pub fn new(location: impl Into<String>) -> Self {
        let s = location.into();
        debug_assert!(!s.is_empty(), "Location must not be empty");
        Self(s)
    }

    /// Try to create a new `Location`, returning `None` if it is empty.
    pub fn try_new(location: impl Into<String>) -> Option<Self> {
        let s = location.into();
        if s.is_empty() {
            None
        } else {
            Some(Self(s))
        }
    }

    /// Return the underlying alias as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Location {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Location::try_new(s).ok_or_else(|| serde::de::Error::custom("Location must not be empty"))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Location {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for Location {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Location {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for Location {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Ordered set of locations: the primary first, then the extras.
///
/// The order only fixes scan order and breaks ties between equally named
/// migrations; it has no bearing on which migrations are pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationSet {
    primary: Location,
    extras: Vec<Location>,
}

impl LocationSet {
    /// Build a location set, dropping repeated spellings of the same alias.
    ///
    /// Only identical strings are collapsed. Two different aliases pointing at
    /// the same directory remain two locations.
    pub fn new(primary: Location, extras: impl IntoIterator<Item = Location>) -> Self {
        let mut kept: Vec<Location> = Vec::new();
        for extra in extras {
            if extra == primary || kept.contains(&extra) {
                log::warn!("Ignoring repeated migration location '{extra}'");
                continue;
            }
            kept.push(extra);
        }
        Self {
            primary,
            extras: kept,
        }
    }

    /// A set containing only the primary location.
    pub fn primary_only(primary: Location) -> Self {
        Self {
            primary,
            extras: Vec::new(),
        }
    }

    /// The application's own migration location.
    pub fn primary(&self) -> &Location {
        &self.primary
    }

    /// Additional locations, in configured order.
    pub fn extras(&self) -> &[Location] {
        &self.extras
    }

    /// All locations in scan order.
    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        std::iter::once(&self.primary).chain(self.extras.iter())
    }

    /// Position of `location` in scan order, if it is a member.
    pub fn index_of(&self, location: &Location) -> Option<usize> {
        self.iter().position(|l| l == location)
    }

    /// `true` if `location` is the primary location.
    pub fn is_primary(&self, location: &Location) -> bool {
        &self.primary == location
    }
}

/// Maps location aliases to directories.
///
/// A location beginning with `@` is split at its first `/`: the head must be a
/// registered alias and the tail is appended to that alias's directory.
/// Anything else is a plain path, taken relative to the project root.
#[derive(Debug, Clone)]
pub struct AliasResolver {
    root: PathBuf,
    aliases: BTreeMap<String, PathBuf>,
}

impl AliasResolver {
    /// Create a resolver rooted at `root` with `@app` registered.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut aliases = BTreeMap::new();
        aliases.insert(APP_ALIAS.to_string(), root.clone());
        Self { root, aliases }
    }

    /// Register (or replace) an alias. Relative targets resolve against the root.
    pub fn with_alias(mut self, alias: impl Into<String>, dir: impl AsRef<Path>) -> Self {
        self.register(alias, dir);
        self
    }

    /// Register (or replace) an alias in place.
    pub fn register(&mut self, alias: impl Into<String>, dir: impl AsRef<Path>) {
        let dir = self.root.join(dir.as_ref());
        self.aliases.insert(alias.into(), dir);
    }

    /// The project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a location to a directory path. The directory need not exist.
    pub fn resolve(&self, location: &Location) -> CoreResult<PathBuf> {
        let raw = location.as_str();
        if !raw.starts_with('@') {
            return Ok(self.root.join(raw));
        }

        let (alias, rest) = match raw.split_once('/') {
            Some((alias, rest)) => (alias, rest),
            None => (raw, ""),
        };
        let base = self
            .aliases
            .get(alias)
            .ok_or_else(|| CoreError::UnknownAlias {
                alias: alias.to_string(),
                location: raw.to_string(),
            })?;

        if rest.is_empty() {
            Ok(base.clone())
        } else {
            Ok(base.join(rest))
        }
    }
}

#[cfg(test)]
#[path = "location_test.rs"]
mod tests;

//! Migration discovery across locations.
//!
//! The [`Locator`] lists every configured location, keeps files whose names
//! are canonical migration names, drops the ones already in the applied set,
//! and returns the rest in apply order: ascending name, ties broken by the
//! position of the location in the [`LocationSet`].

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::history::AppliedSet;
use crate::location::{AliasResolver, Location, LocationSet};
use crate::migration_name::MigrationName;
use crate::migration_ref::MigrationRef;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// How locations are scanned and how history is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupPolicy {
    /// Scan every location; a candidate is applied only if its exact
    /// `(name, location)` is in the history.
    #[default]
    MultiLocation,
    /// Scan the primary location only; a candidate is applied if its name
    /// appears anywhere in the history.
    PrimaryOnly,
}

/// Finds pending migrations across a set of locations.
#[derive(Debug, Clone)]
pub struct Locator {
    resolver: AliasResolver,
    extension: String,
    policy: LookupPolicy,
}

impl Locator {
    pub fn new(resolver: AliasResolver, extension: impl Into<String>, policy: LookupPolicy) -> Self {
        Self {
            resolver,
            extension: extension.into(),
            policy,
        }
    }

    /// Build a locator from project configuration rooted at `root`.
    pub fn from_config(config: &Config, root: &Path) -> Self {
        Self::new(
            config.alias_resolver(root),
            config.file_extension.clone(),
            config.lookup_policy(),
        )
    }

    pub fn resolver(&self) -> &AliasResolver {
        &self.resolver
    }

    /// Migration file extension, without the dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Locations this locator actually scans, in scan order.
    pub fn scanned_locations<'a>(&self, locations: &'a LocationSet) -> Vec<&'a Location> {
        match self.policy {
            LookupPolicy::MultiLocation => locations.iter().collect(),
            LookupPolicy::PrimaryOnly => vec![locations.primary()],
        }
    }

    /// Return the migrations not yet in `applied`, in apply order.
    ///
    /// Two locations holding the same name yield two entries. The result is a
    /// pure function of the filesystem state and `applied`.
    pub fn discover_pending(
        &self,
        locations: &LocationSet,
        applied: &AppliedSet,
    ) -> CoreResult<Vec<MigrationRef>> {
        let mut pending: Vec<(usize, MigrationRef)> = Vec::new();

        for (index, location) in self.scanned_locations(locations).into_iter().enumerate() {
            let is_primary = locations.is_primary(location);
            let names = self.scan_location(location, is_primary)?;
            log::debug!("Lookup: {location} ({} candidates)", names.len());

            for name in names {
                let migration = MigrationRef::new(name, location.clone());
                let already_applied = match self.policy {
                    LookupPolicy::MultiLocation => applied.contains(&migration),
                    LookupPolicy::PrimaryOnly => applied.contains_name(&migration.name),
                };
                if !already_applied {
                    pending.push((index, migration));
                }
            }
        }

        pending.sort_by(|(ia, a), (ib, b)| a.name.cmp(&b.name).then(ia.cmp(ib)));
        Ok(pending.into_iter().map(|(_, m)| m).collect())
    }

    /// List candidate migration names in one location, sorted.
    ///
    /// With `tolerate_missing`, a location whose directory does not exist
    /// yields no candidates instead of an error. Only the primary location is
    /// scanned this way: a new project may not have created it yet.
    pub fn scan_location(
        &self,
        location: &Location,
        tolerate_missing: bool,
    ) -> CoreResult<Vec<MigrationName>> {
        let dir = self.resolver.resolve(location)?;
        let unreadable = |reason: String| CoreError::LocationUnreadable {
            location: location.to_string(),
            path: dir.display().to_string(),
            reason,
        };

        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound && tolerate_missing => {
                log::debug!(
                    "Primary location {location} ({}) does not exist yet",
                    dir.display()
                );
                return Ok(Vec::new());
            }
            Err(e) if dir.exists() && !dir.is_dir() => {
                return Err(unreadable(format!("not a directory ({e})")));
            }
            Err(e) => return Err(unreadable(e.to_string())),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| unreadable(e.to_string()))?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            let Some(name) = MigrationName::from_file_name(file_name, &self.extension) else {
                continue;
            };
            if name.is_base() || !entry.path().is_file() {
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }

    /// Path of the script backing `migration`.
    pub fn script_path(&self, migration: &MigrationRef) -> CoreResult<PathBuf> {
        let dir = self.resolver.resolve(&migration.location)?;
        let path = dir.join(format!("{}.{}", migration.name, self.extension));
        if path.is_file() {
            Ok(path)
        } else {
            Err(CoreError::ScriptNotFound {
                name: migration.name.to_string(),
                location: migration.location.to_string(),
                path: path.display().to_string(),
            })
        }
    }
}

#[cfg(test)]
#[path = "locator_test.rs"]
mod tests;

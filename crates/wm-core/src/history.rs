//! Read-only view of the applied-migration history.

use crate::migration_name::MigrationName;
use crate::migration_ref::MigrationRef;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// One applied migration and when it was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub migration: MigrationRef,
    /// Epoch seconds. Rows written by other tools may leave this empty.
    pub applied_at: Option<i64>,
}

impl AppliedMigration {
    /// `applied_at` as a UTC timestamp.
    pub fn applied_at_utc(&self) -> Option<DateTime<Utc>> {
        self.applied_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    }
}

/// Applied migrations, most recent first.
///
/// Membership is by full [`MigrationRef`]; [`contains_name`](Self::contains_name)
/// exists for the primary-only lookup policy, which matches on name alone.
#[derive(Debug, Clone, Default)]
pub struct AppliedSet {
    entries: Vec<AppliedMigration>,
    refs: HashSet<MigrationRef>,
    names: HashSet<MigrationName>,
}

impl AppliedSet {
    /// Build from entries already ordered most recent first.
    pub fn from_entries(entries: Vec<AppliedMigration>) -> Self {
        let refs = entries.iter().map(|e| e.migration.clone()).collect();
        let names = entries.iter().map(|e| e.migration.name.clone()).collect();
        Self {
            entries,
            refs,
            names,
        }
    }

    pub fn contains(&self, migration: &MigrationRef) -> bool {
        self.refs.contains(migration)
    }

    pub fn contains_name(&self, name: &MigrationName) -> bool {
        self.names.contains(name)
    }

    /// Entries in most-recent-first order.
    pub fn iter(&self) -> impl Iterator<Item = &AppliedMigration> {
        self.entries.iter()
    }

    /// Refs in most-recent-first order.
    pub fn refs(&self) -> impl Iterator<Item = &MigrationRef> {
        self.entries.iter().map(|e| &e.migration)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for AppliedSet {
    type Item = AppliedMigration;
    type IntoIter = std::vec::IntoIter<AppliedMigration>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<MigrationRef> for AppliedSet {
    /// Build a set without timestamps, e.g. for discovery tests.
    fn from_iter<I: IntoIterator<Item = MigrationRef>>(iter: I) -> Self {
        Self::from_entries(
            iter.into_iter()
                .map(|migration| AppliedMigration {
                    migration,
                    applied_at: None,
                })
                .collect(),
        )
    }
}

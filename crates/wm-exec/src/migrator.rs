//! Apply/revert driver
//!
//! The [`Migrator`] ties the locator, the ledger and the loaders together.
//! Every step runs the migration and writes its ledger row inside one
//! transaction, so a failed step leaves neither behind. Batches stop at the
//! first failure; steps that already committed stay applied.

use crate::error::{Direction, ExecError, ExecResult};
use crate::registry::LoaderRegistry;
use std::path::Path;
use wm_core::{
    AppliedMigration, AppliedSet, Config, LocationSet, Locator, MigrationName, MigrationRef,
};
use wm_ledger::Ledger;

/// Result of [`Migrator::mark`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkOutcome {
    /// Pending migrations recorded as applied, in apply order
    Recorded(Vec<MigrationRef>),
    /// Applied migrations removed from history, most recent first
    Forgotten(Vec<MigrationRef>),
}

impl MarkOutcome {
    /// Migrations whose history changed
    pub fn migrations(&self) -> &[MigrationRef] {
        match self {
            MarkOutcome::Recorded(m) | MarkOutcome::Forgotten(m) => m,
        }
    }
}

/// Drives migrations against one ledger
pub struct Migrator {
    locator: Locator,
    locations: LocationSet,
    ledger: Ledger,
    loaders: LoaderRegistry,
}

impl Migrator {
    /// Create a migrator over `locations` using the default SQL loader
    pub fn new(locator: Locator, locations: LocationSet, ledger: Ledger) -> Self {
        Self {
            locator,
            locations,
            ledger,
            loaders: LoaderRegistry::default(),
        }
    }

    /// Build a migrator from project configuration rooted at `root`
    pub fn from_config(config: &Config, root: &Path, ledger: Ledger) -> Self {
        Self::new(
            Locator::from_config(config, root),
            config.location_set(),
            ledger,
        )
    }

    /// Replace the loader registry
    pub fn with_loaders(mut self, loaders: LoaderRegistry) -> Self {
        self.loaders = loaders;
        self
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn locations(&self) -> &LocationSet {
        &self.locations
    }

    /// Migrations not yet applied, in apply order
    pub fn pending(&self) -> ExecResult<Vec<MigrationRef>> {
        let applied = self.ledger.applied_set(None)?;
        Ok(self.locator.discover_pending(&self.locations, &applied)?)
    }

    /// Applied migrations, most recent first.
    ///
    /// Rows sharing an apply time and a name were applied in location order,
    /// so among them the later location counts as more recent.
    pub fn history(&self, limit: Option<usize>) -> ExecResult<AppliedSet> {
        let mut entries: Vec<AppliedMigration> =
            self.ledger.applied_set(None)?.into_iter().collect();
        let rank = |m: &MigrationRef| self.locations.index_of(&m.location);
        entries.sort_by(|a, b| {
            b.applied_at
                .cmp(&a.applied_at)
                .then_with(|| b.migration.name.cmp(&a.migration.name))
                .then_with(|| rank(&b.migration).cmp(&rank(&a.migration)))
                .then_with(|| b.migration.location.cmp(&a.migration.location))
        });
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        Ok(AppliedSet::from_entries(entries))
    }

    /// Apply up to `limit` pending migrations (all when `None`).
    ///
    /// Returns the migrations applied, in order.
    pub fn up(&self, limit: Option<usize>) -> ExecResult<Vec<MigrationRef>> {
        let mut pending = self.pending()?;
        if let Some(limit) = limit {
            pending.truncate(limit);
        }
        if pending.is_empty() {
            log::debug!("No new migrations");
        }
        self.run_batch(pending, Direction::Up)
    }

    /// Revert up to `limit` applied migrations (all when `None`), most recent
    /// first.
    pub fn down(&self, limit: Option<usize>) -> ExecResult<Vec<MigrationRef>> {
        let targets: Vec<MigrationRef> = self.history(limit)?.refs().cloned().collect();
        self.run_batch(targets, Direction::Down)
    }

    /// Revert the `limit` most recent migrations, then apply them again in
    /// their original order.
    pub fn redo(&self, limit: Option<usize>) -> ExecResult<Vec<MigrationRef>> {
        let mut reverted = self.down(limit)?;
        reverted.reverse();
        self.run_batch(reverted, Direction::Up)
    }

    /// Move history to `target` without running any migration.
    ///
    /// A pending target is recorded together with every pending migration
    /// ordered before it. An applied target keeps its row and forgets every
    /// migration applied after it. The base marker name forgets everything.
    /// `target` is a migration token or a bare name; a bare name must not
    /// exist in more than one location.
    pub fn mark(&self, target: &str) -> ExecResult<MarkOutcome> {
        let applied: Vec<MigrationRef> = self.history(None)?.refs().cloned().collect();

        if target == wm_core::BASE_MIGRATION {
            return self.forget_all(applied).map(MarkOutcome::Forgotten);
        }

        let pending = self.pending()?;
        let resolved = resolve_target(target, &pending, &applied)?;

        if let Some(pos) = pending.iter().position(|m| *m == resolved) {
            let to_record: Vec<MigrationRef> = pending[..=pos].to_vec();
            self.ledger
                .transaction(|ledger| -> ExecResult<()> {
                    for migration in &to_record {
                        ledger.record(migration)?;
                    }
                    Ok(())
                })?;
            log::info!("History marked up to {resolved} ({} recorded)", to_record.len());
            return Ok(MarkOutcome::Recorded(to_record));
        }

        let pos = applied
            .iter()
            .position(|m| *m == resolved)
            .ok_or_else(|| ExecError::UnknownTarget {
                target: target.to_string(),
            })?;
        let later: Vec<MigrationRef> = applied[..pos].to_vec();
        let forgotten = self.forget_all(later)?;
        log::info!("History marked at {resolved} ({} forgotten)", forgotten.len());
        Ok(MarkOutcome::Forgotten(forgotten))
    }

    fn forget_all(&self, migrations: Vec<MigrationRef>) -> ExecResult<Vec<MigrationRef>> {
        self.ledger.transaction(|ledger| -> ExecResult<()> {
            for migration in &migrations {
                ledger.forget(migration)?;
            }
            Ok(())
        })?;
        Ok(migrations)
    }

    fn run_batch(
        &self,
        migrations: Vec<MigrationRef>,
        direction: Direction,
    ) -> ExecResult<Vec<MigrationRef>> {
        let mut done = Vec::with_capacity(migrations.len());
        for migration in migrations {
            let step = match direction {
                Direction::Up => self.apply(&migration),
                Direction::Down => self.revert(&migration),
            };
            if let Err(e) = step {
                log::error!("{direction} failed for {migration}: {e}");
                return Err(ExecError::StepFailed {
                    migration: migration.to_string(),
                    direction,
                    completed: done.len(),
                    source: Box::new(e),
                });
            }
            done.push(migration);
        }
        Ok(done)
    }

    /// Apply one migration and record it
    pub fn apply(&self, migration: &MigrationRef) -> ExecResult<()> {
        let path = self.locator.script_path(migration)?;
        let loaded = self.loaders.load(migration, &path)?;
        self.ledger.transaction(|ledger| -> ExecResult<()> {
            loaded.up(ledger.conn())?;
            ledger.record(migration)?;
            Ok(())
        })?;
        log::info!("Applied {migration}");
        Ok(())
    }

    /// Revert one migration and forget it
    pub fn revert(&self, migration: &MigrationRef) -> ExecResult<()> {
        let path = self.locator.script_path(migration)?;
        let loaded = self.loaders.load(migration, &path)?;
        self.ledger.transaction(|ledger| -> ExecResult<()> {
            loaded.down(ledger.conn())?;
            ledger.forget(migration)?;
            Ok(())
        })?;
        log::info!("Reverted {migration}");
        Ok(())
    }
}

/// Resolve a token or bare name against the known migrations
fn resolve_target(
    target: &str,
    pending: &[MigrationRef],
    applied: &[MigrationRef],
) -> ExecResult<MigrationRef> {
    let known = || pending.iter().chain(applied.iter());

    if target.trim_start().starts_with('{') {
        let migration = MigrationRef::from_token(target)?;
        return known()
            .find(|m| **m == migration)
            .cloned()
            .ok_or_else(|| ExecError::UnknownTarget {
                target: target.to_string(),
            });
    }

    let name = MigrationName::parse(target)?;
    let mut matches: Vec<&MigrationRef> = known().filter(|m| m.name == name).collect();
    matches.sort();
    matches.dedup();

    match matches.as_slice() {
        [] => Err(ExecError::UnknownTarget {
            target: target.to_string(),
        }),
        [only] => Ok((*only).clone()),
        many => Err(ExecError::AmbiguousTarget {
            name: name.to_string(),
            locations: many
                .iter()
                .map(|m| m.location.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

#[cfg(test)]
#[path = "migrator_test.rs"]
mod tests;

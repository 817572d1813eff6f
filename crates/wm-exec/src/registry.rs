//! Loader lookup by location

use crate::error::ExecResult;
use crate::script::SqlScriptLoader;
use crate::traits::{Migration, MigrationLoader};
use std::collections::HashMap;
use std::path::Path;
use wm_core::{Location, MigrationRef};

/// Chooses the [`MigrationLoader`] for each location.
///
/// Locations without an override use the default loader, which reads SQL
/// scripts unless replaced.
pub struct LoaderRegistry {
    default: Box<dyn MigrationLoader>,
    overrides: HashMap<Location, Box<dyn MigrationLoader>>,
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::new(SqlScriptLoader)
    }
}

impl LoaderRegistry {
    /// Create a registry with `default` as the fallback loader
    pub fn new(default: impl MigrationLoader + 'static) -> Self {
        Self {
            default: Box::new(default),
            overrides: HashMap::new(),
        }
    }

    /// Use `loader` for migrations in `location`
    pub fn with_loader(
        mut self,
        location: Location,
        loader: impl MigrationLoader + 'static,
    ) -> Self {
        self.overrides.insert(location, Box::new(loader));
        self
    }

    /// Loader responsible for `location`
    pub fn loader_for(&self, location: &Location) -> &dyn MigrationLoader {
        match self.overrides.get(location) {
            Some(loader) => loader.as_ref(),
            None => self.default.as_ref(),
        }
    }

    /// Load `migration` from `path` with the loader for its location
    pub fn load(&self, migration: &MigrationRef, path: &Path) -> ExecResult<Box<dyn Migration>> {
        self.loader_for(&migration.location).load(migration, path)
    }
}

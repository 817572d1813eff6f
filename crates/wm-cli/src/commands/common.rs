//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use wm_core::{Config, Location, MigrationRef};
use wm_exec::Migrator;
use wm_ledger::{Ledger, LedgerSettings};

use crate::cli::GlobalArgs;

/// A loaded project: its configuration with CLI overrides applied, and the
/// directory relative paths resolve against.
pub(crate) struct Project {
    pub config: Config,
    pub root: PathBuf,
}

/// Load the project configuration and apply global CLI overrides.
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    let root = PathBuf::from(&global.project_dir);
    let mut config = match &global.config {
        Some(path) => Config::load(Path::new(path)),
        None => Config::load_from_dir(&root),
    }
    .context("Failed to load project")?;

    for extra in &global.extra_location {
        let location = Location::try_new(extra.clone())
            .with_context(|| format!("Empty --extra-location value: '{extra}'"))?;
        config.extra_locations.push(location);
    }
    if global.disable_lookup {
        config.disable_multi_location_lookup = true;
    }
    config.validate().context("Invalid configuration")?;

    if global.verbose {
        let locations = config.location_set();
        let extras: Vec<&str> = locations.extras().iter().map(|l| l.as_str()).collect();
        eprintln!(
            "[verbose] Project '{}' at {} (primary {}, extra [{}])",
            config.name,
            root.display(),
            locations.primary(),
            extras.join(", ")
        );
    }
    Ok(Project { config, root })
}

/// Open the migration ledger configured for `project`.
pub(crate) fn open_ledger(project: &Project, global: &GlobalArgs) -> Result<Ledger> {
    let settings = LedgerSettings::from_config(&project.config);
    match project.config.database_path_absolute(&project.root) {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
            if global.verbose {
                eprintln!("[verbose] Opening database {}", path.display());
            }
            Ledger::open(&path, settings)
                .with_context(|| format!("Failed to open database: {}", path.display()))
        }
        None => {
            if global.verbose {
                eprintln!("[verbose] Using in-memory database; history will not persist");
            }
            Ledger::open_memory(settings).context("Failed to open in-memory database")
        }
    }
}

/// Load the project and build a migrator over its ledger.
pub(crate) fn load_migrator(global: &GlobalArgs) -> Result<Migrator> {
    let project = load_project(global)?;
    let ledger = open_ledger(&project, global)?;
    Ok(Migrator::from_config(&project.config, &project.root, ledger))
}

/// One migration in machine-readable listings.
#[derive(Debug, Serialize)]
pub(crate) struct MigrationRow {
    pub name: String,
    pub location: String,
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_at: Option<String>,
}

impl MigrationRow {
    pub(crate) fn new(migration: &MigrationRef, applied_at: Option<DateTime<Utc>>) -> Self {
        Self {
            name: migration.name.to_string(),
            location: migration.location.to_string(),
            token: migration.to_token(),
            applied_at: applied_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Print migrations as an indented list, one per line.
pub(crate) fn print_migrations(migrations: &[MigrationRef]) {
    for migration in migrations {
        println!("  {migration}");
    }
}

/// Pluralize "migration" for `count`.
pub(crate) fn migrations_word(count: usize) -> &'static str {
    if count == 1 {
        "migration"
    } else {
        "migrations"
    }
}

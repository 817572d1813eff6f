//! Create command implementation

use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::fs;
use wm_core::{Location, Locator, MigrationName};

use crate::cli::{CreateArgs, GlobalArgs};
use crate::commands::common::load_project;

const TEMPLATE: &str = "-- waymark:up\n\n-- waymark:down\n";

/// Execute the create command
pub fn execute(args: &CreateArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let locator = Locator::from_config(&project.config, &project.root);

    let location = match &args.location {
        Some(raw) => Location::try_new(raw.clone())
            .with_context(|| format!("Empty --location value: '{raw}'"))?,
        None => project.config.primary_location.clone(),
    };
    if !project.config.location_set().iter().any(|l| *l == location) {
        bail!(
            "Location '{location}' is not configured; add it to extra_locations or pass --extra-location"
        );
    }

    let name = MigrationName::generate(&args.slug, Utc::now())?;
    let dir = locator.resolver().resolve(&location)?;
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let path = dir.join(format!("{name}.{}", locator.extension()));
    if path.exists() {
        bail!("Migration file already exists: {}", path.display());
    }
    fs::write(&path, TEMPLATE)
        .with_context(|| format!("Failed to write migration: {}", path.display()))?;

    println!("Created {name} in {location}");
    if global.verbose {
        eprintln!("[verbose] Wrote {}", path.display());
    }
    Ok(())
}

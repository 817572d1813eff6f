//! Configuration types and parsing for waymark.yml

use crate::error::{CoreError, CoreResult};
use crate::location::{AliasResolver, Location, LocationSet};
use crate::locator::LookupPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Main project configuration from waymark.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// The application's own migration location (alias or path)
    pub primary_location: Location,

    /// Additional migration locations, searched after the primary
    #[serde(default)]
    pub extra_locations: Vec<Location>,

    /// Scan only the primary location and match history by name alone.
    ///
    /// For applications whose history predates per-location tracking.
    #[serde(default)]
    pub disable_multi_location_lookup: bool,

    /// Name of the history table
    #[serde(default = "default_migration_table")]
    pub migration_table: String,

    /// Extension of migration files, without the dot
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    /// Alias directories, keyed by `@name`. Relative paths resolve against the
    /// project root. `@app` is the project root unless overridden here.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// DuckDB database path, or `:memory:`
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

const DEFAULT_DB_PATH: &str = ":memory:";

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_migration_table() -> String {
    "migration".to_string()
}

fn default_file_extension() -> String {
    "sql".to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for waymark.yml or waymark.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("waymark.yml");
        let yaml_path = dir.join("waymark.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }

        if !is_plain_identifier(&self.migration_table) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "migration_table '{}' must be a plain identifier ([A-Za-z_][A-Za-z0-9_]*)",
                    self.migration_table
                ),
            });
        }

        if self.file_extension.is_empty() || self.file_extension.starts_with('.') {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "file_extension '{}' must be non-empty and given without the leading dot",
                    self.file_extension
                ),
            });
        }

        for alias in self.aliases.keys() {
            if !alias.starts_with('@') || alias.len() < 2 || alias.contains('/') {
                return Err(CoreError::ConfigInvalid {
                    message: format!("alias '{alias}' must look like '@name'"),
                });
            }
        }

        Ok(())
    }

    /// Configured locations in scan order.
    pub fn location_set(&self) -> LocationSet {
        LocationSet::new(
            self.primary_location.clone(),
            self.extra_locations.iter().cloned(),
        )
    }

    /// Lookup policy implied by `disable_multi_location_lookup`.
    pub fn lookup_policy(&self) -> LookupPolicy {
        if self.disable_multi_location_lookup {
            LookupPolicy::PrimaryOnly
        } else {
            LookupPolicy::MultiLocation
        }
    }

    /// Alias resolver rooted at the project directory.
    pub fn alias_resolver(&self, root: &Path) -> AliasResolver {
        let mut resolver = AliasResolver::new(root);
        for (alias, dir) in &self.aliases {
            resolver.register(alias.clone(), dir);
        }
        resolver
    }

    /// Database path made absolute against `root`, or `None` for in-memory.
    pub fn database_path_absolute(&self, root: &Path) -> Option<PathBuf> {
        if self.database.path == DEFAULT_DB_PATH {
            None
        } else {
            Some(root.join(&self.database.path))
        }
    }
}

fn is_plain_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

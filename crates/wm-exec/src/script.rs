//! SQL script migrations
//!
//! A script is one file split into sections by marker lines:
//!
//! ```sql
//! -- waymark:up
//! CREATE TABLE orders (id INTEGER);
//! -- waymark:down
//! DROP TABLE orders;
//! ```
//!
//! Text before the first marker belongs to the up section. A script whose
//! down section is empty cannot be reverted.

use crate::error::{Direction, ExecError, ExecResult};
use crate::traits::{Migration, MigrationLoader};
use duckdb::Connection;
use std::path::Path;
use wm_core::MigrationRef;

/// Marker line opening the up section
pub const UP_MARKER: &str = "-- waymark:up";

/// Marker line opening the down section
pub const DOWN_MARKER: &str = "-- waymark:down";

/// A migration backed by a SQL file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlScript {
    migration: String,
    up: String,
    down: String,
}

impl SqlScript {
    /// Split `source` into up/down sections
    pub fn parse(migration: impl Into<String>, source: &str) -> Self {
        let mut up = String::new();
        let mut down = String::new();
        let mut direction = Direction::Up;

        for line in source.lines() {
            let marker = line.trim();
            if marker.eq_ignore_ascii_case(UP_MARKER) {
                direction = Direction::Up;
                continue;
            }
            if marker.eq_ignore_ascii_case(DOWN_MARKER) {
                direction = Direction::Down;
                continue;
            }
            let section = match direction {
                Direction::Up => &mut up,
                Direction::Down => &mut down,
            };
            section.push_str(line);
            section.push('\n');
        }

        Self {
            migration: migration.into(),
            up,
            down,
        }
    }

    /// Read and parse the script at `path`
    pub fn from_file(migration: impl Into<String>, path: &Path) -> ExecResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| ExecError::ScriptRead {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(Self::parse(migration, &source))
    }

    /// SQL of the up section
    pub fn up_sql(&self) -> &str {
        &self.up
    }

    /// SQL of the down section
    pub fn down_sql(&self) -> &str {
        &self.down
    }

    /// Whether the script has a non-empty down section
    pub fn is_reversible(&self) -> bool {
        !is_blank(&self.down)
    }

    fn run(&self, conn: &Connection, sql: &str, direction: Direction) -> ExecResult<()> {
        if is_blank(sql) {
            log::debug!("{}: empty {direction} section", self.migration);
            return Ok(());
        }
        conn.execute_batch(sql).map_err(|e| ExecError::Statement {
            migration: self.migration.clone(),
            direction,
            source: e,
        })
    }
}

impl Migration for SqlScript {
    fn up(&self, conn: &Connection) -> ExecResult<()> {
        self.run(conn, &self.up, Direction::Up)
    }

    fn down(&self, conn: &Connection) -> ExecResult<()> {
        if !self.is_reversible() {
            return Err(ExecError::Irreversible {
                migration: self.migration.clone(),
            });
        }
        self.run(conn, &self.down, Direction::Down)
    }
}

/// Loads [`SqlScript`] migrations from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlScriptLoader;

impl MigrationLoader for SqlScriptLoader {
    fn load(&self, migration: &MigrationRef, path: &Path) -> ExecResult<Box<dyn Migration>> {
        Ok(Box::new(SqlScript::from_file(
            migration.name.as_str(),
            path,
        )?))
    }
}

/// True when `sql` holds nothing but whitespace and `--` line comments
fn is_blank(sql: &str) -> bool {
    sql.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with("--")
    })
}

#[cfg(test)]
#[path = "script_test.rs"]
mod tests;

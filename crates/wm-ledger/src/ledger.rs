//! The migration ledger.
//!
//! [`Ledger`] owns a DuckDB [`Connection`] and records which migrations have
//! been applied, keyed by `(version, alias)`. The connection is shared with
//! migration execution so that a migration and its history row can commit in
//! the same transaction (see [`Ledger::transaction`]).

use crate::ddl::{create_table_sql, quote_ident, COLUMN_WIDTH, TABLE_COLUMNS_SQL};
use crate::error::{storage, LedgerError, LedgerResult};
use duckdb::Connection;
use std::cell::Cell;
use std::path::Path;
use wm_core::{
    AppliedMigration, AppliedSet, Clock, Config, Location, MigrationName, MigrationRef,
    SystemClock, BASE_MIGRATION,
};

/// Where the history lives and how it may be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSettings {
    /// History table name
    pub table: String,
    /// Location assigned to the base marker and to legacy rows
    pub primary: Location,
    /// Accept a table without the `alias` column and read its rows as
    /// primary-located. Only meaningful with primary-only lookup.
    pub allow_legacy_layout: bool,
}

impl LedgerSettings {
    pub fn new(table: impl Into<String>, primary: Location) -> Self {
        Self {
            table: table.into(),
            primary,
            allow_legacy_layout: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            table: config.migration_table.clone(),
            primary: config.primary_location.clone(),
            allow_legacy_layout: config.disable_multi_location_lookup,
        }
    }
}

/// Shape of the history table as found in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// No history table yet.
    Missing,
    /// `(version, alias, apply_time)`.
    Tracked,
    /// `(version, apply_time)`: history from before location tracking.
    Legacy,
}

/// DuckDB-backed record of applied migrations.
///
/// Single-threaded; one invocation is expected to run at a time.
pub struct Ledger {
    pub(crate) conn: Connection,
    pub(crate) settings: LedgerSettings,
    clock: Box<dyn Clock>,
    in_transaction: Cell<bool>,
}

impl Ledger {
    /// Open (or create) the database at `path`.
    ///
    /// The history table itself is created lazily by
    /// [`ensure_initialized`](Self::ensure_initialized).
    pub fn open(path: &Path, settings: LedgerSettings) -> LedgerResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| LedgerError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self::from_connection(conn, settings))
    }

    /// Open an in-memory database.
    pub fn open_memory(settings: LedgerSettings) -> LedgerResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| LedgerError::ConnectionError(e.to_string()))?;
        Ok(Self::from_connection(conn, settings))
    }

    /// Wrap an existing connection.
    pub fn from_connection(conn: Connection, settings: LedgerSettings) -> Self {
        Self {
            conn,
            settings,
            clock: Box::new(SystemClock),
            in_transaction: Cell::new(false),
        }
    }

    /// Replace the time source used for `apply_time`.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Borrow the underlying DuckDB connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    /// Inspect the history table without modifying it.
    pub fn layout(&self) -> LedgerResult<Layout> {
        let columns = self.table_columns()?;
        let has = |name: &str| columns.iter().any(|c| c.eq_ignore_ascii_case(name));

        if columns.is_empty() {
            Ok(Layout::Missing)
        } else if has("version") && has("alias") {
            Ok(Layout::Tracked)
        } else if has("version") {
            Ok(Layout::Legacy)
        } else {
            Err(LedgerError::UnrecognizedTable {
                table: self.settings.table.clone(),
                columns: columns.join(", "),
            })
        }
    }

    pub(crate) fn table_columns(&self) -> LedgerResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(TABLE_COLUMNS_SQL)
            .map_err(storage("inspect history table"))?;
        let columns = stmt
            .query_map(duckdb::params![self.settings.table], |row| {
                row.get::<_, String>(0)
            })
            .map_err(storage("inspect history table"))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(storage("inspect history table"))?;
        Ok(columns)
    }

    /// Create the history table and its base marker if absent.
    ///
    /// Safe to call before every operation; an existing table is left alone.
    /// Returns the layout in effect. A legacy table is only accepted when
    /// [`LedgerSettings::allow_legacy_layout`] is set.
    pub fn ensure_initialized(&self) -> LedgerResult<Layout> {
        match self.layout()? {
            Layout::Missing => {
                self.create_table()?;
                Ok(Layout::Tracked)
            }
            Layout::Tracked => Ok(Layout::Tracked),
            Layout::Legacy if self.settings.allow_legacy_layout => Ok(Layout::Legacy),
            Layout::Legacy => Err(LedgerError::LegacyHistory {
                table: self.settings.table.clone(),
                primary: self.settings.primary.to_string(),
            }),
        }
    }

    pub(crate) fn create_table(&self) -> LedgerResult<()> {
        check_width("alias", self.settings.primary.as_str())?;
        log::debug!(
            "Creating migration history table \"{}\"",
            self.settings.table
        );
        let now = self.clock.now();
        self.transaction(|ledger| -> LedgerResult<()> {
            ledger
                .conn
                .execute_batch(&create_table_sql(&ledger.settings.table))
                .map_err(storage("create history table"))?;
            ledger
                .conn
                .execute(
                    &format!(
                        "INSERT INTO {} (version, alias, apply_time) VALUES (?, ?, ?)",
                        quote_ident(&ledger.settings.table)
                    ),
                    duckdb::params![BASE_MIGRATION, ledger.settings.primary.as_str(), now],
                )
                .map_err(storage("insert base marker"))?;
            Ok(())
        })
    }

    /// Applied migrations, most recent first, excluding the base marker.
    ///
    /// Ordered by `apply_time DESC, version DESC`, then alias; `limit` caps
    /// the number of rows returned. The alias tie-break is string order, not
    /// apply order.
    pub fn applied_set(&self, limit: Option<usize>) -> LedgerResult<AppliedSet> {
        let layout = self.ensure_initialized()?;
        let (alias_expr, alias_order) = match layout {
            Layout::Legacy => ("CAST(NULL AS VARCHAR)", ""),
            _ => ("alias", ", alias DESC"),
        };
        let mut sql = format!(
            "SELECT version, {alias_expr}, CAST(apply_time AS BIGINT)
             FROM {}
             WHERE version <> ?
             ORDER BY apply_time DESC NULLS LAST, version DESC{alias_order}",
            quote_ident(&self.settings.table)
        );
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(storage("read migration history"))?;
        let rows: Vec<(String, Option<String>, Option<i64>)> = stmt
            .query_map(duckdb::params![BASE_MIGRATION], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .map_err(storage("read migration history"))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(storage("read migration history"))?;

        let entries = rows
            .into_iter()
            .map(|(version, alias, applied_at)| {
                let migration = self.decode_row(version, alias, layout)?;
                Ok(AppliedMigration {
                    migration,
                    applied_at,
                })
            })
            .collect::<LedgerResult<Vec<_>>>()?;
        Ok(AppliedSet::from_entries(entries))
    }

    fn decode_row(
        &self,
        version: String,
        alias: Option<String>,
        layout: Layout,
    ) -> LedgerResult<MigrationRef> {
        let corrupt = |reason: String| LedgerError::CorruptHistory {
            table: self.settings.table.clone(),
            version: version.clone(),
            alias: alias.clone().unwrap_or_default(),
            reason,
        };

        let location = match layout {
            Layout::Legacy => self.settings.primary.clone(),
            _ => alias
                .clone()
                .and_then(Location::try_new)
                .ok_or_else(|| corrupt("empty alias".to_string()))?,
        };
        let name = MigrationName::parse(version.as_str()).map_err(|e| corrupt(e.to_string()))?;
        Ok(MigrationRef::new(name, location))
    }

    /// `true` if `migration` is recorded as applied.
    pub fn contains(&self, migration: &MigrationRef) -> LedgerResult<bool> {
        let layout = self.ensure_initialized()?;
        if migration.name.is_base() {
            return Ok(false);
        }
        let table = quote_ident(&self.settings.table);
        let count: i64 = match layout {
            Layout::Legacy => {
                if self.settings.primary != migration.location {
                    return Ok(false);
                }
                self.conn.query_row(
                    &format!("SELECT COUNT(*) FROM {table} WHERE version = ?"),
                    duckdb::params![migration.name.as_str()],
                    |row| row.get(0),
                )
            }
            _ => self.conn.query_row(
                &format!("SELECT COUNT(*) FROM {table} WHERE version = ? AND alias = ?"),
                duckdb::params![migration.name.as_str(), migration.location.as_str()],
                |row| row.get(0),
            ),
        }
        .map_err(storage("look up migration history"))?;
        Ok(count > 0)
    }

    /// Record `migration` as applied now.
    ///
    /// Fails with [`LedgerError::DuplicateApply`] if it is already recorded.
    pub fn record(&self, migration: &MigrationRef) -> LedgerResult<()> {
        let layout = self.ensure_initialized()?;
        check_width("version", migration.name.as_str())?;
        check_width("alias", migration.location.as_str())?;
        if migration.name.is_base() || self.contains(migration)? {
            return Err(LedgerError::DuplicateApply {
                name: migration.name.to_string(),
                location: migration.location.to_string(),
            });
        }

        let table = quote_ident(&self.settings.table);
        let now = self.clock.now();
        match layout {
            Layout::Legacy => {
                self.require_primary(migration)?;
                self.conn.execute(
                    &format!("INSERT INTO {table} (version, apply_time) VALUES (?, ?)"),
                    duckdb::params![migration.name.as_str(), now],
                )
            }
            _ => self.conn.execute(
                &format!("INSERT INTO {table} (version, alias, apply_time) VALUES (?, ?, ?)"),
                duckdb::params![migration.name.as_str(), migration.location.as_str(), now],
            ),
        }
        .map_err(storage(format!("record {}", migration.name)))?;

        log::debug!("Recorded {migration} at {now}");
        Ok(())
    }

    /// Remove the history row of `migration`.
    ///
    /// Fails with [`LedgerError::MissingRevert`] if no such row exists.
    pub fn forget(&self, migration: &MigrationRef) -> LedgerResult<()> {
        let layout = self.ensure_initialized()?;
        let missing = || LedgerError::MissingRevert {
            name: migration.name.to_string(),
            location: migration.location.to_string(),
        };
        if migration.name.is_base() {
            return Err(missing());
        }

        let table = quote_ident(&self.settings.table);
        let deleted = match layout {
            Layout::Legacy => {
                if self.settings.primary != migration.location {
                    return Err(missing());
                }
                self.conn.execute(
                    &format!("DELETE FROM {table} WHERE version = ?"),
                    duckdb::params![migration.name.as_str()],
                )
            }
            _ => self.conn.execute(
                &format!("DELETE FROM {table} WHERE version = ? AND alias = ?"),
                duckdb::params![migration.name.as_str(), migration.location.as_str()],
            ),
        }
        .map_err(storage(format!("forget {}", migration.name)))?;

        if deleted == 0 {
            return Err(missing());
        }
        log::debug!("Forgot {migration}");
        Ok(())
    }

    fn require_primary(&self, migration: &MigrationRef) -> LedgerResult<()> {
        if self.settings.primary == migration.location {
            Ok(())
        } else {
            Err(LedgerError::LegacyHistory {
                table: self.settings.table.clone(),
                primary: self.settings.primary.to_string(),
            })
        }
    }

    /// Execute `body` within a `BEGIN` / `COMMIT` transaction, rolling back on
    /// error.
    ///
    /// Calls made while a transaction is already open run inside it.
    pub fn transaction<F, T, E>(&self, body: F) -> Result<T, E>
    where
        F: FnOnce(&Ledger) -> Result<T, E>,
        E: From<LedgerError>,
    {
        if self.in_transaction.get() {
            return body(self);
        }

        self.conn
            .execute_batch("BEGIN TRANSACTION")
            .map_err(|e| LedgerError::TransactionError(format!("BEGIN failed: {e}")))?;
        self.in_transaction.set(true);

        let result = body(self);
        self.in_transaction.set(false);

        match &result {
            Ok(_) => {
                if let Err(commit_err) = self.conn.execute_batch("COMMIT") {
                    let _ = self.conn.execute_batch("ROLLBACK");
                    return Err(LedgerError::TransactionError(format!(
                        "COMMIT failed: {commit_err}"
                    ))
                    .into());
                }
            }
            Err(_) => {
                let _ = self.conn.execute_batch("ROLLBACK");
            }
        }
        result
    }
}

fn check_width(column: &'static str, value: &str) -> LedgerResult<()> {
    let len = value.chars().count();
    if len > COLUMN_WIDTH {
        return Err(LedgerError::ValueTooLong {
            column,
            value: value.to_string(),
            len,
            limit: COLUMN_WIDTH,
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;

//! Conversion of single-location history into the tracked layout.
//!
//! Older history tables carry only `(version, apply_time)`. Their rows are
//! never reinterpreted implicitly; [`Ledger::adopt_legacy`] is the one
//! explicit step that assigns them to the primary location.

use crate::ddl::{create_table_sql, quote_ident};
use crate::error::{storage, LedgerResult};
use crate::ledger::{Layout, Ledger};
use wm_core::BASE_MIGRATION;

const STAGING_TABLE: &str = "waymark_legacy_staging";

impl Ledger {
    /// Rewrite a legacy history table into the tracked layout.
    ///
    /// Every legacy row, including the base marker, is assigned to the
    /// primary location. Runs in one transaction. Returns the number of
    /// migrations adopted; a table that is already tracked (or absent) is left
    /// untouched and reports zero.
    pub fn adopt_legacy(&self) -> LedgerResult<usize> {
        match self.layout()? {
            Layout::Legacy => {}
            Layout::Tracked | Layout::Missing => {
                log::debug!(
                    "History table \"{}\" needs no adoption",
                    self.settings.table
                );
                return Ok(0);
            }
        }

        let table = quote_ident(&self.settings.table);
        let staging = quote_ident(STAGING_TABLE);
        let primary = self.settings.primary.as_str();

        let adopted = self.transaction(|ledger| -> LedgerResult<i64> {
            let conn = &ledger.conn;
            conn.execute_batch(&format!(
                "CREATE TEMP TABLE {staging} AS
                     SELECT version, CAST(apply_time AS BIGINT) AS apply_time FROM {table};
                 DROP TABLE {table};"
            ))
            .map_err(storage("stage legacy history"))?;

            conn.execute_batch(&create_table_sql(&ledger.settings.table))
                .map_err(storage("create history table"))?;

            conn.execute(
                &format!(
                    "INSERT INTO {table} (version, alias, apply_time)
                     SELECT version, ?, apply_time FROM {staging}"
                ),
                duckdb::params![primary],
            )
            .map_err(storage("copy legacy history"))?;

            let adopted: i64 = conn
                .query_row(
                    &format!("SELECT COUNT(*) FROM {staging} WHERE version <> ?"),
                    duckdb::params![BASE_MIGRATION],
                    |row| row.get(0),
                )
                .map_err(storage("count legacy history"))?;

            conn.execute_batch(&format!("DROP TABLE {staging}"))
                .map_err(storage("drop staging table"))?;
            Ok(adopted)
        })?;

        log::info!(
            "Adopted {adopted} legacy migration(s) in \"{}\" into location '{primary}'",
            self.settings.table
        );
        Ok(adopted as usize)
    }
}

#[cfg(test)]
#[path = "legacy_test.rs"]
mod tests;

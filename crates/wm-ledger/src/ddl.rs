//! DDL for the migration history table.
//!
//! ```sql
//! CREATE TABLE migration (
//!     version    VARCHAR(180) NOT NULL,
//!     alias      VARCHAR(180) NOT NULL,
//!     apply_time BIGINT,
//!     PRIMARY KEY (version, alias)
//! )
//! ```
//!
//! A name is only unique within its location, so the key is the pair.

/// Maximum width of the `version` and `alias` columns.
pub const COLUMN_WIDTH: usize = 180;

/// Quote a SQL identifier with double quotes, escaping embedded quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// `CREATE TABLE` statement for the history table.
pub fn create_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE {} (
             version    VARCHAR({COLUMN_WIDTH}) NOT NULL,
             alias      VARCHAR({COLUMN_WIDTH}) NOT NULL,
             apply_time BIGINT,
             PRIMARY KEY (version, alias)
         )",
        quote_ident(table)
    )
}

/// Query listing the column names of a table in the current schema.
pub(crate) const TABLE_COLUMNS_SQL: &str = "SELECT column_name
     FROM information_schema.columns
     WHERE table_schema = current_schema() AND table_name = ?
     ORDER BY ordinal_position";

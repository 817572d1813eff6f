//! Migration ledger for Waymark.
//!
//! Provides a DuckDB-backed record of which `(name, location)` pairs have been
//! applied and when. The history table is created on first use, together with
//! a base marker row; legacy single-location tables are detected and can be
//! converted with [`Ledger::adopt_legacy`].

pub mod ddl;
pub mod error;
pub mod ledger;
mod legacy;

pub use error::{LedgerError, LedgerResult};
pub use ledger::{Layout, Ledger, LedgerSettings};

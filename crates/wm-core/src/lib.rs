//! wm-core - Core library for Waymark
//!
//! This crate provides the shared types used across all Waymark components:
//! migration names and their storage token, migration locations and alias
//! resolution, configuration parsing, the applied-history view, and the
//! [`Locator`] that turns a set of locations into ordered pending work.

pub mod clock;
pub mod config;
pub mod error;
pub mod history;
pub mod location;
pub mod locator;
pub mod migration_name;
pub mod migration_ref;

pub use clock::{Clock, SystemClock};
pub use config::{Config, DatabaseConfig};
pub use error::{CoreError, CoreResult};
pub use history::{AppliedMigration, AppliedSet};
pub use location::{AliasResolver, Location, LocationSet};
pub use locator::{Locator, LookupPolicy};
pub use migration_name::{MigrationName, BASE_MIGRATION};
pub use migration_ref::MigrationRef;

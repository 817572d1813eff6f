//! Tests for the apply/revert driver.

use super::*;
use crate::traits::{Migration, MigrationLoader};
use duckdb::Connection;
use std::cell::RefCell;
use std::fs;
use std::rc::Rc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use wm_core::{AliasResolver, Clock, Location, LookupPolicy};
use wm_ledger::{LedgerError, LedgerSettings};

// ── Helpers ────────────────────────────────────────────────────────────

const PRIMARY: &str = "@app/migrations";
const VENDOR: &str = "@vendor/blog/migrations";

struct StepClock(Arc<AtomicI64>);

impl Clock for StepClock {
    fn now(&self) -> i64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

struct FrozenClock(i64);

impl Clock for FrozenClock {
    fn now(&self) -> i64 {
        self.0
    }
}

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn create_drop(table: &str) -> String {
    format!("-- waymark:up\nCREATE TABLE {table} (id INTEGER);\n-- waymark:down\nDROP TABLE {table};\n")
}

/// Same name in both locations plus one vendor-only migration.
fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "migrations/m250101_000000_orders.sql",
        &create_drop("orders"),
    );
    write(
        dir.path(),
        "vendor/blog/migrations/m250101_000000_orders.sql",
        &create_drop("blog_orders"),
    );
    write(
        dir.path(),
        "vendor/blog/migrations/m250201_000000_posts.sql",
        &create_drop("posts"),
    );
    dir
}

fn migrator_with(root: &Path, policy: LookupPolicy) -> Migrator {
    let locator = Locator::new(
        AliasResolver::new(root).with_alias("@vendor", "vendor"),
        "sql",
        policy,
    );
    let locations = LocationSet::new(Location::new(PRIMARY), vec![Location::new(VENDOR)]);
    let ledger = Ledger::open_memory(LedgerSettings::new("migration", Location::new(PRIMARY)))
        .unwrap()
        .with_clock(StepClock(Arc::new(AtomicI64::new(1_000))));
    Migrator::new(locator, locations, ledger)
}

fn migrator(root: &Path) -> Migrator {
    migrator_with(root, LookupPolicy::MultiLocation)
}

fn mref(name: &str, location: &str) -> MigrationRef {
    MigrationRef::new(MigrationName::parse(name).unwrap(), Location::new(location))
}

fn table_exists(migrator: &Migrator, table: &str) -> bool {
    let count: i64 = migrator
        .ledger()
        .conn()
        .query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
            duckdb::params![table],
            |row| row.get(0),
        )
        .unwrap();
    count > 0
}

fn history(migrator: &Migrator) -> Vec<MigrationRef> {
    migrator.history(None).unwrap().refs().cloned().collect()
}

// ── up ─────────────────────────────────────────────────────────────────

#[test]
fn test_up_applies_everything_in_order() {
    let dir = project();
    let migrator = migrator(dir.path());

    let applied = migrator.up(None).unwrap();
    assert_eq!(
        applied,
        vec![
            mref("m250101_000000_orders", PRIMARY),
            mref("m250101_000000_orders", VENDOR),
            mref("m250201_000000_posts", VENDOR),
        ]
    );
    for table in ["orders", "blog_orders", "posts"] {
        assert!(table_exists(&migrator, table), "{table} should exist");
    }
    assert!(migrator.pending().unwrap().is_empty());
    assert_eq!(history(&migrator)[0], mref("m250201_000000_posts", VENDOR));
}

#[test]
fn test_up_respects_limit() {
    let dir = project();
    let migrator = migrator(dir.path());

    let applied = migrator.up(Some(1)).unwrap();
    assert_eq!(applied, vec![mref("m250101_000000_orders", PRIMARY)]);
    assert_eq!(migrator.pending().unwrap().len(), 2);
}

#[test]
fn test_up_with_nothing_pending() {
    let dir = project();
    let migrator = migrator(dir.path());
    migrator.up(None).unwrap();
    assert!(migrator.up(None).unwrap().is_empty());
}

#[test]
fn test_up_stops_at_first_failure() {
    let dir = project();
    write(
        dir.path(),
        "migrations/m250115_000000_broken.sql",
        "-- waymark:up\nCREATE TABLE half (id INTEGER);\nSELEKT nonsense;\n",
    );
    let migrator = migrator(dir.path());

    let err = migrator.up(None).unwrap_err();
    match err {
        ExecError::StepFailed {
            migration,
            completed,
            source,
            ..
        } => {
            assert!(migration.starts_with("m250115_000000_broken"));
            assert_eq!(completed, 2);
            assert!(matches!(*source, ExecError::Statement { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }

    // Earlier steps stay; the failed step leaves neither its table nor a row.
    assert_eq!(history(&migrator).len(), 2);
    assert!(!table_exists(&migrator, "half"));
    assert!(!table_exists(&migrator, "posts"));
    assert_eq!(migrator.pending().unwrap().len(), 2);
}

#[test]
fn test_primary_only_lookup_ignores_extras() {
    let dir = project();
    let migrator = migrator_with(dir.path(), LookupPolicy::PrimaryOnly);

    let applied = migrator.up(None).unwrap();
    assert_eq!(applied, vec![mref("m250101_000000_orders", PRIMARY)]);
    assert!(!table_exists(&migrator, "blog_orders"));
}

// ── down / redo ────────────────────────────────────────────────────────

#[test]
fn test_down_reverts_most_recent_first() {
    let dir = project();
    let migrator = migrator(dir.path());
    migrator.up(None).unwrap();

    let reverted = migrator.down(Some(2)).unwrap();
    assert_eq!(
        reverted,
        vec![
            mref("m250201_000000_posts", VENDOR),
            mref("m250101_000000_orders", VENDOR),
        ]
    );
    assert!(!table_exists(&migrator, "posts"));
    assert!(!table_exists(&migrator, "blog_orders"));
    assert!(table_exists(&migrator, "orders"));
    assert_eq!(history(&migrator), vec![mref("m250101_000000_orders", PRIMARY)]);
}

#[test]
fn test_down_reverts_same_second_ties_in_reverse_location_order() {
    // "@vendor/x" sorts below "migrations" as a string.
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "migrations/m150101_120000_init.sql",
        &create_drop("app_init"),
    );
    write(
        dir.path(),
        "vendor/x/m150101_120000_init.sql",
        &create_drop("vendor_init"),
    );
    let locator = Locator::new(
        AliasResolver::new(dir.path()).with_alias("@vendor", "vendor"),
        "sql",
        LookupPolicy::MultiLocation,
    );
    let locations = LocationSet::new(
        Location::new("migrations"),
        vec![Location::new("@vendor/x")],
    );
    let ledger = Ledger::open_memory(LedgerSettings::new("migration", Location::new("migrations")))
        .unwrap()
        .with_clock(FrozenClock(100));
    let migrator = Migrator::new(locator, locations, ledger);
    migrator.up(None).unwrap();

    assert_eq!(
        history(&migrator)[0],
        mref("m150101_120000_init", "@vendor/x")
    );
    let reverted = migrator.down(Some(1)).unwrap();
    assert_eq!(reverted, vec![mref("m150101_120000_init", "@vendor/x")]);
    assert!(table_exists(&migrator, "app_init"));
    assert!(!table_exists(&migrator, "vendor_init"));
}

#[test]
fn test_down_all_then_pending_again() {
    let dir = project();
    let migrator = migrator(dir.path());
    migrator.up(None).unwrap();

    assert_eq!(migrator.down(None).unwrap().len(), 3);
    assert!(history(&migrator).is_empty());
    assert_eq!(migrator.pending().unwrap().len(), 3);
}

#[test]
fn test_down_irreversible_keeps_history() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "migrations/m250101_000000_seed.sql",
        "CREATE TABLE seed (id INTEGER);\n",
    );
    let migrator = migrator(dir.path());
    migrator.up(None).unwrap();

    let err = migrator.down(None).unwrap_err();
    match err {
        ExecError::StepFailed {
            completed, source, ..
        } => {
            assert_eq!(completed, 0);
            assert!(matches!(*source, ExecError::Irreversible { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(history(&migrator).len(), 1);
    assert!(table_exists(&migrator, "seed"));
}

#[test]
fn test_down_with_missing_script_fails() {
    let dir = project();
    let migrator = migrator(dir.path());
    migrator.up(None).unwrap();
    fs::remove_file(dir.path().join("vendor/blog/migrations/m250201_000000_posts.sql")).unwrap();

    let err = migrator.down(Some(1)).unwrap_err();
    match err {
        ExecError::StepFailed { source, .. } => {
            assert!(matches!(
                *source,
                ExecError::Core(wm_core::CoreError::ScriptNotFound { .. })
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(history(&migrator).len(), 3);
}

#[test]
fn test_redo_reapplies_in_original_order() {
    let dir = project();
    let migrator = migrator(dir.path());
    migrator.up(None).unwrap();

    let redone = migrator.redo(Some(2)).unwrap();
    assert_eq!(
        redone,
        vec![
            mref("m250101_000000_orders", VENDOR),
            mref("m250201_000000_posts", VENDOR),
        ]
    );
    assert!(table_exists(&migrator, "posts"));
    assert_eq!(history(&migrator)[0], mref("m250201_000000_posts", VENDOR));
    assert_eq!(history(&migrator).len(), 3);
}

// ── mark ───────────────────────────────────────────────────────────────

#[test]
fn test_mark_pending_records_without_running() {
    let dir = project();
    let migrator = migrator(dir.path());
    let target = mref("m250101_000000_orders", VENDOR);

    let outcome = migrator.mark(&target.to_token()).unwrap();
    assert_eq!(
        outcome,
        MarkOutcome::Recorded(vec![mref("m250101_000000_orders", PRIMARY), target])
    );
    assert!(!table_exists(&migrator, "orders"));
    assert_eq!(
        migrator.pending().unwrap(),
        vec![mref("m250201_000000_posts", VENDOR)]
    );
}

#[test]
fn test_mark_applied_forgets_later_migrations() {
    let dir = project();
    let migrator = migrator(dir.path());
    migrator.up(None).unwrap();

    let outcome = migrator
        .mark(&mref("m250101_000000_orders", PRIMARY).to_token())
        .unwrap();
    assert_eq!(
        outcome,
        MarkOutcome::Forgotten(vec![
            mref("m250201_000000_posts", VENDOR),
            mref("m250101_000000_orders", VENDOR),
        ])
    );
    // Schema changes are untouched.
    assert!(table_exists(&migrator, "posts"));
    assert_eq!(history(&migrator), vec![mref("m250101_000000_orders", PRIMARY)]);
}

#[test]
fn test_mark_most_recent_is_noop() {
    let dir = project();
    let migrator = migrator(dir.path());
    migrator.up(None).unwrap();

    let outcome = migrator.mark("m250201_000000_posts").unwrap();
    assert!(outcome.migrations().is_empty());
    assert_eq!(history(&migrator).len(), 3);
}

#[test]
fn test_mark_base_forgets_everything() {
    let dir = project();
    let migrator = migrator(dir.path());
    migrator.up(None).unwrap();

    let outcome = migrator.mark(wm_core::BASE_MIGRATION).unwrap();
    assert_eq!(outcome.migrations().len(), 3);
    assert!(history(&migrator).is_empty());
}

#[test]
fn test_mark_ambiguous_bare_name() {
    let dir = project();
    let migrator = migrator(dir.path());

    let err = migrator.mark("m250101_000000_orders").unwrap_err();
    match err {
        ExecError::AmbiguousTarget { name, locations } => {
            assert_eq!(name, "m250101_000000_orders");
            assert!(locations.contains(PRIMARY));
            assert!(locations.contains(VENDOR));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_mark_unknown_target() {
    let dir = project();
    let migrator = migrator(dir.path());

    let err = migrator.mark("m990101_000000_nope").unwrap_err();
    assert!(matches!(err, ExecError::UnknownTarget { .. }));

    let token = mref("m250201_000000_posts", PRIMARY).to_token();
    let err = migrator.mark(&token).unwrap_err();
    assert!(matches!(err, ExecError::UnknownTarget { .. }));
}

#[test]
fn test_mark_rejects_malformed_targets() {
    let dir = project();
    let migrator = migrator(dir.path());

    assert!(matches!(
        migrator.mark("not a migration").unwrap_err(),
        ExecError::Core(wm_core::CoreError::InvalidMigrationName { .. })
    ));
    assert!(matches!(
        migrator.mark("{\"migration\": 1}").unwrap_err(),
        ExecError::Core(wm_core::CoreError::InvalidToken { .. })
    ));
}

// ── loaders / ledger errors ────────────────────────────────────────────

struct Noop;

impl Migration for Noop {
    fn up(&self, _conn: &Connection) -> ExecResult<()> {
        Ok(())
    }

    fn down(&self, _conn: &Connection) -> ExecResult<()> {
        Ok(())
    }
}

struct RecordingLoader(Rc<RefCell<Vec<String>>>);

impl MigrationLoader for RecordingLoader {
    fn load(&self, migration: &MigrationRef, _path: &Path) -> ExecResult<Box<dyn Migration>> {
        self.0.borrow_mut().push(migration.name.to_string());
        Ok(Box::new(Noop))
    }
}

#[test]
fn test_location_loader_override() {
    let dir = project();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let migrator = migrator(dir.path()).with_loaders(
        LoaderRegistry::default().with_loader(Location::new(VENDOR), RecordingLoader(seen.clone())),
    );

    migrator.up(None).unwrap();
    assert_eq!(
        *seen.borrow(),
        vec!["m250101_000000_orders", "m250201_000000_posts"]
    );
    // Primary still goes through the SQL loader; vendor scripts never ran.
    assert!(table_exists(&migrator, "orders"));
    assert!(!table_exists(&migrator, "posts"));
    assert_eq!(history(&migrator).len(), 3);
}

#[test]
fn test_apply_twice_is_duplicate() {
    let dir = project();
    let migrator = migrator(dir.path());
    let target = mref("m250101_000000_orders", PRIMARY);
    migrator.ledger().record(&target).unwrap();

    // The rollback also drops the table the script created.
    let err = migrator.apply(&target).unwrap_err();
    assert!(matches!(
        err,
        ExecError::Ledger(LedgerError::DuplicateApply { .. })
    ));
    assert!(!table_exists(&migrator, "orders"));
}

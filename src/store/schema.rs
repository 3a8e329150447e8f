//! Versioned schema for the local catalog store.
//!
//! The persisted version lives in `PRAGMA user_version`. Opening a store at an
//! older version applies every later step in increasing order, each inside its
//! own transaction that also bumps the version, so a crash mid-migration
//! leaves the store re-migratable rather than corrupted.
//!
//! Step policy: steps only add structure or clear-and-mark-incompatible. A
//! step that widens the detail row shape must clear previously cached detail
//! rows (forcing re-fetch) instead of leaving partially populated rows. No
//! step may touch the `favorite` table. List-item rows have a stable shape
//! and are intentionally never shape-invalidated; any future list-item column
//! needs its own clearing step.

use rusqlite::Connection;

use crate::error::Result;

/// Schema version new stores are created at.
pub const TARGET_VERSION: i32 = 3;

/// A single named migration step.
pub struct MigrationStep {
  pub version: i32,
  pub name: &'static str,
  pub sql: &'static str,
}

pub const MIGRATIONS: &[MigrationStep] = &[
  MigrationStep {
    version: 1,
    name: "initial_schema",
    sql: r#"
CREATE TABLE IF NOT EXISTS list_item (
    key TEXT PRIMARY KEY,
    page INTEGER NOT NULL,
    url TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_list_item_page ON list_item(page);

CREATE TABLE IF NOT EXISTS detail_record (
    id INTEGER PRIMARY KEY,
    key TEXT UNIQUE NOT NULL,
    height INTEGER NOT NULL,
    weight INTEGER NOT NULL,
    base_experience INTEGER NOT NULL,
    categories TEXT NOT NULL DEFAULT '[]'
);
CREATE INDEX IF NOT EXISTS idx_detail_record_key ON detail_record(key);

CREATE TABLE IF NOT EXISTS favorite (
    id INTEGER PRIMARY KEY,
    key TEXT UNIQUE NOT NULL,
    added_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_favorite_key ON favorite(key);
"#,
  },
  // Detail rows cached before this step lack abilities; clear them so they
  // are re-fetched complete rather than served with an empty field.
  MigrationStep {
    version: 2,
    name: "detail_abilities",
    sql: r#"
ALTER TABLE detail_record ADD COLUMN abilities TEXT NOT NULL DEFAULT '[]';
DELETE FROM detail_record;
"#,
  },
  MigrationStep {
    version: 3,
    name: "detail_attributes_and_evolution",
    sql: r#"
ALTER TABLE detail_record ADD COLUMN attributes TEXT NOT NULL DEFAULT '[]';
ALTER TABLE detail_record ADD COLUMN evolution_ref TEXT;
DELETE FROM detail_record;
"#,
  },
];

/// Read the persisted schema version.
pub fn user_version(conn: &Connection) -> Result<i32> {
  let version = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
  Ok(version)
}

/// Apply every migration step above the persisted version, up to `target`.
///
/// Steps already applied (version <= persisted) are skipped, which makes the
/// procedure safe to re-run.
pub fn run_migrations(conn: &mut Connection, target: i32) -> Result<()> {
  let from = user_version(conn)?;

  for step in MIGRATIONS.iter().filter(|s| s.version <= target) {
    if from >= step.version {
      continue;
    }

    tracing::info!(step = step.name, version = step.version, "applying store migration");

    let tx = conn.transaction()?;
    tx.execute_batch(step.sql)?;
    tx.pragma_update(None, "user_version", step.version)?;
    tx.commit()?;
  }

  Ok(())
}

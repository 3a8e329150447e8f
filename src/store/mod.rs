//! Durable, versioned storage for cached catalog pages, detail records, and
//! the favorites set.
//!
//! The store is a single-writer, many-reader resource: one `rusqlite`
//! connection behind a mutex, opened once and shared for the process
//! lifetime. Structured sub-objects (categories, attributes, abilities) are
//! serialized to JSON text only at this boundary; callers always see typed
//! structures.

pub mod schema;

use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::catalog::types::{DetailRecord, FavoriteRecord, ListItem};
use crate::error::{Error, Result};

/// Handle to the local catalog store.
pub struct Store {
  conn: Mutex<Option<Connection>>,
}

impl Store {
  /// Open or create the store at the given path, migrating the schema to the
  /// current target version before returning.
  pub fn open(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| {
        Error::StoreOpen(format!("failed to create store directory: {}", e))
      })?;
    }

    let conn = Connection::open(path).map_err(|e| {
      Error::StoreOpen(format!("failed to open store at {}: {}", path.display(), e))
    })?;

    Self::from_connection(conn)
  }

  /// Open a throwaway in-memory store, migrated to the target version.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| Error::StoreOpen(format!("failed to open in-memory store: {}", e)))?;
    Self::from_connection(conn)
  }

  fn from_connection(mut conn: Connection) -> Result<Self> {
    schema::run_migrations(&mut conn, schema::TARGET_VERSION)
      .map_err(|e| Error::StoreOpen(format!("store migration failed: {}", e)))?;

    Ok(Self {
      conn: Mutex::new(Some(conn)),
    })
  }

  /// Release the backing handle. Idempotent; later operations fail.
  pub fn close(&self) {
    if let Ok(mut guard) = self.conn.lock() {
      guard.take();
    }
  }

  fn lock(&self) -> Result<MutexGuard<'_, Option<Connection>>> {
    self
      .conn
      .lock()
      .map_err(|e| Error::StoreIo(format!("store lock poisoned: {}", e)))
  }

  // ==========================================================================
  // List pages
  // ==========================================================================

  /// All items cached under the given page, in insertion order, annotated
  /// with their favorite state. Empty when the page was never cached.
  pub fn get_page(&self, page: u32) -> Result<Vec<ListItem>> {
    let guard = self.lock()?;
    let conn = require_open(&guard)?;

    let mut stmt = conn.prepare(
      "SELECT li.key, li.page, li.url, f.id IS NOT NULL
       FROM list_item li
       LEFT JOIN favorite f ON f.key = li.key
       WHERE li.page = ?1
       ORDER BY li.rowid",
    )?;

    let items = stmt
      .query_map(params![page], |row| {
        Ok(ListItem {
          key: row.get(0)?,
          page: row.get(1)?,
          url: row.get(2)?,
          is_favorite: row.get(3)?,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(items)
  }

  /// Upsert a batch of list items by key, atomically. Re-fetched keys are
  /// replaced, never duplicated.
  pub fn put_page(&self, items: &[ListItem]) -> Result<()> {
    if items.is_empty() {
      return Ok(());
    }

    let mut guard = self.lock()?;
    let conn = require_open_mut(&mut guard)?;

    let tx = conn.transaction()?;
    {
      let mut stmt = tx.prepare(
        "INSERT OR REPLACE INTO list_item (key, page, url) VALUES (?1, ?2, ?3)",
      )?;
      for item in items {
        stmt.execute(params![item.key, item.page, item.url])?;
      }
    }
    tx.commit()?;

    Ok(())
  }

  // ==========================================================================
  // Detail records
  // ==========================================================================

  /// The cached detail record for a key, or `None` when absent. A row whose
  /// JSON blobs no longer decode is treated as a miss so it gets re-fetched.
  pub fn get_detail(&self, key: &str) -> Result<Option<DetailRecord>> {
    let guard = self.lock()?;
    let conn = require_open(&guard)?;

    let row: Option<DetailRow> = conn
      .query_row(
        "SELECT id, key, height, weight, base_experience,
                categories, attributes, abilities, evolution_ref
         FROM detail_record WHERE key = ?1",
        params![key],
        |row| {
          Ok(DetailRow {
            id: row.get(0)?,
            key: row.get(1)?,
            height: row.get(2)?,
            weight: row.get(3)?,
            base_experience: row.get(4)?,
            categories: row.get(5)?,
            attributes: row.get(6)?,
            abilities: row.get(7)?,
            evolution_ref: row.get(8)?,
          })
        },
      )
      .optional()?;

    let Some(row) = row else {
      return Ok(None);
    };

    match row.decode() {
      Ok(record) => Ok(Some(record)),
      Err(err) => {
        tracing::warn!(key, %err, "dropping undecodable cached detail row");
        Ok(None)
      }
    }
  }

  /// Upsert one detail record by key.
  pub fn put_detail(&self, record: &DetailRecord) -> Result<()> {
    let categories = encode_blob("categories", &record.categories)?;
    let attributes = encode_blob("attributes", &record.attributes)?;
    let abilities = encode_blob("abilities", &record.abilities)?;

    let guard = self.lock()?;
    let conn = require_open(&guard)?;

    conn.execute(
      "INSERT OR REPLACE INTO detail_record
         (id, key, height, weight, base_experience,
          categories, attributes, abilities, evolution_ref)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
      params![
        record.id,
        record.key,
        record.height,
        record.weight,
        record.base_experience,
        categories,
        attributes,
        abilities,
        record.evolution_ref,
      ],
    )?;

    Ok(())
  }

  // ==========================================================================
  // Favorites
  // ==========================================================================

  pub fn add_favorite(&self, id: i64, key: &str, added_at_epoch_ms: i64) -> Result<()> {
    let guard = self.lock()?;
    let conn = require_open(&guard)?;

    conn.execute(
      "INSERT OR REPLACE INTO favorite (id, key, added_at) VALUES (?1, ?2, ?3)",
      params![id, key, added_at_epoch_ms],
    )?;

    Ok(())
  }

  pub fn remove_favorite(&self, id: i64) -> Result<()> {
    let guard = self.lock()?;
    let conn = require_open(&guard)?;

    conn.execute("DELETE FROM favorite WHERE id = ?1", params![id])?;
    Ok(())
  }

  pub fn is_favorite(&self, id: i64) -> Result<bool> {
    let guard = self.lock()?;
    let conn = require_open(&guard)?;

    let exists = conn.query_row(
      "SELECT EXISTS(SELECT 1 FROM favorite WHERE id = ?1)",
      params![id],
      |row| row.get(0),
    )?;

    Ok(exists)
  }

  /// Full favorite records, most recently added first.
  pub fn list_favorites(&self) -> Result<Vec<FavoriteRecord>> {
    let guard = self.lock()?;
    let conn = require_open(&guard)?;

    let mut stmt = conn.prepare(
      "SELECT id, key, added_at FROM favorite ORDER BY added_at DESC, id DESC",
    )?;

    let records = stmt
      .query_map([], |row| {
        Ok(FavoriteRecord {
          id: row.get(0)?,
          key: row.get(1)?,
          added_at_epoch_ms: row.get(2)?,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(records)
  }

  /// Favorite ids, most recently added first.
  pub fn list_favorite_ids(&self) -> Result<Vec<i64>> {
    Ok(self.list_favorites()?.into_iter().map(|f| f.id).collect())
  }

  /// Favorites joined with their cached list items, most recently added
  /// first. Favorites whose list row was never cached are omitted.
  pub fn list_favorite_items(&self) -> Result<Vec<ListItem>> {
    let guard = self.lock()?;
    let conn = require_open(&guard)?;

    let mut stmt = conn.prepare(
      "SELECT li.key, li.page, li.url
       FROM favorite f
       INNER JOIN list_item li ON li.key = f.key
       ORDER BY f.added_at DESC, f.id DESC",
    )?;

    let items = stmt
      .query_map([], |row| {
        Ok(ListItem {
          key: row.get(0)?,
          page: row.get(1)?,
          url: row.get(2)?,
          is_favorite: true,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(items)
  }

  /// The set of favorited keys, for annotating freshly fetched items.
  pub fn favorite_keys(&self) -> Result<HashSet<String>> {
    let guard = self.lock()?;
    let conn = require_open(&guard)?;

    let mut stmt = conn.prepare("SELECT key FROM favorite")?;
    let keys = stmt
      .query_map([], |row| row.get(0))?
      .collect::<rusqlite::Result<HashSet<String>>>()?;

    Ok(keys)
  }
}

fn require_open<'a>(guard: &'a MutexGuard<'_, Option<Connection>>) -> Result<&'a Connection> {
  guard
    .as_ref()
    .ok_or_else(|| Error::StoreIo("store is closed".to_string()))
}

fn require_open_mut<'a>(
  guard: &'a mut MutexGuard<'_, Option<Connection>>,
) -> Result<&'a mut Connection> {
  guard
    .as_mut()
    .ok_or_else(|| Error::StoreIo("store is closed".to_string()))
}

fn encode_blob<T: serde::Serialize>(field: &str, value: &T) -> Result<String> {
  serde_json::to_string(value)
    .map_err(|e| Error::StoreIo(format!("failed to encode {}: {}", field, e)))
}

/// Raw detail row as persisted; JSON blobs still undecoded.
struct DetailRow {
  id: i64,
  key: String,
  height: i64,
  weight: i64,
  base_experience: i64,
  categories: String,
  attributes: String,
  abilities: String,
  evolution_ref: Option<String>,
}

impl DetailRow {
  fn decode(self) -> serde_json::Result<DetailRecord> {
    Ok(DetailRecord {
      id: self.id,
      key: self.key,
      height: self.height,
      weight: self.weight,
      base_experience: self.base_experience,
      categories: serde_json::from_str(&self.categories)?,
      attributes: serde_json::from_str(&self.attributes)?,
      abilities: serde_json::from_str(&self.abilities)?,
      evolution_ref: self.evolution_ref,
    })
  }
}

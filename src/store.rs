//! Key-value storage layer for the tip jar.
//!
//! The ledger was designed against the browser localStorage contract:
//! string keys, string values, and index-ordered key enumeration. The
//! [`KvStore`] trait keeps that contract, with two backends — an
//! insertion-ordered in-memory map for tests and demos, and a single-table
//! SQLite database for real use.
//!
//! Key layout (one entry per line, byte-compatible with the web app):
//!
//! ```text
//! tipjar_username_<address>  -> username string
//! tipjar_user_<username>     -> JSON {"address": "..."}
//! tipjar_tips_<username>     -> JSON array of tip records, newest first
//! ```
//!
//! Key strings are built only here; the registry and ledger go through the
//! helper functions and callers never touch raw keys.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    Io(std::io::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Sqlite(e) => write!(f, "sqlite error: {e}"),
            StoreError::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Sqlite(e)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

// ---------------------------------------------------------------------------
// Key conventions
// ---------------------------------------------------------------------------

pub(crate) const USERNAME_KEY_PREFIX: &str = "tipjar_username_";
pub(crate) const USER_KEY_PREFIX: &str = "tipjar_user_";
pub(crate) const TIPS_KEY_PREFIX: &str = "tipjar_tips_";

/// Key for the address -> username mapping.
pub(crate) fn username_key(address: &str) -> String {
    format!("{USERNAME_KEY_PREFIX}{address}")
}

/// Key for the username -> identity record mapping.
pub(crate) fn user_key(username: &str) -> String {
    format!("{USER_KEY_PREFIX}{username}")
}

/// Key for a recipient's tip ledger.
pub(crate) fn tips_key(username: &str) -> String {
    format!("{TIPS_KEY_PREFIX}{username}")
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// localStorage-shaped key-value store: get/set plus positional key
/// enumeration. Methods take `&self` so read-side components can hold a
/// shared reference while writes happen through the same handle.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// The key at `index` in store order, if any. Order is stable across
    /// overwrites of an existing key.
    fn key_at(&self, index: usize) -> Result<Option<String>, StoreError>;

    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Scan every key and keep those starting with `prefix`, in store
    /// order. This is the localStorage enumeration loop the aggregator
    /// runs over ledger keys.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        for index in 0..self.len()? {
            if let Some(key) = self.key_at(index)? {
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }
        Ok(keys)
    }
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// Insertion-ordered in-memory store. Overwriting an existing key keeps
/// its original position, so enumeration order is deterministic.
#[derive(Default)]
pub struct MemoryStore {
    inner: RefCell<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    values: HashMap<String, String>,
    order: Vec<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.inner.borrow().values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.borrow_mut();
        if inner
            .values
            .insert(key.to_string(), value.to_string())
            .is_none()
        {
            inner.order.push(key.to_string());
        }
        Ok(())
    }

    fn key_at(&self, index: usize) -> Result<Option<String>, StoreError> {
        Ok(self.inner.borrow().order.get(index).cloned())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.inner.borrow().order.len())
    }
}

// ---------------------------------------------------------------------------
// SQLite backend
// ---------------------------------------------------------------------------

/// Path of the database file inside a data directory.
pub fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join("tipjar.db")
}

/// SQLite-backed store: one `kv` table, enumeration ordered by rowid so
/// `key_at` tracks insertion order like the in-memory backend.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create a database at the given path. Creates the parent
    /// directory and schema if needed.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let store = Self { conn };
        store.create_schema()?;
        Ok(store)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.create_schema()?;
        Ok(store)
    }

    fn create_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS kv (
                key     TEXT PRIMARY KEY,
                value   TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }
}

impl KvStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        // Upsert keeps the original rowid, so enumeration order is stable.
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn key_at(&self, index: usize) -> Result<Option<String>, StoreError> {
        let key = self
            .conn
            .query_row(
                "SELECT key FROM kv ORDER BY rowid LIMIT 1 OFFSET ?1",
                params![index as i64],
                |row| row.get(0),
            )
            .optional()?;
        Ok(key)
    }

    fn len(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

//! On-disk cache store.
//!
//! Connection defaults:
//! - `journal_mode = WAL` so readers do not block the writer
//! - `busy_timeout = 5s` to ride out short lock contention between runs
//! - `synchronous = NORMAL`

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use super::{CacheStore, CacheStoreError};

/// Busy timeout used for cache connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS cache_entries (
    key           TEXT PRIMARY KEY NOT NULL,
    value         TEXT NOT NULL,
    updated_at_us INTEGER NOT NULL
);
";

/// A [`CacheStore`] backed by a single SQLite table.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the cache database at `path`.
    ///
    /// # Errors
    ///
    /// Failure to create the parent directory, open the database, or apply
    /// the schema.
    pub fn open(path: &Path) -> Result<Self, CacheStoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        configure_connection(&conn)?;
        conn.execute_batch(SCHEMA)?;
        debug!(path = %path.display(), "cache database opened");
        Ok(Self { conn })
    }

    /// An in-memory database, for tests.
    ///
    /// # Errors
    ///
    /// Failure to apply the schema.
    pub fn open_in_memory() -> Result<Self, CacheStoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Remove `key`. Returns `true` if it was present.
    ///
    /// # Errors
    ///
    /// SQLite failures.
    pub fn remove(&self, key: &str) -> Result<bool, CacheStoreError> {
        let removed = self
            .conn
            .execute("DELETE FROM cache_entries WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    /// Drop every entry. Returns the number removed.
    ///
    /// # Errors
    ///
    /// SQLite failures.
    pub fn clear(&self) -> Result<usize, CacheStoreError> {
        Ok(self.conn.execute("DELETE FROM cache_entries", [])?)
    }

    /// Number of stored entries.
    ///
    /// # Errors
    ///
    /// SQLite failures.
    pub fn len(&self) -> Result<usize, CacheStoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Total size in bytes of all stored values.
    ///
    /// # Errors
    ///
    /// SQLite failures.
    pub fn value_bytes(&self) -> Result<u64, CacheStoreError> {
        let bytes: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(value)), 0) FROM cache_entries",
            [],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(bytes).unwrap_or(0))
    }
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}

impl CacheStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM cache_entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheStoreError> {
        self.conn.execute(
            "INSERT INTO cache_entries (key, value, updated_at_us) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                            updated_at_us = excluded.updated_at_us",
            params![key, value, Utc::now().timestamp_micros()],
        )?;
        Ok(())
    }
}

//! Key-value caching of fetched wiki data.
//!
//! - [`CacheStore`]: the storage seam. Values are opaque strings (JSON).
//! - [`MemoryStore`]: process-local store for tests and `--no-cache` runs.
//! - [`SqliteStore`]: on-disk store shared between invocations.
//! - [`InstrumentedCache`]: wraps any store with bypass and slow-op logging.
//! - [`ContribCache`]: incremental per-user contribution lists on top of a
//!   store.

pub mod contribs;
pub mod instrumented;
pub mod memory;
pub mod sqlite;

pub use contribs::{ContribCache, DEFAULT_NAMESPACE};
pub use instrumented::{DEFAULT_SLOW_THRESHOLD, InstrumentedCache};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::ErrorCode;

/// Errors raised by a [`CacheStore`].
#[derive(Debug, thiserror::Error)]
pub enum CacheStoreError {
    #[error("cache database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A thread panicked while holding the store lock.
    #[error("cache store lock poisoned")]
    Poisoned,
}

impl CacheStoreError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        ErrorCode::CacheStoreFailed
    }
}

/// A string-keyed, string-valued store.
///
/// Not transactional: concurrent writers to one key race, last write wins.
pub trait CacheStore {
    /// The value under `key`, or `None` on a miss.
    ///
    /// # Errors
    ///
    /// Storage failures.
    fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Storage failures.
    fn set(&self, key: &str, value: &str) -> Result<(), CacheStoreError>;
}

impl<S: CacheStore + ?Sized> CacheStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheStoreError> {
        (**self).set(key, value)
    }
}

impl<S: CacheStore + ?Sized> CacheStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheStoreError> {
        (**self).set(key, value)
    }
}

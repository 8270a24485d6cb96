use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::{CacheStore, CacheStoreError};
use crate::timing::timed;

/// Operations slower than this are logged at `warn`.
pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_millis(100);

/// Wraps a store with an on/off switch, timing and slow-operation logging.
///
/// When disabled, `get` always misses and `set` is skipped.
#[derive(Debug)]
pub struct InstrumentedCache<S> {
    inner: S,
    use_cache: bool,
    slow_threshold: Duration,
}

impl<S: CacheStore> InstrumentedCache<S> {
    #[must_use]
    pub const fn new(inner: S) -> Self {
        Self {
            inner,
            use_cache: true,
            slow_threshold: DEFAULT_SLOW_THRESHOLD,
        }
    }

    #[must_use]
    pub const fn with_enabled(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    #[must_use]
    pub const fn with_slow_threshold(mut self, slow_threshold: Duration) -> Self {
        self.slow_threshold = slow_threshold;
        self
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.use_cache
    }

    #[must_use]
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    fn log_elapsed(&self, op: &str, key: &str, elapsed: Duration) {
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        if elapsed > self.slow_threshold {
            warn!(op, key, elapsed_ms, "slow cache operation");
        } else {
            info!(op, key, elapsed_ms, "cache operation");
        }
    }
}

impl<S: CacheStore> CacheStore for InstrumentedCache<S> {
    fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        if !self.use_cache {
            debug!(key, "cache get bypassed");
            return Ok(None);
        }
        let started = Instant::now();
        let value = timed("cache.get", || self.inner.get(key))?;
        self.log_elapsed("get", key, started.elapsed());
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheStoreError> {
        if !self.use_cache {
            debug!(key, "cache set bypassed");
            return Ok(());
        }
        let started = Instant::now();
        timed("cache.set", || self.inner.set(key, value))?;
        self.log_elapsed("set", key, started.elapsed());
        Ok(())
    }
}

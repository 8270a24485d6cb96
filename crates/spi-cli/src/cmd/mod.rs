pub mod blocked;
pub mod cache;
pub mod cases;
pub mod cidr;
pub mod g5;
pub mod ips;
pub mod pages;
pub mod timeline;

use std::path::PathBuf;

use anyhow::Context as _;
use spi_core::cache::{CacheStore, ContribCache, InstrumentedCache, MemoryStore, SqliteStore};
use spi_core::config::SpiConfig;
use spi_core::source::FixtureSource;
use tracing::{debug, warn};

/// The stack every command builds on: [`InstrumentedCache`] over the
/// configured store.
pub type CliContribCache = ContribCache<InstrumentedCache<Box<dyn CacheStore>>>;

/// Resolved settings shared by all commands.
#[derive(Debug)]
pub struct Context {
    config: SpiConfig,
    fixture: Option<PathBuf>,
    cache_override: Option<PathBuf>,
}

impl Context {
    pub const fn new(
        config: SpiConfig,
        fixture: Option<PathBuf>,
        cache_override: Option<PathBuf>,
    ) -> Self {
        Self {
            config,
            fixture,
            cache_override,
        }
    }

    pub const fn config(&self) -> &SpiConfig {
        &self.config
    }

    /// Load the wiki snapshot named by `--fixture`.
    pub fn source(&self) -> anyhow::Result<FixtureSource> {
        let path = self
            .fixture
            .as_deref()
            .context("no wiki data source: pass --fixture PATH")?;
        FixtureSource::load(path).with_context(|| format!("load fixture {}", path.display()))
    }

    /// `--cache`, else the configured or platform default path.
    pub fn cache_path(&self) -> Option<PathBuf> {
        self.cache_override
            .clone()
            .or_else(|| self.config.resolve_cache_path())
    }

    pub fn contrib_cache(&self) -> anyhow::Result<CliContribCache> {
        let enabled = self.config.cache.enabled;
        let store: Box<dyn CacheStore> = match (enabled, self.cache_path()) {
            (true, Some(path)) => {
                debug!(path = %path.display(), "using sqlite cache");
                Box::new(
                    SqliteStore::open(&path)
                        .with_context(|| format!("open cache {}", path.display()))?,
                )
            }
            (true, None) => {
                warn!("no cache directory on this platform; caching in memory");
                Box::new(MemoryStore::new())
            }
            (false, _) => Box::new(MemoryStore::new()),
        };
        let store = InstrumentedCache::new(store)
            .with_enabled(enabled)
            .with_slow_threshold(self.config.slow_threshold());
        Ok(ContribCache::new(store).with_namespace(self.config.cache.namespace.clone()))
    }
}

/// RFC 3339 with second precision, as every command prints timestamps.
pub fn format_ts(ts: chrono::DateTime<chrono::Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

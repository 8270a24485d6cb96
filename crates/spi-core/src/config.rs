use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::DEFAULT_NAMESPACE;
use crate::g5::DEFAULT_REVISION_LIMIT;
use crate::pages::DEFAULT_REVERTED_TAG;
use crate::timing::is_falsy;

/// Directory name under the platform config and cache roots.
pub const APP_DIR: &str = "spi-tools";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SpiConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Preferred output mode: `pretty`, `text` or `json`.
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_slow_threshold_ms")]
    pub slow_threshold_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: None,
            namespace: default_namespace(),
            slow_threshold_ms: default_slow_threshold_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_reverted_tag")]
    pub reverted_tag: String,
    #[serde(default = "default_revision_limit")]
    pub g5_revision_limit: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            reverted_tag: default_reverted_tag(),
            g5_revision_limit: default_revision_limit(),
        }
    }
}

impl SpiConfig {
    /// Apply `SPI_USE_CACHE` from the process environment.
    pub fn apply_env_overrides(&mut self) {
        let use_cache = std::env::var("SPI_USE_CACHE").ok();
        self.apply_use_cache(use_cache.as_deref());
    }

    fn apply_use_cache(&mut self, value: Option<&str>) {
        if value.is_some_and(is_falsy) {
            self.cache.enabled = false;
        }
    }

    /// Configured cache database path, else the platform default.
    #[must_use]
    pub fn resolve_cache_path(&self) -> Option<PathBuf> {
        self.cache.path.clone().or_else(default_cache_path)
    }

    #[must_use]
    pub const fn slow_threshold(&self) -> Duration {
        Duration::from_millis(self.cache.slow_threshold_ms)
    }
}

/// `<config dir>/spi-tools/config.toml`, if the platform has a config dir.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

/// `<cache dir>/spi-tools/cache.sqlite3`, if the platform has a cache dir.
#[must_use]
pub fn default_cache_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join(APP_DIR).join("cache.sqlite3"))
}

/// Load configuration from `path`, or from [`default_config_path`].
///
/// A missing default file yields defaults. A missing explicit file is an
/// error.
///
/// # Errors
///
/// The explicit file does not exist, or a file exists but cannot be read or
/// parsed.
pub fn load_config(path: Option<&Path>) -> Result<SpiConfig> {
    let path = match path {
        Some(explicit) => {
            if !explicit.exists() {
                bail!("config file {} does not exist", explicit.display());
            }
            explicit.to_path_buf()
        }
        None => match default_config_path() {
            Some(default) if default.exists() => default,
            _ => return Ok(SpiConfig::default()),
        },
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<SpiConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

const fn default_true() -> bool {
    true
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

const fn default_slow_threshold_ms() -> u64 {
    100
}

fn default_reverted_tag() -> String {
    DEFAULT_REVERTED_TAG.to_string()
}

const fn default_revision_limit() -> usize {
    DEFAULT_REVISION_LIMIT
}

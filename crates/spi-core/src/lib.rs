//! spi-core library.
//!
//! Analysis core for sockpuppet investigations: merged per-user timelines,
//! incremental contribution caching, block history queries, page statistics
//! and covering-network inference for IP addresses.
//!
//! # Conventions
//!
//! - **Errors**: Each module owns a `thiserror` enum; every variant maps to a
//!   stable [`error::ErrorCode`]. `anyhow::Result` is used at the config edge.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
//! - **Collaborators**: The wiki ([`source::WikiSource`]) and the cache store
//!   ([`cache::CacheStore`]) are always passed in explicitly.

pub mod block;
pub mod cache;
pub mod config;
pub mod error;
pub mod g5;
pub mod model;
pub mod net;
pub mod pages;
pub mod source;
pub mod timeline;
pub mod timing;

use thiserror::Error;

use crate::block::BlockError;
use crate::cache::CacheStoreError;
use crate::error::ErrorCode;
use crate::source::FetchError;

/// Errors surfaced by the analysis engines (timeline, pages, G5, cache).
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The wiki data source failed in a way that cannot be degraded.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The cache store failed to read or write.
    #[error(transparent)]
    Cache(#[from] CacheStoreError),

    /// Block data could not be assembled into a valid history.
    #[error(transparent)]
    Block(#[from] BlockError),

    /// A cached value could not be encoded for storage.
    #[error("cache encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl AnalysisError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Fetch(e) => e.error_code(),
            Self::Cache(_) | Self::Encode(_) => ErrorCode::CacheStoreFailed,
            Self::Block(e) => e.error_code(),
        }
    }
}

//! `spi cache`: inspect or empty the on-disk contribution cache.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Subcommand};
use serde::Serialize;
use spi_core::cache::SqliteStore;
use tracing::info;

use super::Context;
use crate::output::{OutputMode, pretty_kv, render};

#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Remove every cached entry.
    Clear,
    /// Show entry count and size.
    Stats,
}

#[derive(Debug, Serialize)]
struct ClearReport {
    path: PathBuf,
    removed: usize,
}

#[derive(Debug, Serialize)]
struct StatsReport {
    path: PathBuf,
    enabled: bool,
    entries: usize,
    value_bytes: u64,
}

pub fn run_cache(args: &CacheArgs, ctx: &Context, output: OutputMode) -> anyhow::Result<()> {
    let path = ctx
        .cache_path()
        .context("no cache path: pass --cache PATH or set [cache] path")?;
    let store =
        SqliteStore::open(&path).with_context(|| format!("open cache {}", path.display()))?;

    match args.command {
        CacheCommand::Clear => {
            let removed = store.clear()?;
            info!(path = %path.display(), removed, "cache cleared");
            render(output, &ClearReport { path, removed }, |r, w| {
                writeln!(w, "removed {} entries from {}", r.removed, r.path.display())
            })
        }
        CacheCommand::Stats => {
            let report = StatsReport {
                enabled: ctx.config().cache.enabled,
                entries: store.len()?,
                value_bytes: store.value_bytes()?,
                path,
            };
            render(output, &report, |r, w| {
                pretty_kv(w, "path", r.path.display().to_string())?;
                pretty_kv(w, "enabled", r.enabled.to_string())?;
                pretty_kv(w, "entries", r.entries.to_string())?;
                pretty_kv(w, "bytes", r.value_bytes.to_string())
            })
        }
    }
}

//! `spi blocked`: was a user blocked at a given instant?

use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use spi_core::block::{BlockMap, UserBlockHistory};
use spi_core::source::WikiSource;

use super::{Context, format_ts};
use crate::output::{OutputMode, pretty_kv, render_mode};

#[derive(Args, Debug)]
pub struct BlockedArgs {
    pub user: String,

    /// Instant to test, RFC 3339 (e.g. `2020-01-01T12:00:00Z`).
    #[arg(long)]
    pub at: DateTime<Utc>,

    /// Use block intervals only, ignoring unblocks.
    #[arg(long)]
    pub legacy: bool,
}

#[derive(Debug, Serialize)]
pub struct BlockedReport {
    pub user: String,
    pub at: DateTime<Utc>,
    pub blocked: bool,
    /// `history` or `intervals`.
    pub model: &'static str,
    pub entries: usize,
}

pub fn run_blocked(args: &BlockedArgs, ctx: &Context, output: OutputMode) -> anyhow::Result<()> {
    let source = ctx.source()?;
    let entries = source.user_blocks(&args.user)?;
    let count = entries.len();

    let (blocked, model) = if args.legacy {
        (BlockMap::from_entries(&entries).is_blocked_at(args.at), "intervals")
    } else {
        let history = UserBlockHistory::from_newest_first(entries)?;
        (history.is_blocked_at(args.at), "history")
    };

    let report = BlockedReport {
        user: args.user.clone(),
        at: args.at,
        blocked,
        model,
        entries: count,
    };
    render_mode(
        output,
        &report,
        |r, w| writeln!(w, "{}", if r.blocked { "blocked" } else { "not blocked" }),
        |r, w| {
            pretty_kv(w, "user", &r.user)?;
            pretty_kv(w, "at", format_ts(r.at))?;
            pretty_kv(w, "blocked", if r.blocked { "yes" } else { "no" })?;
            pretty_kv(w, "model", r.model)
        },
    )
}

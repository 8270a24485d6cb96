//! `spi g5`: pages socks created while the master was blocked.

use clap::Args;
use spi_core::g5::find_g5_candidates;

use super::{Context, format_ts};
use crate::output::{OutputMode, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct G5Args {
    /// Master account whose block log decides.
    pub master: String,

    /// Sock accounts whose page creations to check.
    #[arg(required = true)]
    pub socks: Vec<String>,
}

pub fn run_g5(args: &G5Args, ctx: &Context, output: OutputMode) -> anyhow::Result<()> {
    let source = ctx.source()?;
    let candidates = find_g5_candidates(
        &source,
        &args.master,
        &args.socks,
        ctx.config().analysis.g5_revision_limit,
    )?;
    render_mode(
        output,
        &candidates,
        |found, w| {
            for c in found {
                writeln!(
                    w,
                    "{}\t{}\t{}\t{}\t{}",
                    format_ts(c.timestamp),
                    c.user,
                    c.title,
                    c.score.rating,
                    c.score.reason
                )?;
            }
            Ok(())
        },
        |found, w| {
            pretty_section(w, &format!("G5 candidates ({})", found.len()))?;
            for c in found {
                write!(
                    w,
                    "{}  {:<16} {:<9} {}",
                    format_ts(c.timestamp),
                    c.user,
                    c.score.rating.to_string(),
                    c.title
                )?;
                if !c.score.reason.is_empty() {
                    write!(w, "  ({})", c.score.reason)?;
                }
                writeln!(w)?;
            }
            Ok(())
        },
    )
}

//! `spi pages`: which pages a set of users edited, and how.

use std::io::{self, Write};

use clap::Args;
use spi_core::pages::{PageData, aggregate_pages};

use super::Context;
use crate::output::{OutputMode, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct PagesArgs {
    /// Users whose edits to aggregate.
    #[arg(required = true)]
    pub users: Vec<String>,
}

pub fn run_pages(args: &PagesArgs, ctx: &Context, output: OutputMode) -> anyhow::Result<()> {
    let source = ctx.source()?;
    let cache = ctx.contrib_cache()?;
    let data = aggregate_pages(
        &args.users,
        &cache,
        &source,
        &ctx.config().analysis.reverted_tag,
    )?;
    render_mode(output, &data, render_text, render_pretty)
}

/// `(title, edits, editors, reverted)`, most edited first.
fn rows(data: &PageData) -> Vec<(&str, usize, usize, usize)> {
    let mut rows: Vec<_> = data
        .edit_counts
        .iter()
        .map(|(title, &edits)| {
            (
                title.as_str(),
                edits,
                data.editor_counts.get(title).copied().unwrap_or(0),
                data.reverted_counts.get(title).copied().unwrap_or(0),
            )
        })
        .collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    rows
}

fn render_text(data: &PageData, w: &mut dyn Write) -> io::Result<()> {
    for (title, edits, editors, reverted) in rows(data) {
        writeln!(w, "{title}\t{edits}\t{editors}\t{reverted}")?;
    }
    Ok(())
}

fn render_pretty(data: &PageData, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Pages ({})", data.edit_counts.len()))?;
    writeln!(w, "{:>6} {:>8} {:>9}  title", "edits", "editors", "reverted")?;
    for (title, edits, editors, reverted) in rows(data) {
        writeln!(w, "{edits:>6} {editors:>8} {reverted:>9}  {title}")?;
    }
    Ok(())
}

//! `spi timeline`: merged newest-first activity of several users.

use std::io::{self, Write};

use clap::Args;
use spi_core::timeline::{Timeline, build_timeline};

use super::{Context, format_ts};
use crate::output::{OutputMode, pretty_rule, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct TimelineArgs {
    /// Users whose activity to merge.
    #[arg(required = true)]
    pub users: Vec<String>,
}

pub fn run_timeline(args: &TimelineArgs, ctx: &Context, output: OutputMode) -> anyhow::Result<()> {
    let source = ctx.source()?;
    let cache = ctx.contrib_cache()?;
    let timeline = build_timeline(&args.users, &cache, &source)?;
    render_mode(output, &timeline, render_text, render_pretty)
}

fn render_text(timeline: &Timeline, w: &mut dyn Write) -> io::Result<()> {
    for e in &timeline.events {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            format_ts(e.timestamp),
            e.id,
            e.user_name,
            e.description,
            e.details,
            e.title,
            e.comment,
            e.extra
        )?;
    }
    Ok(())
}

fn render_pretty(timeline: &Timeline, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Timeline ({} events)", timeline.events.len()))?;
    for e in &timeline.events {
        let what = if e.details.is_empty() {
            e.description.clone()
        } else {
            format!("{} ({})", e.description, e.details)
        };
        write!(
            w,
            "{}  {:<16} {:<20} {}",
            format_ts(e.timestamp),
            e.user_name,
            what,
            e.title
        )?;
        if !e.comment.is_empty() {
            write!(w, "  \"{}\"", e.comment)?;
        }
        if !e.extra.is_empty() {
            write!(w, "  [{}]", e.extra)?;
        }
        writeln!(w)?;
    }

    if timeline.tag_list.is_empty() {
        return Ok(());
    }
    writeln!(w)?;
    pretty_section(w, "Tags")?;
    write!(w, "{:<16}", "user")?;
    for tag in &timeline.tag_list {
        write!(w, " {tag:>12}")?;
    }
    writeln!(w)?;
    pretty_rule(w)?;
    for (user, counts) in &timeline.tag_table {
        write!(w, "{user:<16}")?;
        for (_, count) in counts {
            write!(w, " {count:>12}")?;
        }
        writeln!(w)?;
    }
    Ok(())
}

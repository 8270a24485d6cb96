//! `spi cases` and `spi users`: open cases and the accounts reported in one.

use clap::Args;
use serde::Serialize;
use spi_core::model::SpiUserInfo;

use super::Context;
use crate::output::{OutputMode, pretty_section, render, render_mode};

#[derive(Args, Debug)]
pub struct CasesArgs {}

#[derive(Args, Debug)]
pub struct UsersArgs {
    /// Case (master account name) whose reported users to list.
    pub case: String,
}

#[derive(Debug, Serialize)]
pub struct UsersReport {
    pub case: String,
    pub users: Vec<SpiUserInfo>,
}

pub fn run_cases(_args: &CasesArgs, ctx: &Context, output: OutputMode) -> anyhow::Result<()> {
    let source = ctx.source()?;
    let cases = source.open_cases();
    render(output, &cases, |names, w| {
        for name in names {
            writeln!(w, "{name}")?;
        }
        Ok(())
    })
}

pub fn run_users(args: &UsersArgs, ctx: &Context, output: OutputMode) -> anyhow::Result<()> {
    let source = ctx.source()?;
    let report = UsersReport {
        case: args.case.clone(),
        users: source.case_users(&args.case),
    };
    render_mode(
        output,
        &report,
        |r, w| {
            for user in &r.users {
                writeln!(w, "{}\t{}", user.username, user.date.as_deref().unwrap_or(""))?;
            }
            Ok(())
        },
        |r, w| {
            pretty_section(w, &format!("Users in {} ({})", r.case, r.users.len()))?;
            for user in &r.users {
                match user.date {
                    Some(ref date) => writeln!(w, "{:<24} {date}", user.username)?,
                    None => writeln!(w, "{:<24} (master)", user.username)?,
                }
            }
            Ok(())
        },
    )
}

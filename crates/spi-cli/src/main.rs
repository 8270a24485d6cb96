#![forbid(unsafe_code)]

mod cmd;
mod output;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use spi_core::config::load_config;
use spi_core::error::ErrorCode;
use spi_core::timing;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "spi: sockpuppet investigation helpers",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit command timing report to stderr.
    #[arg(long, global = true)]
    timing: bool,

    /// Output format.
    #[arg(long, value_enum, global = true)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Wiki snapshot (JSON) to analyse.
    #[arg(long, global = true, env = "SPI_FIXTURE")]
    fixture: Option<PathBuf>,

    /// Config file instead of the platform default.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Contribution cache database path.
    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    /// Neither read nor write the contribution cache.
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Analysis",
        about = "Merged activity timeline",
        long_about = "Merge the edits, deleted edits, blocks and log events of several users into one newest-first timeline.",
        after_help = "EXAMPLES:\n    spi --fixture wiki.json timeline Fred Wilma\n\n    # Emit machine-readable output\n    spi --fixture wiki.json timeline Fred Wilma --format json"
    )]
    Timeline(cmd::timeline::TimelineArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "Per-page edit statistics",
        long_about = "Count edits, distinct editors and reverted edits per page for a set of users."
    )]
    Pages(cmd::pages::PagesArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "Smallest network covering addresses",
        after_help = "EXAMPLES:\n    spi cidr 100.0.0.1 100.0.0.3 100.0.0.4 100.0.0.5"
    )]
    Cidr(cmd::cidr::CidrArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "Was a user blocked at an instant",
        after_help = "EXAMPLES:\n    spi --fixture wiki.json blocked Fred --at 2020-01-01T12:00:00Z"
    )]
    Blocked(cmd::blocked::BlockedArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "Pages eligible for G5 deletion",
        long_about = "List existing pages the socks created while the master account was blocked, with a rough rating."
    )]
    G5(cmd::g5::G5Args),

    #[command(
        next_help_heading = "Cases",
        about = "Addresses reported in case pages"
    )]
    Ips(cmd::ips::IpsArgs),

    #[command(
        next_help_heading = "Cases",
        about = "List open investigation cases"
    )]
    Cases(cmd::cases::CasesArgs),

    #[command(
        next_help_heading = "Cases",
        about = "Accounts reported in a case",
        after_help = "EXAMPLES:\n    spi --fixture wiki.json users Fred"
    )]
    Users(cmd::cases::UsersArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Inspect or clear the contribution cache"
    )]
    Cache(cmd::cache::CacheArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("SPI_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "spi=debug,spi_core=debug,info"
        } else {
            "spi=info,spi_core=info,warn"
        })
    });

    let format = env::var("SPI_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let timing_enabled = cli.timing || timing::timing_enabled_from_env();
    timing::set_timing_enabled(timing_enabled);
    timing::clear_timings();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            let output = resolve_output_mode(cli.format, cli.json, None);
            render_error(
                output,
                &CliError::with_code(format!("{err:#}"), ErrorCode::ConfigParseError),
            )?;
            return Ok(ExitCode::FAILURE);
        }
    };
    config.apply_env_overrides();
    if cli.no_cache {
        config.cache.enabled = false;
    }

    let output = resolve_output_mode(cli.format, cli.json, config.output.as_deref());
    let ctx = cmd::Context::new(config, cli.fixture.clone(), cli.cache.clone());

    let command_result = match cli.command {
        Commands::Timeline(ref args) => timing::timed("cmd.timeline", || {
            cmd::timeline::run_timeline(args, &ctx, output)
        }),
        Commands::Pages(ref args) => {
            timing::timed("cmd.pages", || cmd::pages::run_pages(args, &ctx, output))
        }
        Commands::Cidr(ref args) => {
            timing::timed("cmd.cidr", || cmd::cidr::run_cidr(args, output))
        }
        Commands::Blocked(ref args) => {
            timing::timed("cmd.blocked", || cmd::blocked::run_blocked(args, &ctx, output))
        }
        Commands::G5(ref args) => timing::timed("cmd.g5", || cmd::g5::run_g5(args, &ctx, output)),
        Commands::Ips(ref args) => {
            timing::timed("cmd.ips", || cmd::ips::run_ips(args, &ctx, output))
        }
        Commands::Cases(ref args) => {
            timing::timed("cmd.cases", || cmd::cases::run_cases(args, &ctx, output))
        }
        Commands::Users(ref args) => {
            timing::timed("cmd.users", || cmd::cases::run_users(args, &ctx, output))
        }
        Commands::Cache(ref args) => {
            timing::timed("cmd.cache", || cmd::cache::run_cache(args, &ctx, output))
        }
    };

    if timing_enabled {
        let report = timing::collect_report();
        if report.is_empty() {
            eprintln!("timing report: no samples recorded");
        } else {
            eprintln!("timing report:");
            eprintln!("{}", report.display_table());
            eprintln!("timing report (json):");
            eprintln!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    match command_result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            render_error(output, &CliError::from_anyhow(&err))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

//! `spi ips`: addresses reported in case pages.

use clap::Args;
use serde::Serialize;
use spi_core::model::case::{IpSummary, SpiIpInfo, common_network, master_name, summarize_ips};

use super::Context;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct IpsArgs {
    /// Only addresses from this case (master account name).
    #[arg(long)]
    pub case: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IpsReport {
    pub case: Option<String>,
    pub addresses: Vec<IpSummary>,
    /// Smallest network covering every address; absent when there are none.
    pub network: Option<String>,
}

pub fn run_ips(args: &IpsArgs, ctx: &Context, output: OutputMode) -> anyhow::Result<()> {
    let source = ctx.source()?;
    let infos: Vec<SpiIpInfo> = source
        .case_ips()
        .iter()
        .filter(|info| {
            args.case
                .as_deref()
                .is_none_or(|case| master_name(&info.page_title) == case)
        })
        .cloned()
        .collect();

    let network = if infos.is_empty() {
        None
    } else {
        Some(common_network(&infos)?.to_string())
    };
    let report = IpsReport {
        case: args.case.clone(),
        addresses: summarize_ips(&infos),
        network,
    };

    render_mode(
        output,
        &report,
        |r, w| {
            for s in &r.addresses {
                writeln!(w, "{}\t{}", s.ip_address, s.dates.join(","))?;
            }
            Ok(())
        },
        |r, w| {
            pretty_section(w, &format!("Addresses ({})", r.addresses.len()))?;
            for s in &r.addresses {
                writeln!(w, "{:<16} {}", s.ip_address.to_string(), s.dates.join(", "))?;
            }
            if let Some(ref network) = r.network {
                writeln!(w)?;
                pretty_kv(w, "network", network)?;
            }
            Ok(())
        },
    )
}

//! `spi cidr`: smallest network covering a set of addresses.

use std::net::IpAddr;

use anyhow::Context as _;
use clap::Args;
use serde::Serialize;
use spi_core::net::smallest_covering_network;

use crate::output::{OutputMode, pretty_kv, render_mode};

#[derive(Args, Debug)]
pub struct CidrArgs {
    /// IPv4 or IPv6 addresses (all of one family).
    pub addresses: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CidrReport {
    pub network: String,
    pub base: IpAddr,
    pub prefix_len: u8,
    pub address_count: usize,
}

pub fn run_cidr(args: &CidrArgs, output: OutputMode) -> anyhow::Result<()> {
    let addrs = args
        .addresses
        .iter()
        .map(|raw| {
            raw.trim()
                .parse::<IpAddr>()
                .with_context(|| format!("invalid IP address {raw:?}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let network = smallest_covering_network(&addrs)?;
    let report = CidrReport {
        network: network.to_string(),
        base: network.base(),
        prefix_len: network.prefix_len(),
        address_count: addrs.len(),
    };

    render_mode(
        output,
        &report,
        |r, w| writeln!(w, "{}", r.network),
        |r, w| {
            pretty_kv(w, "network", &r.network)?;
            pretty_kv(w, "prefix", r.prefix_len.to_string())?;
            pretty_kv(w, "addresses", r.address_count.to_string())
        },
    )
}

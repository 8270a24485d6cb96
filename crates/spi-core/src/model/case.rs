//! Users and IP addresses named in an investigation case.
//!
//! Case pages live under [`CASE_PREFIX`]; older reports are moved to an
//! `/Archive` subpage. Identity of a user entry is the explicit pair
//! `(username, date)`; IP entries additionally carry the page they were
//! found on.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::net::{CidrError, IpNetwork, smallest_covering_network};

/// Title prefix shared by every case page.
pub const CASE_PREFIX: &str = "Wikipedia:Sockpuppet investigations/";

const ARCHIVE_SEGMENT: &str = "Archive";

/// Errors raised while building case records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaseError {
    /// The string is not an IPv4 address.
    #[error("invalid IPv4 address: {0:?}")]
    InvalidIpV4(String),
}

impl CaseError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidIpV4(_) => ErrorCode::InvalidIpV4,
        }
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// A user named in a case. The master account has no date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpiUserInfo {
    pub username: String,
    #[serde(default)]
    pub date: Option<String>,
}

impl SpiUserInfo {
    /// Identity used for deduplication.
    #[must_use]
    pub fn key(&self) -> (&str, Option<&str>) {
        (self.username.as_str(), self.date.as_deref())
    }
}

/// Drop repeated `(username, date)` entries, keeping first occurrences in order.
#[must_use]
pub fn dedup_users(users: &[SpiUserInfo]) -> Vec<SpiUserInfo> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for user in users {
        if seen.insert(user.key()) {
            unique.push(user.clone());
        }
    }
    unique
}

// ---------------------------------------------------------------------------
// IP addresses
// ---------------------------------------------------------------------------

/// An IPv4 address named in a case section.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpiIpInfo {
    pub ip_address: Ipv4Addr,
    pub date: String,
    pub page_title: String,
}

impl SpiIpInfo {
    /// Parse `ip` and build an entry.
    ///
    /// # Errors
    ///
    /// [`CaseError::InvalidIpV4`] if `ip` is not a dotted-quad IPv4 address.
    pub fn parse(ip: &str, date: &str, page_title: &str) -> Result<Self, CaseError> {
        let ip_address = ip
            .trim()
            .parse::<Ipv4Addr>()
            .map_err(|_| CaseError::InvalidIpV4(ip.to_string()))?;
        Ok(Self {
            ip_address,
            date: date.to_string(),
            page_title: page_title.to_string(),
        })
    }
}

/// All the dates on which one IP address was reported.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct IpSummary {
    pub ip_address: Ipv4Addr,
    pub dates: Vec<String>,
}

/// Group entries by address. Dates are sorted; summaries are sorted by address.
#[must_use]
pub fn summarize_ips(infos: &[SpiIpInfo]) -> Vec<IpSummary> {
    let mut by_ip: BTreeMap<Ipv4Addr, Vec<String>> = BTreeMap::new();
    for info in infos {
        by_ip
            .entry(info.ip_address)
            .or_default()
            .push(info.date.clone());
    }
    by_ip
        .into_iter()
        .map(|(ip_address, mut dates)| {
            dates.sort();
            IpSummary { ip_address, dates }
        })
        .collect()
}

/// Smallest network covering every reported address.
///
/// # Errors
///
/// [`CidrError::EmptyAddressList`] if `infos` is empty.
pub fn common_network(infos: &[SpiIpInfo]) -> Result<IpNetwork, CidrError> {
    let addrs: Vec<IpAddr> = infos.iter().map(|i| IpAddr::V4(i.ip_address)).collect();
    smallest_covering_network(&addrs)
}

// ---------------------------------------------------------------------------
// Case names
// ---------------------------------------------------------------------------

/// The master account name for a case page or its archive.
///
/// `Wikipedia:Sockpuppet investigations/Foo/Archive` yields `Foo`.
#[must_use]
pub fn master_name(page_title: &str) -> &str {
    let mut parts: Vec<&str> = page_title.split('/').collect();
    if parts.last() == Some(&ARCHIVE_SEGMENT) {
        parts.pop();
    }
    parts.last().copied().unwrap_or(page_title)
}

/// Case names from the members of the open-cases category.
///
/// Only titles under [`CASE_PREFIX`] count; names containing `/` are
/// rejected because subpages cannot be told apart from case names.
#[must_use]
pub fn current_case_names<'a>(raw_titles: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    raw_titles
        .into_iter()
        .filter_map(|title| title.strip_prefix(CASE_PREFIX))
        .filter(|name| !name.is_empty() && !name.contains('/'))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

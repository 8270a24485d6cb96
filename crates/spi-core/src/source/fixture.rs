//! A [`WikiSource`] backed by a JSON snapshot of wiki data.
//!
//! ```json
//! {
//!   "contributions": [{ "rev_id": 1, "timestamp": "2020-01-01T00:00:00Z",
//!                       "user_name": "Fred", "namespace": 0, "title": "Foo",
//!                       "comment": "c", "is_live": true, "tags": [],
//!                       "creates_page": true }],
//!   "blocks": [{ "id": 1, "target": "Fred", "timestamp": "...",
//!                "action": "block", "expiry": null }],
//!   "log_events": [],
//!   "pages": ["Foo"],
//!   "case_ips": [{ "ip": "192.0.2.1", "date": "2020-01-01",
//!                  "page_title": "Wikipedia:Sockpuppet investigations/Fred" }],
//!   "case_users": [{ "username": "Wilma", "date": "2020-01-01",
//!                    "page_title": "Wikipedia:Sockpuppet investigations/Fred" }],
//!   "open_cases": ["Wikipedia:Sockpuppet investigations/Fred"],
//!   "deleted_access": true
//! }
//! ```
//!
//! Every key is optional. Contributions with `is_live: false` are served as
//! deleted contributions.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{FetchError, WikiSource, validate_user_names};
use crate::block::{BlockError, BlockLogEntry, RawBlockLogRecord};
use crate::error::ErrorCode;
use crate::model::case::{current_case_names, dedup_users, master_name};
use crate::model::{Contribution, LogEvent, SpiIpInfo, SpiUserInfo};

/// Errors raised while loading a fixture.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("failed to read fixture: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse fixture: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid block record in fixture: {0}")]
    Block(#[from] BlockError),
}

impl FixtureError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Io(_) | Self::Parse(_) => ErrorCode::FixtureParseError,
            Self::Block(e) => e.error_code(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FixtureContribution {
    #[serde(flatten)]
    contribution: Contribution,
    #[serde(default)]
    creates_page: bool,
}

#[derive(Debug, Deserialize)]
struct FixtureCaseIp {
    ip: String,
    date: String,
    page_title: String,
}

#[derive(Debug, Clone, Deserialize)]
struct FixtureCaseUser {
    #[serde(flatten)]
    user: SpiUserInfo,
    page_title: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct FixtureFile {
    contributions: Vec<FixtureContribution>,
    blocks: Vec<RawBlockLogRecord>,
    log_events: Vec<LogEvent>,
    pages: Vec<String>,
    case_ips: Vec<FixtureCaseIp>,
    case_users: Vec<FixtureCaseUser>,
    /// Raw members of the open-cases category.
    open_cases: Vec<String>,
    deleted_access: bool,
}

impl Default for FixtureFile {
    fn default() -> Self {
        Self {
            contributions: Vec::new(),
            blocks: Vec::new(),
            log_events: Vec::new(),
            pages: Vec::new(),
            case_ips: Vec::new(),
            case_users: Vec::new(),
            open_cases: Vec::new(),
            deleted_access: true,
        }
    }
}

/// In-memory wiki snapshot.
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    contributions: Vec<Contribution>,
    creations: BTreeSet<u64>,
    blocks: Vec<BlockLogEntry>,
    log_events: Vec<LogEvent>,
    pages: BTreeSet<String>,
    case_ips: Vec<SpiIpInfo>,
    case_users: Vec<FixtureCaseUser>,
    open_cases: Vec<String>,
    deleted_access: bool,
}

impl FixtureSource {
    /// Load a fixture file.
    ///
    /// # Errors
    ///
    /// I/O failure, malformed JSON, or an invalid block record.
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let raw = std::fs::read_to_string(path)?;
        let source = Self::from_json(&raw)?;
        debug!(
            path = %path.display(),
            contributions = source.contributions.len(),
            blocks = source.blocks.len(),
            "fixture loaded"
        );
        Ok(source)
    }

    /// Parse a fixture from a JSON string.
    ///
    /// # Errors
    ///
    /// Malformed JSON or an invalid block record.
    pub fn from_json(raw: &str) -> Result<Self, FixtureError> {
        let file: FixtureFile = serde_json::from_str(raw)?;

        let mut creations = BTreeSet::new();
        let mut contributions = Vec::with_capacity(file.contributions.len());
        for entry in file.contributions {
            if entry.creates_page {
                creations.insert(entry.contribution.rev_id);
            }
            contributions.push(entry.contribution);
        }

        let blocks = file
            .blocks
            .into_iter()
            .map(BlockLogEntry::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let mut case_ips = Vec::with_capacity(file.case_ips.len());
        for raw_ip in file.case_ips {
            match SpiIpInfo::parse(&raw_ip.ip, &raw_ip.date, &raw_ip.page_title) {
                Ok(info) => case_ips.push(info),
                Err(err) => warn!(page = %raw_ip.page_title, %err, "skipping case address"),
            }
        }

        Ok(Self {
            contributions,
            creations,
            blocks,
            log_events: file.log_events,
            pages: file.pages.into_iter().collect(),
            case_ips,
            case_users: file.case_users,
            open_cases: file.open_cases,
            deleted_access: file.deleted_access,
        })
    }

    /// IP addresses reported on case pages.
    #[must_use]
    pub fn case_ips(&self) -> &[SpiIpInfo] {
        &self.case_ips
    }

    /// Users reported in `case` or its archive, without repeats.
    #[must_use]
    pub fn case_users(&self, case: &str) -> Vec<SpiUserInfo> {
        let reported: Vec<SpiUserInfo> = self
            .case_users
            .iter()
            .filter(|entry| master_name(&entry.page_title) == case)
            .map(|entry| entry.user.clone())
            .collect();
        dedup_users(&reported)
    }

    /// Names of the currently open cases, sorted.
    #[must_use]
    pub fn open_cases(&self) -> Vec<String> {
        current_case_names(self.open_cases.iter().map(String::as_str))
    }

    fn newest_first(mut contribs: Vec<Contribution>) -> Vec<Contribution> {
        contribs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.rev_id.cmp(&a.rev_id)));
        contribs
    }
}

impl WikiSource for FixtureSource {
    fn user_contributions(
        &self,
        user_names: &[String],
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Contribution>, FetchError> {
        validate_user_names(user_names)?;
        let found = self
            .contributions
            .iter()
            .filter(|c| c.is_live && user_names.contains(&c.user_name))
            .filter(|c| end.is_none_or(|end| c.timestamp >= end))
            .cloned()
            .collect();
        Ok(Self::newest_first(found))
    }

    fn deleted_user_contributions(
        &self,
        user_name: &str,
    ) -> Result<Vec<Contribution>, FetchError> {
        if !self.deleted_access {
            return Err(FetchError::PermissionDenied(
                "deletedrevisions requires the deletedhistory right".into(),
            ));
        }
        Ok(self
            .contributions
            .iter()
            .filter(|c| !c.is_live && c.user_name == user_name)
            .cloned()
            .collect())
    }

    fn user_blocks(&self, user_name: &str) -> Result<Vec<BlockLogEntry>, FetchError> {
        let mut entries: Vec<BlockLogEntry> = self
            .blocks
            .iter()
            .filter(|b| b.target() == user_name)
            .cloned()
            .collect();
        entries.sort_by_key(|b| std::cmp::Reverse(b.timestamp()));
        Ok(entries)
    }

    fn user_log_events(&self, user_name: &str) -> Result<Vec<LogEvent>, FetchError> {
        Ok(self
            .log_events
            .iter()
            .filter(|e| e.user_name == user_name)
            .cloned()
            .collect())
    }

    fn page_creations(&self, user_names: &[String]) -> Result<Vec<Contribution>, FetchError> {
        validate_user_names(user_names)?;
        let found = self
            .contributions
            .iter()
            .filter(|c| self.creations.contains(&c.rev_id) && user_names.contains(&c.user_name))
            .cloned()
            .collect();
        Ok(Self::newest_first(found))
    }

    fn page_exists(&self, title: &str) -> Result<bool, FetchError> {
        Ok(self.pages.contains(title))
    }

    fn page_revisions(&self, title: &str, limit: usize) -> Result<Vec<Contribution>, FetchError> {
        let found = self
            .contributions
            .iter()
            .filter(|c| c.is_live && c.title == title)
            .cloned()
            .collect();
        let mut revisions = Self::newest_first(found);
        revisions.truncate(limit);
        Ok(revisions)
    }
}

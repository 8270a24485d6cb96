//! Pages created by socks while the master account was blocked.
//!
//! Such pages are candidates for speedy deletion under criterion G5. Each
//! candidate gets a rough rating from its revision history.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::AnalysisError;
use crate::block::{BlockLogEntry, UserBlockHistory};
use crate::model::Contribution;
use crate::source::WikiSource;

/// Revisions inspected per page unless configured otherwise.
pub const DEFAULT_REVISION_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum G5Rating {
    Likely,
    Unlikely,
    Unknown,
}

impl fmt::Display for G5Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Likely => "likely",
            Self::Unlikely => "unlikely",
            Self::Unknown => "unknown",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct G5Score {
    pub rating: G5Rating,
    /// Empty for [`G5Rating::Unknown`].
    pub reason: String,
}

/// One page creation that may qualify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct G5Summary {
    pub title: String,
    pub user: String,
    pub timestamp: DateTime<Utc>,
    pub score: G5Score,
}

/// Rate a page from its newest `limit` revisions.
///
/// Pages with `limit` or more revisions have had too much independent work
/// to qualify; pages only one account ever touched are likely to.
#[must_use]
pub fn g5_score(revisions: &[Contribution], limit: usize) -> G5Score {
    if revisions.len() >= limit {
        return G5Score {
            rating: G5Rating::Unlikely,
            reason: format!("{limit} or more revisions"),
        };
    }
    let editors: BTreeSet<&str> = revisions.iter().map(|r| r.user_name.as_str()).collect();
    if editors.len() == 1 {
        return G5Score {
            rating: G5Rating::Likely,
            reason: "only one editor".into(),
        };
    }
    G5Score {
        rating: G5Rating::Unknown,
        reason: String::new(),
    }
}

/// Existing pages created by any of `socks` while `master` was blocked.
///
/// Unrecognized entries in the master's block log are skipped.
///
/// # Errors
///
/// Fetch failures, or a block log that is not strictly chronological.
pub fn find_g5_candidates(
    source: &dyn WikiSource,
    master: &str,
    socks: &[String],
    revision_limit: usize,
) -> Result<Vec<G5Summary>, AnalysisError> {
    let entries: Vec<BlockLogEntry> = source
        .user_blocks(master)?
        .into_iter()
        .filter(|entry| {
            let keep = entry.is_recognized();
            if !keep {
                warn!(user = master, id = entry.id(), "skipping unrecognized block entry");
            }
            keep
        })
        .collect();
    let history = UserBlockHistory::from_newest_first(entries)?;

    let mut candidates = Vec::new();
    for creation in source.page_creations(socks)? {
        if !history.is_blocked_at(creation.timestamp) {
            continue;
        }
        if !source.page_exists(&creation.title)? {
            debug!(title = %creation.title, "created page no longer exists");
            continue;
        }
        let revisions = source.page_revisions(&creation.title, revision_limit)?;
        candidates.push(G5Summary {
            score: g5_score(&revisions, revision_limit),
            title: creation.title,
            user: creation.user_name,
            timestamp: creation.timestamp,
        });
    }
    Ok(candidates)
}

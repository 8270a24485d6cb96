//! Per-page edit statistics for a set of users.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::info;

use crate::AnalysisError;
use crate::cache::{CacheStore, ContribCache};
use crate::source::{WikiSource, empty_if_denied};

/// Tag the wiki puts on edits that were later reverted.
pub const DEFAULT_REVERTED_TAG: &str = "mw-reverted";

/// Counts keyed by full page title (e.g. `Talk:Foo`).
///
/// Every edited title is a key of `edit_counts` and `editor_counts`;
/// `reverted_counts` only has titles with at least one reverted edit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PageData {
    /// Edits per page, live and deleted.
    pub edit_counts: BTreeMap<String, usize>,
    /// Distinct users per page.
    pub editor_counts: BTreeMap<String, usize>,
    /// Edits per page carrying the reverted tag.
    pub reverted_counts: BTreeMap<String, usize>,
}

/// Tally page statistics across the live and deleted edits of `users`.
///
/// # Errors
///
/// Fetch or cache failures, except permission denials on deleted
/// contributions.
pub fn aggregate_pages<S: CacheStore>(
    users: &[String],
    contribs: &ContribCache<S>,
    source: &dyn WikiSource,
    reverted_tag: &str,
) -> Result<PageData, AnalysisError> {
    let mut data = PageData::default();
    let mut editors: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();

    for user in users {
        let live = contribs.get(source, user)?;
        let deleted = empty_if_denied(source.deleted_user_contributions(user), user)?;
        for contrib in live.iter().chain(&deleted) {
            *data.edit_counts.entry(contrib.title.clone()).or_default() += 1;
            editors
                .entry(contrib.title.clone())
                .or_default()
                .insert(user.as_str());
            if contrib.has_tag(reverted_tag) {
                *data.reverted_counts.entry(contrib.title.clone()).or_default() += 1;
            }
        }
    }

    data.editor_counts = editors
        .into_iter()
        .map(|(title, users)| (title, users.len()))
        .collect();

    info!(
        users = users.len(),
        pages = data.edit_counts.len(),
        reverted = data.reverted_counts.len(),
        "page statistics aggregated"
    );
    Ok(data)
}

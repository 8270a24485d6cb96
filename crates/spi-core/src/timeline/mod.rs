//! Merged per-user timelines.
//!
//! For every user three descending sub-streams are built (edits, blocks, log
//! events), merged per user, and then merged across users into one newest
//! first sequence of [`TimelineEvent`]s. Tag usage is tallied while the edit
//! stream is assembled, before any merging.

pub mod merge;

pub use merge::{MergeDescending, merge_descending};

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::AnalysisError;
use crate::block::BlockLogEntry;
use crate::cache::{CacheStore, ContribCache};
use crate::model::{COMMENT_HIDDEN, Contribution, LogEvent};
use crate::source::{WikiSource, empty_if_denied};
use crate::timing::timed;

/// One row of a timeline.
///
/// Ordering compares every field in declaration order, timestamp first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct TimelineEvent {
    pub timestamp: DateTime<Utc>,
    /// Revision or log id; 0 when unknown.
    pub id: u64,
    pub user_name: String,
    /// Short phrase, e.g. `edit`, `block`, or a log type.
    pub description: String,
    /// Qualifier, e.g. `deleted`, `reblock`, or a log action.
    pub details: String,
    pub title: String,
    pub comment: String,
    /// Event-specific extras; the joined tags for edits.
    pub extra: String,
}

/// `(tag, count)` for every tag in [`Timeline::tag_list`].
pub type TagCounts = Vec<(String, usize)>;

/// A merged timeline plus tag usage statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Timeline {
    /// Newest first.
    pub events: Vec<TimelineEvent>,
    /// Every tag used by any user, sorted.
    pub tag_list: Vec<String>,
    /// One row per user, in input order. Unused tags have count 0.
    pub tag_table: Vec<(String, TagCounts)>,
}

type EventStream<'a> = Box<dyn Iterator<Item = TimelineEvent> + 'a>;

/// Orders contributions by timestamp alone.
struct ByTimestamp(Contribution);

impl PartialEq for ByTimestamp {
    fn eq(&self, other: &Self) -> bool {
        self.0.timestamp == other.0.timestamp
    }
}

impl Eq for ByTimestamp {}

impl PartialOrd for ByTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ByTimestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.timestamp.cmp(&other.0.timestamp)
    }
}

/// Build the merged timeline for `users`.
///
/// Live contributions come through `contribs`, so the cache is extended as a
/// side effect. Deleted contributions the caller may not see are left out.
///
/// # Errors
///
/// Any fetch or cache failure other than a permission denial on deleted
/// contributions.
pub fn build_timeline<S: CacheStore>(
    users: &[String],
    contribs: &ContribCache<S>,
    source: &dyn WikiSource,
) -> Result<Timeline, AnalysisError> {
    let mut tag_data: Vec<(String, BTreeMap<String, usize>)> = Vec::with_capacity(users.len());
    let mut user_streams: Vec<EventStream<'static>> = Vec::with_capacity(users.len());

    for user in users {
        let (stream, tags) = timed("timeline.user", || user_stream(user, contribs, source))?;
        tag_data.push((user.clone(), tags));
        user_streams.push(stream);
    }

    let events: Vec<TimelineEvent> = merge_descending(user_streams).collect();

    let tag_list: Vec<String> = tag_data
        .iter()
        .flat_map(|(_, counts)| counts.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let tag_table = tag_data
        .into_iter()
        .map(|(user, counts)| {
            let row = tag_list
                .iter()
                .map(|tag| (tag.clone(), counts.get(tag).copied().unwrap_or(0)))
                .collect();
            (user, row)
        })
        .collect();

    info!(
        users = users.len(),
        events = events.len(),
        tags = tag_list.len(),
        "timeline built"
    );
    Ok(Timeline {
        events,
        tag_list,
        tag_table,
    })
}

fn user_stream<S: CacheStore>(
    user: &str,
    contribs: &ContribCache<S>,
    source: &dyn WikiSource,
) -> Result<(EventStream<'static>, BTreeMap<String, usize>), AnalysisError> {
    let live = contribs.get(source, user)?;
    let mut deleted = empty_if_denied(source.deleted_user_contributions(user), user)?;
    deleted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let mut tags: BTreeMap<String, usize> = BTreeMap::new();
    for contrib in live.iter().chain(&deleted) {
        for tag in &contrib.tags {
            *tags.entry(tag.clone()).or_default() += 1;
        }
    }

    let mut blocks = source.user_blocks(user)?;
    blocks.sort_by_key(|b| Reverse(b.timestamp()));

    let mut logs: Vec<TimelineEvent> = source
        .user_log_events(user)?
        .into_iter()
        .map(log_event)
        .collect();
    logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    debug!(
        user,
        live = live.len(),
        deleted = deleted.len(),
        blocks = blocks.len(),
        logs = logs.len(),
        "user streams fetched"
    );

    let edits: EventStream<'static> = Box::new(
        merge_descending([
            live.into_iter().map(ByTimestamp),
            deleted.into_iter().map(ByTimestamp),
        ])
        .map(|ByTimestamp(c)| edit_event(c)),
    );
    let block_events: EventStream<'static> = Box::new(blocks.into_iter().map(block_event));
    let log_events: EventStream<'static> = Box::new(logs.into_iter());

    let merged: EventStream<'static> =
        Box::new(merge_descending([edits, block_events, log_events]));
    Ok((merged, tags))
}

fn edit_event(contrib: Contribution) -> TimelineEvent {
    TimelineEvent {
        timestamp: contrib.timestamp,
        id: contrib.rev_id,
        description: "edit".into(),
        details: if contrib.is_live { "" } else { "deleted" }.into(),
        comment: contrib.comment.display_text().to_string(),
        extra: contrib.joined_tags(),
        user_name: contrib.user_name,
        title: contrib.title,
    }
}

fn block_event(entry: BlockLogEntry) -> TimelineEvent {
    let (description, details, title) = match &entry {
        BlockLogEntry::Block(b) => (
            "block",
            if b.is_reblock() { "reblock" } else { "" },
            b.expiry_display(),
        ),
        BlockLogEntry::Unblock(_) => ("unblock", "", String::new()),
        BlockLogEntry::Unrecognized(_) => ("block", "unknown", String::new()),
    };
    TimelineEvent {
        timestamp: entry.timestamp(),
        id: entry.id(),
        user_name: entry.target().to_string(),
        description: description.into(),
        details: details.into(),
        title,
        comment: String::new(),
        extra: String::new(),
    }
}

fn log_event(event: LogEvent) -> TimelineEvent {
    TimelineEvent {
        timestamp: event.timestamp,
        id: event.id,
        user_name: event.user_name,
        description: event.log_type,
        details: event.action.unwrap_or_default(),
        title: event.title.unwrap_or_default(),
        comment: event.comment.unwrap_or_else(|| COMMENT_HIDDEN.to_string()),
        extra: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockEvent, UnblockEvent, UnrecognizedAction};
    use crate::cache::MemoryStore;
    use crate::model::Comment;
    use crate::source::{FetchError, FixtureSource};
    use chrono::TimeZone;

    fn dt(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).single().expect("valid date")
    }

    fn contrib(rev_id: u64, ts: DateTime<Utc>, is_live: bool, tags: &[&str]) -> Contribution {
        Contribution {
            rev_id,
            timestamp: ts,
            user_name: "Fred".into(),
            namespace: 0,
            title: "Title".into(),
            comment: Comment::from("comment"),
            is_live,
            tags: tags.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn edit_event_maps_fields() {
        let event = edit_event(contrib(1003, dt(2020, 1, 3), false, &["tag1", "tag2"]));
        assert_eq!(event.id, 1003);
        assert_eq!(event.description, "edit");
        assert_eq!(event.details, "deleted");
        assert_eq!(event.title, "Title");
        assert_eq!(event.comment, "comment");
        assert_eq!(event.extra, "tag1, tag2");
    }

    #[test]
    fn hidden_comment_is_replaced() {
        let mut c = contrib(1, dt(2020, 1, 1), true, &[]);
        c.comment = Comment::Hidden;
        assert_eq!(edit_event(c).comment, COMMENT_HIDDEN);
    }

    #[test]
    fn block_events_map_kind_and_expiry() {
        let block: BlockLogEntry = BlockEvent::new("Wilma", dt(2020, 2, 1), 1001, None)
            .expect("valid")
            .into();
        let event = block_event(block);
        assert_eq!(
            (event.description.as_str(), event.details.as_str(), event.title.as_str()),
            ("block", "", "indef")
        );
        assert_eq!(event.user_name, "Wilma");
        assert_eq!(event.id, 1001);

        let reblock: BlockLogEntry =
            BlockEvent::reblock("Wilma", dt(2020, 2, 1), 1002, Some(dt(2020, 3, 1)))
                .expect("valid")
                .into();
        let event = block_event(reblock);
        assert_eq!(event.details, "reblock");
        assert_eq!(event.title, "2020-03-01T00:00:00Z");

        let unblock: BlockLogEntry = UnblockEvent::new("Wilma", dt(2020, 2, 2), 1003).into();
        assert_eq!(block_event(unblock).description, "unblock");
    }

    #[test]
    fn unrecognized_block_entry_is_marked_unknown() {
        let entry = BlockLogEntry::Unrecognized(UnrecognizedAction {
            target: "Wilma".into(),
            timestamp: dt(2020, 2, 3),
            id: 1004,
            action: "frobnicate".into(),
        });
        let event = block_event(entry);
        assert_eq!(
            (event.description.as_str(), event.details.as_str(), event.title.as_str()),
            ("block", "unknown", "")
        );
        assert_eq!(event.id, 1004);
        assert_eq!(event.user_name, "Wilma");
    }

    const BLOCK_FIXTURE: &str = r#"{
        "blocks": [
            {"id": 7, "target": "Fred", "timestamp": "2020-01-10T00:00:00Z", "action": "frobnicate"},
            {"id": 8, "target": "Fred", "timestamp": "2020-02-01T00:00:00Z", "action": "reblock",
             "expiry": "2020-03-01T00:00:00Z"},
            {"id": 9, "target": "Fred", "timestamp": "2020-01-01T00:00:00Z", "action": "block"}
        ]
    }"#;

    /// Serves blocks oldest first, against the trait's ordering promise.
    struct OldestFirstBlocks(FixtureSource);

    impl WikiSource for OldestFirstBlocks {
        fn user_contributions(
            &self,
            user_names: &[String],
            end: Option<DateTime<Utc>>,
        ) -> Result<Vec<Contribution>, FetchError> {
            self.0.user_contributions(user_names, end)
        }

        fn deleted_user_contributions(
            &self,
            user_name: &str,
        ) -> Result<Vec<Contribution>, FetchError> {
            self.0.deleted_user_contributions(user_name)
        }

        fn user_blocks(&self, user_name: &str) -> Result<Vec<BlockLogEntry>, FetchError> {
            let mut blocks = self.0.user_blocks(user_name)?;
            blocks.reverse();
            Ok(blocks)
        }

        fn user_log_events(&self, user_name: &str) -> Result<Vec<LogEvent>, FetchError> {
            self.0.user_log_events(user_name)
        }

        fn page_creations(&self, user_names: &[String]) -> Result<Vec<Contribution>, FetchError> {
            self.0.page_creations(user_names)
        }

        fn page_exists(&self, title: &str) -> Result<bool, FetchError> {
            self.0.page_exists(title)
        }

        fn page_revisions(
            &self,
            title: &str,
            limit: usize,
        ) -> Result<Vec<Contribution>, FetchError> {
            self.0.page_revisions(title, limit)
        }
    }

    fn block_rows(timeline: &Timeline) -> Vec<(u64, &str, &str, &str)> {
        timeline
            .events
            .iter()
            .map(|e| {
                (
                    e.id,
                    e.description.as_str(),
                    e.details.as_str(),
                    e.title.as_str(),
                )
            })
            .collect()
    }

    #[test]
    fn timeline_maps_every_block_kind() {
        let source = FixtureSource::from_json(BLOCK_FIXTURE).expect("fixture");
        let cache = ContribCache::new(MemoryStore::new());
        let timeline = build_timeline(&["Fred".to_string()], &cache, &source).expect("timeline");
        assert_eq!(
            block_rows(&timeline),
            vec![
                (8, "block", "reblock", "2020-03-01T00:00:00Z"),
                (7, "block", "unknown", ""),
                (9, "block", "", "indef"),
            ]
        );
    }

    #[test]
    fn blocks_are_ordered_whatever_the_source_order() {
        let source =
            OldestFirstBlocks(FixtureSource::from_json(BLOCK_FIXTURE).expect("fixture"));
        let cache = ContribCache::new(MemoryStore::new());
        let timeline = build_timeline(&["Fred".to_string()], &cache, &source).expect("timeline");
        let ids: Vec<u64> = timeline.events.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![8, 7, 9]);
        assert!(
            timeline
                .events
                .is_sorted_by(|a, b| a.timestamp >= b.timestamp)
        );
    }

    #[test]
    fn log_event_defaults_suppressed_fields() {
        let event = log_event(LogEvent {
            id: 1,
            timestamp: dt(2020, 1, 1),
            user_name: "Fred".into(),
            title: None,
            log_type: "create".into(),
            action: None,
            comment: None,
        });
        assert_eq!(event.description, "create");
        assert_eq!(event.details, "");
        assert_eq!(event.title, "");
        assert_eq!(event.comment, COMMENT_HIDDEN);
    }

    #[test]
    fn events_order_by_timestamp_first() {
        let older = edit_event(contrib(999, dt(2020, 1, 1), true, &[]));
        let newer = edit_event(contrib(1, dt(2020, 1, 2), true, &[]));
        assert!(newer > older);
    }
}

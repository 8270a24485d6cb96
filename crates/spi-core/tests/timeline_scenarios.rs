use chrono::{DateTime, TimeZone, Utc};
use spi_core::cache::{ContribCache, MemoryStore};
use spi_core::model::COMMENT_HIDDEN;
use spi_core::source::FixtureSource;
use spi_core::timeline::{TimelineEvent, build_timeline};

const TWO_USERS: &str = r#"{
    "contributions": [
        {"rev_id": 101, "timestamp": "2020-01-01T00:00:00Z", "user_name": "Fred",
         "namespace": 0, "title": "Title", "comment": "comment", "tags": ["tag1"]},
        {"rev_id": 102, "timestamp": "2020-01-02T00:00:00Z", "user_name": "Fred",
         "namespace": 0, "title": "Title", "comment": "comment", "is_live": false,
         "tags": ["tag1", "tag2"]},
        {"rev_id": 103, "timestamp": "2020-01-03T00:00:00Z", "user_name": "Fred",
         "namespace": 0, "title": "Title", "comment": "comment"},
        {"rev_id": 201, "timestamp": "2020-01-02T12:00:00Z", "user_name": "Wilma",
         "namespace": 1, "title": "Talk:Title", "comment": null}
    ],
    "blocks": [
        {"id": 1001, "target": "Wilma", "timestamp": "2020-02-01T00:00:00Z", "action": "block"}
    ],
    "log_events": [
        {"id": 1002, "timestamp": "2019-11-29T00:00:00Z", "user_name": "Fred",
         "title": "Fred-sock", "type": "newusers", "action": "create2", "comment": "testing"},
        {"id": 1003, "timestamp": "2019-12-15T00:00:00Z", "user_name": "Wilma",
         "type": "create", "action": null, "comment": null}
    ]
}"#;

fn users(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

fn dt(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0)
        .single()
        .expect("valid date")
}

#[allow(clippy::too_many_arguments)]
fn event(
    timestamp: DateTime<Utc>,
    id: u64,
    user: &str,
    description: &str,
    details: &str,
    title: &str,
    comment: &str,
    extra: &str,
) -> TimelineEvent {
    TimelineEvent {
        timestamp,
        id,
        user_name: user.into(),
        description: description.into(),
        details: details.into(),
        title: title.into(),
        comment: comment.into(),
        extra: extra.into(),
    }
}

#[test]
fn two_users_merge_into_one_descending_sequence() {
    let source = FixtureSource::from_json(TWO_USERS).expect("fixture");
    let cache = ContribCache::new(MemoryStore::new());

    let timeline = build_timeline(&users(&["Fred", "Wilma"]), &cache, &source).expect("timeline");

    assert_eq!(
        timeline.events,
        vec![
            event(dt(2020, 2, 1, 0), 1001, "Wilma", "block", "", "indef", "", ""),
            event(dt(2020, 1, 3, 0), 103, "Fred", "edit", "", "Title", "comment", ""),
            event(dt(2020, 1, 2, 12), 201, "Wilma", "edit", "", "Talk:Title", COMMENT_HIDDEN, ""),
            event(dt(2020, 1, 2, 0), 102, "Fred", "edit", "deleted", "Title", "comment", "tag1, tag2"),
            event(dt(2020, 1, 1, 0), 101, "Fred", "edit", "", "Title", "comment", "tag1"),
            event(dt(2019, 12, 15, 0), 1003, "Wilma", "create", "", "", COMMENT_HIDDEN, ""),
            event(dt(2019, 11, 29, 0), 1002, "Fred", "newusers", "create2", "Fred-sock", "testing", ""),
        ]
    );
    assert!(
        timeline
            .events
            .windows(2)
            .all(|w| w[0].timestamp > w[1].timestamp)
    );
}

#[test]
fn tag_table_has_a_row_per_user_with_zero_counts() {
    let source = FixtureSource::from_json(TWO_USERS).expect("fixture");
    let cache = ContribCache::new(MemoryStore::new());

    let timeline = build_timeline(&users(&["Wilma", "Fred"]), &cache, &source).expect("timeline");

    assert_eq!(timeline.tag_list, vec!["tag1", "tag2"]);
    assert_eq!(
        timeline.tag_table,
        vec![
            (
                "Wilma".to_string(),
                vec![("tag1".to_string(), 0), ("tag2".to_string(), 0)]
            ),
            (
                "Fred".to_string(),
                vec![("tag1".to_string(), 2), ("tag2".to_string(), 1)]
            ),
        ]
    );
}

#[test]
fn deleted_edits_are_skipped_without_permission() {
    let locked = TWO_USERS.replacen('{', r#"{"deleted_access": false,"#, 1);
    let source = FixtureSource::from_json(&locked).expect("fixture");
    let cache = ContribCache::new(MemoryStore::new());

    let timeline = build_timeline(&users(&["Fred"]), &cache, &source).expect("timeline");

    let ids: Vec<u64> = timeline.events.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![103, 101, 1002]);
    assert_eq!(timeline.tag_list, vec!["tag1"]);
}

#[test]
fn building_populates_the_contribution_cache() {
    let source = FixtureSource::from_json(TWO_USERS).expect("fixture");
    let cache = ContribCache::new(MemoryStore::new());

    build_timeline(&users(&["Fred", "Wilma"]), &cache, &source).expect("timeline");

    assert_eq!(cache.store().len().expect("len"), 2);
    let again = build_timeline(&users(&["Fred"]), &cache, &source).expect("timeline");
    assert_eq!(again.events.len(), 4);
}

#[test]
fn no_users_gives_an_empty_timeline() {
    let source = FixtureSource::from_json(TWO_USERS).expect("fixture");
    let cache = ContribCache::new(MemoryStore::new());
    let timeline = build_timeline(&[], &cache, &source).expect("timeline");
    assert!(timeline.events.is_empty());
    assert!(timeline.tag_list.is_empty());
    assert!(timeline.tag_table.is_empty());
}

#[test]
fn pipe_in_user_name_fails() {
    let source = FixtureSource::from_json(TWO_USERS).expect("fixture");
    let cache = ContribCache::new(MemoryStore::new());
    let err = build_timeline(&users(&["Fred|Wilma"]), &cache, &source).expect_err("invalid");
    assert_eq!(err.error_code().code(), "E4002");
}

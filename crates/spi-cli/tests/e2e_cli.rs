//! End-to-end tests for the `spi` binary against a JSON wiki snapshot.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

const WIKI: &str = r#"{
    "contributions": [
        {"rev_id": 1, "timestamp": "2020-01-01T00:00:00Z", "user_name": "Fred",
         "namespace": 0, "title": "Foo", "comment": "first", "tags": ["mw-reverted"],
         "creates_page": true},
        {"rev_id": 2, "timestamp": "2020-01-03T00:00:00Z", "user_name": "Wilma",
         "namespace": 0, "title": "Foo", "comment": "second"},
        {"rev_id": 3, "timestamp": "2020-01-05T00:00:00Z", "user_name": "Fred",
         "namespace": 0, "title": "Bar", "comment": "", "is_live": false},
        {"rev_id": 4, "timestamp": "2020-02-10T00:00:00Z", "user_name": "Sock",
         "namespace": 0, "title": "Baz", "comment": "new page", "creates_page": true}
    ],
    "blocks": [
        {"id": 10, "target": "Fred", "timestamp": "2020-02-01T00:00:00Z", "action": "block"},
        {"id": 11, "target": "Fred", "timestamp": "2020-03-01T00:00:00Z", "action": "unblock"}
    ],
    "pages": ["Foo", "Baz"],
    "case_ips": [
        {"ip": "100.0.0.1", "date": "2020-01-01", "page_title": "Wikipedia:Sockpuppet investigations/Fred"},
        {"ip": "100.0.0.3", "date": "2020-01-02", "page_title": "Wikipedia:Sockpuppet investigations/Fred"},
        {"ip": "100.0.0.4", "date": "2020-01-03", "page_title": "Wikipedia:Sockpuppet investigations/Fred/Archive"},
        {"ip": "100.0.0.5", "date": "2020-01-04", "page_title": "Wikipedia:Sockpuppet investigations/Fred"},
        {"ip": "10.1.1.1", "date": "2020-01-05", "page_title": "Wikipedia:Sockpuppet investigations/Other"}
    ],
    "case_users": [
        {"username": "Fred", "page_title": "Wikipedia:Sockpuppet investigations/Fred"},
        {"username": "Sock", "date": "2020-02-11", "page_title": "Wikipedia:Sockpuppet investigations/Fred"},
        {"username": "Sock", "date": "2020-02-11", "page_title": "Wikipedia:Sockpuppet investigations/Fred/Archive"},
        {"username": "Wilma", "date": "2020-01-04", "page_title": "Wikipedia:Sockpuppet investigations/Fred/Archive"}
    ],
    "open_cases": [
        "Wikipedia:Sockpuppet investigations/Fred",
        "Wikipedia:Sockpuppet investigations/Fred/Archive",
        "Wikipedia:Sockpuppet investigations/Other"
    ]
}"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("wiki.json"), WIKI).expect("write fixture");
        std::fs::write(dir.path().join("config.toml"), "").expect("write config");
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn cache_path(&self) -> PathBuf {
        self.path("cache.sqlite3")
    }

    /// `spi` with the fixture, an empty config and an isolated cache.
    fn spi(&self) -> Command {
        let mut cmd = bare_spi(&self.path("config.toml"));
        cmd.arg("--fixture")
            .arg(self.path("wiki.json"))
            .arg("--cache")
            .arg(self.cache_path());
        cmd
    }
}

fn bare_spi(config: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("spi"));
    cmd.env("SPI_LOG", "error")
        .env_remove("SPI_FIXTURE")
        .env_remove("SPI_FORMAT")
        .env_remove("SPI_USE_CACHE")
        .env_remove("SPI_TIMING")
        .arg("--config")
        .arg(config);
    cmd
}

fn json_stdout(cmd: &mut Command) -> Value {
    let out = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&out).expect("stdout is JSON")
}

#[test]
fn cidr_text_prints_covering_network() {
    let ws = Workspace::new();
    ws.spi()
        .args(["--format", "text", "cidr", "100.0.0.1", "100.0.0.3", "100.0.0.4", "100.0.0.5"])
        .assert()
        .success()
        .stdout("100.0.0.0/29\n");
}

#[test]
fn cidr_json_reports_prefix() {
    let ws = Workspace::new();
    let json = json_stdout(ws.spi().args(["--format", "json", "cidr", "10.0.0.1", "10.0.0.2"]));
    assert_eq!(json["network"], "10.0.0.0/30");
    assert_eq!(json["prefix_len"], 30);
    assert_eq!(json["address_count"], 2);
}

#[test]
fn cidr_without_addresses_fails_with_code() {
    let ws = Workspace::new();
    ws.spi()
        .args(["--format", "text", "cidr"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2001"));
}

#[test]
fn cidr_mixed_families_fails_as_json() {
    let ws = Workspace::new();
    let out = ws
        .spi()
        .args(["--format", "json", "cidr", "10.0.0.1", "::1"])
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let json: Value = serde_json::from_slice(&out).expect("stderr is JSON");
    assert_eq!(json["error"]["error_code"], "E2002");
}

#[test]
fn timeline_json_merges_users_newest_first() {
    let ws = Workspace::new();
    let json = json_stdout(ws.spi().args(["--format", "json", "timeline", "Fred", "Wilma"]));

    let events = json["events"].as_array().expect("events array");
    let kinds: Vec<(&str, &str, u64)> = events
        .iter()
        .map(|e| {
            (
                e["user_name"].as_str().expect("user"),
                e["description"].as_str().expect("description"),
                e["id"].as_u64().expect("id"),
            )
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("Fred", "unblock", 11),
            ("Fred", "block", 10),
            ("Fred", "edit", 3),
            ("Wilma", "edit", 2),
            ("Fred", "edit", 1),
        ]
    );
    assert_eq!(events[2]["details"], "deleted");
    assert_eq!(events[1]["title"], "indef");

    assert_eq!(json["tag_list"], serde_json::json!(["mw-reverted"]));
    assert_eq!(
        json["tag_table"],
        serde_json::json!([["Fred", [["mw-reverted", 1]]], ["Wilma", [["mw-reverted", 0]]]])
    );
}

#[test]
fn timeline_text_is_tab_separated() {
    let ws = Workspace::new();
    let out = ws
        .spi()
        .args(["--no-cache", "--format", "text", "timeline", "Wilma"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).expect("utf8");
    assert_eq!(text, "2020-01-03T00:00:00Z\t2\tWilma\tedit\t\tFoo\tsecond\t\n");
}

#[test]
fn timeline_rejects_invalid_user_name() {
    let ws = Workspace::new();
    ws.spi()
        .args(["--format", "text", "timeline", "Bad|Name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E4002"));
}

#[test]
fn pages_json_counts_edits() {
    let ws = Workspace::new();
    let json = json_stdout(ws.spi().args(["--format", "json", "pages", "Fred", "Wilma"]));
    assert_eq!(json["edit_counts"]["Foo"], 2);
    assert_eq!(json["edit_counts"]["Bar"], 1);
    assert_eq!(json["editor_counts"]["Foo"], 2);
    assert_eq!(json["reverted_counts"], serde_json::json!({ "Foo": 1 }));
}

#[test]
fn blocked_follows_unblocks() {
    let ws = Workspace::new();
    ws.spi()
        .args(["--format", "text", "blocked", "Fred", "--at", "2020-02-15T00:00:00Z"])
        .assert()
        .success()
        .stdout("blocked\n");
    ws.spi()
        .args(["--format", "text", "blocked", "Fred", "--at", "2020-03-15T00:00:00Z"])
        .assert()
        .success()
        .stdout("not blocked\n");
}

#[test]
fn legacy_blocked_ignores_unblocks() {
    let ws = Workspace::new();
    let json = json_stdout(ws.spi().args([
        "--format",
        "json",
        "blocked",
        "Fred",
        "--at",
        "2020-03-15T00:00:00Z",
        "--legacy",
    ]));
    assert_eq!(json["blocked"], true);
    assert_eq!(json["model"], "intervals");
    assert_eq!(json["entries"], 2);
}

#[test]
fn g5_lists_pages_created_during_block() {
    let ws = Workspace::new();
    let json = json_stdout(ws.spi().args(["--format", "json", "g5", "Fred", "Sock"]));
    let found = json.as_array().expect("array");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["title"], "Baz");
    assert_eq!(found[0]["user"], "Sock");
    assert_eq!(found[0]["score"]["rating"], "likely");
    assert_eq!(found[0]["score"]["reason"], "only one editor");
}

#[test]
fn ips_for_case_include_archive() {
    let ws = Workspace::new();
    let json = json_stdout(ws.spi().args(["--format", "json", "ips", "--case", "Fred"]));
    assert_eq!(json["case"], "Fred");
    assert_eq!(json["network"], "100.0.0.0/29");
    assert_eq!(json["addresses"].as_array().expect("addresses").len(), 4);
}

#[test]
fn ips_for_unknown_case_has_no_network() {
    let ws = Workspace::new();
    let json = json_stdout(ws.spi().args(["--format", "json", "ips", "--case", "Nobody"]));
    assert_eq!(json["network"], Value::Null);
    assert_eq!(json["addresses"], serde_json::json!([]));
}

#[test]
fn cases_lists_open_case_names() {
    let ws = Workspace::new();
    ws.spi()
        .args(["--format", "text", "cases"])
        .assert()
        .success()
        .stdout("Fred\nOther\n");
}

#[test]
fn users_are_deduplicated_across_archive() {
    let ws = Workspace::new();
    let json = json_stdout(ws.spi().args(["--format", "json", "users", "Fred"]));
    assert_eq!(json["case"], "Fred");
    assert_eq!(
        json["users"],
        serde_json::json!([
            {"username": "Fred", "date": null},
            {"username": "Sock", "date": "2020-02-11"},
            {"username": "Wilma", "date": "2020-01-04"}
        ])
    );
}

#[test]
fn cache_stats_and_clear() {
    let ws = Workspace::new();
    ws.spi()
        .args(["--format", "text", "timeline", "Fred", "Wilma"])
        .assert()
        .success();
    assert!(ws.cache_path().exists());

    let stats = json_stdout(ws.spi().args(["--format", "json", "cache", "stats"]));
    assert_eq!(stats["entries"], 2);
    assert_eq!(stats["enabled"], true);
    assert!(stats["value_bytes"].as_u64().expect("bytes") > 0);

    let cleared = json_stdout(ws.spi().args(["--format", "json", "cache", "clear"]));
    assert_eq!(cleared["removed"], 2);

    let stats = json_stdout(ws.spi().args(["--format", "json", "cache", "stats"]));
    assert_eq!(stats["entries"], 0);
}

#[test]
fn no_cache_leaves_no_database() {
    let ws = Workspace::new();
    ws.spi()
        .args(["--no-cache", "--format", "text", "timeline", "Fred"])
        .assert()
        .success();
    assert!(!ws.cache_path().exists());
}

#[test]
fn use_cache_env_disables_cache() {
    let ws = Workspace::new();
    ws.spi()
        .env("SPI_USE_CACHE", "0")
        .args(["--format", "text", "timeline", "Fred"])
        .assert()
        .success();
    assert!(!ws.cache_path().exists());
}

#[test]
fn missing_fixture_is_reported() {
    let ws = Workspace::new();
    bare_spi(&ws.path("config.toml"))
        .args(["--format", "text", "timeline", "Fred"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--fixture"));
}

#[test]
fn malformed_fixture_has_code() {
    let ws = Workspace::new();
    std::fs::write(ws.path("broken.json"), "{ not json").expect("write");
    bare_spi(&ws.path("config.toml"))
        .arg("--fixture")
        .arg(ws.path("broken.json"))
        .args(["--no-cache", "--format", "text", "timeline", "Fred"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1002"));
}

#[test]
fn malformed_config_has_code() {
    let ws = Workspace::new();
    std::fs::write(ws.path("bad.toml"), "[cache\nenabled = ").expect("write");
    bare_spi(&ws.path("bad.toml"))
        .args(["--format", "text", "cidr", "10.0.0.1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1001"));
}

#[test]
fn config_output_mode_applies() {
    let ws = Workspace::new();
    std::fs::write(ws.path("json.toml"), "output = \"json\"\n").expect("write");
    let mut cmd = bare_spi(&ws.path("json.toml"));
    let json = json_stdout(cmd.args(["cidr", "10.0.0.1"]));
    assert_eq!(json["network"], "10.0.0.1/32");
}

#[test]
fn timing_report_goes_to_stderr() {
    let ws = Workspace::new();
    ws.spi()
        .args(["--timing", "--format", "text", "cidr", "10.0.0.1"])
        .assert()
        .success()
        .stdout("10.0.0.1/32\n")
        .stderr(predicate::str::contains("cmd.cidr"));
}

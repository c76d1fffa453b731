use assert_cmd::prelude::*;
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

fn has_git() -> bool {
    Command::new("git").arg("--version").output().is_ok()
}

fn git(dir: &Path, args: &[&str]) {
    assert!(Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .unwrap()
        .success());
}

fn init_git_repo(dir: &Path) {
    git(dir, &["init"]);
    git(dir, &["config", "core.autocrlf", "false"]);
    git(dir, &["config", "user.email", "you@example.com"]);
    git(dir, &["config", "user.name", "Your Name"]);
    git(dir, &["config", "tag.gpgsign", "false"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
}

fn commit_file(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut f = File::create(&path).unwrap();
    f.write_all(content.as_bytes()).unwrap();
    f.sync_all().unwrap();
    git(dir, &["add", "."]);
    git(dir, &["commit", "-m", &format!("add {name}")]);
}

fn days_ago(days: i64) -> String {
    (Utc::now() - Duration::days(days))
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}

fn write_dump(dir: &Path) -> PathBuf {
    let records = [
        json!({
            "category": "issue",
            "data": {
                "number": 1,
                "user": { "login": "alice" },
                "state": "open",
                "created_at": days_ago(40),
                "updated_at": days_ago(3),
                "closed_at": null,
                "comments_data": []
            }
        }),
        json!({
            "category": "issue",
            "data": {
                "number": 2,
                "user": { "login": "bob" },
                "state": "open",
                "created_at": days_ago(10),
                "updated_at": days_ago(2),
                "pull_request": { "url": "https://api.github.com/repos/acme/widgets/pulls/2" }
            }
        }),
        json!({
            "category": "pull_request",
            "data": {
                "number": 2,
                "title": "Add widgets",
                "user": { "login": "bob" },
                "state": "closed",
                "created_at": days_ago(10),
                "updated_at": days_ago(2),
                "closed_at": days_ago(2),
                "merged": true,
                "merged_at": days_ago(2),
                "comments": 2,
                "review_comments": 1,
                "reviews_data": [
                    { "user_data": { "login": "alice" }, "submitted_at": days_ago(5) }
                ]
            }
        }),
    ];
    let path = dir.join("dump.jsonl");
    let mut file = File::create(&path).unwrap();
    for record in records {
        writeln!(file, "{record}").unwrap();
    }
    path
}

fn run_json(dir: &Path, args: &[&str]) -> Value {
    let mut cmd = Command::cargo_bin("repometrics").unwrap();
    cmd.current_dir(dir).arg("--repo").arg(dir).args(args);
    let out = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&out).unwrap()
}

#[test]
fn releases_json_samples_tags() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    for i in 1..=8 {
        commit_file(dir.path(), "CHANGELOG", &format!("v0.{i}\n"));
        git(dir.path(), &["tag", &format!("v0.{i}")]);
    }

    let v = run_json(dir.path(), &["releases", "--json", "--max-releases", "4"]);
    assert_eq!(v["num_tags"], 8);
    assert_eq!(v["max_releases"], 4);
    let sampled: Vec<&str> = v["sampled"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(sampled.first(), Some(&"v0.1"));
    assert_eq!(sampled.last(), Some(&"v0.8"));
    assert!(sampled.len() < 8);
}

#[test]
fn releases_rejects_tiny_sample_size() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_file(dir.path(), "a.txt", "a\n");

    let mut cmd = Command::cargo_bin("repometrics").unwrap();
    cmd.current_dir(dir.path())
        .arg("--repo")
        .arg(dir.path())
        .args(["releases", "--max-releases", "1"]);
    cmd.assert().failure();
}

#[test]
fn commits_json_tallies_authors() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_file(dir.path(), "src/a.rs", "fn a(){}\n");
    commit_file(dir.path(), "src/b.rs", "fn b(){}\n");

    let v = run_json(dir.path(), &["commits", "--json"]);
    assert_eq!(v["commits_per_author"]["all_time"]["total"], 2);
    assert_eq!(v["commits_per_author"]["all_time"]["top_25"][0]["name"], "Your Name");
    assert_eq!(v["commits_per_month"][0]["commits"], 2);
}

#[test]
fn history_json_reads_dump_and_fills_cache() {
    let dir = tempdir().unwrap();
    let dump = write_dump(dir.path());
    let cache = dir.path().join("cache");

    let mut cmd = Command::cargo_bin("repometrics").unwrap();
    cmd.current_dir(dir.path())
        .arg("--cache")
        .arg(&cache)
        .args(["history", "--json", "--slug", "acme/widgets", "--dump"])
        .arg(&dump);
    let out = cmd.assert().success().get_output().stdout.clone();
    let v: Value = serde_json::from_slice(&out).unwrap();

    assert_eq!(v["repository"], "acme/widgets");
    let issues = v["issues"].as_object().unwrap();
    assert_eq!(issues.keys().map(String::as_str).collect::<Vec<_>>(), vec!["1"]);
    let pr = &v["pull_requests"]["2"];
    assert_eq!(pr["approve_state"], "approve");
    assert_eq!(pr["reviewers"], json!(["alice"]));
    assert!(cache.join("cache.db").is_file());

    // a second run against an empty capture is served from the cache
    let empty = dir.path().join("empty.jsonl");
    File::create(&empty).unwrap();
    let mut cmd = Command::cargo_bin("repometrics").unwrap();
    cmd.current_dir(dir.path())
        .arg("--cache")
        .arg(&cache)
        .args(["history", "--json", "--slug", "acme/widgets", "--dump"])
        .arg(&empty);
    let out = cmd.assert().success().get_output().stdout.clone();
    let again: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(again["issues"], v["issues"]);
    assert_eq!(again["pull_requests"], v["pull_requests"]);
}

#[test]
fn history_rejects_bad_slug() {
    let dir = tempdir().unwrap();
    let dump = write_dump(dir.path());

    let mut cmd = Command::cargo_bin("repometrics").unwrap();
    cmd.current_dir(dir.path())
        .arg("--cache")
        .arg(dir.path().join("cache"))
        .args(["history", "--slug", "not a slug", "--dump"])
        .arg(&dump);
    cmd.assert().failure();
}

#[test]
fn heat_json_outputs_buckets() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_file(dir.path(), "src/a.rs", "fn a(){}\n");
    let dump = write_dump(dir.path());

    let v = run_json(
        dir.path(),
        &[
            "--lookback-weeks",
            "8",
            "heat",
            "--json",
            "--slug",
            "acme/widgets",
            "--dump",
            dump.to_str().unwrap(),
        ],
    );
    let buckets = v["buckets"].as_array().unwrap();
    assert_eq!(buckets.len(), 8);
    let total = |pick: fn(&Value) -> u64| buckets.iter().map(pick).sum::<u64>();
    assert_eq!(total(|b| b["commits"]["created"].as_u64().unwrap()), 1);
    assert_eq!(total(|b| b["pull_requests"]["merged"].as_u64().unwrap()), 1);
    assert_eq!(total(|b| b["pull_requests"]["created"].as_u64().unwrap()), 1);
}

#[test]
fn unusable_log_file_is_reported() {
    let dir = tempdir().unwrap();
    let dump = write_dump(dir.path());
    let log_file = dir.path().join("missing").join("run.log");

    let mut cmd = Command::cargo_bin("repometrics").unwrap();
    cmd.current_dir(dir.path())
        .arg("--cache")
        .arg(dir.path().join("cache"))
        .arg("--log-file")
        .arg(&log_file)
        .args(["history", "--json", "--slug", "acme/widgets", "--dump"])
        .arg(&dump);
    let out = cmd.assert().success().get_output().stderr.clone();
    let stderr = String::from_utf8(out).unwrap();
    assert!(stderr.contains("cannot open log file"), "stderr was: {stderr}");
    assert!(!log_file.exists());
}

//! CLI Integration Tests
//!
//! These tests verify the CLI commands work correctly end-to-end.
//! They test the "wiring" between the CLI and the core library.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// Create a CLI command with temporary data and remote directories
fn cli_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("contentcfg").expect("Failed to find contentcfg binary");
    cmd.arg("--data-dir")
        .arg(dir.path().join("data"))
        .arg("--remote-dir")
        .arg(dir.path().join("remote"));
    cmd
}

fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

// ============================================================================
// Normalize Command Tests
// ============================================================================

#[test]
fn test_normalize_from_stdin() {
    let dir = TempDir::new().unwrap();

    cli_cmd(&dir)
        .args(["normalize", "popups"])
        .write_stdin(r#"[{"id":"p1","title":"  Hello  ","dismissDays":9999}]"#)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""maxDisplayCount": 1"#))
        .stdout(predicate::str::contains(r#""title": "Hello""#))
        .stdout(predicate::str::contains(r#""dismissDays": 365"#));
}

#[test]
fn test_normalize_garbage_prints_default() {
    let dir = TempDir::new().unwrap();

    cli_cmd(&dir)
        .args(["normalize", "banners"])
        .write_stdin("not json at all")
        .assert()
        .success()
        .stdout(predicate::str::contains("notice-welcome"));
}

#[test]
fn test_unknown_kind_is_rejected() {
    let dir = TempDir::new().unwrap();

    cli_cmd(&dir)
        .args(["show", "carousels"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown configuration kind"));
}

// ============================================================================
// Push / Pull / Show Tests
// ============================================================================

#[test]
fn test_push_then_show() {
    let dir = TempDir::new().unwrap();
    let file = write_file(
        dir.path(),
        "slots.json",
        r#"[{"id":"weekly","title":"Weekly picks","contentPicks":[{"type":"character","item":{"id":"c1","name":"Aria"}}]}]"#,
    );

    cli_cmd(&dir)
        .args(["push", "slots", "--file"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved slots"));

    assert!(dir.path().join("remote").join("slots.json").exists());

    cli_cmd(&dir)
        .args(["show", "slots"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Weekly picks"))
        .stdout(predicate::str::contains("Aria"));
}

#[test]
fn test_push_rejects_inverted_window() {
    let dir = TempDir::new().unwrap();
    let file = write_file(
        dir.path(),
        "banners.json",
        r#"[{"id":"b","title":"Backwards","startAt":2000,"endAt":1000}]"#,
    );

    cli_cmd(&dir)
        .args(["push", "banners", "--file"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("ends before it starts"));

    assert!(!dir.path().join("remote").join("banners.json").exists());
}

#[test]
fn test_pull_keeps_local_edits_over_unconfigured_remote() {
    let dir = TempDir::new().unwrap();
    let file = write_file(dir.path(), "tags.json", r#"{"prioritySlugs":["romance"]}"#);

    cli_cmd(&dir)
        .args(["push", "tag_display", "--file"])
        .arg(&file)
        .assert()
        .success();

    // The remote is wiped back to its unconfigured state.
    std::fs::remove_file(dir.path().join("remote").join("tag_display.json")).unwrap();

    cli_cmd(&dir)
        .args(["pull", "--kind", "tag_display"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kept local edits"));

    cli_cmd(&dir)
        .args(["tags", "action", "romance"])
        .assert()
        .success()
        .stdout("romance\naction\n");
}

#[test]
fn test_pull_applies_configured_remote() {
    let dir = TempDir::new().unwrap();
    let remote = dir.path().join("remote");
    std::fs::create_dir_all(&remote).unwrap();
    write_file(&remote, "banners.json", r#"[{"id":"spring","title":"Spring","order":1}]"#);

    cli_cmd(&dir)
        .arg("pull")
        .assert()
        .success()
        .stdout(predicate::str::contains("banners: applied remote config"))
        .stdout(predicate::str::contains("popups: applied remote config"));

    cli_cmd(&dir)
        .args(["active", "banners", "--device", "mobile"])
        .assert()
        .success()
        .stdout(predicate::str::contains("spring  Spring"));
}

// ============================================================================
// Active Command Tests
// ============================================================================

#[test]
fn test_active_respects_window() {
    let dir = TempDir::new().unwrap();
    let file = write_file(
        dir.path(),
        "banners.json",
        r#"[{"id":"launch","title":"Launch","startAt":"2024-05-01T00:00:00Z","endAt":"2024-05-31T23:59:59Z"}]"#,
    );
    cli_cmd(&dir)
        .args(["push", "banners", "--file"])
        .arg(&file)
        .assert()
        .success();

    cli_cmd(&dir)
        .args(["active", "banners", "--at", "2024-05-15T12:00:00Z"])
        .assert()
        .success()
        .stdout(predicate::str::contains("launch  Launch"));

    cli_cmd(&dir)
        .args(["active", "banners", "--at", "2024-06-01T00:00:00Z"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No active banners"));
}

#[test]
fn test_active_tag_display_is_an_error() {
    let dir = TempDir::new().unwrap();

    cli_cmd(&dir)
        .args(["active", "tag_display"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("use `tags` instead"));
}

// ============================================================================
// Dismissal Tests
// ============================================================================

#[test]
fn test_dismissal_is_per_user() {
    let dir = TempDir::new().unwrap();

    cli_cmd(&dir)
        .args(["--user", "alice", "dismiss", "spring-event", "--days", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dismissed spring-event until"));

    cli_cmd(&dir)
        .args(["--user", "alice", "dismissed", "spring-event"])
        .assert()
        .success()
        .stdout("spring-event: dismissed\n");

    cli_cmd(&dir)
        .args(["--user", "bob", "dismissed", "spring-event"])
        .assert()
        .success()
        .stdout("spring-event: not dismissed\n");
}

#[test]
fn test_dismiss_unknown_popup_without_days_fails() {
    let dir = TempDir::new().unwrap();

    cli_cmd(&dir)
        .args(["dismiss", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown popup 'ghost'"));
}

// ============================================================================
// Status and Config Tests
// ============================================================================

#[test]
fn test_status_reports_cache() {
    let dir = TempDir::new().unwrap();

    cli_cmd(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Content Configuration"))
        .stdout(predicate::str::contains("banners: empty"))
        .stdout(predicate::str::contains("User: anonymous"));
}

#[test]
fn test_config_file_sets_fallback_tag_order() {
    let dir = TempDir::new().unwrap();
    let config = write_file(
        dir.path(),
        "engine.json",
        r#"{"fallback_tag_priority":["comedy"],"user_scope":"carol"}"#,
    );

    cli_cmd(&dir)
        .arg("--config")
        .arg(&config)
        .args(["tags", "action", "__internal", "comedy"])
        .assert()
        .success()
        .stdout("comedy\naction\n");

    cli_cmd(&dir)
        .arg("--config")
        .arg(&config)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("User: carol"));
}

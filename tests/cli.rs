//! CLI integration tests for bitadmin.
//!
//! Each test points the cache and the profile lookup at an isolated temp
//! directory, so tests can run in parallel and never reach a server.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use std::path::Path;

use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;
use serde_json::{Value, json};

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn cache_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes a cache with two users, two projects and three repositories.
    fn with_fixture(self) -> Self {
        let repo = |project: &str, slug: &str| {
            json!({
                "id": 1,
                "slug": slug,
                "name": slug,
                "project": { "id": 1, "key": project, "name": project },
                "links": { "self": [{ "href": format!("https://bb.example.com/projects/{project}/repos/{slug}/browse") }] }
            })
        };
        let snapshot = json!({
            "users": [
                { "id": 1, "name": "alice", "slug": "alice", "displayName": "Alice A", "emailAddress": "alice@example.com" },
                { "id": 2, "name": "bob", "slug": "bob", "displayName": "Bob B", "emailAddress": "bob@example.com" }
            ],
            "projects": [
                { "id": 1, "key": "PRJ", "name": "Project" },
                { "id": 2, "key": "OPS", "name": "Operations" }
            ],
            "repositories": [repo("PRJ", "app"), repo("OPS", "app"), repo("OPS", "infra")]
        });
        self.temp_dir
            .child("cache")
            .write_str(&snapshot.to_string())
            .expect("failed to write cache fixture");
        self
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("bitadmin").expect("failed to find binary");
        cmd.env("NO_COLOR", "1")
            .env("HOME", self.temp_dir.path())
            .env("XDG_CONFIG_HOME", self.temp_dir.path().join("config"))
            .env_remove("BITADMIN_URL")
            .env_remove("BITADMIN_USER")
            .env_remove("BITADMIN_PASSWORD_FILE")
            .env_remove("RUST_LOG")
            .env("BITADMIN_CACHE_DIR", self.cache_dir());
        cmd
    }
}

#[test]
fn test_help_lists_command_groups() {
    let ctx = TestContext::new();
    ctx.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("cache"))
        .stdout(predicate::str::contains("repository"))
        .stdout(predicate::str::contains("hooks"));
}

#[test]
fn test_cache_dump_text() {
    let ctx = TestContext::new().with_fixture();
    ctx.cmd()
        .args(["cache", "dump"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "user 1 - alice@example.com - alice - Alice A - alice",
        ))
        .stdout(predicate::str::contains("project PRJ - Project"))
        .stdout(predicate::str::contains(
            "repository OPS/infra - infra - https://bb.example.com/projects/OPS/repos/infra/browse",
        ));
}

#[test]
fn test_cache_dump_json() {
    let ctx = TestContext::new().with_fixture();
    let output = ctx
        .cmd()
        .args(["cache", "dump", "--json"])
        .output()
        .expect("failed to run command");
    assert!(output.status.success());

    let dump: Value = serde_json::from_slice(&output.stdout).expect("invalid JSON");
    assert_eq!(dump["users"].as_array().map(Vec::len), Some(2));
    assert_eq!(dump["projects"][1]["key"], "OPS");
    assert_eq!(dump["repositories"].as_array().map(Vec::len), Some(3));
}

#[test]
fn test_cache_dump_without_cache_is_empty() {
    let ctx = TestContext::new();
    ctx.cmd()
        .args(["cache", "dump"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_cache_clear() {
    let ctx = TestContext::new().with_fixture();
    ctx.cmd()
        .args(["cache", "clear", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK] Cache cleared"));

    ctx.cmd()
        .args(["cache", "dump"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_cache_clear_requires_yes_when_not_interactive() {
    let ctx = TestContext::new().with_fixture();
    ctx.cmd()
        .args(["cache", "clear"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes is required"));
}

#[test]
fn test_complete_projects() {
    let ctx = TestContext::new().with_fixture();
    ctx.cmd()
        .args(["complete", "project"])
        .assert()
        .success()
        .stdout("PRJ\nOPS\n");
}

#[test]
fn test_complete_usernames() {
    let ctx = TestContext::new().with_fixture();
    ctx.cmd()
        .args(["complete", "username"])
        .assert()
        .success()
        .stdout("alice\nbob\n");
}

#[test]
fn test_complete_repositories_are_distinct() {
    let ctx = TestContext::new().with_fixture();
    ctx.cmd()
        .args(["complete", "repository"])
        .assert()
        .success()
        .stdout("app\ninfra\n");
}

#[test]
fn test_complete_unknown_flag_prints_nothing() {
    let ctx = TestContext::new().with_fixture();
    ctx.cmd()
        .args(["complete", "branch-ref"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_warmup_requires_url() {
    let ctx = TestContext::new();
    ctx.cmd()
        .args(["cache", "warmup"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("global flag --url is required"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_broken_profile_does_not_block_cache_commands() {
    let ctx = TestContext::new().with_fixture();
    ctx.temp_dir
        .child("config/bitadmin/config.toml")
        .write_str("url = ")
        .unwrap();

    ctx.cmd()
        .args(["complete", "project"])
        .assert()
        .success()
        .stdout("PRJ\nOPS\n");

    ctx.cmd()
        .args(["cache", "warmup"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("global flag --url is required"))
        .stderr(predicate::str::contains("profile file ignored"));
}

#[test]
fn test_missing_user_is_reported_after_url() {
    let ctx = TestContext::new();
    ctx.cmd()
        .args([
            "--url",
            "https://bb.example.com",
            "repository",
            "show-permissions",
            "--project",
            "PRJ",
            "--repository",
            "app",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("global flag --user is required"));
}

#[cfg(unix)]
#[test]
fn test_password_file_must_be_private() {
    use std::os::unix::fs::PermissionsExt;

    let ctx = TestContext::new();
    let password = ctx.temp_dir.child("password");
    password.write_str("secret\n").unwrap();
    std::fs::set_permissions(password.path(), std::fs::Permissions::from_mode(0o644)).unwrap();

    ctx.cmd()
        .arg("--url")
        .arg("https://bb.example.com")
        .arg("--user")
        .arg("admin")
        .arg("--password-file")
        .arg(password.path())
        .args(["cache", "warmup"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("wrong permission on password file"));
}

#[test]
fn test_set_default_reviewers_unknown_repository() {
    let ctx = TestContext::new().with_fixture();
    let password = ctx.temp_dir.child("password");
    password.write_str("secret").unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(password.path(), std::fs::Permissions::from_mode(0o600)).unwrap();
    }

    ctx.cmd()
        .arg("--url")
        .arg("https://bb.example.com")
        .arg("--user")
        .arg("admin")
        .arg("--password-file")
        .arg(password.path())
        .args([
            "repository",
            "set-default-reviewers",
            "--project",
            "PRJ",
            "--repository",
            "missing",
            "--branch-ref",
            "refs/heads/master",
            "--username",
            "alice",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("PRJ/missing"));
}

#[test]
fn test_invalid_restriction_type() {
    let ctx = TestContext::new();
    ctx.cmd()
        .args([
            "repository",
            "set-branch-restriction",
            "--project",
            "PRJ",
            "--repository",
            "app",
            "--restriction",
            "delete-everything",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_sonar_rejects_unknown_analysis_mode() {
    let ctx = TestContext::new();
    ctx.cmd()
        .args([
            "repository",
            "sonar",
            "--project",
            "PRJ",
            "--repository",
            "app",
            "--analysis-mode",
            "NIGHTLY",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"))
        .stderr(predicate::str::contains("BRANCH_DIFF"));
}

#[test]
fn test_completions_bash() {
    let ctx = TestContext::new();
    ctx.cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bitadmin"));
}

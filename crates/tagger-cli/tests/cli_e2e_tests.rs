//! Integration tests for the tagger CLI binary.
//!
//! These tests exercise the actual compiled binary using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

/// Get a Command for the tagger binary
fn tagger_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("tagger"))
}

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../test-fixtures/templates")
}

/// A scratch directory holding copies of the named fixtures.
fn workspace(names: &[&str]) -> TempDir {
    let temp = tempdir().unwrap();
    for name in names {
        fs::copy(fixtures_dir().join(name), temp.path().join(name)).unwrap();
    }
    temp
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_output() {
    tagger_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("tags"))
        .stdout(predicate::str::contains("list-resources"));
}

#[test]
fn test_version_output() {
    tagger_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tagger"));
}

#[test]
fn test_no_command_shows_help_hint() {
    tagger_cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("tagger --help"));
}

// ============================================================================
// tag
// ============================================================================

#[test]
fn test_tag_writes_golden_output() {
    let temp = workspace(&["ebs.yaml", "s3.template"]);

    tagger_cmd()
        .args(["tag", "--directory"])
        .arg(temp.path())
        .args(["--tag", "new_tag=new_value"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tagged"))
        .stdout(predicate::str::contains("2 template(s) scanned, 2 written"));

    assert_eq!(
        read(&temp.path().join("ebs.yaml")),
        read(&fixtures_dir().join("ebs_tagged.yaml"))
    );
    assert_eq!(
        read(&temp.path().join("s3.template")),
        read(&fixtures_dir().join("s3_tagged.template"))
    );
}

#[test]
fn test_tag_dry_run_leaves_files() {
    let temp = workspace(&["ebs.yaml"]);

    tagger_cmd()
        .args(["tag", "-d"])
        .arg(temp.path())
        .args(["-t", "new_tag=new_value", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("would tag"));

    assert_eq!(
        read(&temp.path().join("ebs.yaml")),
        read(&fixtures_dir().join("ebs.yaml"))
    );
}

#[test]
fn test_skip_tags_pattern() {
    let temp = workspace(&["ebs.yaml"]);

    tagger_cmd()
        .args(["tag", "-d"])
        .arg(temp.path())
        .args(["-t", "foo_bar=1", "-t", "new_tag=new_value", "--skip-tags", "foo*"])
        .assert()
        .success();

    assert_eq!(
        read(&temp.path().join("ebs.yaml")),
        read(&fixtures_dir().join("ebs_tagged.yaml"))
    );
}

#[test]
fn test_trace_is_idempotent() {
    let temp = workspace(&["ec2_untagged.yaml"]);
    let path = temp.path().join("ec2_untagged.yaml");

    for _ in 0..2 {
        tagger_cmd()
            .args(["tag", "--trace", "-d"])
            .arg(temp.path())
            .assert()
            .success();
    }
    let first = read(&path);
    assert_eq!(first.matches("tagger_trace").count(), 4);

    tagger_cmd()
        .args(["tag", "--trace", "-d"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("unchanged"));
    assert_eq!(read(&path), first);
}

#[test]
fn test_config_file_tags() {
    let temp = workspace(&["ebs.yaml"]);
    let config = temp.path().join("tagger.toml");
    fs::write(&config, "[tags]\nnew_tag = \"new_value\"\n").unwrap();

    tagger_cmd()
        .args(["tag", "-d"])
        .arg(temp.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    assert_eq!(
        read(&temp.path().join("ebs.yaml")),
        read(&fixtures_dir().join("ebs_tagged.yaml"))
    );
}

#[test]
fn test_json_report() {
    let temp = workspace(&["ebs.yaml"]);

    tagger_cmd()
        .args(["tag", "--json", "-t", "k=v", "-d"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"files_written\": 1"));
}

#[test]
fn test_no_tags_is_an_error() {
    let temp = workspace(&["ebs.yaml"]);

    tagger_cmd()
        .args(["tag", "-d"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no tags to apply"));
}

#[test]
fn test_missing_directory_fails() {
    tagger_cmd()
        .args(["tag", "-d", "/nonexistent/templates", "-t", "a=b"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a directory"));
}

#[test]
fn test_broken_template_exits_nonzero_but_tags_others() {
    let temp = workspace(&["ebs.yaml"]);
    fs::write(temp.path().join("broken.yaml"), "Resources:\n  A: [unclosed\n").unwrap();

    tagger_cmd()
        .args(["tag", "-t", "new_tag=new_value", "-d"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken.yaml"))
        .stderr(predicate::str::contains("1 file error(s)"));

    assert_eq!(
        read(&temp.path().join("ebs.yaml")),
        read(&fixtures_dir().join("ebs_tagged.yaml"))
    );
}

// ============================================================================
// list-resources
// ============================================================================

#[test]
fn test_list_resources_prints_spans() {
    let temp = workspace(&["ec2_untagged.yaml"]);

    tagger_cmd()
        .args(["list-resources", "-d"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("InstanceSecurityGroup"))
        .stdout(predicate::str::contains("6-15"))
        .stdout(predicate::str::contains("21-31"));
}

#[test]
fn test_list_resources_json() {
    let temp = workspace(&["ebs.yaml"]);

    let output = tagger_cmd()
        .args(["list-resources", "--json", "-d"])
        .arg(temp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let resource = &value[0]["resources"][0];
    assert_eq!(resource["id"], "NewVolume");
    assert_eq!(resource["lines"]["start"], 3);
    assert_eq!(resource["lines"]["end"], 13);
    assert_eq!(resource["tags"][0]["key"], "MyTag");
}

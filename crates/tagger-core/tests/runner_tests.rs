//! Integration tests for directory runs.

use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tagger_core::{ConfigOverrides, Runner, TaggerConfig};
use tempfile::{TempDir, tempdir};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../test-fixtures/templates")
}

/// A scratch tree with templates at several depths plus ignored content.
fn setup_tree() -> TempDir {
    let temp = tempdir().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("nested/deeper")).unwrap();
    fs::create_dir_all(root.join(".git")).unwrap();
    fs::copy(fixtures_dir().join("ebs.yaml"), root.join("ebs.yaml")).unwrap();
    fs::copy(fixtures_dir().join("s3.template"), root.join("nested/s3.template")).unwrap();
    fs::copy(
        fixtures_dir().join("ec2_untagged.yaml"),
        root.join("nested/deeper/ec2.yml"),
    )
    .unwrap();
    fs::copy(fixtures_dir().join("ebs.yaml"), root.join(".git/ignored.yaml")).unwrap();
    fs::write(root.join("README.md"), "# templates\n").unwrap();
    fs::write(root.join("workflow.yaml"), "on: push\njobs: {}\n").unwrap();
    temp
}

fn runner(tags: &[(&str, &str)]) -> Runner {
    let mut config = TaggerConfig::default();
    config.merge_cli(ConfigOverrides {
        tags: tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        ..Default::default()
    });
    Runner::from_config(config).unwrap()
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_run_tags_every_template() {
    let temp = setup_tree();
    let report = runner(&[("new_tag", "new_value")]).run(temp.path(), false).unwrap();

    assert!(!report.has_errors(), "{report:?}");
    assert_eq!(report.files_scanned, 4);
    assert_eq!(report.files_written, 3);
    assert_eq!(
        read(&temp.path().join("ebs.yaml")),
        read(&fixtures_dir().join("ebs_tagged.yaml"))
    );
    assert_eq!(
        read(&temp.path().join("nested/s3.template")),
        read(&fixtures_dir().join("s3_tagged.template"))
    );
    assert!(read(&temp.path().join("nested/deeper/ec2.yml")).contains("new_tag"));
}

#[test]
fn test_skip_dirs_are_not_visited() {
    let temp = setup_tree();
    runner(&[("new_tag", "new_value")]).run(temp.path(), false).unwrap();

    assert_eq!(
        read(&temp.path().join(".git/ignored.yaml")),
        read(&fixtures_dir().join("ebs.yaml"))
    );
}

#[test]
fn test_files_are_visited_in_name_order() {
    let temp = setup_tree();
    let report = runner(&[("a", "b")]).run(temp.path(), true).unwrap();

    let names: Vec<String> = report
        .files
        .iter()
        .map(|f| {
            f.path
                .strip_prefix(tagger_fs::canonicalize(temp.path()).unwrap())
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    assert_eq!(
        names,
        vec!["ebs.yaml", "nested/deeper/ec2.yml", "nested/s3.template"]
    );
}

#[test]
fn test_dry_run_writes_nothing() {
    let temp = setup_tree();
    let report = runner(&[("new_tag", "new_value")]).run(temp.path(), true).unwrap();

    assert_eq!(report.files_written, 0);
    assert!(report.files.iter().all(|f| f.changed > 0 && !f.written));
    assert_eq!(
        read(&temp.path().join("ebs.yaml")),
        read(&fixtures_dir().join("ebs.yaml"))
    );
}

#[test]
fn test_second_run_writes_nothing() {
    let temp = setup_tree();
    let mut config = TaggerConfig::default();
    config.tags.insert("env".into(), "prod".into());
    config.trace = true;

    Runner::from_config(config.clone()).unwrap().run(temp.path(), false).unwrap();
    let report = Runner::from_config(config).unwrap().run(temp.path(), false).unwrap();

    assert_eq!(report.files_written, 0);
    assert!(report.files.iter().all(|f| f.changed == 0));
}

#[test]
fn test_broken_template_is_recorded_and_run_continues() {
    let temp = setup_tree();
    fs::write(temp.path().join("broken.yaml"), "Resources:\n  A: [unclosed\n").unwrap();

    let report = runner(&[("new_tag", "new_value")]).run(temp.path(), false).unwrap();

    assert!(report.has_errors());
    assert_eq!(report.file_errors.len(), 1);
    assert!(report.file_errors[0].path.ends_with("broken.yaml"));
    assert_eq!(report.files_written, 3);
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_is_recorded() {
    use std::os::unix::fs::PermissionsExt;

    let temp = setup_tree();
    let locked = temp.path().join("nested/deeper");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read_dir(&locked).is_ok() {
        // Permissions are not enforced for this user.
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let report = runner(&[("new_tag", "new_value")]).run(temp.path(), false);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    let report = report.unwrap();

    assert_eq!(report.file_errors.len(), 1);
    assert!(report.file_errors[0].path.ends_with("nested/deeper"));
    assert_eq!(report.files_written, 2);
}

#[test]
fn test_extension_filter_limits_run() {
    let temp = setup_tree();
    let mut config = TaggerConfig::default();
    config.tags.insert("k".into(), "v".into());
    config.extensions = vec!["template".into()];

    let report = Runner::from_config(config).unwrap().run(temp.path(), false).unwrap();

    assert_eq!(report.files_scanned, 1);
    assert!(report.files[0].path.ends_with("s3.template"));
}

#[test]
fn test_missing_directory_is_an_error() {
    let result = runner(&[]).run("/nonexistent/templates", false);
    assert!(result.is_err());
}

#[test]
fn test_list_resources_parses_without_writing() {
    let temp = setup_tree();
    let listing = runner(&[("k", "v")]).list_resources(temp.path()).unwrap();

    assert!(listing.errors.is_empty());
    let summary: Vec<(String, usize)> = listing
        .files
        .iter()
        .map(|f| {
            (
                f.path.file_name().unwrap().to_string_lossy().into_owned(),
                f.blocks.len(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("ebs.yaml".to_string(), 1),
            ("ec2.yml".to_string(), 4),
            ("s3.template".to_string(), 1),
        ]
    );
    assert_eq!(
        read(&temp.path().join("ebs.yaml")),
        read(&fixtures_dir().join("ebs.yaml"))
    );
}

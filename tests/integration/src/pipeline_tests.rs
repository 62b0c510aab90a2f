//! Pipeline scenarios across parser, tag group, writer and runner.
//!
//! Each test builds a small template tree, runs the whole pipeline over it and
//! checks the bytes that end up on disk.

use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tagger_blocks::{Lines, TemplateParser};
use tagger_core::{Runner, TRACE_TAG_KEY, TaggerConfig};
use tempfile::TempDir;

// =============================================================================
// Test Infrastructure
// =============================================================================

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../test-fixtures/templates")
}

fn config(tags: &[(&str, &str)], trace: bool) -> TaggerConfig {
    let mut config = TaggerConfig::default();
    for (key, value) in tags {
        config.tags.insert(key.to_string(), value.to_string());
    }
    config.trace = trace;
    config
}

fn run(root: &Path, config: TaggerConfig) -> tagger_core::RunReport {
    let report = Runner::from_config(config).unwrap().run(root, false).unwrap();
    assert!(!report.has_errors(), "unexpected errors: {report:?}");
    report
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn crlf_template_keeps_its_line_endings() {
    let temp = TempDir::new().unwrap();
    let source = fs::read_to_string(fixtures_dir().join("ebs.yaml")).unwrap();
    let path = temp.path().join("ebs.yaml");
    fs::write(&path, source.replace('\n', "\r\n")).unwrap();

    run(temp.path(), config(&[("new_tag", "new_value")], false));

    let expected = fs::read_to_string(fixtures_dir().join("ebs_tagged.yaml")).unwrap();
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        expected.replace('\n', "\r\n")
    );
}

#[test]
fn untouched_resources_stay_byte_identical() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("mixed.yaml");
    fs::write(
        &path,
        "\
Resources:
  # already tagged
  Tagged:
    Type: AWS::S3::Bucket
    Properties:
      Tags:
        - {Key: env, Value: prod}
  Topic:
    Type: AWS::SNS::Topic
  Queue:
    Type: AWS::SQS::Queue
    Properties:
      DelaySeconds:   5
",
    )
    .unwrap();

    run(temp.path(), config(&[("env", "prod")], false));

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "\
Resources:
  # already tagged
  Tagged:
    Type: AWS::S3::Bucket
    Properties:
      Tags:
        - {Key: env, Value: prod}
  Topic:
    Type: AWS::SNS::Topic
  Queue:
    Type: AWS::SQS::Queue
    Properties:
      DelaySeconds:   5
      Tags:
        - Key: env
          Value: prod
"
    );
}

#[test]
fn spans_are_recomputed_after_write() {
    let temp = TempDir::new().unwrap();
    fs::copy(
        fixtures_dir().join("ec2_untagged.yaml"),
        temp.path().join("ec2.yaml"),
    )
    .unwrap();

    run(temp.path(), config(&[("env", "test")], true));

    let mut parser = TemplateParser::new();
    let blocks = parser.parse_file(temp.path().join("ec2.yaml")).unwrap();
    let spans: Vec<Lines> = blocks.iter().map(|b| b.lines()).collect();
    assert_eq!(
        spans,
        vec![
            Lines::new(2, 10),
            Lines::new(11, 25),
            Lines::new(26, 35),
            Lines::new(36, 51),
        ]
    );
    for block in &blocks {
        assert_eq!(block.existing_tags().len(), 2);
        assert!(block.existing_tag(TRACE_TAG_KEY).is_some());
    }
}

#[test]
fn mixed_tree_is_tagged_once_per_template() {
    let temp = TempDir::new().unwrap();
    for name in ["ebs.yaml", "ebs.json", "s3.template"] {
        fs::copy(fixtures_dir().join(name), temp.path().join(name)).unwrap();
    }

    let first = run(temp.path(), config(&[("team", "platform")], true));
    let second = run(temp.path(), config(&[("team", "platform")], true));

    assert_eq!(first.files_written, 3);
    assert_eq!(second.files_written, 0);
    let json = fs::read_to_string(temp.path().join("ebs.json")).unwrap();
    assert!(json.contains("\"Key\": \"team\""));
    assert!(json.contains("\"Key\": \"tagger_trace\""));
}

//! Directory runs
//!
//! [`Runner`] walks a directory tree, tags every resource of every supported
//! template and writes changed templates back in place. Failures are recorded
//! per file in the [`RunReport`] and never stop the run.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tagger_blocks::{Block, ParserOptions, TemplateParser};

use crate::config::TaggerConfig;
use crate::error::{Error, Result, TagComputationError};
use crate::tag_group::TagGroup;

/// Outcome for one template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub blocks: usize,
    pub changed: usize,
    pub written: bool,
}

/// A file or directory that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    pub path: PathBuf,
    pub message: String,
}

/// A tag that could not be computed for one resource of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagFailure {
    pub path: PathBuf,
    pub key: String,
    pub resource_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub files_scanned: usize,
    pub files_written: usize,
    pub files: Vec<FileReport>,
    pub file_errors: Vec<FileError>,
    pub tag_errors: Vec<TagFailure>,
}

impl RunReport {
    pub fn has_errors(&self) -> bool {
        !self.file_errors.is_empty() || !self.tag_errors.is_empty()
    }

    fn file_error(&mut self, path: &Path, error: impl std::fmt::Display) {
        record(&mut self.file_errors, path, error);
    }
}

/// The resources of one template, as parsed.
#[derive(Debug, Clone)]
pub struct ListedFile {
    pub path: PathBuf,
    pub blocks: Vec<Block>,
}

/// Result of [`Runner::list_resources`].
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub files: Vec<ListedFile>,
    pub errors: Vec<FileError>,
}

fn record(errors: &mut Vec<FileError>, path: &Path, error: impl std::fmt::Display) {
    tracing::error!(path = %path.display(), error = %error, "Failed to process file");
    errors.push(FileError {
        path: path.to_path_buf(),
        message: error.to_string(),
    });
}

pub struct Runner {
    config: TaggerConfig,
    tag_group: TagGroup,
}

impl Runner {
    pub fn new(config: TaggerConfig, tag_group: TagGroup) -> Self {
        Self { config, tag_group }
    }

    /// Build a runner whose tag group comes from the configuration itself.
    pub fn from_config(config: TaggerConfig) -> Result<Self> {
        let tag_group = config.tag_group()?;
        Ok(Self::new(config, tag_group))
    }

    pub fn config(&self) -> &TaggerConfig {
        &self.config
    }

    pub fn tag_group(&self) -> &TagGroup {
        &self.tag_group
    }

    /// Tag every template under `directory`. With `dry_run` nothing is written.
    pub fn run(&self, directory: impl AsRef<Path>, dry_run: bool) -> Result<RunReport> {
        let mut report = RunReport::default();
        let (mut parser, files) = self.templates(directory.as_ref(), &mut report.file_errors)?;
        tracing::info!(files = files.len(), dry_run, "Starting run");

        for path in &files {
            report.files_scanned += 1;
            self.process_file(&mut parser, path, dry_run, &mut report);
        }

        tracing::info!(
            scanned = report.files_scanned,
            written = report.files_written,
            errors = report.file_errors.len() + report.tag_errors.len(),
            "Run complete"
        );
        Ok(report)
    }

    /// Parse every template under `directory` without tagging anything.
    pub fn list_resources(&self, directory: impl AsRef<Path>) -> Result<Listing> {
        let mut listing = Listing::default();
        let (mut parser, files) = self.templates(directory.as_ref(), &mut listing.errors)?;

        for path in files {
            match parser.parse_file(&path) {
                Ok(blocks) => listing.files.push(ListedFile { path, blocks }),
                Err(tagger_blocks::Error::ResourcesNotFound { .. }) => {
                    tracing::debug!(path = %path.display(), "No resources section, skipping");
                }
                Err(e) => record(&mut listing.errors, &path, e),
            }
        }
        Ok(listing)
    }

    /// A parser set up for `directory` and the supported files below it.
    fn templates(
        &self,
        directory: &Path,
        errors: &mut Vec<FileError>,
    ) -> Result<(TemplateParser, Vec<PathBuf>)> {
        let root = tagger_fs::canonicalize(directory)?;
        let mut parser = TemplateParser::new();
        parser.init(
            &root,
            ParserOptions {
                extensions: self.config.extensions.clone(),
            },
        )?;

        let mut files = Vec::new();
        collect_files(&root, &self.config.skip_dirs, &mut files, errors)?;
        files.retain(|path| parser.supports(path));
        tracing::debug!(root = %root.display(), templates = files.len(), "Collected templates");
        Ok((parser, files))
    }

    fn process_file(
        &self,
        parser: &mut TemplateParser,
        path: &Path,
        dry_run: bool,
        report: &mut RunReport,
    ) {
        let mut blocks = match parser.parse_file(path) {
            Ok(blocks) => blocks,
            Err(tagger_blocks::Error::ResourcesNotFound { .. }) => {
                tracing::debug!(path = %path.display(), "No resources section, skipping");
                return;
            }
            Err(e) => {
                report.file_error(path, e);
                return;
            }
        };

        for block in blocks.iter_mut() {
            match self.tag_group.create_tags_for_block(path, block) {
                Ok(()) => {}
                Err(Error::TagComputation(errors)) => {
                    report.tag_errors.extend(errors.into_iter().map(
                        |TagComputationError {
                             key,
                             resource_id,
                             message,
                         }| TagFailure {
                            path: path.to_path_buf(),
                            key,
                            resource_id,
                            message,
                        },
                    ));
                }
                Err(e) => report.file_error(path, e),
            }
        }

        let changed = blocks.iter().filter(|b| b.has_tag_changes()).count();
        let mut written = false;
        if changed > 0 && !dry_run {
            match tagger_blocks::write_file(path, &blocks, path) {
                Ok(()) => {
                    written = true;
                    report.files_written += 1;
                }
                Err(e) => report.file_error(path, e),
            }
        } else if changed > 0 {
            tracing::info!(path = %path.display(), changed, "Dry run, not writing");
        }

        report.files.push(FileReport {
            path: path.to_path_buf(),
            blocks: blocks.len(),
            changed,
            written,
        });
    }
}

/// Collect regular files below `dir` in name order, skipping ignored names.
///
/// An unreadable root is an error; unreadable subdirectories are recorded.
fn collect_files(
    dir: &Path,
    skip: &[String],
    files: &mut Vec<PathBuf>,
    errors: &mut Vec<FileError>,
) -> Result<()> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| tagger_fs::Error::io(dir, e))? {
        match entry {
            Ok(entry) => entries.push(entry),
            Err(e) => record(errors, dir, tagger_fs::Error::io(dir, e)),
        }
    }
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let name = entry.file_name();
        if skip.iter().any(|s| name.to_string_lossy() == s.as_str()) {
            tracing::debug!(path = %entry.path().display(), "Ignored by skip_dirs");
            continue;
        }
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                record(errors, &path, tagger_fs::Error::io(&path, e));
                continue;
            }
        };
        if file_type.is_dir() {
            if let Err(e) = collect_files(&path, skip, files, errors) {
                record(errors, &path, e);
            }
        } else if file_type.is_file() {
            files.push(path);
        }
    }
    Ok(())
}

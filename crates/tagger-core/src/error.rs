//! Error types for tagger-core

use std::path::PathBuf;

/// Result type for tagger-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// A provider that failed to produce a value for one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagComputationError {
    pub key: String,
    pub resource_id: String,
    pub message: String,
}

impl std::fmt::Display for TagComputationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "tag {} on resource {}: {}",
            self.key, self.resource_id, self.message
        )
    }
}

/// Errors that can occur in tagger-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Skip pattern that could not be compiled
    #[error("Invalid skip pattern {pattern:?}: {message}")]
    InvalidSkipPattern { pattern: String, message: String },

    /// One or more providers failed for a block
    #[error("{} tag(s) could not be computed: {}", .0.len(), join(.0))]
    TagComputation(Vec<TagComputationError>),

    /// Configuration file that could not be read or parsed
    #[error("Invalid configuration at {path}: {message}")]
    Config { path: PathBuf, message: String },

    // Transparent wrappers for underlying crate errors
    /// Template error from tagger-blocks
    #[error(transparent)]
    Blocks(#[from] tagger_blocks::Error),

    /// Filesystem error from tagger-fs
    #[error(transparent)]
    Fs(#[from] tagger_fs::Error),
}

fn join(errors: &[TagComputationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

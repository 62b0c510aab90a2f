//! Error types for tagger-blocks

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Filesystem error: {0}")]
    Fs(#[from] tagger_fs::Error),

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("No Resources section found in {path}")]
    ResourcesNotFound { path: PathBuf },

    #[error("Unsupported template format: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("Cannot rewrite tags of {resource_id}: {message}")]
    Rewrite {
        resource_id: String,
        message: String,
    },
}

impl Error {
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn rewrite(resource_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rewrite {
            resource_id: resource_id.into(),
            message: message.into(),
        }
    }
}

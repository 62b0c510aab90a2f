//! Path helpers

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Resolve a path to an absolute one without Windows `\\?\` prefixes.
pub fn canonicalize(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    dunce::canonicalize(path).map_err(|e| Error::io(path, e))
}

/// Lower-cased extension of a path, if it has one.
///
/// Dotfiles such as `.template` have no extension.
pub fn extension(path: impl AsRef<Path>) -> Option<String> {
    path.as_ref()
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

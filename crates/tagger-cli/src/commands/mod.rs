//! Command implementations for tagger-cli

pub mod list;
pub mod tag;

pub use list::run_list_resources;
pub use tag::run_tag;

use std::path::Path;

use tagger_core::TaggerConfig;

use crate::error::{CliError, Result};

/// Load the configuration file if one was given, defaults otherwise.
fn load_config(path: Option<&Path>) -> Result<TaggerConfig> {
    match path {
        Some(path) => Ok(TaggerConfig::load(path)?),
        None => Ok(TaggerConfig::default()),
    }
}

fn require_directory(directory: &Path) -> Result<()> {
    if directory.is_dir() {
        Ok(())
    } else {
        Err(CliError::user(format!(
            "'{}' is not a directory",
            directory.display()
        )))
    }
}

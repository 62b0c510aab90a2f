//! The list-resources command

use std::path::Path;

use colored::Colorize;
use serde_json::json;
use tagger_core::Runner;

use crate::error::{CliError, Result};

use super::{load_config, require_directory};

/// Run the list-resources command
pub fn run_list_resources(directory: &Path, config: Option<&Path>, json: bool) -> Result<()> {
    require_directory(directory)?;
    let runner = Runner::from_config(load_config(config)?)?;
    let listing = runner.list_resources(directory)?;

    if json {
        let files: Vec<_> = listing
            .files
            .iter()
            .map(|file| {
                json!({
                    "path": file.path,
                    "resources": file.blocks.iter().map(|block| json!({
                        "id": block.resource_id(),
                        "type": block.resource_type(),
                        "lines": block.lines(),
                        "tags": block.existing_tags(),
                    })).collect::<Vec<_>>(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&files)?);
    } else {
        for file in &listing.files {
            println!("{}", file.path.display().to_string().bold());
            for block in &file.blocks {
                println!(
                    "  {:<32} {:>9}  {}",
                    block.resource_id().green(),
                    block.lines().to_string(),
                    block.resource_type().unwrap_or("").dimmed()
                );
            }
        }
    }

    for error in &listing.errors {
        eprintln!(
            "{} {}: {}",
            "failed:".red().bold(),
            error.path.display(),
            error.message
        );
    }
    if !listing.errors.is_empty() {
        return Err(CliError::user(format!(
            "{} file(s) could not be parsed",
            listing.errors.len()
        )));
    }
    Ok(())
}

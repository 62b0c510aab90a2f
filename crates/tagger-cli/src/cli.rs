//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Tagger - Add tags to every resource of your infrastructure templates
#[derive(Parser, Debug)]
#[command(name = "tagger")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Tag every resource of every template in a directory
    ///
    /// Existing tags with other keys are kept; tags with the same key are
    /// overwritten in place.
    ///
    /// Examples:
    ///   tagger tag -d infra -t env=prod          # Add a static tag
    ///   tagger tag -d infra --trace              # Add a per-resource trace id
    ///   tagger tag -d infra -t a=b --dry-run     # Report without writing
    Tag(TagArgs),

    /// List the resources found in every template of a directory
    ListResources {
        /// Directory to scan
        #[arg(short, long)]
        directory: PathBuf,

        /// Configuration file (TOML)
        #[arg(short, long, env = "TAGGER_CONFIG")]
        config: Option<PathBuf>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct TagArgs {
    /// Directory to scan
    #[arg(short, long)]
    pub directory: PathBuf,

    /// Static tag to add, repeatable
    #[arg(short = 't', long = "tag", value_name = "KEY=VALUE", value_parser = parse_tag)]
    pub tags: Vec<(String, String)>,

    /// Tag keys to leave out; `*` matches any run of characters
    #[arg(long, value_name = "PATTERN", value_delimiter = ',')]
    pub skip_tags: Vec<String>,

    /// File or directory names to ignore, in addition to the defaults
    #[arg(long, value_name = "NAME", value_delimiter = ',')]
    pub skip_dirs: Vec<String>,

    /// Add a unique tagger_trace identifier to every resource
    #[arg(long)]
    pub trace: bool,

    /// Configuration file (TOML)
    #[arg(short, long, env = "TAGGER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Preview changes without writing them
    #[arg(long)]
    pub dry_run: bool,

    /// Output the run report as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_tag(pair: &str) -> Result<(String, String), String> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{pair}'")),
    }
}

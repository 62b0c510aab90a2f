//! Tagger CLI
//!
//! The command-line interface for tagging infrastructure templates.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(cmd) => execute_command(cmd),
        None => {
            // No command provided - show help hint
            println!("{} Template tagging CLI", "tagger".green().bold());
            println!();
            println!("Run {} for available commands.", "tagger --help".cyan());
            Ok(())
        }
    }
}

/// Logs go to stderr: DEBUG with `--verbose`, otherwise `RUST_LOG` or `warn`.
fn init_tracing(verbose: bool) {
    let builder = FmtSubscriber::builder()
        .with_writer(std::io::stderr)
        .with_target(verbose);
    let result = if verbose {
        tracing::subscriber::set_global_default(builder.with_max_level(Level::DEBUG).finish())
    } else {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing::subscriber::set_global_default(builder.with_env_filter(filter).finish())
    };
    if result.is_err() {
        eprintln!("{} failed to set tracing subscriber", "warning:".yellow().bold());
    }
    tracing::debug!("Verbose mode enabled");
}

fn execute_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Tag(args) => commands::run_tag(args),
        Commands::ListResources {
            directory,
            config,
            json,
        } => commands::run_list_resources(&directory, config.as_deref(), json),
    }
}

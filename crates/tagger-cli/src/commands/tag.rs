//! The tag command

use colored::Colorize;
use tagger_core::{ConfigOverrides, RunReport, Runner};

use crate::cli::TagArgs;
use crate::error::{CliError, Result};

use super::{load_config, require_directory};

/// Run the tag command
pub fn run_tag(args: TagArgs) -> Result<()> {
    require_directory(&args.directory)?;
    let mut config = load_config(args.config.as_deref())?;
    config.merge_cli(ConfigOverrides {
        tags: args.tags,
        skip_tags: args.skip_tags,
        skip_dirs: args.skip_dirs,
        trace: args.trace,
    });

    if config.tags.is_empty() && !config.trace {
        return Err(CliError::user(
            "no tags to apply; pass --tag KEY=VALUE, --trace or a config file with [tags]",
        ));
    }

    let runner = Runner::from_config(config)?;
    let report = runner.run(&args.directory, args.dry_run)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, args.dry_run);
    }

    if report.has_errors() {
        return Err(CliError::user(format!(
            "{} file error(s), {} tag error(s)",
            report.file_errors.len(),
            report.tag_errors.len()
        )));
    }
    Ok(())
}

fn print_report(report: &RunReport, dry_run: bool) {
    for file in &report.files {
        let status = if file.written {
            "tagged".green()
        } else if file.changed > 0 {
            "would tag".yellow()
        } else {
            "unchanged".dimmed()
        };
        println!(
            "{:>10} {} ({}/{} resources)",
            status,
            file.path.display(),
            file.changed,
            file.blocks
        );
    }
    for error in &report.file_errors {
        eprintln!(
            "{} {}: {}",
            "failed:".red().bold(),
            error.path.display(),
            error.message
        );
    }
    for error in &report.tag_errors {
        eprintln!(
            "{} tag {} on {} in {}: {}",
            "failed:".red().bold(),
            error.key,
            error.resource_id,
            error.path.display(),
            error.message
        );
    }

    println!();
    let verb = if dry_run { "would be written" } else { "written" };
    println!(
        "{} {} template(s) scanned, {} {}.",
        "Done:".bold(),
        report.files_scanned,
        changed_files(report, dry_run),
        verb
    );
}

fn changed_files(report: &RunReport, dry_run: bool) -> usize {
    if dry_run {
        report.files.iter().filter(|f| f.changed > 0).count()
    } else {
        report.files_written
    }
}

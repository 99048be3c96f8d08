//! Template Sync CLI
//!
//! Merges a template tree into a target tree, honoring the target's
//! sync settings.

mod cli;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use tsync_core::{FileOutcome, Settings, SyncEngine, SyncOptions, SyncReport};

use cli::Cli;
use error::Result;

fn main() {
    match run() {
        Ok(report) if report.success() => {}
        Ok(_) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<SyncReport> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let settings = Settings::load(&cli.target)?;
    let options = SyncOptions {
        dry_run: cli.dry_run,
    };
    let mut engine = SyncEngine::new(&settings, options)?;
    let report = engine.sync(&cli.template, &cli.target)?;

    print_report(&report, cli.dry_run);
    Ok(report)
}

fn print_report(report: &SyncReport, dry_run: bool) {
    for file in &report.files {
        let label = match &file.outcome {
            FileOutcome::Patched => "patched".green().bold(),
            FileOutcome::Copied => "copied".green(),
            FileOutcome::Unchanged => "unchanged".dimmed(),
            FileOutcome::Failed { .. } => "failed".red().bold(),
        };
        match &file.outcome {
            FileOutcome::Failed { reason } => {
                println!("{:>10}  {}  ({})", label, file.path.display(), reason);
            }
            _ => println!("{:>10}  {}", label, file.path.display()),
        }
    }
    let summary = format!(
        "{} file(s), {} changed",
        report.files.len(),
        report.changed()
    );
    if dry_run {
        println!("{} {}", "dry-run:".yellow().bold(), summary);
    } else {
        println!("{}", summary);
    }
}

//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::Parser;

/// Template Sync - merge a template tree into a target tree
#[derive(Parser, Debug)]
#[command(name = "tsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Template tree to sync from
    pub template: PathBuf,

    /// Target tree to sync into
    pub target: PathBuf,

    /// Preview changes without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roots_and_flags() {
        let cli = Cli::parse_from(["tsync", "tmpl", "tgt", "--dry-run", "-v"]);
        assert_eq!(cli.template, PathBuf::from("tmpl"));
        assert_eq!(cli.target, PathBuf::from("tgt"));
        assert!(cli.dry_run);
        assert!(cli.verbose);
    }

    #[test]
    fn test_flags_default_off() {
        let cli = Cli::parse_from(["tsync", "a", "b"]);
        assert!(!cli.dry_run);
        assert!(!cli.verbose);
    }
}

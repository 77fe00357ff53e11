use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// modsweep - reclaim disk space wasted by non-essential files in node_modules
#[derive(Parser, Debug)]
#[command(name = "modsweep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "PATH", env = "MODSWEEP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Estimate reclaimable space in a dependency tree
    Scan(ScanArgs),

    /// Remove non-essential files and minify package manifests
    Clean(CleanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Dependency tree to scan
    #[arg(default_value = "node_modules")]
    pub path: PathBuf,

    /// List every path in the removal plan
    #[arg(short, long)]
    pub list: bool,

    /// Output the plan as JSON
    #[arg(long)]
    pub json: bool,

    /// Parallel scan threads
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,
}

#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Dependency tree to clean
    #[arg(default_value = "node_modules")]
    pub path: PathBuf,

    /// Show what would be removed without doing it
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub force: bool,

    /// Leave package manifests untouched
    #[arg(long)]
    pub no_minify: bool,

    /// Parallel removal jobs
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_scan_defaults_to_node_modules() {
        let cli = Cli::parse_from(["modsweep", "scan"]);
        match cli.command {
            Command::Scan(args) => {
                assert_eq!(args.path, PathBuf::from("node_modules"));
                assert!(!args.list);
            }
            _ => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn parse_clean_with_options() {
        let cli = Cli::parse_from([
            "modsweep",
            "clean",
            "--dry-run",
            "--no-minify",
            "--jobs",
            "8",
            "/project/node_modules",
        ]);
        match cli.command {
            Command::Clean(args) => {
                assert!(args.dry_run);
                assert!(args.no_minify);
                assert!(!args.force);
                assert_eq!(args.jobs, Some(8));
                assert_eq!(args.path, PathBuf::from("/project/node_modules"));
            }
            _ => panic!("Expected Clean command"),
        }
    }

    #[test]
    fn global_verbose_flag() {
        let cli = Cli::parse_from(["modsweep", "-vvv", "scan", "--list"]);
        assert_eq!(cli.verbose, 3);
    }
}

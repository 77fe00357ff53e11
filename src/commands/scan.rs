//! Scan command implementation

use anyhow::Result;

use crate::cli::ScanArgs;
use crate::config::Config;
use crate::scanner::ScanOptions;

use super::{interrupt_flag, print_summary, run_scan};

/// Run the scan command. Never writes anything.
pub fn run(args: ScanArgs, config: &Config, quiet: bool) -> Result<()> {
    let scan_options = ScanOptions::new()
        .with_threads(args.jobs.unwrap_or(config.scanner.parallel_threads))
        .with_follow_symlinks(config.scanner.follow_symlinks)
        .with_cancel_flag(interrupt_flag());

    tracing::info!(path = %args.path.display(), "Scanning dependency tree");

    let result = run_scan(&args.path, &scan_options, quiet || args.json)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if args.list {
        for path in &result.file_set {
            println!("{}", path.display());
        }
        for path in &result.manifest_set {
            println!("{} (minify)", path.display());
        }
    }

    print_summary(&result);

    Ok(())
}

//! Clean command implementation.

use std::io::{self, Write};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Result;
use humansize::{format_size, BINARY};

use crate::cleaner::{CleanOptions, CleanProgress, PlanExecutor, RemovalOutcome};
use crate::cli::CleanArgs;
use crate::config::Config;
use crate::scanner::ScanOptions;
use crate::signals::{install_interrupt_handler, is_interrupted, restore_default_handlers};

use super::{interrupt_flag, print_summary, run_scan, spinner};

/// Run the clean command.
pub fn run(args: CleanArgs, config: &Config, quiet: bool) -> Result<()> {
    let cancel = interrupt_flag();

    let scan_options = ScanOptions::new()
        .with_threads(config.scanner.parallel_threads)
        .with_follow_symlinks(config.scanner.follow_symlinks)
        .with_cancel_flag(Arc::clone(&cancel));

    tracing::info!(path = %args.path.display(), "Scanning dependency tree");
    let plan = run_scan(&args.path, &scan_options, quiet)?;

    print_summary(&plan);

    let minify_manifests = config.cleaner.minify_manifests && !args.no_minify;
    let manifest_work = minify_manifests && plan.manifest_saved_size > 0;
    if plan.file_set.is_empty() && plan.dir_set.is_empty() && !manifest_work {
        println!("Nothing to clean.");
        return Ok(());
    }

    // Confirmation
    if config.cleaner.confirm && !args.force && !args.dry_run && !confirm(&cancel)? {
        println!("Aborted.");
        return Ok(());
    }

    let clean_options = CleanOptions {
        dry_run: args.dry_run,
        minify_manifests,
    };
    let jobs = args.jobs.unwrap_or(config.cleaner.parallel_jobs).max(1);
    let executor = PlanExecutor::new(clean_options, jobs).with_cancel_flag(Arc::clone(&cancel));

    if args.dry_run {
        println!("\n[DRY RUN] Would clean:");
    }

    let progress = Arc::new(CleanProgress::for_plan(&plan));
    let bar = spinner("Cleaning...", quiet || args.dry_run);
    let outcomes = executor.execute(&plan, Some(Arc::clone(&progress)));
    bar.finish_and_clear();

    let summary = PlanExecutor::summarize(&outcomes);

    if args.dry_run {
        for outcome in outcomes.files.iter().chain(outcomes.manifests.iter()) {
            match outcome {
                RemovalOutcome::Removed { path, .. } => println!("  remove {}", path.display()),
                RemovalOutcome::Rewritten { path, .. } => println!("  minify {}", path.display()),
                _ => {}
            }
        }
    }

    // Print results
    println!("\nResults:");
    println!("  Files removed:       {}", summary.files_removed);
    println!("  Directories removed: {}", summary.dirs_removed);
    println!("  Manifests minified:  {}", summary.manifests_rewritten);
    if summary.failed_count() > 0 {
        println!("  Failed:              {}", summary.failed_count());
    }
    println!("  Freed:               {}", format_size(summary.total_freed, BINARY));

    for outcome in outcomes.iter() {
        if let RemovalOutcome::Failed { path, error } = outcome {
            eprintln!("  Error processing {}: {}", path.display(), error);
        }
    }

    if is_interrupted(&cancel) {
        eprintln!("Interrupted after {} of {} operations.", progress.completed(), progress.total);
        std::process::exit(130);
    }

    if summary.failed_count() > 0 {
        std::process::exit(5); // Partial failure
    }

    Ok(())
}

/// Ask before touching anything. Ctrl-C at the prompt terminates the process.
fn confirm(cancel: &Arc<AtomicBool>) -> Result<bool> {
    if let Err(err) = restore_default_handlers() {
        tracing::warn!(%err, "Could not restore default signal handlers");
    }

    print!("\nProceed with cleanup? [y/N] ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    if let Err(err) = install_interrupt_handler(Arc::clone(cancel)) {
        tracing::warn!(%err, "Could not reinstall interrupt handler");
    }

    Ok(input.trim().eq_ignore_ascii_case("y"))
}

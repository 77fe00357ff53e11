//! Command implementations.

pub mod clean;
pub mod scan;

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::SweeperError;
use crate::scanner::{scan_tree, ScanOptions, ScanResult};
use crate::signals::install_interrupt_handler;

/// Cancellation flag wired to SIGINT/SIGTERM.
pub(crate) fn interrupt_flag() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    if let Err(err) = install_interrupt_handler(Arc::clone(&flag)) {
        tracing::warn!(%err, "Could not install interrupt handler");
    }
    flag
}

pub(crate) fn spinner(message: &str, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Run a scan behind a spinner and translate the errors a user can act on.
pub(crate) fn run_scan(path: &Path, options: &ScanOptions, hidden: bool) -> Result<ScanResult> {
    let bar = spinner("Scanning...", hidden);
    let result = scan_tree(path, options);
    bar.finish_and_clear();

    match result {
        Ok(result) => {
            for err in &result.manifest_errors {
                eprintln!("warning: {}", err);
            }
            Ok(result)
        }
        Err(SweeperError::PathNotFound(p)) | Err(SweeperError::NotADirectory(p)) => {
            Err(anyhow!("no such directory: {}", p.display()))
        }
        Err(SweeperError::Cancelled) => {
            eprintln!("Interrupted.");
            std::process::exit(130);
        }
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn print_summary(result: &ScanResult) {
    println!(
        "Packages: {}, removable files: {}, reclaimable: {} ({:.1}% of {})",
        result.package_count,
        result.file_count(),
        format_size(result.reclaimable_size, BINARY),
        result.reclaimable_ratio() * 100.0,
        format_size(result.total_size, BINARY),
    );
    if !result.manifest_set.is_empty() {
        println!(
            "Manifests to minify: {} (saves {})",
            result.manifest_set.len(),
            format_size(result.manifest_saved_size, BINARY),
        );
    }
}

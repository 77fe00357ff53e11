//! Orchestrator for executing a whole removal plan.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rayon::prelude::*;

use crate::cleaner::executor::{CleanExecutor, CleanOptions, RemovalOutcome};
use crate::scanner::ScanResult;

/// Progress tracker for plan execution.
pub struct CleanProgress {
    /// Total number of operations.
    pub total: usize,
    /// Number of completed operations.
    completed: AtomicUsize,
    /// Path currently being processed.
    current_path: Mutex<Option<String>>,
}

impl CleanProgress {
    /// Create a new progress tracker.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: AtomicUsize::new(0),
            current_path: Mutex::new(None),
        }
    }

    /// Progress tracker sized for a plan.
    pub fn for_plan(plan: &ScanResult) -> Self {
        Self::new(plan.file_set.len() + plan.manifest_set.len() + plan.dir_set.len())
    }

    /// Increment the completed count.
    pub fn increment(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    /// Set the path currently being processed.
    pub fn set_current(&self, path: String) {
        if let Ok(mut current) = self.current_path.lock() {
            *current = Some(path);
        }
    }

    /// Get the number of completed operations.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Get the path currently being processed.
    pub fn current(&self) -> Option<String> {
        self.current_path.lock().ok().and_then(|c| c.clone())
    }
}

/// Summary of plan execution.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanSummary {
    pub files_removed: usize,
    pub files_missing: usize,
    pub files_failed: usize,
    pub dirs_removed: usize,
    pub dirs_skipped: usize,
    pub manifests_rewritten: usize,
    pub manifests_failed: usize,
    /// Operations not attempted because of cancellation.
    pub skipped: usize,
    /// Removed file bytes plus manifest savings.
    pub total_freed: u64,
}

impl CleanSummary {
    pub fn failed_count(&self) -> usize {
        self.files_failed + self.manifests_failed
    }
}

/// All outcomes of one plan execution, grouped by stage.
#[derive(Debug, Default)]
pub struct PlanOutcomes {
    pub files: Vec<RemovalOutcome>,
    pub manifests: Vec<RemovalOutcome>,
    pub dirs: Vec<RemovalOutcome>,
}

impl PlanOutcomes {
    pub fn iter(&self) -> impl Iterator<Item = &RemovalOutcome> {
        self.files
            .iter()
            .chain(self.manifests.iter())
            .chain(self.dirs.iter())
    }
}

/// Runs a removal plan: files in parallel, then manifests in parallel, then
/// directories one by one, deepest first.
pub struct PlanExecutor {
    executor: CleanExecutor,
    parallelism: usize,
    cancel: Option<Arc<AtomicBool>>,
}

impl PlanExecutor {
    /// Create a new plan executor.
    pub fn new(options: CleanOptions, parallelism: usize) -> Self {
        Self {
            executor: CleanExecutor::new(options),
            parallelism,
            cancel: None,
        }
    }

    /// Attach a cancellation flag checked before every operation.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Execute a plan. One failing path never stops the others.
    pub fn execute(&self, plan: &ScanResult, progress: Option<Arc<CleanProgress>>) -> PlanOutcomes {
        let run = || {
            let files: Vec<RemovalOutcome> = plan
                .file_set
                .par_iter()
                .map(|path| {
                    self.step(path, progress.as_deref(), |p| self.executor.remove_file(p))
                })
                .collect();

            let manifests: Vec<RemovalOutcome> = if self.executor.options().minify_manifests {
                plan.manifest_set
                    .par_iter()
                    .map(|path| {
                        self.step(path, progress.as_deref(), |p| {
                            self.executor.rewrite_manifest(p)
                        })
                    })
                    .collect()
            } else {
                Vec::new()
            };

            (files, manifests)
        };

        let (files, manifests) = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallelism)
            .build()
        {
            Ok(pool) => pool.install(run),
            Err(err) => {
                tracing::warn!(%err, "Could not build thread pool, using the global one");
                run()
            }
        };

        // Directories only empty out once every file is gone.
        let dirs: Vec<RemovalOutcome> = plan
            .dirs_deepest_first()
            .iter()
            .map(|path| self.step(path, progress.as_deref(), |p| self.executor.remove_dir(p)))
            .collect();

        PlanOutcomes {
            files,
            manifests,
            dirs,
        }
    }

    fn step<F>(
        &self,
        path: &std::path::Path,
        progress: Option<&CleanProgress>,
        op: F,
    ) -> RemovalOutcome
    where
        F: FnOnce(&std::path::Path) -> RemovalOutcome,
    {
        if self.is_cancelled() {
            return RemovalOutcome::Skipped {
                path: path.to_path_buf(),
                reason: "cancelled".to_string(),
            };
        }

        if let Some(prog) = progress {
            prog.set_current(path.display().to_string());
        }

        let outcome = op(path);

        if let Some(prog) = progress {
            prog.increment();
        }

        outcome
    }

    /// Get summary statistics from outcomes.
    pub fn summarize(outcomes: &PlanOutcomes) -> CleanSummary {
        let mut summary = CleanSummary::default();

        for outcome in &outcomes.files {
            match outcome {
                RemovalOutcome::Removed { freed_bytes, .. } => {
                    summary.files_removed += 1;
                    summary.total_freed += freed_bytes;
                }
                RemovalOutcome::Missing { .. } => summary.files_missing += 1,
                RemovalOutcome::Failed { .. } => summary.files_failed += 1,
                RemovalOutcome::Skipped { .. } => summary.skipped += 1,
                RemovalOutcome::Rewritten { .. } => {}
            }
        }

        for outcome in &outcomes.manifests {
            match outcome {
                RemovalOutcome::Rewritten { saved_bytes, .. } => {
                    summary.manifests_rewritten += 1;
                    summary.total_freed += saved_bytes;
                }
                RemovalOutcome::Failed { .. } => summary.manifests_failed += 1,
                RemovalOutcome::Skipped { .. } => summary.skipped += 1,
                _ => {}
            }
        }

        for outcome in &outcomes.dirs {
            match outcome {
                RemovalOutcome::Removed { .. } => summary.dirs_removed += 1,
                RemovalOutcome::Skipped { reason, .. } if reason == "cancelled" => {
                    summary.skipped += 1
                }
                RemovalOutcome::Skipped { .. } | RemovalOutcome::Missing { .. } => {
                    summary.dirs_skipped += 1
                }
                _ => {}
            }
        }

        summary
    }
}

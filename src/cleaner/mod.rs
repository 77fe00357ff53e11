//! Execution of removal plans.
//!
//! This module provides:
//! - Per-path removal and manifest rewrite operations
//! - Parallel plan execution with progress and summaries

mod executor;
mod orchestrator;

pub use executor::{CleanExecutor, CleanOptions, RemovalOutcome};
pub use orchestrator::{CleanProgress, CleanSummary, PlanExecutor, PlanOutcomes};

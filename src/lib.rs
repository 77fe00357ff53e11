//! modsweep - reclaim disk space wasted by non-essential files in node_modules
//!
//! This crate provides functionality for:
//! - Scanning an installed dependency tree into a deduplicated removal plan
//! - Minifying package manifests down to their runtime fields
//! - Executing a removal plan safely and in parallel

pub mod cleaner;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod scanner;
pub mod signals;

// Re-export commonly used types
pub use config::Config;
pub use error::{ManifestError, Result, SweeperError};
pub use scanner::{scan_tree, ScanOptions, ScanResult};

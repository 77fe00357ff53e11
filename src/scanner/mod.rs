//! Scan, classify and aggregate a dependency tree into a removal plan.

mod aggregate;
mod classifier;
mod engine;
mod entry;
mod manifest;
mod options;
mod rules;
mod subtree;
mod walker;

pub use aggregate::{ResultAggregator, ScanResult};
pub use classifier::{classify, Classification};
pub use engine::{scan_tree, scan_tree_with_rules};
pub use entry::Entry;
pub use manifest::{project_fields, write_atomic, ManifestMinifier, MinifyOutcome};
pub use options::ScanOptions;
pub use rules::{PackageRule, RuleSet, MANIFEST_FILE_NAME};
pub use subtree::{aggregate_subtree, aggregate_subtrees, SubtreeSummary};
pub use walker::{list_subtree, SubtreeListing, TreeWalker};

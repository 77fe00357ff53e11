//! Phase two: blanket enumeration of pruned directories.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use super::walker::list_subtree;

/// Everything beneath one pruned directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtreeSummary {
    /// The pruned directory itself.
    pub root: PathBuf,
    /// Sum of all file sizes beneath `root`.
    pub total_size: u64,
    /// Every file beneath `root`, whatever its own name or extension.
    pub files: Vec<(PathBuf, u64)>,
    /// Every directory beneath `root` (excluding `root`).
    pub dirs: Vec<PathBuf>,
}

/// Enumerate one pruned directory.
pub fn aggregate_subtree(root: &Path, follow_symlinks: bool) -> SubtreeSummary {
    let listing = list_subtree(root, follow_symlinks);
    let total_size = listing.files.iter().map(|(_, size)| size).sum();

    SubtreeSummary {
        root: root.to_path_buf(),
        total_size,
        files: listing.files,
        dirs: listing.dirs,
    }
}

/// Enumerate every pruned directory independently, in parallel.
pub fn aggregate_subtrees(roots: &[PathBuf], follow_symlinks: bool) -> Vec<SubtreeSummary> {
    roots
        .par_iter()
        .map(|root| aggregate_subtree(root, follow_symlinks))
        .collect()
}

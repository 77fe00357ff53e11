//! Merging every discovery mechanism into one deduplicated removal plan.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ManifestError;

use super::manifest::MinifyOutcome;
use super::subtree::SubtreeSummary;

/// Outcome of a scan: a removal plan plus the numbers needed to report on it.
#[derive(Debug, Default, Serialize)]
pub struct ScanResult {
    /// Sum of every visited file's size.
    pub total_size: u64,
    /// Distinct removed-file bytes plus manifest savings.
    pub reclaimable_size: u64,
    /// Number of manifests encountered outside pruned directories.
    pub package_count: u64,
    /// Every file slated for removal, each exactly once.
    pub file_set: BTreeSet<PathBuf>,
    /// Directories to remove once their files are gone.
    pub dir_set: BTreeSet<PathBuf>,
    /// Manifests minified in place.
    pub manifest_set: BTreeSet<PathBuf>,
    /// Bytes saved by manifest minification.
    pub manifest_saved_size: u64,
    /// Files found through per-package rules; also present in `file_set`.
    pub extra_removal_set: BTreeSet<PathBuf>,
    /// Manifests that could not be processed.
    #[serde(skip)]
    pub manifest_errors: Vec<ManifestError>,
}

impl ScanResult {
    pub fn file_count(&self) -> usize {
        self.file_set.len()
    }

    /// Reclaimable share of the scanned tree, 0.0 to 1.0.
    pub fn reclaimable_ratio(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            self.reclaimable_size as f64 / self.total_size as f64
        }
    }

    /// Directories ordered deepest first, the order they can be removed in.
    pub fn dirs_deepest_first(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self.dir_set.iter().cloned().collect();
        dirs.sort_by(|a, b| {
            b.components()
                .count()
                .cmp(&a.components().count())
                .then_with(|| b.cmp(a))
        });
        dirs
    }
}

/// Single-writer accumulator for phase-one hits, subtree enumerations and
/// manifest outcomes.
///
/// Files are keyed by path, so a path reported by several mechanisms only
/// ever contributes its size once.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    total_size: u64,
    package_count: u64,
    files: BTreeMap<PathBuf, u64>,
    dirs: BTreeSet<PathBuf>,
    manifests: BTreeMap<PathBuf, u64>,
    candidates: BTreeSet<PathBuf>,
    manifest_errors: Vec<ManifestError>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a visited file towards the total.
    pub fn record_visited(&mut self, size: u64) {
        self.total_size += size;
    }

    pub fn record_package(&mut self) {
        self.package_count += 1;
    }

    /// A file classified as reclaimable during phase one.
    pub fn add_direct_hit(&mut self, path: PathBuf, size: u64) {
        self.files.insert(path, size);
    }

    pub fn add_pruned_dir(&mut self, path: PathBuf) {
        self.dirs.insert(path);
    }

    /// One phase-two enumeration.
    pub fn add_subtree(&mut self, summary: SubtreeSummary) {
        self.dirs.insert(summary.root);
        self.dirs.extend(summary.dirs);
        self.files.extend(summary.files);
    }

    /// A successfully minified manifest and whatever its package rule found.
    pub fn add_manifest(&mut self, path: PathBuf, outcome: MinifyOutcome) {
        self.manifests.insert(path, outcome.saved_bytes);
        self.candidates.extend(outcome.removal_candidates);
        self.dirs.extend(outcome.extra_dirs);
    }

    pub fn add_manifest_error(&mut self, err: ManifestError) {
        self.manifest_errors.push(err);
    }

    /// Union everything and compute the final sizes.
    pub fn finish(mut self) -> ScanResult {
        // Candidates were never flagged during the walk, so anything new is
        // sized individually.
        let mut extra_removal_set = BTreeSet::new();
        for candidate in std::mem::take(&mut self.candidates) {
            if !self.files.contains_key(&candidate) {
                match on_disk_size(&candidate) {
                    Some(size) => {
                        self.files.insert(candidate.clone(), size);
                    }
                    None => continue,
                }
            }
            extra_removal_set.insert(candidate);
        }

        // A manifest that is itself being removed saves nothing by rewriting.
        let files = &self.files;
        self.manifests.retain(|path, _| !files.contains_key(path));

        let manifest_saved_size: u64 = self.manifests.values().sum();
        let removed_size: u64 = self.files.values().sum();

        ScanResult {
            total_size: self.total_size,
            reclaimable_size: removed_size + manifest_saved_size,
            package_count: self.package_count,
            file_set: self.files.into_keys().collect(),
            dir_set: self.dirs,
            manifest_set: self.manifests.into_keys().collect(),
            manifest_saved_size,
            extra_removal_set,
            manifest_errors: self.manifest_errors,
        }
    }
}

fn on_disk_size(path: &Path) -> Option<u64> {
    match fs::symlink_metadata(path) {
        Ok(meta) if !meta.is_dir() => Some(meta.len()),
        Ok(_) => None,
        Err(err) => {
            tracing::debug!(path = %path.display(), %err, "Removal candidate vanished");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_duplicate_paths_count_once() {
        let mut agg = ResultAggregator::new();
        agg.add_direct_hit(PathBuf::from("/nm/pkg/test/readme.md"), 100);
        agg.add_subtree(SubtreeSummary {
            root: PathBuf::from("/nm/pkg/test"),
            total_size: 300,
            files: vec![
                (PathBuf::from("/nm/pkg/test/readme.md"), 100),
                (PathBuf::from("/nm/pkg/test/a.js"), 200),
            ],
            dirs: vec![],
        });

        let result = agg.finish();

        assert_eq!(result.file_count(), 2);
        assert_eq!(result.reclaimable_size, 300);
        assert!(result.dir_set.contains(Path::new("/nm/pkg/test")));
    }

    #[test]
    fn test_candidates_are_sized_and_merged() {
        let tmp = TempDir::new().unwrap();
        let extra = tmp.path().join("ender.js");
        let known = tmp.path().join("known.js");
        fs::write(&extra, "x".repeat(40)).unwrap();
        fs::write(&known, "x".repeat(10)).unwrap();

        let mut agg = ResultAggregator::new();
        agg.add_direct_hit(known.clone(), 10);
        agg.add_manifest(
            tmp.path().join("package.json"),
            MinifyOutcome {
                saved_bytes: 7,
                removal_candidates: vec![extra.clone(), known.clone(), tmp.path().join("gone.js")],
                ..Default::default()
            },
        );

        let result = agg.finish();

        assert_eq!(result.reclaimable_size, 40 + 10 + 7);
        assert_eq!(result.manifest_saved_size, 7);
        assert!(result.file_set.contains(&extra));
        assert!(result.extra_removal_set.contains(&extra));
        assert!(result.extra_removal_set.contains(&known));
        assert!(!result.extra_removal_set.contains(&tmp.path().join("gone.js")));
        assert!(result.extra_removal_set.is_subset(&result.file_set));
    }

    #[test]
    fn test_removed_manifest_saves_nothing() {
        let mut agg = ResultAggregator::new();
        let manifest = PathBuf::from("/nm/pkg/src/package.json");
        agg.add_direct_hit(manifest.clone(), 80);
        agg.add_manifest(
            manifest.clone(),
            MinifyOutcome {
                saved_bytes: 50,
                ..Default::default()
            },
        );

        let result = agg.finish();

        assert!(result.manifest_set.is_empty());
        assert_eq!(result.manifest_saved_size, 0);
        assert_eq!(result.reclaimable_size, 80);
    }

    #[test]
    fn test_dirs_deepest_first() {
        let mut agg = ResultAggregator::new();
        agg.add_pruned_dir(PathBuf::from("/nm/a/test"));
        agg.add_subtree(SubtreeSummary {
            root: PathBuf::from("/nm/b/docs"),
            dirs: vec![
                PathBuf::from("/nm/b/docs/api"),
                PathBuf::from("/nm/b/docs/api/v1"),
            ],
            ..Default::default()
        });

        let dirs = agg.finish().dirs_deepest_first();

        assert_eq!(dirs[0], PathBuf::from("/nm/b/docs/api/v1"));
        let pos = |p: &str| dirs.iter().position(|d| d == Path::new(p)).unwrap();
        assert!(pos("/nm/b/docs/api") < pos("/nm/b/docs"));
    }

    #[test]
    fn test_ratio() {
        let mut agg = ResultAggregator::new();
        agg.record_visited(1000);
        agg.add_direct_hit(PathBuf::from("/nm/x/license"), 250);

        let result = agg.finish();
        assert!((result.reclaimable_ratio() - 0.25).abs() < f64::EPSILON);
        assert_eq!(ScanResult::default().reclaimable_ratio(), 0.0);
    }
}

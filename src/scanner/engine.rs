//! Two-phase scan driver.
//!
//! Phase one walks the whole tree once, classifying entries. Phase two
//! enumerates each pruned directory and minifies each manifest, in parallel.
//! All results are merged by a single [`ResultAggregator`] afterwards.
//!
//! Entries beneath a directory already marked for pruning still count towards
//! the total size, and manifests there still count as packages, but nothing
//! else is classified: phase two enumerates those files anyway. Such manifests
//! are removed with their directory rather than minified.

use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::error::{ManifestError, Result, SweeperError};

use super::aggregate::{ResultAggregator, ScanResult};
use super::classifier::{classify, Classification};
use super::manifest::{ManifestMinifier, MinifyOutcome};
use super::options::ScanOptions;
use super::rules::{RuleSet, MANIFEST_FILE_NAME};
use super::subtree::{aggregate_subtrees, SubtreeSummary};
use super::walker::TreeWalker;

struct PhaseOne {
    aggregator: ResultAggregator,
    pruned: Vec<PathBuf>,
    manifests: Vec<PathBuf>,
}

type ManifestOutcome = (PathBuf, std::result::Result<MinifyOutcome, ManifestError>);

/// Scan a dependency tree with the built-in rules.
pub fn scan_tree(root: &Path, options: &ScanOptions) -> Result<ScanResult> {
    scan_tree_with_rules(root, RuleSet::builtin(), options)
}

/// Scan a dependency tree and produce a deduplicated removal plan.
pub fn scan_tree_with_rules(
    root: &Path,
    rules: &RuleSet,
    options: &ScanOptions,
) -> Result<ScanResult> {
    let root = resolve_root(root)?;

    tracing::info!(root = %root.display(), "Phase one: classifying entries");
    let PhaseOne {
        mut aggregator,
        pruned,
        manifests,
    } = walk_phase_one(&root, rules, options)?;

    tracing::info!(
        pruned = pruned.len(),
        manifests = manifests.len(),
        "Phase two: enumerating pruned directories and minifying manifests"
    );

    let run = || run_phase_two(&pruned, &manifests, rules, options);
    let (subtrees, manifest_outcomes) = match rayon::ThreadPoolBuilder::new()
        .num_threads(options.threads)
        .build()
    {
        Ok(pool) => pool.install(run),
        Err(err) => {
            tracing::warn!(%err, "Could not build thread pool, using the global one");
            run()
        }
    };

    if options.is_cancelled() {
        return Err(SweeperError::Cancelled);
    }

    for summary in subtrees {
        aggregator.add_subtree(summary);
    }

    for (path, outcome) in manifest_outcomes {
        match outcome {
            Ok(outcome) => aggregator.add_manifest(path, outcome),
            Err(err) => {
                tracing::warn!(%err, "Skipping manifest");
                aggregator.add_manifest_error(err);
            }
        }
    }

    let result = aggregator.finish();
    tracing::info!(
        files = result.file_count(),
        dirs = result.dir_set.len(),
        reclaimable = result.reclaimable_size,
        "Scan complete"
    );

    Ok(result)
}

fn resolve_root(root: &Path) -> Result<PathBuf> {
    let resolved = root.canonicalize().map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SweeperError::PathNotFound(root.to_path_buf()),
        _ => SweeperError::Io {
            path: root.to_path_buf(),
            source: e,
        },
    })?;

    if !resolved.is_dir() {
        return Err(SweeperError::NotADirectory(root.to_path_buf()));
    }

    Ok(resolved)
}

fn walk_phase_one(root: &Path, rules: &RuleSet, options: &ScanOptions) -> Result<PhaseOne> {
    let mut phase = PhaseOne {
        aggregator: ResultAggregator::new(),
        pruned: Vec::new(),
        manifests: Vec::new(),
    };

    // Pre-order walk: once an entry is outside the active pruned directory,
    // every later entry is too.
    let mut active_prune: Option<PathBuf> = None;

    for entry in TreeWalker::with_options(root, options.follow_symlinks) {
        if options.is_cancelled() {
            return Err(SweeperError::Cancelled);
        }

        if !entry.is_dir {
            phase.aggregator.record_visited(entry.size);
        }

        if let Some(pruned) = &active_prune {
            if entry.path.starts_with(pruned) {
                if !entry.is_dir && entry.lower_name() == MANIFEST_FILE_NAME {
                    phase.aggregator.record_package();
                }
                continue;
            }
            active_prune = None;
        }

        match classify(&entry, rules) {
            Classification::Reclaim => phase.aggregator.add_direct_hit(entry.path, entry.size),
            Classification::Manifest => {
                phase.aggregator.record_package();
                phase.manifests.push(entry.path);
            }
            Classification::Prune => {
                phase.aggregator.add_pruned_dir(entry.path.clone());
                phase.pruned.push(entry.path.clone());
                active_prune = Some(entry.path);
            }
            Classification::Keep | Classification::Descend => {}
        }
    }

    Ok(phase)
}

fn run_phase_two(
    pruned: &[PathBuf],
    manifests: &[PathBuf],
    rules: &RuleSet,
    options: &ScanOptions,
) -> (Vec<SubtreeSummary>, Vec<ManifestOutcome>) {
    let minifier = ManifestMinifier::new(rules).with_follow_symlinks(options.follow_symlinks);

    rayon::join(
        || aggregate_subtrees(pruned, options.follow_symlinks),
        || {
            manifests
                .par_iter()
                .filter(|_| !options.is_cancelled())
                .map(|path| {
                    (
                        path.clone(),
                        minifier.minify(path, options.write_manifests),
                    )
                })
                .collect()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::rules::PackageRule;
    use std::fs;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_missing_root() {
        let err = scan_tree(Path::new("/nonexistent/path/12345"), &ScanOptions::default())
            .unwrap_err();
        assert!(matches!(err, SweeperError::PathNotFound(_)));
    }

    #[test]
    fn test_root_must_be_directory() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("package.json");
        fs::write(&file, "{}").unwrap();

        let err = scan_tree(&file, &ScanOptions::default()).unwrap_err();
        assert!(matches!(err, SweeperError::NotADirectory(_)));
    }

    #[test]
    fn test_cancelled_scan() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("license"), "x").unwrap();

        let flag = Arc::new(AtomicBool::new(true));
        let options = ScanOptions::new().with_cancel_flag(flag);

        let err = scan_tree(tmp.path(), &options).unwrap_err();
        assert!(matches!(err, SweeperError::Cancelled));
    }

    #[test]
    fn test_nested_pruned_dirs_are_one_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("pkg/test/docs")).unwrap();
        fs::write(root.join("pkg/test/docs/api.html"), "x".repeat(10)).unwrap();
        fs::write(root.join("pkg/test/run.js"), "x".repeat(20)).unwrap();

        let result = scan_tree(&root, &ScanOptions::default()).unwrap();

        assert_eq!(result.file_count(), 2);
        assert_eq!(result.reclaimable_size, 30);
        assert!(result.dir_set.contains(&root.join("pkg/test")));
        assert!(result.dir_set.contains(&root.join("pkg/test/docs")));
    }

    #[test]
    fn test_manifest_inside_pruned_dir_is_removed_not_minified() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("pkg/test/fixture")).unwrap();
        fs::write(root.join("pkg/test/fixture/package.json"), "{ broken").unwrap();

        let result = scan_tree(&root, &ScanOptions::default()).unwrap();

        assert_eq!(result.package_count, 1);
        assert!(result.manifest_set.is_empty());
        assert!(result.manifest_errors.is_empty());
        assert!(result
            .file_set
            .contains(&root.join("pkg/test/fixture/package.json")));
    }

    #[test]
    fn test_manifests_in_pruned_dirs_count_as_packages() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        let pkg = root.join("pkg");
        fs::create_dir_all(pkg.join("test/fixture")).unwrap();
        fs::write(pkg.join("package.json"), r#"{"name":"pkg","version":"1.0.0"}"#).unwrap();
        fs::write(pkg.join("test/fixture/package.json"), r#"{"name":"fixture"}"#).unwrap();

        let result = scan_tree(&root, &ScanOptions::default()).unwrap();

        assert_eq!(result.package_count, 2);
        assert_eq!(result.manifest_set.len(), 1);
        assert!(result.manifest_set.contains(&pkg.join("package.json")));
        assert!(result
            .file_set
            .contains(&pkg.join("test/fixture/package.json")));
    }

    #[test]
    fn test_package_rule_extras_reach_plan() {
        const RULES: RuleSet = RuleSet {
            file_names: &[],
            extensions: &[],
            js_suffixes: &[],
            dir_names: &[],
            packages: &[PackageRule {
                name: "fat-pkg",
                extra_dirs: &["bundles"],
                extra_files: &["extra.js"],
            }],
            manifest_fields: &["name"],
        };

        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        let pkg = root.join("fat-pkg");
        fs::create_dir_all(pkg.join("bundles")).unwrap();
        fs::write(pkg.join("package.json"), r#"{"name":"fat-pkg"}"#).unwrap();
        fs::write(pkg.join("extra.js"), "x".repeat(11)).unwrap();
        fs::write(pkg.join("bundles/all.js"), "x".repeat(22)).unwrap();

        let result = scan_tree_with_rules(&root, &RULES, &ScanOptions::default()).unwrap();

        assert_eq!(result.extra_removal_set.len(), 2);
        assert_eq!(result.reclaimable_size, 33);
        assert!(result.dir_set.contains(&pkg.join("bundles")));
        assert!(result.manifest_set.contains(&pkg.join("package.json")));
    }
}

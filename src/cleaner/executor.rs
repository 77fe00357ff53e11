//! Per-path operations of a removal plan.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::scanner::{ManifestMinifier, RuleSet};

/// Result of one operation of the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// File or directory removed.
    Removed { path: PathBuf, freed_bytes: u64 },
    /// Manifest rewritten to its minified form.
    Rewritten { path: PathBuf, saved_bytes: u64 },
    /// Path was already gone.
    Missing { path: PathBuf },
    /// Operation not attempted or not applicable (cancelled, directory not empty).
    Skipped { path: PathBuf, reason: String },
    /// Operation failed.
    Failed { path: PathBuf, error: String },
}

impl RemovalOutcome {
    pub fn path(&self) -> &Path {
        match self {
            RemovalOutcome::Removed { path, .. }
            | RemovalOutcome::Rewritten { path, .. }
            | RemovalOutcome::Missing { path }
            | RemovalOutcome::Skipped { path, .. }
            | RemovalOutcome::Failed { path, .. } => path,
        }
    }
}

/// Options for the clean executor.
#[derive(Debug, Clone)]
pub struct CleanOptions {
    /// If true, don't actually touch anything.
    pub dry_run: bool,
    /// If true, rewrite manifests to their minified form.
    pub minify_manifests: bool,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            minify_manifests: true,
        }
    }
}

/// Executes single plan operations. Never panics or aborts on a failing path.
pub struct CleanExecutor {
    options: CleanOptions,
    rules: &'static RuleSet,
}

impl CleanExecutor {
    /// Create a new executor with the given options.
    pub fn new(options: CleanOptions) -> Self {
        Self {
            options,
            rules: RuleSet::builtin(),
        }
    }

    pub fn options(&self) -> &CleanOptions {
        &self.options
    }

    /// Unlink one file.
    pub fn remove_file(&self, path: &Path) -> RemovalOutcome {
        let size = match fs::symlink_metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return RemovalOutcome::Missing {
                    path: path.to_path_buf(),
                }
            }
            Err(e) => return failed(path, e),
        };

        if self.options.dry_run {
            return RemovalOutcome::Removed {
                path: path.to_path_buf(),
                freed_bytes: size,
            };
        }

        match fs::remove_file(path) {
            Ok(()) => RemovalOutcome::Removed {
                path: path.to_path_buf(),
                freed_bytes: size,
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => RemovalOutcome::Missing {
                path: path.to_path_buf(),
            },
            Err(e) => failed(path, e),
        }
    }

    /// Remove one directory if it is empty.
    ///
    /// A directory that still has content is skipped, not failed: the plan
    /// only removes directories whose files it removed itself.
    pub fn remove_dir(&self, path: &Path) -> RemovalOutcome {
        if self.options.dry_run {
            return if path.is_dir() {
                RemovalOutcome::Removed {
                    path: path.to_path_buf(),
                    freed_bytes: 0,
                }
            } else {
                RemovalOutcome::Missing {
                    path: path.to_path_buf(),
                }
            };
        }

        match fs::remove_dir(path) {
            Ok(()) => RemovalOutcome::Removed {
                path: path.to_path_buf(),
                freed_bytes: 0,
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => RemovalOutcome::Missing {
                path: path.to_path_buf(),
            },
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Leaving directory in place");
                RemovalOutcome::Skipped {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Rewrite a manifest to its minified form. Per-package extras were
    /// already planned by the scan and are not looked up again.
    pub fn rewrite_manifest(&self, path: &Path) -> RemovalOutcome {
        let write = !self.options.dry_run;
        match ManifestMinifier::new(self.rules).rewrite(path, write) {
            Ok(outcome) => RemovalOutcome::Rewritten {
                path: path.to_path_buf(),
                saved_bytes: outcome.saved_bytes,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Manifest rewrite failed");
                RemovalOutcome::Failed {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                }
            }
        }
    }
}

fn failed(path: &Path, e: io::Error) -> RemovalOutcome {
    tracing::debug!(path = %path.display(), error = %e, "Removal failed");
    RemovalOutcome::Failed {
        path: path.to_path_buf(),
        error: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn executor(dry_run: bool) -> CleanExecutor {
        CleanExecutor::new(CleanOptions {
            dry_run,
            minify_manifests: true,
        })
    }

    #[test]
    fn test_remove_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("license");
        fs::write(&file, "x".repeat(100)).unwrap();

        let outcome = executor(false).remove_file(&file);

        assert_eq!(
            outcome,
            RemovalOutcome::Removed {
                path: file.clone(),
                freed_bytes: 100
            }
        );
        assert!(!file.exists());
    }

    #[test]
    fn test_remove_file_dry_run() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("license");
        fs::write(&file, "x".repeat(100)).unwrap();

        let outcome = executor(true).remove_file(&file);

        assert!(matches!(outcome, RemovalOutcome::Removed { freed_bytes: 100, .. }));
        assert!(file.exists());
    }

    #[test]
    fn test_remove_missing_file() {
        let tmp = TempDir::new().unwrap();
        let outcome = executor(false).remove_file(&tmp.path().join("gone"));
        assert!(matches!(outcome, RemovalOutcome::Missing { .. }));
    }

    #[test]
    fn test_remove_dir_not_empty_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("docs");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("keep.html"), "x").unwrap();

        let outcome = executor(false).remove_dir(&dir);

        assert!(matches!(outcome, RemovalOutcome::Skipped { .. }));
        assert!(dir.exists());
    }

    #[test]
    fn test_remove_empty_dir() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("docs");
        fs::create_dir(&dir).unwrap();

        assert!(matches!(
            executor(false).remove_dir(&dir),
            RemovalOutcome::Removed { .. }
        ));
        assert!(!dir.exists());
        assert!(matches!(
            executor(false).remove_dir(&dir),
            RemovalOutcome::Missing { .. }
        ));
    }

    #[test]
    fn test_rewrite_manifest() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("package.json");
        fs::write(
            &path,
            r#"{ "name": "a", "version": "1.0.0", "description": "dropped" }"#,
        )
        .unwrap();

        let outcome = executor(false).rewrite_manifest(&path);

        assert!(matches!(outcome, RemovalOutcome::Rewritten { saved_bytes, .. } if saved_bytes > 0));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            r#"{"name":"a","version":"1.0.0"}"#
        );
    }

    #[test]
    fn test_rewrite_malformed_manifest_fails() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("package.json");
        fs::write(&path, "not json").unwrap();

        let outcome = executor(false).rewrite_manifest(&path);

        assert!(matches!(outcome, RemovalOutcome::Failed { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "not json");
    }
}

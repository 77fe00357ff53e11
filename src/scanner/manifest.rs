//! Package manifest minification.
//!
//! A manifest is an open JSON object. Minification is a whitelist projection:
//! only the fields named in [`RuleSet::manifest_fields`] survive, in whitelist
//! order, and everything else (custom fields included) is dropped. The loss is
//! deliberate; installed packages only need the fields a resolver or loader
//! reads at runtime.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::ManifestError;

use super::rules::RuleSet;
use super::walker::list_subtree;

/// What minifying one manifest produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MinifyOutcome {
    /// Declared package name, if any.
    pub package_name: Option<String>,
    /// Original size minus minified size.
    pub saved_bytes: u64,
    /// Files named by a per-package rule, plus every file under its extra
    /// directories. Not deduplicated against anything else.
    pub removal_candidates: Vec<PathBuf>,
    /// Extra directories from a per-package rule and every directory below them.
    pub extra_dirs: Vec<PathBuf>,
    /// True if the minified form was written back.
    pub written: bool,
}

/// Reads, projects and optionally rewrites package manifests.
#[derive(Debug, Clone, Copy)]
pub struct ManifestMinifier<'a> {
    rules: &'a RuleSet,
    follow_symlinks: bool,
}

impl<'a> ManifestMinifier<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        Self {
            rules,
            follow_symlinks: false,
        }
    }

    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Minify the manifest at `path` and resolve any per-package rule.
    ///
    /// With `write == false` nothing on disk changes; the savings are computed
    /// all the same. With `write == true` the minified form replaces the file
    /// atomically, and only if it differs from the original.
    pub fn minify(&self, path: &Path, write: bool) -> Result<MinifyOutcome, ManifestError> {
        let mut outcome = self.rewrite(path, write)?;

        if let (Some(name), Some(base)) = (outcome.package_name.clone(), path.parent()) {
            self.resolve_extras(&name, base, &mut outcome);
        }

        Ok(outcome)
    }

    /// Project and optionally write back the manifest, without looking at
    /// the package's other files. Removal candidates are always empty.
    pub fn rewrite(&self, path: &Path, write: bool) -> Result<MinifyOutcome, ManifestError> {
        let original = fs::read(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let value: Value =
            serde_json::from_slice(&original).map_err(|source| ManifestError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let Value::Object(fields) = value else {
            return Err(ManifestError::NotAnObject(path.to_path_buf()));
        };

        let minified = serde_json::to_vec(&Value::Object(project_fields(&fields, self.rules)))
            .map_err(|source| ManifestError::Serialize {
                path: path.to_path_buf(),
                source,
            })?;

        let mut outcome = MinifyOutcome {
            package_name: fields.get("name").and_then(Value::as_str).map(str::to_string),
            saved_bytes: (original.len() as u64).saturating_sub(minified.len() as u64),
            ..MinifyOutcome::default()
        };

        if write && minified != original {
            write_atomic(path, &minified).map_err(|source| ManifestError::Write {
                path: path.to_path_buf(),
                source,
            })?;
            outcome.written = true;
        }

        Ok(outcome)
    }

    fn resolve_extras(&self, name: &str, base: &Path, outcome: &mut MinifyOutcome) {
        let Some(rule) = self.rules.package_rule(name) else {
            return;
        };

        tracing::debug!(package = name, dir = %base.display(), "Applying package rule");

        for file in rule.extra_files {
            let candidate = base.join(file);
            match fs::symlink_metadata(&candidate) {
                Ok(meta) if !meta.is_dir() => outcome.removal_candidates.push(candidate),
                _ => {}
            }
        }

        for dir in rule.extra_dirs {
            let candidate = base.join(dir);
            let is_dir = fs::symlink_metadata(&candidate)
                .map(|m| m.is_dir())
                .unwrap_or(false);
            if !is_dir {
                continue;
            }

            let listing = list_subtree(&candidate, self.follow_symlinks);
            outcome
                .removal_candidates
                .extend(listing.files.into_iter().map(|(path, _)| path));
            outcome.extra_dirs.push(candidate);
            outcome.extra_dirs.extend(listing.dirs);
        }
    }
}

/// Keep only whitelisted fields, in whitelist order. Absent fields are omitted.
pub fn project_fields(fields: &Map<String, Value>, rules: &RuleSet) -> Map<String, Value> {
    rules
        .manifest_fields
        .iter()
        .filter_map(|key| fields.get(*key).map(|v| (key.to_string(), v.clone())))
        .collect()
}

/// Replace `path` with `contents` via a sibling temp file and a rename, so a
/// reader sees either the old file or the new one, never a partial write.
///
/// A symlinked `path` stays a symlink: its target is what gets replaced. The
/// existing file's permissions carry over to the new one.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let target = match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => fs::canonicalize(path)?,
        _ => path.to_path_buf(),
    };

    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = target.with_file_name(format!(".{}.modsweep-tmp", file_name));

    let permissions = match fs::metadata(&target) {
        Ok(meta) => Some(meta.permissions()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(e),
    };

    let result = fs::write(&tmp_path, contents)
        .and_then(|()| match permissions {
            Some(perms) => fs::set_permissions(&tmp_path, perms),
            None => Ok(()),
        })
        .and_then(|()| fs::rename(&tmp_path, &target));

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

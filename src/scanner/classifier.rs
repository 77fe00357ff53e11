//! Per-entry keep/reclaim/prune decisions.

use std::path::Path;

use super::entry::Entry;
use super::rules::{RuleSet, MANIFEST_FILE_NAME};

/// Decision for a single walked entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// File that stays.
    Keep,
    /// File slated for removal.
    Reclaim,
    /// Package manifest; rewritten, never removed.
    Manifest,
    /// Directory the walk simply continues into.
    Descend,
    /// Directory removed with everything beneath it.
    Prune,
}

/// Classify an entry against the rule tables.
///
/// For files the order is: manifest, hidden, file name, extension, `.js`
/// compound suffix. Directories only consult the directory-name table.
pub fn classify(entry: &Entry, rules: &RuleSet) -> Classification {
    let name = entry.lower_name();

    if entry.is_dir {
        return if rules.is_blacklisted_dir(&name) {
            Classification::Prune
        } else {
            Classification::Descend
        };
    }

    if name == MANIFEST_FILE_NAME {
        return Classification::Manifest;
    }

    if name.starts_with('.') {
        return Classification::Reclaim;
    }

    if rules.is_blacklisted_name(&name) {
        return Classification::Reclaim;
    }

    let ext = lower_extension(&entry.path);
    if let Some(ext) = ext.as_deref() {
        if rules.is_blacklisted_extension(ext) {
            return Classification::Reclaim;
        }
        if ext == ".js" && rules.matches_js_suffix(&name) {
            return Classification::Reclaim;
        }
    }

    Classification::Keep
}

fn lower_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
}

use std::fs::Metadata;
use std::path::PathBuf;

use serde::Serialize;

/// One filesystem node visited during a walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Full path to the file or directory
    pub path: PathBuf,

    /// Apparent size in bytes (0 for directories)
    pub size: u64,

    /// True if this is a directory
    pub is_dir: bool,
}

impl Entry {
    pub fn new_file(path: PathBuf, size: u64) -> Self {
        Self {
            path,
            size,
            is_dir: false,
        }
    }

    pub fn new_dir(path: PathBuf) -> Self {
        Self {
            path,
            size: 0,
            is_dir: true,
        }
    }

    /// Build an entry from metadata already fetched by the walker.
    ///
    /// Directory metadata size is platform dependent, so directories report 0.
    pub fn from_metadata(path: PathBuf, metadata: &Metadata) -> Self {
        if metadata.is_dir() {
            Self::new_dir(path)
        } else {
            Self::new_file(path, metadata.len())
        }
    }

    /// Lowercase last path component, used for every rule lookup.
    pub fn lower_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }
}

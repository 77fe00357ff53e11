use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::entry::Entry;

/// Lazy pre-order enumeration of every file and directory below a root.
///
/// The root itself is not yielded. Parents are always yielded before their
/// children and nothing is ever pruned; entries that vanish or cannot be
/// read between listing and stat are skipped.
pub struct TreeWalker {
    inner: walkdir::IntoIter,
}

impl TreeWalker {
    pub fn new(root: &Path) -> Self {
        Self::with_options(root, false)
    }

    pub fn with_options(root: &Path, follow_symlinks: bool) -> Self {
        let inner = WalkDir::new(root)
            .min_depth(1)
            .follow_links(follow_symlinks)
            .sort_by_file_name()
            .into_iter();
        Self { inner }
    }
}

impl Iterator for TreeWalker {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        loop {
            let entry = match self.inner.next()? {
                Ok(e) => e,
                Err(err) => {
                    tracing::debug!(path = ?err.path(), %err, "Skipping unreadable entry");
                    continue;
                }
            };

            match entry.metadata() {
                Ok(metadata) => return Some(Entry::from_metadata(entry.into_path(), &metadata)),
                Err(err) => {
                    tracing::debug!(path = %entry.path().display(), %err, "Skipping entry without metadata");
                    continue;
                }
            }
        }
    }
}

/// Every file and directory beneath `root`, split by kind.
#[derive(Debug, Default, Clone)]
pub struct SubtreeListing {
    pub files: Vec<(PathBuf, u64)>,
    pub dirs: Vec<PathBuf>,
}

/// Walk a whole subtree, collecting files with their sizes and all nested
/// directories. The root is not part of the listing.
pub fn list_subtree(root: &Path, follow_symlinks: bool) -> SubtreeListing {
    let mut listing = SubtreeListing::default();
    for entry in TreeWalker::with_options(root, follow_symlinks) {
        if entry.is_dir {
            listing.dirs.push(entry.path);
        } else {
            listing.files.push((entry.path, entry.size));
        }
    }
    listing
}

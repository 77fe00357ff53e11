use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Configuration options for a dependency tree scan.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Number of parallel threads for phase two and manifests (0 = auto)
    pub threads: usize,

    /// Follow symbolic links
    pub follow_symlinks: bool,

    /// Write minified manifests back while scanning
    pub write_manifests: bool,

    /// Set from outside to abort an in-flight scan
    pub cancel: Option<Arc<AtomicBool>>,
}

impl ScanOptions {
    /// Create a new ScanOptions with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set number of parallel threads
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set whether to follow symbolic links
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Set whether manifests are rewritten during the scan
    pub fn with_write_manifests(mut self, write: bool) -> Self {
        self.write_manifests = write;
        self
    }

    /// Attach a cancellation flag
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}

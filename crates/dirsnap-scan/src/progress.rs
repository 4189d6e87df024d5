//! Scan progress reporting.

use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Minimum wall-clock time between two progress updates.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(250);

/// Progress snapshot emitted during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanProgress {
    /// Entry most recently processed (the root for the first and last update).
    pub current_path: PathBuf,
    /// Files and symlinks discovered so far.
    pub files_discovered: u64,
    /// Directories discovered so far.
    pub folders_discovered: u64,
    /// Time elapsed since the scan started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Create initial progress state for a root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            current_path: root.into(),
            files_discovered: 0,
            folders_discovered: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Get total items discovered (files + folders).
    pub fn total_items(&self) -> u64 {
        self.files_discovered + self.folders_discovered
    }
}

/// Counts discovered entries and decides when the next update is due.
///
/// Emission is gated on wall-clock time only, so a fast walk does not flood
/// the consumer and a slow one still reports steadily.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start_time: Instant,
    last_emit: Instant,
    interval: Duration,
    files: u64,
    folders: u64,
}

impl ProgressTracker {
    pub fn new(interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            start_time: now,
            last_emit: now,
            interval,
            files: 0,
            folders: 0,
        }
    }

    pub fn record_file(&mut self) {
        self.files += 1;
    }

    pub fn record_folder(&mut self) {
        self.folders += 1;
    }

    pub fn files(&self) -> u64 {
        self.files
    }

    pub fn folders(&self) -> u64 {
        self.folders
    }

    /// Returns true (and resets the timer) if an update is due.
    pub fn due(&mut self) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last_emit) >= self.interval {
            self.last_emit = now;
            true
        } else {
            false
        }
    }

    pub fn snapshot(&self, current_path: PathBuf) -> ScanProgress {
        ScanProgress {
            current_path,
            files_discovered: self.files,
            folders_discovered: self.folders,
            elapsed: self.start_time.elapsed(),
        }
    }
}

//! JWalk-based directory scanner.

use std::ffi::OsStr;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use jwalk::{DirEntry, Parallelism, WalkDirGeneric};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use dirsnap_core::{NodeKind, ScanError, ScanOptions, ScanResult, ScanWarning};

use crate::arena::{FlatNode, FlatTree};
use crate::progress::{PROGRESS_INTERVAL, ProgressTracker, ScanProgress};

/// Capacity of the progress broadcast channel.
const PROGRESS_CHANNEL_SIZE: usize = 100;

/// Metadata fetched for an entry while its directory batch is read.
#[derive(Debug, Clone, Copy)]
struct EntryMeta {
    len: u64,
    modified: SystemTime,
    is_dir: bool,
    is_symlink: bool,
}

impl EntryMeta {
    fn from_metadata(metadata: &Metadata) -> Self {
        let file_type = metadata.file_type();
        Self {
            len: metadata.len(),
            modified: metadata.modified().unwrap_or(UNIX_EPOCH),
            is_dir: file_type.is_dir(),
            is_symlink: file_type.is_symlink(),
        }
    }

    fn kind(&self) -> NodeKind {
        if self.is_symlink {
            NodeKind::Symlink
        } else if self.is_dir {
            NodeKind::Directory
        } else {
            NodeKind::File
        }
    }
}

/// Per-entry client state carried through jwalk.
#[derive(Debug, Default)]
struct Prefetched(Option<std::io::Result<EntryMeta>>);

type ScanState = ((), Prefetched);

/// Single-threaded scanner using jwalk for traversal.
///
/// The walk itself is serial; a second context may cancel it through the
/// [`CancellationToken`] and observe progress through [`subscribe`].
///
/// [`subscribe`]: WalkScanner::subscribe
pub struct WalkScanner {
    progress_tx: broadcast::Sender<ScanProgress>,
    progress_interval: Duration,
}

impl WalkScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(PROGRESS_CHANNEL_SIZE);
        Self {
            progress_tx,
            progress_interval: PROGRESS_INTERVAL,
        }
    }

    /// Emit progress at most once per `interval` instead of
    /// [`PROGRESS_INTERVAL`]. Zero reports every entry.
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Scan `options.root` and return the aggregated tree.
    ///
    /// `on_progress` is called inline from the walking thread, at most once
    /// per progress interval plus once at the start and once at the end.
    /// The same updates go to broadcast subscribers.
    pub fn scan<F>(
        &self,
        options: &ScanOptions,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> Result<ScanResult, ScanError>
    where
        F: FnMut(&ScanProgress),
    {
        let start = Instant::now();
        let root_path = validate_root(&options.root)?;
        let root_metadata =
            std::fs::metadata(&root_path).map_err(|e| ScanError::root_io(&root_path, e))?;

        debug!(root = %root_path.display(), ?options, "starting scan");

        let mut tracker = ProgressTracker::new(self.progress_interval);
        self.emit(&mut on_progress, ScanProgress::new(&root_path));

        let root_node = FlatNode {
            name: root_name(&root_path),
            path: root_path.to_string_lossy().into_owned(),
            kind: NodeKind::Directory,
            size: 0,
            modified: to_utc(root_metadata.modified().unwrap_or(UNIX_EPOCH)),
        };
        let mut tree = FlatTree::new(root_path.clone(), root_node);
        let mut warnings: Vec<String> = Vec::new();

        for entry_result in walker(&root_path, options) {
            if cancel.is_cancelled() {
                debug!(root = %root_path.display(), "scan cancelled");
                return Err(ScanError::Cancelled);
            }

            let mut entry = match entry_result {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    record_warning(&mut warnings, ScanWarning::read_error(path, err.to_string()));
                    continue;
                }
            };

            // Root is seeded above.
            if entry.depth() == 0 {
                continue;
            }

            let path = entry.path();
            let meta = match entry.client_state.0.take() {
                Some(Ok(meta)) => meta,
                Some(Err(err)) => {
                    record_warning(&mut warnings, ScanWarning::from_io(&path, &err));
                    continue;
                }
                None => match std::fs::symlink_metadata(&path) {
                    Ok(metadata) => EntryMeta::from_metadata(&metadata),
                    Err(err) => {
                        record_warning(&mut warnings, ScanWarning::from_io(&path, &err));
                        continue;
                    }
                },
            };

            let kind = meta.kind();
            let node = FlatNode {
                name: CompactString::new(entry.file_name().to_string_lossy()),
                path: path.to_string_lossy().into_owned(),
                kind,
                size: if kind.is_dir() { 0 } else { meta.len },
                modified: to_utc(meta.modified),
            };

            if !tree.insert(entry.parent_path(), path.clone(), node) {
                record_warning(&mut warnings, ScanWarning::orphaned(&path));
                continue;
            }

            // The folder stays in the tree, without children.
            if let Some(err) = entry.read_children_error.take() {
                record_warning(&mut warnings, read_children_warning(&path, &err));
            }

            if kind.is_dir() {
                tracker.record_folder();
            } else {
                tracker.record_file();
            }

            if tracker.due() {
                self.emit(&mut on_progress, tracker.snapshot(path));
            }
        }

        self.emit(&mut on_progress, tracker.snapshot(root_path.clone()));

        tree.aggregate_sizes();
        let root = tree.assemble();

        debug!(
            files = tracker.files(),
            folders = tracker.folders(),
            warnings = warnings.len(),
            size = root.size,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "scan complete"
        );

        Ok(ScanResult {
            root,
            total_files: tracker.files(),
            total_folders: tracker.folders(),
            scanned_at: Utc::now(),
            root_path: root_path.to_string_lossy().into_owned(),
            warnings,
        })
    }

    fn emit<F: FnMut(&ScanProgress)>(&self, on_progress: &mut F, progress: ScanProgress) {
        on_progress(&progress);
        // No subscribers is fine.
        let _ = self.progress_tx.send(progress);
    }
}

impl Default for WalkScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Check the root exists and is a directory, and make it absolute.
fn validate_root(root: &Path) -> Result<PathBuf, ScanError> {
    let metadata = std::fs::metadata(root).map_err(|e| ScanError::root_io(root, e))?;
    if !metadata.is_dir() {
        return Err(ScanError::RootNotDirectory {
            path: root.to_path_buf(),
        });
    }
    root.canonicalize().map_err(|e| ScanError::root_io(root, e))
}

/// Build the serial walker.
///
/// Each directory batch is filtered for hidden names and has its metadata
/// fetched in one go. Symlinks and entries without metadata are never
/// descended into.
fn walker(root: &Path, options: &ScanOptions) -> WalkDirGeneric<ScanState> {
    // Owned copy for the hook, without the passphrase.
    let filter = ScanOptions {
        encryption_passphrase: None,
        ..options.clone()
    };

    WalkDirGeneric::<ScanState>::new(root)
        .parallelism(Parallelism::Serial)
        .skip_hidden(false)
        .follow_links(false)
        .process_read_dir(move |depth, _dir, _state, children| {
            // `None` is the batch holding the root itself.
            if depth.is_some() {
                children.retain(|child| match child {
                    Ok(entry) => !is_hidden(&filter, entry.file_name()),
                    Err(_) => true,
                });
            }

            for entry in children.iter_mut().flatten() {
                prefetch(entry);
            }
        })
}

fn prefetch(entry: &mut DirEntry<ScanState>) {
    let result = std::fs::symlink_metadata(entry.path()).map(|m| EntryMeta::from_metadata(&m));

    let descend = matches!(&result, Ok(meta) if meta.is_dir && !meta.is_symlink);
    if !descend {
        entry.read_children_path = None;
    }

    entry.client_state = Prefetched(Some(result));
}

fn is_hidden(options: &ScanOptions, name: &OsStr) -> bool {
    options.should_skip_hidden(&name.to_string_lossy())
}

fn read_children_warning(path: &Path, err: &jwalk::Error) -> ScanWarning {
    match err.io_error() {
        Some(io) if io.kind() == std::io::ErrorKind::PermissionDenied => {
            ScanWarning::from_io(path, io)
        }
        Some(io) => ScanWarning::read_error(path, io.to_string()),
        None => ScanWarning::read_error(path, err.to_string()),
    }
}

fn root_name(root: &Path) -> CompactString {
    root.file_name()
        .map(|n| CompactString::new(n.to_string_lossy()))
        .unwrap_or_else(|| CompactString::new(root.to_string_lossy()))
}

fn to_utc(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}

fn record_warning(warnings: &mut Vec<String>, warning: ScanWarning) {
    warn!(path = %warning.path.display(), kind = ?warning.kind, "{}", warning.message);
    warnings.push(warning.into());
}

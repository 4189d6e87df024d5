//! File system scanning engine for dirsnap.
//!
//! This crate walks a folder with jwalk and builds the aggregated
//! [`ScanResult`] tree. Key features:
//!
//! - **Serial traversal** via jwalk, symlinks recorded but never followed
//! - **Progress updates** via an inline callback and broadcast channels
//! - **Cooperative cancellation** via [`CancellationToken`]
//! - **No recursion** in size roll-up or tree assembly
//!
//! # Example
//!
//! ```rust,no_run
//! use dirsnap_scan::{ScanOptions, WalkScanner};
//! use tokio_util::sync::CancellationToken;
//!
//! let options = ScanOptions::new("/path/to/scan");
//! let scanner = WalkScanner::new();
//! let result = scanner
//!     .scan(&options, &CancellationToken::new(), |p| {
//!         println!("{} items", p.total_items());
//!     })
//!     .unwrap();
//!
//! println!("Total size: {} bytes", result.total_size());
//! println!("Total files: {}", result.total_files);
//! ```
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

mod arena;
mod progress;
mod scanner;

pub use progress::{PROGRESS_INTERVAL, ScanProgress};
pub use scanner::WalkScanner;

// Re-export core types for convenience
pub use dirsnap_core::{
    Node, NodeKind, ScanError, ScanOptions, ScanResult, ScanWarning, WarningKind,
};

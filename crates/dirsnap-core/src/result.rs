//! Completed scan result.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::node::Node;

/// Output of one completed scan.
///
/// Produced atomically: a scan either returns a complete, consistent result
/// or an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    /// Root node of the tree.
    pub root: Node,

    /// Number of files and symlinks, excluding the root.
    pub total_files: u64,

    /// Number of directories, excluding the root.
    pub total_folders: u64,

    /// When this scan was performed.
    #[serde(rename = "scanDate")]
    pub scanned_at: DateTime<Utc>,

    /// Root path that was scanned.
    pub root_path: String,

    /// Recovered per-entry failures, in the order they occurred.
    pub warnings: Vec<String>,
}

impl ScanResult {
    /// Get the total size of the tree.
    pub fn total_size(&self) -> u64 {
        self.root.size
    }

    /// Check if there were any warnings during scanning.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Stamp side-car thumbnail names onto file nodes.
    ///
    /// `thumbnails` maps a node path to its thumbnail file name. Directories
    /// are never stamped.
    pub fn with_thumbnails(mut self, thumbnails: &HashMap<String, String>) -> Self {
        if thumbnails.is_empty() {
            return self;
        }

        let mut stack = vec![&mut self.root];
        while let Some(node) = stack.pop() {
            if node.is_dir() {
                stack.extend(node.children.iter_mut());
            } else if let Some(file) = thumbnails.get(&node.path) {
                node.thumb_file = Some(file.clone());
            }
        }

        self
    }
}

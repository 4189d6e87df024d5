//! Name search over a scanned tree.

use crate::node::Node;

/// Find every non-directory node whose name contains `query`, ignoring case.
///
/// Results are in pre-order. An empty query matches every file.
pub fn search_files<'a>(root: &'a Node, query: &str) -> Vec<&'a Node> {
    let needle = query.to_lowercase();
    root.files()
        .into_iter()
        .filter(|node| node.name.to_lowercase().contains(&needle))
        .collect()
}

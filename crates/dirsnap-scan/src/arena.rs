//! Flat node tables built during the walk, and the passes that turn them
//! into a nested tree.
//!
//! Every entry is appended after its parent, so entry indices are a
//! topological order of the tree. Both the size roll-up and the assembly walk
//! the table backwards, which visits every child before its parent without
//! any recursion.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use compact_str::CompactString;

use dirsnap_core::{Node, NodeKind};

/// A node as recorded during the walk, before children are attached.
#[derive(Debug)]
pub(crate) struct FlatNode {
    pub name: CompactString,
    pub path: String,
    pub kind: NodeKind,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

impl FlatNode {
    fn into_node(self, children: Vec<Node>) -> Node {
        Node {
            name: self.name,
            path: self.path,
            kind: self.kind,
            size: self.size,
            modified: self.modified,
            children,
            thumb_file: None,
        }
    }
}

/// Where a child attaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Root,
    Entry(usize),
}

/// Path-keyed flat tables for one scan.
#[derive(Debug)]
pub(crate) struct FlatTree {
    root: FlatNode,
    root_children: Vec<usize>,
    entries: Vec<FlatNode>,
    parents: Vec<Slot>,
    children: Vec<Vec<usize>>,
    /// Directory path -> slot. Only directories can receive children.
    dirs: HashMap<PathBuf, Slot>,
}

impl FlatTree {
    /// Seed the tables with the root directory.
    pub fn new(root_path: PathBuf, mut root: FlatNode) -> Self {
        root.kind = NodeKind::Directory;
        root.size = 0;

        let mut dirs = HashMap::new();
        dirs.insert(root_path, Slot::Root);

        Self {
            root,
            root_children: Vec::new(),
            entries: Vec::new(),
            parents: Vec::new(),
            children: Vec::new(),
            dirs,
        }
    }

    /// Record an entry under `parent`.
    ///
    /// Returns `false` (and records nothing) when `parent` is not a known
    /// directory, e.g. because it was skipped earlier.
    pub fn insert(&mut self, parent: &Path, path: PathBuf, mut node: FlatNode) -> bool {
        let Some(&slot) = self.dirs.get(parent) else {
            return false;
        };

        // Directory sizes are computed, never measured.
        if node.kind.is_dir() {
            node.size = 0;
        }

        let idx = self.entries.len();
        if node.kind.is_dir() {
            self.dirs.insert(path, Slot::Entry(idx));
        }

        self.entries.push(node);
        self.parents.push(slot);
        self.children.push(Vec::new());

        match slot {
            Slot::Root => self.root_children.push(idx),
            Slot::Entry(p) => self.children[p].push(idx),
        }

        true
    }

    /// Number of recorded entries, excluding the root.
    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }

    /// Roll directory sizes up from their descendants.
    pub fn aggregate_sizes(&mut self) {
        for idx in (0..self.entries.len()).rev() {
            let size = self.entries[idx].size;
            match self.parents[idx] {
                Slot::Root => self.root.size += size,
                Slot::Entry(p) => self.entries[p].size += size,
            }
        }
    }

    /// Build the nested tree, attaching children in discovery order.
    pub fn assemble(self) -> Node {
        let FlatTree {
            root,
            root_children,
            entries,
            children,
            ..
        } = self;

        let mut built: Vec<Option<Node>> = Vec::with_capacity(entries.len());
        built.resize_with(entries.len(), || None);

        for (idx, (flat, kids)) in entries.into_iter().zip(children).enumerate().rev() {
            let nodes = take_children(&mut built, kids);
            built[idx] = Some(flat.into_node(nodes));
        }

        let nodes = take_children(&mut built, root_children);
        root.into_node(nodes)
    }
}

fn take_children(built: &mut [Option<Node>], indices: Vec<usize>) -> Vec<Node> {
    indices
        .into_iter()
        .filter_map(|idx| built[idx].take())
        .collect()
}

//! File, directory and symlink node types.

use std::time::SystemTime;

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Type of file system node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Regular file (or anything that is neither a directory nor a symlink).
    File,
    /// Directory.
    Directory,
    /// Symbolic link. Always a leaf, never traversed.
    Symlink,
}

impl NodeKind {
    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, NodeKind::Directory)
    }

    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, NodeKind::File)
    }

    /// Check if this is a symlink.
    pub fn is_symlink(&self) -> bool {
        matches!(self, NodeKind::Symlink)
    }
}

/// A single file, directory or symlink in the snapshot tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Last path component.
    pub name: CompactString,

    /// Full path, unique within a tree.
    pub path: String,

    /// Node type.
    pub kind: NodeKind,

    /// Size in bytes (aggregate for directories).
    pub size: u64,

    /// Last modification time.
    pub modified: DateTime<Utc>,

    /// Children in enumeration order (directories only).
    pub children: Vec<Node>,

    /// Side-car thumbnail file name, relative to the thumbnails folder.
    pub thumb_file: Option<String>,
}

impl Node {
    /// Create a new leaf node.
    pub fn new(
        name: impl Into<CompactString>,
        path: impl Into<String>,
        kind: NodeKind,
        size: u64,
        modified: impl Into<DateTime<Utc>>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind,
            size,
            modified: modified.into(),
            children: Vec::new(),
            thumb_file: None,
        }
    }

    /// Create a new file node.
    pub fn new_file(
        name: impl Into<CompactString>,
        path: impl Into<String>,
        size: u64,
        modified: SystemTime,
    ) -> Self {
        Self::new(name, path, NodeKind::File, size, modified)
    }

    /// Create a new, empty directory node.
    pub fn new_directory(
        name: impl Into<CompactString>,
        path: impl Into<String>,
        modified: SystemTime,
    ) -> Self {
        Self::new(name, path, NodeKind::Directory, 0, modified)
    }

    /// Check if this node is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Check if this node is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Check if this node is a symlink.
    pub fn is_symlink(&self) -> bool {
        self.kind.is_symlink()
    }

    /// Collect every non-directory node in this subtree, in pre-order.
    pub fn files(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut stack = vec![self];

        while let Some(node) = stack.pop() {
            if !node.is_dir() {
                out.push(node);
            }
            // Reverse so the first child is popped first.
            stack.extend(node.children.iter().rev());
        }

        out
    }

    /// Count all nodes in this subtree, excluding this node.
    pub fn descendant_count(&self) -> u64 {
        let mut count = 0;
        let mut stack: Vec<&Node> = self.children.iter().collect();

        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }

        count
    }
}

/// Wire shape of a node. Kind is flattened into two booleans.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NodeRef<'a> {
    name: &'a str,
    path: &'a str,
    is_directory: bool,
    size: u64,
    date_modified: &'a DateTime<Utc>,
    is_symlink: bool,
    children: &'a [Node],
    #[serde(skip_serializing_if = "Option::is_none")]
    thumb_file: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeRepr {
    name: CompactString,
    path: String,
    is_directory: bool,
    size: u64,
    date_modified: DateTime<Utc>,
    #[serde(default)]
    is_symlink: bool,
    #[serde(default)]
    children: Vec<Node>,
    #[serde(default)]
    thumb_file: Option<String>,
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        NodeRef {
            name: &self.name,
            path: &self.path,
            is_directory: self.is_dir(),
            size: self.size,
            date_modified: &self.modified,
            is_symlink: self.is_symlink(),
            children: &self.children,
            thumb_file: self.thumb_file.as_deref(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = NodeRepr::deserialize(deserializer)?;
        let kind = if repr.is_symlink {
            NodeKind::Symlink
        } else if repr.is_directory {
            NodeKind::Directory
        } else {
            NodeKind::File
        };

        Ok(Node {
            name: repr.name,
            path: repr.path,
            kind,
            size: repr.size,
            modified: repr.date_modified,
            children: repr.children,
            thumb_file: repr.thumb_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    fn sample_tree() -> Node {
        let mut root = Node::new_directory("root", "/root", UNIX_EPOCH);
        let mut sub = Node::new_directory("sub", "/root/sub", UNIX_EPOCH);
        sub.children
            .push(Node::new_file("c.txt", "/root/sub/c.txt", 50, UNIX_EPOCH));
        root.children
            .push(Node::new_file("a.txt", "/root/a.txt", 100, UNIX_EPOCH));
        root.children.push(sub);
        root.children
            .push(Node::new_file("b.txt", "/root/b.txt", 200, UNIX_EPOCH));
        root
    }

    #[test]
    fn test_node_kind_discrimination() {
        assert!(NodeKind::File.is_file());
        assert!(NodeKind::Directory.is_dir());
        assert!(NodeKind::Symlink.is_symlink());
        assert!(!NodeKind::Symlink.is_file());
    }

    #[test]
    fn test_files_preorder() {
        let root = sample_tree();
        let names: Vec<&str> = root.files().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "c.txt", "b.txt"]);
    }

    #[test]
    fn test_descendant_count() {
        assert_eq!(sample_tree().descendant_count(), 4);
    }

    #[test]
    fn test_wire_field_names() {
        let node = Node::new_file("a.txt", "/root/a.txt", 100, UNIX_EPOCH);
        let value = serde_json::to_value(&node).unwrap();
        let obj = value.as_object().unwrap();

        assert_eq!(obj["isDirectory"], false);
        assert_eq!(obj["isSymlink"], false);
        assert_eq!(obj["size"], 100);
        assert_eq!(obj["dateModified"], "1970-01-01T00:00:00Z");
        assert!(!obj.contains_key("thumbFile"));
    }

    #[test]
    fn test_symlink_roundtrip() {
        let node = Node::new("link", "/root/link", NodeKind::Symlink, 7, UNIX_EPOCH);
        let json = serde_json::to_string(&node).unwrap();
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }
}

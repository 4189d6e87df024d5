//! Scan and packaging options.

use std::fmt;
use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Options for one scan-and-package run.
#[derive(Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanOptions {
    /// Root path to scan.
    pub root: PathBuf,

    /// Include hidden entries (names starting with `.`).
    #[builder(default = "false")]
    #[serde(default)]
    pub include_hidden: bool,

    /// Let the consuming document link to the original files.
    #[builder(default = "false")]
    #[serde(default)]
    pub link_to_files: bool,

    /// Compress the serialized result before embedding.
    #[builder(default = "false")]
    #[serde(default)]
    pub compress: bool,

    /// Passphrase for payload encryption. Never serialized.
    #[builder(default, setter(into, strip_option))]
    #[serde(skip)]
    pub encryption_passphrase: Option<String>,
}

impl ScanOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                Err("Root path cannot be empty".to_string())
            }
            Some(_) => Ok(()),
            None => Err("Root path is required".to_string()),
        }
    }
}

impl ScanOptions {
    /// Create a new options builder.
    pub fn builder() -> ScanOptionsBuilder {
        ScanOptionsBuilder::default()
    }

    /// Create options for scanning a path with everything else off.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include_hidden: false,
            link_to_files: false,
            compress: false,
            encryption_passphrase: None,
        }
    }

    /// The passphrase, if encryption was requested. Empty counts as absent.
    pub fn passphrase(&self) -> Option<&str> {
        self.encryption_passphrase
            .as_deref()
            .filter(|pw| !pw.is_empty())
    }

    /// Check if hidden entries should be skipped.
    pub fn should_skip_hidden(&self, name: &str) -> bool {
        !self.include_hidden && name.starts_with('.')
    }
}

impl fmt::Debug for ScanOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanOptions")
            .field("root", &self.root)
            .field("include_hidden", &self.include_hidden)
            .field("link_to_files", &self.link_to_files)
            .field("compress", &self.compress)
            .field("encrypted", &self.passphrase().is_some())
            .finish()
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::new(".")
    }
}

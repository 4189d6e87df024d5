//! The configuration object embedded next to the payload.

use serde::{Deserialize, Serialize};

/// Version stamped into every manifest.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the side-car thumbnail folder, relative to the document.
pub const THUMBNAILS_FOLDER: &str = "thumbnails";

/// Tells the consuming document how to read the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub link_to_files: bool,
    pub compressed: bool,
    pub encrypted: bool,
    pub app_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnails_folder: Option<String>,
}

impl Manifest {
    pub fn new(
        link_to_files: bool,
        compressed: bool,
        encrypted: bool,
        thumbnails_folder: Option<&str>,
    ) -> Self {
        Self {
            link_to_files,
            compressed,
            encrypted,
            app_version: APP_VERSION.to_string(),
            thumbnails_folder: thumbnails_folder.map(str::to_string),
        }
    }

    /// Render as compact JSON token text.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

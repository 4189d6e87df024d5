//! Side-car thumbnail generation.
//!
//! Rendering is delegated to a [`Thumbnailer`]; this module only picks the
//! candidate files, names the outputs and writes them.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use dirsnap_core::Node;
use tracing::{debug, warn};

use crate::error::{PackageError, Result};

/// Renders a preview image for a file.
pub trait Thumbnailer {
    /// Return JPEG bytes no larger than `max_pixel_size` on either side, or
    /// `None` if the file cannot be previewed.
    fn thumbnail(&self, path: &Path, max_pixel_size: u32) -> Option<Vec<u8>>;
}

/// Thumbnail edge length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThumbnailSize {
    #[default]
    Standard,
    /// Double density, for high-DPI displays.
    Retina,
}

impl ThumbnailSize {
    pub fn pixels(self) -> u32 {
        match self {
            ThumbnailSize::Standard => 64,
            ThumbnailSize::Retina => 128,
        }
    }
}

/// Uses small JPEG files as their own thumbnails and skips everything else.
///
/// The viewer scales images down, so no decoding is needed here.
#[derive(Debug, Clone, Copy)]
pub struct JpegPassthrough {
    /// Largest source file to embed, in bytes.
    pub max_bytes: u64,
}

impl Default for JpegPassthrough {
    fn default() -> Self {
        Self {
            max_bytes: 256 * 1024,
        }
    }
}

impl Thumbnailer for JpegPassthrough {
    fn thumbnail(&self, path: &Path, _max_pixel_size: u32) -> Option<Vec<u8>> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if ext != "jpg" && ext != "jpeg" {
            return None;
        }
        let len = fs::metadata(path).ok()?.len();
        if len > self.max_bytes {
            return None;
        }
        fs::read(path).ok()
    }
}

const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "bmp", "tiff", "tif", "heic", "heif",
];

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "avi", "mkv", "wmv", "flv", "webm"];

const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", // PDF
    "docx", "xlsx", "pptx", "doc", "xls", "ppt", // Office
    "pages", "numbers", "keynote", // iWork
    "usdz", "obj", "scn", "abc", "ply", "stl", // 3D
];

/// Check whether a file name has an extension worth previewing.
pub fn is_supported(name: &str) -> bool {
    let Some((_, ext)) = name.rsplit_once('.') else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    [IMAGE_EXTENSIONS, VIDEO_EXTENSIONS, DOCUMENT_EXTENSIONS]
        .iter()
        .any(|set| set.contains(&ext.as_str()))
}

/// Stable output name for a source path.
pub fn thumbnail_file_name(path: &str) -> String {
    let hash = blake3::hash(path.as_bytes());
    format!("{}.jpg", &hash.to_hex()[..16])
}

/// Render thumbnails for every supported file under `root` into `out_dir`.
///
/// `progress` receives `(done, total)` before each file. Returns the map from
/// source path to thumbnail file name, ready for
/// [`ScanResult::with_thumbnails`](dirsnap_core::ScanResult::with_thumbnails).
pub fn generate_thumbnails<T, F>(
    root: &Node,
    out_dir: &Path,
    thumbnailer: &T,
    size: ThumbnailSize,
    mut progress: F,
) -> Result<HashMap<String, String>>
where
    T: Thumbnailer + ?Sized,
    F: FnMut(usize, usize),
{
    fs::create_dir_all(out_dir).map_err(|e| PackageError::io(out_dir, e))?;

    let candidates: Vec<&Node> = root
        .files()
        .into_iter()
        .filter(|n| n.is_file() && is_supported(&n.name))
        .collect();
    let total = candidates.len();
    let mut map = HashMap::with_capacity(total);

    for (index, node) in candidates.into_iter().enumerate() {
        progress(index + 1, total);

        let Some(bytes) = thumbnailer.thumbnail(Path::new(&node.path), size.pixels()) else {
            continue;
        };

        let file_name = thumbnail_file_name(&node.path);
        let dest = out_dir.join(&file_name);
        if let Err(e) = fs::write(&dest, bytes) {
            warn!(path = %dest.display(), error = %e, "failed to write thumbnail");
            continue;
        }
        map.insert(node.path.clone(), file_name);
    }

    debug!(candidates = total, rendered = map.len(), "thumbnails generated");
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported("photo.JPG"));
        assert!(is_supported("clip.webm"));
        assert!(is_supported("deck.keynote"));
        assert!(!is_supported("notes.txt"));
        assert!(!is_supported("Makefile"));
    }

    #[test]
    fn test_file_name_is_stable() {
        let a = thumbnail_file_name("/photos/a.png");
        assert_eq!(a, thumbnail_file_name("/photos/a.png"));
        assert_ne!(a, thumbnail_file_name("/photos/b.png"));
        assert_eq!(a.len(), 16 + 4);
        assert!(a.ends_with(".jpg"));
    }

    #[test]
    fn test_jpeg_passthrough() {
        let temp = tempfile::TempDir::new().unwrap();
        let small = temp.path().join("small.JPG");
        let big = temp.path().join("big.jpg");
        let png = temp.path().join("pic.png");
        fs::write(&small, [0xFF, 0xD8, 0xFF]).unwrap();
        fs::write(&big, vec![0u8; 64]).unwrap();
        fs::write(&png, [0x89]).unwrap();

        let thumbs = JpegPassthrough { max_bytes: 16 };
        assert_eq!(thumbs.thumbnail(&small, 64), Some(vec![0xFF, 0xD8, 0xFF]));
        assert_eq!(thumbs.thumbnail(&big, 64), None);
        assert_eq!(thumbs.thumbnail(&png, 64), None);
    }

    #[test]
    fn test_sizes() {
        assert_eq!(ThumbnailSize::Standard.pixels(), 64);
        assert_eq!(ThumbnailSize::Retina.pixels(), 128);
    }
}

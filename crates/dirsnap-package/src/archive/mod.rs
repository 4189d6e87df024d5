//! ZIP bundling of a snapshot folder.
//!
//! The writer is self-contained: stored and deflated entries, no ZIP64, no
//! encryption, no data descriptors. Archives that would need ZIP64 are
//! rejected.

mod crc32;
mod dos_time;
mod writer;

use std::fs;
use std::path::{Component, Path};
use std::time::{SystemTime, UNIX_EPOCH};

use jwalk::{Parallelism, WalkDir};
use tracing::{debug, info};

use crate::error::{PackageError, Result};

pub use crc32::crc32;
pub use dos_time::DosDateTime;
pub use writer::{ArchiveEntry, Method, ZipBuilder};

/// Build an archive of `folder` in memory.
///
/// Entry names are relative to the folder's parent, so the folder itself is
/// the top-level entry (`Snapshot/`, `Snapshot/index.html`). Entries are
/// sorted by name within each directory and hidden entries are skipped.
pub fn write_zip(folder: &Path) -> Result<Vec<u8>> {
    let base = folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| PackageError::ArchiveEnumeration {
            path: folder.to_path_buf(),
            message: "folder has no name".to_string(),
        })?;

    match fs::metadata(folder) {
        Ok(metadata) if metadata.is_dir() => {}
        Ok(_) => {
            return Err(PackageError::ArchiveEnumeration {
                path: folder.to_path_buf(),
                message: "not a directory".to_string(),
            });
        }
        Err(e) => {
            return Err(PackageError::ArchiveEnumeration {
                path: folder.to_path_buf(),
                message: e.to_string(),
            });
        }
    }

    let mut zip = ZipBuilder::new();

    for entry in walker(folder) {
        let entry = entry.map_err(|e| PackageError::ArchiveEnumeration {
            path: e.path().unwrap_or(folder).to_path_buf(),
            message: e.to_string(),
        })?;

        let path = entry.path();
        let file_type = entry.file_type();
        let name = entry_name(&base, folder, &path)?;

        let stamp = DosDateTime::from_system_time(entry_modified(&path));

        if file_type.is_dir() {
            zip.add(&ArchiveEntry::directory(&name, stamp))?;
        } else if file_type.is_file() {
            let contents = fs::read(&path).map_err(|e| PackageError::io(&path, e))?;
            zip.add(&ArchiveEntry::file(&name, contents, stamp)?)?;
        } else {
            debug!(path = %path.display(), "skipping non-regular entry");
        }
    }

    debug!(entries = zip.len(), folder = %folder.display(), "archive assembled");
    zip.finish()
}

/// Archive `folder` into `dest`.
pub fn zip_folder(folder: &Path, dest: &Path) -> Result<()> {
    let bytes = write_zip(folder)?;
    fs::write(dest, &bytes).map_err(|e| PackageError::io(dest, e))?;
    info!(path = %dest.display(), bytes = bytes.len(), "wrote archive");
    Ok(())
}

fn walker(folder: &Path) -> WalkDir {
    WalkDir::new(folder)
        .parallelism(Parallelism::Serial)
        .sort(true)
        .skip_hidden(false)
        .follow_links(false)
        .process_read_dir(|depth, _dir, _state, children| {
            // `None` is the batch holding the root itself.
            if depth.is_some() {
                children.retain(|child| match child {
                    Ok(entry) => !entry.file_name().to_string_lossy().starts_with('.'),
                    Err(_) => true,
                });
            }
        })
}

/// Modification time of `path`, or the epoch when it cannot be read.
fn entry_modified(path: &Path) -> SystemTime {
    match fs::symlink_metadata(path).and_then(|m| m.modified()) {
        Ok(modified) => modified,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no modification time; using epoch");
            UNIX_EPOCH
        }
    }
}

/// `base/rel/path` with `/` separators.
fn entry_name(base: &str, folder: &Path, path: &Path) -> Result<String> {
    let rel = path
        .strip_prefix(folder)
        .map_err(|e| PackageError::ArchiveEnumeration {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let mut name = base.to_string();
    for component in rel.components() {
        if let Component::Normal(part) = component {
            name.push('/');
            name.push_str(&part.to_string_lossy());
        }
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_name() {
        let folder = Path::new("/out/Snap");
        assert_eq!(entry_name("Snap", folder, folder).unwrap(), "Snap");
        assert_eq!(
            entry_name("Snap", folder, Path::new("/out/Snap/thumbnails/a.jpg")).unwrap(),
            "Snap/thumbnails/a.jpg"
        );
    }

    #[test]
    fn test_entry_modified_falls_back_to_epoch() {
        let temp = tempfile::TempDir::new().unwrap();
        let file = temp.path().join("a.txt");
        fs::write(&file, "x").unwrap();

        assert!(entry_modified(&file) > UNIX_EPOCH);
        assert_eq!(entry_modified(&temp.path().join("missing")), UNIX_EPOCH);
    }
}

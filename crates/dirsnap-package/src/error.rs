//! Error types for packaging.

use std::path::PathBuf;

use dirsnap_codec::CodecError;
use dirsnap_core::ScanError;
use thiserror::Error;

/// Errors raised while composing, writing or archiving a snapshot.
#[derive(Debug, Error)]
pub enum PackageError {
    /// A required placeholder is absent from the template.
    #[error("Template placeholder '{0}' was not found")]
    TemplateTokenMissing(&'static str),

    /// The folder being archived could not be enumerated.
    #[error("Failed to enumerate {path} for archiving: {message}")]
    ArchiveEnumeration { path: PathBuf, message: String },

    /// The archive would need ZIP64 extensions.
    #[error("Archive too large: {0}")]
    ArchiveTooLarge(String),

    /// I/O error while reading or writing a file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Deflating an archive entry failed.
    #[error("Compression failed: {0}")]
    Compression(#[source] std::io::Error),

    /// The scan failed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Encoding or transforming the payload failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl PackageError {
    /// Create an I/O error bound to a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for packaging operations.
pub type Result<T> = std::result::Result<T, PackageError>;

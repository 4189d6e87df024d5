//! Error types for encoding and transforming payloads.

use thiserror::Error;

/// Errors raised while encoding, compressing or encrypting a payload, or
/// while reversing any of those steps.
#[derive(Debug, Error)]
pub enum CodecError {
    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Gzip compression failed.
    #[error("Compression failed: {0}")]
    Compression(#[source] std::io::Error),

    /// Input is not a valid gzip stream.
    #[error("Decompression failed: {0}")]
    Decompression(#[source] std::io::Error),

    /// The cipher rejected the input.
    #[error("Encryption failed")]
    Encryption,

    /// Authentication failed: wrong passphrase or tampered ciphertext.
    #[error("Decryption failed: wrong passphrase or corrupted data")]
    Decryption,

    /// The envelope is missing fields or carries malformed values.
    #[error("Invalid encryption envelope: {0}")]
    InvalidEnvelope(String),

    /// The payload cannot be opened as requested.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

/// Result alias for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

//! The compress-then-encrypt chain applied to serialized results.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use tracing::debug;

use crate::compress::{compress, decompress};
use crate::crypto::{Envelope, decrypt, encrypt};
use crate::error::{CodecError, Result};

/// A transformed payload, ready to be rendered into a container token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Plain JSON text.
    Json(String),
    /// Base64 of the gzip-compressed JSON.
    Compressed(String),
    /// Encrypted JSON, or encrypted gzip when `compressed` is set.
    Encrypted { envelope: Envelope, compressed: bool },
}

impl Payload {
    /// Render the payload as JSON-compatible token text.
    ///
    /// Plain JSON is embedded as-is, compressed data as a JSON string
    /// literal and encrypted data as the envelope object.
    pub fn to_token_text(&self) -> Result<String> {
        match self {
            Payload::Json(text) => Ok(text.clone()),
            Payload::Compressed(b64) => Ok(serde_json::to_string(b64)?),
            Payload::Encrypted { envelope, .. } => Ok(serde_json::to_string(envelope)?),
        }
    }

    /// Parse token text back into a payload, given the flags a manifest
    /// carries alongside it.
    pub fn from_token_text(text: &str, compressed: bool, encrypted: bool) -> Result<Self> {
        if encrypted {
            let envelope: Envelope = serde_json::from_str(text)
                .map_err(|e| CodecError::InvalidEnvelope(e.to_string()))?;
            return Ok(Payload::Encrypted {
                envelope,
                compressed,
            });
        }

        if compressed {
            let b64: String = serde_json::from_str(text)
                .map_err(|e| CodecError::InvalidPayload(e.to_string()))?;
            return Ok(Payload::Compressed(b64));
        }

        Ok(Payload::Json(text.to_string()))
    }

    /// Reverse the chain and return the serialized JSON bytes.
    pub fn open(&self, passphrase: Option<&str>) -> Result<Vec<u8>> {
        match self {
            Payload::Json(text) => Ok(text.as_bytes().to_vec()),
            Payload::Compressed(b64) => {
                let gz = B64
                    .decode(b64)
                    .map_err(|e| CodecError::InvalidPayload(e.to_string()))?;
                decompress(&gz)
            }
            Payload::Encrypted {
                envelope,
                compressed,
            } => {
                let passphrase = passphrase.filter(|pw| !pw.is_empty()).ok_or_else(|| {
                    CodecError::InvalidPayload("payload is encrypted".to_string())
                })?;
                let plain = decrypt(envelope, passphrase)?;
                if *compressed {
                    decompress(&plain)
                } else {
                    Ok(plain)
                }
            }
        }
    }
}

/// Result of [`transform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub payload: Payload,
    pub compressed: bool,
    pub encrypted: bool,
}

/// Apply optional gzip compression, then optional encryption, to
/// serialized JSON. An empty passphrase means no encryption.
pub fn transform(json: &[u8], compress_data: bool, passphrase: Option<&str>) -> Result<Transformed> {
    let passphrase = passphrase.filter(|pw| !pw.is_empty());
    let encrypted = passphrase.is_some();

    let body = if compress_data {
        let gz = compress(json)?;
        debug!(input = json.len(), output = gz.len(), "compressed payload");
        gz
    } else {
        json.to_vec()
    };

    let payload = match passphrase {
        Some(pw) => {
            let envelope = encrypt(&body, pw)?;
            debug!(compressed = compress_data, "encrypted payload");
            Payload::Encrypted {
                envelope,
                compressed: compress_data,
            }
        }
        None if compress_data => Payload::Compressed(B64.encode(&body)),
        None => {
            let text = String::from_utf8(body)
                .map_err(|e| CodecError::InvalidPayload(e.to_string()))?;
            Payload::Json(text)
        }
    };

    Ok(Transformed {
        payload,
        compressed: compress_data,
        encrypted,
    })
}

//! Passphrase-based AES-256-GCM encryption.
//!
//! The key is derived with PBKDF2-HMAC-SHA256 from the passphrase and a
//! fresh random salt; every call also draws a fresh nonce. The envelope
//! carries everything a reader needs except the passphrase, with binary
//! fields in standard padded base64:
//!
//! ```json
//! {"ct": "<ciphertext || tag>", "iv": "<12-byte nonce>", "salt": "<16-byte salt>"}
//! ```

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{CodecError, Result};

/// PBKDF2 rounds.
pub const PBKDF2_ITERATIONS: u32 = 200_000;
/// Salt length in bytes.
pub const SALT_LEN: usize = 16;
/// AES-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;
/// Derived key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// Serialized form of an encrypted payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Ciphertext with the 16-byte tag appended.
    pub ct: String,
    /// Nonce.
    pub iv: String,
    /// PBKDF2 salt.
    pub salt: String,
}

fn derive_key(passphrase: &str, salt: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key[..]);
    key
}

fn cipher(key: &[u8]) -> Result<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key).map_err(|_| CodecError::Encryption)
}

/// Encrypt `data` under `passphrase`.
pub fn encrypt(data: &[u8], passphrase: &str) -> Result<Envelope> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut nonce);

    let key = derive_key(passphrase, &salt);
    let ct = cipher(&key[..])?
        .encrypt(Nonce::from_slice(&nonce), data)
        .map_err(|_| CodecError::Encryption)?;

    Ok(Envelope {
        ct: B64.encode(ct),
        iv: B64.encode(nonce),
        salt: B64.encode(salt),
    })
}

/// Decrypt an envelope produced by [`encrypt`].
///
/// A wrong passphrase or any tampering fails authentication and returns
/// [`CodecError::Decryption`].
pub fn decrypt(envelope: &Envelope, passphrase: &str) -> Result<Vec<u8>> {
    let ct = decode_field("ct", &envelope.ct)?;
    let nonce = decode_field("iv", &envelope.iv)?;
    let salt = decode_field("salt", &envelope.salt)?;

    if nonce.len() != NONCE_LEN {
        return Err(CodecError::InvalidEnvelope(format!(
            "iv must be {NONCE_LEN} bytes, got {}",
            nonce.len()
        )));
    }

    let key = derive_key(passphrase, &salt);
    cipher(&key[..])?
        .decrypt(Nonce::from_slice(&nonce), ct.as_slice())
        .map_err(|_| CodecError::Decryption)
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>> {
    B64.decode(value)
        .map_err(|e| CodecError::InvalidEnvelope(format!("{name}: {e}")))
}

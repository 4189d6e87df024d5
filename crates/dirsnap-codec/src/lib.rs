//! Payload codec for dirsnap.
//!
//! This crate turns a [`ScanResult`](dirsnap_core::ScanResult) into the text
//! that gets embedded into a snapshot document:
//!
//! - [`encode`] / [`decode`] the result as JSON
//! - [`transform`] it through optional gzip and AES-256-GCM stages
//! - export flat file lists as CSV, TSV or JSON
//!
//! # Example
//!
//! ```rust,no_run
//! # fn demo(result: &dirsnap_core::ScanResult) -> dirsnap_codec::Result<()> {
//! let json = dirsnap_codec::encode(result)?;
//! let out = dirsnap_codec::transform(&json, true, Some("passphrase"))?;
//! let token = out.payload.to_token_text()?;
//! # Ok(())
//! # }
//! ```

mod compress;
mod crypto;
mod error;
mod json;
mod tabular;
mod transform;

pub use compress::{compress, decompress};
pub use crypto::{Envelope, KEY_LEN, NONCE_LEN, PBKDF2_ITERATIONS, SALT_LEN, decrypt, encrypt};
pub use error::{CodecError, Result};
pub use json::{decode, encode};
pub use tabular::{export_csv, export_json, export_tsv};
pub use transform::{Payload, Transformed, transform};

//! Core types for dirsnap.
//!
//! This crate provides the data model shared by the scanner, the codec and
//! the packaging layer: nodes, scan results, options and errors.

mod config;
mod error;
mod node;
mod result;
mod search;

pub use config::{ScanOptions, ScanOptionsBuilder};
pub use error::{ScanError, ScanWarning, WarningKind};
pub use node::{Node, NodeKind};
pub use result::ScanResult;
pub use search::search_files;

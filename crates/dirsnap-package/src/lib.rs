//! Snapshot packaging for dirsnap.
//!
//! This crate turns a scan into a distributable artifact:
//!
//! - [`compose`] fills a document template with the payload and manifest
//! - [`archive`] writes ZIP archives without external tooling
//! - [`thumbnails`] renders side-car previews through a [`Thumbnailer`]
//! - [`Snapshotter`] runs the whole pipeline and reports progress
//!
//! # Example
//!
//! ```rust,no_run
//! use dirsnap_core::ScanOptions;
//! use dirsnap_package::{SnapshotPlan, Snapshotter};
//! use tokio_util::sync::CancellationToken;
//!
//! let options = ScanOptions::new("/path/to/folder");
//! let plan = SnapshotPlan::new("/tmp/folder.html");
//! let output = Snapshotter::new()
//!     .run(&options, &plan, &CancellationToken::new(), |event| {
//!         println!("{event:?}");
//!     })
//!     .unwrap();
//! println!("wrote {}", output.path.display());
//! ```

pub mod archive;
mod container;
mod error;
mod manifest;
mod snapshot;
pub mod thumbnails;

pub use archive::{write_zip, zip_folder};
pub use container::{CONFIG_TOKEN, DATA_TOKEN, DEFAULT_TEMPLATE, LOGO_TOKEN, compose};
pub use error::{PackageError, Result};
pub use manifest::{APP_VERSION, Manifest, THUMBNAILS_FOLDER};
pub use snapshot::{
    Phase, PhaseTimings, SnapshotEvent, SnapshotOutput, SnapshotPlan, SnapshotPlanBuilder,
    Snapshotter, suggested_output_name,
};
pub use thumbnails::{JpegPassthrough, ThumbnailSize, Thumbnailer, generate_thumbnails};

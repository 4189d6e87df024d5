//! End-to-end snapshot pipeline.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone};
use derive_builder::Builder;
use dirsnap_codec::{CodecError, encode, transform};
use dirsnap_core::{ScanError, ScanOptions, ScanResult};
use dirsnap_scan::{ScanProgress, WalkScanner};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::archive::zip_folder;
use crate::container::{DEFAULT_TEMPLATE, compose};
use crate::error::{PackageError, Result};
use crate::manifest::{Manifest, THUMBNAILS_FOLDER};
use crate::thumbnails::{ThumbnailSize, Thumbnailer, generate_thumbnails};

/// Where and how to write a snapshot.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct SnapshotPlan {
    /// Document path. With thumbnails, the document moves into a folder
    /// named after this path's stem, next to it.
    pub output: PathBuf,

    /// Template text. Defaults to [`DEFAULT_TEMPLATE`].
    #[builder(default, setter(into, strip_option))]
    pub template: Option<String>,

    /// Render side-car thumbnails at this size.
    #[builder(default, setter(into, strip_option))]
    pub thumbnails: Option<ThumbnailSize>,

    /// Replace the side-car folder with a ZIP of it.
    #[builder(default = "false")]
    pub zip: bool,

    /// Base64 PNG for the logo slot.
    #[builder(default, setter(into, strip_option))]
    pub logo_base64: Option<String>,
}

impl SnapshotPlanBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        match self.output {
            Some(ref output) if output.file_stem().is_none() => {
                Err("Output path must name a file".to_string())
            }
            Some(_) => Ok(()),
            None => Err("Output path is required".to_string()),
        }
    }
}

impl SnapshotPlan {
    /// Create a new plan builder.
    pub fn builder() -> SnapshotPlanBuilder {
        SnapshotPlanBuilder::default()
    }

    /// Plan a plain document at `output`.
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            template: None,
            thumbnails: None,
            zip: false,
            logo_base64: None,
        }
    }
}

/// Pipeline step being entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Scanning,
    Thumbnails { done: usize, total: usize },
    Encoding,
    Writing,
    Zipping,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Scanning => write!(f, "Scanning"),
            Phase::Thumbnails { done, total } => write!(f, "Thumbnails: {done}/{total}"),
            Phase::Encoding => write!(f, "Encoding"),
            Phase::Writing => write!(f, "Writing file"),
            Phase::Zipping => write!(f, "Zipping"),
            Phase::Done => write!(f, "Done"),
        }
    }
}

/// Event reported while a snapshot runs.
#[derive(Debug, Clone)]
pub enum SnapshotEvent {
    Scan(ScanProgress),
    Phase(Phase),
}

/// Wall-clock time spent per step.
#[derive(Debug, Clone, Default)]
pub struct PhaseTimings {
    pub scan: Duration,
    pub thumbnails: Option<Duration>,
    pub encode: Duration,
    pub write: Duration,
    pub zip: Option<Duration>,
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct SnapshotOutput {
    /// The document, or the archive when zipping was requested.
    pub path: PathBuf,
    pub total_files: u64,
    pub total_folders: u64,
    pub total_size: u64,
    pub warnings: Vec<String>,
    pub compressed: bool,
    pub encrypted: bool,
    pub timings: PhaseTimings,
}

/// Runs scan, thumbnails, encoding, writing and zipping in order.
#[derive(Default)]
pub struct Snapshotter {
    scanner: WalkScanner,
    thumbnailer: Option<Box<dyn Thumbnailer + Send + Sync>>,
}

impl Snapshotter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `thumbnailer` when a plan asks for thumbnails.
    pub fn with_thumbnailer(mut self, thumbnailer: Box<dyn Thumbnailer + Send + Sync>) -> Self {
        self.thumbnailer = Some(thumbnailer);
        self
    }

    /// The scanner, for subscribing to broadcast progress.
    pub fn scanner(&self) -> &WalkScanner {
        &self.scanner
    }

    /// Produce a snapshot of `options.root` as described by `plan`.
    pub fn run<F>(
        &self,
        options: &ScanOptions,
        plan: &SnapshotPlan,
        cancel: &CancellationToken,
        mut on_event: F,
    ) -> Result<SnapshotOutput>
    where
        F: FnMut(SnapshotEvent),
    {
        let mut timings = PhaseTimings::default();

        on_event(SnapshotEvent::Phase(Phase::Scanning));
        let started = Instant::now();
        let mut result = self.scanner.scan(options, cancel, |p| {
            on_event(SnapshotEvent::Scan(p.clone()))
        })?;
        timings.scan = started.elapsed();

        let layout = Layout::new(&plan.output, plan.thumbnails.is_some());
        let mut thumbnails_folder = None;
        let mut side_car = SideCarGuard::default();

        if let (Some(size), Some(folder)) = (plan.thumbnails, &layout.folder) {
            check_cancel(cancel)?;
            side_car = SideCarGuard::create(folder)?;

            let started = Instant::now();
            result = self.render_thumbnails(result, folder, size, &mut on_event)?;
            timings.thumbnails = Some(started.elapsed());
            thumbnails_folder = Some(THUMBNAILS_FOLDER);
        }

        check_cancel(cancel)?;
        on_event(SnapshotEvent::Phase(Phase::Encoding));
        let started = Instant::now();
        let json = encode(&result)?;
        let transformed = transform(&json, options.compress, options.passphrase())?;
        let manifest = Manifest::new(
            options.link_to_files,
            transformed.compressed,
            transformed.encrypted,
            thumbnails_folder,
        );
        let document = compose(
            plan.template.as_deref().unwrap_or(DEFAULT_TEMPLATE),
            &transformed.payload.to_token_text()?,
            &manifest.to_json().map_err(CodecError::from)?,
            plan.logo_base64.as_deref(),
        )?;
        timings.encode = started.elapsed();

        check_cancel(cancel)?;
        on_event(SnapshotEvent::Phase(Phase::Writing));
        let started = Instant::now();
        fs::write(&layout.document, document).map_err(|e| PackageError::io(&layout.document, e))?;
        timings.write = started.elapsed();
        info!(path = %layout.document.display(), "wrote snapshot");

        let mut path = layout.document.clone();
        match (&layout.folder, plan.zip) {
            (Some(folder), true) => {
                on_event(SnapshotEvent::Phase(Phase::Zipping));
                let started = Instant::now();
                let archive = zip_path(folder);
                zip_folder(folder, &archive)?;
                fs::remove_dir_all(folder).map_err(|e| PackageError::io(folder, e))?;
                timings.zip = Some(started.elapsed());
                path = archive;
            }
            (None, true) => debug!("zip requested without a side-car folder; ignoring"),
            _ => {}
        }
        side_car.keep();

        on_event(SnapshotEvent::Phase(Phase::Done));

        Ok(SnapshotOutput {
            path,
            total_files: result.total_files,
            total_folders: result.total_folders,
            total_size: result.total_size(),
            warnings: result.warnings,
            compressed: transformed.compressed,
            encrypted: transformed.encrypted,
            timings,
        })
    }

    fn render_thumbnails<F>(
        &self,
        result: ScanResult,
        folder: &Path,
        size: ThumbnailSize,
        on_event: &mut F,
    ) -> Result<ScanResult>
    where
        F: FnMut(SnapshotEvent),
    {
        let Some(thumbnailer) = self.thumbnailer.as_deref() else {
            debug!("no thumbnailer configured; side-car folder left without thumbnails");
            return Ok(result);
        };

        let map = generate_thumbnails(
            &result.root,
            &folder.join(THUMBNAILS_FOLDER),
            thumbnailer,
            size,
            |done, total| on_event(SnapshotEvent::Phase(Phase::Thumbnails { done, total })),
        )?;
        Ok(result.with_thumbnails(&map))
    }
}

/// Resolved output locations.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Layout {
    /// Side-car folder, when thumbnails are requested.
    folder: Option<PathBuf>,
    document: PathBuf,
}

impl Layout {
    fn new(output: &Path, side_car: bool) -> Self {
        if !side_car {
            return Self {
                folder: None,
                document: output.to_path_buf(),
            };
        }

        let parent = output.parent().unwrap_or(Path::new(""));
        let stem = output.file_stem().unwrap_or(output.as_os_str());
        let folder = parent.join(stem);
        let document = match output.file_name() {
            Some(name) => folder.join(name),
            None => folder.join("index.html"),
        };

        Self {
            folder: Some(folder),
            document,
        }
    }
}

/// Removes a side-car folder this run created unless [`keep`] is called.
///
/// [`keep`]: SideCarGuard::keep
#[derive(Debug, Default)]
struct SideCarGuard {
    folder: Option<PathBuf>,
}

impl SideCarGuard {
    /// Create `folder`. A folder that already exists is never removed.
    fn create(folder: &Path) -> Result<Self> {
        let existed = folder.exists();
        fs::create_dir_all(folder).map_err(|e| PackageError::io(folder, e))?;
        Ok(Self {
            folder: (!existed).then(|| folder.to_path_buf()),
        })
    }

    fn keep(&mut self) {
        self.folder = None;
    }
}

impl Drop for SideCarGuard {
    fn drop(&mut self) {
        let Some(folder) = self.folder.take() else {
            return;
        };
        // Already gone after a successful zip.
        match fs::remove_dir_all(&folder) {
            Ok(()) => debug!(path = %folder.display(), "removed partial side-car folder"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %folder.display(), error = %e, "failed to remove side-car folder"),
        }
    }
}

fn zip_path(folder: &Path) -> PathBuf {
    let mut name = folder.file_name().unwrap_or(folder.as_os_str()).to_os_string();
    name.push(".zip");
    folder.with_file_name(name)
}

fn check_cancel(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(ScanError::Cancelled.into());
    }
    Ok(())
}

/// Default document name: `<folder>-snapshot-YYYY-MM-DD-HHMM.html`.
pub fn suggested_output_name<Tz>(root: &Path, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let folder = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "snapshot".to_string());
    format!("{folder}-snapshot-{}.html", now.format("%Y-%m-%d-%H%M"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_plain_layout() {
        let layout = Layout::new(Path::new("/out/report.html"), false);
        assert_eq!(layout.folder, None);
        assert_eq!(layout.document, PathBuf::from("/out/report.html"));
    }

    #[test]
    fn test_side_car_layout() {
        let layout = Layout::new(Path::new("/out/report.html"), true);
        assert_eq!(layout.folder, Some(PathBuf::from("/out/report")));
        assert_eq!(layout.document, PathBuf::from("/out/report/report.html"));
        assert_eq!(zip_path(Path::new("/out/report")), PathBuf::from("/out/report.zip"));
    }

    #[test]
    fn test_suggested_name() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 7, 0).unwrap();
        assert_eq!(
            suggested_output_name(Path::new("/home/me/Photos"), &now),
            "Photos-snapshot-2024-05-01-0907.html"
        );
    }

    #[test]
    fn test_plan_builder() {
        let plan = SnapshotPlan::builder()
            .output("/out/a.html")
            .thumbnails(ThumbnailSize::Retina)
            .zip(true)
            .build()
            .unwrap();
        assert_eq!(plan.thumbnails, Some(ThumbnailSize::Retina));
        assert!(plan.zip);
        assert!(plan.template.is_none());

        assert!(SnapshotPlan::builder().build().is_err());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Thumbnails { done: 2, total: 5 }.to_string(), "Thumbnails: 2/5");
    }
}

//! dirsnap - portable, self-contained snapshots of directory trees.
//!
//! Usage:
//!   dirsnap <ROOT> [OUTPUT]            Write an HTML snapshot of ROOT
//!   dirsnap export <ROOT> -f csv       Export the file list
//!   dirsnap search <ROOT> <QUERY>      Find files by name
//!   dirsnap --help                     Show help

use std::io::Write;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use dirsnap_codec::{export_csv, export_json, export_tsv};
use dirsnap_core::{ScanOptions, ScanResult, search_files};
use dirsnap_package::{
    JpegPassthrough, Phase, SnapshotEvent, SnapshotPlan, Snapshotter, ThumbnailSize,
    suggested_output_name,
};
use dirsnap_scan::WalkScanner;

#[derive(Parser)]
#[command(
    name = "dirsnap",
    version,
    about = "Portable, self-contained snapshots of directory trees",
    long_about = "dirsnap records every file and folder under ROOT into a single HTML \
                  document that can be browsed without access to the original disk.\n\n\
                  Payloads can be compressed and password-protected, and side-car \
                  thumbnails can be bundled into a ZIP archive.",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(flatten)]
    snapshot: SnapshotArgs,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args)]
struct SnapshotArgs {
    /// Folder to snapshot
    root: Option<PathBuf>,

    /// Output document (defaults to <folder>-snapshot-<date>.html next to ROOT)
    output: Option<PathBuf>,

    /// Include hidden files and folders
    #[arg(long)]
    include_hidden: bool,

    /// Let the document link to the original files
    #[arg(long)]
    link_files: bool,

    /// Gzip the embedded data
    #[arg(long)]
    compress: bool,

    /// Encrypt with the passphrase held in this environment variable
    #[arg(long, value_name = "VAR")]
    password_env: Option<String>,

    /// Use a custom document template
    #[arg(long, value_name = "FILE")]
    template: Option<PathBuf>,

    /// PNG logo for the document header
    #[arg(long, value_name = "PNG")]
    logo: Option<PathBuf>,

    /// Write side-car thumbnails next to the document
    #[arg(long)]
    thumbnails: bool,

    /// Double-density thumbnails
    #[arg(long, requires = "thumbnails")]
    retina: bool,

    /// Bundle the document and thumbnails into a ZIP archive
    #[arg(long, requires = "thumbnails")]
    zip: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Export the flat file list
    Export {
        /// Folder to scan
        root: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "csv")]
        format: ExportFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Include hidden files and folders
        #[arg(long)]
        include_hidden: bool,
    },

    /// Find files whose name contains QUERY (case-insensitive)
    Search {
        /// Folder to scan
        root: PathBuf,

        /// Text to look for
        query: String,

        /// Include hidden files and folders
        #[arg(long)]
        include_hidden: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum ExportFormat {
    #[default]
    Csv,
    Tsv,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Some(Command::Export {
            root,
            format,
            output,
            include_hidden,
        }) => run_export(&root, format, output, include_hidden),
        Some(Command::Search {
            root,
            query,
            include_hidden,
        }) => run_search(&root, &query, include_hidden),
        None => run_snapshot(cli.snapshot, cli.quiet),
    }
}

/// Install the stderr subscriber. `RUST_LOG` overrides the flags.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Scan, encode and write a snapshot document.
fn run_snapshot(args: SnapshotArgs, quiet: bool) -> Result<()> {
    let Some(root) = args.root else {
        bail!("Missing required argument: <ROOT>");
    };
    let root = root.canonicalize().context("Invalid path")?;

    let output = match args.output {
        Some(output) => output,
        None => default_output(&root),
    };

    let mut options = ScanOptions::builder();
    options
        .root(&root)
        .include_hidden(args.include_hidden)
        .link_to_files(args.link_files)
        .compress(args.compress);
    if let Some(var) = &args.password_env {
        let passphrase = std::env::var(var)
            .with_context(|| format!("Environment variable {var} is not set"))?;
        if passphrase.is_empty() {
            warn!(var = %var, "passphrase variable is empty; writing unencrypted");
        }
        options.encryption_passphrase(passphrase);
    }
    let options = options.build().context("Invalid options")?;

    let mut plan = SnapshotPlan::builder();
    plan.output(&output).zip(args.zip);
    if args.thumbnails {
        plan.thumbnails(if args.retina {
            ThumbnailSize::Retina
        } else {
            ThumbnailSize::Standard
        });
    }
    if let Some(template) = &args.template {
        let text = std::fs::read_to_string(template)
            .with_context(|| format!("Failed to read template {}", template.display()))?;
        plan.template(text);
    }
    if let Some(logo) = &args.logo {
        let bytes = std::fs::read(logo)
            .with_context(|| format!("Failed to read logo {}", logo.display()))?;
        plan.logo_base64(B64.encode(bytes));
    }
    let plan = plan.build().context("Invalid output")?;

    let snapshotter = Snapshotter::new().with_thumbnailer(Box::new(JpegPassthrough::default()));
    let out = snapshotter
        .run(&options, &plan, &CancellationToken::new(), |event| {
            if !quiet {
                report(&event);
            }
        })
        .context("Snapshot failed")?;

    if !quiet {
        eprintln!();
        eprintln!(
            " {} files, {} folders, {}",
            out.total_files,
            out.total_folders,
            format_size(out.total_size)
        );
        eprintln!(
            " Scanned in {:.2}s, total {:.2}s",
            out.timings.scan.as_secs_f64(),
            (out.timings.scan
                + out.timings.thumbnails.unwrap_or_default()
                + out.timings.encode
                + out.timings.write
                + out.timings.zip.unwrap_or_default())
            .as_secs_f64()
        );
        if out.encrypted {
            eprintln!(" Payload is encrypted");
        }
        if !out.warnings.is_empty() {
            eprintln!(" {} warning(s) during scan", out.warnings.len());
        }
    }

    println!("{}", out.path.display());
    Ok(())
}

/// Print one progress line to stderr.
fn report(event: &SnapshotEvent) {
    match event {
        SnapshotEvent::Scan(progress) => eprintln!(
            "Scanning: {} ({} files found)",
            progress.current_path.display(),
            progress.files_discovered
        ),
        SnapshotEvent::Phase(Phase::Scanning | Phase::Done) => {}
        SnapshotEvent::Phase(phase) => eprintln!("{phase}..."),
    }
}

/// Export the flat file list.
fn run_export(
    root: &Path,
    format: ExportFormat,
    output: Option<PathBuf>,
    include_hidden: bool,
) -> Result<()> {
    let result = scan(root, include_hidden)?;
    let files = result.root.files();

    let text = match format {
        ExportFormat::Csv => export_csv(&files),
        ExportFormat::Tsv => export_tsv(&files),
        ExportFormat::Json => export_json(&files)?,
    };

    match output {
        Some(output_path) => {
            std::fs::write(&output_path, text)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            eprintln!("Exported {} files to {}", files.len(), output_path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{text}")?;
        }
    }

    Ok(())
}

/// Print files whose names match `query`.
fn run_search(root: &Path, query: &str, include_hidden: bool) -> Result<()> {
    let result = scan(root, include_hidden)?;
    let hits = search_files(&result.root, query);

    for node in &hits {
        println!("{:>10}  {}", format_size(node.size), node.path);
    }
    eprintln!("{} match(es)", hits.len());

    Ok(())
}

fn scan(root: &Path, include_hidden: bool) -> Result<ScanResult> {
    let root = root.canonicalize().context("Invalid path")?;
    eprintln!("Scanning {}...", root.display());

    let options = ScanOptions::builder()
        .root(root)
        .include_hidden(include_hidden)
        .build()
        .context("Invalid options")?;

    WalkScanner::new()
        .scan(&options, &CancellationToken::new(), |_| {})
        .context("Scan failed")
}

/// `<parent>/<folder>-snapshot-<date>.html`
fn default_output(root: &Path) -> PathBuf {
    let name = suggested_output_name(root, &chrono::Local::now());
    root.parent().unwrap_or(root).join(name)
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

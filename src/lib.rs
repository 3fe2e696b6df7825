//! Taglift: batch uploader for tagged training images.
//!
//! Taglift validates region annotations against a remote tag catalog,
//! uploads images with their regions in size-bounded batches (retrying
//! throttled and transient failures with bounded backoff), and tracks
//! derived artifacts so repeated runs skip work that is already done.
//!
//! # Modules
//!
//! - [`region`]: region normalization and tag resolution
//! - [`plan`]: batch planning and rejection bookkeeping
//! - [`upload`]: batched upload with backoff, plus the run summary
//! - [`artifact`]: deterministic artifact naming and the processed check
//! - [`service`]: the annotation service capability and its HTTP client
//! - [`manifest`]: the tagged-image manifest format
//! - [`error`]: error types for taglift operations

pub mod artifact;
pub mod config;
pub mod error;
pub mod manifest;
pub mod plan;
pub mod region;
pub mod service;
pub mod upload;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

pub use error::TagliftError;

use crate::region::{TagId, TagRegistry};
use crate::service::AnnotationService;
use crate::upload::{BatchStatus, RunSummary, UploadOptions};

/// Extensions the scan subcommand treats as source images.
const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff"];

/// The taglift CLI application.
#[derive(Parser)]
#[command(name = "taglift")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Validate a tagged-image manifest and upload the images in batches.
    Upload(UploadArgs),
    /// List source images whose derived artifact does not exist yet.
    Scan(ScanArgs),
}

/// Arguments for the upload subcommand.
#[derive(clap::Args)]
struct UploadArgs {
    /// Directory containing the source images.
    #[arg(long, default_value = "training-images")]
    images: PathBuf,

    /// Manifest of {filename, tags} records.
    #[arg(long, default_value = "tagged-images.json")]
    manifest: PathBuf,

    /// Training endpoint URL.
    #[arg(long, env = "TAGLIFT_ENDPOINT")]
    endpoint: Option<String>,

    /// Training key sent with every request.
    #[arg(long, env = "TAGLIFT_KEY", hide_env_values = true)]
    credential: Option<String>,

    /// Project identifier on the training service.
    #[arg(long, env = "TAGLIFT_PROJECT")]
    project: Option<String>,

    /// Maximum images per batch submission.
    #[arg(long, default_value_t = upload::DEFAULT_BATCH_LIMIT)]
    batch_limit: usize,

    /// Maximum attempts per batch on throttling/transient errors.
    #[arg(long, default_value_t = upload::DEFAULT_MAX_RETRIES)]
    max_retries: u32,

    /// Validate and plan only; no network calls.
    #[arg(long)]
    dry_run: bool,
}

/// Arguments for the scan subcommand.
#[derive(clap::Args)]
struct ScanArgs {
    /// Directory of source images.
    source: PathBuf,

    /// Directory holding already-produced artifacts.
    #[arg(long)]
    artifacts: PathBuf,

    /// Annotation kind suffix (e.g. 'lines', 'words').
    #[arg(long)]
    kind: String,
}

/// Run the taglift CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), TagliftError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Upload(args)) => run_upload(args),
        Some(Commands::Scan(args)) => run_scan(args),
        None => {
            println!("taglift {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Batch uploader for tagged training images.");
            println!();
            println!("Run 'taglift --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the upload subcommand.
fn run_upload(args: UploadArgs) -> Result<(), TagliftError> {
    let manifest = manifest::read_manifest(&args.manifest)?;
    let store = plan::DirStore::new(&args.images);
    let codec = plan::ImagesizeCodec;

    if args.dry_run {
        // No remote registry on a dry run: accept every tag the manifest
        // names so geometry and file checks still execute.
        let registry = TagRegistry::from_pairs(
            manifest
                .entries
                .iter()
                .flat_map(|entry| entry.tags.iter())
                .map(|raw| (raw.tag.clone(), TagId::new(raw.tag.clone()))),
        );
        let (entries, stats) = plan::plan(&manifest, &registry, &store, &codec);
        println!(
            "Dry run: {} image(s) would be uploaded in batches of {}.",
            entries.len(),
            args.batch_limit
        );
        print!("{}", RunSummary::plan_only(stats));
        return Ok(());
    }

    let cfg = config::ServiceConfig::resolve(args.endpoint, args.credential, args.project)?;
    let http = service::http::HttpAnnotationService::new(&cfg.endpoint, &cfg.credential);

    let registry = http
        .get_tags(&cfg.project_id)
        .map_err(|err| TagliftError::Service {
            message: err.to_string(),
        })?;
    if registry.is_empty() {
        return Err(TagliftError::EmptyTagRegistry);
    }

    println!("Uploading images...");
    let (entries, stats) = plan::plan(&manifest, &registry, &store, &codec);

    if entries.is_empty() {
        println!("Nothing to upload after validation.");
        print!("{}", RunSummary::plan_only(stats));
        return Ok(());
    }

    println!(
        "Prepared {} image(s), {} region annotation(s).",
        entries.len(),
        stats.total_regions
    );
    println!("Uploading in batches of {}...", args.batch_limit);

    let opts = UploadOptions {
        batch_limit: args.batch_limit,
        max_retries: args.max_retries,
    };
    let batches = entries.len().div_ceil(opts.batch_limit.max(1));

    let outcomes = upload::upload_entries_with_progress(
        &http,
        &cfg.project_id,
        &entries,
        &opts,
        std::thread::sleep,
        |progress| match &progress.status {
            BatchStatus::Retrying { attempt, max, delay } => {
                println!(
                    "  Transient error on batch {} (attempt {}/{}). Sleeping {}s...",
                    progress.index,
                    attempt,
                    max,
                    delay.as_secs()
                );
            }
            BatchStatus::Ok => {
                println!("Batch {} OK ({} images).", progress.index, progress.size);
            }
            BatchStatus::PartialFailure { failed } => {
                println!(
                    "Batch {} reported {} failure(s).",
                    progress.index, failed
                );
            }
            BatchStatus::Failed { message } => {
                println!("Batch {} failed hard: {}", progress.index, message);
            }
        },
    );

    println!();
    print!("{}", RunSummary::new(stats, outcomes, batches));
    Ok(())
}

/// Execute the scan subcommand.
fn run_scan(args: ScanArgs) -> Result<(), TagliftError> {
    let sources = collect_image_files(&args.source)?;
    let listing = list_artifact_dir(&args.artifacts)?;
    let index = artifact::ArtifactIndex::from_listing(listing);

    let pending = artifact::pending_sources(&sources, &args.kind, &index)?;

    println!(
        "{} of {} image(s) still need '{}' artifacts.",
        pending.len(),
        sources.len(),
        args.kind
    );
    for source in &pending {
        println!("  {}", source);
    }
    Ok(())
}

/// Walks the source directory, collecting supported image files in a
/// deterministic (sorted) order. Hidden files are skipped.
fn collect_image_files(root: &Path) -> Result<Vec<String>, TagliftError> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root) {
        let entry = entry.map_err(|err| TagliftError::Io(err.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let is_image = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_image {
            files.push(entry.path().to_string_lossy().to_string());
        }
    }
    files.sort();
    Ok(files)
}

/// Flat listing of the artifact directory. A missing directory means no
/// artifact exists yet, not an error.
fn list_artifact_dir(dir: &Path) -> Result<Vec<String>, TagliftError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    Ok(names)
}

//! Batch planning: turn a manifest into validated upload entries.
//!
//! The planner runs every declared region through
//! [`validate_region`](crate::region::validate_region), reads the raw
//! bytes of each surviving file, and tallies everything it discards by
//! reason. Every manifest entry lands in exactly one disposition - no
//! file is silently dropped.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::manifest::Manifest;
use crate::region::{validate_region, RawRegion, RejectReason, ResolvedRegion, TagRegistry};

/// Read access to the source image files.
///
/// I/O lives behind this seam so the planner can be driven from tests
/// (and so read failures are categorized, never retried).
pub trait FileStore {
    fn read(&self, name: &str) -> std::io::Result<Vec<u8>>;
}

/// A [`FileStore`] rooted at a directory on disk.
#[derive(Clone, Debug)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileStore for DirStore {
    fn read(&self, name: &str) -> std::io::Result<Vec<u8>> {
        std::fs::read(self.root.join(name))
    }
}

/// Accepts or rejects raw image bytes.
///
/// Decoding is an external concern; the planner only needs a yes/no with
/// a short reason for the rejection tally.
pub trait ImageCodec {
    fn probe(&self, bytes: &[u8]) -> Result<(), String>;
}

/// An [`ImageCodec`] backed by `imagesize` header probing.
///
/// Bytes whose dimensions cannot be read, or that probe to a
/// non-positive size, are rejected.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImagesizeCodec;

impl ImageCodec for ImagesizeCodec {
    fn probe(&self, bytes: &[u8]) -> Result<(), String> {
        match imagesize::blob_size(bytes) {
            Ok(dim) if dim.width > 0 && dim.height > 0 => Ok(()),
            Ok(dim) => Err(format!("invalid dimensions {}x{}", dim.width, dim.height)),
            Err(err) => Err(err.to_string()),
        }
    }
}

/// A validated unit of work: one source image, its raw bytes, and all of
/// its resolved regions.
///
/// Built only by [`plan`]; a file with zero valid regions produces no
/// entry.
#[derive(Clone, Debug)]
pub struct UploadEntry {
    pub name: String,
    pub contents: Vec<u8>,
    pub regions: Vec<ResolvedRegion>,
}

/// A region discarded for a geometric reason, kept for diagnostics.
#[derive(Clone, Debug)]
pub struct RejectedBox {
    pub file: String,
    pub region: RawRegion,
    pub reason: RejectReason,
}

/// Everything the planner discarded, tallied by reason.
#[derive(Clone, Debug, Default)]
pub struct PlanStats {
    /// Manifest entries seen, including ones that produced no entry.
    pub total_entries: usize,
    /// Regions declared on readable files.
    pub total_regions: usize,
    /// Entries that produced an [`UploadEntry`].
    pub planned: usize,
    /// Entries with an empty filename.
    pub unnamed: usize,
    /// Files the store could not read.
    pub missing_files: Vec<String>,
    /// Files read fine but rejected by the codec, with the reason.
    pub unreadable_files: Vec<(String, String)>,
    /// Occurrences of tag names absent from the registry, by tag.
    pub unknown_tags: BTreeMap<String, usize>,
    /// Regions rejected as out-of-range or degenerate.
    pub rejected_boxes: Vec<RejectedBox>,
    /// Readable files whose regions all failed validation.
    pub no_valid_regions: Vec<String>,
}

impl PlanStats {
    /// Number of manifest entries with a final disposition. Always equals
    /// [`total_entries`](Self::total_entries) after a plan completes.
    pub fn accounted(&self) -> usize {
        self.planned
            + self.unnamed
            + self.missing_files.len()
            + self.unreadable_files.len()
            + self.no_valid_regions.len()
    }

    /// Total unknown-tag occurrences across all tag names.
    pub fn unknown_tag_occurrences(&self) -> usize {
        self.unknown_tags.values().sum()
    }
}

/// Plans the upload: validates every region, reads surviving files, and
/// returns the entries alongside the rejection tallies.
///
/// Entry order follows manifest order exactly; there is no reordering or
/// deduplication. Regions of unreadable files are not validated (and do
/// not count toward the region total), matching the order of checks in
/// the annotation workflows.
pub fn plan(
    manifest: &Manifest,
    registry: &TagRegistry,
    store: &dyn FileStore,
    codec: &dyn ImageCodec,
) -> (Vec<UploadEntry>, PlanStats) {
    let mut entries = Vec::new();
    let mut stats = PlanStats {
        total_entries: manifest.entries.len(),
        ..Default::default()
    };

    for item in &manifest.entries {
        if item.filename.is_empty() {
            stats.unnamed += 1;
            continue;
        }

        let contents = match store.read(&item.filename) {
            Ok(bytes) => bytes,
            Err(_) => {
                stats.missing_files.push(item.filename.clone());
                continue;
            }
        };

        if let Err(reason) = codec.probe(&contents) {
            stats.unreadable_files.push((item.filename.clone(), reason));
            continue;
        }

        let mut regions = Vec::new();
        for raw in &item.tags {
            stats.total_regions += 1;
            match validate_region(raw, registry) {
                Ok(region) => regions.push(region),
                Err(RejectReason::UnknownTag(tag)) => {
                    *stats.unknown_tags.entry(tag).or_insert(0) += 1;
                }
                Err(reason) => {
                    stats.rejected_boxes.push(RejectedBox {
                        file: item.filename.clone(),
                        region: raw.clone(),
                        reason,
                    });
                }
            }
        }

        if regions.is_empty() {
            stats.no_valid_regions.push(item.filename.clone());
            continue;
        }

        stats.planned += 1;
        entries.push(UploadEntry {
            name: item.filename.clone(),
            contents,
            regions,
        });
    }

    (entries, stats)
}

//! Deterministic artifact naming and duplicate-work tracking.
//!
//! A derived artifact (an annotated copy of a source image) is named by
//! a pure rule: `<stem>-<kind>.jpg`. Before any expensive annotation
//! work, the tracker checks the expected name against a set of names
//! built once from the output directory listing, so repeated runs skip
//! work that is already done.
//!
//! Known limitation: two source files with the same basename under
//! different directories map to the same artifact name. The pending-work
//! planner treats that as a loud error rather than letting one silently
//! overwrite the other.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::TagliftError;

/// Extension every derived artifact carries.
pub const ARTIFACT_EXT: &str = "jpg";

/// Derives the expected artifact filename for a source file and an
/// annotation kind.
///
/// The stem is the source's basename without its (final) extension, so
/// `images/cat.jpg` with kind `lines` yields `cat-lines.jpg`. Pure and
/// deterministic; recomputed on demand, never stored.
pub fn artifact_name(source: &str, kind: &str) -> String {
    let stem = Path::new(source)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(source);
    format!("{stem}-{kind}.{ARTIFACT_EXT}")
}

/// The set of artifact names already present in the output location.
///
/// Built once per run from a flat directory listing; membership checks
/// replace the per-item rescan of the full file list.
#[derive(Clone, Debug, Default)]
pub struct ArtifactIndex {
    names: HashSet<String>,
}

impl ArtifactIndex {
    /// Builds the index from a listing of existing output names.
    ///
    /// Entries may carry directory prefixes; only the basename is kept.
    pub fn from_listing<I, S>(listing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = listing
            .into_iter()
            .filter_map(|item| {
                Path::new(item.as_ref())
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
            })
            .collect();
        Self { names }
    }

    /// Returns true if an artifact with this exact name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Returns true if the derived artifact for `source` under `kind`
    /// already exists. Idempotent: same inputs, same answer.
    pub fn already_processed(&self, source: &str, kind: &str) -> bool {
        self.contains(&artifact_name(source, kind))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Filters `sources` down to the ones whose artifact does not exist yet,
/// preserving input order.
///
/// Two distinct sources normalizing to the same artifact name are
/// reported as [`TagliftError::ArtifactCollision`]: processing both
/// would make the second overwrite the first.
pub fn pending_sources<'a>(
    sources: &'a [String],
    kind: &str,
    index: &ArtifactIndex,
) -> Result<Vec<&'a str>, TagliftError> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    let mut pending = Vec::new();

    for source in sources {
        let name = artifact_name(source, kind);
        if let Some(first) = seen.get(name.as_str()) {
            return Err(TagliftError::ArtifactCollision {
                artifact: name,
                first: (*first).to_string(),
                second: source.clone(),
            });
        }
        let exists = index.contains(&name);
        seen.insert(name, source);
        if !exists {
            pending.push(source.as_str());
        }
    }

    Ok(pending)
}

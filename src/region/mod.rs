//! Region types and per-region validation.
//!
//! A region is one rectangular annotation candidate tied to a tag name,
//! expressed as fractions of image width/height. Validation resolves the
//! tag against the remote registry snapshot and normalizes the geometry
//! into the unit square, rejecting anything that cannot be salvaged by
//! clamping alone.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Tolerance applied before clamping.
///
/// Values inside `[-ε, 1+ε]` are rounding artifacts and get clamped;
/// values outside are format/logic errors and are rejected instead.
pub const COORD_TOLERANCE: f64 = 1e-7;

/// An opaque tag identifier issued by the remote service.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(pub String);

impl TagId {
    /// Creates a new TagId.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TagId({})", self.0)
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A read-only snapshot of the remote project's tag catalog.
///
/// Fetched once per run; the core never mutates it.
#[derive(Clone, Debug, Default)]
pub struct TagRegistry {
    by_name: HashMap<String, TagId>,
}

impl TagRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from (name, id) pairs.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, TagId)>,
    {
        Self {
            by_name: pairs.into_iter().collect(),
        }
    }

    /// Adds or replaces a tag.
    pub fn insert(&mut self, name: impl Into<String>, id: TagId) {
        self.by_name.insert(name.into(), id);
    }

    /// Looks up the identifier for a tag name.
    pub fn resolve(&self, name: &str) -> Option<&TagId> {
        self.by_name.get(name)
    }

    /// Returns the number of known tags.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns true if the registry holds no tags.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// One annotation candidate as declared in the manifest.
///
/// Coordinates are expected to be normalized to `[0, 1]` relative to the
/// image dimensions, but nothing is enforced at construction time -
/// [`validate_region`] reports problems instead of panicking on them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawRegion {
    pub tag: String,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// A validated region carrying the resolved tag identifier.
///
/// Guaranteed by construction: all coordinates in `[0, 1]`,
/// `left + width <= 1`, `top + height <= 1`, `width > 0`, `height > 0`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolvedRegion {
    pub tag_id: TagId,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Why a declared region was rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// The tag name is not present in the registry snapshot.
    UnknownTag(String),
    /// A coordinate is non-finite or outside `[-ε, 1+ε]`.
    OutOfRange,
    /// The box collapses to zero or negative size after clamping.
    DegenerateBox,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::UnknownTag(tag) => write!(f, "unknown tag '{}'", tag),
            RejectReason::OutOfRange => write!(f, "coordinate out of range"),
            RejectReason::DegenerateBox => write!(f, "degenerate box"),
        }
    }
}

fn within_unit(value: f64) -> bool {
    value.is_finite() && (-COORD_TOLERANCE..=1.0 + COORD_TOLERANCE).contains(&value)
}

fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Validates one raw region against the unit square and the tag registry.
///
/// The tag is resolved first (its identifier is the payload of the
/// result); geometry checks follow. Values within tolerance of `[0, 1]`
/// are clamped, the width is capped to `1 - left` and the height to
/// `1 - top`, keeping the box inside the unit square without moving its
/// origin. Pure function: no side effects.
pub fn validate_region(
    raw: &RawRegion,
    registry: &TagRegistry,
) -> Result<ResolvedRegion, RejectReason> {
    let Some(tag_id) = registry.resolve(&raw.tag) else {
        return Err(RejectReason::UnknownTag(raw.tag.clone()));
    };

    if ![raw.left, raw.top, raw.width, raw.height]
        .iter()
        .all(|v| within_unit(*v))
    {
        return Err(RejectReason::OutOfRange);
    }

    let left = clamp01(raw.left);
    let top = clamp01(raw.top);
    let width = clamp01(raw.width).min(1.0 - left);
    let height = clamp01(raw.height).min(1.0 - top);

    if width <= 0.0 || height <= 0.0 {
        return Err(RejectReason::DegenerateBox);
    }

    Ok(ResolvedRegion {
        tag_id: tag_id.clone(),
        left,
        top,
        width,
        height,
    })
}

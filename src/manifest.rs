//! The tagged-image manifest: a JSON record mapping image files to their
//! declared region annotations.
//!
//! Expected shape:
//!
//! ```json
//! {
//!   "files": [
//!     {
//!       "filename": "apples-1.jpg",
//!       "tags": [
//!         { "tag": "apple", "left": 0.1, "top": 0.2, "width": 0.3, "height": 0.4 }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! A manifest without a `files` array is a configuration error, not a
//! per-item one: the run aborts before any network call.

use std::path::Path;

use serde::Deserialize;

use crate::error::TagliftError;
use crate::region::RawRegion;

#[derive(Debug, Deserialize)]
struct ManifestDoc {
    files: Option<Vec<ManifestEntry>>,
}

/// One manifest record: a source filename plus its declared regions.
#[derive(Clone, Debug, Deserialize)]
pub struct ManifestEntry {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub tags: Vec<RawRegion>,
}

/// A parsed manifest. Entry order is preserved from the file.
#[derive(Clone, Debug, Default)]
pub struct Manifest {
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Total number of declared regions across all entries.
    pub fn region_count(&self) -> usize {
        self.entries.iter().map(|e| e.tags.len()).sum()
    }
}

/// Reads and parses a manifest file.
pub fn read_manifest(path: &Path) -> Result<Manifest, TagliftError> {
    let text = std::fs::read_to_string(path)?;
    parse_manifest(&text, path)
}

/// Parses manifest text. An absent or empty `files` array is fatal.
pub fn parse_manifest(text: &str, path: &Path) -> Result<Manifest, TagliftError> {
    let doc: ManifestDoc =
        serde_json::from_str(text).map_err(|source| TagliftError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })?;

    match doc.files {
        Some(entries) if !entries.is_empty() => Ok(Manifest { entries }),
        _ => Err(TagliftError::ManifestMissingFiles {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Manifest, TagliftError> {
        parse_manifest(text, Path::new("tagged-images.json"))
    }

    #[test]
    fn parses_well_formed_manifest() {
        let manifest = parse(
            r#"{
                "files": [
                    {
                        "filename": "apples-1.jpg",
                        "tags": [
                            {"tag": "apple", "left": 0.1, "top": 0.2, "width": 0.3, "height": 0.4}
                        ]
                    },
                    {"filename": "empty.jpg"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.entries.len(), 2);
        assert_eq!(manifest.entries[0].filename, "apples-1.jpg");
        assert_eq!(manifest.entries[0].tags.len(), 1);
        assert_eq!(manifest.entries[0].tags[0].tag, "apple");
        assert!(manifest.entries[1].tags.is_empty());
        assert_eq!(manifest.region_count(), 1);
    }

    #[test]
    fn missing_files_array_is_fatal() {
        let err = parse(r#"{"other": []}"#).unwrap_err();
        assert!(matches!(err, TagliftError::ManifestMissingFiles { .. }));
    }

    #[test]
    fn empty_files_array_is_fatal() {
        let err = parse(r#"{"files": []}"#).unwrap_err();
        assert!(matches!(err, TagliftError::ManifestMissingFiles { .. }));
    }

    #[test]
    fn malformed_json_reports_parse_error() {
        let err = parse("{not json").unwrap_err();
        assert!(matches!(err, TagliftError::ManifestParse { .. }));
    }

    #[test]
    fn entry_order_is_preserved() {
        let manifest = parse(
            r#"{"files": [
                {"filename": "c.jpg"}, {"filename": "a.jpg"}, {"filename": "b.jpg"}
            ]}"#,
        )
        .unwrap();
        let names: Vec<_> = manifest.entries.iter().map(|e| e.filename.as_str()).collect();
        assert_eq!(names, ["c.jpg", "a.jpg", "b.jpg"]);
    }
}

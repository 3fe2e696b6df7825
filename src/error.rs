use std::path::PathBuf;
use thiserror::Error;

/// The main error type for taglift operations.
///
/// Only run-terminating conditions live here. Per-item problems (missing
/// files, unknown tags, rejected boxes, failed uploads) are categorized
/// outcomes in the run summary, never errors.
#[derive(Debug, Error)]
pub enum TagliftError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing required configuration value(s): {}", keys.join(", "))]
    MissingConfig { keys: Vec<String> },

    #[error("Failed to parse manifest {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No 'files' array in manifest {path}")]
    ManifestMissingFiles { path: PathBuf },

    #[error("No tags found in the project; create tags on the service first")]
    EmptyTagRegistry,

    #[error("Annotation service error: {message}")]
    Service { message: String },

    #[error(
        "Artifact name collision: '{artifact}' would be produced by both '{first}' and '{second}'"
    )]
    ArtifactCollision {
        artifact: String,
        first: String,
        second: String,
    },
}

//! The annotation service capability.
//!
//! The remote training service is an external collaborator; the uploader
//! only sees this trait. [`http::HttpAnnotationService`] is the
//! production implementation; tests drive the pipeline with scripted
//! fakes.

pub mod http;

use std::fmt;

use crate::plan::UploadEntry;
use crate::region::TagRegistry;

/// An error raised by the annotation service.
///
/// The remote SDK surfaces failures as text only, so the message is the
/// whole payload; retry classification scans it (see
/// [`classify_error`](crate::upload::classify_error)).
#[derive(Clone, Debug)]
pub struct ServiceError {
    pub message: String,
}

impl ServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ServiceError {}

/// Per-image status reported by the service for one submitted batch.
///
/// Any status other than the "OK" sentinel marks that image as rejected.
#[derive(Clone, Debug)]
pub struct ImageStatus {
    pub name: String,
    pub status: String,
}

/// The service's answer to one batch submission.
#[derive(Clone, Debug, Default)]
pub struct BatchSubmission {
    /// True when every image in the batch was accepted.
    pub is_batch_successful: bool,
    /// Per-image statuses; may be consulted only when the flag is false.
    pub images: Vec<ImageStatus>,
}

impl BatchSubmission {
    /// A fully successful submission.
    pub fn success() -> Self {
        Self {
            is_batch_successful: true,
            images: Vec::new(),
        }
    }
}

/// The remote training service, reduced to the two calls this pipeline
/// needs.
pub trait AnnotationService {
    /// Fetches the project's tag catalog.
    fn get_tags(&self, project_id: &str) -> Result<TagRegistry, ServiceError>;

    /// Submits one batch of upload entries as a single remote transaction.
    fn submit_batch(
        &self,
        project_id: &str,
        batch: &[UploadEntry],
    ) -> Result<BatchSubmission, ServiceError>;
}

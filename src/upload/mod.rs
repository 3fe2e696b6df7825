//! Batched upload with bounded exponential backoff.
//!
//! Entries are partitioned into contiguous batches and submitted
//! strictly in order, one at a time. Throttling and transient errors are
//! retried with a doubling delay (1s start, 16s ceiling); anything else
//! fails the batch immediately and the run moves on. Every entry ends in
//! exactly one outcome.

pub mod report;

pub use report::{ImageOutcome, RunSummary, UploadOutcome};

use std::collections::HashMap;
use std::time::Duration;

use crate::plan::UploadEntry;
use crate::service::{AnnotationService, BatchSubmission, ServiceError};

pub const DEFAULT_BATCH_LIMIT: usize = 64;
pub const DEFAULT_MAX_RETRIES: u32 = 5;

const INITIAL_DELAY: Duration = Duration::from_secs(1);
const MAX_DELAY: Duration = Duration::from_secs(16);

/// Options controlling batching and retry behavior.
#[derive(Clone, Copy, Debug)]
pub struct UploadOptions {
    /// Maximum entries per batch submission.
    pub batch_limit: usize,
    /// Maximum attempts per batch, including the first.
    pub max_retries: u32,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            batch_limit: DEFAULT_BATCH_LIMIT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Classification of a service error message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Rate-limit signal; slow down and retry.
    Throttling,
    /// Timeout/connection-reset class signal; retry.
    Transient,
    /// Everything else; fails the batch without retrying.
    Fatal,
}

impl ErrorClass {
    pub fn is_retryable(self) -> bool {
        !matches!(self, ErrorClass::Fatal)
    }
}

/// Classifies a service error by scanning its message text.
///
/// The remote SDK exposes failures as text only, so this mirrors the
/// signals it is known to emit. Kept as a single function so it can be
/// swapped for typed error codes if the service ever grows them.
pub fn classify_error(message: &str) -> ErrorClass {
    let msg = message.to_ascii_lowercase();
    if msg.contains("429") || msg.contains("too many requests") || msg.contains("throttle") {
        return ErrorClass::Throttling;
    }
    if ["timeout", "temporar", "connection", "reset"]
        .iter()
        .any(|signal| msg.contains(signal))
    {
        return ErrorClass::Transient;
    }
    ErrorClass::Fatal
}

/// Per-batch progress notification.
#[derive(Clone, Debug)]
pub struct BatchProgress {
    /// 1-based batch number.
    pub index: usize,
    pub size: usize,
    pub status: BatchStatus,
}

/// What happened to a batch (or one attempt at it).
#[derive(Clone, Debug)]
pub enum BatchStatus {
    /// A retryable error; the uploader is about to back off.
    Retrying {
        attempt: u32,
        max: u32,
        delay: Duration,
    },
    /// Every image in the batch was accepted.
    Ok,
    /// The submission went through but some images were rejected.
    PartialFailure { failed: usize },
    /// Fatal error or exhausted retries; the whole batch failed.
    Failed { message: String },
}

/// Uploads all entries, returning one outcome per entry.
///
/// Convenience wrapper over [`upload_entries_with_progress`] for callers
/// that do not report progress.
pub fn upload_entries<S, F>(
    service: &S,
    project_id: &str,
    entries: &[UploadEntry],
    opts: &UploadOptions,
    sleep: F,
) -> Vec<ImageOutcome>
where
    S: AnnotationService + ?Sized,
    F: FnMut(Duration),
{
    upload_entries_with_progress(service, project_id, entries, opts, sleep, |_| {})
}

/// Uploads all entries in contiguous batches of at most
/// `opts.batch_limit`, notifying `progress` as the run advances.
///
/// Post-condition: the result holds exactly one outcome per entry, in
/// entry order.
pub fn upload_entries_with_progress<S, F, P>(
    service: &S,
    project_id: &str,
    entries: &[UploadEntry],
    opts: &UploadOptions,
    mut sleep: F,
    mut progress: P,
) -> Vec<ImageOutcome>
where
    S: AnnotationService + ?Sized,
    F: FnMut(Duration),
    P: FnMut(&BatchProgress),
{
    let mut outcomes = Vec::with_capacity(entries.len());
    let batch_limit = opts.batch_limit.max(1);

    for (index, batch) in entries.chunks(batch_limit).enumerate() {
        let number = index + 1;
        match submit_with_retry(service, project_id, batch, opts, &mut sleep, |status| {
            progress(&BatchProgress {
                index: number,
                size: batch.len(),
                status,
            });
        }) {
            Ok(result) => {
                let batch_result = batch_outcomes(batch, &result);
                let failed = batch_result
                    .iter()
                    .filter(|o| !matches!(o.outcome, UploadOutcome::Uploaded))
                    .count();
                progress(&BatchProgress {
                    index: number,
                    size: batch.len(),
                    status: if failed == 0 {
                        BatchStatus::Ok
                    } else {
                        BatchStatus::PartialFailure { failed }
                    },
                });
                outcomes.extend(batch_result);
            }
            Err(err) => {
                progress(&BatchProgress {
                    index: number,
                    size: batch.len(),
                    status: BatchStatus::Failed {
                        message: err.message.clone(),
                    },
                });
                for entry in batch {
                    outcomes.push(ImageOutcome {
                        name: entry.name.clone(),
                        outcome: UploadOutcome::TransientFailure(err.message.clone()),
                    });
                }
            }
        }
    }

    outcomes
}

/// Submits one batch, retrying throttling/transient errors with a
/// doubling delay capped at 16 seconds.
fn submit_with_retry<S, F, N>(
    service: &S,
    project_id: &str,
    batch: &[UploadEntry],
    opts: &UploadOptions,
    sleep: &mut F,
    mut notify: N,
) -> Result<BatchSubmission, ServiceError>
where
    S: AnnotationService + ?Sized,
    F: FnMut(Duration),
    N: FnMut(BatchStatus),
{
    let max_attempts = opts.max_retries.max(1);
    let mut delay = INITIAL_DELAY;
    let mut attempt = 1;

    loop {
        match service.submit_batch(project_id, batch) {
            Ok(result) => return Ok(result),
            Err(err) => {
                let retryable = classify_error(&err.message).is_retryable();
                if !retryable || attempt >= max_attempts {
                    return Err(err);
                }
                notify(BatchStatus::Retrying {
                    attempt,
                    max: max_attempts,
                    delay,
                });
                sleep(delay);
                delay = (delay * 2).min(MAX_DELAY);
                attempt += 1;
            }
        }
    }
}

/// Maps a syntactically successful submission onto per-entry outcomes.
fn batch_outcomes(batch: &[UploadEntry], result: &BatchSubmission) -> Vec<ImageOutcome> {
    if result.is_batch_successful {
        return batch
            .iter()
            .map(|entry| ImageOutcome {
                name: entry.name.clone(),
                outcome: UploadOutcome::Uploaded,
            })
            .collect();
    }

    let statuses: HashMap<&str, &str> = result
        .images
        .iter()
        .map(|img| (img.name.as_str(), img.status.as_str()))
        .collect();

    batch
        .iter()
        .map(|entry| {
            let outcome = match statuses.get(entry.name.as_str()) {
                Some(status) if status.eq_ignore_ascii_case("ok") => UploadOutcome::Uploaded,
                Some(status) => UploadOutcome::RemoteRejected((*status).to_string()),
                None => UploadOutcome::RemoteRejected("no status returned".to_string()),
            };
            ImageOutcome {
                name: entry.name.clone(),
                outcome,
            }
        })
        .collect()
}

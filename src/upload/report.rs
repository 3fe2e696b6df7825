//! Run summary types and their human-readable rendering.
//!
//! Every per-item problem the planner or uploader recorded shows up in
//! the printed summary; exception text is never the only artifact of a
//! failure.

use std::fmt;

use crate::plan::PlanStats;

/// Bound on sample lists in the rendered report.
const SAMPLE_LIMIT: usize = 10;

/// Terminal result for one prepared image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The service accepted the image.
    Uploaded,
    /// The submission went through but the service rejected this image.
    RemoteRejected(String),
    /// The batch never succeeded (fatal error or exhausted retries).
    TransientFailure(String),
}

/// One image's name and its terminal outcome.
#[derive(Clone, Debug)]
pub struct ImageOutcome {
    pub name: String,
    pub outcome: UploadOutcome,
}

/// Aggregated result of a full run: planning tallies plus per-image
/// upload outcomes.
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    pub stats: PlanStats,
    pub outcomes: Vec<ImageOutcome>,
    /// Number of batches submitted; zero for a dry run.
    pub batches: usize,
}

impl RunSummary {
    pub fn new(stats: PlanStats, outcomes: Vec<ImageOutcome>, batches: usize) -> Self {
        Self {
            stats,
            outcomes,
            batches,
        }
    }

    /// A summary for a validation-only run with no upload attempted.
    pub fn plan_only(stats: PlanStats) -> Self {
        Self {
            stats,
            outcomes: Vec::new(),
            batches: 0,
        }
    }

    pub fn uploaded_count(&self) -> usize {
        self.count(|o| matches!(o, UploadOutcome::Uploaded))
    }

    pub fn remote_rejected_count(&self) -> usize {
        self.count(|o| matches!(o, UploadOutcome::RemoteRejected(_)))
    }

    pub fn transient_failure_count(&self) -> usize {
        self.count(|o| matches!(o, UploadOutcome::TransientFailure(_)))
    }

    fn count(&self, pred: impl Fn(&UploadOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.outcome)).count()
    }

    fn failures(&self) -> impl Iterator<Item = &ImageOutcome> {
        self.outcomes
            .iter()
            .filter(|o| !matches!(o.outcome, UploadOutcome::Uploaded))
    }
}

fn write_sample_list(f: &mut fmt::Formatter<'_>, names: &[String]) -> fmt::Result {
    let shown: Vec<&str> = names.iter().take(SAMPLE_LIMIT).map(String::as_str).collect();
    write!(f, "{}", shown.join(", "))?;
    if names.len() > SAMPLE_LIMIT {
        write!(f, " ...")?;
    }
    writeln!(f)
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = &self.stats;

        writeln!(f, "Summary")?;
        writeln!(f, "-------")?;
        writeln!(
            f,
            "Prepared: {} image(s), {} region annotation(s)",
            stats.planned, stats.total_regions
        )?;

        if self.batches == 0 {
            writeln!(f, "No upload attempted.")?;
        } else {
            writeln!(
                f,
                "Uploaded: {}/{} images in {} batch(es)",
                self.uploaded_count(),
                stats.planned,
                self.batches
            )?;
        }

        let rejected = self.remote_rejected_count();
        let failed = self.transient_failure_count();
        if rejected > 0 || failed > 0 {
            writeln!(
                f,
                "Failures: {} rejected by the service, {} never accepted",
                rejected, failed
            )?;
            for item in self.failures().take(SAMPLE_LIMIT) {
                match &item.outcome {
                    UploadOutcome::RemoteRejected(status) => {
                        writeln!(f, "  - {}: {}", item.name, status)?;
                    }
                    UploadOutcome::TransientFailure(reason) => {
                        writeln!(f, "  - {}: {}", item.name, reason)?;
                    }
                    UploadOutcome::Uploaded => {}
                }
            }
        }

        if !stats.missing_files.is_empty() {
            write!(f, "Missing files ({}): ", stats.missing_files.len())?;
            write_sample_list(f, &stats.missing_files)?;
        }

        if !stats.unreadable_files.is_empty() {
            writeln!(f, "Unreadable files ({}):", stats.unreadable_files.len())?;
            for (name, reason) in stats.unreadable_files.iter().take(SAMPLE_LIMIT) {
                writeln!(f, "  - {}: {}", name, reason)?;
            }
        }

        if !stats.unknown_tags.is_empty() {
            writeln!(f, "Unknown tag names (create them on the service or fix the manifest):")?;
            for (tag, count) in &stats.unknown_tags {
                writeln!(f, "  - {}: {} occurrence(s)", tag, count)?;
            }
        }

        if !stats.rejected_boxes.is_empty() {
            let first = &stats.rejected_boxes[0];
            writeln!(
                f,
                "Invalid/out-of-bounds boxes skipped: {} (e.g. '{}' tag '{}': {})",
                stats.rejected_boxes.len(),
                first.file,
                first.region.tag,
                first.reason
            )?;
        }

        if !stats.no_valid_regions.is_empty() {
            write!(
                f,
                "Images with no valid regions ({}): ",
                stats.no_valid_regions.len()
            )?;
            write_sample_list(f, &stats.no_valid_regions)?;
        }

        if stats.unnamed > 0 {
            writeln!(f, "Manifest entries without a filename: {}", stats.unnamed)?;
        }

        Ok(())
    }
}

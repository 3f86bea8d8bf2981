//! Batch result aggregation
//!
//! Pure folding of resolution and download outcomes into the final
//! [`BatchResult`]. Skipped transfers count as saved: the caller asked for
//! the file to exist locally and it does.

use crate::app::models::{BatchResult, DownloadOutcome, FailedCandidate, RequirementKey};

/// Fold download outcomes and unresolved keys into a batch result
///
/// Saved paths are deduplicated and ordered by ascending reference date then
/// mission; the same input always yields the same report.
pub fn aggregate(outcomes: Vec<DownloadOutcome>, mut unresolved: Vec<RequirementKey>) -> BatchResult {
    let mut saved = Vec::new();
    let mut failed = Vec::new();

    for outcome in outcomes {
        match outcome {
            DownloadOutcome::Saved { candidate, path }
            | DownloadOutcome::Skipped { candidate, path } => {
                saved.push((candidate.key, path));
            }
            DownloadOutcome::Failed {
                candidate,
                error,
                retries_exhausted,
            } => failed.push(FailedCandidate {
                candidate,
                error,
                retries_exhausted,
            }),
        }
    }

    saved.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    saved.dedup_by(|a, b| a.1 == b.1);

    unresolved.sort();
    unresolved.dedup();

    failed.sort_by(|a, b| a.candidate.key.cmp(&b.candidate.key));

    BatchResult {
        saved: saved.into_iter().map(|(_, path)| path).collect(),
        unresolved,
        failed,
    }
}

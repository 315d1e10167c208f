//! Core types for archive tasks.
//!
//! This module contains the task-level error taxonomy and the non-error
//! outcomes a task can finish with.

use crate::archive_engine::quality_gate::QaResult;
use crate::utils::constants::QUOTA_EXCEEDED_EXIT_CODE;

/// Task-level errors
///
/// Partial failures inside fan-out batches never surface here; they are
/// collected in a `PhaseResult` and logged. Only conditions that abort a task
/// (or the whole worker process) are represented.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The worker processed its maximum number of tasks and must be respawned
    #[error("Hit maximum of {limit} URLs archived per browser session ({processed} processed), exiting to free memory")]
    QuotaExceeded { processed: usize, limit: usize },

    /// The primary response had a 429 status
    #[error("Got 429 rate-limit response for {url}, skipping this URL for now")]
    RateLimited { url: String },

    /// Navigation failed or timed out
    #[error("Navigation failed for {url}: {reason}")]
    Navigation { url: String, reason: String },

    /// Snapshot directory, index record or browser tab could not be created
    #[error("Session setup failed: {0}")]
    Setup(String),

    /// A sequential phase panicked
    #[error("Task aborted during {phase} ({unit}): {reason}")]
    Aborted {
        phase: &'static str,
        unit: &'static str,
        reason: String,
    },

    /// The snapshot scored below the quality threshold
    #[error(
        "Task completed with problems, got QA score of {score}%! {} {}",
        .warnings.join(", "),
        .error_text.as_deref().unwrap_or("")
    )]
    QaFailed {
        score: f64,
        warnings: Vec<String>,
        error_text: Option<String>,
    },

    /// The QA artifact was missing or malformed
    #[error("Failed to read QA result: {0}")]
    QaUnreadable(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ArchiveError {
    /// Process exit status this error maps to, if it terminates the worker
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        match self {
            Self::QuotaExceeded { .. } => Some(QUOTA_EXCEEDED_EXIT_CODE),
            _ => None,
        }
    }

    /// Whether this error must stop the worker rather than just the task
    #[must_use]
    pub const fn is_process_fatal(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

/// Convenience alias for Result with `ArchiveError`
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Non-error task outcomes
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// Target was already archived by this process or has an ignored scheme
    Skipped,
    /// Every phase ran and the snapshot passed the quality gate
    Archived(QaResult),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_quota_maps_to_exit_code() {
        let quota = ArchiveError::QuotaExceeded {
            processed: 3,
            limit: 3,
        };
        assert_eq!(quota.exit_code(), Some(21));
        assert!(quota.is_process_fatal());

        let limited = ArchiveError::RateLimited {
            url: "https://example.com".into(),
        };
        assert_eq!(limited.exit_code(), None);
    }

    #[test]
    fn qa_failure_message_lists_score_and_warnings() {
        let err = ArchiveError::QaFailed {
            score: 12.0,
            warnings: vec!["overlay".into(), "little text".into()],
            error_text: Some("Access denied".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("12%"));
        assert!(msg.contains("overlay, little text"));
        assert!(msg.contains("Access denied"));
    }
}

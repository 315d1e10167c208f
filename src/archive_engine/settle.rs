//! Settle-all combinator for best-effort fan-out batches
//!
//! Every unit in a batch runs concurrently on the current task and the batch
//! completes only once all of them settled. Errors and panics are captured
//! as `Rejected` outcomes; nothing escapes the batch.

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use log::{debug, warn};
use std::any::Any;
use std::panic::AssertUnwindSafe;

/// Outcome of one unit in a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    Fulfilled,
    Rejected(String),
}

/// Named outcome of one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitReport {
    pub name: &'static str,
    pub outcome: UnitOutcome,
}

/// Outcome of a whole batch, in launch order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseResult {
    pub phase: &'static str,
    pub reports: Vec<UnitReport>,
}

impl PhaseResult {
    #[must_use]
    pub fn empty(phase: &'static str) -> Self {
        Self {
            phase,
            reports: Vec::new(),
        }
    }

    #[must_use]
    pub fn fulfilled_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.outcome == UnitOutcome::Fulfilled)
            .count()
    }

    #[must_use]
    pub fn rejected_count(&self) -> usize {
        self.reports.len() - self.fulfilled_count()
    }

    /// `(unit name, reason)` for every rejected unit
    #[must_use]
    pub fn rejected(&self) -> Vec<(&'static str, &str)> {
        self.reports
            .iter()
            .filter_map(|r| match &r.outcome {
                UnitOutcome::Rejected(reason) => Some((r.name, reason.as_str())),
                UnitOutcome::Fulfilled => None,
            })
            .collect()
    }

    /// Emit one warning line summarising every rejected unit
    pub fn log_partial_failures(&self) {
        let rejected = self.rejected();
        if rejected.is_empty() {
            debug!(
                "All {} units settled successfully during {}",
                self.reports.len(),
                self.phase
            );
            return;
        }
        let summary = rejected
            .iter()
            .map(|(name, reason)| format!("{name}: {reason}"))
            .collect::<Vec<_>>()
            .join("; ");
        warn!(
            "Partial failures during {} ({}/{} rejected): {summary}",
            self.phase,
            rejected.len(),
            self.reports.len()
        );
    }
}

/// Run every future to completion and collect named outcomes
pub async fn settle_all<'a>(
    phase: &'static str,
    batch: Vec<(&'static str, BoxFuture<'a, anyhow::Result<()>>)>,
) -> PhaseResult {
    let settled = batch.into_iter().map(|(name, fut)| async move {
        let outcome = match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(Ok(())) => UnitOutcome::Fulfilled,
            Ok(Err(e)) => UnitOutcome::Rejected(format!("{e:#}")),
            Err(panic) => UnitOutcome::Rejected(format!("panicked: {}", panic_message(&panic))),
        };
        UnitReport { name, outcome }
    });

    PhaseResult {
        phase,
        reports: join_all(settled).await,
    }
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(panic: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

//! Per-task timing and phase statistics written to `metrics.json`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::settle::PhaseResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseMetrics {
    pub phase: String,
    pub fulfilled: usize,
    pub rejected: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<String>,
}

impl From<&PhaseResult> for PhaseMetrics {
    fn from(result: &PhaseResult) -> Self {
        Self {
            phase: result.phase.to_string(),
            fulfilled: result.fulfilled_count(),
            rejected: result.rejected_count(),
            failures: result
                .rejected()
                .into_iter()
                .map(|(name, reason)| format!("{name}: {reason}"))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMetrics {
    pub url: String,
    pub version: String,
    pub browser_version: String,
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_response_status: Option<u16>,
    pub phases: Vec<PhaseMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskMetrics {
    #[must_use]
    pub fn new(url: &str, version: &str, browser_version: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            url: url.to_string(),
            version: version.to_string(),
            browser_version: browser_version.to_string(),
            started_at,
            duration_secs: 0.0,
            main_response_status: None,
            phases: Vec::new(),
            error: None,
        }
    }

    pub fn record(&mut self, result: &PhaseResult) {
        self.phases.push(PhaseMetrics::from(result));
    }

    /// Seconds since the task started
    #[must_use]
    pub fn elapsed_secs(&self) -> f64 {
        (Utc::now() - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    pub fn finish(&mut self) {
        self.duration_secs = self.elapsed_secs();
    }

    #[must_use]
    pub fn total_rejected(&self) -> usize {
        self.phases.iter().map(|p| p.rejected).sum()
    }
}

//! Quality gate: reads back `qa.json` and turns it into a task verdict

use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::archive_types::{ArchiveError, ArchiveResult};
use crate::snapshot::artifacts;
use crate::utils::string_utils::safe_truncate_chars;

/// Maximum characters of title or description shown in the verdict summary
const SUMMARY_MAX_CHARS: usize = 80;

/// Quality assessment of one archived version
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QaResult {
    /// Estimated share (0-100) of the page's main content that is visible
    pub pct_visible: f64,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_content_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_content_author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_content_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl QaResult {
    /// One-line summary: title or description, then author and date
    #[must_use]
    pub fn summary(&self) -> String {
        let headline = self
            .main_content_title
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.description.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or("No title/description detected");
        format!(
            "{}... {} {}",
            safe_truncate_chars(headline, SUMMARY_MAX_CHARS),
            self.main_content_author.as_deref().unwrap_or(""),
            self.main_content_date.as_deref().unwrap_or("")
        )
        .trim_end()
        .to_string()
    }
}

/// Write `qa.json` into `version_dir`
pub async fn write_qa_result(version_dir: &Path, qa: &QaResult) -> anyhow::Result<()> {
    crate::snapshot::write_json(&version_dir.join(artifacts::QA), qa).await
}

/// Read `qa.json` back from `version_dir`
pub async fn read_qa_result(version_dir: &Path) -> ArchiveResult<QaResult> {
    let path = version_dir.join(artifacts::QA);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| ArchiveError::QaUnreadable(format!("{}: {e}", path.display())))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ArchiveError::QaUnreadable(format!("{}: {e}", path.display())))
}

/// Pass or fail a QA result against `min_pct_visible`
pub fn judge(qa: QaResult, min_pct_visible: u8) -> ArchiveResult<QaResult> {
    if qa.pct_visible < f64::from(min_pct_visible) {
        return Err(ArchiveError::QaFailed {
            score: qa.pct_visible,
            warnings: qa.warnings,
            error_text: qa.error_text,
        });
    }
    Ok(qa)
}

/// Read, judge and log the verdict for one version directory
pub async fn evaluate(version_dir: &Path, min_pct_visible: u8) -> ArchiveResult<QaResult> {
    let qa = judge(read_qa_result(version_dir).await?, min_pct_visible)?;
    info!(
        "Task completed successfully: {}%    {}",
        qa.pct_visible,
        qa.warnings.join(", ")
    );
    info!("     Summary: {}", qa.summary());
    Ok(qa)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_prefers_title_then_description() {
        let mut qa = QaResult {
            pct_visible: 90.0,
            description: Some("A description".into()),
            ..QaResult::default()
        };
        assert!(qa.summary().starts_with("A description..."));

        qa.main_content_title = Some("The Title".into());
        qa.main_content_author = Some("Jo Doe".into());
        assert_eq!(qa.summary(), "The Title... Jo Doe");
    }

    #[test]
    fn summary_truncates_long_titles() {
        let qa = QaResult {
            main_content_title: Some("x".repeat(200)),
            ..QaResult::default()
        };
        assert!(qa.summary().starts_with(&format!("{}...", "x".repeat(80))));
        assert!(!qa.summary().contains(&"x".repeat(81)));
    }

    #[test]
    fn summary_without_metadata() {
        assert_eq!(QaResult::default().summary(), "No title/description detected...");
    }
}

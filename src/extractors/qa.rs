//! Heuristic quality scoring
//!
//! Measures the rendered page once and estimates how much of its main
//! content a reader would actually see. The score is written to `qa.json`
//! and read back by the quality gate.

use anyhow::Result;
use log::debug;
use serde::Deserialize;

use super::scripts::QA_PROBE_SCRIPT;
use crate::archive_engine::page_state::PageState;
use crate::archive_engine::quality_gate::{QaResult, write_qa_result};
use crate::chrome::page::ChromePage;

/// Characters of text at which a page counts as fully populated
const FULL_TEXT_LENGTH: f64 = 500.0;
/// Share of the score an overlay covering the whole viewport removes
const OVERLAY_PENALTY: f64 = 0.8;
/// Ceiling for pages showing an error block
const ERROR_PAGE_MAX_PCT: f64 = 10.0;

/// Raw measurements taken in the page
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QaProbe {
    pub text_length: u64,
    pub main_width: f64,
    pub main_height: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub overlay_area: f64,
    pub title: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub error_text: Option<String>,
}

/// Turn probe measurements into a visibility score with warnings
#[must_use]
pub fn score_probe(probe: QaProbe) -> QaResult {
    let mut warnings = Vec::new();

    #[allow(clippy::cast_precision_loss)]
    let text_factor = (probe.text_length as f64 / FULL_TEXT_LENGTH).min(1.0);
    if probe.text_length == 0 {
        warnings.push("Page has no visible text".to_string());
    } else if text_factor < 1.0 {
        warnings.push(format!("Only {} characters of text", probe.text_length));
    }

    let viewport_area = probe.viewport_width * probe.viewport_height;
    let overlay_ratio = if viewport_area > 0.0 {
        (probe.overlay_area / viewport_area).clamp(0.0, 1.0)
    } else {
        0.0
    };
    if overlay_ratio >= 0.25 {
        warnings.push(format!(
            "Fixed overlays cover {:.0}% of the viewport",
            overlay_ratio * 100.0
        ));
    }

    let mut pct = 100.0 * text_factor * (1.0 - overlay_ratio * OVERLAY_PENALTY);

    if probe.main_width <= 0.0 || probe.main_height <= 0.0 {
        warnings.push("Main content has no layout box".to_string());
        pct *= 0.5;
    }

    let error_text = probe.error_text.filter(|t| !t.is_empty());
    if let Some(ref error) = error_text {
        warnings.push(format!("Error page detected: {error}"));
        pct = pct.min(ERROR_PAGE_MAX_PCT);
    }

    QaResult {
        pct_visible: pct.round(),
        warnings,
        error_text,
        main_content_title: probe.title.filter(|t| !t.is_empty()),
        main_content_author: probe.author.filter(|t| !t.is_empty()),
        main_content_date: probe.date.filter(|t| !t.is_empty()),
        description: probe.description.filter(|t| !t.is_empty()),
    }
}

pub async fn save_qa_score(page: &ChromePage, state: &PageState) -> Result<()> {
    let probe: QaProbe = page.eval(QA_PROBE_SCRIPT).await?;
    let qa = score_probe(probe);
    debug!("QA score {}% with {} warnings", qa.pct_visible, qa.warnings.len());
    write_qa_result(state.version_dir(), &qa).await
}

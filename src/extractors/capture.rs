//! Screenshot and PDF capture
//!
//! Both run sequentially while the page is frozen in its final state.

use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams, PrintToPdfParams,
};
use log::{debug, warn};
use serde::Deserialize;
use std::time::{Duration, Instant};

use super::scripts::PAGE_READY_SCRIPT;
use crate::archive_engine::page_state::PageState;
use crate::chrome::page::ChromePage;
use crate::snapshot::artifacts;

const PAGE_LOAD_MAX_WAIT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Readiness {
    ready_state: String,
    images_loaded: bool,
    body_exists: bool,
}

/// Poll until `document.readyState` is complete, then leave a short buffer
/// for images and transitions. Gives up quietly after `max_wait`.
async fn wait_for_page_load(page: &ChromePage, max_wait: Duration) {
    let start = Instant::now();
    loop {
        if start.elapsed() >= max_wait {
            warn!(
                "Page not ready after {}s, capturing anyway",
                max_wait.as_secs()
            );
            break;
        }
        match page.eval::<Readiness>(PAGE_READY_SCRIPT).await {
            Ok(ready) if ready.ready_state == "complete" && ready.body_exists => {
                if !ready.images_loaded {
                    debug!("Images still loading, waiting additional 500ms");
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
                break;
            }
            Ok(_) => {}
            Err(e) => debug!("Failed to check readyState: {e}, retrying"),
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    tokio::time::sleep(Duration::from_millis(200)).await;
}

pub async fn save_screenshot(page: &ChromePage, state: &PageState) -> Result<()> {
    wait_for_page_load(page, PAGE_LOAD_MAX_WAIT).await;

    let params = CaptureScreenshotParams {
        format: Some(CaptureScreenshotFormat::Png),
        capture_beyond_viewport: Some(true),
        ..Default::default()
    };
    let data = page
        .inner()
        .screenshot(params)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to capture screenshot: {e}"))?;

    let path = state.artifact_path(artifacts::SCREENSHOT);
    tokio::fs::write(&path, &data)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    debug!("Saved screenshot ({} bytes)", data.len());
    Ok(())
}

pub async fn save_pdf(page: &ChromePage, state: &PageState) -> Result<()> {
    let params = PrintToPdfParams {
        print_background: Some(true),
        prefer_css_page_size: Some(true),
        ..Default::default()
    };
    let data = page
        .inner()
        .pdf(params)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to print PDF: {e}"))?;

    let path = state.artifact_path(artifacts::PDF);
    tokio::fs::write(&path, &data)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    debug!("Saved PDF ({} bytes)", data.len());
    Ok(())
}

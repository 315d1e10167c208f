use anyhow::{Context, Result, bail};
use chromiumoxide::cdp::browser_protocol::page::{CaptureSnapshotFormat, CaptureSnapshotParams};

use crate::archive_engine::page_state::PageState;
use crate::chrome::page::ChromePage;
use crate::snapshot::{artifacts, write_text};

/// Whole page with subresources as one MHTML document
pub async fn save_single_file(page: &ChromePage, state: &PageState) -> Result<()> {
    let snapshot = page
        .inner()
        .execute(CaptureSnapshotParams {
            format: Some(CaptureSnapshotFormat::Mhtml),
        })
        .await
        .context("Failed to capture MHTML snapshot")?;
    if snapshot.data.is_empty() {
        bail!("Browser returned an empty MHTML snapshot");
    }
    write_text(&state.artifact_path(artifacts::SINGLEFILE), &snapshot.data).await
}

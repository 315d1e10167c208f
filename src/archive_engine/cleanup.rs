//! Browser and resource cleanup after a worker run

use anyhow::Result;
use chromiumoxide::Browser;
use log::{debug, warn};
use std::path::PathBuf;
use tokio::task::JoinHandle;

/// Result of cleanup operations
#[derive(Debug, Clone)]
pub enum CleanupResult {
    /// All cleanup operations succeeded
    Success,
    /// Some cleanup operations failed, with error details
    PartialFailure(Vec<String>),
}

/// Close the browser, stop its CDP handler and remove its profile directory
pub async fn cleanup_browser_and_data(
    mut browser: Browser,
    handler: JoinHandle<()>,
    chrome_data_dir: PathBuf,
) -> Result<CleanupResult> {
    let mut errors = Vec::new();

    debug!(target: "pagearchive::cleanup", "Closing browser");
    if let Err(e) = browser.close().await {
        warn!(target: "pagearchive::cleanup", "Failed to close browser: {e}");
        errors.push(format!("Browser close failed: {e}"));
    }

    if let Err(e) = browser.wait().await {
        warn!(target: "pagearchive::cleanup", "Failed to wait for browser exit: {e}");
        errors.push(format!("Browser wait failed: {e}"));
    }
    handler.abort();

    debug!(target: "pagearchive::cleanup", "Removing Chrome data directory {}", chrome_data_dir.display());
    if let Err(e) = tokio::fs::remove_dir_all(&chrome_data_dir).await {
        warn!(target: "pagearchive::cleanup", "Failed to clean up Chrome data directory: {e}");
        errors.push(format!("Directory cleanup failed: {e}"));
    }

    if errors.is_empty() {
        Ok(CleanupResult::Success)
    } else {
        Ok(CleanupResult::PartialFailure(errors))
    }
}

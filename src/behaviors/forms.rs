use anyhow::{Context, Result};
use log::info;
use std::time::Duration;

use crate::archive_engine::page_state::PageState;
use crate::chrome::page::ChromePage;

/// Click each configured selector in order, e.g. a consent button then a submit
pub async fn submit_form(page: &ChromePage, _state: &PageState) -> Result<()> {
    for selector in page.config().form_submit_selectors() {
        let element = page
            .inner()
            .find_element(selector.as_str())
            .await
            .with_context(|| format!("No element matches {selector}"))?;
        element
            .click()
            .await
            .with_context(|| format!("Failed to click {selector}"))?;
        info!("Clicked {selector}");
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    Ok(())
}

use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::page::{EventJavascriptDialogOpening, HandleJavaScriptDialogParams};
use futures::StreamExt;
use log::{debug, warn};

use crate::archive_engine::page_state::PageState;
use crate::chrome::page::ChromePage;

/// Accept every alert, confirm, prompt and beforeunload dialog as it opens
pub async fn setup_modal_auto_closing(page: &ChromePage, state: &PageState) -> Result<()> {
    let page = page.inner().clone();
    let mut dialogs = page
        .event_listener::<EventJavascriptDialogOpening>()
        .await
        .context("Failed to subscribe to dialogs")?;

    state.register_page_hook(tokio::spawn(async move {
        while let Some(dialog) = dialogs.next().await {
            debug!("Auto-closing {:?} dialog: {}", dialog.r#type, dialog.message);
            let params = HandleJavaScriptDialogParams {
                accept: true,
                prompt_text: None,
            };
            if let Err(e) = page.execute(params).await {
                warn!("Failed to close dialog: {e}");
            }
        }
    }));
    Ok(())
}

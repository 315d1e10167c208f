use anyhow::{Result, bail};

use crate::archive_engine::page_state::PageState;
use crate::chrome::page::ChromePage;

/// Cancels script-initiated navigations and popups for the rest of the capture
const BLOCK_REDIRECTS_SCRIPT: &str = r#"
    (() => {
        window.open = () => null;
        let hooked = false;
        if (window.navigation && !window.__archiveRedirectsBlocked) {
            window.navigation.addEventListener('navigate', event => {
                if (event.cancelable && !event.userInitiated) {
                    event.preventDefault();
                }
            });
            hooked = true;
        }
        window.__archiveRedirectsBlocked = true;
        return hooked;
    })()
"#;

pub async fn block_redirects(page: &ChromePage, _state: &PageState) -> Result<()> {
    let hooked: bool = page.eval(BLOCK_REDIRECTS_SCRIPT).await?;
    if !hooked {
        bail!("Navigation API unavailable, only popups are blocked");
    }
    Ok(())
}

//! Request URL rewriting through the Fetch domain

use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, DisableParams, EnableParams, EventRequestPaused,
};
use futures::StreamExt;
use log::{debug, warn};

use crate::archive_engine::page_state::PageState;
use crate::chrome::page::ChromePage;
use crate::config::ArchiveConfig;

/// Apply the first matching rewrite rule to `url`
///
/// Returns `None` when no rule matches or the result is unchanged.
#[must_use]
pub fn rewrite_url(config: &ArchiveConfig, url: &str) -> Option<String> {
    config
        .url_rewrites_compiled()
        .find(|(pattern, _)| pattern.is_match(url))
        .map(|(pattern, replacement)| pattern.replace(url, replacement).into_owned())
        .filter(|rewritten| rewritten != url)
}

/// Pause every request and continue it with a rewritten URL where a rule matches
pub async fn setup_url_rewriting(page: &ChromePage, state: &PageState) -> Result<()> {
    if page.config().url_rewrites().is_empty() {
        return Ok(());
    }
    let config = page.config().clone();
    let page = page.inner().clone();

    let mut paused = page
        .event_listener::<EventRequestPaused>()
        .await
        .context("Failed to subscribe to paused requests")?;
    page.execute(EnableParams {
        patterns: None,
        handle_auth_requests: None,
    })
    .await
    .context("Failed to enable request interception")?;

    state.register_page_hook(tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let mut params = ContinueRequestParams::new(event.request_id.clone());
            if let Some(rewritten) = rewrite_url(&config, &event.request.url) {
                debug!("Rewriting {} -> {rewritten}", event.request.url);
                params.url = Some(rewritten);
            }
            if let Err(e) = page.execute(params).await {
                warn!("Failed to continue paused request {}: {e}", event.request.url);
            }
        }
    }));
    Ok(())
}

/// Stop intercepting requests
pub async fn stop_url_rewriting(page: &ChromePage, _state: &PageState) -> Result<()> {
    if page.config().url_rewrites().is_empty() {
        return Ok(());
    }
    page.inner()
        .execute(DisableParams {})
        .await
        .context("Failed to disable request interception")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_rules() -> ArchiveConfig {
        ArchiveConfig::builder()
            .storage_dir(std::env::temp_dir())
            .url_rewrite(r"^https?://(www\.)?twitter\.com/", "https://nitter.net/")
            .url_rewrite(r"\?utm_[^#]*", "")
            .build()
            .expect("valid config")
    }

    #[test]
    fn first_matching_rule_wins() {
        let config = config_with_rules();
        assert_eq!(
            rewrite_url(&config, "https://www.twitter.com/someone").as_deref(),
            Some("https://nitter.net/someone")
        );
        assert_eq!(
            rewrite_url(&config, "https://example.com/a?utm_source=x").as_deref(),
            Some("https://example.com/a")
        );
    }

    #[test]
    fn unmatched_urls_are_left_alone() {
        let config = config_with_rules();
        assert_eq!(rewrite_url(&config, "https://example.com/"), None);
    }
}

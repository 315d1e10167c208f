//! Saves every response body the page loads under `responses/`

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFinished, EventResponseReceived, GetResponseBodyParams, RequestId,
};
use futures::StreamExt;
use futures::stream;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::archive_engine::page_state::PageState;
use crate::chrome::page::ChromePage;
use crate::snapshot::artifacts::RESPONSES_DIR;
use crate::utils::constants::MAX_SAVED_RESPONSES;

/// File name for the `index`-th saved response of `url`
///
/// The last path segment is kept for readability; the index keeps names
/// unique and preserves arrival order in a directory listing.
#[must_use]
pub fn response_file_name(index: usize, url: &str) -> String {
    let segment = url::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "index".to_string());
    let safe = sanitize_filename::sanitize(segment);
    let safe = crate::utils::safe_truncate_chars(&safe, 100);
    format!("{index:04}_{safe}")
}

enum ResponseEvent {
    Received(RequestId, String),
    Finished(RequestId),
}

async fn save_body(page: &Page, request_id: RequestId, path: &Path) -> Result<usize> {
    let body = page
        .execute(GetResponseBodyParams::new(request_id))
        .await
        .context("Failed to read response body")?;
    let bytes = if body.base64_encoded {
        STANDARD
            .decode(&body.body)
            .context("Response body is not valid base64")?
    } else {
        body.body.clone().into_bytes()
    };
    tokio::fs::write(path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(bytes.len())
}

pub async fn start_response_saving(page: &ChromePage, state: &PageState) -> Result<()> {
    if !page.config().save_responses() {
        return Ok(());
    }
    let dir: PathBuf = state.artifact_path(RESPONSES_DIR);
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let page = page.inner().clone();
    let received = page
        .event_listener::<EventResponseReceived>()
        .await
        .context("Failed to subscribe to responses")?
        .map(|e| ResponseEvent::Received(e.request_id.clone(), e.response.url.clone()));
    let finished = page
        .event_listener::<EventLoadingFinished>()
        .await
        .context("Failed to subscribe to finished loads")?
        .map(|e| ResponseEvent::Finished(e.request_id.clone()));
    let mut events = stream::select(received, finished);

    state.register_recording_task(tokio::spawn(async move {
        let mut pending: HashMap<RequestId, String> = HashMap::new();
        let mut saved = 0usize;
        while let Some(event) = events.next().await {
            match event {
                ResponseEvent::Received(id, url) => {
                    pending.insert(id, url);
                }
                ResponseEvent::Finished(id) => {
                    let Some(url) = pending.remove(&id) else {
                        continue;
                    };
                    if url.starts_with("data:") {
                        continue;
                    }
                    if saved >= MAX_SAVED_RESPONSES {
                        log::debug!("Response limit reached, not saving {url}");
                        continue;
                    }
                    let path = dir.join(response_file_name(saved, &url));
                    match save_body(&page, id, &path).await {
                        Ok(bytes) => {
                            saved += 1;
                            log::trace!("Saved {bytes} bytes from {url}");
                        }
                        Err(e) => log::debug!("Skipping body of {url}: {e}"),
                    }
                }
            }
        }
    }));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_keep_order_and_last_segment() {
        assert_eq!(
            response_file_name(3, "https://cdn.example.com/js/app.min.js?v=2"),
            "0003_app.min.js"
        );
        assert_eq!(response_file_name(0, "https://example.com/"), "0000_index");
    }

    #[test]
    fn unsafe_characters_are_stripped() {
        let name = response_file_name(12, "https://example.com/a%3Cb%3E:c");
        assert!(name.starts_with("0012_"));
        assert!(!name.contains(':'));
    }
}

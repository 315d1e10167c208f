//! Artifacts built from the recorded traffic and console buffers

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chromiumoxide::cdp::browser_protocol::network::{GetResponseBodyParams, RequestId};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::archive_engine::page_state::{PageState, TrafficRecord};
use crate::chrome::page::ChromePage;
use crate::snapshot::{artifacts, write_json};

#[derive(Debug, Serialize)]
struct HeadersArtifact<'a> {
    url: &'a str,
    status: u16,
    status_text: &'a str,
    mime_type: Option<&'a str>,
    headers: &'a BTreeMap<String, String>,
}

/// Request id of the last response served for `url`
#[must_use]
pub fn main_request_id<'a>(traffic: &'a [TrafficRecord], url: &str) -> Option<&'a str> {
    traffic
        .iter()
        .rev()
        .find(|record| {
            record
                .response
                .as_ref()
                .is_some_and(|response| response.url == url)
        })
        .map(|record| record.request_id.as_str())
}

pub async fn save_requests(_page: &ChromePage, state: &PageState) -> Result<()> {
    write_json(&state.artifact_path(artifacts::REQUESTS), &state.traffic_log()).await
}

pub async fn save_redirects(_page: &ChromePage, state: &PageState) -> Result<()> {
    write_json(&state.artifact_path(artifacts::REDIRECTS), &state.redirects()).await
}

pub async fn save_console(_page: &ChromePage, state: &PageState) -> Result<()> {
    write_json(&state.artifact_path(artifacts::CONSOLE), &state.console_log()).await
}

pub async fn save_headers(_page: &ChromePage, state: &PageState) -> Result<()> {
    let response = state.main_response().context("No main response recorded")?;
    let artifact = HeadersArtifact {
        url: &response.url,
        status: response.status,
        status_text: &response.status_text,
        mime_type: response.mime_type.as_deref(),
        headers: &response.headers,
    };
    write_json(&state.artifact_path(artifacts::HEADERS), &artifact).await
}

/// Main document body exactly as served
pub async fn save_raw(page: &ChromePage, state: &PageState) -> Result<()> {
    let response = state.main_response().context("No main response recorded")?;
    let traffic = state.traffic_log();
    let request_id = main_request_id(&traffic, &response.url)
        .with_context(|| format!("No recorded request for {}", response.url))?;

    let body = page
        .inner()
        .execute(GetResponseBodyParams::new(RequestId::new(request_id)))
        .await
        .context("Failed to read main response body")?;
    let bytes = if body.base64_encoded {
        STANDARD
            .decode(&body.body)
            .context("Main response body is not valid base64")?
    } else {
        body.body.clone().into_bytes()
    };

    let path = state.artifact_path(artifacts::RAW);
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive_engine::session::ResponseInfo;

    fn record(id: &str, url: &str, responded: bool) -> TrafficRecord {
        TrafficRecord {
            request_id: id.to_string(),
            url: url.to_string(),
            response: responded.then(|| ResponseInfo {
                url: url.to_string(),
                status: 200,
                ..ResponseInfo::default()
            }),
            ..TrafficRecord::default()
        }
    }

    #[test]
    fn picks_last_response_for_url() {
        let traffic = vec![
            record("1", "https://example.com/", true),
            record("2", "https://example.com/app.js", true),
            record("3", "https://example.com/", true),
            record("4", "https://example.com/", false),
        ];
        assert_eq!(main_request_id(&traffic, "https://example.com/"), Some("3"));
        assert_eq!(main_request_id(&traffic, "https://other.example/"), None);
    }
}

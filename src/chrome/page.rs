//! Chromium-backed page session

use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::network::{EventResponseReceived, Headers, Response, SecurityDetails};
use chromiumoxide::cdp::browser_protocol::page::BringToFrontParams;
use futures::StreamExt;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use super::network_idle::wait_for_network_idle;
use crate::archive_engine::page_state::CaptureBuffers;
use crate::archive_engine::session::{PageSession, ResponseInfo, TlsInfo};
use crate::config::ArchiveConfig;

/// One browser tab owned by an archive task
pub struct ChromePage {
    page: Page,
    config: Arc<ArchiveConfig>,
}

impl ChromePage {
    #[must_use]
    pub fn new(page: Page, config: Arc<ArchiveConfig>) -> Self {
        Self { page, config }
    }

    /// The underlying chromiumoxide page, for units that speak CDP directly
    #[must_use]
    pub fn inner(&self) -> &Page {
        &self.page
    }

    #[must_use]
    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Evaluate `script` and deserialize its result
    pub async fn eval<T: DeserializeOwned>(&self, script: &str) -> Result<T> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("Failed to execute page script")?;
        let value: serde_json::Value = result
            .into_value()
            .map_err(|e| anyhow::anyhow!("Failed to get script value: {e}"))?;
        serde_json::from_value(value).context("Failed to parse script result")
    }

    async fn navigate(&self, url: &str) -> Result<Option<ResponseInfo>> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("Failed to navigate to {url}"))?;
        let request = self
            .page
            .wait_for_navigation_response()
            .await
            .context("Failed to read navigation response")?;
        Ok(request.and_then(|r| r.response.as_ref().map(response_info)))
    }

    async fn next_response(&self) -> Result<ResponseInfo> {
        let mut responses = self
            .page
            .event_listener::<EventResponseReceived>()
            .await
            .context("Failed to subscribe to responses")?;
        let event = responses
            .next()
            .await
            .context("Response stream ended before any response arrived")?;
        Ok(response_info(&event.response))
    }

    async fn release(&self) -> Result<()> {
        if let Err(e) = self.page.goto("about:blank").await {
            log::debug!("Failed to reset page to about:blank: {e}");
        }
        self.page.clone().close().await.context("Failed to close page")
    }
}

impl PageSession for ChromePage {
    fn goto<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Option<ResponseInfo>>> {
        Box::pin(self.navigate(url))
    }

    fn wait_for_response(&self) -> BoxFuture<'_, Result<ResponseInfo>> {
        Box::pin(self.next_response())
    }

    fn wait_for_network_idle(
        &self,
        idle_time: Duration,
        traffic: Arc<CaptureBuffers>,
    ) -> BoxFuture<'_, Result<()>> {
        Box::pin(wait_for_network_idle(&self.page, idle_time, traffic))
    }

    fn bring_to_front(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.page
                .execute(BringToFrontParams {})
                .await
                .context("Failed to bring page to front")?;
            Ok(())
        })
    }

    fn close(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.release())
    }
}

/// Flatten CDP headers into a sorted string map
#[must_use]
pub fn headers_map(headers: &Headers) -> BTreeMap<String, String> {
    headers
        .inner()
        .as_object()
        .map(|object| {
            object
                .iter()
                .map(|(name, value)| {
                    let value = value.as_str().map_or_else(|| value.to_string(), str::to_string);
                    (name.clone(), value)
                })
                .collect()
        })
        .unwrap_or_default()
}

fn tls_info(details: &SecurityDetails) -> TlsInfo {
    TlsInfo {
        protocol: details.protocol.clone(),
        subject_name: details.subject_name.clone(),
        issuer: details.issuer.clone(),
        san_list: details.san_list.clone(),
        valid_from: *details.valid_from.inner(),
        valid_to: *details.valid_to.inner(),
    }
}

/// Convert a CDP response into the engine's response record
#[must_use]
pub fn response_info(response: &Response) -> ResponseInfo {
    ResponseInfo {
        url: response.url.clone(),
        status: u16::try_from(response.status).unwrap_or_default(),
        status_text: response.status_text.clone(),
        mime_type: Some(response.mime_type.clone()),
        headers: headers_map(&response.headers),
        remote_ip: response.remote_ip_address.clone(),
        protocol: response.protocol.clone(),
        tls: response.security_details.as_ref().map(tls_info),
    }
}

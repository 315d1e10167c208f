//! Narrow interfaces to the browser session provider
//!
//! The sequencer only drives pages through `PageSession` and opens them
//! through `SessionProvider`. The Chromium implementation lives in
//! `crate::chrome`; tests substitute in-memory mocks.

use anyhow::Result;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use super::page_state::CaptureBuffers;
use crate::recorder::ScreenRecorder;

/// TLS details of a response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TlsInfo {
    pub protocol: String,
    pub subject_name: String,
    pub issuer: String,
    pub san_list: Vec<String>,
    /// Seconds since the epoch
    pub valid_from: f64,
    pub valid_to: f64,
}

/// A received HTTP response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseInfo {
    pub url: String,
    pub status: u16,
    #[serde(default)]
    pub status_text: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub remote_ip: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub tls: Option<TlsInfo>,
}

impl ResponseInfo {
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }
}

/// Operations the sequencer needs from an open page
pub trait PageSession: Send + Sync {
    /// Navigate and wait for load. `None` when no primary response was observed.
    fn goto<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Option<ResponseInfo>>>;

    /// Block until the next response event arrives
    fn wait_for_response(&self) -> BoxFuture<'_, Result<ResponseInfo>>;

    /// Resolve once no request has been in flight for `idle_time`
    ///
    /// Requests already pending in `traffic` count as in flight.
    fn wait_for_network_idle(
        &self,
        idle_time: Duration,
        traffic: Arc<CaptureBuffers>,
    ) -> BoxFuture<'_, Result<()>>;

    fn bring_to_front(&self) -> BoxFuture<'_, Result<()>>;

    /// Release the page. Called exactly once per task.
    fn close(&self) -> BoxFuture<'_, Result<()>>;
}

/// Opens pages and their screen recorders
pub trait SessionProvider: Send + Sync + 'static {
    type Page: PageSession + 'static;

    fn open_page(&self) -> BoxFuture<'_, Result<Self::Page>>;

    fn browser_version(&self) -> BoxFuture<'_, Result<String>>;

    /// Frame source bound to `page`, or `None` when recording is disabled
    fn screen_recorder(&self, page: &Self::Page) -> Option<Box<dyn ScreenRecorder>>;
}

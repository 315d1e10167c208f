//! Per-task mutable page state
//!
//! One `PageState` exists per task and is passed by reference to every phase
//! and unit. Capture buffers sit behind an `Arc` so event listener tasks can
//! append to them; each buffer has its own lock so units running in the same
//! batch never contend on unrelated fields.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;

use super::session::ResponseInfo;
use crate::recorder::RecorderHandle;
use crate::snapshot::SnapshotDir;

/// One console message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleEntry {
    pub level: String,
    pub text: String,
    /// Milliseconds since the epoch
    pub timestamp: f64,
}

/// Everything observed about one request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficRecord {
    pub request_id: String,
    pub url: String,
    pub method: String,
    pub resource_type: Option<String>,
    pub request_headers: BTreeMap<String, String>,
    pub response: Option<ResponseInfo>,
    pub failure: Option<String>,
    pub encoded_length: Option<f64>,
}

/// One hop of a redirect chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedirectHop {
    pub from: String,
    pub to: String,
    pub status: u16,
}

/// Buffers filled by metadata recording while the page loads
///
/// Appends are dropped once the buffers are frozen so later phases observe a
/// stable log.
#[derive(Debug, Default)]
pub struct CaptureBuffers {
    frozen: AtomicBool,
    console_log: Mutex<Vec<ConsoleEntry>>,
    traffic_log: Mutex<IndexMap<String, TrafficRecord>>,
    redirects: Mutex<Vec<RedirectHop>>,
}

impl CaptureBuffers {
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    pub fn push_console(&self, entry: ConsoleEntry) {
        if !self.is_frozen() {
            self.console_log.lock().push(entry);
        }
    }

    /// Insert or update the record for `request_id`
    pub fn record_traffic(&self, request_id: &str, update: impl FnOnce(&mut TrafficRecord)) {
        if self.is_frozen() {
            return;
        }
        let mut log = self.traffic_log.lock();
        let record = log
            .entry(request_id.to_string())
            .or_insert_with(|| TrafficRecord {
                request_id: request_id.to_string(),
                ..TrafficRecord::default()
            });
        update(record);
    }

    /// Requests seen starting that have neither finished nor failed
    #[must_use]
    pub fn pending_request_ids(&self) -> Vec<String> {
        self.traffic_log
            .lock()
            .values()
            .filter(|r| r.encoded_length.is_none() && r.failure.is_none())
            .map(|r| r.request_id.clone())
            .collect()
    }

    pub fn push_redirect(&self, hop: RedirectHop) {
        if !self.is_frozen() {
            self.redirects.lock().push(hop);
        }
    }

    fn freeze(&self) {
        self.frozen.store(true, Ordering::Release);
    }
}

/// Mutable aggregate shared by all phases of one task
pub struct PageState {
    pub original_url: String,
    pub browser_version: String,
    pub start_time: DateTime<Utc>,
    pub snapshot: SnapshotDir,
    buffers: Arc<CaptureBuffers>,
    main_response: Mutex<Option<ResponseInfo>>,
    recording_tasks: Mutex<Vec<JoinHandle<()>>>,
    page_hooks: Mutex<Vec<JoinHandle<()>>>,
    downloads: Mutex<Vec<(&'static str, JoinHandle<anyhow::Result<()>>)>>,
    recorder: Mutex<Option<RecorderHandle>>,
}

impl PageState {
    #[must_use]
    pub fn new(
        original_url: impl Into<String>,
        browser_version: impl Into<String>,
        start_time: DateTime<Utc>,
        snapshot: SnapshotDir,
    ) -> Self {
        Self {
            original_url: original_url.into(),
            browser_version: browser_version.into(),
            start_time,
            snapshot,
            buffers: Arc::new(CaptureBuffers::default()),
            main_response: Mutex::new(None),
            recording_tasks: Mutex::new(Vec::new()),
            page_hooks: Mutex::new(Vec::new()),
            downloads: Mutex::new(Vec::new()),
            recorder: Mutex::new(None),
        }
    }

    /// Version string shared by every artifact of this task
    #[must_use]
    pub fn version(&self) -> &str {
        self.snapshot.version()
    }

    #[must_use]
    pub fn version_dir(&self) -> &Path {
        self.snapshot.version_dir()
    }

    /// Path of a named artifact inside this task's version directory
    #[must_use]
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.snapshot.version_dir().join(name)
    }

    /// Handle for listener tasks that append to the capture buffers
    #[must_use]
    pub fn buffers(&self) -> Arc<CaptureBuffers> {
        Arc::clone(&self.buffers)
    }

    pub fn set_main_response(&self, response: ResponseInfo) {
        *self.main_response.lock() = Some(response);
    }

    #[must_use]
    pub fn main_response(&self) -> Option<ResponseInfo> {
        self.main_response.lock().clone()
    }

    #[must_use]
    pub fn console_log(&self) -> Vec<ConsoleEntry> {
        self.buffers.console_log.lock().clone()
    }

    #[must_use]
    pub fn traffic_log(&self) -> Vec<TrafficRecord> {
        self.buffers.traffic_log.lock().values().cloned().collect()
    }

    #[must_use]
    pub fn redirects(&self) -> Vec<RedirectHop> {
        self.buffers.redirects.lock().clone()
    }

    /// Track a listener that records metadata; stopped at metadata freeze
    pub fn register_recording_task(&self, handle: JoinHandle<()>) {
        self.recording_tasks.lock().push(handle);
    }

    /// Track a listener that lives until the page is closed
    pub fn register_page_hook(&self, handle: JoinHandle<()>) {
        self.page_hooks.lock().push(handle);
    }

    /// Track an external download; joined with the wrap-up tasks
    pub fn register_download(&self, name: &'static str, handle: JoinHandle<anyhow::Result<()>>) {
        self.downloads.lock().push((name, handle));
    }

    #[must_use]
    pub fn take_downloads(&self) -> Vec<(&'static str, JoinHandle<anyhow::Result<()>>)> {
        std::mem::take(&mut *self.downloads.lock())
    }

    /// Stop all metadata listeners and freeze the capture buffers
    ///
    /// Returns the number of listeners stopped.
    pub fn stop_metadata_recording(&self) -> usize {
        self.buffers.freeze();
        let handles = std::mem::take(&mut *self.recording_tasks.lock());
        let count = handles.len();
        for handle in handles {
            handle.abort();
        }
        count
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.buffers.is_frozen()
    }

    pub fn attach_recorder(&self, handle: RecorderHandle) {
        *self.recorder.lock() = Some(handle);
    }

    /// Mutable access to the recorder handle, if one is attached
    pub fn with_recorder<R>(&self, f: impl FnOnce(&mut RecorderHandle) -> R) -> Option<R> {
        self.recorder.lock().as_mut().map(f)
    }

    #[must_use]
    pub fn take_recorder(&self) -> Option<RecorderHandle> {
        self.recorder.lock().take()
    }
}

impl Drop for PageState {
    fn drop(&mut self) {
        for handle in self.recording_tasks.get_mut().drain(..) {
            handle.abort();
        }
        for handle in self.page_hooks.get_mut().drain(..) {
            handle.abort();
        }
        for (_, handle) in self.downloads.get_mut().drain(..) {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_requests_exclude_finished_and_failed_loads() {
        let buffers = CaptureBuffers::default();
        buffers.record_traffic("doc", |r| r.url = "https://example.com/".into());
        buffers.record_traffic("img", |r| r.url = "https://example.com/a.png".into());
        buffers.record_traffic("font", |r| r.url = "https://example.com/f.woff2".into());
        buffers.record_traffic("img", |r| r.encoded_length = Some(512.0));
        buffers.record_traffic("font", |r| r.failure = Some("net::ERR_ABORTED".into()));

        assert_eq!(buffers.pending_request_ids(), ["doc"]);
    }
}

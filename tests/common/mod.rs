//! Shared helpers for the archive engine integration tests
//!
//! `MockProvider` hands out `MockPage`s that answer navigation with a canned
//! response, so the sequencer can be driven end to end without a browser.

#![allow(dead_code)]

use anyhow::Result;
use futures::FutureExt;
use futures::future::BoxFuture;
use kodegen_tools_pagearchive::archive_engine::{
    AdmissionControl, ArchiveUnit, CaptureBuffers, PageSession, PageState, Pipeline, QaResult, ResponseInfo,
    Sequencer, SessionProvider, unit, write_qa_result,
};
use kodegen_tools_pagearchive::config::ArchiveConfig;
use kodegen_tools_pagearchive::recorder::ScreenRecorder;
use kodegen_tools_pagearchive::utils::snapshot_dir_for_url;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

/// Counts shared between a provider, its pages and the test
#[derive(Debug, Default)]
pub struct Calls {
    pub pages_opened: AtomicUsize,
    pub gotos: AtomicUsize,
    pub response_waits: AtomicUsize,
    pub closes: AtomicUsize,
    /// Requests pending when the network-idle wait began
    pub idle_pending: parking_lot::Mutex<Vec<String>>,
}

pub struct MockPage {
    /// What `goto` reports; `None` forces the fallback response wait
    goto_response: Option<ResponseInfo>,
    fallback_response: ResponseInfo,
    calls: Arc<Calls>,
}

impl PageSession for MockPage {
    fn goto<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, Result<Option<ResponseInfo>>> {
        self.calls.gotos.fetch_add(1, Ordering::SeqCst);
        let response = self.goto_response.clone();
        async move { Ok(response) }.boxed()
    }

    fn wait_for_response(&self) -> BoxFuture<'_, Result<ResponseInfo>> {
        self.calls.response_waits.fetch_add(1, Ordering::SeqCst);
        let response = self.fallback_response.clone();
        async move { Ok(response) }.boxed()
    }

    fn wait_for_network_idle(
        &self,
        _idle_time: Duration,
        traffic: Arc<CaptureBuffers>,
    ) -> BoxFuture<'_, Result<()>> {
        *self.calls.idle_pending.lock() = traffic.pending_request_ids();
        async { Ok(()) }.boxed()
    }

    fn bring_to_front(&self) -> BoxFuture<'_, Result<()>> {
        async { Ok(()) }.boxed()
    }

    fn close(&self) -> BoxFuture<'_, Result<()>> {
        self.calls.closes.fetch_add(1, Ordering::SeqCst);
        async { Ok(()) }.boxed()
    }
}

/// Lifecycle counts of the recorders a provider hands out
#[derive(Debug, Default)]
pub struct RecorderCounts {
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub drops: AtomicUsize,
}

/// Writes a placeholder video on start and counts every lifecycle call
pub struct CountingRecorder {
    counts: Arc<RecorderCounts>,
}

impl ScreenRecorder for CountingRecorder {
    fn start<'a>(&'a mut self, output: &'a Path) -> BoxFuture<'a, Result<()>> {
        async move {
            self.counts.starts.fetch_add(1, Ordering::SeqCst);
            tokio::fs::write(output, b"fake mp4").await?;
            Ok(())
        }
        .boxed()
    }

    fn stop(&mut self) -> BoxFuture<'_, Result<()>> {
        self.counts.stops.fetch_add(1, Ordering::SeqCst);
        async { Ok(()) }.boxed()
    }
}

impl Drop for CountingRecorder {
    fn drop(&mut self) {
        self.counts.drops.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct MockProvider {
    pub calls: Arc<Calls>,
    pub recorder: Option<Arc<RecorderCounts>>,
    status: u16,
    primary_response: bool,
}

impl MockProvider {
    pub fn new(status: u16) -> Self {
        Self {
            calls: Arc::new(Calls::default()),
            recorder: None,
            status,
            primary_response: true,
        }
    }

    /// Hand out a [`CountingRecorder`] with every page
    pub fn with_recorder(mut self) -> Self {
        self.recorder = Some(Arc::new(RecorderCounts::default()));
        self
    }

    pub fn recorder_counts(&self) -> &RecorderCounts {
        self.recorder.as_deref().expect("provider built with_recorder")
    }

    /// Navigation reports no primary response
    pub fn without_primary_response(mut self) -> Self {
        self.primary_response = false;
        self
    }
}

pub fn response(url: &str, status: u16) -> ResponseInfo {
    ResponseInfo {
        url: url.to_string(),
        status,
        status_text: if status == 200 { "OK".into() } else { String::new() },
        mime_type: Some("text/html".into()),
        ..ResponseInfo::default()
    }
}

impl SessionProvider for MockProvider {
    type Page = MockPage;

    fn open_page(&self) -> BoxFuture<'_, Result<MockPage>> {
        self.calls.pages_opened.fetch_add(1, Ordering::SeqCst);
        let primary = response("https://example.com/", self.status);
        let page = MockPage {
            goto_response: self.primary_response.then(|| primary.clone()),
            fallback_response: primary,
            calls: Arc::clone(&self.calls),
        };
        async move { Ok(page) }.boxed()
    }

    fn browser_version(&self) -> BoxFuture<'_, Result<String>> {
        async { Ok("MockChrome/1.0".to_string()) }.boxed()
    }

    fn screen_recorder(&self, _page: &MockPage) -> Option<Box<dyn ScreenRecorder>> {
        let counts = Arc::clone(self.recorder.as_ref()?);
        Some(Box::new(CountingRecorder { counts }))
    }
}

pub fn test_config(storage: &Path) -> ArchiveConfig {
    ArchiveConfig::builder()
        .storage_dir(storage)
        .screen_recording(false)
        .save_gif(false)
        .build()
        .expect("valid test config")
}

/// A unit that bumps `counter` and succeeds
pub fn counting_unit(name: &'static str, counter: Arc<AtomicUsize>) -> Box<dyn ArchiveUnit<MockPage>> {
    unit(name, move |_page: &MockPage, _state: &PageState| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        .boxed()
    })
}

pub fn failing_unit(name: &'static str, reason: &'static str) -> Box<dyn ArchiveUnit<MockPage>> {
    unit(name, move |_page: &MockPage, _state: &PageState| {
        async move { Err(anyhow::anyhow!(reason)) }.boxed()
    })
}

async fn explode() -> Result<()> {
    panic!("unit exploded")
}

pub fn panicking_unit(name: &'static str) -> Box<dyn ArchiveUnit<MockPage>> {
    unit(name, |_page: &MockPage, _state: &PageState| explode().boxed())
}

/// Shared record of unit start and end events
pub type EventLog = Arc<parking_lot::Mutex<Vec<String>>>;

/// Logs `<name>:start`, sleeps for `delay`, then logs `<name>:end`
pub fn logging_unit(name: &'static str, log: EventLog, delay: Duration) -> Box<dyn ArchiveUnit<MockPage>> {
    unit(name, move |_page: &MockPage, _state: &PageState| {
        let log = Arc::clone(&log);
        async move {
            log.lock().push(format!("{name}:start"));
            tokio::time::sleep(delay).await;
            log.lock().push(format!("{name}:end"));
            Ok(())
        }
        .boxed()
    })
}

/// Registers a background download that writes `file` after `delay`
pub fn download_unit(
    name: &'static str,
    file: &'static str,
    delay: Duration,
    succeed: bool,
) -> Box<dyn ArchiveUnit<MockPage>> {
    unit(name, move |_page: &MockPage, state: &PageState| {
        let path = state.artifact_path(file);
        let download = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !succeed {
                anyhow::bail!("exited with status 1");
            }
            tokio::fs::write(path, b"video").await?;
            Ok::<_, anyhow::Error>(())
        });
        state.register_download(name, download);
        async { Ok(()) }.boxed()
    })
}

/// Writes `file` into the version directory
pub fn artifact_unit(name: &'static str, file: &'static str) -> Box<dyn ArchiveUnit<MockPage>> {
    unit(name, move |_page: &MockPage, state: &PageState| {
        async move {
            tokio::fs::write(state.artifact_path(file), b"artifact").await?;
            Ok::<_, anyhow::Error>(())
        }
        .boxed()
    })
}

/// Writes `qa.json` with the given score
pub fn qa_unit(pct_visible: f64) -> Box<dyn ArchiveUnit<MockPage>> {
    unit("qa", move |_page: &MockPage, state: &PageState| {
        async move {
            let qa = QaResult {
                pct_visible,
                main_content_title: Some("Example Domain".into()),
                ..QaResult::default()
            };
            write_qa_result(state.version_dir(), &qa).await
        }
        .boxed()
    })
}

pub struct Harness {
    pub storage: TempDir,
    pub provider: Arc<MockProvider>,
    pub sequencer: Sequencer<MockProvider>,
}

impl Harness {
    pub fn new(provider: MockProvider, pipeline: Pipeline<MockPage>) -> Self {
        Self::with_limit(provider, pipeline, 200)
    }

    pub fn with_limit(provider: MockProvider, pipeline: Pipeline<MockPage>, limit: usize) -> Self {
        let storage = TempDir::new().expect("tempdir");
        let config = Arc::new(test_config(storage.path()));
        let admission = Arc::new(AdmissionControl::new(
            limit,
            config.ignored_schemes().to_vec(),
            config.max_dedup_key_len(),
        ));
        let provider = Arc::new(provider);
        let sequencer = Sequencer::new(Arc::clone(&provider), config, pipeline, admission);
        Self {
            storage,
            provider,
            sequencer,
        }
    }

    pub fn calls(&self) -> &Calls {
        &self.provider.calls
    }

    pub fn snapshot_root(&self, url: &str) -> PathBuf {
        snapshot_dir_for_url(url, self.storage.path()).expect("valid url")
    }

    /// The single version directory written for `url`
    pub fn version_dir(&self, url: &str) -> PathBuf {
        let versions = self.snapshot_root(url).join("versions");
        let mut dirs: Vec<PathBuf> = std::fs::read_dir(&versions)
            .expect("versions dir")
            .map(|entry| entry.expect("dir entry").path())
            .collect();
        assert_eq!(dirs.len(), 1, "expected exactly one version in {}", versions.display());
        dirs.remove(0)
    }
}

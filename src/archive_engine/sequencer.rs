//! Single-page archive task orchestrator
//!
//! Drives one target through admission, session setup, page preparation,
//! navigation, settling, behaviours, metadata freeze, synchronous capture,
//! parallel and background extraction, wrap-up and the quality gate.
//!
//! Fan-out phases never fail the task: rejected units are logged and counted.
//! Navigation failures, 429 responses and panics in sequential phases abort
//! the task, but wrap-up (closing the page, writing metrics, linking best
//! artifacts) still runs.

use chrono::Utc;
use futures::FutureExt;
use futures::future::BoxFuture;
use log::{debug, info, warn};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use super::admission::{Admission, AdmissionControl};
use super::archive_types::{ArchiveError, ArchiveResult, TaskOutcome};
use super::metrics::TaskMetrics;
use super::page_state::PageState;
use super::page_timeout::{tolerate_timeout, with_page_timeout};
use super::quality_gate::{self, QaResult};
use super::session::{PageSession, ResponseInfo, SessionProvider};
use super::settle::{PhaseResult, UnitOutcome, UnitReport, panic_message, settle_all};
use super::unit::{Pipeline, UnitList};
use crate::config::ArchiveConfig;
use crate::recorder::{GifTranscoder, RecorderController, RecordingSession, RecordingState};
use crate::snapshot::{SnapshotDir, SnapshotIndex, VersionStatus, artifacts, symlink_best_results, write_json};

type Batch<'a> = Vec<(&'static str, BoxFuture<'a, anyhow::Result<()>>)>;

fn batch<'a, P: ?Sized>(units: &'a UnitList<P>, page: &'a P, state: &'a PageState) -> Batch<'a> {
    units.iter().map(|u| (u.name(), u.run(page, state))).collect()
}

/// Runs archive tasks against pages opened by a [`SessionProvider`]
pub struct Sequencer<S: SessionProvider> {
    provider: Arc<S>,
    config: Arc<ArchiveConfig>,
    pipeline: Arc<Pipeline<S::Page>>,
    admission: Arc<AdmissionControl>,
}

impl<S: SessionProvider> Clone for Sequencer<S> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            config: Arc::clone(&self.config),
            pipeline: Arc::clone(&self.pipeline),
            admission: Arc::clone(&self.admission),
        }
    }
}

impl<S: SessionProvider> Sequencer<S> {
    #[must_use]
    pub fn new(
        provider: Arc<S>,
        config: Arc<ArchiveConfig>,
        pipeline: Pipeline<S::Page>,
        admission: Arc<AdmissionControl>,
    ) -> Self {
        Self {
            provider,
            config,
            pipeline: Arc::new(pipeline),
            admission,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    #[must_use]
    pub fn admission(&self) -> &Arc<AdmissionControl> {
        &self.admission
    }

    /// Archive one target
    ///
    /// Returns `Skipped` for ignored or already-processed targets and
    /// `Archived` once the snapshot passed the quality gate.
    pub async fn run(&self, target: &str) -> ArchiveResult<TaskOutcome> {
        match self.admission.admit(target)? {
            Admission::Skip(reason) => {
                debug!("Skipping {target}: {reason}");
                return Ok(TaskOutcome::Skipped);
            }
            Admission::Admitted => {}
        }

        let start_time = Utc::now();
        info!("[0/4] Setting up snapshot for {target}");
        let snapshot = SnapshotDir::setup(target, self.config.storage_dir(), &start_time)
            .await
            .map_err(|e| ArchiveError::Setup(format!("{e:#}")))?;

        let browser_version = match self.provider.browser_version().await {
            Ok(version) => version,
            Err(e) => {
                warn!("Failed to read browser version: {e:#}");
                "unknown".to_string()
            }
        };
        SnapshotIndex::record_start(&snapshot, target, start_time, &browser_version)
            .await
            .map_err(|e| ArchiveError::Setup(format!("{e:#}")))?;

        let page = match self.provider.open_page().await {
            Ok(page) => page,
            Err(e) => {
                let reason = format!("Failed to open page: {e:#}");
                record_finish(&snapshot, &Err(ArchiveError::Setup(reason.clone()))).await;
                return Err(ArchiveError::Setup(reason));
            }
        };

        let state = PageState::new(target, browser_version, start_time, snapshot);
        self.attach_recorder(&page, &state);

        let mut metrics = TaskMetrics::new(target, state.version(), &state.browser_version, start_time);
        let driven = self.drive(&page, &state, &mut metrics).await;
        if let Err(ref e) = driven {
            metrics.error = Some(e.to_string());
        }
        self.wrap_up(&page, &state, &mut metrics).await;

        let verdict = match driven {
            Ok(()) => quality_gate::evaluate(state.version_dir(), self.config.qa_min_pct_visible()).await,
            Err(e) => Err(e),
        };
        record_finish(&state.snapshot, &verdict).await;

        verdict.map(TaskOutcome::Archived)
    }

    fn attach_recorder(&self, page: &S::Page, state: &PageState) {
        let Some(recorder) = self.provider.screen_recorder(page) else {
            return;
        };
        let mut session = RecordingSession::new(recorder, state.artifact_path(artifacts::SCREENRECORDING));
        let transcoder = if self.config.save_gif() {
            session = session.with_gif(state.artifact_path(artifacts::SCREENRECORDING_GIF));
            Some(GifTranscoder::from_config(&self.config))
        } else {
            None
        };
        state.attach_recorder(RecorderController::spawn(session, transcoder));
    }

    /// Phases 3 to 10
    async fn drive(&self, page: &S::Page, state: &PageState, metrics: &mut TaskMetrics) -> ArchiveResult<()> {
        let pipeline = &self.pipeline;
        let (width, height) = self.config.viewport();

        info!(
            "[1/4] Starting page & viewport setup ({} {width}x{height}px)",
            state.browser_version
        );
        let setup = settle_all("page setup", batch(&pipeline.preparation, page, state)).await;
        setup.log_partial_failures();
        metrics.record(&setup);
        let recording_started = state
            .with_recorder(|r| {
                r.setup_finished();
                r.take_started()
            })
            .flatten();

        info!("[2/4] NAVIGATION {}", state.original_url);
        let response = self.navigate(page, state).await?;
        metrics.main_response_status = Some(response.status);
        if response.is_rate_limited() {
            return Err(ArchiveError::RateLimited {
                url: state.original_url.clone(),
            });
        }

        let start_timeout = self.config.response_timeout();
        let mut load: Batch<'_> = vec![
            ("bring_to_front", page.bring_to_front()),
            (
                "network_idle",
                tolerate_timeout(
                    page.wait_for_network_idle(self.config.network_idle_time(), state.buffers()),
                    self.config.network_idle_timeout(),
                    "Network idle",
                )
                .boxed(),
            ),
        ];
        if let Some(started) = recording_started {
            load.push((
                "screen_recording_start",
                async move {
                    match tokio::time::timeout(start_timeout, started).await {
                        Ok(Ok(true)) => Ok(()),
                        Ok(Ok(false)) => Err(anyhow::anyhow!("screen recorder did not start")),
                        Ok(Err(_)) => Err(anyhow::anyhow!("screen recorder exited before starting")),
                        Err(_) => Err(anyhow::anyhow!("screen recorder start timed out")),
                    }
                }
                .boxed(),
            ));
        }
        let loaded = settle_all("page load", load).await;
        loaded.log_partial_failures();
        metrics.record(&loaded);

        let behaviors = run_sequential("behaviors", &pipeline.behaviors, page, state).await?;
        behaviors.log_partial_failures();
        metrics.record(&behaviors);

        info!("[3/4] Stopping metadata recording and capturing page");
        let freeze = run_sequential("metadata freeze", &pipeline.freeze, page, state).await?;
        freeze.log_partial_failures();
        metrics.record(&freeze);
        let stopped = state.stop_metadata_recording();
        debug!("Stopped {stopped} metadata listeners");

        state.with_recorder(|r| r.interaction_finished());
        let capture = run_sequential("capture", &pipeline.capture, page, state).await?;
        capture.log_partial_failures();
        metrics.record(&capture);

        info!("[4/4] Running parallel extractors");
        let extraction = settle_all("archiving", batch(&pipeline.extraction, page, state)).await;
        extraction.log_partial_failures();
        metrics.record(&extraction);

        let mut background = batch(&pipeline.background, page, state);
        if let Some(recorder) = state.take_recorder() {
            background.insert(
                0,
                (
                    "screen_recording",
                    async move {
                        match recorder.wait().await {
                            RecordingState::Done => Ok(()),
                            other => Err(anyhow::anyhow!("recording ended in state {other:?}")),
                        }
                    }
                    .boxed(),
                ),
            );
        }
        for (name, download) in state.take_downloads() {
            background.push((
                name,
                async move {
                    download
                        .await
                        .map_err(|e| anyhow::anyhow!("{name} download task failed: {e}"))?
                }
                .boxed(),
            ));
        }
        info!("Finished archiving in {:.1}s", metrics.elapsed_secs());
        let wrap = settle_all("wrap-up tasks", background).await;
        wrap.log_partial_failures();
        metrics.record(&wrap);

        Ok(())
    }

    async fn navigate(&self, page: &S::Page, state: &PageState) -> ArchiveResult<ResponseInfo> {
        let url = state.original_url.as_str();
        let navigation_error = |e: anyhow::Error| ArchiveError::Navigation {
            url: url.to_string(),
            reason: format!("{e:#}"),
        };

        let observed = with_page_timeout(page.goto(url), self.config.navigation_timeout(), "Navigation")
            .await
            .map_err(navigation_error)?;
        let response = match observed {
            Some(response) => response,
            None => {
                debug!("No primary response observed for {url}, waiting for the next response");
                with_page_timeout(
                    page.wait_for_response(),
                    self.config.response_timeout(),
                    "Response wait",
                )
                .await
                .map_err(navigation_error)?
            }
        };

        state.set_main_response(response.clone());
        Ok(response)
    }

    /// Phase 11; every error is logged and swallowed
    async fn wrap_up(&self, page: &S::Page, state: &PageState, metrics: &mut TaskMetrics) {
        if let Some(recorder) = state.take_recorder() {
            debug!("Abandoning screen recording of an aborted task");
            drop(recorder);
        }
        for (name, download) in state.take_downloads() {
            debug!("Abandoning {name} download of an aborted task");
            download.abort();
        }

        info!("Resetting to about:blank to ensure memory is freed...");
        if let Err(e) = with_page_timeout(page.close(), self.config.navigation_timeout(), "Page close").await {
            warn!("Failed to close page: {e:#}");
        }

        metrics.finish();
        if let Err(e) = write_json(&state.artifact_path(artifacts::METRICS), metrics).await {
            warn!("Failed to write metrics: {e:#}");
        }

        if let Err(e) = symlink_best_results(state.snapshot.root()).await {
            warn!("Failed to link best snapshot results: {e:#}");
        }
    }
}

/// Run units one at a time with exclusive use of the page
///
/// Errors are recorded as rejections; a panic aborts the task.
async fn run_sequential<P: ?Sized>(
    phase: &'static str,
    units: &UnitList<P>,
    page: &P,
    state: &PageState,
) -> ArchiveResult<PhaseResult> {
    let mut result = PhaseResult::empty(phase);
    for unit in units {
        let outcome = match AssertUnwindSafe(unit.run(page, state)).catch_unwind().await {
            Ok(Ok(())) => UnitOutcome::Fulfilled,
            Ok(Err(e)) => UnitOutcome::Rejected(format!("{e:#}")),
            Err(panic) => {
                return Err(ArchiveError::Aborted {
                    phase,
                    unit: unit.name(),
                    reason: panic_message(&panic),
                });
            }
        };
        result.reports.push(UnitReport {
            name: unit.name(),
            outcome,
        });
    }
    Ok(result)
}

async fn record_finish(snapshot: &SnapshotDir, verdict: &ArchiveResult<QaResult>) {
    let (status, pct_visible, error) = match verdict {
        Ok(qa) => (VersionStatus::Succeeded, Some(qa.pct_visible), None),
        Err(e @ ArchiveError::QaFailed { score, .. }) => {
            (VersionStatus::Failed, Some(*score), Some(e.to_string()))
        }
        Err(e) => (VersionStatus::Failed, None, Some(e.to_string())),
    };
    if let Err(e) = SnapshotIndex::record_finish(snapshot, status, pct_visible, error).await {
        warn!("Failed to update snapshot index: {e:#}");
    }
}

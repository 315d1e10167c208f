//! Recording state machine and its signal-driven controller

use anyhow::Result;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::ScreenRecorder;
use super::transcode::GifTranscoder;

/// Lifecycle of one recording
///
/// `Idle -> Recording -> Stopped -> Transcoding -> Done | Failed`, with
/// `Stopped -> Done` directly when no GIF is wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Recording,
    Stopped,
    Transcoding,
    Done,
    Failed,
}

/// One recording and the files it produces
pub struct RecordingSession {
    recorder: Box<dyn ScreenRecorder>,
    output: PathBuf,
    gif_output: Option<PathBuf>,
    state: RecordingState,
    started_at: Option<Instant>,
}

impl RecordingSession {
    #[must_use]
    pub fn new(recorder: Box<dyn ScreenRecorder>, output: impl Into<PathBuf>) -> Self {
        Self {
            recorder,
            output: output.into(),
            gif_output: None,
            state: RecordingState::Idle,
            started_at: None,
        }
    }

    /// Also convert the recording into `gif_output` after it stops
    #[must_use]
    pub fn with_gif(mut self, gif_output: impl Into<PathBuf>) -> Self {
        self.gif_output = Some(gif_output.into());
        self
    }

    #[must_use]
    pub fn state(&self) -> RecordingState {
        self.state
    }

    #[must_use]
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Start recording. Returns `false` if the session already left `Idle`.
    pub async fn start(&mut self) -> Result<bool> {
        if self.state != RecordingState::Idle {
            debug!("Recording already in state {:?}, not starting again", self.state);
            return Ok(false);
        }
        match self.recorder.start(&self.output).await {
            Ok(()) => {
                self.state = RecordingState::Recording;
                self.started_at = Some(Instant::now());
                debug!("Started screen recording into {}", self.output.display());
                Ok(true)
            }
            Err(e) => {
                self.state = RecordingState::Failed;
                Err(e)
            }
        }
    }

    /// Stop recording. A no-op returning `false` unless currently recording.
    pub async fn stop(&mut self) -> Result<bool> {
        if self.state != RecordingState::Recording {
            return Ok(false);
        }
        let result = self.recorder.stop().await;
        self.state = match result {
            Ok(()) => RecordingState::Stopped,
            Err(_) => RecordingState::Failed,
        };
        result.map(|()| true)
    }

    /// Convert a stopped recording to GIF if requested
    ///
    /// Never fails: transcoder problems move the session to `Failed` with a
    /// warning. Sessions that are not `Stopped` are returned unchanged.
    pub async fn finalize(&mut self, transcoder: Option<&GifTranscoder>) -> RecordingState {
        if self.state != RecordingState::Stopped {
            return self.state;
        }
        let (Some(gif), Some(transcoder)) = (self.gif_output.clone(), transcoder) else {
            self.state = RecordingState::Done;
            return self.state;
        };

        self.state = RecordingState::Transcoding;
        let duration = self.started_at.map(|t| t.elapsed().as_secs_f64()).unwrap_or_default();
        self.state = match transcoder.transcode(&self.output, &gif).await {
            Ok(()) => {
                info!(
                    "Saved screen-recording GIF ({duration:.1}s recorded) {}",
                    gif.display()
                );
                RecordingState::Done
            }
            Err(e) => {
                warn!("Failed to convert video to GIF: {e:#}");
                RecordingState::Failed
            }
        };
        self.state
    }
}

/// Spawns the task that drives a [`RecordingSession`] through its signals
pub struct RecorderController;

impl RecorderController {
    /// Spawn the driver task
    ///
    /// The driver waits for `setup_finished`, starts recording and reports on
    /// `started`, then stops once `interaction_finished` is sent (or its
    /// sender is dropped) and finalizes.
    #[must_use]
    pub fn spawn(mut session: RecordingSession, transcoder: Option<GifTranscoder>) -> RecorderHandle {
        let (setup_tx, setup_rx) = oneshot::channel::<()>();
        let (started_tx, started_rx) = oneshot::channel::<bool>();
        let (finished_tx, finished_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            if setup_rx.await.is_err() {
                debug!("Page setup never finished, screen recording not started");
                return session.state();
            }

            let started = match session.start().await {
                Ok(started) => started,
                Err(e) => {
                    warn!("Failed to start screen recording: {e:#}");
                    false
                }
            };
            let _ = started_tx.send(started);
            if !started {
                return session.state();
            }

            // A dropped sender means the task is unwinding; stop anyway
            let _ = finished_rx.await;
            if let Err(e) = session.stop().await {
                warn!("Failed to stop screen recording cleanly: {e:#}");
            }
            session.finalize(transcoder.as_ref()).await
        });

        RecorderHandle {
            setup: Some(setup_tx),
            started: Some(started_rx),
            finished: Some(finished_tx),
            task: Some(task),
        }
    }
}

/// Sender side of the recorder lifecycle signals
///
/// Dropping the handle without calling [`RecorderHandle::wait`] aborts the
/// driver task.
pub struct RecorderHandle {
    setup: Option<oneshot::Sender<()>>,
    started: Option<oneshot::Receiver<bool>>,
    finished: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<RecordingState>>,
}

impl RecorderHandle {
    /// Signal that page preparation is complete
    pub fn setup_finished(&mut self) {
        if let Some(tx) = self.setup.take() {
            let _ = tx.send(());
        }
    }

    /// Receiver resolving to whether recording actually started
    ///
    /// Can be taken once.
    pub fn take_started(&mut self) -> Option<oneshot::Receiver<bool>> {
        self.started.take()
    }

    /// Signal that behaviours are over and recording should stop
    pub fn interaction_finished(&mut self) {
        if let Some(tx) = self.finished.take() {
            let _ = tx.send(());
        }
    }

    /// Wait for the driver to finish stopping and finalizing
    pub async fn wait(mut self) -> RecordingState {
        self.setup.take();
        self.interaction_finished();
        let Some(task) = self.task.take() else {
            return RecordingState::Failed;
        };
        match task.await {
            Ok(state) => state,
            Err(e) => {
                warn!("Screen recorder task ended abnormally: {e}");
                RecordingState::Failed
            }
        }
    }
}

impl Drop for RecorderHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

//! Screen recording bound to the page lifecycle
//!
//! A [`RecordingSession`] owns one frame source. The [`RecorderController`]
//! drives it from one-shot lifecycle signals sent by the sequencer and, once
//! stopped, converts the recording to a GIF through [`GifTranscoder`].

pub mod controller;
pub mod screencast;
pub mod transcode;

pub use controller::{RecorderController, RecorderHandle, RecordingSession, RecordingState};
pub use screencast::ChromeScreencastRecorder;
pub use transcode::{GifTranscoder, wait_for_artifact};

use anyhow::Result;
use futures::future::BoxFuture;
use std::path::Path;

/// A frame source that writes a video file
pub trait ScreenRecorder: Send + 'static {
    /// Begin capturing into `output`
    fn start<'a>(&'a mut self, output: &'a Path) -> BoxFuture<'a, Result<()>>;

    /// Stop capturing and flush the video file
    fn stop(&mut self) -> BoxFuture<'_, Result<()>>;
}

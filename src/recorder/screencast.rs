//! Chromium screencast frames piped into an ffmpeg encoder

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::page::{
    EventScreencastFrame, ScreencastFrameAckParams, StartScreencastFormat, StartScreencastParams,
    StopScreencastParams,
};
use futures::StreamExt;
use futures::future::BoxFuture;
use log::{debug, warn};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::ScreenRecorder;
use crate::config::ArchiveConfig;

const JPEG_QUALITY: i64 = 80;

/// How long the encoder gets to flush after its input closes
const ENCODER_EXIT_TIMEOUT: Duration = Duration::from_secs(20);

struct ActiveCapture {
    stop_tx: oneshot::Sender<()>,
    pump: JoinHandle<u64>,
    encoder: Child,
}

/// Records a page by streaming its screencast into ffmpeg
pub struct ChromeScreencastRecorder {
    page: Page,
    ffmpeg: String,
    codec: String,
    duration_limit: Duration,
    active: Option<ActiveCapture>,
}

impl ChromeScreencastRecorder {
    #[must_use]
    pub fn new(page: Page, config: &ArchiveConfig) -> Self {
        Self {
            page,
            ffmpeg: config.ffmpeg_binary(),
            codec: config.screenrecording_codec().to_string(),
            duration_limit: config.screenrecording_duration_limit(),
            active: None,
        }
    }

    fn encoder_command(&self, output: &Path) -> Command {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-y",
            "-f",
            "image2pipe",
            "-use_wallclock_as_timestamps",
            "1",
            "-i",
            "-",
            "-c:v",
            self.codec.as_str(),
            "-preset",
            "ultrafast",
            "-pix_fmt",
            "yuv420p",
            "-vf",
            "pad=ceil(iw/2)*2:ceil(ih/2)*2",
        ])
        .arg(output)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);
        cmd
    }

    async fn start_capture(&mut self, output: &Path) -> Result<()> {
        let mut frames = self
            .page
            .event_listener::<EventScreencastFrame>()
            .await
            .context("Failed to subscribe to screencast frames")?;

        let mut encoder = self
            .encoder_command(output)
            .spawn()
            .with_context(|| format!("Failed to spawn encoder {}", self.ffmpeg))?;
        let mut stdin = encoder.stdin.take().context("Encoder stdin unavailable")?;

        self.page
            .execute(StartScreencastParams {
                format: Some(StartScreencastFormat::Jpeg),
                quality: Some(JPEG_QUALITY),
                max_width: None,
                max_height: None,
                every_nth_frame: Some(1),
            })
            .await
            .context("Failed to start screencast")?;

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let page = self.page.clone();
        let limit = self.duration_limit;
        let pump = tokio::spawn(async move {
            let deadline = tokio::time::sleep(limit);
            tokio::pin!(deadline);
            let mut written = 0u64;
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    () = &mut deadline => {
                        debug!("Screen recording hit its {:.0}s duration limit", limit.as_secs_f64());
                        break;
                    }
                    frame = frames.next() => {
                        let Some(frame) = frame else { break };
                        if let Err(e) = page.execute(ScreencastFrameAckParams::new(frame.session_id)).await {
                            debug!("Failed to ack screencast frame: {e}");
                        }
                        match STANDARD.decode(&frame.data) {
                            Ok(jpeg) => {
                                if stdin.write_all(&jpeg).await.is_err() {
                                    break;
                                }
                                written += 1;
                            }
                            Err(e) => debug!("Skipping undecodable screencast frame: {e}"),
                        }
                    }
                }
            }
            let _ = stdin.shutdown().await;
            written
        });

        self.active = Some(ActiveCapture {
            stop_tx,
            pump,
            encoder,
        });
        Ok(())
    }

    async fn stop_capture(&mut self) -> Result<()> {
        let Some(ActiveCapture {
            stop_tx,
            pump,
            mut encoder,
        }) = self.active.take()
        else {
            return Ok(());
        };

        if let Err(e) = self.page.execute(StopScreencastParams {}).await {
            warn!("Failed to stop screencast: {e}");
        }
        let _ = stop_tx.send(());
        let frames = pump.await.unwrap_or_default();

        match tokio::time::timeout(ENCODER_EXIT_TIMEOUT, encoder.wait()).await {
            Ok(Ok(status)) if status.success() => {
                debug!("Encoded {frames} screencast frames");
                Ok(())
            }
            Ok(Ok(status)) => anyhow::bail!("Encoder exited with {status} after {frames} frames"),
            Ok(Err(e)) => Err(e).context("Failed to wait on encoder"),
            Err(_) => {
                let _ = encoder.kill().await;
                anyhow::bail!(
                    "Encoder did not exit within {:.0}s",
                    ENCODER_EXIT_TIMEOUT.as_secs_f64()
                )
            }
        }
    }
}

impl ScreenRecorder for ChromeScreencastRecorder {
    fn start<'a>(&'a mut self, output: &'a Path) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.start_capture(output))
    }

    fn stop(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.stop_capture())
    }
}

impl Drop for ChromeScreencastRecorder {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.pump.abort();
        }
    }
}

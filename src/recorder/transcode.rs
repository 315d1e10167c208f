//! Detached GIF transcoding through ffmpeg

use anyhow::{Context, Result, bail};
use log::{debug, warn};
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

use crate::config::ArchiveConfig;
use crate::utils::constants::{GIF_MIN_BYTES, GIF_TRANSCODE_TIMEOUT_SECS, GIF_WAIT_TIMEOUT_SECS};

/// Interval between existence checks while waiting for an artifact
const POLL_INTERVAL: Duration = Duration::from_millis(250);

const GIF_FILTER: &str =
    "fps=10,scale=1024:-1:flags=bicubic,split[s0][s1];[s0]palettegen[p];[s1][p]paletteuse";

/// Converts the first seconds of a recording to a looping GIF
///
/// Two-phase contract: [`GifTranscoder::launch`] only spawns the process,
/// completion is observed by polling for the output file.
#[derive(Debug, Clone)]
pub struct GifTranscoder {
    binary: String,
    kill_timeout: Duration,
    wait_timeout: Duration,
    min_bytes: u64,
}

impl GifTranscoder {
    #[must_use]
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            kill_timeout: Duration::from_secs(GIF_TRANSCODE_TIMEOUT_SECS),
            wait_timeout: Duration::from_secs(GIF_WAIT_TIMEOUT_SECS),
            min_bytes: GIF_MIN_BYTES,
        }
    }

    #[must_use]
    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self::new(config.ffmpeg_binary()).with_timeouts(config.gif_transcode_timeout(), config.gif_wait_timeout())
    }

    #[must_use]
    pub fn with_timeouts(mut self, kill_timeout: Duration, wait_timeout: Duration) -> Self {
        self.kill_timeout = kill_timeout;
        self.wait_timeout = wait_timeout;
        self
    }

    #[must_use]
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Arguments converting seconds 3..13 of `input` at 10 fps, 1024 px wide
    #[must_use]
    pub fn gif_args(input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "-hide_banner",
            "-loglevel",
            "error",
            "-ss",
            "3",
            "-t",
            "10",
            "-y",
            "-i",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(input.as_os_str().to_owned());
        args.extend(["-vf", GIF_FILTER, "-loop", "0"].map(OsString::from));
        args.push(output.as_os_str().to_owned());
        args
    }

    /// Spawn the transcoder in the background
    ///
    /// A watchdog task kills it once `kill_timeout` elapses. Returns the pid.
    pub fn launch(&self, input: &Path, output: &Path) -> Result<Option<u32>> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(Self::gif_args(input, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        if let Some(cwd) = input.parent() {
            cmd.current_dir(cwd);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn transcoder {}", self.binary))?;
        let pid = child.id();

        let kill_timeout = self.kill_timeout;
        tokio::spawn(async move {
            match tokio::time::timeout(kill_timeout, child.wait()).await {
                Ok(Ok(status)) if !status.success() => {
                    debug!("Transcoder pid={pid:?} exited with {status}");
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn!("Failed to wait on transcoder pid={pid:?}: {e}"),
                Err(_) => {
                    warn!(
                        "Transcoder pid={pid:?} still running after {:.0}s, killing it",
                        kill_timeout.as_secs_f64()
                    );
                    if let Err(e) = child.kill().await {
                        warn!("Failed to kill transcoder pid={pid:?}: {e}");
                    }
                }
            }
        });

        Ok(pid)
    }

    /// Launch and wait until `output` holds a plausible GIF
    pub async fn transcode(&self, input: &Path, output: &Path) -> Result<()> {
        let pid = self.launch(input, output)?;
        debug!("Launched transcoder pid={pid:?} for {}", output.display());
        wait_for_artifact(output, self.min_bytes, self.wait_timeout).await?;
        Ok(())
    }
}

/// Poll until `path` exists with at least `min_bytes`, returning its size
pub async fn wait_for_artifact(path: &Path, min_bytes: u64, timeout: Duration) -> Result<u64> {
    let started = Instant::now();
    loop {
        if let Ok(meta) = tokio::fs::metadata(path).await {
            if meta.is_file() && meta.len() >= min_bytes {
                return Ok(meta.len());
            }
        }
        if started.elapsed() >= timeout {
            bail!(
                "{} did not reach {min_bytes} bytes within {:.1}s",
                path.display(),
                timeout.as_secs_f64()
            );
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

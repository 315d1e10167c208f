//! External media and gallery downloaders
//!
//! Both run as child processes next to the browser. The preparation unit
//! returns once the process is launched; the download itself is registered
//! on the page state and joined with the wrap-up tasks. A download still
//! running after the configured timeout is killed and reported as failed.

use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};

use crate::archive_engine::page_state::PageState;
use crate::chrome::page::ChromePage;
use crate::snapshot::artifacts::{GALLERY_DIR, MEDIA_DIR};

/// Largest media file yt-dlp is asked to fetch
const MEDIA_MAX_SIZE: &str = "750m";

#[must_use]
pub fn ytdlp_args(url: &str) -> Vec<OsString> {
    let format = format!(
        "--format=(bv*+ba/b)[filesize<={MEDIA_MAX_SIZE}][filesize_approx<=?{MEDIA_MAX_SIZE}]/(bv*+ba/b)"
    );
    let mut args: Vec<OsString> = [
        "--restrict-filenames",
        "--trim-filenames",
        "128",
        "--write-description",
        "--write-info-json",
        "--write-thumbnail",
        "--write-sub",
        "--write-auto-subs",
        "--convert-subs=srt",
        "--yes-playlist",
        "--continue",
        "--no-abort-on-error",
        "--ignore-errors",
        "--geo-bypass",
        "--add-metadata",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(format.into());
    args.push(url.into());
    args
}

#[must_use]
pub fn gallerydl_args(url: &str, dest: &Path) -> Vec<OsString> {
    vec![
        "--quiet".into(),
        "--dest".into(),
        dest.as_os_str().to_owned(),
        url.into(),
    ]
}

fn spawn_download(binary: &str, args: Vec<OsString>, cwd: &Path) -> Result<Child> {
    Command::new(binary)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("Failed to spawn {binary}"))
}

/// Wait for a download to exit, killing it after `timeout`
///
/// A non-zero exit status is an error.
pub async fn wait_for_download(name: &str, mut child: Child, timeout: Duration) -> Result<()> {
    let pid = child.id();
    match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) if status.success() => {
            debug!("{name} pid={pid:?} finished");
            Ok(())
        }
        Ok(Ok(status)) => bail!("{name} exited with {status}"),
        Ok(Err(e)) => Err(e).with_context(|| format!("Failed to wait on {name}")),
        Err(_) => {
            warn!("{name} pid={pid:?} timed out after {}s, killing it", timeout.as_secs());
            if let Err(e) = child.kill().await {
                warn!("Failed to kill {name} pid={pid:?}: {e}");
            }
            bail!("{name} timed out after {}s", timeout.as_secs())
        }
    }
}

/// Launch `binary` and hand its completion to the wrap-up phase
fn start_download(
    state: &PageState,
    name: &'static str,
    binary: &str,
    args: Vec<OsString>,
    cwd: &Path,
    timeout: Duration,
) -> Result<()> {
    let child = spawn_download(binary, args, cwd)?;
    info!("Started {name} download pid={:?} for {}", child.id(), state.original_url);
    state.register_download(name, tokio::spawn(wait_for_download(name, child, timeout)));
    Ok(())
}

async fn prepare_dir(state: &PageState, name: &str) -> Result<std::path::PathBuf> {
    let dir = state.artifact_path(name);
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    Ok(dir)
}

pub async fn save_media(page: &ChromePage, state: &PageState) -> Result<()> {
    let config = page.config();
    if !config.save_media() {
        return Ok(());
    }
    let dir = prepare_dir(state, MEDIA_DIR).await?;
    start_download(
        state,
        "media",
        config.ytdlp_binary(),
        ytdlp_args(&state.original_url),
        &dir,
        config.media_timeout(),
    )
}

pub async fn save_gallery(page: &ChromePage, state: &PageState) -> Result<()> {
    let config = page.config();
    if !config.save_gallery() {
        return Ok(());
    }
    let dir = prepare_dir(state, GALLERY_DIR).await?;
    start_download(
        state,
        "gallery",
        config.gallerydl_binary(),
        gallerydl_args(&state.original_url, &dir),
        &dir,
        config.media_timeout(),
    )
}

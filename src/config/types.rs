//! Core configuration types for page archiving
//!
//! This module contains the main `ArchiveConfig` struct and its associated types
//! that define the configuration parameters for archive workers.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::utils::constants::{
    CHROME_USER_AGENT, DEFAULT_IGNORED_SCHEMES, DEFAULT_MAX_CONCURRENT_TASKS,
    DEFAULT_SCROLL_LIMIT, DEFAULT_TASKS_PER_RUN_LIMIT, DEFAULT_VIEWPORT_HEIGHT,
    DEFAULT_VIEWPORT_WIDTH, GIF_TRANSCODE_TIMEOUT_SECS, GIF_WAIT_TIMEOUT_SECS, MAX_DEDUP_KEY_LEN,
    MEDIA_DOWNLOAD_TIMEOUT_SECS, NAVIGATION_TIMEOUT_SECS, NETWORK_IDLE_MS,
    NETWORK_IDLE_TIMEOUT_SECS, QA_MIN_PCT_VISIBLE, RESPONSE_WAIT_TIMEOUT_SECS,
    SCREENRECORDING_DURATION_LIMIT_SECS,
};

/// A request URL rewrite applied while the page loads.
///
/// `pattern` is a regular expression matched against every request URL; on a
/// match the URL is replaced using `replacement` (with `$1`-style captures).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRewriteRule {
    pub pattern: String,
    pub replacement: String,
}

/// Screen recording settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenRecordingConfig {
    pub(crate) enabled: bool,
    pub(crate) duration_limit_secs: u64,
    pub(crate) save_gif: bool,
    /// Encoder codec for `screenrecording.mp4`
    pub(crate) codec: String,
    /// Transcoder binary. Falls back to `$FFMPEG_BINARY`, then `ffmpeg`.
    pub(crate) ffmpeg_binary: Option<String>,
    pub(crate) transcode_timeout_secs: u64,
    pub(crate) gif_wait_timeout_secs: u64,
}

impl Default for ScreenRecordingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_limit_secs: SCREENRECORDING_DURATION_LIMIT_SECS,
            save_gif: true,
            codec: "libx264".to_string(),
            ffmpeg_binary: None,
            transcode_timeout_secs: GIF_TRANSCODE_TIMEOUT_SECS,
            gif_wait_timeout_secs: GIF_WAIT_TIMEOUT_SECS,
        }
    }
}

/// External media downloader settings (yt-dlp, gallery-dl)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub(crate) save_media: bool,
    pub(crate) save_gallery: bool,
    pub(crate) ytdlp_binary: String,
    pub(crate) gallerydl_binary: String,
    pub(crate) timeout_secs: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            save_media: false,
            save_gallery: false,
            ytdlp_binary: "yt-dlp".to_string(),
            gallerydl_binary: "gallery-dl".to_string(),
            timeout_secs: MEDIA_DOWNLOAD_TIMEOUT_SECS,
        }
    }
}

/// Main configuration struct for archive workers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Root directory under which every snapshot is written.
    pub(crate) storage_dir: PathBuf,
    pub(crate) headless: bool,

    /// Chrome user data directory path for browser profile isolation
    #[serde(skip)]
    pub(crate) chrome_data_dir: Option<PathBuf>,

    pub(crate) viewport_width: u32,
    pub(crate) viewport_height: u32,
    pub(crate) user_agent: String,

    /// Maximum number of tasks one worker process handles before it exits
    /// with `QUOTA_EXCEEDED_EXIT_CODE`.
    ///
    /// Default: 200
    pub(crate) tasks_per_run_limit: usize,

    /// Targets whose scheme is in this list are skipped without archiving.
    pub(crate) ignored_schemes: Vec<String>,

    /// Dedup keys are truncated to this many characters.
    pub(crate) max_dedup_key_len: usize,

    /// Maximum number of archive tasks run concurrently
    /// Default: 1
    pub(crate) max_concurrent_tasks: usize,

    /// Timeout in seconds for the primary navigation.
    ///
    /// Default: 40 seconds
    pub(crate) navigation_timeout_secs: u64,

    /// Timeout in seconds for the fallback wait on the first response event.
    ///
    /// Default: 20 seconds
    pub(crate) response_timeout_secs: u64,

    pub(crate) network_idle_ms: u64,
    pub(crate) network_idle_timeout_secs: u64,

    pub(crate) screen_recording: ScreenRecordingConfig,
    pub(crate) media: MediaConfig,

    /// Minimum visibility percentage for a snapshot to pass the quality gate.
    pub(crate) qa_min_pct_visible: u8,

    pub(crate) url_rewrites: Vec<UrlRewriteRule>,

    /// Pre-compiled `url_rewrites` patterns, same order as `url_rewrites`
    #[serde(skip)]
    pub(crate) url_rewrites_compiled: Vec<regex::Regex>,

    /// JSON file holding an array of cookies injected before navigation.
    pub(crate) cookies_file: Option<PathBuf>,

    /// CSS selectors clicked, in order, during form submission.
    pub(crate) form_submit_selectors: Vec<String>,

    pub(crate) scroll_limit: u32,

    /// Save every response body under `responses/` while the page loads.
    pub(crate) save_responses: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./archive"),
            headless: true,
            chrome_data_dir: None,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            user_agent: CHROME_USER_AGENT.to_string(),
            tasks_per_run_limit: DEFAULT_TASKS_PER_RUN_LIMIT,
            ignored_schemes: DEFAULT_IGNORED_SCHEMES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            max_dedup_key_len: MAX_DEDUP_KEY_LEN,
            max_concurrent_tasks: DEFAULT_MAX_CONCURRENT_TASKS,
            navigation_timeout_secs: NAVIGATION_TIMEOUT_SECS,
            response_timeout_secs: RESPONSE_WAIT_TIMEOUT_SECS,
            network_idle_ms: NETWORK_IDLE_MS,
            network_idle_timeout_secs: NETWORK_IDLE_TIMEOUT_SECS,
            screen_recording: ScreenRecordingConfig::default(),
            media: MediaConfig::default(),
            qa_min_pct_visible: QA_MIN_PCT_VISIBLE,
            url_rewrites: Vec::new(),
            url_rewrites_compiled: Vec::new(),
            cookies_file: None,
            form_submit_selectors: Vec::new(),
            scroll_limit: DEFAULT_SCROLL_LIMIT,
            save_responses: true,
        }
    }
}

impl ArchiveConfig {
    /// Set Chrome user data directory for browser profile isolation
    ///
    /// # Example
    /// ```rust
    /// # use kodegen_tools_pagearchive::config::ArchiveConfig;
    /// # fn main() -> anyhow::Result<()> {
    /// let chrome_dir = std::env::temp_dir().join("chrome_worker_1");
    /// let config = ArchiveConfig::builder()
    ///     .storage_dir("./archive")
    ///     .build()?
    ///     .with_chrome_data_dir(chrome_dir);
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn with_chrome_data_dir(mut self, dir: PathBuf) -> Self {
        self.chrome_data_dir = Some(dir);
        self
    }

    /// Compiled rewrite rules paired with their replacement strings
    pub fn url_rewrites_compiled(&self) -> impl Iterator<Item = (&regex::Regex, &str)> {
        self.url_rewrites_compiled
            .iter()
            .zip(self.url_rewrites.iter().map(|r| r.replacement.as_str()))
    }
}

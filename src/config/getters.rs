//! Getter methods for `ArchiveConfig`
//!
//! This module provides all the accessor methods for retrieving configuration
//! values from an `ArchiveConfig` instance.

use std::path::PathBuf;
use std::time::Duration;

use super::types::{ArchiveConfig, UrlRewriteRule};

impl ArchiveConfig {
    #[must_use]
    pub fn storage_dir(&self) -> &PathBuf {
        &self.storage_dir
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn chrome_data_dir(&self) -> Option<&PathBuf> {
        self.chrome_data_dir.as_ref()
    }

    #[must_use]
    pub fn viewport(&self) -> (u32, u32) {
        (self.viewport_width, self.viewport_height)
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    #[must_use]
    pub fn tasks_per_run_limit(&self) -> usize {
        self.tasks_per_run_limit
    }

    #[must_use]
    pub fn ignored_schemes(&self) -> &[String] {
        &self.ignored_schemes
    }

    #[must_use]
    pub fn max_dedup_key_len(&self) -> usize {
        self.max_dedup_key_len
    }

    #[must_use]
    pub fn max_concurrent_tasks(&self) -> usize {
        self.max_concurrent_tasks
    }

    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    #[must_use]
    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.response_timeout_secs)
    }

    /// Quiet period that counts as network idle
    #[must_use]
    pub fn network_idle_time(&self) -> Duration {
        Duration::from_millis(self.network_idle_ms)
    }

    #[must_use]
    pub fn network_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.network_idle_timeout_secs)
    }

    #[must_use]
    pub fn screen_recording_enabled(&self) -> bool {
        self.screen_recording.enabled
    }

    #[must_use]
    pub fn save_gif(&self) -> bool {
        self.screen_recording.save_gif
    }

    #[must_use]
    pub fn screenrecording_duration_limit(&self) -> Duration {
        Duration::from_secs(self.screen_recording.duration_limit_secs)
    }

    #[must_use]
    pub fn screenrecording_codec(&self) -> &str {
        &self.screen_recording.codec
    }

    /// Resolve the transcoder binary
    ///
    /// Explicit configuration wins, then the `FFMPEG_BINARY` environment
    /// variable, then plain `ffmpeg` from `PATH`.
    #[must_use]
    pub fn ffmpeg_binary(&self) -> String {
        if let Some(ref binary) = self.screen_recording.ffmpeg_binary {
            return binary.clone();
        }
        std::env::var("FFMPEG_BINARY").unwrap_or_else(|_| "ffmpeg".to_string())
    }

    #[must_use]
    pub fn gif_transcode_timeout(&self) -> Duration {
        Duration::from_secs(self.screen_recording.transcode_timeout_secs)
    }

    #[must_use]
    pub fn gif_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.screen_recording.gif_wait_timeout_secs)
    }

    #[must_use]
    pub fn save_media(&self) -> bool {
        self.media.save_media
    }

    #[must_use]
    pub fn save_gallery(&self) -> bool {
        self.media.save_gallery
    }

    #[must_use]
    pub fn ytdlp_binary(&self) -> &str {
        &self.media.ytdlp_binary
    }

    #[must_use]
    pub fn gallerydl_binary(&self) -> &str {
        &self.media.gallerydl_binary
    }

    #[must_use]
    pub fn media_timeout(&self) -> Duration {
        Duration::from_secs(self.media.timeout_secs)
    }

    #[must_use]
    pub fn qa_min_pct_visible(&self) -> u8 {
        self.qa_min_pct_visible
    }

    #[must_use]
    pub fn url_rewrites(&self) -> &[UrlRewriteRule] {
        &self.url_rewrites
    }

    #[must_use]
    pub fn cookies_file(&self) -> Option<&PathBuf> {
        self.cookies_file.as_ref()
    }

    #[must_use]
    pub fn form_submit_selectors(&self) -> &[String] {
        &self.form_submit_selectors
    }

    #[must_use]
    pub fn scroll_limit(&self) -> u32 {
        self.scroll_limit
    }

    #[must_use]
    pub fn save_responses(&self) -> bool {
        self.save_responses
    }
}

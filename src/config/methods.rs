//! Builder methods available for all states
//!
//! This module contains methods that can be called on the builder
//! regardless of its current type state.

use std::path::PathBuf;

use super::builder::ArchiveConfigBuilder;
use super::types::UrlRewriteRule;

impl<State> ArchiveConfigBuilder<State> {
    /// Set browser headless mode
    ///
    /// Headed mode needs a display server and is only useful when watching a
    /// worker archive pages during development.
    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.inner.headless = headless;
        self
    }

    #[must_use]
    pub fn chrome_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.inner.chrome_data_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.inner.viewport_width = width;
        self.inner.viewport_height = height;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.inner.user_agent = user_agent.into();
        self
    }

    /// Set the number of tasks after which the worker process exits
    ///
    /// # Example
    /// ```rust
    /// # use kodegen_tools_pagearchive::config::ArchiveConfig;
    /// # fn main() -> anyhow::Result<()> {
    /// let config = ArchiveConfig::builder()
    ///     .storage_dir("./archive")
    ///     .tasks_per_run_limit(50)
    ///     .build()?;
    /// assert_eq!(config.tasks_per_run_limit(), 50);
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn tasks_per_run_limit(mut self, limit: usize) -> Self {
        self.inner.tasks_per_run_limit = limit;
        self
    }

    #[must_use]
    pub fn ignored_schemes(mut self, schemes: Vec<String>) -> Self {
        self.inner.ignored_schemes = schemes;
        self
    }

    #[must_use]
    pub fn max_dedup_key_len(mut self, len: usize) -> Self {
        self.inner.max_dedup_key_len = len;
        self
    }

    #[must_use]
    pub fn max_concurrent_tasks(mut self, tasks: usize) -> Self {
        self.inner.max_concurrent_tasks = tasks;
        self
    }

    #[must_use]
    pub fn navigation_timeout_secs(mut self, secs: u64) -> Self {
        self.inner.navigation_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn response_timeout_secs(mut self, secs: u64) -> Self {
        self.inner.response_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn network_idle(mut self, idle_ms: u64, timeout_secs: u64) -> Self {
        self.inner.network_idle_ms = idle_ms;
        self.inner.network_idle_timeout_secs = timeout_secs;
        self
    }

    #[must_use]
    pub fn screen_recording(mut self, enabled: bool) -> Self {
        self.inner.screen_recording.enabled = enabled;
        self
    }

    #[must_use]
    pub fn save_gif(mut self, save: bool) -> Self {
        self.inner.screen_recording.save_gif = save;
        self
    }

    #[must_use]
    pub fn screenrecording_duration_limit_secs(mut self, secs: u64) -> Self {
        self.inner.screen_recording.duration_limit_secs = secs;
        self
    }

    #[must_use]
    pub fn screenrecording_codec(mut self, codec: impl Into<String>) -> Self {
        self.inner.screen_recording.codec = codec.into();
        self
    }

    #[must_use]
    pub fn ffmpeg_binary(mut self, binary: impl Into<String>) -> Self {
        self.inner.screen_recording.ffmpeg_binary = Some(binary.into());
        self
    }

    #[must_use]
    pub fn gif_timeouts(mut self, transcode_secs: u64, wait_secs: u64) -> Self {
        self.inner.screen_recording.transcode_timeout_secs = transcode_secs;
        self.inner.screen_recording.gif_wait_timeout_secs = wait_secs;
        self
    }

    #[must_use]
    pub fn save_media(mut self, save: bool) -> Self {
        self.inner.media.save_media = save;
        self
    }

    #[must_use]
    pub fn save_gallery(mut self, save: bool) -> Self {
        self.inner.media.save_gallery = save;
        self
    }

    #[must_use]
    pub fn ytdlp_binary(mut self, binary: impl Into<String>) -> Self {
        self.inner.media.ytdlp_binary = binary.into();
        self
    }

    #[must_use]
    pub fn gallerydl_binary(mut self, binary: impl Into<String>) -> Self {
        self.inner.media.gallerydl_binary = binary.into();
        self
    }

    #[must_use]
    pub fn qa_min_pct_visible(mut self, pct: u8) -> Self {
        self.inner.qa_min_pct_visible = pct;
        self
    }

    /// Add a request URL rewrite rule
    ///
    /// Patterns are compiled in `build()`; an invalid pattern fails the build.
    #[must_use]
    pub fn url_rewrite(mut self, pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.inner.url_rewrites.push(UrlRewriteRule {
            pattern: pattern.into(),
            replacement: replacement.into(),
        });
        self
    }

    #[must_use]
    pub fn cookies_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.inner.cookies_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn form_submit_selectors(mut self, selectors: Vec<String>) -> Self {
        self.inner.form_submit_selectors = selectors;
        self
    }

    #[must_use]
    pub fn scroll_limit(mut self, steps: u32) -> Self {
        self.inner.scroll_limit = steps;
        self
    }

    #[must_use]
    pub fn save_responses(mut self, save: bool) -> Self {
        self.inner.save_responses = save;
        self
    }
}

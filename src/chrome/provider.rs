//! Opens tabs on a shared browser

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use futures::future::BoxFuture;
use std::sync::Arc;

use super::page::ChromePage;
use crate::archive_engine::session::SessionProvider;
use crate::config::ArchiveConfig;
use crate::recorder::{ChromeScreencastRecorder, ScreenRecorder};

/// Session provider backed by one long-lived Chromium process
pub struct ChromeSessionProvider {
    browser: Arc<Browser>,
    config: Arc<ArchiveConfig>,
}

impl ChromeSessionProvider {
    #[must_use]
    pub fn new(browser: Arc<Browser>, config: Arc<ArchiveConfig>) -> Self {
        Self { browser, config }
    }

    /// Take the browser back for shutdown; `None` while pages still share it
    #[must_use]
    pub fn into_browser(self) -> Option<Browser> {
        Arc::try_unwrap(self.browser).ok()
    }

    async fn new_tab(&self) -> Result<ChromePage> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("Failed to open browser tab")?;

        let (width, height) = self.config.viewport();
        page.execute(
            SetDeviceMetricsOverrideParams::builder()
                .width(i64::from(width))
                .height(i64::from(height))
                .device_scale_factor(1.0)
                .mobile(false)
                .build()
                .map_err(anyhow::Error::msg)?,
        )
        .await
        .context("Failed to set viewport")?;

        Ok(ChromePage::new(page, Arc::clone(&self.config)))
    }

    async fn version(&self) -> Result<String> {
        let version = self
            .browser
            .version()
            .await
            .context("Failed to query browser version")?;
        Ok(version.product)
    }
}

impl SessionProvider for ChromeSessionProvider {
    type Page = ChromePage;

    fn open_page(&self) -> BoxFuture<'_, Result<ChromePage>> {
        Box::pin(self.new_tab())
    }

    fn browser_version(&self) -> BoxFuture<'_, Result<String>> {
        Box::pin(self.version())
    }

    fn screen_recorder(&self, page: &ChromePage) -> Option<Box<dyn ScreenRecorder>> {
        if !self.config.screen_recording_enabled() {
            return None;
        }
        Some(Box::new(ChromeScreencastRecorder::new(
            page.inner().clone(),
            &self.config,
        )))
    }
}

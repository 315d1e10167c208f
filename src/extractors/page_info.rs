//! Title, SEO metadata, favicon and TLS details

use anyhow::{Context, Result, bail};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use super::scripts::{FAVICON_SCRIPT, SEO_SCRIPT, TITLE_SCRIPT};
use crate::archive_engine::page_state::PageState;
use crate::chrome::page::ChromePage;
use crate::snapshot::{artifacts, write_json, write_text};

const FAVICON_TIMEOUT: Duration = Duration::from_secs(15);
/// Icons larger than this are not favicons
const FAVICON_MAX_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeoInfo {
    pub meta: BTreeMap<String, String>,
    pub canonical_url: Option<String>,
    pub language: Option<String>,
}

pub async fn save_title(page: &ChromePage, state: &PageState) -> Result<()> {
    let title: String = page.eval(TITLE_SCRIPT).await?;
    let title = title.trim();
    if title.is_empty() {
        bail!("Page has no title");
    }
    write_text(&state.artifact_path(artifacts::TITLE), title).await
}

pub async fn save_seo(page: &ChromePage, state: &PageState) -> Result<()> {
    let seo: SeoInfo = page.eval(SEO_SCRIPT).await?;
    write_json(&state.artifact_path(artifacts::SEO), &seo).await
}

pub async fn save_favicon(page: &ChromePage, state: &PageState) -> Result<()> {
    let url: String = page.eval(FAVICON_SCRIPT).await?;
    let client = Client::new();
    let response = client
        .get(&url)
        .timeout(FAVICON_TIMEOUT)
        .header("User-Agent", page.config().user_agent())
        .header("Accept", "image/avif,image/webp,image/apng,image/*,*/*;q=0.8")
        .send()
        .await
        .with_context(|| format!("Failed to fetch favicon {url}"))?;
    if !response.status().is_success() {
        bail!("Favicon download failed with status: {}", response.status());
    }
    let bytes = response.bytes().await.context("Failed to read favicon body")?;
    if bytes.is_empty() || bytes.len() > FAVICON_MAX_BYTES {
        bail!("Favicon at {url} has implausible size {} bytes", bytes.len());
    }
    let path = state.artifact_path(artifacts::FAVICON);
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// TLS details of the main response
pub async fn save_ssl(_page: &ChromePage, state: &PageState) -> Result<()> {
    let response = state
        .main_response()
        .context("No main response recorded")?;
    let tls = response
        .tls
        .with_context(|| format!("{} was not served over TLS", response.url))?;
    write_json(&state.artifact_path(artifacts::SSL), &tls).await
}

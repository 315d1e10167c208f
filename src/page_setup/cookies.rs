//! Authentication cookie injection

use anyhow::{Context, Result, bail};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use log::{debug, info, warn};
use std::path::Path;

use crate::archive_engine::page_state::PageState;
use crate::chrome::page::ChromePage;

/// Parse a cookies file: a JSON array of CDP cookie objects
///
/// Cookies without a `domain` or `url` cannot be set on a blank tab and are
/// dropped with a warning.
pub fn parse_cookies(json: &str) -> Result<Vec<CookieParam>> {
    let cookies: Vec<CookieParam> = serde_json::from_str(json).context("Malformed cookies file")?;
    let total = cookies.len();
    let usable: Vec<CookieParam> = cookies
        .into_iter()
        .filter(|c| c.domain.is_some() || c.url.is_some())
        .collect();
    if usable.len() < total {
        warn!(
            "Ignoring {} cookies without a domain or url",
            total - usable.len()
        );
    }
    Ok(usable)
}

async fn read_cookies(path: &Path) -> Result<Vec<CookieParam>> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read cookies file {}", path.display()))?;
    parse_cookies(&json)
}

/// Load the configured cookies into the browser before navigation
pub async fn load_auth_cookies(page: &ChromePage, _state: &PageState) -> Result<()> {
    let Some(path) = page.config().cookies_file() else {
        debug!("No cookies file configured");
        return Ok(());
    };
    let cookies = read_cookies(path).await?;
    if cookies.is_empty() {
        bail!("Cookies file {} holds no usable cookies", path.display());
    }

    let count = cookies.len();
    page.inner()
        .set_cookies(cookies)
        .await
        .context("Failed to set cookies")?;
    info!("Loaded {count} cookies from {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookies_need_a_domain_or_url() {
        let json = r#"[
            {"name": "cf_clearance", "value": "abc", "domain": ".example.com", "path": "/"},
            {"name": "session", "value": "xyz", "url": "https://example.org/"},
            {"name": "orphan", "value": "1"}
        ]"#;
        let cookies = parse_cookies(json).expect("parse");
        let names: Vec<&str> = cookies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["cf_clearance", "session"]);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(parse_cookies("{not json").is_err());
    }
}

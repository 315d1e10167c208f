//! Waits out interstitial captcha challenges

use anyhow::{Result, bail};
use log::{info, warn};
use std::time::{Duration, Instant};

use crate::archive_engine::page_state::PageState;
use crate::chrome::page::ChromePage;

const CAPTCHA_WAIT: Duration = Duration::from_secs(20);
const POLL_INTERVAL: Duration = Duration::from_millis(500);

const CAPTCHA_PROBE_SCRIPT: &str = r#"
    (() => {
        const frames = Array.from(document.querySelectorAll('iframe'))
            .map(f => f.src || '');
        const markers = ['recaptcha', 'hcaptcha', 'challenges.cloudflare.com', 'turnstile'];
        const framed = frames.some(src => markers.some(m => src.includes(m)));
        const inline = document.querySelector(
            '.g-recaptcha, .h-captcha, .cf-turnstile, #challenge-form, #cf-challenge-running'
        ) !== null;
        return framed || inline;
    })()
"#;

async fn captcha_present(page: &ChromePage) -> Result<bool> {
    page.eval(CAPTCHA_PROBE_SCRIPT).await
}

/// Give an auto-solving challenge a bounded window to clear itself
///
/// Pages without a challenge return immediately. A challenge still showing
/// after the wait is reported as an error so it appears in the phase log.
pub async fn solve_captchas(page: &ChromePage, state: &PageState) -> Result<()> {
    if !captcha_present(page).await? {
        return Ok(());
    }
    info!("Captcha detected on {}, waiting up to {}s", state.original_url, CAPTCHA_WAIT.as_secs());

    let started = Instant::now();
    while started.elapsed() < CAPTCHA_WAIT {
        tokio::time::sleep(POLL_INTERVAL).await;
        match captcha_present(page).await {
            Ok(false) => {
                info!("Captcha cleared after {:.1}s", started.elapsed().as_secs_f64());
                return Ok(());
            }
            Ok(true) => {}
            Err(e) => warn!("Captcha probe failed: {e}"),
        }
    }
    bail!("Captcha still present after {}s", CAPTCHA_WAIT.as_secs())
}

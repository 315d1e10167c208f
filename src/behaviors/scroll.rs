//! Scroll-through to trigger lazy-loaded content

use anyhow::Result;
use log::debug;
use serde::Deserialize;
use std::time::Duration;

use crate::archive_engine::page_state::PageState;
use crate::chrome::page::ChromePage;

const SCROLL_DELAY: Duration = Duration::from_millis(400);

const SCROLL_STEP_SCRIPT: &str = r#"
    (() => {
        window.scrollBy(0, window.innerHeight);
        return {
            scroll_y: window.scrollY,
            inner_height: window.innerHeight,
            scroll_height: document.documentElement.scrollHeight
        };
    })()
"#;

const SCROLL_TOP_SCRIPT: &str = "(() => { window.scrollTo(0, 0); return true; })()";

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScrollPosition {
    pub scroll_y: f64,
    pub inner_height: f64,
    pub scroll_height: f64,
}

impl ScrollPosition {
    /// Within a few pixels of the end of the document
    #[must_use]
    pub fn reached_bottom(&self) -> bool {
        self.scroll_y + self.inner_height >= self.scroll_height - 4.0
    }
}

pub async fn scroll_down(page: &ChromePage, _state: &PageState) -> Result<()> {
    let limit = page.config().scroll_limit();
    let mut steps = 0;
    while steps < limit {
        let position: ScrollPosition = page.eval(SCROLL_STEP_SCRIPT).await?;
        steps += 1;
        tokio::time::sleep(SCROLL_DELAY).await;
        if position.reached_bottom() {
            break;
        }
    }
    debug!("Scrolled {steps} steps");
    let _: bool = page.eval(SCROLL_TOP_SCRIPT).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bottom_detection() {
        let middle = ScrollPosition {
            scroll_y: 1000.0,
            inner_height: 2000.0,
            scroll_height: 8000.0,
        };
        assert!(!middle.reached_bottom());

        let end = ScrollPosition {
            scroll_y: 5998.0,
            inner_height: 2000.0,
            scroll_height: 8000.0,
        };
        assert!(end.reached_bottom());
    }
}

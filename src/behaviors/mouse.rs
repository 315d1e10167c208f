use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::input::{DispatchMouseEventParams, DispatchMouseEventType};
use std::time::Duration;

use crate::archive_engine::page_state::PageState;
use crate::chrome::page::ChromePage;

const JIGGLE_STEPS: u32 = 12;

/// Points along a loose zig-zag across the viewport
#[must_use]
pub fn jiggle_path(width: u32, height: u32, steps: u32) -> Vec<(f64, f64)> {
    let (w, h) = (f64::from(width), f64::from(height.min(1000)));
    (0..steps)
        .map(|i| {
            let t = f64::from(i) / f64::from(steps.max(1));
            let y = if i % 2 == 0 { 0.3 } else { 0.6 };
            (w * (0.1 + 0.8 * t), h * y)
        })
        .collect()
}

/// Move the pointer around so hover-triggered content loads
pub async fn jiggle_mouse(page: &ChromePage, _state: &PageState) -> Result<()> {
    let (width, height) = page.config().viewport();
    for (x, y) in jiggle_path(width, height, JIGGLE_STEPS) {
        let event = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseMoved)
            .x(x)
            .y(y)
            .build()
            .map_err(anyhow::Error::msg)?;
        page.inner()
            .execute(event)
            .await
            .context("Failed to dispatch mouse move")?;
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_stays_inside_viewport() {
        let path = jiggle_path(1440, 2000, JIGGLE_STEPS);
        assert_eq!(path.len(), JIGGLE_STEPS as usize);
        for (x, y) in path {
            assert!((0.0..1440.0).contains(&x));
            assert!((0.0..1000.0).contains(&y));
        }
    }
}

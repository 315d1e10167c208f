//! Default unit lists for Chromium pages

use futures::FutureExt;

use super::page::ChromePage;
use crate::archive_engine::unit::{Pipeline, UnitList, unit};
use crate::{behaviors, extractors, page_setup};

/// Build a unit list from `name => async fn(&ChromePage, &PageState)` pairs
macro_rules! units {
    ($($name:literal => $f:path),* $(,)?) => {
        vec![$(unit::<ChromePage, _>($name, |page, state| $f(page, state).boxed())),*]
    };
}

fn preparation() -> UnitList<ChromePage> {
    units![
        "metadata_recording" => page_setup::start_metadata_recording,
        "url_rewriting" => page_setup::setup_url_rewriting,
        "modal_auto_closing" => page_setup::setup_modal_auto_closing,
        "auth_cookies" => page_setup::load_auth_cookies,
        "response_saving" => page_setup::start_response_saving,
        "media" => page_setup::save_media,
        "gallery" => page_setup::save_gallery,
    ]
}

fn behavior_units() -> UnitList<ChromePage> {
    units![
        "jiggle_mouse" => behaviors::jiggle_mouse,
        "solve_captchas" => behaviors::solve_captchas,
        "block_redirects" => behaviors::block_redirects,
        "scroll_down" => behaviors::scroll_down,
        "submit_form" => behaviors::submit_form,
    ]
}

fn extraction() -> UnitList<ChromePage> {
    units![
        "title" => extractors::save_title,
        "seo" => extractors::save_seo,
        "favicon" => extractors::save_favicon,
        "ssl" => extractors::save_ssl,
        "requests" => extractors::save_requests,
        "redirects" => extractors::save_redirects,
        "headers" => extractors::save_headers,
        "raw" => extractors::save_raw,
        "dom" => extractors::save_dom,
        "body_text" => extractors::save_body_text,
        "readability" => extractors::save_readability,
        "accessibility" => extractors::save_accessibility,
        "outlinks" => extractors::save_outlinks,
        "console" => extractors::save_console,
        "qa" => extractors::save_qa_score,
    ]
}

/// Every unit the Chromium worker runs, grouped by phase
#[must_use]
pub fn default_pipeline() -> Pipeline<ChromePage> {
    Pipeline {
        preparation: preparation(),
        behaviors: behavior_units(),
        freeze: units!["url_rewriting_stop" => page_setup::stop_url_rewriting],
        capture: units![
            "screenshot" => extractors::save_screenshot,
            "pdf" => extractors::save_pdf,
            "shadow_dom" => extractors::inline_shadow_dom,
        ],
        extraction: extraction(),
        background: units!["single_file" => extractors::save_single_file],
    }
}

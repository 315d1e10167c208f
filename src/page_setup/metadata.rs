//! Console, traffic and redirect recording
//!
//! Each listener runs as its own task appending to the page's capture
//! buffers until the sequencer freezes metadata.

use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent, EventResponseReceived,
};
use chromiumoxide::cdp::js_protocol::runtime::{EventConsoleApiCalled, RemoteObject};
use futures::StreamExt;

use crate::archive_engine::page_state::{ConsoleEntry, PageState, RedirectHop};
use crate::chrome::page::{ChromePage, headers_map, response_info};

/// Text shown for one console argument
fn console_arg_text(arg: &RemoteObject) -> String {
    match (&arg.value, &arg.description) {
        (Some(serde_json::Value::String(s)), _) => s.clone(),
        (Some(value), _) => value.to_string(),
        (None, Some(description)) => description.clone(),
        (None, None) => format!("{:?}", arg.r#type).to_lowercase(),
    }
}

pub async fn start_metadata_recording(page: &ChromePage, state: &PageState) -> Result<()> {
    let page = page.inner();
    let buffers = state.buffers();

    let mut console = page
        .event_listener::<EventConsoleApiCalled>()
        .await
        .context("Failed to subscribe to console")?;
    let sink = buffers.clone();
    state.register_recording_task(tokio::spawn(async move {
        while let Some(event) = console.next().await {
            let text = event.args.iter().map(console_arg_text).collect::<Vec<_>>().join(" ");
            sink.push_console(ConsoleEntry {
                level: format!("{:?}", event.r#type).to_lowercase(),
                text,
                timestamp: *event.timestamp.inner(),
            });
        }
    }));

    let mut requests = page
        .event_listener::<EventRequestWillBeSent>()
        .await
        .context("Failed to subscribe to requests")?;
    let sink = buffers.clone();
    state.register_recording_task(tokio::spawn(async move {
        while let Some(event) = requests.next().await {
            if let Some(ref redirect) = event.redirect_response {
                sink.push_redirect(RedirectHop {
                    from: redirect.url.clone(),
                    to: event.request.url.clone(),
                    status: u16::try_from(redirect.status).unwrap_or_default(),
                });
            }
            sink.record_traffic(event.request_id.inner(), |record| {
                record.url = event.request.url.clone();
                record.method = event.request.method.clone();
                record.request_headers = headers_map(&event.request.headers);
                record.resource_type = event.r#type.as_ref().map(|t| format!("{t:?}"));
            });
        }
    }));

    let mut responses = page
        .event_listener::<EventResponseReceived>()
        .await
        .context("Failed to subscribe to responses")?;
    let sink = buffers.clone();
    state.register_recording_task(tokio::spawn(async move {
        while let Some(event) = responses.next().await {
            sink.record_traffic(event.request_id.inner(), |record| {
                if record.url.is_empty() {
                    record.url = event.response.url.clone();
                }
                record.response = Some(response_info(&event.response));
            });
        }
    }));

    let mut finished = page
        .event_listener::<EventLoadingFinished>()
        .await
        .context("Failed to subscribe to finished loads")?;
    let sink = buffers.clone();
    state.register_recording_task(tokio::spawn(async move {
        while let Some(event) = finished.next().await {
            sink.record_traffic(event.request_id.inner(), |record| {
                record.encoded_length = Some(event.encoded_data_length);
            });
        }
    }));

    let mut failed = page
        .event_listener::<EventLoadingFailed>()
        .await
        .context("Failed to subscribe to failed loads")?;
    let sink = buffers;
    state.register_recording_task(tokio::spawn(async move {
        while let Some(event) = failed.next().await {
            sink.record_traffic(event.request_id.inner(), |record| {
                record.failure = Some(event.error_text.clone());
            });
        }
    }));

    log::debug!("Recording console, traffic and redirects for {}", state.original_url);
    Ok(())
}

//! Network-idle detection from CDP request lifecycle events

use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use futures::StreamExt;
use futures::stream;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::archive_engine::page_state::CaptureBuffers;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestEvent {
    Started(String),
    Settled(String),
}

/// Set of requests currently in flight
#[derive(Debug, Default)]
pub struct InFlightRequests {
    pending: HashSet<String>,
}

impl InFlightRequests {
    /// Tracker that already counts `ids` as in flight
    #[must_use]
    pub fn seeded(ids: impl IntoIterator<Item = String>) -> Self {
        Self {
            pending: ids.into_iter().collect(),
        }
    }

    pub fn apply(&mut self, event: RequestEvent) {
        match event {
            RequestEvent::Started(id) => {
                self.pending.insert(id);
            }
            RequestEvent::Settled(id) => {
                self.pending.remove(&id);
            }
        }
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Resolve once no request has been in flight for `idle_time`
///
/// Requests that started before the call are taken from the traffic log once
/// the subscriptions are live, so a load finishing in between still settles
/// them. Has no deadline of its own; callers bound it with a timeout.
pub async fn wait_for_network_idle(
    page: &Page,
    idle_time: Duration,
    traffic: Arc<CaptureBuffers>,
) -> Result<()> {
    let started = page
        .event_listener::<EventRequestWillBeSent>()
        .await
        .context("Failed to subscribe to requests")?
        .map(|e| RequestEvent::Started(e.request_id.inner().clone()));
    let finished = page
        .event_listener::<EventLoadingFinished>()
        .await
        .context("Failed to subscribe to finished loads")?
        .map(|e| RequestEvent::Settled(e.request_id.inner().clone()));
    let failed = page
        .event_listener::<EventLoadingFailed>()
        .await
        .context("Failed to subscribe to failed loads")?
        .map(|e| RequestEvent::Settled(e.request_id.inner().clone()));

    let mut events = stream::select(started, stream::select(finished, failed));
    let mut in_flight = InFlightRequests::seeded(traffic.pending_request_ids());

    loop {
        match tokio::time::timeout(idle_time, events.next()).await {
            Err(_) if in_flight.is_idle() => return Ok(()),
            Err(_) => continue,
            Ok(Some(event)) => in_flight.apply(event),
            Ok(None) => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_only_after_every_started_request_settles() {
        let mut tracker = InFlightRequests::default();
        assert!(tracker.is_idle());

        tracker.apply(RequestEvent::Started("1".into()));
        tracker.apply(RequestEvent::Started("2".into()));
        tracker.apply(RequestEvent::Settled("1".into()));
        assert!(!tracker.is_idle());

        tracker.apply(RequestEvent::Settled("2".into()));
        assert!(tracker.is_idle());
    }

    #[test]
    fn seeded_requests_keep_the_page_busy_until_they_settle() {
        let mut tracker = InFlightRequests::seeded(["main-document".to_string()]);
        assert!(!tracker.is_idle());

        tracker.apply(RequestEvent::Started("xhr".into()));
        tracker.apply(RequestEvent::Settled("xhr".into()));
        assert!(!tracker.is_idle());

        tracker.apply(RequestEvent::Settled("main-document".into()));
        assert!(tracker.is_idle());
    }

    #[test]
    fn settling_an_untracked_request_is_harmless() {
        let mut tracker = InFlightRequests::default();
        tracker.apply(RequestEvent::Settled("early".into()));
        assert!(tracker.is_idle());
    }
}

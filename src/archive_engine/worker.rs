//! Worker driver: runs a queue of targets with bounded concurrency
//!
//! Coordinates:
//! - Concurrent task execution bounded by a semaphore
//! - Per-task verdict reporting
//! - Immediate shutdown when the per-process quota is exhausted

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use log::{debug, error, info, warn};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::archive_types::{ArchiveError, ArchiveResult, TaskOutcome};
use super::sequencer::Sequencer;
use super::session::SessionProvider;

/// Tally of task results for one worker run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub archived: usize,
    pub skipped: usize,
    pub failed: usize,
    pub rate_limited: usize,
}

impl WorkerReport {
    fn record(&mut self, url: &str, result: &ArchiveResult<TaskOutcome>) {
        match result {
            Ok(TaskOutcome::Archived(qa)) => {
                self.archived += 1;
                info!("Archived {url} (QA {}%)", qa.pct_visible);
            }
            Ok(TaskOutcome::Skipped) => {
                self.skipped += 1;
                debug!("Skipped {url}");
            }
            Err(ArchiveError::RateLimited { .. }) => {
                self.rate_limited += 1;
                warn!("Rate limited while archiving {url}, will retry on a later run");
            }
            Err(e) => {
                self.failed += 1;
                warn!("Failed to archive {url}: {e}");
            }
        }
    }
}

/// Feeds targets to a [`Sequencer`]
pub struct ArchiveWorker<S: SessionProvider> {
    sequencer: Sequencer<S>,
}

impl<S: SessionProvider> ArchiveWorker<S> {
    #[must_use]
    pub fn new(sequencer: Sequencer<S>) -> Self {
        Self { sequencer }
    }

    /// Archive every target
    ///
    /// Returns `Err(QuotaExceeded)` as soon as any task hits the per-process
    /// ceiling; outstanding tasks are aborted rather than awaited.
    pub async fn run(&self, targets: impl IntoIterator<Item = String>) -> ArchiveResult<WorkerReport> {
        let mut queue: VecDeque<String> = targets.into_iter().collect();
        let concurrency = self.sequencer.config().max_concurrent_tasks().max(1);
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut active_tasks = FuturesUnordered::new();
        let mut report = WorkerReport::default();

        info!(
            "Archiving {} targets with up to {concurrency} concurrent tasks",
            queue.len()
        );

        loop {
            while active_tasks.len() < concurrency {
                let Some(url) = queue.pop_front() else {
                    break;
                };

                let permit = if let Ok(p) = Arc::clone(&semaphore).acquire_owned().await {
                    p
                } else {
                    error!("Semaphore closed unexpectedly");
                    break;
                };

                let sequencer = self.sequencer.clone();
                active_tasks.push(tokio::spawn(async move {
                    let _permit = permit;
                    let result = sequencer.run(&url).await;
                    (url, result)
                }));
            }

            match active_tasks.next().await {
                Some(Ok((url, result))) => {
                    if let Err(ArchiveError::QuotaExceeded { processed, limit }) = result {
                        for task in active_tasks.iter() {
                            task.abort();
                        }
                        warn!(
                            "Hit maximum URLs archived per browser session ({processed}/{limit}), exiting to free memory"
                        );
                        warn!("Run this process again to continue with the next batch...");
                        info!(
                            "Before exiting: {} archived, {} skipped, {} failed, {} rate limited",
                            report.archived, report.skipped, report.failed, report.rate_limited
                        );
                        return Err(ArchiveError::QuotaExceeded { processed, limit });
                    }
                    report.record(&url, &result);
                }
                Some(Err(e)) => {
                    report.failed += 1;
                    error!("Archive task panicked: {e}");
                }
                None => break,
            }
        }

        info!(
            "Worker finished: {} archived, {} skipped, {} failed, {} rate limited",
            report.archived, report.skipped, report.failed, report.rate_limited
        );
        Ok(report)
    }
}

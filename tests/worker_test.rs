//! Worker driver over a queue of targets

use kodegen_tools_pagearchive::archive_engine::{ArchiveError, ArchiveWorker, Pipeline, WorkerReport};
use std::sync::atomic::Ordering;

mod common;
use common::*;

fn passing_pipeline() -> Pipeline<MockPage> {
    Pipeline {
        extraction: vec![qa_unit(90.0)],
        ..Pipeline::default()
    }
}

fn targets(urls: &[&str]) -> Vec<String> {
    urls.iter().map(|u| (*u).to_string()).collect()
}

#[tokio::test]
async fn tallies_archived_and_skipped_targets() {
    let harness = Harness::new(MockProvider::new(200), passing_pipeline());
    let worker = ArchiveWorker::new(harness.sequencer.clone());

    let report = worker
        .run(targets(&[
            "https://example.com/a",
            "https://example.com/b",
            "https://example.com/a",
            "about:blank",
        ]))
        .await
        .unwrap();

    assert_eq!(
        report,
        WorkerReport {
            archived: 2,
            skipped: 2,
            failed: 0,
            rate_limited: 0,
        }
    );
    assert_eq!(harness.calls().pages_opened.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn rate_limited_and_failed_tasks_are_counted_separately() {
    let limited = Harness::new(MockProvider::new(429), passing_pipeline());
    let report = ArchiveWorker::new(limited.sequencer.clone())
        .run(targets(&["https://example.com/a", "https://example.com/b"]))
        .await
        .unwrap();
    assert_eq!(report.rate_limited, 2);
    assert_eq!(report.archived, 0);

    let failing = Harness::new(
        MockProvider::new(200),
        Pipeline {
            extraction: vec![qa_unit(10.0)],
            ..Pipeline::default()
        },
    );
    let report = ArchiveWorker::new(failing.sequencer.clone())
        .run(targets(&["https://example.com/a"]))
        .await
        .unwrap();
    assert_eq!(report.failed, 1);
}

#[tokio::test]
async fn quota_stops_the_worker() {
    let harness = Harness::with_limit(MockProvider::new(200), passing_pipeline(), 1);
    let worker = ArchiveWorker::new(harness.sequencer.clone());

    let err = worker
        .run(targets(&[
            "https://example.com/a",
            "https://example.com/b",
            "https://example.com/c",
        ]))
        .await
        .unwrap_err();

    assert!(matches!(err, ArchiveError::QuotaExceeded { limit: 1, .. }));
    assert_eq!(err.exit_code(), Some(21));
    assert_eq!(harness.calls().pages_opened.load(Ordering::SeqCst), 1);
}

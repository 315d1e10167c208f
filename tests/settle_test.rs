//! Settle-all batches: every unit runs, failures are collected

use futures::FutureExt;
use futures::future::BoxFuture;
use kodegen_tools_pagearchive::archive_engine::{PhaseMetrics, UnitOutcome, settle_all};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

type Batch = Vec<(&'static str, BoxFuture<'static, anyhow::Result<()>>)>;

async fn explode() -> anyhow::Result<()> {
    panic!("boom")
}

fn succeed() -> BoxFuture<'static, anyhow::Result<()>> {
    async { Ok(()) }.boxed()
}

fn fail(reason: &'static str) -> BoxFuture<'static, anyhow::Result<()>> {
    async move { Err(anyhow::anyhow!(reason)) }.boxed()
}

#[tokio::test]
async fn one_failure_leaves_the_rest_fulfilled() {
    let ran = Arc::new(AtomicUsize::new(0));
    let names = ["title", "seo", "favicon", "ssl", "dom"];

    let batch: Batch = names
        .iter()
        .map(|&name| {
            let ran = Arc::clone(&ran);
            let fut = async move {
                ran.fetch_add(1, Ordering::SeqCst);
                if name == "favicon" {
                    anyhow::bail!("no favicon");
                }
                Ok(())
            }
            .boxed();
            (name, fut)
        })
        .collect();

    let result = settle_all("archiving", batch).await;

    assert_eq!(ran.load(Ordering::SeqCst), names.len());
    assert_eq!(result.fulfilled_count(), 4);
    assert_eq!(result.rejected_count(), 1);
    assert_eq!(result.rejected(), vec![("favicon", "no favicon")]);

    // Reports keep launch order
    let order: Vec<_> = result.reports.iter().map(|r| r.name).collect();
    assert_eq!(order, names);
}

#[tokio::test]
async fn panics_are_captured_as_rejections() {
    let batch: Batch = vec![
        ("ok", succeed()),
        ("panics", explode().boxed()),
    ];

    let result = settle_all("page setup", batch).await;

    assert_eq!(result.fulfilled_count(), 1);
    match &result.reports[1].outcome {
        UnitOutcome::Rejected(reason) => assert!(reason.contains("boom"), "{reason}"),
        UnitOutcome::Fulfilled => panic!("panicking unit must be rejected"),
    }
}

#[tokio::test]
async fn batch_waits_for_the_slowest_unit() {
    let done = Arc::new(AtomicUsize::new(0));
    let slow_done = Arc::clone(&done);

    let batch: Batch = vec![
        ("fast", fail("fails immediately")),
        (
            "slow",
            async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                slow_done.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>(())
            }
            .boxed(),
        ),
    ];

    let result = settle_all("wrap-up tasks", batch).await;
    assert_eq!(done.load(Ordering::SeqCst), 1);
    assert_eq!(result.rejected_count(), 1);
}

#[tokio::test]
async fn empty_batch_settles_immediately() {
    let result = settle_all("background", Vec::new()).await;
    assert!(result.reports.is_empty());
    assert_eq!(result.rejected_count(), 0);
}

#[tokio::test]
async fn phase_metrics_summarise_failures() {
    let batch: Batch = vec![
        ("ssl", fail("no tls")),
        ("dom", succeed()),
    ];
    let result = settle_all("archiving", batch).await;

    let metrics = PhaseMetrics::from(&result);
    assert_eq!(metrics.phase, "archiving");
    assert_eq!(metrics.fulfilled, 1);
    assert_eq!(metrics.rejected, 1);
    assert_eq!(metrics.failures, ["ssl: no tls"]);
}

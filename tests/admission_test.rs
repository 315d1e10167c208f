//! Dedup registry and per-run quota

use kodegen_tools_pagearchive::archive_engine::{Admission, AdmissionControl, ArchiveError, SkipReason};
use kodegen_tools_pagearchive::config::ArchiveConfig;
use std::sync::Arc;

fn control(limit: usize) -> AdmissionControl {
    let config = ArchiveConfig::builder()
        .storage_dir("/tmp/archive")
        .tasks_per_run_limit(limit)
        .build()
        .unwrap();
    AdmissionControl::from_config(&config)
}

#[test]
fn ignored_schemes_are_skipped_without_counting() {
    let admission = control(10);

    for target in ["about:blank", "data:text/html,hi", "javascript:void(0)", "chrome-error://x"] {
        match admission.admit(target).unwrap() {
            Admission::Skip(SkipReason::IgnoredScheme(_)) => {}
            other => panic!("{target} should be skipped, got {other:?}"),
        }
    }
    assert_eq!(admission.processed_count(), 0);
}

#[test]
fn second_admission_of_same_target_is_skipped() {
    let admission = control(10);

    assert_eq!(admission.admit("https://example.com/").unwrap(), Admission::Admitted);
    assert_eq!(
        admission.admit("https://example.com/").unwrap(),
        Admission::Skip(SkipReason::AlreadyProcessed)
    );
    assert!(admission.should_skip("https://example.com/"));
    assert!(!admission.should_skip("https://example.com/other"));
    assert_eq!(admission.processed_count(), 1);
}

#[test]
fn quota_rejects_once_limit_is_reached() {
    let admission = control(2);

    assert_eq!(admission.admit("https://a.example/").unwrap(), Admission::Admitted);
    assert_eq!(admission.admit("https://b.example/").unwrap(), Admission::Admitted);

    let err = admission.admit("https://c.example/").unwrap_err();
    assert!(matches!(err, ArchiveError::QuotaExceeded { processed: 2, limit: 2 }));
    assert_eq!(err.exit_code(), Some(21));

    // Skips still win over the quota
    assert_eq!(
        admission.admit("https://a.example/").unwrap(),
        Admission::Skip(SkipReason::AlreadyProcessed)
    );
}

#[test]
fn long_targets_dedup_on_truncated_key() {
    let admission = AdmissionControl::new(10, Vec::new(), 32);
    let base = format!("https://example.com/{}", "a".repeat(40));

    assert_eq!(admission.admit(&format!("{base}?x=1")).unwrap(), Admission::Admitted);
    assert_eq!(
        admission.admit(&format!("{base}?x=2")).unwrap(),
        Admission::Skip(SkipReason::AlreadyProcessed)
    );
}

#[test]
fn marking_does_not_consume_quota() {
    let admission = control(1);

    assert!(admission.mark_processed("https://seen.example/"));
    assert!(!admission.mark_processed("https://seen.example/"));
    assert_eq!(admission.processed_count(), 0);
    assert!(admission.check_capacity().is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_admissions_never_exceed_the_limit() {
    let admission = Arc::new(control(5));

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let admission = Arc::clone(&admission);
            tokio::spawn(async move { admission.admit(&format!("https://example.com/{i}")) })
        })
        .collect();

    let mut admitted = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(Admission::Admitted) => admitted += 1,
            Err(ArchiveError::QuotaExceeded { .. }) => rejected += 1,
            other => panic!("unexpected admission {other:?}"),
        }
    }
    assert_eq!(admitted, 5);
    assert_eq!(rejected, 15);
}

#[test]
fn quota_rejected_target_stays_unregistered() {
    let admission = control(1);

    assert_eq!(admission.admit("https://a.example/").unwrap(), Admission::Admitted);
    assert!(admission.admit("https://b.example/").is_err());
    assert!(!admission.should_skip("https://b.example/"));
    assert!(admission.mark_processed("https://b.example/"));
    assert_eq!(admission.processed_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_quota_rejections_leave_no_trace() {
    let admission = Arc::new(control(3));

    // Every target is submitted twice so duplicates race with the quota
    let handles: Vec<_> = (0..40)
        .map(|i| {
            let admission = Arc::clone(&admission);
            let target = format!("https://example.com/{}", i % 20);
            tokio::spawn(async move { (admission.admit(&target), target) })
        })
        .collect();

    let mut admitted = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            (Ok(Admission::Admitted), target) => admitted.push(target),
            (Ok(Admission::Skip(SkipReason::AlreadyProcessed)), _) => {}
            (Err(ArchiveError::QuotaExceeded { limit: 3, .. }), _) => {}
            other => panic!("unexpected admission {other:?}"),
        }
    }

    assert_eq!(admission.processed_count(), admitted.len());
    assert!(admitted.len() <= 3);
    for i in 0..20 {
        let target = format!("https://example.com/{i}");
        assert_eq!(admission.should_skip(&target), admitted.contains(&target), "{target}");
    }
}

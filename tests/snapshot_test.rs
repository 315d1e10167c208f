//! Snapshot layout across repeated archives of one URL

use chrono::{TimeZone, Utc};
use kodegen_tools_pagearchive::snapshot::{
    SnapshotDir, SnapshotIndex, VersionStatus, artifacts, symlink_best_results,
};
use tempfile::TempDir;

const URL: &str = "https://example.com/article";

#[tokio::test]
async fn versions_accumulate_in_one_index() {
    let storage = TempDir::new().unwrap();
    let first = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).single().unwrap();
    let second = Utc.with_ymd_and_hms(2024, 6, 2, 12, 0, 0).single().unwrap();

    let a = SnapshotDir::setup(URL, storage.path(), &first).await.unwrap();
    SnapshotIndex::record_start(&a, URL, first, "Chrome/130").await.unwrap();
    SnapshotIndex::record_finish(&a, VersionStatus::Failed, Some(12.0), Some("QA".into()))
        .await
        .unwrap();

    let b = SnapshotDir::setup(URL, storage.path(), &second).await.unwrap();
    let index = SnapshotIndex::record_start(&b, URL, second, "Chrome/131").await.unwrap();
    assert_eq!(index.first_seen, first);
    assert_eq!(index.versions.len(), 2);

    let latest = index.latest().unwrap();
    assert_eq!(latest.version, "20240602120000");
    assert_eq!(latest.status, VersionStatus::Started);
    assert_eq!(latest.browser_version, "Chrome/131");
}

#[cfg(unix)]
#[tokio::test]
async fn root_links_follow_the_newest_good_artifact() {
    let storage = TempDir::new().unwrap();
    let first = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).single().unwrap();
    let second = Utc.with_ymd_and_hms(2024, 6, 2, 12, 0, 0).single().unwrap();

    let a = SnapshotDir::setup(URL, storage.path(), &first).await.unwrap();
    tokio::fs::write(a.version_dir().join(artifacts::SCREENSHOT), b"first png").await.unwrap();
    tokio::fs::write(a.version_dir().join(artifacts::TITLE), b"First title").await.unwrap();

    let b = SnapshotDir::setup(URL, storage.path(), &second).await.unwrap();
    tokio::fs::write(b.version_dir().join(artifacts::SCREENSHOT), b"second png").await.unwrap();
    // An empty title in the newer version must not shadow the older one
    tokio::fs::write(b.version_dir().join(artifacts::TITLE), b"").await.unwrap();

    symlink_best_results(b.root()).await.unwrap();

    let screenshot = b.root().join(artifacts::SCREENSHOT);
    assert!(tokio::fs::symlink_metadata(&screenshot).await.unwrap().file_type().is_symlink());
    assert_eq!(tokio::fs::read(&screenshot).await.unwrap(), b"second png");
    assert_eq!(
        tokio::fs::read_to_string(b.root().join(artifacts::TITLE)).await.unwrap(),
        "First title"
    );
}

//! On-disk snapshot layout
//!
//! ```text
//! <storage>/<host>/<xxh3(url)>/
//!     index.json              snapshot record, one entry per version
//!     screenshot.png -> versions/<newest with a non-empty screenshot>/screenshot.png
//!     versions/<YYYYMMDDHHMMSS>/
//!         screenshot.png  output.pdf  dom.html  qa.json  ...
//! ```

pub mod artifacts;
mod best;
mod index;

pub use best::symlink_best_results;
pub use index::{SnapshotIndex, VersionRecord, VersionStatus};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::utils::url_utils::{snapshot_dir_for_url, version_str_from_date};

/// Name of the directory holding one subdirectory per archived version
pub const VERSIONS_DIR: &str = "versions";

/// Snapshot root plus the version directory of the running task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotDir {
    root: PathBuf,
    version: String,
    version_dir: PathBuf,
}

impl SnapshotDir {
    /// Create the snapshot root and this task's version directory
    pub async fn setup(url: &str, storage_dir: &Path, start_time: &DateTime<Utc>) -> Result<Self> {
        let root = snapshot_dir_for_url(url, storage_dir)?;
        let version = version_str_from_date(start_time);
        let version_dir = root.join(VERSIONS_DIR).join(&version);

        tokio::fs::create_dir_all(&version_dir)
            .await
            .with_context(|| format!("Failed to create version directory {}", version_dir.display()))?;

        Ok(Self {
            root,
            version,
            version_dir,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub fn version_dir(&self) -> &Path {
        &self.version_dir
    }

    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.root.join(index::INDEX_FILE)
    }
}

/// Serialize `value` as pretty JSON into `path`
pub async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).context("Failed to serialize JSON artifact")?;
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Write a text artifact
pub async fn write_text(path: &Path, text: &str) -> Result<()> {
    tokio::fs::write(path, text)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn setup_creates_version_dir_under_host() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let start = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).single().expect("valid date");

        let dir = SnapshotDir::setup("https://example.com/a?b=c", tmp.path(), &start)
            .await
            .expect("setup");

        assert_eq!(dir.version(), "20240309140507");
        assert!(dir.version_dir().is_dir());
        assert!(dir.root().starts_with(tmp.path().join("example.com")));
        assert_eq!(dir.version_dir(), dir.root().join("versions").join("20240309140507"));
    }

    #[tokio::test]
    async fn same_url_shares_snapshot_root() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("valid date");
        let second = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).single().expect("valid date");

        let a = SnapshotDir::setup("https://example.com/", tmp.path(), &first).await.expect("a");
        let b = SnapshotDir::setup("https://example.com/", tmp.path(), &second).await.expect("b");

        assert_eq!(a.root(), b.root());
        assert_ne!(a.version_dir(), b.version_dir());
    }
}

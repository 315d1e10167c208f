//! Snapshot index record (`index.json`)
//!
//! Read-modify-write of a small JSON document. Two tasks never touch the same
//! snapshot concurrently because admission deduplicates targets per process.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{SnapshotDir, write_json};

pub(super) const INDEX_FILE: &str = "index.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    Started,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub browser_version: String,
    pub status: VersionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pct_visible: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotIndex {
    pub url: String,
    pub first_seen: DateTime<Utc>,
    #[serde(default)]
    pub versions: Vec<VersionRecord>,
}

impl SnapshotIndex {
    /// Load the index of `dir`, or `None` if none was written yet
    pub async fn load(dir: &SnapshotDir) -> Result<Option<Self>> {
        let path = dir.index_path();
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let index = serde_json::from_slice(&bytes)
                    .with_context(|| format!("Malformed snapshot index {}", path.display()))?;
                Ok(Some(index))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    pub async fn save(&self, dir: &SnapshotDir) -> Result<()> {
        write_json(&dir.index_path(), self).await
    }

    /// Append a `Started` record for the running version
    pub async fn record_start(
        dir: &SnapshotDir,
        url: &str,
        start_time: DateTime<Utc>,
        browser_version: &str,
    ) -> Result<Self> {
        let mut index = Self::load(dir).await?.unwrap_or_else(|| Self {
            url: url.to_string(),
            first_seen: start_time,
            versions: Vec::new(),
        });

        index.versions.retain(|v| v.version != dir.version());
        index.versions.push(VersionRecord {
            version: dir.version().to_string(),
            started_at: start_time,
            browser_version: browser_version.to_string(),
            status: VersionStatus::Started,
            pct_visible: None,
            error: None,
        });
        index.save(dir).await?;
        Ok(index)
    }

    /// Set the final status of the running version
    pub async fn record_finish(
        dir: &SnapshotDir,
        status: VersionStatus,
        pct_visible: Option<f64>,
        error: Option<String>,
    ) -> Result<()> {
        let mut index = Self::load(dir)
            .await?
            .with_context(|| format!("No snapshot index at {}", dir.index_path().display()))?;

        let record = index
            .versions
            .iter_mut()
            .find(|v| v.version == dir.version())
            .with_context(|| format!("Version {} missing from snapshot index", dir.version()))?;
        record.status = status;
        record.pct_visible = pct_visible;
        record.error = error;

        index.save(dir).await
    }

    #[must_use]
    pub fn latest(&self) -> Option<&VersionRecord> {
        self.versions.iter().max_by(|a, b| a.version.cmp(&b.version))
    }
}

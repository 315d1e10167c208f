//! Link the best copy of each artifact into the snapshot root

use anyhow::{Context, Result};
use log::debug;
use std::collections::BTreeSet;
use std::path::Path;

use super::{VERSIONS_DIR, index::INDEX_FILE};

/// For every artifact name, link the newest non-empty copy across all
/// versions into `snapshot_root`
///
/// Existing links in the root are replaced; regular files are left alone.
/// Returns the number of links created.
pub async fn symlink_best_results(snapshot_root: &Path) -> Result<usize> {
    let versions_dir = snapshot_root.join(VERSIONS_DIR);
    let mut versions = Vec::new();
    let mut entries = tokio::fs::read_dir(&versions_dir)
        .await
        .with_context(|| format!("Failed to list {}", versions_dir.display()))?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            versions.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    // Version names are zero-padded timestamps, so lexical order is chronological
    versions.sort_unstable_by(|a, b| b.cmp(a));

    let mut linked = BTreeSet::new();
    for version in &versions {
        let dir = versions_dir.join(version);
        let mut files = tokio::fs::read_dir(&dir).await?;
        while let Some(file) = files.next_entry().await? {
            let name = file.file_name().to_string_lossy().into_owned();
            if name == INDEX_FILE || linked.contains(&name) {
                continue;
            }
            let meta = file.metadata().await?;
            if !meta.is_file() || meta.len() == 0 {
                continue;
            }

            let link = snapshot_root.join(&name);
            match tokio::fs::symlink_metadata(&link).await {
                Ok(existing) if existing.file_type().is_symlink() => {
                    tokio::fs::remove_file(&link).await?;
                }
                Ok(_) => {
                    debug!("Not replacing regular file {}", link.display());
                    linked.insert(name);
                    continue;
                }
                Err(_) => {}
            }

            let target = Path::new(VERSIONS_DIR).join(version).join(&name);
            make_link(&target, &link)
                .await
                .with_context(|| format!("Failed to link {}", link.display()))?;
            linked.insert(name);
        }
    }

    debug!(
        "Linked {} best artifacts into {}",
        linked.len(),
        snapshot_root.display()
    );
    Ok(linked.len())
}

#[cfg(unix)]
async fn make_link(target: &Path, link: &Path) -> std::io::Result<()> {
    tokio::fs::symlink(target, link).await
}

#[cfg(not(unix))]
async fn make_link(target: &Path, link: &Path) -> std::io::Result<()> {
    let base = link.parent().unwrap_or_else(|| Path::new("."));
    tokio::fs::copy(base.join(target), link).await.map(|_| ())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn newest_non_empty_copy_wins() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path();
        let old = root.join("versions/20240101000000");
        let new = root.join("versions/20240202000000");
        tokio::fs::create_dir_all(&old).await.expect("old");
        tokio::fs::create_dir_all(&new).await.expect("new");

        tokio::fs::write(old.join("screenshot.png"), b"old").await.expect("write");
        tokio::fs::write(new.join("screenshot.png"), b"new").await.expect("write");
        tokio::fs::write(old.join("output.pdf"), b"pdf").await.expect("write");
        tokio::fs::write(new.join("output.pdf"), b"").await.expect("write");

        let count = symlink_best_results(root).await.expect("link");
        assert_eq!(count, 2);

        let shot = tokio::fs::read(root.join("screenshot.png")).await.expect("read");
        assert_eq!(shot, b"new");
        let pdf = tokio::fs::read(root.join("output.pdf")).await.expect("read");
        assert_eq!(pdf, b"pdf");

        // Relinking replaces existing links
        assert_eq!(symlink_best_results(root).await.expect("relink"), 2);
    }
}

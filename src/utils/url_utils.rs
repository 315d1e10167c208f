//! URL and path manipulation utilities.
//!
//! This module provides functions for working with target URLs and the
//! on-disk snapshot layout derived from them.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use url::Url;
use xxhash_rust::xxh3::xxh3_64;

use super::string_utils::safe_truncate_chars;

/// Scheme of a target, i.e. everything before the first `:`.
///
/// Works on strings that are not valid URLs (`"example.com"` has scheme
/// `"example.com"`, a bare word with no colon has itself as scheme).
#[must_use]
pub fn url_scheme(target: &str) -> &str {
    target.split(':').next().unwrap_or("")
}

/// Bounded-length key used for dedup bookkeeping.
///
/// Truncates on a char boundary so multi-byte URLs never panic.
#[must_use]
pub fn dedup_key(target: &str, max_chars: usize) -> String {
    safe_truncate_chars(target, max_chars).to_string()
}

/// Version string derived from a task's start time: `YYYYMMDDHHMMSS`.
#[must_use]
pub fn version_str_from_date(start: &DateTime<Utc>) -> String {
    start.format("%Y%m%d%H%M%S").to_string()
}

/// Snapshot root for a URL: `<storage>/<host>/<xxh3 of url>`.
///
/// Every archive of the same URL lands in the same root; each run gets its
/// own `versions/<version>` directory below it.
pub fn snapshot_dir_for_url(url: &str, storage_dir: &Path) -> Result<PathBuf> {
    let parsed = Url::parse(url).map_err(|e| anyhow::anyhow!("Failed to parse URL: {e}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid URL: no host"))?;
    let host = sanitize_filename::sanitize(host);

    Ok(storage_dir
        .join(host)
        .join(format!("{:016x}", xxh3_64(url.as_bytes()))))
}

/// Check if a URL is something a browser can navigate to and archive
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn scheme_is_text_before_first_colon() {
        assert_eq!(url_scheme("https://example.com"), "https");
        assert_eq!(url_scheme("javascript:void(0)"), "javascript");
        assert_eq!(url_scheme(""), "");
    }

    #[test]
    fn dedup_key_truncates_on_char_boundary() {
        let long = "é".repeat(10);
        assert_eq!(dedup_key(&long, 4).chars().count(), 4);
        assert_eq!(dedup_key("short", 4096), "short");
    }

    #[test]
    fn version_string_is_compact_timestamp() {
        let start = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(version_str_from_date(&start), "20240309070501");
    }

    #[test]
    fn snapshot_dir_is_stable_per_url() {
        let root = Path::new("/tmp/archive");
        let a = snapshot_dir_for_url("https://example.com/a", root).unwrap();
        let b = snapshot_dir_for_url("https://example.com/a", root).unwrap();
        let c = snapshot_dir_for_url("https://example.com/b", root).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("/tmp/archive/example.com"));
    }

    #[test]
    fn only_http_urls_are_valid() {
        assert!(is_valid_url("https://example.com"));
        assert!(!is_valid_url("data:text/plain,hi"));
        assert!(!is_valid_url(""));
    }
}

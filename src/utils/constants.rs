//! Shared configuration constants for the page archiver
//!
//! This module contains default values and configuration constants used
//! throughout the codebase to ensure consistency and avoid magic numbers.

/// Process exit status used when the worker hits its per-run task ceiling.
///
/// An external supervisor is expected to respawn the worker, which then
/// continues with the remaining queue in a fresh browser.
pub const QUOTA_EXCEEDED_EXIT_CODE: i32 = 21;

/// Default number of tasks one worker process handles before exiting.
///
/// Long browser sessions accumulate memory that is cheaper to discard by
/// restarting the process than to reclaim in place.
pub const DEFAULT_TASKS_PER_RUN_LIMIT: usize = 200;

/// Maximum number of characters of a target URL kept as its dedup key.
pub const MAX_DEDUP_KEY_LEN: usize = 4096;

/// URL schemes that can never be archived.
pub const DEFAULT_IGNORED_SCHEMES: &[&str] = &[
    "",
    "about",
    "blob",
    "chrome",
    "chrome-extension",
    "chrome-error",
    "data",
    "devtools",
    "file",
    "javascript",
    "mailto",
    "tel",
];

/// Default number of archive tasks run concurrently by one worker.
pub const DEFAULT_MAX_CONCURRENT_TASKS: usize = 1;

/// Timeout for the primary `goto` navigation.
pub const NAVIGATION_TIMEOUT_SECS: u64 = 40;

/// Timeout for the fallback "next response" wait after navigation.
pub const RESPONSE_WAIT_TIMEOUT_SECS: u64 = 20;

/// Quiet period with zero in-flight requests that counts as network idle.
pub const NETWORK_IDLE_MS: u64 = 900;

/// Upper bound on the network-idle wait. Hitting it is not an error.
pub const NETWORK_IDLE_TIMEOUT_SECS: u64 = 20;

/// Screen recordings are cut off after this many seconds.
pub const SCREENRECORDING_DURATION_LIMIT_SECS: u64 = 60;

/// Wall-clock limit for the GIF transcoder process.
pub const GIF_TRANSCODE_TIMEOUT_SECS: u64 = 60;

/// How long to poll for the transcoded GIF to appear.
pub const GIF_WAIT_TIMEOUT_SECS: u64 = 40;

/// Minimum size for a transcoded GIF to count as written.
pub const GIF_MIN_BYTES: u64 = 100;

/// Pages scoring below this visibility percentage fail the quality gate.
pub const QA_MIN_PCT_VISIBLE: u8 = 50;

/// Default viewport, matching the `--window-size` the browser is launched with.
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1440;
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 2000;

/// Scroll-through stops after this many viewport-sized steps.
pub const DEFAULT_SCROLL_LIMIT: u32 = 20;

/// Timeout for each external media downloader (yt-dlp, gallery-dl).
pub const MEDIA_DOWNLOAD_TIMEOUT_SECS: u64 = 120;

/// At most this many response bodies are written per page.
pub const MAX_SAVED_RESPONSES: usize = 500;

/// Chrome user agent string
///
/// Updated: 2025-01-29 to Chrome 132 (current stable)
/// Next update: 2025-04-29 (quarterly schedule)
///
/// Reference: https://chromiumdash.appspot.com/schedule
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

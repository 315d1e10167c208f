//! Tests for the type-safe configuration builder pattern

use kodegen_tools_pagearchive::config::ArchiveConfig;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_builder_requires_storage_dir() {
    // This should not compile if uncommented - storage_dir is required
    // let config = ArchiveConfig::builder().build();

    let temp_dir = TempDir::new().unwrap();
    let config = ArchiveConfig::builder()
        .storage_dir(temp_dir.path().to_path_buf())
        .build()
        .unwrap();

    assert_eq!(config.storage_dir(), temp_dir.path());
}

#[test]
fn test_builder_optional_fields_have_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = ArchiveConfig::builder()
        .storage_dir(temp_dir.path())
        .build()
        .unwrap();

    assert!(config.headless());
    assert_eq!(config.tasks_per_run_limit(), 200);
    assert_eq!(config.max_concurrent_tasks(), 1);
    assert_eq!(config.qa_min_pct_visible(), 50);
    assert_eq!(config.viewport(), (1440, 2000));
    assert_eq!(config.navigation_timeout(), Duration::from_secs(40));
    assert_eq!(config.response_timeout(), Duration::from_secs(20));
    assert_eq!(config.network_idle_time(), Duration::from_millis(900));
    assert!(config.screen_recording_enabled());
    assert!(config.save_gif());
    assert!(config.save_responses());
    assert!(!config.save_media());
    assert!(!config.save_gallery());
    assert!(config.cookies_file().is_none());
    assert!(config.url_rewrites().is_empty());
    for scheme in ["about", "data", "javascript", "chrome-extension", ""] {
        assert!(
            config.ignored_schemes().iter().any(|s| s == scheme),
            "{scheme:?} should be ignored by default"
        );
    }
}

#[test]
fn test_builder_with_all_optional_fields() {
    let temp_dir = TempDir::new().unwrap();
    let config = ArchiveConfig::builder()
        .storage_dir(temp_dir.path())
        .headless(false)
        .viewport(800, 600)
        .user_agent("ArchiveBot/1.0")
        .tasks_per_run_limit(5)
        .max_concurrent_tasks(3)
        .navigation_timeout_secs(10)
        .response_timeout_secs(4)
        .network_idle(500, 7)
        .screen_recording(false)
        .save_gif(false)
        .save_media(true)
        .save_gallery(true)
        .ytdlp_binary("/opt/yt-dlp")
        .qa_min_pct_visible(75)
        .cookies_file("/tmp/cookies.json")
        .form_submit_selectors(vec!["#accept".into(), "button[type=submit]".into()])
        .scroll_limit(3)
        .save_responses(false)
        .build()
        .unwrap();

    assert!(!config.headless());
    assert_eq!(config.viewport(), (800, 600));
    assert_eq!(config.user_agent(), "ArchiveBot/1.0");
    assert_eq!(config.tasks_per_run_limit(), 5);
    assert_eq!(config.max_concurrent_tasks(), 3);
    assert_eq!(config.navigation_timeout(), Duration::from_secs(10));
    assert_eq!(config.response_timeout(), Duration::from_secs(4));
    assert_eq!(config.network_idle_time(), Duration::from_millis(500));
    assert_eq!(config.network_idle_timeout(), Duration::from_secs(7));
    assert!(!config.screen_recording_enabled());
    assert!(!config.save_gif());
    assert!(config.save_media());
    assert!(config.save_gallery());
    assert_eq!(config.ytdlp_binary(), "/opt/yt-dlp");
    assert_eq!(config.qa_min_pct_visible(), 75);
    assert_eq!(config.cookies_file(), Some(&PathBuf::from("/tmp/cookies.json")));
    assert_eq!(config.form_submit_selectors().len(), 2);
    assert_eq!(config.scroll_limit(), 3);
    assert!(!config.save_responses());
}

#[test]
fn test_relative_storage_dir_is_made_absolute() {
    let config = ArchiveConfig::builder()
        .storage_dir("relative/archive")
        .build()
        .unwrap();

    assert!(config.storage_dir().is_absolute());
    assert!(config.storage_dir().ends_with("relative/archive"));
}

#[test]
fn test_invalid_limits_are_rejected() {
    let zero_quota = ArchiveConfig::builder()
        .storage_dir("/tmp/archive")
        .tasks_per_run_limit(0)
        .build();
    assert!(zero_quota.is_err());

    let zero_concurrency = ArchiveConfig::builder()
        .storage_dir("/tmp/archive")
        .max_concurrent_tasks(0)
        .build();
    assert!(zero_concurrency.is_err());

    let bad_threshold = ArchiveConfig::builder()
        .storage_dir("/tmp/archive")
        .qa_min_pct_visible(101)
        .build();
    assert!(bad_threshold.is_err());
}

#[test]
fn test_url_rewrites_are_compiled_in_order() {
    let config = ArchiveConfig::builder()
        .storage_dir("/tmp/archive")
        .url_rewrite(r"^https?://www\.reddit\.com/(.*)$", "https://old.reddit.com/$1")
        .url_rewrite(r"^http://", "https://")
        .build()
        .unwrap();

    let compiled: Vec<_> = config.url_rewrites_compiled().collect();
    assert_eq!(compiled.len(), 2);
    assert_eq!(compiled[0].1, "https://old.reddit.com/$1");
    assert!(compiled[0].0.is_match("https://www.reddit.com/r/rust"));
    assert_eq!(compiled[1].1, "https://");
}

#[test]
fn test_invalid_rewrite_pattern_fails_build() {
    let result = ArchiveConfig::builder()
        .storage_dir("/tmp/archive")
        .url_rewrite("([unclosed", "x")
        .build();

    let err = result.unwrap_err().to_string();
    assert!(err.contains("Invalid URL rewrite pattern"), "unexpected error: {err}");
}

#[test]
fn test_explicit_ffmpeg_binary_wins() {
    let config = ArchiveConfig::builder()
        .storage_dir("/tmp/archive")
        .ffmpeg_binary("/usr/local/bin/ffmpeg")
        .gif_timeouts(30, 15)
        .build()
        .unwrap();

    assert_eq!(config.ffmpeg_binary(), "/usr/local/bin/ffmpeg");
    assert_eq!(config.gif_transcode_timeout(), Duration::from_secs(30));
    assert_eq!(config.gif_wait_timeout(), Duration::from_secs(15));
}

#[test]
fn test_chrome_data_dir() {
    let config = ArchiveConfig::builder()
        .storage_dir("/tmp/archive")
        .build()
        .unwrap()
        .with_chrome_data_dir(PathBuf::from("/tmp/chrome_worker_1"));

    assert_eq!(config.chrome_data_dir(), Some(&PathBuf::from("/tmp/chrome_worker_1")));
}

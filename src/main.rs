// Page archive worker
//
// Archives each target URL into the storage directory, one browser tab per
// task. Exits with status 21 when the per-run task limit is reached so a
// supervisor can restart it with a fresh browser.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use kodegen_tools_pagearchive::archive_engine::{
    ArchiveError, ArchiveWorker, CleanupResult, Sequencer, admission, cleanup_browser_and_data,
};
use kodegen_tools_pagearchive::chrome::{ChromeSessionProvider, default_pipeline};
use kodegen_tools_pagearchive::config::ArchiveConfig;
use kodegen_tools_pagearchive::launch_browser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Wall-clock limit for closing the browser on the way out
const CLEANUP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Parser, Debug)]
#[command(name = "kodegen-pagearchive")]
#[command(about = "Archive web pages into multi-artifact snapshots")]
#[command(version)]
struct Args {
    /// URLs to archive
    urls: Vec<String>,

    #[arg(short = 'f', long, help = "File with one URL per line (# starts a comment)")]
    urls_file: Option<PathBuf>,

    #[arg(short, long, default_value = "./archive", help = "Directory snapshots are written to")]
    storage_dir: PathBuf,

    #[arg(long, help = "Show the browser window")]
    headed: bool,

    #[arg(short = 'j', long, default_value_t = 1, help = "Tasks archived concurrently")]
    concurrency: usize,

    #[arg(long, default_value_t = 200, help = "Tasks handled before the process exits with status 21")]
    tasks_per_run: usize,

    #[arg(long, help = "Disable screen recording")]
    no_screenrecording: bool,

    #[arg(long, help = "Keep the recording but skip GIF conversion")]
    no_gif: bool,

    #[arg(long, help = "Download embedded media with yt-dlp")]
    save_media: bool,

    #[arg(long, help = "Download image galleries with gallery-dl")]
    save_gallery: bool,

    #[arg(long, help = "Do not save individual response bodies")]
    no_responses: bool,

    #[arg(long, help = "JSON array of cookies to load before navigating")]
    cookies_file: Option<PathBuf>,

    #[arg(long = "url-rewrite", value_name = "REGEX=>REPLACEMENT", help = "Rewrite matching request URLs (repeatable)")]
    url_rewrites: Vec<String>,

    #[arg(long = "submit", value_name = "SELECTOR", help = "Click this selector after scrolling (repeatable)")]
    submit_selectors: Vec<String>,

    #[arg(long, default_value_t = 50, help = "Minimum visibility percentage to pass QA")]
    qa_min_pct: u8,
}

/// Parse a `REGEX=>REPLACEMENT` rewrite rule
fn parse_rewrite(rule: &str) -> Result<(&str, &str)> {
    rule.split_once("=>")
        .ok_or_else(|| anyhow!("URL rewrite '{rule}' must look like REGEX=>REPLACEMENT"))
}

fn build_config(args: &Args) -> Result<ArchiveConfig> {
    let mut builder = ArchiveConfig::builder()
        .storage_dir(&args.storage_dir)
        .headless(!args.headed)
        .max_concurrent_tasks(args.concurrency)
        .tasks_per_run_limit(args.tasks_per_run)
        .screen_recording(!args.no_screenrecording)
        .save_gif(!args.no_gif)
        .save_media(args.save_media)
        .save_gallery(args.save_gallery)
        .save_responses(!args.no_responses)
        .form_submit_selectors(args.submit_selectors.clone())
        .qa_min_pct_visible(args.qa_min_pct);
    if let Some(ref path) = args.cookies_file {
        builder = builder.cookies_file(path);
    }
    for rule in &args.url_rewrites {
        let (pattern, replacement) = parse_rewrite(rule)?;
        builder = builder.url_rewrite(pattern, replacement);
    }
    builder.build()
}

/// Targets from the command line followed by those in `urls_file`
async fn read_targets(urls: &[String], urls_file: Option<&Path>) -> Result<Vec<String>> {
    let mut targets = urls.to_vec();
    if let Some(path) = urls_file {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        targets.extend(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string),
        );
    }
    Ok(targets)
}

/// Reclaim sole ownership of the browser once aborted tasks have dropped
/// their handles on the provider
async fn reclaim_browser(mut provider: Arc<ChromeSessionProvider>) -> Option<chromiumoxide::Browser> {
    for _ in 0..40 {
        match Arc::try_unwrap(provider) {
            Ok(provider) => return provider.into_browser(),
            Err(shared) => provider = shared,
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    None
}

async fn shutdown(
    provider: Arc<ChromeSessionProvider>,
    handler: tokio::task::JoinHandle<()>,
    chrome_data_dir: PathBuf,
) {
    let Some(browser) = reclaim_browser(provider).await else {
        warn!("Browser still in use at shutdown, leaving it to the OS");
        handler.abort();
        return;
    };
    match tokio::time::timeout(
        CLEANUP_TIMEOUT,
        cleanup_browser_and_data(browser, handler, chrome_data_dir),
    )
    .await
    {
        Ok(Ok(CleanupResult::Success)) => info!("Browser closed"),
        Ok(Ok(CleanupResult::PartialFailure(errors))) => {
            warn!("Browser cleanup incomplete: {}", errors.join("; "));
        }
        Ok(Err(e)) => warn!("Browser cleanup failed: {e}"),
        Err(_) => warn!("Browser cleanup timed out after {}s", CLEANUP_TIMEOUT.as_secs()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = match build_config(&args) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            tracing::error!("Invalid configuration: {e:#}");
            std::process::exit(1);
        }
    };
    let targets = read_targets(&args.urls, args.urls_file.as_deref()).await?;
    if targets.is_empty() {
        tracing::error!("No URLs given");
        std::process::exit(1);
    }

    let admission = admission::init_global(&config);
    let (browser, handler, chrome_data_dir) = launch_browser(&config).await?;
    let provider = Arc::new(ChromeSessionProvider::new(Arc::new(browser), Arc::clone(&config)));

    let pipeline = default_pipeline();
    for (phase, units) in pipeline.describe() {
        tracing::debug!("{phase}: {}", units.join(", "));
    }
    let sequencer = Sequencer::new(
        Arc::clone(&provider),
        Arc::clone(&config),
        pipeline,
        admission,
    );
    let worker = ArchiveWorker::new(sequencer);
    let result = worker.run(targets).await;
    drop(worker);

    shutdown(provider, handler, chrome_data_dir).await;

    match result {
        Ok(report) if report.failed == 0 => Ok(()),
        Ok(report) => {
            warn!("{} of the targets failed", report.failed);
            std::process::exit(1);
        }
        Err(e @ ArchiveError::QuotaExceeded { .. }) => {
            std::process::exit(e.exit_code().unwrap_or(1));
        }
        Err(e) => {
            tracing::error!("Worker stopped: {e}");
            std::process::exit(1);
        }
    }
}

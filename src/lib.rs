pub mod archive_engine;
pub mod behaviors;
pub mod browser_setup;
pub mod chrome;
pub mod config;
pub mod extractors;
pub mod page_setup;
pub mod recorder;
pub mod snapshot;
pub mod utils;

pub use archive_engine::{
    ArchiveError, ArchiveResult, ArchiveWorker, PageSession, PageState, QaResult, Sequencer,
    SessionProvider, TaskOutcome, WorkerReport,
};
pub use browser_setup::{download_managed_browser, find_browser_executable, launch_browser};
pub use chrome::{ChromePage, ChromeSessionProvider, default_pipeline};
pub use config::ArchiveConfig;
pub use snapshot::SnapshotDir;

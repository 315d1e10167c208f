//! Single-page archive engine
//!
//! This module contains the task orchestrator and the pieces it is built
//! from: admission control, the settle-all combinator, per-task page state,
//! unit contracts, the quality gate and the worker driver.

pub mod admission;
pub mod archive_types;
pub mod cleanup;
pub mod metrics;
pub mod page_state;
pub mod page_timeout;
pub mod quality_gate;
pub mod sequencer;
pub mod session;
pub mod settle;
pub mod unit;
pub mod worker;

pub use admission::{Admission, AdmissionControl, SkipReason};
pub use archive_types::{ArchiveError, ArchiveResult, TaskOutcome};
pub use cleanup::{CleanupResult, cleanup_browser_and_data};
pub use metrics::{PhaseMetrics, TaskMetrics};
pub use page_state::{CaptureBuffers, ConsoleEntry, PageState, RedirectHop, TrafficRecord};
pub use page_timeout::{tolerate_timeout, with_page_timeout};
pub use quality_gate::{QaResult, evaluate, judge, read_qa_result, write_qa_result};
pub use sequencer::Sequencer;
pub use session::{PageSession, ResponseInfo, SessionProvider, TlsInfo};
pub use settle::{PhaseResult, UnitOutcome, UnitReport, settle_all};
pub use unit::{ArchiveUnit, FnUnit, Pipeline, UnitList, unit};
pub use worker::{ArchiveWorker, WorkerReport};

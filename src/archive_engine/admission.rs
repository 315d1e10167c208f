//! Process-wide dedup registry and per-run task quota
//!
//! Every target passes through `AdmissionControl::admit` before any browser
//! work starts. The registry is append-only for the life of the worker
//! process; a restart is the only way to clear it.
//!
//! Key features:
//! - Lock-free visited set (`DashSet`) keyed by the URL truncated to a bounded length
//! - Ignored-scheme filtering (`about:`, `data:`, `javascript:` ...)
//! - Hard ceiling on tasks per process, checked before a target is registered
//! - One global instance initialised at worker start

use dashmap::DashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use super::archive_types::{ArchiveError, ArchiveResult};
use crate::config::ArchiveConfig;
use crate::utils::{dedup_key, url_scheme};

/// Why a target was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    IgnoredScheme(String),
    AlreadyProcessed,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IgnoredScheme(scheme) => write!(f, "unarchivable scheme {scheme:?}"),
            Self::AlreadyProcessed => f.write_str("already archived by this worker"),
        }
    }
}

/// Admission decision for a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Target is registered and counted; the task may run
    Admitted,
    /// Target must not be archived; the task returns without a result
    Skip(SkipReason),
}

/// Dedup registry plus task counter
#[derive(Debug)]
pub struct AdmissionControl {
    registry: DashSet<String>,
    processed: AtomicUsize,
    limit: usize,
    ignored_schemes: Vec<String>,
    max_key_len: usize,
}

impl AdmissionControl {
    #[must_use]
    pub fn new(limit: usize, ignored_schemes: Vec<String>, max_key_len: usize) -> Self {
        Self {
            registry: DashSet::new(),
            processed: AtomicUsize::new(0),
            limit,
            ignored_schemes,
            max_key_len,
        }
    }

    #[must_use]
    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self::new(
            config.tasks_per_run_limit(),
            config.ignored_schemes().to_vec(),
            config.max_dedup_key_len(),
        )
    }

    /// Reason the target would be skipped, if any
    #[must_use]
    pub fn skip_reason(&self, target: &str) -> Option<SkipReason> {
        let scheme = url_scheme(target);
        if self.ignored_schemes.iter().any(|s| s == scheme) {
            return Some(SkipReason::IgnoredScheme(scheme.to_string()));
        }
        if self.registry.contains(&dedup_key(target, self.max_key_len)) {
            return Some(SkipReason::AlreadyProcessed);
        }
        None
    }

    #[must_use]
    pub fn should_skip(&self, target: &str) -> bool {
        self.skip_reason(target).is_some()
    }

    /// Register a target without touching the task counter
    ///
    /// Returns `false` if the key was already present.
    pub fn mark_processed(&self, target: &str) -> bool {
        self.registry.insert(dedup_key(target, self.max_key_len))
    }

    /// Fail if admitting one more task would exceed the ceiling
    ///
    /// Uses the pre-increment count: with `n` tasks processed, the next task
    /// is rejected once `n + 1 > limit`.
    pub fn check_capacity(&self) -> ArchiveResult<()> {
        let processed = self.processed.load(Ordering::Acquire);
        if processed >= self.limit {
            return Err(ArchiveError::QuotaExceeded {
                processed,
                limit: self.limit,
            });
        }
        Ok(())
    }

    /// Skip check, quota reservation and registration in that order
    ///
    /// A target rejected for quota is never registered. The slot reserved by
    /// a task that loses the registration race to a duplicate is released.
    pub fn admit(&self, target: &str) -> ArchiveResult<Admission> {
        if let Some(reason) = self.skip_reason(target) {
            return Ok(Admission::Skip(reason));
        }

        self.reserve_slot()?;

        if !self.mark_processed(target) {
            // Lost a race with a concurrent task for the same target
            self.processed.fetch_sub(1, Ordering::AcqRel);
            return Ok(Admission::Skip(SkipReason::AlreadyProcessed));
        }

        Ok(Admission::Admitted)
    }

    /// Count one more task unless the ceiling is already reached
    fn reserve_slot(&self) -> ArchiveResult<()> {
        let limit = self.limit;
        self.processed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < limit).then_some(n + 1))
            .map(|_| ())
            .map_err(|processed| ArchiveError::QuotaExceeded { processed, limit })
    }

    /// Number of tasks admitted so far
    #[must_use]
    pub fn processed_count(&self) -> usize {
        self.processed.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }
}

static GLOBAL_ADMISSION: OnceLock<Arc<AdmissionControl>> = OnceLock::new();

/// Initialise the process-wide admission control
///
/// Only the first call configures the instance; later calls return it
/// unchanged.
pub fn init_global(config: &ArchiveConfig) -> Arc<AdmissionControl> {
    Arc::clone(GLOBAL_ADMISSION.get_or_init(|| Arc::new(AdmissionControl::from_config(config))))
}

/// The process-wide admission control, if initialised
#[must_use]
pub fn global() -> Option<Arc<AdmissionControl>> {
    GLOBAL_ADMISSION.get().map(Arc::clone)
}

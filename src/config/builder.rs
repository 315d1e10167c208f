//! Type-safe builder for `ArchiveConfig` using the typestate pattern
//!
//! This module provides a fluent builder interface with compile-time validation
//! ensuring that the storage directory is set before building an `ArchiveConfig`.

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use std::marker::PhantomData;
use std::path::PathBuf;

use super::types::{ArchiveConfig, UrlRewriteRule};

/// Compile a URL rewrite pattern into a regex
///
/// # Errors
///
/// Returns an error if the pattern is not a valid regular expression.
fn compile_rewrite_pattern(rule: &UrlRewriteRule) -> Result<Regex> {
    Regex::new(&rule.pattern)
        .map_err(|e| anyhow!("Invalid URL rewrite pattern '{}': {e}", rule.pattern))
}

// Type states for the builder
pub struct WithStorageDir;

pub struct ArchiveConfigBuilder<State = ()> {
    pub(crate) storage_dir: Option<PathBuf>,
    pub(crate) inner: ArchiveConfig,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for ArchiveConfigBuilder<()> {
    fn default() -> Self {
        Self {
            storage_dir: None,
            inner: ArchiveConfig::default(),
            _phantom: PhantomData,
        }
    }
}

impl ArchiveConfig {
    /// Create a builder for configuring an `ArchiveConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> ArchiveConfigBuilder<()> {
        ArchiveConfigBuilder::default()
    }
}

impl ArchiveConfigBuilder<()> {
    pub fn storage_dir(self, dir: impl Into<PathBuf>) -> ArchiveConfigBuilder<WithStorageDir> {
        ArchiveConfigBuilder {
            storage_dir: Some(dir.into()),
            inner: self.inner,
            _phantom: PhantomData,
        }
    }
}

// Build method only available once the storage directory is set
impl ArchiveConfigBuilder<WithStorageDir> {
    pub fn build(self) -> Result<ArchiveConfig> {
        let mut config = self.inner;

        let storage_dir = self
            .storage_dir
            .ok_or_else(|| anyhow!("storage_dir is required"))?;

        // Snapshot roots are later symlinked into; keep them absolute
        config.storage_dir = if storage_dir.is_absolute() {
            storage_dir
        } else {
            std::env::current_dir()
                .context("Failed to resolve current directory for storage_dir")?
                .join(storage_dir)
        };

        if config.tasks_per_run_limit == 0 {
            return Err(anyhow!("tasks_per_run_limit must be at least 1"));
        }
        if config.max_concurrent_tasks == 0 {
            return Err(anyhow!("max_concurrent_tasks must be at least 1"));
        }
        if config.qa_min_pct_visible > 100 {
            return Err(anyhow!(
                "qa_min_pct_visible must be between 0 and 100, got {}",
                config.qa_min_pct_visible
            ));
        }

        config.url_rewrites_compiled = config
            .url_rewrites
            .iter()
            .map(compile_rewrite_pattern)
            .collect::<Result<Vec<_>>>()?;

        Ok(config)
    }
}

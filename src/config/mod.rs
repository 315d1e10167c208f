//! Configuration module for page archiving
//!
//! This module provides the `ArchiveConfig` struct and its type-safe builder
//! for configuring archive workers with validation and sensible defaults.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod methods;
pub mod types;

// Re-exports for public API
pub use builder::{ArchiveConfigBuilder, WithStorageDir};
pub use types::{ArchiveConfig, MediaConfig, ScreenRecordingConfig, UrlRewriteRule};

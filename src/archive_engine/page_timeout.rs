//! Timeout utilities for page operations
//!
//! Provides async timeout wrappers to prevent indefinite hangs during
//! navigation, response waits and other browser operations.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;

/// Wrap an async page operation with an explicit timeout
///
/// Returns proper error messages distinguishing between timeout and operation failures.
///
/// # Arguments
/// * `operation` - The async Future to execute with a timeout
/// * `timeout` - Maximum time to wait
/// * `operation_name` - Human-readable name for error messages
pub async fn with_page_timeout<F, T>(operation: F, timeout: Duration, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "{operation_name} timeout after {:.1} seconds",
            timeout.as_secs_f64()
        )),
    }
}

/// Like `with_page_timeout`, but a timeout counts as success
///
/// Used for waits whose expiry is expected on busy pages (network idle).
pub async fn tolerate_timeout<F>(operation: F, timeout: Duration, operation_name: &str) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => {
            log::debug!(
                "{operation_name} still pending after {:.1}s, continuing",
                timeout.as_secs_f64()
            );
            Ok(())
        }
    }
}

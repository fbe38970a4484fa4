//! Time-boxing and retry rules for calls into the store.
//!
//! Every store call may suspend on I/O. Reads that are idempotent get a
//! bounded number of retries; writes run at most once because a timeout
//! does not tell us whether the write was applied.

use anyhow::{anyhow, Result};
use log::warn;
use std::future::Future;

use crate::config::StorePolicy;

/// Run an idempotent read, retrying after a timeout or error.
pub async fn read_with_retry<T, F, Fut>(policy: &StorePolicy, operation: &str, mut call: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match tokio::time::timeout(policy.timeout(), call()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) if attempt < policy.read_retries => {
                warn!("{} failed (attempt {}), retrying: {}", operation, attempt + 1, e);
            }
            Ok(Err(e)) => return Err(e),
            Err(_) if attempt < policy.read_retries => {
                warn!("{} timed out (attempt {}), retrying", operation, attempt + 1);
            }
            Err(_) => {
                return Err(anyhow!(
                    "{} timed out after {} ms",
                    operation,
                    policy.timeout_ms
                ))
            }
        }
        attempt += 1;
    }
}

/// Run a write exactly once within the time box.
pub async fn write_once<T, Fut>(policy: &StorePolicy, operation: &str, call: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match tokio::time::timeout(policy.timeout(), call).await {
        Ok(result) => result,
        Err(_) => Err(anyhow!(
            "{} timed out after {} ms; outcome unknown, not retried",
            operation,
            policy.timeout_ms
        )),
    }
}

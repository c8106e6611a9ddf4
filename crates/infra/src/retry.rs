//! Bounded backoff for idempotent store reads.
//!
//! Only availability failures are retried, and only for operations that are
//! safe to repeat. Mutations must never go through here: re-running a
//! decrement after an ambiguous failure could charge stock twice.

use std::future::Future;
use std::time::Duration;

use crate::store::StoreError;

/// Retry policy: `attempts` total tries, delay doubling from `base_delay`.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(50),
        }
    }
}

/// Run an idempotent read with bounded exponential backoff.
///
/// Non-retryable errors (`NotFound`, `InsufficientStock`, `Invalid`) return
/// immediately; `Unavailable` is retried until the attempts are exhausted.
pub async fn with_backoff<T, F, Fut>(policy: Backoff, mut op: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let attempts = policy.attempts.max(1);
    let mut delay = policy.base_delay;

    for attempt in 1..=attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < attempts => {
                tracing::warn!(attempt, %err, "retrying read after transient store failure");
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(err) => return Err(err),
        }
    }

    unreachable!("loop returns on the final attempt");
}

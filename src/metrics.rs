//! # Metric Emission and Retry Wrapping
//!
//! Every successful physical call emits exactly one structured `tracing`
//! event carrying the stream name, byte and event counts, the elapsed
//! interval, and an `evt` discriminator:
//!
//! - `Slice` — one per physical slice read, with direction and batch index;
//! - `Batch` — one per logical load, with direction and slice count;
//! - `WriteSuccess` / `WriteConflict` — one per append attempt's outcome.
//!
//! Conflicts log at `info`: they are an expected outcome of optimistic
//! concurrency, not an error.
//!
//! [`RetryPolicy`] wraps a single physical call. Only transport faults are
//! re-issued; terminal faults (wrong expected version, deleted stream) return
//! immediately. Attempts past the first log at `warn` with the attempt
//! counter, so noisy infrastructure shows up in the logs before it exhausts
//! the policy.

use std::future::Future;
use std::time::Duration;

use crate::error::Result;
use crate::types::{Direction, StreamName, WriteResult};

// =============================================================================
// Measurements
// =============================================================================

/// Byte/event counts and elapsed time for one physical or logical operation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Measurement {
    pub bytes: usize,
    pub count: usize,
    pub elapsed: Duration,
}

pub(crate) fn report_slice(
    stream: &StreamName,
    direction: Direction,
    batch_index: usize,
    batch_size: usize,
    m: Measurement,
) {
    tracing::info!(
        evt = "Slice",
        stream = %stream,
        direction = %direction,
        batch_index,
        batch_size,
        bytes = m.bytes,
        count = m.count,
        elapsed_ms = m.elapsed.as_millis() as u64,
        "read slice"
    );
}

pub(crate) fn report_batch(
    stream: &StreamName,
    direction: Direction,
    slices: usize,
    start_pos: i64,
    m: Measurement,
) {
    tracing::info!(
        evt = "Batch",
        stream = %stream,
        direction = %direction,
        slices,
        start_pos,
        bytes = m.bytes,
        count = m.count,
        elapsed_ms = m.elapsed.as_millis() as u64,
        "loaded stream"
    );
}

pub(crate) fn report_write_success(
    stream: &StreamName,
    expected_version: i64,
    result: &WriteResult,
    m: Measurement,
) {
    tracing::info!(
        evt = "WriteSuccess",
        stream = %stream,
        expected_version,
        next_expected_version = result.next_expected_version,
        log_position = result.log_position,
        bytes = m.bytes,
        count = m.count,
        elapsed_ms = m.elapsed.as_millis() as u64,
        "appended events"
    );
}

pub(crate) fn report_write_conflict(stream: &StreamName, expected_version: i64, m: Measurement) {
    tracing::info!(
        evt = "WriteConflict",
        stream = %stream,
        expected_version,
        bytes = m.bytes,
        count = m.count,
        elapsed_ms = m.elapsed.as_millis() as u64,
        "append conflicted"
    );
}

// =============================================================================
// Retry Policy
// =============================================================================

/// Retry schedule for a single physical call.
///
/// The default is a single attempt — no retries. A policy with
/// `max_attempts = N` re-issues transient faults up to `N − 1` times with
/// exponential backoff.
///
/// # Why Only Transport Faults?
///
/// Re-issuing a wrong-expected-version append can never succeed (the
/// version is still wrong), and a deleted stream stays deleted. Those
/// faults have their own recovery paths — resync, or give up — so the
/// policy hands them straight back.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use streamfold::RetryPolicy;
///
/// let policy = RetryPolicy::new(3, Duration::from_millis(10));
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    /// A single attempt; transient faults surface immediately.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// Up to `max_attempts` attempts, doubling the backoff between them.
    ///
    /// `max_attempts` is clamped to at least 1.
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            multiplier: 2.0,
        }
    }

    /// Overrides the backoff growth factor.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    fn backoff_for(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .mul_f64(self.multiplier.powi(attempt as i32 - 1))
    }

    /// Runs `op`, presenting the attempt number (starting at 1) each time.
    ///
    /// Retries only faults for which
    /// [`Error::is_transient`](crate::Error::is_transient) holds, sleeping
    /// the scheduled backoff between attempts.
    pub(crate) async fn run<T, F, Fut>(&self, label: &'static str, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    tracing::warn!(
                        label,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %err,
                        "transient fault, retrying"
                    );
                    tokio::time::sleep(self.backoff_for(attempt)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_transient_faults_until_success() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let calls = AtomicU32::new(0);

        let result = policy
            .run("read", |attempt| {
                let seen = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    assert_eq!(attempt, seen);
                    if attempt < 3 {
                        Err(Error::transport("flaky"))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(result, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let policy = RetryPolicy::new(2, Duration::ZERO);
        let calls = AtomicU32::new(0);

        let err = policy
            .run("read", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(Error::transport("down")) }
            })
            .await
            .unwrap_err();

        assert!(err.is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn terminal_faults_are_not_retried() {
        let policy = RetryPolicy::new(5, Duration::ZERO);
        let calls = AtomicU32::new(0);

        let err = policy
            .run("write", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err::<(), _>(Error::WrongExpectedVersion {
                        stream: "s".to_string(),
                        expected: 0,
                        actual: 1,
                    })
                }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::WrongExpectedVersion { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn single_attempt_policy_never_sleeps() {
        let policy = RetryPolicy::none();
        let err = policy
            .run("read", |_| async { Err::<(), _>(Error::transport("down")) })
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn backoff_doubles_by_default() {
        let policy = RetryPolicy::new(4, Duration::from_millis(10));
        assert_eq!(policy.backoff_for(1), Duration::from_millis(10));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(20));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(40));
    }
}

//! # Version-Checked Append
//!
//! The write primitive issues the client append under the write retry policy
//! and folds the outcome into [`AppendOutcome`]: a wrong-expected-version
//! fault becomes `Conflict` — the expected result of losing an optimistic
//! concurrency race, logged at info — while every other fault propagates.

use std::time::Instant;

use crate::client::EventLog;
use crate::error::{Error, Result};
use crate::metrics::{report_write_conflict, report_write_success, Measurement, RetryPolicy};
use crate::types::{encoded_bytes, EncodedEvent, StreamName, WriteResult};

/// Outcome of a version-checked append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AppendOutcome {
    /// The append landed; the stream is now at
    /// [`WriteResult::next_expected_version`].
    Written(WriteResult),

    /// The stream's actual version no longer matched the expected version.
    Conflict,
}

/// Appends `events` to `stream` iff it is still at `expected_version`.
pub(crate) async fn write_events<L: EventLog>(
    log: &L,
    retry: &RetryPolicy,
    stream: &StreamName,
    expected_version: i64,
    events: &[EncodedEvent],
) -> Result<AppendOutcome> {
    let started = Instant::now();
    let outcome = retry
        .run("write", |_| {
            log.append_to_stream(stream, expected_version, events)
        })
        .await;

    let measurement = Measurement {
        bytes: encoded_bytes(events),
        count: events.len(),
        elapsed: started.elapsed(),
    };

    match outcome {
        Ok(result) => {
            report_write_success(stream, expected_version, &result, measurement);
            Ok(AppendOutcome::Written(result))
        }
        Err(Error::WrongExpectedVersion { .. }) => {
            report_write_conflict(stream, expected_version, measurement);
            Ok(AppendOutcome::Conflict)
        }
        Err(err) => Err(err),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryLog;

    fn event(tag: &str) -> EncodedEvent {
        EncodedEvent::new(tag, b"{}".to_vec())
    }

    #[tokio::test]
    async fn successful_append_reports_new_version() {
        let log = MemoryLog::new();
        let stream = StreamName::new("s");
        let retry = RetryPolicy::none();

        let outcome = write_events(&log, &retry, &stream, -1, &[event("A"), event("B")])
            .await
            .unwrap();
        match outcome {
            AppendOutcome::Written(result) => assert_eq!(result.next_expected_version, 1),
            AppendOutcome::Conflict => panic!("unexpected conflict"),
        }
    }

    #[tokio::test]
    async fn stale_expected_version_becomes_conflict() {
        let log = MemoryLog::new();
        let stream = StreamName::new("s");
        let retry = RetryPolicy::none();

        write_events(&log, &retry, &stream, -1, &[event("A")]).await.unwrap();

        let outcome = write_events(&log, &retry, &stream, -1, &[event("B")]).await.unwrap();
        assert_eq!(outcome, AppendOutcome::Conflict);

        // the losing write must not have landed
        assert_eq!(log.stream_version(&stream), 0);
    }

    #[tokio::test]
    async fn deleted_stream_propagates_as_error() {
        let log = MemoryLog::new();
        let stream = StreamName::new("s");
        let retry = RetryPolicy::none();

        write_events(&log, &retry, &stream, -1, &[event("A")]).await.unwrap();
        log.delete_stream(&stream);

        let err = write_events(&log, &retry, &stream, 0, &[event("B")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StreamDeleted { .. }));
    }

    #[tokio::test]
    async fn write_retry_recovers_from_injected_faults() {
        let log = MemoryLog::new();
        let stream = StreamName::new("s");
        log.inject_transport_faults(1);
        let retry = RetryPolicy::new(2, std::time::Duration::ZERO);

        let outcome = write_events(&log, &retry, &stream, -1, &[event("A")]).await.unwrap();
        assert!(matches!(outcome, AppendOutcome::Written(_)));
    }
}

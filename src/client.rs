//! # Event-Log Client Contract
//!
//! The adapter performs no wire I/O itself: every physical operation goes
//! through an [`EventLog`] implementation supplied at construction. The
//! contract is three calls — version-checked append, forward slice read,
//! backward slice read — mirroring the surface of an append-only event store.
//!
//! [`MemoryLog`](crate::MemoryLog) is the in-tree implementation, suitable
//! for embedded use and tests; production deployments implement this trait
//! over their store's client library.

use std::future::Future;
use std::sync::Arc;

use crate::error::Result;
use crate::types::{EncodedEvent, StreamName, StreamPosition, StreamSlice, WriteResult};

/// The physical append-only event log the adapter delegates to.
///
/// # Contract
///
/// - `append_to_stream` must fail with
///   [`Error::WrongExpectedVersion`](crate::Error::WrongExpectedVersion)
///   when `expected_version` does not match the stream's actual version
///   (−1 asserts the stream is empty). On success it reports the stream's
///   new version and the write's global log position.
/// - `read_stream_forward` returns up to `count` events starting at event
///   number `from`, ascending.
/// - `read_stream_backward` returns up to `count` events starting at `from`
///   ([`StreamPosition::End`] means the latest event), descending.
/// - Reads report missing streams via
///   [`SliceStatus::StreamNotFound`](crate::SliceStatus::StreamNotFound) and
///   tombstoned streams via
///   [`SliceStatus::StreamDeleted`](crate::SliceStatus::StreamDeleted);
///   appends to tombstoned streams fail with
///   [`Error::StreamDeleted`](crate::Error::StreamDeleted).
/// - Infrastructure faults are reported as
///   [`Error::Transport`](crate::Error::Transport); these are the only
///   faults the adapter's retry policies re-issue.
///
/// # Example
///
/// ```rust
/// use streamfold::{EncodedEvent, EventLog, MemoryLog, StreamName};
///
/// # async fn example() -> streamfold::Result<()> {
/// let log = MemoryLog::new();
/// let stream = StreamName::new("cart-1");
///
/// log.append_to_stream(&stream, -1, &[EncodedEvent::new("Added", b"{}".to_vec())])
///     .await?;
///
/// let slice = log.read_stream_forward(&stream, 0, 100).await?;
/// assert_eq!(slice.last_event_number, 0);
/// assert_eq!(slice.events.len(), 1);
/// # Ok(())
/// # }
/// ```
pub trait EventLog: Send + Sync {
    /// Appends `events` to `stream` iff the stream is at `expected_version`.
    ///
    /// # Errors
    ///
    /// [`Error::WrongExpectedVersion`](crate::Error::WrongExpectedVersion)
    /// when the stream's actual version differs,
    /// [`Error::StreamDeleted`](crate::Error::StreamDeleted) when the stream
    /// is tombstoned, [`Error::Transport`](crate::Error::Transport) for
    /// infrastructure faults.
    fn append_to_stream(
        &self,
        stream: &StreamName,
        expected_version: i64,
        events: &[EncodedEvent],
    ) -> impl Future<Output = Result<WriteResult>> + Send;

    /// Reads a forward slice of up to `count` events starting at `from`.
    ///
    /// # Errors
    ///
    /// [`Error::Transport`](crate::Error::Transport) only; missing and
    /// deleted streams are reported in-band via
    /// [`StreamSlice::status`](crate::StreamSlice::status).
    fn read_stream_forward(
        &self,
        stream: &StreamName,
        from: i64,
        count: usize,
    ) -> impl Future<Output = Result<StreamSlice>> + Send;

    /// Reads a backward slice of up to `count` events starting at `from`.
    ///
    /// # Errors
    ///
    /// As [`read_stream_forward`](EventLog::read_stream_forward).
    fn read_stream_backward(
        &self,
        stream: &StreamName,
        from: StreamPosition,
        count: usize,
    ) -> impl Future<Output = Result<StreamSlice>> + Send;
}

/// One client handle can back several gateways.
impl<L: EventLog> EventLog for Arc<L> {
    fn append_to_stream(
        &self,
        stream: &StreamName,
        expected_version: i64,
        events: &[EncodedEvent],
    ) -> impl Future<Output = Result<WriteResult>> + Send {
        self.as_ref().append_to_stream(stream, expected_version, events)
    }

    fn read_stream_forward(
        &self,
        stream: &StreamName,
        from: i64,
        count: usize,
    ) -> impl Future<Output = Result<StreamSlice>> + Send {
        self.as_ref().read_stream_forward(stream, from, count)
    }

    fn read_stream_backward(
        &self,
        stream: &StreamName,
        from: StreamPosition,
        count: usize,
    ) -> impl Future<Output = Result<StreamSlice>> + Send {
        self.as_ref().read_stream_backward(stream, from, count)
    }
}

//! # In-Memory Event Log
//!
//! A complete [`EventLog`] implementation backed by process memory. Streams
//! live in a mutex-guarded map; appends are version-checked against the
//! stream's current head, exactly like a real store's optimistic-concurrency
//! gate.
//!
//! Intended for embedded use and tests. The mutex is held only for
//! synchronous map work — never across an await point — so the log is safe
//! to share across tasks via [`Arc`](std::sync::Arc).
//!
//! Fault injection: [`MemoryLog::inject_transport_faults`] makes the next N
//! physical calls fail with a transport error, which is how the retry-policy
//! tests exercise recovery.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::client::EventLog;
use crate::error::{Error, Result};
use crate::types::{
    EncodedEvent, ResolvedEvent, SliceStatus, StreamName, StreamPosition, StreamSlice, WriteResult,
    EMPTY_STREAM_VERSION,
};

#[derive(Default)]
struct StreamEntry {
    events: Vec<EncodedEvent>,
    deleted: bool,
}

impl StreamEntry {
    fn version(&self) -> i64 {
        self.events.len() as i64 - 1
    }
}

/// An in-memory append-only event log.
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
/// let result = log
///     .append_to_stream(&stream, -1, &[EncodedEvent::new("Added", b"{}".to_vec())])
///     .await?;
/// assert_eq!(result.next_expected_version, 0);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MemoryLog {
    streams: Mutex<HashMap<String, StreamEntry>>,
    global_pos: AtomicUsize,
    pending_faults: AtomicUsize,
}

impl MemoryLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tombstones a stream. Subsequent reads report `StreamDeleted` and
    /// appends fail with [`Error::StreamDeleted`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use streamfold::{EncodedEvent, EventLog, MemoryLog, SliceStatus, StreamName};
    ///
    /// # async fn example() -> streamfold::Result<()> {
    /// let log = MemoryLog::new();
    /// let stream = StreamName::new("cart-1");
    /// log.append_to_stream(&stream, -1, &[EncodedEvent::new("Added", b"{}".to_vec())])
    ///     .await?;
    ///
    /// log.delete_stream(&stream);
    ///
    /// let slice = log.read_stream_forward(&stream, 0, 100).await?;
    /// assert_eq!(slice.status, SliceStatus::StreamDeleted);
    /// # Ok(())
    /// # }
    /// ```
    pub fn delete_stream(&self, stream: &StreamName) {
        let mut streams = self.streams.lock().expect("stream map poisoned");
        let entry = streams.entry(stream.as_str().to_string()).or_default();
        entry.deleted = true;
        entry.events.clear();
    }

    /// Returns the stream's current version, or −1 if it has never been
    /// written to.
    ///
    /// # Example
    ///
    /// ```rust
    /// use streamfold::{EncodedEvent, EventLog, MemoryLog, StreamName};
    ///
    /// # async fn example() -> streamfold::Result<()> {
    /// let log = MemoryLog::new();
    /// let stream = StreamName::new("cart-1");
    /// assert_eq!(log.stream_version(&stream), -1);
    ///
    /// log.append_to_stream(&stream, -1, &[EncodedEvent::new("Added", b"{}".to_vec())])
    ///     .await?;
    /// assert_eq!(log.stream_version(&stream), 0);
    /// # Ok(())
    /// # }
    /// ```
    pub fn stream_version(&self, stream: &StreamName) -> i64 {
        let streams = self.streams.lock().expect("stream map poisoned");
        streams
            .get(stream.as_str())
            .map_or(EMPTY_STREAM_VERSION, StreamEntry::version)
    }

    /// Makes the next `count` physical calls fail with a transport fault.
    ///
    /// # Use Case
    ///
    /// Exercising retry policies: inject fewer faults than the policy's
    /// attempt budget and the operation recovers; inject more and the
    /// transport error surfaces.
    ///
    /// # Example
    ///
    /// ```rust
    /// use streamfold::{EncodedEvent, EventLog, MemoryLog, StreamName};
    ///
    /// # async fn example() {
    /// let log = MemoryLog::new();
    /// log.inject_transport_faults(1);
    ///
    /// let stream = StreamName::new("cart-1");
    /// let err = log
    ///     .append_to_stream(&stream, -1, &[EncodedEvent::new("Added", b"{}".to_vec())])
    ///     .await
    ///     .unwrap_err();
    /// assert!(err.is_transient());
    /// # }
    /// ```
    pub fn inject_transport_faults(&self, count: usize) {
        self.pending_faults.store(count, Ordering::SeqCst);
    }

    fn take_fault(&self) -> Result<()> {
        let mut remaining = self.pending_faults.load(Ordering::SeqCst);
        while remaining > 0 {
            match self.pending_faults.compare_exchange(
                remaining,
                remaining - 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return Err(Error::transport("injected transport fault")),
                Err(current) => remaining = current,
            }
        }
        Ok(())
    }

    fn append_sync(
        &self,
        stream: &StreamName,
        expected_version: i64,
        events: &[EncodedEvent],
    ) -> Result<WriteResult> {
        self.take_fault()?;
        let mut streams = self.streams.lock().expect("stream map poisoned");
        let entry = streams.entry(stream.as_str().to_string()).or_default();

        if entry.deleted {
            return Err(Error::StreamDeleted {
                stream: stream.as_str().to_string(),
            });
        }

        let actual = entry.version();
        if expected_version != actual {
            return Err(Error::WrongExpectedVersion {
                stream: stream.as_str().to_string(),
                expected: expected_version,
                actual,
            });
        }

        entry.events.extend_from_slice(events);
        let log_position = self
            .global_pos
            .fetch_add(events.len(), Ordering::SeqCst) as i64
            + events.len() as i64;

        Ok(WriteResult {
            next_expected_version: entry.version(),
            log_position,
        })
    }

    fn read_forward_sync(&self, stream: &StreamName, from: i64, count: usize) -> Result<StreamSlice> {
        self.take_fault()?;
        let streams = self.streams.lock().expect("stream map poisoned");
        let entry = match streams.get(stream.as_str()) {
            None => return Ok(StreamSlice::not_found()),
            Some(entry) if entry.deleted => return Ok(StreamSlice::deleted()),
            Some(entry) => entry,
        };

        let len = entry.events.len();
        let lo = from.max(0) as usize;
        let hi = lo.saturating_add(count).min(len);

        let events = if lo < len {
            entry.events[lo..hi]
                .iter()
                .enumerate()
                .map(|(offset, event)| ResolvedEvent::new((lo + offset) as i64, event.clone()))
                .collect()
        } else {
            Vec::new()
        };

        let next_event_number = hi.max(lo).min(len) as i64;
        Ok(StreamSlice {
            status: SliceStatus::Success,
            events,
            last_event_number: len as i64 - 1,
            next_event_number,
            is_end_of_stream: hi >= len || lo >= len,
        })
    }

    fn read_backward_sync(
        &self,
        stream: &StreamName,
        from: StreamPosition,
        count: usize,
    ) -> Result<StreamSlice> {
        self.take_fault()?;
        let streams = self.streams.lock().expect("stream map poisoned");
        let entry = match streams.get(stream.as_str()) {
            None => return Ok(StreamSlice::not_found()),
            Some(entry) if entry.deleted => return Ok(StreamSlice::deleted()),
            Some(entry) => entry,
        };

        let last = entry.events.len() as i64 - 1;
        let start = match from {
            StreamPosition::End => last,
            StreamPosition::Exact(p) => p.min(last),
        };

        let mut events = Vec::new();
        if start >= 0 {
            let lo = (start - count as i64 + 1).max(0) as usize;
            for n in (lo..=start as usize).rev() {
                events.push(ResolvedEvent::new(n as i64, entry.events[n].clone()));
            }
        }

        let next_event_number = start - events.len() as i64;
        Ok(StreamSlice {
            status: SliceStatus::Success,
            events,
            last_event_number: last,
            next_event_number,
            is_end_of_stream: next_event_number < 0,
        })
    }
}

impl EventLog for MemoryLog {
    async fn append_to_stream(
        &self,
        stream: &StreamName,
        expected_version: i64,
        events: &[EncodedEvent],
    ) -> Result<WriteResult> {
        self.append_sync(stream, expected_version, events)
    }

    async fn read_stream_forward(
        &self,
        stream: &StreamName,
        from: i64,
        count: usize,
    ) -> Result<StreamSlice> {
        self.read_forward_sync(stream, from, count)
    }

    async fn read_stream_backward(
        &self,
        stream: &StreamName,
        from: StreamPosition,
        count: usize,
    ) -> Result<StreamSlice> {
        self.read_backward_sync(stream, from, count)
    }
}

// =============================================================================
// Tests
// =============================================================================

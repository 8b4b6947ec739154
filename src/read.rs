//! # Paged Stream Reads
//!
//! Three layers, leaves first:
//!
//! - [`BatchStream`] — a pull-based async iterator over slices in either
//!   direction. Handles slice status, the batch cap, and per-slice metric
//!   emission. Awaiting [`BatchStream::next`] is the only suspension point,
//!   so cancellation between batches is a plain future drop.
//! - [`load_forward`] — concatenates forward batches into one
//!   `(version, events)` pair.
//! - [`load_backward_until`] — streams backward batches and stops
//!   *inclusively* at the first compaction event, then reverses the freshly
//!   owned buffer into chronological order.
//!
//! A reader that knows compaction events exist prefers the backward path: a
//! single correctly-sized page typically contains `[compaction, …, head]`,
//! so a load costs one slice instead of `stream_length / batch_size`.

use std::time::Instant;

use crate::client::EventLog;
use crate::error::{Error, Result};
use crate::gateway::CompactionEventPredicate;
use crate::metrics::{report_batch, report_slice, Measurement, RetryPolicy};
use crate::types::{
    resolved_bytes, Direction, ResolvedEvent, SliceStatus, StreamName, StreamPosition,
    EMPTY_STREAM_VERSION,
};

// =============================================================================
// Batch Stream
// =============================================================================

/// Lazy slice iterator over one stream in one direction.
///
/// Yields `(first_batch_version, events)` items: only the **first** item
/// carries the stream's last event number; subsequent items carry `None`.
/// A missing stream yields exactly one `(Some(-1), [])` item.
pub(crate) struct BatchStream<'a, L> {
    log: &'a L,
    retry: &'a RetryPolicy,
    stream: &'a StreamName,
    direction: Direction,
    batch_size: usize,
    max_batches: Option<usize>,
    forward_pos: i64,
    backward_pos: StreamPosition,
    batch_index: usize,
    first: bool,
    done: bool,
}

impl<'a, L: EventLog> BatchStream<'a, L> {
    /// A forward stream starting at event number `from`.
    pub(crate) fn forward(
        log: &'a L,
        retry: &'a RetryPolicy,
        stream: &'a StreamName,
        batch_size: usize,
        max_batches: Option<usize>,
        from: i64,
    ) -> Self {
        Self {
            log,
            retry,
            stream,
            direction: Direction::Forward,
            batch_size,
            max_batches,
            forward_pos: from,
            backward_pos: StreamPosition::End,
            batch_index: 0,
            first: true,
            done: false,
        }
    }

    /// A backward stream starting at the latest event.
    pub(crate) fn backward(
        log: &'a L,
        retry: &'a RetryPolicy,
        stream: &'a StreamName,
        batch_size: usize,
        max_batches: Option<usize>,
    ) -> Self {
        Self {
            log,
            retry,
            stream,
            direction: Direction::Backward,
            batch_size,
            max_batches,
            forward_pos: 0,
            backward_pos: StreamPosition::End,
            batch_index: 0,
            first: true,
            done: false,
        }
    }

    /// Pulls the next batch, or `None` once the stream is exhausted.
    pub(crate) async fn next(&mut self) -> Result<Option<(Option<i64>, Vec<ResolvedEvent>)>> {
        if self.done {
            return Ok(None);
        }

        if let Some(max) = self.max_batches {
            if self.batch_index >= max {
                return Err(Error::BatchLimitExceeded {
                    stream: self.stream.as_str().to_string(),
                    max_batches: max,
                });
            }
        }

        let started = Instant::now();
        let (log, stream, batch_size) = (self.log, self.stream, self.batch_size);
        let slice = match self.direction {
            Direction::Forward => {
                let from = self.forward_pos;
                self.retry
                    .run("read", |_| log.read_stream_forward(stream, from, batch_size))
                    .await?
            }
            Direction::Backward => {
                let from = self.backward_pos;
                self.retry
                    .run("read", |_| log.read_stream_backward(stream, from, batch_size))
                    .await?
            }
        };

        match slice.status {
            SliceStatus::StreamDeleted => {
                self.done = true;
                Err(Error::StreamDeleted {
                    stream: self.stream.as_str().to_string(),
                })
            }
            SliceStatus::StreamNotFound => {
                self.done = true;
                report_slice(
                    self.stream,
                    self.direction,
                    self.batch_index,
                    self.batch_size,
                    Measurement {
                        bytes: 0,
                        count: 0,
                        elapsed: started.elapsed(),
                    },
                );
                Ok(Some((Some(EMPTY_STREAM_VERSION), Vec::new())))
            }
            SliceStatus::Success => {
                report_slice(
                    self.stream,
                    self.direction,
                    self.batch_index,
                    self.batch_size,
                    Measurement {
                        bytes: resolved_bytes(&slice.events),
                        count: slice.events.len(),
                        elapsed: started.elapsed(),
                    },
                );

                let version = if self.first {
                    Some(slice.last_event_number)
                } else {
                    None
                };
                self.first = false;

                match self.direction {
                    Direction::Forward => self.forward_pos = slice.next_event_number,
                    Direction::Backward => {
                        self.backward_pos = StreamPosition::Exact(slice.next_event_number)
                    }
                }
                self.batch_index += 1;
                if slice.is_end_of_stream {
                    self.done = true;
                }

                Ok(Some((version, slice.events)))
            }
        }
    }
}

// =============================================================================
// Forward Loader
// =============================================================================

/// Reads the stream forward from `from` and concatenates every batch.
///
/// Returns the stream version alongside the events in chronological order.
pub(crate) async fn load_forward<L: EventLog>(
    log: &L,
    retry: &RetryPolicy,
    stream: &StreamName,
    batch_size: usize,
    max_batches: Option<usize>,
    from: i64,
) -> Result<(i64, Vec<ResolvedEvent>)> {
    let started = Instant::now();
    let mut batches = BatchStream::forward(log, retry, stream, batch_size, max_batches, from);

    let mut version = None;
    let mut events: Vec<ResolvedEvent> = Vec::new();
    let mut slices = 0usize;
    while let Some((batch_version, batch)) = batches.next().await? {
        if version.is_none() {
            version = batch_version;
        }
        slices += 1;
        events.extend(batch);
    }

    let version = version.ok_or_else(|| Error::MissingVersion {
        stream: stream.as_str().to_string(),
    })?;

    report_batch(
        stream,
        Direction::Forward,
        slices,
        from,
        Measurement {
            bytes: resolved_bytes(&events),
            count: events.len(),
            elapsed: started.elapsed(),
        },
    );
    Ok((version, events))
}

// =============================================================================
// Backward-to-Compaction Loader
// =============================================================================

/// Reads the stream backward from the end, stopping inclusively at the
/// first compaction event, and returns the retained events in chronological
/// order.
///
/// When the compaction event falls inside a larger batch, the split between
/// retained and discarded bytes is logged — the signal for tuning
/// `batch_size` so a load fits one slice.
pub(crate) async fn load_backward_until<L: EventLog>(
    log: &L,
    retry: &RetryPolicy,
    stream: &StreamName,
    batch_size: usize,
    max_batches: Option<usize>,
    is_compaction_event: CompactionEventPredicate<'_>,
) -> Result<(i64, Vec<ResolvedEvent>)> {
    let started = Instant::now();
    let mut batches = BatchStream::backward(log, retry, stream, batch_size, max_batches);

    let mut version = None;
    let mut events: Vec<ResolvedEvent> = Vec::new();
    let mut slices = 0usize;
    'batches: while let Some((batch_version, batch)) = batches.next().await? {
        if version.is_none() {
            version = batch_version;
        }
        slices += 1;

        let batch_len = batch.len();
        let batch_bytes = resolved_bytes(&batch);
        let mut used_bytes = 0usize;
        let mut taken = 0usize;
        for event in batch {
            used_bytes += event.size();
            taken += 1;
            let stop = is_compaction_event(&event);
            events.push(event);
            if stop {
                if taken < batch_len {
                    tracing::info!(
                        stream = %stream,
                        used_bytes,
                        residual_bytes = batch_bytes - used_bytes,
                        used_count = taken,
                        residual_count = batch_len - taken,
                        "compaction boundary split a batch"
                    );
                }
                break 'batches;
            }
        }
    }

    let version = version.ok_or_else(|| Error::MissingVersion {
        stream: stream.as_str().to_string(),
    })?;

    // the buffer is freshly owned, so reversing in place is safe
    events.reverse();

    report_batch(
        stream,
        Direction::Backward,
        slices,
        version,
        Measurement {
            bytes: resolved_bytes(&events),
            count: events.len(),
            elapsed: started.elapsed(),
        },
    );
    Ok((version, events))
}

// =============================================================================
// Tests
// =============================================================================

//! # Stream Token Algebra
//!
//! A [`Token`] is the opaque handle a load returns and a sync presents. It
//! carries the stream version plus enough compaction bookkeeping to answer
//! two questions cheaply on the next call:
//!
//! 1. Should the next write include a fresh compaction event to keep reads
//!    within one batch? (`batch_capacity_limit`, the headroom.)
//! 2. Which read strategy is cheapest on the next load? A token that knows a
//!    compaction event exists lets the reader page backward and stop early.
//!
//! ## Invariants
//!
//! - `stream_version ≥ −1`; −1 denotes an empty stream.
//! - `compaction_event_number ≤ stream_version` whenever present.
//! - `batch_capacity_limit` is present iff the token was constructed under a
//!   compaction strategy.
//! - Tokens are immutable (`Copy`); every state transition produces a new
//!   token via one of the constructors below.
//!
//! ## Capacity Formula
//!
//! With anchor `s = compaction_event_number` (−1 when no compaction event
//! has been observed) and `pending` events accepted but not reflected in the
//! anchor arithmetic:
//!
//! ```text
//! capacity = max(0, batch_size − pending − (stream_version − s + 1))
//! ```
//!
//! The subtracted term is the number of events a reader must traverse to
//! reach the anchor; what remains of the batch is headroom.

use serde::{Deserialize, Serialize};

use crate::types::EMPTY_STREAM_VERSION;

/// Opaque stream handle: version plus compaction bookkeeping.
///
/// Returned by every load and sync; presented on the next sync as the
/// optimistic-concurrency baseline. Serde-derived so upstream caches can
/// persist it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    stream_version: i64,
    compaction_event_number: Option<i64>,
    batch_capacity_limit: Option<i64>,
}

impl Token {
    /// Token for a stream read without a compaction strategy.
    ///
    /// No compaction bookkeeping: both optional fields are absent.
    pub fn non_compacting(stream_version: i64) -> Self {
        Self {
            stream_version,
            compaction_event_number: None,
            batch_capacity_limit: None,
        }
    }

    /// Token for a compaction-aware stream in which no compaction event has
    /// been observed.
    ///
    /// The whole prefix is assumed live, so the anchor is the empty-stream
    /// sentinel.
    pub fn uncompacted(batch_size: usize, stream_version: i64) -> Self {
        Self::of_compaction_anchor(None, 0, batch_size, stream_version)
    }

    /// Token anchored on a compaction event observed during a load.
    ///
    /// # Example
    ///
    /// ```rust
    /// use streamfold::Token;
    ///
    /// // stream [.., compaction@5, e6, e7, e8] under a batch size of 10:
    /// // four live events leave room for six more
    /// let token = Token::from_compaction_event(5, 10, 8);
    /// assert_eq!(token.batch_capacity_limit(), Some(6));
    /// ```
    pub fn from_compaction_event(
        compaction_event_number: i64,
        batch_size: usize,
        stream_version: i64,
    ) -> Self {
        Self::of_compaction_anchor(Some(compaction_event_number), 0, batch_size, stream_version)
    }

    /// Token carrying forward a previous token's anchor across `added_count`
    /// new events.
    ///
    /// # Example
    ///
    /// ```rust
    /// use streamfold::Token;
    ///
    /// let loaded = Token::from_compaction_event(5, 10, 8);
    /// let after_write = Token::carried_forward(loaded, 1, 10, 9);
    /// assert_eq!(after_write.compaction_event_number(), Some(5));
    /// assert_eq!(after_write.batch_capacity_limit(), Some(4));
    /// ```
    pub fn carried_forward(
        previous: Token,
        added_count: usize,
        batch_size: usize,
        stream_version: i64,
    ) -> Self {
        Self::of_compaction_anchor(
            previous.compaction_event_number,
            added_count,
            batch_size,
            stream_version,
        )
    }

    /// Token anchored on a compaction event inside a batch that was just
    /// written.
    ///
    /// The event's stream-relative number is derived from the pre-write
    /// version and the event's index within the written batch.
    pub fn from_pending_compaction(
        previous_stream_version: i64,
        index_in_batch: usize,
        batch_size: usize,
        stream_version: i64,
    ) -> Self {
        let anchor = previous_stream_version + 1 + index_in_batch as i64;
        Self::of_compaction_anchor(Some(anchor), 0, batch_size, stream_version)
    }

    fn of_compaction_anchor(
        compaction_event_number: Option<i64>,
        pending: usize,
        batch_size: usize,
        stream_version: i64,
    ) -> Self {
        let anchor = compaction_event_number.unwrap_or(EMPTY_STREAM_VERSION);
        let capacity = batch_size as i64 - pending as i64 - (stream_version - anchor + 1);
        Self {
            stream_version,
            compaction_event_number,
            batch_capacity_limit: Some(capacity.max(0)),
        }
    }

    /// Highest event number observed or written; −1 for an empty stream.
    pub fn stream_version(&self) -> i64 {
        self.stream_version
    }

    /// Event number of the most recent known in-stream compaction event.
    pub fn compaction_event_number(&self) -> Option<i64> {
        self.compaction_event_number
    }

    /// Events that may still be appended before the next compaction event is
    /// advisable. Absent when the token was constructed without a compaction
    /// strategy.
    pub fn batch_capacity_limit(&self) -> Option<i64> {
        self.batch_capacity_limit
    }

    /// True when a write of `pending_events` would overflow the remaining
    /// capacity — the caller's cue to include a fresh compaction event in
    /// its next batch. Always false for non-compacting tokens.
    ///
    /// # Example
    ///
    /// ```rust
    /// use streamfold::Token;
    ///
    /// let token = Token::from_compaction_event(5, 10, 8); // capacity 6
    /// assert!(!token.should_snapshot(6));
    /// assert!(token.should_snapshot(7));
    /// ```
    pub fn should_snapshot(&self, pending_events: usize) -> bool {
        match self.batch_capacity_limit {
            Some(capacity) => pending_events as i64 > capacity,
            None => false,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

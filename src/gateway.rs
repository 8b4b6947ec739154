//! # Store Gateway
//!
//! [`StoreGateway`] glues the loaders, the write primitive, and the token
//! constructors over one event-log client handle. All fields are read-only
//! after construction, so a gateway is safe for concurrent use across
//! streams; concurrent calls on the *same* stream race, and the conflict
//! outcome of [`try_sync`](StoreGateway::try_sync) is the only
//! synchronization guarantee. Serializing per stream (e.g. a keyed cache
//! with single-flight) is upstream's job.
//!
//! ## Token Construction Rules
//!
//! | Operation | No strategy | Compaction event seen | Otherwise |
//! |---|---|---|---|
//! | `load_batched` | non-compacting | anchored on last match | uncompacted |
//! | `load_backwards_stopping_at_compaction_event` | — | anchored on first event | uncompacted |
//! | `load_from_token` | non-compacting | anchored (reset) | carried forward |
//! | `try_sync` | non-compacting | pending-compaction anchor | carried forward |

use crate::client::EventLog;
use crate::error::Result;
use crate::metrics::RetryPolicy;
use crate::read::{load_backward_until, load_forward};
use crate::token::Token;
use crate::types::{EncodedEvent, ResolvedEvent, StreamName};
use crate::write::{write_events, AppendOutcome};

/// Predicate identifying compaction events among resolved (read) events.
pub type CompactionEventPredicate<'a> = &'a (dyn Fn(&ResolvedEvent) -> bool + Send + Sync);

/// Predicate identifying compaction events by their wire type tag.
pub type CompactionTypePredicate<'a> = &'a (dyn Fn(&str) -> bool + Send + Sync);

// =============================================================================
// Batching Policy
// =============================================================================

/// Paging configuration for stream reads.
///
/// # Why a Batch Size?
///
/// Every physical read fetches at most `batch_size` events, so a single
/// load costs `ceil(stream_length / batch_size)` round trips — and under a
/// compaction strategy the batch size doubles as the token's capacity
/// yardstick: headroom is measured against one batch.
///
/// # Example
///
/// ```rust
/// use streamfold::BatchingPolicy;
///
/// let batching = BatchingPolicy::new(200).with_max_batches(10);
/// assert_eq!(batching.batch_size(), 200);
/// assert_eq!(batching.max_batches(), Some(10));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BatchingPolicy {
    batch_size: usize,
    max_batches: Option<usize>,
}

impl BatchingPolicy {
    /// Default events per slice read.
    pub const DEFAULT_BATCH_SIZE: usize = 500;

    /// A policy reading `batch_size` events per slice with no batch cap.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            max_batches: None,
        }
    }

    /// Caps a single load at `max_batches` slices. Exceeding the cap before
    /// end-of-stream fails the load with
    /// [`Error::BatchLimitExceeded`](crate::Error::BatchLimitExceeded).
    pub fn with_max_batches(mut self, max_batches: usize) -> Self {
        self.max_batches = Some(max_batches);
        self
    }

    /// Events per slice read.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// The batch cap, if one is configured.
    pub fn max_batches(&self) -> Option<usize> {
        self.max_batches
    }
}

impl Default for BatchingPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BATCH_SIZE)
    }
}

// =============================================================================
// Sync Result
// =============================================================================

/// Outcome of a gateway sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewaySyncResult {
    /// The append landed; the token reflects the written events.
    Written(Token),

    /// The stream moved past the presented token. Catch up with
    /// [`StoreGateway::load_from_token`] and retry.
    Conflict,
}

// =============================================================================
// Gateway
// =============================================================================

/// Adapter core: loaders, writer, and token construction over one client.
///
/// # Thread Safety
///
/// All fields are read-only after construction: one gateway may serve any
/// number of concurrent tasks. Calls on the *same* stream race; the
/// conflict outcome of [`try_sync`](StoreGateway::try_sync) is the only
/// synchronization guarantee, and serializing writers per stream is
/// upstream's job.
pub struct StoreGateway<L> {
    log: L,
    batching: BatchingPolicy,
    read_retry: RetryPolicy,
    write_retry: RetryPolicy,
}

impl<L: EventLog> StoreGateway<L> {
    /// Creates a gateway with single-attempt retry policies.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::time::Duration;
    ///
    /// use streamfold::{BatchingPolicy, MemoryLog, RetryPolicy, StoreGateway};
    ///
    /// let gateway = StoreGateway::new(MemoryLog::new(), BatchingPolicy::new(500))
    ///     .with_read_retry(RetryPolicy::new(3, Duration::from_millis(10)));
    /// assert_eq!(gateway.batching().batch_size(), 500);
    /// ```
    pub fn new(log: L, batching: BatchingPolicy) -> Self {
        Self {
            log,
            batching,
            read_retry: RetryPolicy::none(),
            write_retry: RetryPolicy::none(),
        }
    }

    /// Sets the retry policy wrapping each physical slice read.
    pub fn with_read_retry(mut self, policy: RetryPolicy) -> Self {
        self.read_retry = policy;
        self
    }

    /// Sets the retry policy wrapping each append.
    pub fn with_write_retry(mut self, policy: RetryPolicy) -> Self {
        self.write_retry = policy;
        self
    }

    /// The gateway's paging configuration.
    pub fn batching(&self) -> BatchingPolicy {
        self.batching
    }

    /// Loads the whole stream forward from event 0.
    ///
    /// With a predicate, the token anchors on the **last** matching event in
    /// the slice; without one, the token carries no compaction bookkeeping.
    ///
    /// # Returns
    ///
    /// The stream's token and its events in chronological order. A stream
    /// that has never been written to yields an empty slice and a token at
    /// version −1.
    ///
    /// # Example
    ///
    /// ```rust
    /// use streamfold::{BatchingPolicy, MemoryLog, StoreGateway, StreamName};
    ///
    /// # async fn example() -> streamfold::Result<()> {
    /// let gateway = StoreGateway::new(MemoryLog::new(), BatchingPolicy::new(100));
    /// let stream = StreamName::new("cart-1");
    ///
    /// let (token, events) = gateway.load_batched(&stream, None).await?;
    /// assert_eq!(token.stream_version(), -1); // nothing written yet
    /// assert!(events.is_empty());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn load_batched(
        &self,
        stream: &StreamName,
        is_compaction_event: Option<CompactionEventPredicate<'_>>,
    ) -> Result<(Token, Vec<ResolvedEvent>)> {
        let (version, events) = load_forward(
            &self.log,
            &self.read_retry,
            stream,
            self.batching.batch_size,
            self.batching.max_batches,
            0,
        )
        .await?;

        let token = match is_compaction_event {
            None => Token::non_compacting(version),
            Some(predicate) => match events.iter().rev().find(|e| predicate(e)) {
                Some(compaction) => Token::from_compaction_event(
                    compaction.event_number,
                    self.batching.batch_size,
                    version,
                ),
                None => Token::uncompacted(self.batching.batch_size, version),
            },
        };
        Ok((token, events))
    }

    /// Loads the stream tail backward, stopping inclusively at the first
    /// compaction event, and returns it in chronological order.
    ///
    /// # Why Backward?
    ///
    /// A correctly-sized page typically contains `[compaction, …, head]`,
    /// so the load costs one slice regardless of how long the stream's
    /// compacted prefix has grown.
    ///
    /// # Example
    ///
    /// ```rust
    /// use streamfold::{
    ///     BatchingPolicy, EncodedEvent, EventLog, MemoryLog, ResolvedEvent, StoreGateway,
    ///     StreamName,
    /// };
    ///
    /// # async fn example() -> streamfold::Result<()> {
    /// let log = MemoryLog::new();
    /// let stream = StreamName::new("cart-1");
    /// log.append_to_stream(&stream, -1, &[
    ///     EncodedEvent::new("Added", b"{}".to_vec()),
    ///     EncodedEvent::new("Snapshotted", b"{}".to_vec()),
    ///     EncodedEvent::new("Added", b"{}".to_vec()),
    /// ]).await?;
    ///
    /// let gateway = StoreGateway::new(log, BatchingPolicy::new(10));
    /// let is_snapshot = |e: &ResolvedEvent| e.event.event_type == "Snapshotted";
    /// let (token, events) = gateway
    ///     .load_backwards_stopping_at_compaction_event(&stream, &is_snapshot)
    ///     .await?;
    ///
    /// // only the snapshot and what follows it were retained
    /// assert_eq!(token.compaction_event_number(), Some(1));
    /// assert_eq!(events.len(), 2);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn load_backwards_stopping_at_compaction_event(
        &self,
        stream: &StreamName,
        is_compaction_event: CompactionEventPredicate<'_>,
    ) -> Result<(Token, Vec<ResolvedEvent>)> {
        let (version, events) = load_backward_until(
            &self.log,
            &self.read_retry,
            stream,
            self.batching.batch_size,
            self.batching.max_batches,
            is_compaction_event,
        )
        .await?;

        let token = match events.first() {
            Some(first) if is_compaction_event(first) => Token::from_compaction_event(
                first.event_number,
                self.batching.batch_size,
                version,
            ),
            _ => Token::uncompacted(self.batching.batch_size, version),
        };
        Ok((token, events))
    }

    /// Loads only the events appended after `token`, producing the successor
    /// token.
    ///
    /// A compaction event in the tail resets the anchor; otherwise the
    /// previous token's anchor is carried forward across the newly read
    /// events.
    ///
    /// # Use Case
    ///
    /// Incremental catch-up: after a conflict, or when refreshing a cached
    /// `(token, state)` pair, only the unseen tail is read and folded.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    ///
    /// use streamfold::{
    ///     BatchingPolicy, EncodedEvent, EventLog, MemoryLog, StoreGateway, StreamName,
    /// };
    ///
    /// # async fn example() -> streamfold::Result<()> {
    /// let log = Arc::new(MemoryLog::new());
    /// let stream = StreamName::new("cart-1");
    /// let gateway = StoreGateway::new(log.clone(), BatchingPolicy::new(10));
    ///
    /// log.append_to_stream(&stream, -1, &[EncodedEvent::new("Added", b"{}".to_vec())])
    ///     .await?;
    /// let (stale, _) = gateway.load_batched(&stream, None).await?;
    ///
    /// // another writer appends behind this token's back
    /// log.append_to_stream(&stream, 0, &[EncodedEvent::new("Added", b"{}".to_vec())])
    ///     .await?;
    ///
    /// let (fresh, tail) = gateway.load_from_token(&stream, stale, None).await?;
    /// assert_eq!(fresh.stream_version(), 1);
    /// assert_eq!(tail.len(), 1); // only the event the token had not seen
    /// # Ok(())
    /// # }
    /// ```
    pub async fn load_from_token(
        &self,
        stream: &StreamName,
        token: Token,
        is_compaction_event: Option<CompactionEventPredicate<'_>>,
    ) -> Result<(Token, Vec<ResolvedEvent>)> {
        let (version, events) = load_forward(
            &self.log,
            &self.read_retry,
            stream,
            self.batching.batch_size,
            self.batching.max_batches,
            token.stream_version() + 1,
        )
        .await?;

        let next = match is_compaction_event {
            None => Token::non_compacting(version),
            Some(predicate) => match events.iter().rev().find(|e| predicate(e)) {
                Some(compaction) => Token::from_compaction_event(
                    compaction.event_number,
                    self.batching.batch_size,
                    version,
                ),
                None => Token::carried_forward(
                    token,
                    events.len(),
                    self.batching.batch_size,
                    version,
                ),
            },
        };
        Ok((next, events))
    }

    /// Appends `events` with `expected_version = token.stream_version()`.
    ///
    /// On success the new token is constructed from the written batch: a
    /// compaction event in the batch (last match wins) anchors the token at
    /// its freshly assigned event number; otherwise the previous anchor is
    /// carried forward.
    ///
    /// # Returns
    ///
    /// [`GatewaySyncResult::Written`] with the successor token, or
    /// [`GatewaySyncResult::Conflict`] when the stream moved past the
    /// presented token — an expected outcome, not an error.
    ///
    /// # Example
    ///
    /// ```rust
    /// use streamfold::{
    ///     BatchingPolicy, EncodedEvent, GatewaySyncResult, MemoryLog, StoreGateway, StreamName,
    ///     Token,
    /// };
    ///
    /// # async fn example() -> streamfold::Result<()> {
    /// let gateway = StoreGateway::new(MemoryLog::new(), BatchingPolicy::new(10));
    /// let stream = StreamName::new("cart-1");
    ///
    /// let token = Token::non_compacting(-1); // the stream is empty
    /// let events = [EncodedEvent::new("Added", b"{}".to_vec())];
    /// let outcome = gateway.try_sync(&stream, token, &events, None).await?;
    ///
    /// assert!(matches!(
    ///     outcome,
    ///     GatewaySyncResult::Written(next) if next.stream_version() == 0
    /// ));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn try_sync(
        &self,
        stream: &StreamName,
        token: Token,
        events: &[EncodedEvent],
        is_compaction_event_type: Option<CompactionTypePredicate<'_>>,
    ) -> Result<GatewaySyncResult> {
        let outcome = write_events(
            &self.log,
            &self.write_retry,
            stream,
            token.stream_version(),
            events,
        )
        .await?;

        let result = match outcome {
            AppendOutcome::Conflict => GatewaySyncResult::Conflict,
            AppendOutcome::Written(written) => {
                let version = written.next_expected_version;
                let next = match is_compaction_event_type {
                    None => Token::non_compacting(version),
                    Some(predicate) => {
                        match events.iter().rposition(|e| predicate(&e.event_type)) {
                            Some(index) => Token::from_pending_compaction(
                                token.stream_version(),
                                index,
                                self.batching.batch_size,
                                version,
                            ),
                            None => Token::carried_forward(
                                token,
                                events.len(),
                                self.batching.batch_size,
                                version,
                            ),
                        }
                    }
                };
                GatewaySyncResult::Written(next)
            }
        };
        Ok(result)
    }
}

// =============================================================================
// Tests
// =============================================================================

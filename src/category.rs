//! # Category: Codec and Fold over the Gateway
//!
//! [`StoreCategory`] is the layer domain code talks to. It owns a gateway,
//! a codec, a fold, and an initial state, and exposes the canonical
//! load/sync shape:
//!
//! - [`load`](StoreCategory::load) picks the read strategy — backward to the
//!   last compaction event when a strategy is configured, forward from zero
//!   otherwise — decodes what the codec recognizes, and folds from the
//!   initial state.
//! - [`try_sync`](StoreCategory::try_sync) encodes and appends under
//!   optimistic concurrency. A conflict hands back a *deferred* resync: a
//!   future that, only when awaited, catches up from the stale token and
//!   re-folds onto the caller's state. Abandoning the retry costs nothing.
//!
//! No per-stream state lives here: the caller holds `(token, state)` and
//! passes it back. A category is immutable after construction and safe to
//! share.
//!
//! Unknown event types are **silently skipped** during decode. This is a
//! forward-compatibility contract: an old consumer must be able to fold a
//! stream to which newer producers have appended event types it has never
//! heard of.

use futures::future::BoxFuture;
use std::future::Future;

use crate::client::EventLog;
use crate::codec::EventCodec;
use crate::error::Result;
use crate::gateway::{GatewaySyncResult, StoreGateway};
use crate::token::Token;
use crate::types::{EncodedEvent, ResolvedEvent, StreamName};

/// A fold from state and a batch of events to the successor state.
pub type Fold<E, S> = fn(S, &[E]) -> S;

// =============================================================================
// Compaction Strategy
// =============================================================================

/// How the category recognizes in-stream compaction events.
///
/// Both variants act on the wire `event_type` tag; the adapter never needs
/// to decode an event to classify it.
#[derive(Debug, Clone)]
pub enum CompactionStrategy {
    /// Events whose type tag equals the given string are compaction events.
    EventType(String),

    /// Events whose type tag satisfies the predicate are compaction events.
    Predicate(fn(&str) -> bool),
}

impl CompactionStrategy {
    /// True when `event_type` names a compaction event.
    pub fn matches_type(&self, event_type: &str) -> bool {
        match self {
            CompactionStrategy::EventType(name) => event_type == name,
            CompactionStrategy::Predicate(predicate) => predicate(event_type),
        }
    }

    /// True when the resolved event is a compaction event.
    pub fn matches(&self, event: &ResolvedEvent) -> bool {
        self.matches_type(&event.event.event_type)
    }
}

// =============================================================================
// Sync Outcome
// =============================================================================

/// Deferred conflict recovery: awaiting it catches up from the stale token
/// and re-folds the tail onto the state the caller already held.
pub type Resync<'a, S> = BoxFuture<'a, Result<(Token, S)>>;

/// Outcome of a category sync.
pub enum SyncOutcome<'a, S> {
    /// The events landed; the state already reflects them.
    Written(Token, S),

    /// Another writer got there first. Await the resync for a fresh
    /// `(token, state)` to retry from, or drop it to abandon.
    Conflict(Resync<'a, S>),
}

impl<'a, S: std::fmt::Debug> std::fmt::Debug for SyncOutcome<'a, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncOutcome::Written(token, state) => {
                f.debug_tuple("Written").field(token).field(state).finish()
            }
            SyncOutcome::Conflict(_) => f.debug_tuple("Conflict").field(&"<resync future>").finish(),
        }
    }
}

// =============================================================================
// Category
// =============================================================================

/// Event-sourced category: gateway + codec + fold + compaction strategy.
///
/// # Thread Safety
///
/// Immutable after construction; one category may serve any number of
/// concurrent tasks. Writers racing on the same stream are resolved by the
/// conflict outcome of [`try_sync`](StoreCategory::try_sync).
pub struct StoreCategory<L, C: EventCodec, S> {
    gateway: StoreGateway<L>,
    codec: C,
    fold: Fold<C::Event, S>,
    initial: S,
    compaction: Option<CompactionStrategy>,
}

impl<L, C: EventCodec, S> StoreCategory<L, C, S> {
    /// Creates a category. Prefer
    /// [`CategoryBuilder`](crate::CategoryBuilder) for the named-step form.
    pub fn new(
        gateway: StoreGateway<L>,
        codec: C,
        fold: Fold<C::Event, S>,
        initial: S,
        compaction: Option<CompactionStrategy>,
    ) -> Self {
        Self {
            gateway,
            codec,
            fold,
            initial,
            compaction,
        }
    }

    /// The underlying gateway.
    pub fn gateway(&self) -> &StoreGateway<L> {
        &self.gateway
    }
}

impl<L, C, S> StoreCategory<L, C, S>
where
    L: EventLog,
    C: EventCodec + Sync,
    C::Event: Send + Sync,
    S: Clone + Send + Sync,
{
    /// Loads the stream and folds it into state.
    ///
    /// # Returns
    ///
    /// The stream's token and the fold of every decodable event over the
    /// initial state. An empty or missing stream yields the initial state
    /// and a token at version −1.
    ///
    /// # Example
    ///
    /// ```rust
    /// use streamfold::{
    ///     BatchingPolicy, CategoryBuilder, EncodedEvent, EventCodec, MemoryLog, StoreGateway,
    ///     StreamName,
    /// };
    ///
    /// #[derive(Clone)]
    /// enum CounterEvent {
    ///     Incremented,
    /// }
    ///
    /// struct CounterCodec;
    ///
    /// impl EventCodec for CounterCodec {
    ///     type Event = CounterEvent;
    ///
    ///     fn encode(&self, _event: &CounterEvent) -> EncodedEvent {
    ///         EncodedEvent::new("Incremented", Vec::new())
    ///     }
    ///
    ///     fn try_decode(&self, event: &EncodedEvent) -> Option<CounterEvent> {
    ///         match event.event_type.as_str() {
    ///             "Incremented" => Some(CounterEvent::Incremented),
    ///             _ => None,
    ///         }
    ///     }
    /// }
    ///
    /// fn fold(count: u64, events: &[CounterEvent]) -> u64 {
    ///     count + events.len() as u64
    /// }
    ///
    /// # async fn example() -> streamfold::Result<()> {
    /// let gateway = StoreGateway::new(MemoryLog::new(), BatchingPolicy::new(100));
    /// let category = CategoryBuilder::new(gateway, CounterCodec, fold, 0).build();
    ///
    /// let stream = StreamName::new("counter-1");
    /// let (token, count) = category.load(&stream).await?;
    /// assert_eq!(token.stream_version(), -1);
    /// assert_eq!(count, 0);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn load(&self, stream: &StreamName) -> Result<(Token, S)> {
        let (token, events) = match &self.compaction {
            None => self.gateway.load_batched(stream, None).await?,
            Some(strategy) => {
                let predicate = |e: &ResolvedEvent| strategy.matches(e);
                self.gateway
                    .load_backwards_stopping_at_compaction_event(stream, &predicate)
                    .await?
            }
        };
        Ok((token, self.fold_resolved(self.initial.clone(), &events)))
    }

    /// Appends `events` against `origin`'s token.
    ///
    /// `Written` carries the successor token and the state with the new
    /// events folded in. `Conflict` carries the deferred resync.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use streamfold::{
    /// #     BatchingPolicy, CategoryBuilder, EncodedEvent, EventCodec, MemoryLog, StoreGateway,
    /// #     StreamName,
    /// # };
    /// use streamfold::SyncOutcome;
    /// # #[derive(Clone)]
    /// # enum CounterEvent {
    /// #     Incremented,
    /// # }
    /// # struct CounterCodec;
    /// # impl EventCodec for CounterCodec {
    /// #     type Event = CounterEvent;
    /// #     fn encode(&self, _event: &CounterEvent) -> EncodedEvent {
    /// #         EncodedEvent::new("Incremented", Vec::new())
    /// #     }
    /// #     fn try_decode(&self, event: &EncodedEvent) -> Option<CounterEvent> {
    /// #         match event.event_type.as_str() {
    /// #             "Incremented" => Some(CounterEvent::Incremented),
    /// #             _ => None,
    /// #         }
    /// #     }
    /// # }
    /// # fn fold(count: u64, events: &[CounterEvent]) -> u64 {
    /// #     count + events.len() as u64
    /// # }
    /// # async fn example() -> streamfold::Result<()> {
    /// let gateway = StoreGateway::new(MemoryLog::new(), BatchingPolicy::new(100));
    /// let category = CategoryBuilder::new(gateway, CounterCodec, fold, 0).build();
    /// let stream = StreamName::new("counter-1");
    ///
    /// let origin = category.load(&stream).await?;
    /// match category
    ///     .try_sync(&stream, origin, vec![CounterEvent::Incremented])
    ///     .await?
    /// {
    ///     SyncOutcome::Written(token, count) => {
    ///         assert_eq!(token.stream_version(), 0);
    ///         assert_eq!(count, 1);
    ///     }
    ///     SyncOutcome::Conflict(resync) => {
    ///         // catch up, then retry from the fresh pair
    ///         let (_token, _count) = resync.await?;
    ///     }
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn try_sync<'a>(
        &'a self,
        stream: &'a StreamName,
        origin: (Token, S),
        events: Vec<C::Event>,
    ) -> Result<SyncOutcome<'a, S>> {
        let (token, state) = origin;
        let encoded: Vec<EncodedEvent> = events.iter().map(|e| self.codec.encode(e)).collect();

        let result = match &self.compaction {
            None => self.gateway.try_sync(stream, token, &encoded, None).await?,
            Some(strategy) => {
                let predicate = |t: &str| strategy.matches_type(t);
                self.gateway
                    .try_sync(stream, token, &encoded, Some(&predicate))
                    .await?
            }
        };

        match result {
            GatewaySyncResult::Written(next) => {
                Ok(SyncOutcome::Written(next, (self.fold)(state, &events)))
            }
            GatewaySyncResult::Conflict => {
                let resync: Resync<'a, S> = Box::pin(async move {
                    let (next, tail) = match &self.compaction {
                        None => self.gateway.load_from_token(stream, token, None).await?,
                        Some(strategy) => {
                            let predicate = |e: &ResolvedEvent| strategy.matches(e);
                            self.gateway
                                .load_from_token(stream, token, Some(&predicate))
                                .await?
                        }
                    };
                    Ok((next, self.fold_resolved(state, &tail)))
                });
                Ok(SyncOutcome::Conflict(resync))
            }
        }
    }

    fn fold_resolved(&self, state: S, events: &[ResolvedEvent]) -> S {
        // unknown event types are dropped here, before the fold ever sees them
        let decoded: Vec<C::Event> = events
            .iter()
            .filter_map(|e| self.codec.try_decode(&e.event))
            .collect();
        (self.fold)(state, &decoded)
    }
}

// =============================================================================
// Upstream Contract
// =============================================================================

/// The codec-agnostic contract a caller façade orchestrates against.
///
/// [`StoreCategory`] implements it; upstream code generic over
/// `Category<Event, State>` never sees the codec or the client type.
pub trait Category<Event, State> {
    /// Loads the stream and folds it into state.
    fn load<'a>(
        &'a self,
        stream: &'a StreamName,
    ) -> impl Future<Output = Result<(Token, State)>> + Send + 'a;

    /// Appends `events` against `origin`'s token.
    fn try_sync<'a>(
        &'a self,
        stream: &'a StreamName,
        origin: (Token, State),
        events: Vec<Event>,
    ) -> impl Future<Output = Result<SyncOutcome<'a, State>>> + Send + 'a;
}

impl<L, C, S> Category<C::Event, S> for StoreCategory<L, C, S>
where
    L: EventLog,
    C: EventCodec + Sync,
    C::Event: Send + Sync,
    S: Clone + Send + Sync,
{
    fn load<'a>(
        &'a self,
        stream: &'a StreamName,
    ) -> impl Future<Output = Result<(Token, S)>> + Send + 'a {
        StoreCategory::load(self, stream)
    }

    fn try_sync<'a>(
        &'a self,
        stream: &'a StreamName,
        origin: (Token, S),
        events: Vec<C::Event>,
    ) -> impl Future<Output = Result<SyncOutcome<'a, S>>> + Send + 'a {
        StoreCategory::try_sync(self, stream, origin, events)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_strategy_matches_exact_tag() {
        let strategy = CompactionStrategy::EventType("Snapshotted".to_string());
        assert!(strategy.matches_type("Snapshotted"));
        assert!(!strategy.matches_type("Added"));
    }

    #[test]
    fn predicate_strategy_applies_the_function() {
        fn snapshotty(t: &str) -> bool {
            t.starts_with("Snapshot")
        }
        let strategy = CompactionStrategy::Predicate(snapshotty);
        assert!(strategy.matches_type("SnapshotV2"));
        assert!(!strategy.matches_type("Added"));
    }
}

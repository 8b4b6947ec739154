//! # Category Builder
//!
//! Named-step construction of a [`StoreCategory`]: gateway, codec, fold and
//! initial state up front, compaction strategy opt-in.

use crate::category::{CompactionStrategy, Fold, StoreCategory};
use crate::codec::EventCodec;
use crate::gateway::StoreGateway;

/// Builds a [`StoreCategory`].
///
/// # Example
///
/// ```rust
/// # use streamfold::{
/// #     BatchingPolicy, EncodedEvent, EventCodec, MemoryLog, StoreGateway,
/// # };
/// use streamfold::{CategoryBuilder, CompactionStrategy};
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
/// let gateway = StoreGateway::new(MemoryLog::new(), BatchingPolicy::new(100));
/// let category = CategoryBuilder::new(gateway, CounterCodec, fold, 0)
///     .compaction(CompactionStrategy::EventType("Snapshotted".into()))
///     .build();
/// # let _ = category;
/// ```
pub struct CategoryBuilder<L, C: EventCodec, S> {
    gateway: StoreGateway<L>,
    codec: C,
    fold: Fold<C::Event, S>,
    initial: S,
    compaction: Option<CompactionStrategy>,
}

impl<L, C: EventCodec, S> CategoryBuilder<L, C, S> {
    /// Starts a builder with no compaction strategy.
    pub fn new(
        gateway: StoreGateway<L>,
        codec: C,
        fold: Fold<C::Event, S>,
        initial: S,
    ) -> Self {
        Self {
            gateway,
            codec,
            fold,
            initial,
            compaction: None,
        }
    }

    /// Enables compaction-aware loads and token bookkeeping.
    ///
    /// With a strategy set, loads page backward and stop at the last
    /// compaction event, and tokens carry capacity headroom.
    pub fn compaction(mut self, strategy: CompactionStrategy) -> Self {
        self.compaction = Some(strategy);
        self
    }

    /// Finishes construction.
    pub fn build(self) -> StoreCategory<L, C, S> {
        StoreCategory::new(
            self.gateway,
            self.codec,
            self.fold,
            self.initial,
            self.compaction,
        )
    }
}

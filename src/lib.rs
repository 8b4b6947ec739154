//! # Streamfold - Event Stream Storage Adapter
//!
//! Streamfold sits between application domain logic and an append-only event
//! log. It loads the current state of an aggregate (a named event stream),
//! lets the caller apply a fold to derive state, and writes new events back
//! under optimistic concurrency — detecting and surfacing conflicts so the
//! caller can retry.
//!
//! The wire I/O is delegated to an [`EventLog`] client. What lives here is
//! the part that makes event-sourced reads and writes cheap and safe:
//!
//! - **Token algebra**: every load and sync returns a [`Token`] encoding the
//!   stream version plus compaction bookkeeping — how much headroom remains
//!   before the next compaction event is advisable, and which read strategy
//!   is cheapest next time.
//! - **Paged loads**: forward from zero, or backward stopping at the last
//!   compaction event so a well-sized page serves the whole load.
//! - **Optimistic sync**: version-checked appends where a conflict is a
//!   result, not an error, and recovery is a deferred incremental catch-up.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     CategoryBuilder / Category                  │
//! │              (codec, fold, compaction strategy)                 │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         StoreGateway                            │
//! │        load_batched · load_backwards · load_from_token          │
//! │                     try_sync · Token rules                      │
//! └──────────────┬──────────────────────────────┬───────────────────┘
//!                │                              │
//!                ▼                              ▼
//!      ┌──────────────────┐           ┌──────────────────┐
//!      │   BatchStream    │           │  write primitive │
//!      │  (paged reads)   │           │ (append+conflict)│
//!      └────────┬─────────┘           └────────┬─────────┘
//!               │        retry + metrics       │
//!               └──────────────┬───────────────┘
//!                              ▼
//!                    ┌──────────────────┐
//!                    │     EventLog     │
//!                    │ (external store) │
//!                    └──────────────────┘
//! ```
//!
//! ## Core Invariants
//!
//! 1. **Version monotonicity**: each successful sync advances the token's
//!    stream version by exactly the number of events written.
//! 2. **Chronological results**: loaded events are always ascending by event
//!    number, regardless of read direction.
//! 3. **Conflict is not an error**: losing an optimistic race yields a
//!    resyncable result; only deleted streams, exhausted batch caps, and
//!    transport faults are errors.
//! 4. **Statelessness**: the core keeps no per-stream state; the caller
//!    holds `(token, state)` and passes it back.
//! 5. **Silent skip**: event types unknown to the codec never reach the
//!    fold.
//!
//! ## Example
//!
//! ```rust,ignore
//! use streamfold::{
//!     BatchingPolicy, CategoryBuilder, CompactionStrategy, MemoryLog, StoreGateway,
//!     StreamName, SyncOutcome,
//! };
//!
//! let gateway = StoreGateway::new(MemoryLog::new(), BatchingPolicy::new(100));
//! let category = CategoryBuilder::new(gateway, codec, fold, State::default())
//!     .compaction(CompactionStrategy::EventType("Snapshotted".into()))
//!     .build();
//!
//! let stream = StreamName::new("cart-1");
//! let (token, state) = category.load(&stream).await?;
//! match category.try_sync(&stream, (token, state), decide(&state)).await? {
//!     SyncOutcome::Written(token, state) => { /* done */ }
//!     SyncOutcome::Conflict(resync) => {
//!         let (token, state) = resync.await?; // catch up, then retry
//!     }
//! }
//! ```

/// Error types for adapter operations.
pub mod error;

/// Domain types: stream names, events, slices, positions, write results.
pub mod types;

/// The event codec contract (encode / try_decode with silent skip).
pub mod codec;

/// The physical event-log client contract.
pub mod client;

/// In-memory event log for embedded use and tests.
pub mod memory;

/// Structured metric emission and the retry policy.
pub mod metrics;

/// Stream token algebra: version, compaction anchor, capacity headroom.
pub mod token;

/// Paged slice reads: the batch stream and the two loaders.
mod read;

/// The version-checked append primitive.
mod write;

/// The gateway: loaders, writer, and token construction over one client.
pub mod gateway;

/// The category: codec and fold threading, sync outcomes, compaction
/// strategies.
pub mod category;

/// Named-step category construction.
pub mod builder;

pub use builder::CategoryBuilder;
pub use category::{Category, CompactionStrategy, Fold, Resync, StoreCategory, SyncOutcome};
pub use client::EventLog;
pub use codec::EventCodec;
pub use error::{Error, Result};
pub use gateway::{
    BatchingPolicy, CompactionEventPredicate, CompactionTypePredicate, GatewaySyncResult,
    StoreGateway,
};
pub use memory::MemoryLog;
pub use metrics::RetryPolicy;
pub use token::Token;
pub use types::{
    Direction, EncodedEvent, ResolvedEvent, SliceStatus, StreamName, StreamPosition, StreamSlice,
    WriteResult, EMPTY_STREAM_VERSION,
};

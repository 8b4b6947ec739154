//! # Domain Types for Streamfold
//!
//! This module defines the core types used throughout the adapter: stream
//! names, wire events, resolved (read) events, slices, and write results.
//!
//! ## Design Philosophy: Newtypes for Safety
//!
//! `StreamName` wraps a `String` so a function expecting a stream name can't
//! silently accept an arbitrary string. Event numbers stay as plain `i64`
//! because the token algebra does real arithmetic on them (version − anchor,
//! version + 1) and the `-1` sentinel participates in those formulas.
//!
//! ## Invariants
//!
//! - Event numbers are zero-based, stream-relative, and strictly increasing.
//! - A stream version is the highest event number in the stream, or
//!   [`EMPTY_STREAM_VERSION`] (−1) when the stream has no events.
//! - Within a slice, events are ordered by the read direction: ascending for
//!   forward reads, descending for backward reads.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The version reported for a stream with no events.
///
/// Presenting this as `expected_version` on an append asserts "the stream
/// must not exist yet".
pub const EMPTY_STREAM_VERSION: i64 = -1;

// =============================================================================
// Stream Identification
// =============================================================================

/// A human-readable identifier for an event stream.
///
/// In event sourcing, a stream holds the ordered events of a single
/// aggregate: `"cart-1"`, `"account-checking-999"`, and so on.
///
/// # Rust Pattern: Newtype
///
/// `StreamName` wraps a `String`, so a function expecting a stream name
/// cannot silently accept an arbitrary string, and validation can be added
/// later without touching call sites.
///
/// # Example
///
/// ```rust
/// use streamfold::StreamName;
///
/// let stream = StreamName::new("cart-1");
/// assert_eq!(stream.as_str(), "cart-1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamName(String);

impl StreamName {
    /// Creates a new stream name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the string representation of this stream name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StreamName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for StreamName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// =============================================================================
// Events
// =============================================================================

/// A wire event: what the codec produces on encode and consumes on decode.
///
/// The adapter is payload-agnostic — `data` and `metadata` are opaque bytes.
/// The `event_type` tag is the one piece of structure the core inspects: the
/// compaction strategy matches on it, and the codec uses it to select a
/// decoder (unknown tags are skipped).
///
/// # Why Bytes?
///
/// The serialization format is the codec's choice (JSON, protobuf,
/// messagepack, ...). Keeping the core payload-agnostic is what lets one
/// gateway serve any domain.
///
/// # Example
///
/// ```rust
/// use streamfold::EncodedEvent;
///
/// let event = EncodedEvent::new("Added", br#"{"item":"a"}"#.to_vec())
///     .with_metadata(b"corr-42".to_vec());
/// assert_eq!(event.size(), 19); // payload plus metadata
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedEvent {
    /// Classification tag, e.g. `"Added"` or `"Snapshotted"`.
    pub event_type: String,

    /// The event payload. The codec chooses the serialization format.
    pub data: Vec<u8>,

    /// Optional metadata (correlation ids, causation ids, ...). Opaque to
    /// the core; counted as zero bytes when absent.
    pub metadata: Option<Vec<u8>>,
}

impl EncodedEvent {
    /// Creates an event with a type tag and payload, no metadata.
    pub fn new(event_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            event_type: event_type.into(),
            data: data.into(),
            metadata: None,
        }
    }

    /// Adds metadata to this event (builder pattern).
    pub fn with_metadata(mut self, metadata: impl Into<Vec<u8>>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }

    /// Payload plus metadata size in bytes; `None` metadata counts as zero.
    pub fn size(&self) -> usize {
        self.data.len() + self.metadata.as_ref().map_or(0, Vec::len)
    }
}

/// A stored event with its position information, as returned by reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEvent {
    /// Zero-based chronological index within the stream.
    pub event_number: i64,

    /// The wire event.
    pub event: EncodedEvent,

    /// Position in the store's global log, when the client reports one.
    pub log_position: Option<i64>,
}

impl ResolvedEvent {
    /// Creates a resolved event without a global log position.
    pub fn new(event_number: i64, event: EncodedEvent) -> Self {
        Self {
            event_number,
            event,
            log_position: None,
        }
    }

    /// Byte size of the underlying wire event.
    pub fn size(&self) -> usize {
        self.event.size()
    }
}

/// Total byte size of a group of resolved events.
pub(crate) fn resolved_bytes(events: &[ResolvedEvent]) -> usize {
    events.iter().map(ResolvedEvent::size).sum()
}

/// Total byte size of a group of encoded events.
pub(crate) fn encoded_bytes(events: &[EncodedEvent]) -> usize {
    events.iter().map(EncodedEvent::size).sum()
}

// =============================================================================
// Slices
// =============================================================================

/// Outcome classification of a slice read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceStatus {
    /// The read succeeded; the slice's events hold the page.
    Success,

    /// The stream has never been written to. Loads treat this as an empty
    /// stream with synthetic version −1.
    StreamNotFound,

    /// The stream has been tombstoned. Fatal: surfaced as
    /// [`Error::StreamDeleted`](crate::Error::StreamDeleted).
    StreamDeleted,
}

/// One page of a stream read, in either direction.
#[derive(Debug, Clone)]
pub struct StreamSlice {
    /// Read outcome. The remaining fields are meaningful only on `Success`.
    pub status: SliceStatus,

    /// Events in this page, ordered by the read direction.
    pub events: Vec<ResolvedEvent>,

    /// The stream's highest event number at the time of the read.
    pub last_event_number: i64,

    /// Where the next read in the same direction should start.
    pub next_event_number: i64,

    /// True when there is nothing further to read in this direction.
    pub is_end_of_stream: bool,
}

impl StreamSlice {
    /// A `StreamNotFound` slice. Position fields carry the empty-stream
    /// sentinel so loaders can surface a synthetic version of −1.
    pub fn not_found() -> Self {
        Self {
            status: SliceStatus::StreamNotFound,
            events: Vec::new(),
            last_event_number: EMPTY_STREAM_VERSION,
            next_event_number: EMPTY_STREAM_VERSION,
            is_end_of_stream: true,
        }
    }

    /// A `StreamDeleted` slice.
    pub fn deleted() -> Self {
        Self {
            status: SliceStatus::StreamDeleted,
            events: Vec::new(),
            last_event_number: EMPTY_STREAM_VERSION,
            next_event_number: EMPTY_STREAM_VERSION,
            is_end_of_stream: true,
        }
    }
}

/// Start position for a backward read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPosition {
    /// Start at a specific event number.
    Exact(i64),

    /// Start at the latest event.
    End,
}

/// Read direction through a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "Forward"),
            Direction::Backward => write!(f, "Backward"),
        }
    }
}

// =============================================================================
// Write Results
// =============================================================================

/// The result of a successful append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteResult {
    /// The stream version after the write: the event number of the last
    /// event just written.
    pub next_expected_version: i64,

    /// Position of the write in the store's global log.
    pub log_position: i64,
}

// =============================================================================
// Tests
// =============================================================================

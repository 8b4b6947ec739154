//! # Event Codec Contract
//!
//! The codec maps domain events to and from wire events. The adapter never
//! interprets payloads itself; it only threads bytes through.
//!
//! ## Forward Compatibility: Silent Skip
//!
//! `try_decode` returns `Option` rather than `Result`: an event type the
//! codec does not recognize yields `None` and the event is dropped from the
//! fold input. This is a compatibility contract, not an error path — an old
//! consumer must be able to read a stream to which newer producers have
//! appended event types it has never heard of.

use crate::types::EncodedEvent;

/// Maps domain events to wire events and back.
///
/// # Example
///
/// ```rust
/// use streamfold::{EncodedEvent, EventCodec};
///
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
/// ```
pub trait EventCodec {
    /// The domain event type this codec handles.
    type Event;

    /// Serializes a domain event, assigning its wire `event_type` tag.
    fn encode(&self, event: &Self::Event) -> EncodedEvent;

    /// Deserializes a wire event. `None` means the event type is unknown to
    /// this codec and the event is skipped.
    fn try_decode(&self, event: &EncodedEvent) -> Option<Self::Event>;
}

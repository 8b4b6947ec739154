#![allow(dead_code)]

use std::sync::{Arc, Once};

use serde::{Deserialize, Serialize};
use streamfold::{
    BatchingPolicy, CategoryBuilder, CompactionStrategy, EncodedEvent, EventCodec, EventLog,
    MemoryLog, StoreCategory, StoreGateway, StreamName,
};

static INIT_TRACING: Once = Once::new();

/// Installs the fmt subscriber once per test binary so the adapter's
/// structured events show up in test output. `RUST_LOG` controls the filter
/// (defaults to `info`).
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// The wire tag of the cart's compaction event.
pub const SNAPSHOT_TYPE: &str = "Snapshotted";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CartEvent {
    Added { item: String },
    Removed { item: String },
    Snapshotted { items: Vec<String> },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    pub items: Vec<String>,
}

pub fn fold(mut cart: Cart, events: &[CartEvent]) -> Cart {
    for event in events {
        match event {
            CartEvent::Added { item } => cart.items.push(item.clone()),
            CartEvent::Removed { item } => cart.items.retain(|i| i != item),
            CartEvent::Snapshotted { items } => cart.items = items.clone(),
        }
    }
    cart
}

/// JSON codec over the cart events. Unknown wire tags decode to `None`.
pub struct CartCodec;

impl EventCodec for CartCodec {
    type Event = CartEvent;

    fn encode(&self, event: &CartEvent) -> EncodedEvent {
        let event_type = match event {
            CartEvent::Added { .. } => "Added",
            CartEvent::Removed { .. } => "Removed",
            CartEvent::Snapshotted { .. } => SNAPSHOT_TYPE,
        };
        EncodedEvent::new(
            event_type,
            serde_json::to_vec(event).expect("cart events serialize"),
        )
    }

    fn try_decode(&self, event: &EncodedEvent) -> Option<CartEvent> {
        match event.event_type.as_str() {
            "Added" | "Removed" | "Snapshotted" => serde_json::from_slice(&event.data).ok(),
            _ => None,
        }
    }
}

pub type CartCategory = StoreCategory<Arc<MemoryLog>, CartCodec, Cart>;

pub fn snapshot_strategy() -> CompactionStrategy {
    CompactionStrategy::EventType(SNAPSHOT_TYPE.to_string())
}

pub fn plain_category(log: Arc<MemoryLog>, batch_size: usize) -> CartCategory {
    plain_category_with(log, BatchingPolicy::new(batch_size))
}

pub fn plain_category_with(log: Arc<MemoryLog>, batching: BatchingPolicy) -> CartCategory {
    CategoryBuilder::new(StoreGateway::new(log, batching), CartCodec, fold, Cart::default()).build()
}

pub fn snapshotting_category(log: Arc<MemoryLog>, batch_size: usize) -> CartCategory {
    CategoryBuilder::new(
        StoreGateway::new(log, BatchingPolicy::new(batch_size)),
        CartCodec,
        fold,
        Cart::default(),
    )
    .compaction(snapshot_strategy())
    .build()
}

pub fn added(item: &str) -> CartEvent {
    CartEvent::Added {
        item: item.to_string(),
    }
}

pub fn snapshotted(items: &[&str]) -> CartEvent {
    CartEvent::Snapshotted {
        items: items.iter().map(|i| i.to_string()).collect(),
    }
}

/// Appends domain events directly through the client, bypassing the
/// category, starting at the stream's current version.
pub async fn seed(log: &MemoryLog, stream: &StreamName, events: &[CartEvent]) {
    let version = log.stream_version(stream);
    let encoded: Vec<EncodedEvent> = events.iter().map(|e| CartCodec.encode(e)).collect();
    log.append_to_stream(stream, version, &encoded)
        .await
        .expect("seed append");
}

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    added, plain_category, plain_category_with, seed, snapshotting_category, CartCodec, fold, Cart,
    SNAPSHOT_TYPE,
};
use streamfold::{
    BatchingPolicy, CategoryBuilder, Error, MemoryLog, ResolvedEvent, RetryPolicy, StoreGateway,
    StreamName, Token, EMPTY_STREAM_VERSION,
};

#[tokio::test]
async fn load_fails_when_the_batch_cap_is_too_small_for_the_stream() {
    common::init_tracing();
    let log = Arc::new(MemoryLog::new());
    let stream = StreamName::new("cart-1");
    seed(
        &log,
        &stream,
        &[added("a"), added("b"), added("c"), added("d"), added("e")],
    )
    .await;

    let capped = plain_category_with(log.clone(), BatchingPolicy::new(2).with_max_batches(1));
    let err = capped.load(&stream).await.unwrap_err();
    assert!(matches!(
        err,
        Error::BatchLimitExceeded { max_batches: 1, .. }
    ));

    // the same stream under a sufficient cap loads fine
    let roomy = plain_category_with(log, BatchingPolicy::new(2).with_max_batches(3));
    let (token, state) = roomy.load(&stream).await.unwrap();
    assert_eq!(token.stream_version(), 4);
    assert_eq!(state.items.len(), 5);
}

#[tokio::test]
async fn deleted_streams_fail_loads_and_syncs() {
    common::init_tracing();
    let log = Arc::new(MemoryLog::new());
    let stream = StreamName::new("cart-1");
    seed(&log, &stream, &[added("a")]).await;

    let category = plain_category(log.clone(), 100);
    let origin = category.load(&stream).await.unwrap();

    log.delete_stream(&stream);

    let load_err = category.load(&stream).await.unwrap_err();
    assert!(matches!(load_err, Error::StreamDeleted { .. }));

    let sync_err = category
        .try_sync(&stream, origin, vec![added("b")])
        .await
        .unwrap_err();
    assert!(matches!(sync_err, Error::StreamDeleted { .. }));
}

#[tokio::test]
async fn read_retry_policy_rides_out_transient_faults() {
    common::init_tracing();
    let log = Arc::new(MemoryLog::new());
    let stream = StreamName::new("cart-1");
    seed(&log, &stream, &[added("a"), added("b")]).await;

    let gateway = StoreGateway::new(log.clone(), BatchingPolicy::new(100))
        .with_read_retry(RetryPolicy::new(3, Duration::ZERO));
    let category = CategoryBuilder::new(gateway, CartCodec, fold, Cart::default()).build();

    log.inject_transport_faults(2);
    let (token, state) = category.load(&stream).await.unwrap();
    assert_eq!(token.stream_version(), 1);
    assert_eq!(state.items, vec!["a", "b"]);
}

#[tokio::test]
async fn without_a_retry_policy_transient_faults_surface() {
    common::init_tracing();
    let log = Arc::new(MemoryLog::new());
    let stream = StreamName::new("cart-1");
    seed(&log, &stream, &[added("a")]).await;

    let category = plain_category(log.clone(), 100);
    log.inject_transport_faults(1);

    let err = category.load(&stream).await.unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn missing_stream_under_a_compaction_strategy_gets_uncompacted_headroom() {
    common::init_tracing();
    let category = snapshotting_category(Arc::new(MemoryLog::new()), 10);
    let stream = StreamName::new("cart-1");

    let (token, state) = category.load(&stream).await.unwrap();
    assert_eq!(token.stream_version(), EMPTY_STREAM_VERSION);
    assert_eq!(token.compaction_event_number(), None);
    // empty anchor: 10 − (−1 + 2) = 9
    assert_eq!(token.batch_capacity_limit(), Some(9));
    assert!(state.items.is_empty());
}

#[tokio::test]
async fn load_from_token_with_no_new_events_returns_the_same_token() {
    common::init_tracing();
    let log = Arc::new(MemoryLog::new());
    let stream = StreamName::new("cart-1");
    seed(
        &log,
        &stream,
        &[
            added("a"),
            common::snapshotted(&["s"]),
            added("b"),
        ],
    )
    .await;

    let gateway = StoreGateway::new(log, BatchingPolicy::new(10));
    let is_snap = |e: &ResolvedEvent| e.event.event_type == SNAPSHOT_TYPE;

    let (token, _) = gateway
        .load_backwards_stopping_at_compaction_event(&stream, &is_snap)
        .await
        .unwrap();

    let (caught_up, events) = gateway
        .load_from_token(&stream, token, Some(&is_snap))
        .await
        .unwrap();
    assert!(events.is_empty());
    assert_eq!(caught_up, token);
}

#[tokio::test]
async fn load_from_token_folds_only_the_tail() {
    common::init_tracing();
    let log = Arc::new(MemoryLog::new());
    let stream = StreamName::new("cart-1");
    seed(&log, &stream, &[added("a"), added("b")]).await;

    let gateway = StoreGateway::new(log.clone(), BatchingPolicy::new(10));
    let (token, _) = gateway.load_batched(&stream, None).await.unwrap();

    seed(&log, &stream, &[added("c"), added("d")]).await;

    let (caught_up, events) = gateway.load_from_token(&stream, token, None).await.unwrap();
    assert_eq!(caught_up.stream_version(), 3);
    let numbers: Vec<i64> = events.iter().map(|e| e.event_number).collect();
    assert_eq!(numbers, vec![2, 3]);
}

#[test]
fn tokens_survive_a_serde_round_trip() {
    common::init_tracing();
    let token = Token::from_compaction_event(5, 10, 8);
    let json = serde_json::to_string(&token).unwrap();
    let back: Token = serde_json::from_str(&json).unwrap();
    assert_eq!(back, token);

    let plain = Token::non_compacting(3);
    let json = serde_json::to_string(&plain).unwrap();
    let back: Token = serde_json::from_str(&json).unwrap();
    assert_eq!(back, plain);
}

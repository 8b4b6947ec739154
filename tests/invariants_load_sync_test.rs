mod common;

use std::sync::Arc;

use common::{added, plain_category, seed, Cart, CartEvent};
use streamfold::{EncodedEvent, EventLog, MemoryLog, StreamName, SyncOutcome, EMPTY_STREAM_VERSION};

#[tokio::test]
async fn empty_stream_loads_the_initial_state() {
    common::init_tracing();
    let category = plain_category(Arc::new(MemoryLog::new()), 100);
    let stream = StreamName::new("cart-1");

    let (token, state) = category.load(&stream).await.unwrap();

    assert_eq!(token.stream_version(), EMPTY_STREAM_VERSION);
    assert_eq!(token.compaction_event_number(), None);
    assert_eq!(token.batch_capacity_limit(), None);
    assert_eq!(state, Cart::default());
}

#[tokio::test]
async fn first_sync_writes_from_the_empty_token() {
    common::init_tracing();
    let log = Arc::new(MemoryLog::new());
    let category = plain_category(log.clone(), 100);
    let stream = StreamName::new("cart-1");

    let origin = category.load(&stream).await.unwrap();
    let outcome = category
        .try_sync(&stream, origin, vec![added("a"), added("b")])
        .await
        .unwrap();

    let SyncOutcome::Written(token, state) = outcome else {
        panic!("first write on an empty stream cannot conflict");
    };
    assert_eq!(token.stream_version(), 1);
    assert_eq!(token.compaction_event_number(), None);
    assert_eq!(state.items, vec!["a", "b"]);
}

#[tokio::test]
async fn load_after_sync_round_trips_the_state() {
    common::init_tracing();
    let log = Arc::new(MemoryLog::new());
    let category = plain_category(log.clone(), 3);
    let stream = StreamName::new("cart-1");

    let origin = category.load(&stream).await.unwrap();
    let SyncOutcome::Written(written_token, written_state) = category
        .try_sync(
            &stream,
            origin,
            vec![
                added("a"),
                added("b"),
                CartEvent::Removed {
                    item: "a".to_string(),
                },
                added("c"),
            ],
        )
        .await
        .unwrap()
    else {
        panic!("sole writer cannot conflict");
    };

    // a fresh load (paged: batch size 3 over 4 events) must agree with the
    // state the sync folded locally
    let (loaded_token, loaded_state) = category.load(&stream).await.unwrap();
    assert_eq!(loaded_token.stream_version(), written_token.stream_version());
    assert_eq!(loaded_state, written_state);
    assert_eq!(loaded_state.items, vec!["b", "c"]);
}

#[tokio::test]
async fn successive_syncs_advance_the_version_by_event_count() {
    common::init_tracing();
    let log = Arc::new(MemoryLog::new());
    let category = plain_category(log.clone(), 100);
    let stream = StreamName::new("cart-1");

    let mut origin = category.load(&stream).await.unwrap();
    let mut expected_version = EMPTY_STREAM_VERSION;

    for batch in [vec![added("a")], vec![added("b"), added("c")], vec![added("d")]] {
        let batch_len = batch.len() as i64;
        let SyncOutcome::Written(token, state) =
            category.try_sync(&stream, origin, batch).await.unwrap()
        else {
            panic!("sole writer cannot conflict");
        };
        expected_version += batch_len;
        assert_eq!(token.stream_version(), expected_version);
        origin = (token, state);
    }
}

#[tokio::test]
async fn unknown_event_types_never_reach_the_fold() {
    common::init_tracing();
    let log = Arc::new(MemoryLog::new());
    let stream = StreamName::new("cart-1");

    seed(&log, &stream, &[added("a")]).await;
    log.append_to_stream(
        &stream,
        0,
        &[EncodedEvent::new("Exotic", b"\"not a cart event\"".to_vec())],
    )
    .await
    .unwrap();
    seed(&log, &stream, &[added("b")]).await;

    let category = plain_category(log.clone(), 100);
    let (token, state) = category.load(&stream).await.unwrap();

    // the unknown event occupies event number 1 but is invisible to the fold
    assert_eq!(token.stream_version(), 2);
    assert_eq!(state.items, vec!["a", "b"]);
}

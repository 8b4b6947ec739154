//! Property tests over the token algebra.

use proptest::prelude::*;
use streamfold::Token;

proptest! {
    #[test]
    fn anchored_capacity_matches_the_formula(
        batch_size in 1usize..512,
        anchor in 0i64..4096,
        tail in 0i64..4096,
    ) {
        let version = anchor + tail;
        let token = Token::from_compaction_event(anchor, batch_size, version);

        let expected = (batch_size as i64 - (version - anchor + 1)).max(0);
        prop_assert_eq!(token.batch_capacity_limit(), Some(expected));
        prop_assert_eq!(token.compaction_event_number(), Some(anchor));
        prop_assert!(anchor <= token.stream_version());
    }

    #[test]
    fn uncompacted_capacity_uses_the_empty_anchor(
        batch_size in 1usize..512,
        version in -1i64..4096,
    ) {
        let token = Token::uncompacted(batch_size, version);

        let expected = (batch_size as i64 - (version + 2)).max(0);
        prop_assert_eq!(token.batch_capacity_limit(), Some(expected));
        prop_assert_eq!(token.compaction_event_number(), None);
    }

    #[test]
    fn carry_forward_keeps_the_anchor_and_charges_for_pending(
        batch_size in 1usize..512,
        anchor in 0i64..1024,
        tail in 0i64..1024,
        added in 0usize..256,
    ) {
        let version = anchor + tail;
        let loaded = Token::from_compaction_event(anchor, batch_size, version);
        let next_version = version + added as i64;
        let carried = Token::carried_forward(loaded, added, batch_size, next_version);

        let expected =
            (batch_size as i64 - added as i64 - (next_version - anchor + 1)).max(0);
        prop_assert_eq!(carried.batch_capacity_limit(), Some(expected));
        prop_assert_eq!(carried.compaction_event_number(), Some(anchor));
        prop_assert_eq!(carried.stream_version(), next_version);
    }

    #[test]
    fn pending_compaction_anchor_stays_within_the_new_version(
        batch_size in 1usize..512,
        previous_version in -1i64..1024,
        (written, index) in (1usize..64).prop_flat_map(|w| (Just(w), 0usize..w)),
    ) {
        let version = previous_version + written as i64;
        let token =
            Token::from_pending_compaction(previous_version, index, batch_size, version);

        let anchor = token.compaction_event_number().unwrap();
        prop_assert_eq!(anchor, previous_version + 1 + index as i64);
        prop_assert!(anchor >= 0);
        prop_assert!(anchor <= token.stream_version());
        prop_assert!(token.batch_capacity_limit().unwrap() >= 0);
    }

    #[test]
    fn capacity_is_never_negative(
        batch_size in 1usize..64,
        anchor in 0i64..4096,
        tail in 0i64..4096,
        added in 0usize..4096,
    ) {
        let version = anchor + tail;
        let loaded = Token::from_compaction_event(anchor, batch_size, version);
        prop_assert!(loaded.batch_capacity_limit().unwrap() >= 0);

        let carried =
            Token::carried_forward(loaded, added, batch_size, version + added as i64);
        prop_assert!(carried.batch_capacity_limit().unwrap() >= 0);
    }

    #[test]
    fn non_compacting_tokens_never_request_snapshots(
        version in -1i64..4096,
        pending in 0usize..4096,
    ) {
        let token = Token::non_compacting(version);
        prop_assert_eq!(token.batch_capacity_limit(), None);
        prop_assert!(!token.should_snapshot(pending));
    }
}

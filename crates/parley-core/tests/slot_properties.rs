//! Property-based tests for the slot set validator.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use parley_core::domain::{SlotSet, SlotSetError, MAX_SLOTS};
use proptest::prelude::*;

/// Fixed submission instant so generated offsets are reproducible.
fn submission_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).single().expect("valid timestamp")
}

fn slot_config() -> ProptestConfig {
    ProptestConfig {
        cases: 128,
        max_shrink_iters: 256,
        ..ProptestConfig::default()
    }
}

/// Strategy for 1-3 distinct future offsets, in seconds.
fn future_offsets(max_len: usize) -> impl Strategy<Value = Vec<i64>> {
    proptest::collection::hash_set(1_i64..=31_536_000, 1..=max_len)
        .prop_map(|set| set.into_iter().collect())
        .prop_shuffle()
}

fn to_slots(now: DateTime<Utc>, offsets: &[i64]) -> Vec<DateTime<Utc>> {
    offsets
        .iter()
        .map(|secs| now + Duration::seconds(*secs))
        .collect()
}

proptest! {
    #![proptest_config(slot_config())]

    /// Valid sets come back unchanged, in the caller's order.
    #[test]
    fn prop_valid_sets_preserved_verbatim(offsets in future_offsets(MAX_SLOTS)) {
        let now = submission_time();
        let slots = to_slots(now, &offsets);

        let set = SlotSet::validate(slots.clone(), now).expect("valid set accepted");
        prop_assert_eq!(set.as_slice(), slots.as_slice());
        prop_assert_eq!(set.len(), slots.len());
    }

    /// Validation is pure: identical inputs give identical results.
    #[test]
    fn prop_validation_idempotent(offsets in future_offsets(MAX_SLOTS)) {
        let now = submission_time();
        let slots = to_slots(now, &offsets);

        let first = SlotSet::validate(slots.clone(), now);
        let second = SlotSet::validate(slots, now);
        prop_assert_eq!(first, second);
    }

    /// More than MAX_SLOTS entries is rejected as TooMany, regardless of
    /// anything else wrong with the set.
    #[test]
    fn prop_oversized_sets_rejected(offsets in proptest::collection::vec(-1_000_000_i64..=1_000_000, 4..=8)) {
        let now = submission_time();
        let count = offsets.len();
        let slots = to_slots(now, &offsets);

        prop_assert_eq!(
            SlotSet::validate(slots, now),
            Err(SlotSetError::TooMany { count })
        );
    }

    /// Any entry at or before the submission instant is rejected as Past.
    #[test]
    fn prop_past_slot_rejected(
        offsets in future_offsets(MAX_SLOTS - 1),
        past_secs in 0_i64..=31_536_000,
        position in 0_usize..MAX_SLOTS,
    ) {
        let now = submission_time();
        let mut slots = to_slots(now, &offsets);
        let past = now - Duration::seconds(past_secs);
        slots.insert(position.min(slots.len()), past);

        let result = SlotSet::validate(slots, now);
        prop_assert!(
            matches!(result, Err(SlotSetError::Past { .. })),
            "expected Past, got {:?}",
            result
        );
    }

    /// A repeated timestamp is rejected as Duplicate (when nothing with
    /// higher precedence is wrong).
    #[test]
    fn prop_duplicate_rejected(offsets in future_offsets(MAX_SLOTS - 1)) {
        let now = submission_time();
        let mut slots = to_slots(now, &offsets);
        let dup = slots[0];
        slots.push(dup);

        prop_assert_eq!(
            SlotSet::validate(slots, now),
            Err(SlotSetError::Duplicate { slot: dup })
        );
    }
}

#[test]
fn empty_set_rejected_first() {
    assert_eq!(
        SlotSet::validate(vec![], submission_time()),
        Err(SlotSetError::Empty)
    );
}

//! Slot set validation.
//!
//! A slot set is the bundle of candidate start times currently on the
//! table, owned by whichever party is serving. Validation is a pure
//! function of the candidate list and the submission instant: same inputs,
//! same result, no side effects.
//!
//! Caller-supplied order is preserved. Display order of candidates is
//! meaningful to the responder, so the validator never sorts
//! chronologically.
//!
//! Violations are reported by the first rule broken, in a fixed
//! precedence: empty, too many, past slot, duplicate.

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of candidate slots in one proposal.
pub const MAX_SLOTS: usize = 3;

// ============================================================================
// ERRORS
// ============================================================================

/// Errors from slot set validation, in precedence order.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SlotSetError {
    /// No slots were proposed
    #[error("slot set is empty")]
    Empty,

    /// More than `MAX_SLOTS` slots were proposed
    #[error("too many slots: {count} (maximum {MAX_SLOTS})")]
    TooMany {
        /// Number of slots submitted
        count: usize,
    },

    /// A slot is not strictly in the future
    #[error("slot {slot} is not after submission time {now}")]
    Past {
        /// First offending slot
        slot: DateTime<Utc>,
        /// Submission instant the slot was compared against
        now: DateTime<Utc>,
    },

    /// The same timestamp appears more than once
    #[error("duplicate slot: {slot}")]
    Duplicate {
        /// First repeated slot
        slot: DateTime<Utc>,
    },
}

// ============================================================================
// SLOT SET
// ============================================================================

/// A validated, ordered set of 1 to 3 distinct future timestamps.
///
/// Can only be constructed through [`SlotSet::validate`], so holding a
/// `SlotSet` is proof the structural invariants held at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotSet(Vec<DateTime<Utc>>);

impl SlotSet {
    /// Validate a candidate slot list against the submission instant.
    ///
    /// Order is preserved; nothing is normalized away except the
    /// possibility of an invalid set existing at all.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule, checked in this order:
    /// [`SlotSetError::Empty`], [`SlotSetError::TooMany`],
    /// [`SlotSetError::Past`], [`SlotSetError::Duplicate`].
    pub fn validate(
        slots: Vec<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Self, SlotSetError> {
        if slots.is_empty() {
            return Err(SlotSetError::Empty);
        }
        if slots.len() > MAX_SLOTS {
            return Err(SlotSetError::TooMany { count: slots.len() });
        }
        if let Some(past) = slots.iter().find(|slot| **slot <= now) {
            return Err(SlotSetError::Past { slot: *past, now });
        }
        if let Some(dup) = first_duplicate(&slots) {
            return Err(SlotSetError::Duplicate { slot: dup });
        }
        Ok(Self(slots))
    }

    /// Whether the given timestamp is one of the proposed slots.
    #[must_use]
    pub fn contains(&self, slot: DateTime<Utc>) -> bool {
        self.0.contains(&slot)
    }

    /// The slots in their original proposal order.
    #[must_use]
    pub fn as_slice(&self) -> &[DateTime<Utc>] {
        &self.0
    }

    /// Number of proposed slots (1 to 3).
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false` for a validated set; kept for clippy's `len` pairing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// First timestamp that repeats an earlier entry, if any.
fn first_duplicate(slots: &[DateTime<Utc>]) -> Option<DateTime<Utc>> {
    slots
        .iter()
        .enumerate()
        .find(|(i, slot)| slots[..*i].contains(slot))
        .map(|(_, slot)| *slot)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn base() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_valid_set_preserved_in_order() {
        let now = base();
        // Deliberately out of chronological order
        let slots = vec![
            now + Duration::hours(3),
            now + Duration::hours(1),
            now + Duration::hours(2),
        ];

        let set = SlotSet::validate(slots.clone(), now).expect("valid set");
        assert_eq!(set.as_slice(), slots.as_slice());
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_single_slot_is_valid() {
        let now = base();
        let set = SlotSet::validate(vec![now + Duration::minutes(5)], now).expect("valid set");
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(SlotSet::validate(vec![], base()), Err(SlotSetError::Empty));
    }

    #[test]
    fn test_too_many_rejected() {
        let now = base();
        let slots = (1..=4).map(|h| now + Duration::hours(h)).collect();
        assert_eq!(
            SlotSet::validate(slots, now),
            Err(SlotSetError::TooMany { count: 4 })
        );
    }

    #[test]
    fn test_past_slot_rejected() {
        let now = base();
        let past = now - Duration::minutes(1);
        let result = SlotSet::validate(vec![now + Duration::hours(1), past], now);
        assert_eq!(result, Err(SlotSetError::Past { slot: past, now }));
    }

    #[test]
    fn test_boundary_slot_equal_to_now_rejected() {
        let now = base();
        let result = SlotSet::validate(vec![now], now);
        assert_eq!(result, Err(SlotSetError::Past { slot: now, now }));
    }

    #[test]
    fn test_duplicate_rejected() {
        let now = base();
        let slot = now + Duration::hours(1);
        let result = SlotSet::validate(vec![slot, now + Duration::hours(2), slot], now);
        assert_eq!(result, Err(SlotSetError::Duplicate { slot }));
    }

    #[test]
    fn test_precedence_too_many_before_past() {
        // Four slots, one of them in the past: TooMany wins.
        let now = base();
        let slots = vec![
            now - Duration::hours(1),
            now + Duration::hours(1),
            now + Duration::hours(2),
            now + Duration::hours(3),
        ];
        assert_eq!(
            SlotSet::validate(slots, now),
            Err(SlotSetError::TooMany { count: 4 })
        );
    }

    #[test]
    fn test_precedence_past_before_duplicate() {
        // A past slot and a duplicate: Past wins.
        let now = base();
        let future = now + Duration::hours(1);
        let slots = vec![future, now - Duration::hours(1), future];
        assert_eq!(
            SlotSet::validate(slots, now),
            Err(SlotSetError::Past {
                slot: now - Duration::hours(1),
                now
            })
        );
    }

    #[test]
    fn test_validation_is_idempotent() {
        let now = base();
        let slots = vec![now + Duration::hours(1), now + Duration::hours(2)];

        let first = SlotSet::validate(slots.clone(), now).expect("valid set");
        let second = SlotSet::validate(slots, now).expect("valid set");
        assert_eq!(first, second);
    }

    #[test]
    fn test_contains() {
        let now = base();
        let slot = now + Duration::hours(1);
        let set = SlotSet::validate(vec![slot], now).expect("valid set");

        assert!(set.contains(slot));
        assert!(!set.contains(now + Duration::hours(2)));
    }
}

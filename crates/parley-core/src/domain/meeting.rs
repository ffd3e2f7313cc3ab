//! Meeting aggregate root and negotiation state machine.
//!
//! The `Meeting` is the aggregate root of one scheduling negotiation
//! between a requester (who opens with a slot proposal) and a responder.
//! All transitions go through validated methods that take an immutable
//! snapshot and return a fresh one together with the domain event the
//! transition produced; nothing is ever edited in place.
//!
//! # State machine
//!
//! ```text
//! (create) --> PendingOnResponder <--counter--> PendingOnRequester
//!                    |    \                        /    |
//!                 decline  accept             accept  decline
//!                    |       \                  /       |
//!                 Declined    ----> Confirmed <----  Declined
//!                                     |    \
//!                                  cancel   complete (clock)
//!                                     |       \
//!                                 Cancelled  Completed
//! ```
//!
//! Cancel is additionally legal from both pending states, for either
//! participant. `Declined`, `Cancelled` and `Completed` are terminal.
//!
//! # Turn discipline
//!
//! Whoever is *not* serving the current slot set is the only party allowed
//! to accept, counter, or decline. The alternation is by role, never by
//! identity reassignment, so one side can never grief the other by
//! amending an in-flight proposal.
//!
//! # Invariants
//!
//! 1. `proposed_slots` always holds 1-3 distinct, submission-time-future slots
//! 2. `confirmed_slot` is set if and only if the status is `Confirmed`,
//!    and was a member of `proposed_slots` at the moment of confirmation
//! 3. `version` increases by exactly 1 per accepted transition
//! 4. A rejected transition leaves the snapshot untouched

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use std::num::NonZeroU32;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use super::events::MeetingEvent;
use super::identifiers::{MeetingId, ParticipantId};
use super::slots::{SlotSet, SlotSetError};

/// Meeting duration applied when a draft does not specify one.
pub const DEFAULT_DURATION_MINUTES: NonZeroU32 = match NonZeroU32::new(30) {
    Some(minutes) => minutes,
    None => unreachable!(),
};

// ============================================================================
// DOMAIN ERRORS
// ============================================================================

/// Errors from negotiation transitions.
///
/// Two classes, mirroring how callers should react:
/// - validation errors — the input was malformed; correct and resubmit
/// - domain-state errors — the request conflicts with the meeting's
///   current state or the actor's role; re-fetch before deciding
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// The proposed slot set failed structural validation
    #[error(transparent)]
    Slots(#[from] SlotSetError),

    /// The accepted slot is not one of the slots on the table
    #[error("slot {slot} is not in the proposed set")]
    SlotNotInProposedSet {
        /// The slot the actor tried to accept
        slot: DateTime<Utc>,
    },

    /// Requester and responder are the same identity
    #[error("requester and responder must be distinct: {participant}")]
    ParticipantsNotDistinct {
        /// The identity used for both roles
        participant: ParticipantId,
    },

    /// The actor is not allowed to perform this operation right now
    #[error("actor {actor} may not perform {operation} while the meeting is {status}")]
    WrongActor {
        /// Who attempted the transition
        actor: ParticipantId,
        /// What they attempted
        operation: Operation,
        /// The status at the time of the attempt
        status: MeetingStatus,
    },

    /// The operation is not legal from the current state
    #[error("{operation} is not legal from {status}")]
    IllegalTransition {
        /// What was attempted
        operation: Operation,
        /// The status at the time of the attempt
        status: MeetingStatus,
    },

    /// The meeting has reached a terminal state and is immutable
    #[error("meeting is {status}; no further transitions are possible")]
    TerminalState {
        /// The terminal status
        status: MeetingStatus,
    },
}

impl TransitionError {
    /// Caller-input problem; recoverable by resubmitting corrected input.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Slots(_) | Self::SlotNotInProposedSet { .. } | Self::ParticipantsNotDistinct { .. }
        )
    }

    /// Conflict with the meeting's state or the actor's role; the caller
    /// must re-fetch the current record before deciding how to proceed.
    #[must_use]
    pub const fn is_domain_state(&self) -> bool {
        matches!(
            self,
            Self::WrongActor { .. } | Self::IllegalTransition { .. } | Self::TerminalState { .. }
        )
    }
}

// ============================================================================
// ENUMERATIONS
// ============================================================================

/// Lifecycle states of a negotiation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    /// The responder must react to the requester's proposal (initial)
    PendingOnResponder,
    /// The requester must react to the responder's counter-proposal
    PendingOnRequester,
    /// A slot was accepted; the meeting will happen
    Confirmed,
    /// The serving party ended the negotiation (terminal)
    Declined,
    /// A participant cancelled (terminal)
    Cancelled,
    /// The confirmed slot's end time elapsed (terminal)
    Completed,
}

impl MeetingStatus {
    /// Whether this state admits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Declined | Self::Cancelled | Self::Completed)
    }

    /// Whether one of the parties currently holds the obligation to act.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::PendingOnResponder | Self::PendingOnRequester)
    }

    /// The role that must act next, if the negotiation is pending.
    #[must_use]
    pub const fn serving_role(self) -> Option<ParticipantRole> {
        match self {
            Self::PendingOnResponder => Some(ParticipantRole::Responder),
            Self::PendingOnRequester => Some(ParticipantRole::Requester),
            _ => None,
        }
    }

    /// Legal edges of the state machine.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (
                Self::PendingOnResponder,
                Self::PendingOnRequester | Self::Confirmed | Self::Declined | Self::Cancelled
            ) | (
                Self::PendingOnRequester,
                Self::PendingOnResponder | Self::Confirmed | Self::Declined | Self::Cancelled
            ) | (Self::Confirmed, Self::Cancelled | Self::Completed)
        )
    }
}

/// The two fixed roles in a negotiation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    /// The party who initiated the meeting
    Requester,
    /// The counterpart who received the first proposal
    Responder,
}

impl ParticipantRole {
    /// The opposite role.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Requester => Self::Responder,
            Self::Responder => Self::Requester,
        }
    }
}

/// How the meeting will take place.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MeetingKind {
    VideoCall,
    PhoneCall,
    InPerson,
    QuickCheckIn,
}

/// How urgent the meeting is for the requester.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    Low,
    Medium,
    High,
    Urgent,
}

/// Named transition operations, for errors and logs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Accept,
    CounterPropose,
    Decline,
    Cancel,
    Complete,
}

// ============================================================================
// TRANSITION COMMANDS
// ============================================================================

/// A client-invoked transition, one variant per operation.
///
/// Each variant carries exactly the payload its operation needs, so a
/// malformed combination (say, a reason text on an accept) cannot be
/// expressed. `Complete` is clock-triggered and deliberately absent; see
/// [`Meeting::complete`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum TransitionCommand {
    /// Accept one of the slots currently on the table
    Accept {
        /// The chosen slot; must be a member of the proposed set
        slot: DateTime<Utc>,
    },

    /// Replace the slot set and hand the turn back
    CounterPropose {
        /// The fresh candidate slots, validated on application
        slots: Vec<DateTime<Utc>>,
        /// Optional note; overwrites the previous one
        note: Option<String>,
    },

    /// End the negotiation without a meeting
    Decline {
        /// Optional reason recorded on the meeting
        reason: Option<String>,
    },

    /// Call the meeting off, before or after confirmation
    Cancel {
        /// Optional reason recorded on the meeting
        reason: Option<String>,
    },
}

impl TransitionCommand {
    /// The operation this command performs.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::Accept { .. } => Operation::Accept,
            Self::CounterPropose { .. } => Operation::CounterPropose,
            Self::Decline { .. } => Operation::Decline,
            Self::Cancel { .. } => Operation::Cancel,
        }
    }
}

// ============================================================================
// MEETING DRAFT
// ============================================================================

/// Input for creating a meeting.
///
/// Identifiers arrive pre-validated by their newtype constructors; the
/// slot list is raw and validated against the submission instant inside
/// [`Meeting::propose`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingDraft {
    /// Unique id for the new meeting
    pub id: MeetingId,
    /// The initiating party
    pub requester_id: ParticipantId,
    /// The counterpart who must react first
    pub responder_id: ParticipantId,
    /// Short human-readable title
    pub title: String,
    /// How the meeting will take place
    pub kind: MeetingKind,
    /// Urgency communicated to the responder
    pub urgency: UrgencyLevel,
    /// Optional agenda text
    pub agenda: Option<String>,
    /// Initial candidate slots
    pub proposed_slots: Vec<DateTime<Utc>>,
    /// Meeting length; fixed for the lifetime of the meeting
    pub duration_minutes: NonZeroU32,
}

impl MeetingDraft {
    /// Start a draft with medium urgency and the default duration.
    #[must_use]
    pub fn new(
        id: MeetingId,
        requester_id: ParticipantId,
        responder_id: ParticipantId,
        title: impl Into<String>,
        kind: MeetingKind,
        proposed_slots: Vec<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            requester_id,
            responder_id,
            title: title.into(),
            kind,
            urgency: UrgencyLevel::Medium,
            agenda: None,
            proposed_slots,
            duration_minutes: DEFAULT_DURATION_MINUTES,
        }
    }

    /// Set the urgency level.
    #[must_use]
    pub const fn with_urgency(mut self, urgency: UrgencyLevel) -> Self {
        self.urgency = urgency;
        self
    }

    /// Set the agenda text.
    #[must_use]
    pub fn with_agenda(mut self, agenda: impl Into<String>) -> Self {
        self.agenda = Some(agenda.into());
        self
    }

    /// Set the duration.
    #[must_use]
    pub const fn with_duration(mut self, minutes: NonZeroU32) -> Self {
        self.duration_minutes = minutes;
        self
    }
}

// ============================================================================
// MEETING AGGREGATE ROOT
// ============================================================================

/// One scheduling negotiation.
///
/// `kind`, `urgency`, `duration_minutes`, `title` and `agenda` are fixed
/// at creation; during negotiation only the slot set, the latest note and
/// the status-driven fields change. The participant pair never changes —
/// who may act alternates by role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    /// Unique meeting identifier
    pub id: MeetingId,
    /// The initiating party
    pub requester_id: ParticipantId,
    /// The counterpart
    pub responder_id: ParticipantId,
    /// Short human-readable title
    pub title: String,
    /// How the meeting will take place
    pub kind: MeetingKind,
    /// Urgency communicated to the responder
    pub urgency: UrgencyLevel,
    /// Optional agenda text
    pub agenda: Option<String>,
    /// Current lifecycle state
    pub status: MeetingStatus,
    /// The slot set currently on the table
    pub proposed_slots: SlotSet,
    /// The accepted slot; set only in `Confirmed` and later
    pub confirmed_slot: Option<DateTime<Utc>>,
    /// Meeting length in minutes
    pub duration_minutes: NonZeroU32,
    /// Reason attached by the declining/cancelling actor
    pub cancellation_reason: Option<String>,
    /// Note attached to the most recent counter-proposal; overwritten,
    /// not accumulated
    pub latest_negotiation_note: Option<String>,
    /// Monotonic counter for optimistic concurrency
    pub version: u64,
    /// When the meeting was created
    pub created_at: DateTime<Utc>,
    /// When the last accepted transition was applied
    pub updated_at: DateTime<Utc>,
    /// When the meeting entered `Confirmed`; set once
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl Meeting {
    // ========================================================================
    // CONSTRUCTOR (Create transition)
    // ========================================================================

    /// Create a meeting from the requester's initial proposal.
    ///
    /// Sets `version = 1` and status `PendingOnResponder`, and emits the
    /// proposed event.
    ///
    /// # Errors
    ///
    /// Returns `ParticipantsNotDistinct` if requester and responder share
    /// an identity, or a [`SlotSetError`] if the slot list is invalid.
    pub fn propose(
        draft: MeetingDraft,
        now: DateTime<Utc>,
    ) -> Result<(Self, MeetingEvent), TransitionError> {
        if draft.requester_id == draft.responder_id {
            return Err(TransitionError::ParticipantsNotDistinct {
                participant: draft.requester_id,
            });
        }
        let proposed_slots = SlotSet::validate(draft.proposed_slots, now)?;

        let meeting = Self {
            id: draft.id,
            requester_id: draft.requester_id.clone(),
            responder_id: draft.responder_id,
            title: draft.title,
            kind: draft.kind,
            urgency: draft.urgency,
            agenda: draft.agenda,
            status: MeetingStatus::PendingOnResponder,
            proposed_slots,
            confirmed_slot: None,
            duration_minutes: draft.duration_minutes,
            cancellation_reason: None,
            latest_negotiation_note: None,
            version: 1,
            created_at: now,
            updated_at: now,
            confirmed_at: None,
        };
        let event = MeetingEvent::proposed(meeting.clone(), draft.requester_id, now);
        Ok((meeting, event))
    }

    // ========================================================================
    // QUERY METHODS
    // ========================================================================

    /// The role the given actor plays in this meeting, if any.
    #[must_use]
    pub fn role_of(&self, actor: &ParticipantId) -> Option<ParticipantRole> {
        if *actor == self.requester_id {
            Some(ParticipantRole::Requester)
        } else if *actor == self.responder_id {
            Some(ParticipantRole::Responder)
        } else {
            None
        }
    }

    /// The participant holding the given role.
    #[must_use]
    pub const fn participant(&self, role: ParticipantRole) -> &ParticipantId {
        match role {
            ParticipantRole::Requester => &self.requester_id,
            ParticipantRole::Responder => &self.responder_id,
        }
    }

    /// When a confirmed meeting is due for completion, if confirmed.
    #[must_use]
    pub fn completion_due_at(&self) -> Option<DateTime<Utc>> {
        self.confirmed_slot
            .map(|slot| slot + Duration::minutes(i64::from(self.duration_minutes.get())))
    }

    // ========================================================================
    // CLIENT TRANSITIONS
    // ========================================================================

    /// Apply a client-invoked transition on behalf of `actor`.
    ///
    /// Pure: returns the next snapshot (version bumped by exactly 1,
    /// `updated_at = now`) and the single event the transition produced.
    /// `self` is untouched either way.
    ///
    /// Checks run in a fixed order: terminal state, operation legality in
    /// the current state, actor permission, then payload validation.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] describing the first failed check.
    pub fn apply(
        &self,
        actor: &ParticipantId,
        command: TransitionCommand,
        now: DateTime<Utc>,
    ) -> Result<(Self, MeetingEvent), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::TerminalState {
                status: self.status,
            });
        }
        match command {
            TransitionCommand::Accept { slot } => self.accept(actor, slot, now),
            TransitionCommand::CounterPropose { slots, note } => {
                self.counter_propose(actor, slots, note, now)
            }
            TransitionCommand::Decline { reason } => self.decline(actor, reason, now),
            TransitionCommand::Cancel { reason } => self.cancel(actor, reason, now),
        }
    }

    fn accept(
        &self,
        actor: &ParticipantId,
        slot: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(Self, MeetingEvent), TransitionError> {
        self.check_turn(actor, Operation::Accept)?;
        if !self.proposed_slots.contains(slot) {
            return Err(TransitionError::SlotNotInProposedSet { slot });
        }

        let next = Self {
            status: MeetingStatus::Confirmed,
            confirmed_slot: Some(slot),
            confirmed_at: Some(now),
            version: self.version + 1,
            updated_at: now,
            ..self.clone()
        };
        let event = MeetingEvent::confirmed(next.clone(), actor.clone(), now);
        Ok((next, event))
    }

    fn counter_propose(
        &self,
        actor: &ParticipantId,
        slots: Vec<DateTime<Utc>>,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(Self, MeetingEvent), TransitionError> {
        let serving = self.check_turn(actor, Operation::CounterPropose)?;
        let proposed_slots = SlotSet::validate(slots, now)?;

        let flipped = match serving.other() {
            ParticipantRole::Requester => MeetingStatus::PendingOnRequester,
            ParticipantRole::Responder => MeetingStatus::PendingOnResponder,
        };
        let next = Self {
            status: flipped,
            proposed_slots,
            latest_negotiation_note: note,
            version: self.version + 1,
            updated_at: now,
            ..self.clone()
        };
        let event = MeetingEvent::countered(next.clone(), actor.clone(), now);
        Ok((next, event))
    }

    fn decline(
        &self,
        actor: &ParticipantId,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(Self, MeetingEvent), TransitionError> {
        self.check_turn(actor, Operation::Decline)?;

        let next = Self {
            status: MeetingStatus::Declined,
            cancellation_reason: reason,
            version: self.version + 1,
            updated_at: now,
            ..self.clone()
        };
        let event = MeetingEvent::declined(next.clone(), actor.clone(), now);
        Ok((next, event))
    }

    fn cancel(
        &self,
        actor: &ParticipantId,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(Self, MeetingEvent), TransitionError> {
        // Legal from both pending states and from Confirmed, for either
        // participant (but nobody else).
        if !self.status.can_transition_to(MeetingStatus::Cancelled) {
            return Err(TransitionError::IllegalTransition {
                operation: Operation::Cancel,
                status: self.status,
            });
        }
        if self.role_of(actor).is_none() {
            return Err(TransitionError::WrongActor {
                actor: actor.clone(),
                operation: Operation::Cancel,
                status: self.status,
            });
        }

        let next = Self {
            status: MeetingStatus::Cancelled,
            cancellation_reason: reason,
            version: self.version + 1,
            updated_at: now,
            ..self.clone()
        };
        let event = MeetingEvent::cancelled(next.clone(), actor.clone(), now);
        Ok((next, event))
    }

    /// Verify the operation is legal in a pending state and the actor is
    /// the serving party. Returns the serving role.
    fn check_turn(
        &self,
        actor: &ParticipantId,
        operation: Operation,
    ) -> Result<ParticipantRole, TransitionError> {
        let Some(serving) = self.status.serving_role() else {
            return Err(TransitionError::IllegalTransition {
                operation,
                status: self.status,
            });
        };
        if self.role_of(actor) != Some(serving) {
            return Err(TransitionError::WrongActor {
                actor: actor.clone(),
                operation,
                status: self.status,
            });
        }
        Ok(serving)
    }

    // ========================================================================
    // CLOCK TRANSITION
    // ========================================================================

    /// Complete a confirmed meeting once its end time has elapsed.
    ///
    /// Clock-triggered; there is no human actor. Idempotent: on an
    /// already-completed meeting this is a no-op (`Ok(None)`) and emits no
    /// duplicate event.
    ///
    /// # Errors
    ///
    /// Returns `IllegalTransition` if the meeting is not confirmed, or if
    /// it is confirmed but the slot's end time has not yet elapsed.
    pub fn complete(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<(Self, MeetingEvent)>, TransitionError> {
        if self.status == MeetingStatus::Completed {
            return Ok(None);
        }
        let not_due = || TransitionError::IllegalTransition {
            operation: Operation::Complete,
            status: self.status,
        };
        if self.status != MeetingStatus::Confirmed {
            return Err(not_due());
        }
        let Some(due_at) = self.completion_due_at() else {
            return Err(not_due());
        };
        if now < due_at {
            return Err(not_due());
        }

        let next = Self {
            status: MeetingStatus::Completed,
            version: self.version + 1,
            updated_at: now,
            ..self.clone()
        };
        let event = MeetingEvent::completed(next.clone(), now);
        Ok(Some((next, event)))
    }
}

// ============================================================================
// TESTS
// ============================================================================

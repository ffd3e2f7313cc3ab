//! # Domain Layer
//!
//! The negotiation core's domain model, kept pure: no I/O, no global
//! state, deterministic transitions over immutable snapshots. The only
//! imperative pieces — the repository backend and the coordinator — sit
//! behind the traits defined here.
//!
//! ## Modules
//!
//! - [`identifiers`] — parse-validated newtypes (`MeetingId`,
//!   `ParticipantId`)
//! - [`slots`] — the slot set validator, a pure function from candidate
//!   list and submission instant to a validated [`SlotSet`]
//! - [`meeting`] — the [`Meeting`] aggregate root and its state machine
//! - [`events`] — domain events and the [`EventSink`] notification
//!   boundary
//! - [`repository`] — the [`MeetingRepository`] persistence boundary with
//!   compare-and-swap semantics, plus the in-memory reference
//!   implementation
//!
//! ## Design principles
//!
//! - Parse at boundaries, validate once — holding a `SlotSet` or
//!   `MeetingId` is proof its invariants held.
//! - Make illegal states unrepresentable — payloads are a sum type per
//!   operation, the status is a closed enum with an explicit transition
//!   table.
//! - Every error is typed and expected — `thiserror` enums, no panics.

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

pub mod events;
pub mod identifiers;
pub mod meeting;
pub mod repository;
pub mod slots;

pub use events::{EventSink, MeetingEvent, NullSink};
pub use identifiers::{IdentifierError, MeetingId, ParticipantId};
pub use meeting::{
    Meeting, MeetingDraft, MeetingKind, MeetingStatus, Operation, ParticipantRole,
    TransitionCommand, TransitionError, UrgencyLevel, DEFAULT_DURATION_MINUTES,
};
pub use repository::{
    InMemoryMeetingRepository, MeetingRepository, RepositoryError, RepositoryResult,
};
pub use slots::{SlotSet, SlotSetError, MAX_SLOTS};

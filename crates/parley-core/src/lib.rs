//! # parley-core
//!
//! Appointment negotiation between two parties who cannot see each
//! other's calendars. One party proposes up to three candidate time
//! slots; the other accepts one, declines, or counters with a fresh set;
//! this alternates until a slot is confirmed or either party cancels.
//!
//! The crate is the authoritative model of that protocol:
//!
//! - [`domain::slots`] validates proposed slot sets
//! - [`domain::meeting`] is the turn-based state machine
//! - [`coordinator`] serializes concurrent transitions with optimistic
//!   versioning (compare-and-swap, no locks)
//! - [`domain::events`] carries committed transitions to whatever
//!   notification layer sits downstream
//!
//! Everything around it — authentication, HTTP, notification delivery,
//! calendars — is a collaborator behind a trait or out of scope.
//!
//! ## Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use parley_core::coordinator::NegotiationCoordinator;
//! use parley_core::domain::{
//!     InMemoryMeetingRepository, MeetingDraft, MeetingId, MeetingKind, MeetingStatus,
//!     NullSink, ParticipantId, TransitionCommand,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let coordinator = NegotiationCoordinator::new(InMemoryMeetingRepository::new(), NullSink);
//! let now = Utc::now();
//!
//! let requester = ParticipantId::parse("provider-1")?;
//! let responder = ParticipantId::parse("client-1")?;
//! let draft = MeetingDraft::new(
//!     MeetingId::parse("mtg-1")?,
//!     requester,
//!     responder.clone(),
//!     "Intro call",
//!     MeetingKind::VideoCall,
//!     vec![now + Duration::hours(24)],
//! );
//!
//! let meeting = coordinator.create(draft, now)?;
//! let slot = meeting.proposed_slots.as_slice()[0];
//! let confirmed = coordinator.apply_transition(
//!     &meeting.id,
//!     &responder,
//!     meeting.version,
//!     TransitionCommand::Accept { slot },
//!     now,
//! )?;
//! assert_eq!(confirmed.status, MeetingStatus::Confirmed);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

pub mod coordinator;
pub mod domain;

pub use coordinator::{CoordinatorError, NegotiationCoordinator};
pub use domain::{
    EventSink, InMemoryMeetingRepository, Meeting, MeetingDraft, MeetingEvent, MeetingId,
    MeetingKind, MeetingRepository, MeetingStatus, NullSink, ParticipantId, ParticipantRole,
    RepositoryError, SlotSet, SlotSetError, TransitionCommand, TransitionError, UrgencyLevel,
};

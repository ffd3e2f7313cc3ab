//! Domain events emitted by the negotiation state machine.
//!
//! Every successful transition produces exactly one event. Events are
//! immutable, timestamped, serializable, and carry the full
//! post-transition [`Meeting`] snapshot plus the acting party's id (the
//! completion event is clock-triggered and has no human actor). They are
//! what the Notification collaborator consumes; delivery itself is out of
//! scope here.

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identifiers::ParticipantId;
use super::meeting::Meeting;

// ============================================================================
// EVENT ENUM
// ============================================================================

/// A negotiation event that has occurred.
///
/// The serde tag matches [`MeetingEvent::event_type`], so JSON consumers
/// and log consumers see the same type strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "data")]
pub enum MeetingEvent {
    /// A meeting was created with its initial slot proposal
    #[serde(rename = "meeting_proposed")]
    Proposed(Box<ActorEvent>),

    /// The serving party accepted one of the proposed slots
    #[serde(rename = "meeting_confirmed")]
    Confirmed(Box<ActorEvent>),

    /// The serving party replaced the slot set with a counter-proposal
    #[serde(rename = "meeting_countered")]
    Countered(Box<ActorEvent>),

    /// The serving party declined the negotiation outright
    #[serde(rename = "meeting_declined")]
    Declined(Box<ActorEvent>),

    /// Either participant cancelled the meeting
    #[serde(rename = "meeting_cancelled")]
    Cancelled(Box<ActorEvent>),

    /// The confirmed slot's end time elapsed
    #[serde(rename = "meeting_completed")]
    Completed(Box<SystemEvent>),
}

impl MeetingEvent {
    /// When this event occurred.
    #[must_use]
    pub const fn timestamp(&self) -> &DateTime<Utc> {
        match self {
            Self::Proposed(e)
            | Self::Confirmed(e)
            | Self::Countered(e)
            | Self::Declined(e)
            | Self::Cancelled(e) => &e.timestamp,
            Self::Completed(e) => &e.timestamp,
        }
    }

    /// The event type as a stable string.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::Proposed(_) => "meeting_proposed",
            Self::Confirmed(_) => "meeting_confirmed",
            Self::Countered(_) => "meeting_countered",
            Self::Declined(_) => "meeting_declined",
            Self::Cancelled(_) => "meeting_cancelled",
            Self::Completed(_) => "meeting_completed",
        }
    }

    /// The post-transition snapshot this event carries.
    #[must_use]
    pub const fn meeting(&self) -> &Meeting {
        match self {
            Self::Proposed(e)
            | Self::Confirmed(e)
            | Self::Countered(e)
            | Self::Declined(e)
            | Self::Cancelled(e) => &e.meeting,
            Self::Completed(e) => &e.meeting,
        }
    }

    /// The acting party, if the transition had a human actor.
    #[must_use]
    pub const fn actor(&self) -> Option<&ParticipantId> {
        match self {
            Self::Proposed(e)
            | Self::Confirmed(e)
            | Self::Countered(e)
            | Self::Declined(e)
            | Self::Cancelled(e) => Some(&e.actor),
            Self::Completed(_) => None,
        }
    }

    /// Create a proposed event.
    #[must_use]
    pub fn proposed(meeting: Meeting, actor: ParticipantId, timestamp: DateTime<Utc>) -> Self {
        Self::Proposed(Box::new(ActorEvent {
            meeting,
            actor,
            timestamp,
        }))
    }

    /// Create a confirmed event.
    #[must_use]
    pub fn confirmed(meeting: Meeting, actor: ParticipantId, timestamp: DateTime<Utc>) -> Self {
        Self::Confirmed(Box::new(ActorEvent {
            meeting,
            actor,
            timestamp,
        }))
    }

    /// Create a countered event.
    #[must_use]
    pub fn countered(meeting: Meeting, actor: ParticipantId, timestamp: DateTime<Utc>) -> Self {
        Self::Countered(Box::new(ActorEvent {
            meeting,
            actor,
            timestamp,
        }))
    }

    /// Create a declined event.
    #[must_use]
    pub fn declined(meeting: Meeting, actor: ParticipantId, timestamp: DateTime<Utc>) -> Self {
        Self::Declined(Box::new(ActorEvent {
            meeting,
            actor,
            timestamp,
        }))
    }

    /// Create a cancelled event.
    #[must_use]
    pub fn cancelled(meeting: Meeting, actor: ParticipantId, timestamp: DateTime<Utc>) -> Self {
        Self::Cancelled(Box::new(ActorEvent {
            meeting,
            actor,
            timestamp,
        }))
    }

    /// Create a completed event.
    #[must_use]
    pub fn completed(meeting: Meeting, timestamp: DateTime<Utc>) -> Self {
        Self::Completed(Box::new(SystemEvent { meeting, timestamp }))
    }
}

// ============================================================================
// EVENT PAYLOADS
// ============================================================================

/// Payload for transitions performed by one of the two participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorEvent {
    /// Full snapshot of the meeting after the transition
    pub meeting: Meeting,
    /// The participant who performed the transition
    pub actor: ParticipantId,
    /// When the transition was applied
    pub timestamp: DateTime<Utc>,
}

/// Payload for clock-triggered transitions (completion).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemEvent {
    /// Full snapshot of the meeting after the transition
    pub meeting: Meeting,
    /// When the transition was applied
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// EVENT SINK
// ============================================================================

/// Boundary to the Notification collaborator.
///
/// The coordinator publishes each committed transition's event here.
/// Implementations must not fail the transition: the record is already
/// durably written by the time an event is published, so a sink that needs
/// reliability should queue internally.
pub trait EventSink: Send + Sync {
    /// Receive one committed domain event.
    fn publish(&self, event: &MeetingEvent);
}

/// Sink that discards every event.
///
/// For callers that only care about the returned snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: &MeetingEvent) {}
}

// ============================================================================
// SERIALIZATION
// ============================================================================

/// Serialize an event to JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_event(event: &MeetingEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}

/// Deserialize an event from JSON.
///
/// # Errors
///
/// Returns an error if deserialization fails.
pub fn deserialize_event(json: &str) -> Result<MeetingEvent, serde_json::Error> {
    serde_json::from_str(json)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::domain::identifiers::MeetingId;
    use crate::domain::meeting::{MeetingDraft, MeetingKind};

    fn sample_meeting() -> (Meeting, ParticipantId) {
        let now = Utc::now();
        let requester = ParticipantId::parse("provider-1").expect("valid id");
        let draft = MeetingDraft::new(
            MeetingId::parse("mtg-1").expect("valid id"),
            requester.clone(),
            ParticipantId::parse("client-1").expect("valid id"),
            "Intro call",
            MeetingKind::VideoCall,
            vec![now + Duration::hours(1)],
        );
        let (meeting, _) = Meeting::propose(draft, now).expect("valid draft");
        (meeting, requester)
    }

    #[test]
    fn test_event_accessors() {
        let (meeting, actor) = sample_meeting();
        let timestamp = Utc::now();
        let event = MeetingEvent::proposed(meeting.clone(), actor.clone(), timestamp);

        assert_eq!(event.event_type(), "meeting_proposed");
        assert_eq!(event.timestamp(), &timestamp);
        assert_eq!(event.actor(), Some(&actor));
        assert_eq!(event.meeting().id, meeting.id);
    }

    #[test]
    fn test_completed_event_has_no_actor() {
        let (meeting, _) = sample_meeting();
        let event = MeetingEvent::completed(meeting, Utc::now());

        assert_eq!(event.event_type(), "meeting_completed");
        assert_eq!(event.actor(), None);
    }

    #[test]
    fn test_event_serialization_roundtrip() {
        let (meeting, actor) = sample_meeting();
        let events = vec![
            MeetingEvent::proposed(meeting.clone(), actor.clone(), Utc::now()),
            MeetingEvent::cancelled(meeting.clone(), actor, Utc::now()),
            MeetingEvent::completed(meeting, Utc::now()),
        ];

        for event in events {
            let json = serialize_event(&event).expect("serialization failed");
            let back = deserialize_event(&json).expect("deserialization failed");
            assert_eq!(event, back);
        }
    }

    #[test]
    fn test_json_tag_matches_event_type() {
        let (meeting, actor) = sample_meeting();
        let events = [
            MeetingEvent::proposed(meeting.clone(), actor.clone(), Utc::now()),
            MeetingEvent::confirmed(meeting.clone(), actor.clone(), Utc::now()),
            MeetingEvent::countered(meeting.clone(), actor.clone(), Utc::now()),
            MeetingEvent::declined(meeting.clone(), actor.clone(), Utc::now()),
            MeetingEvent::cancelled(meeting.clone(), actor, Utc::now()),
            MeetingEvent::completed(meeting, Utc::now()),
        ];

        for event in events {
            let json = serialize_event(&event).expect("serialization failed");
            let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
            assert_eq!(value["event_type"], event.event_type());
        }
    }

    #[test]
    fn test_event_types_are_unique() {
        let (meeting, actor) = sample_meeting();
        let events = [
            MeetingEvent::proposed(meeting.clone(), actor.clone(), Utc::now()),
            MeetingEvent::confirmed(meeting.clone(), actor.clone(), Utc::now()),
            MeetingEvent::countered(meeting.clone(), actor.clone(), Utc::now()),
            MeetingEvent::declined(meeting.clone(), actor.clone(), Utc::now()),
            MeetingEvent::cancelled(meeting.clone(), actor, Utc::now()),
            MeetingEvent::completed(meeting, Utc::now()),
        ];

        let types: std::collections::HashSet<_> =
            events.iter().map(MeetingEvent::event_type).collect();
        assert_eq!(types.len(), events.len());
    }
}

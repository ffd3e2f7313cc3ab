//! Semantic identifier newtypes for the negotiation domain.
//!
//! Identifiers are parsed once at the boundary and carried as validated
//! types throughout the core (parse-once pattern). The core never mints
//! identities itself: `MeetingId`s come from the caller and
//! `ParticipantId`s come from the Identity collaborator, already
//! authenticated. Both are opaque here — validation only rules out values
//! that could never be a real identity (empty, oversized, embedded
//! whitespace).

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum identifier length in characters.
const MAX_IDENTIFIER_LEN: usize = 64;

// ============================================================================
// ERRORS
// ============================================================================

/// Errors from identifier validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentifierError {
    /// Identifier is empty
    #[error("identifier cannot be empty")]
    Empty,

    /// Identifier exceeds the maximum length
    #[error("identifier exceeds {MAX_IDENTIFIER_LEN} characters: {len}")]
    TooLong {
        /// Actual length of the rejected value
        len: usize,
    },

    /// Identifier contains whitespace
    #[error("identifier contains whitespace: {value:?}")]
    InvalidCharacter {
        /// The rejected value
        value: String,
    },
}

fn validate(value: &str) -> Result<(), IdentifierError> {
    if value.is_empty() {
        return Err(IdentifierError::Empty);
    }
    if value.chars().count() > MAX_IDENTIFIER_LEN {
        return Err(IdentifierError::TooLong {
            len: value.chars().count(),
        });
    }
    if value.chars().any(char::is_whitespace) {
        return Err(IdentifierError::InvalidCharacter {
            value: value.to_string(),
        });
    }
    Ok(())
}

// ============================================================================
// MEETING ID
// ============================================================================

/// Unique identifier of a meeting negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MeetingId(String);

impl MeetingId {
    /// Parse and validate a meeting id.
    ///
    /// # Errors
    ///
    /// Returns `IdentifierError` if the value is empty, too long, or
    /// contains whitespace.
    pub fn parse(value: impl Into<String>) -> Result<Self, IdentifierError> {
        let value = value.into();
        validate(&value)?;
        Ok(Self(value))
    }

    /// View the underlying value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MeetingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for MeetingId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<MeetingId> for String {
    fn from(id: MeetingId) -> Self {
        id.0
    }
}

// ============================================================================
// PARTICIPANT ID
// ============================================================================

/// Trusted identity of one of the two negotiating parties.
///
/// Authentication happens upstream; by the time a `ParticipantId` reaches
/// the core it is taken at face value and only matched against the
/// meeting's requester/responder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Parse and validate a participant id.
    ///
    /// # Errors
    ///
    /// Returns `IdentifierError` if the value is empty, too long, or
    /// contains whitespace.
    pub fn parse(value: impl Into<String>) -> Result<Self, IdentifierError> {
        let value = value.into();
        validate(&value)?;
        Ok(Self(value))
    }

    /// View the underlying value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ParticipantId> for String {
    fn from(id: ParticipantId) -> Self {
        id.0
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_ids() {
        let meeting = MeetingId::parse("mtg-2041").expect("valid id");
        assert_eq!(meeting.as_str(), "mtg-2041");

        let participant = ParticipantId::parse("user:alice@example.com").expect("valid id");
        assert_eq!(participant.as_str(), "user:alice@example.com");
    }

    #[test]
    fn test_reject_empty() {
        assert_eq!(MeetingId::parse(""), Err(IdentifierError::Empty));
        assert_eq!(ParticipantId::parse(""), Err(IdentifierError::Empty));
    }

    #[test]
    fn test_reject_whitespace() {
        let result = MeetingId::parse("mtg 1");
        assert!(matches!(result, Err(IdentifierError::InvalidCharacter { .. })));
    }

    #[test]
    fn test_reject_too_long() {
        let long = "x".repeat(65);
        assert!(matches!(
            ParticipantId::parse(long),
            Err(IdentifierError::TooLong { len: 65 })
        ));
    }

    #[test]
    fn test_serde_roundtrip_with_validation() {
        let id = MeetingId::parse("mtg-7").expect("valid id");
        let json = serde_json::to_string(&id).expect("serializes");
        assert_eq!(json, "\"mtg-7\"");

        let back: MeetingId = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back, id);

        // Deserialization re-validates
        let bad: Result<MeetingId, _> = serde_json::from_str("\"has space\"");
        assert!(bad.is_err());
    }
}

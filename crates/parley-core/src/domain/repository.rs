//! Repository boundary for meeting persistence.
//!
//! The core asks very little of its store: load by id, insert, a
//! conditional write keyed on the version counter, and one query feeding
//! the completion sweep. Implementations live outside the domain layer;
//! the [`InMemoryMeetingRepository`] here is the reference implementation
//! and the backend for the crate's own tests.
//!
//! The compare-and-swap is the entirety of the mutual-exclusion
//! discipline: no two writers may commit against the same version, and
//! there are no locks held across a negotiation.

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::identifiers::MeetingId;
use super::meeting::{Meeting, MeetingStatus};

// ============================================================================
// ERRORS
// ============================================================================

/// Errors from repository operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    /// No meeting with the given id exists
    #[error("meeting not found: {id}")]
    NotFound {
        /// The unknown id
        id: MeetingId,
    },

    /// A meeting with the given id already exists
    #[error("meeting already exists: {id}")]
    Conflict {
        /// The duplicate id
        id: MeetingId,
    },

    /// Another writer advanced the record since it was read
    #[error("concurrent modification of {id}: expected version {expected}, found {actual}")]
    ConcurrentModification {
        /// The contested meeting
        id: MeetingId,
        /// The version the writer read
        expected: u64,
        /// The version actually stored
        actual: u64,
    },

    /// Underlying storage failure
    #[error("storage error: {0}")]
    Storage(String),
}

/// Result type alias for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

// ============================================================================
// REPOSITORY TRAIT
// ============================================================================

/// Durable storage of meeting records with conditional-write semantics.
///
/// # Error Conditions
///
/// - `NotFound`: meeting id unknown
/// - `Conflict`: duplicate id on insert
/// - `ConcurrentModification`: the compare-and-swap lost a race
/// - `Storage`: backend failure (corruption, connectivity, poisoning)
pub trait MeetingRepository: Send + Sync {
    /// Load the current record for a meeting.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no meeting with the given id exists, or
    /// `Storage` on backend failure.
    fn load(&self, id: &MeetingId) -> RepositoryResult<Meeting>;

    /// Insert a newly created meeting.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the id already exists, or `Storage` on
    /// backend failure.
    fn insert(&self, meeting: &Meeting) -> RepositoryResult<()>;

    /// Conditionally replace a meeting record.
    ///
    /// Succeeds only if the stored version still equals
    /// `expected_version`; the check and the write must be atomic with
    /// respect to every other writer.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentModification` if another writer advanced the
    /// version, `NotFound` if the meeting vanished, or `Storage` on
    /// backend failure.
    fn compare_and_swap(&self, expected_version: u64, next: &Meeting) -> RepositoryResult<()>;

    /// Confirmed meetings whose end time has elapsed, for the completion
    /// sweep.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure.
    fn find_due_confirmed(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<Meeting>>;

    /// Whether a meeting exists.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure.
    fn exists(&self, id: &MeetingId) -> RepositoryResult<bool> {
        match self.load(id) {
            Ok(_) => Ok(true),
            Err(RepositoryError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

// ============================================================================
// IN-MEMORY IMPLEMENTATION
// ============================================================================

/// `Mutex`-backed in-memory repository.
///
/// The mutex is held only for the duration of one map operation, which
/// makes the version check and the write atomic — exactly the
/// compare-and-swap contract, without the store needing to understand
/// the negotiation itself.
#[derive(Debug, Default)]
pub struct InMemoryMeetingRepository {
    meetings: Mutex<HashMap<MeetingId, Meeting>>,
}

impl InMemoryMeetingRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> RepositoryResult<std::sync::MutexGuard<'_, HashMap<MeetingId, Meeting>>> {
        self.meetings
            .lock()
            .map_err(|e| RepositoryError::Storage(e.to_string()))
    }
}

impl MeetingRepository for InMemoryMeetingRepository {
    fn load(&self, id: &MeetingId) -> RepositoryResult<Meeting> {
        self.guard()?
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound { id: id.clone() })
    }

    fn insert(&self, meeting: &Meeting) -> RepositoryResult<()> {
        let mut meetings = self.guard()?;
        if meetings.contains_key(&meeting.id) {
            return Err(RepositoryError::Conflict {
                id: meeting.id.clone(),
            });
        }
        meetings.insert(meeting.id.clone(), meeting.clone());
        Ok(())
    }

    fn compare_and_swap(&self, expected_version: u64, next: &Meeting) -> RepositoryResult<()> {
        let mut meetings = self.guard()?;
        let Some(current) = meetings.get(&next.id) else {
            return Err(RepositoryError::NotFound {
                id: next.id.clone(),
            });
        };
        if current.version != expected_version {
            return Err(RepositoryError::ConcurrentModification {
                id: next.id.clone(),
                expected: expected_version,
                actual: current.version,
            });
        }
        meetings.insert(next.id.clone(), next.clone());
        Ok(())
    }

    fn find_due_confirmed(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<Meeting>> {
        Ok(self
            .guard()?
            .values()
            .filter(|m| {
                m.status == MeetingStatus::Confirmed
                    && m.completion_due_at().is_some_and(|due| due <= now)
            })
            .cloned()
            .collect())
    }
}

// ============================================================================
// TESTS
// ============================================================================

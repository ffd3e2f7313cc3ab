//! Negotiation coordinator: optimistic concurrency around the state machine.
//!
//! The coordinator makes "read record, decide transition, write record"
//! appear atomic to every concurrent caller without holding locks.
//! Negotiations run over minutes to days, so the only serialization point
//! is a compare-and-swap keyed on the record's version counter:
//!
//! 1. load the current record
//! 2. reject stale callers whose expected version no longer matches
//! 3. run the pure state machine on the loaded snapshot
//! 4. conditionally write the new snapshot; a lost race surfaces as
//!    [`CoordinatorError::VersionConflict`]
//! 5. publish exactly one domain event for the committed transition
//!
//! Domain rejections short-circuit before any write, so a rejected
//! transition has no observable effect — no version bump, no event.
//!
//! The coordinator never auto-retries a client command on a version
//! conflict: a stale accept may target a slot that is no longer on the
//! table, so the caller must re-read and re-derive intent. The clock-
//! driven completion sweep is the exception — losing a race there simply
//! leaves the meeting for the next tick.

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::events::EventSink;
use crate::domain::identifiers::{MeetingId, ParticipantId};
use crate::domain::meeting::{Meeting, MeetingDraft, Operation, TransitionCommand, TransitionError};
use crate::domain::repository::{MeetingRepository, RepositoryError};

// ============================================================================
// ERRORS
// ============================================================================

/// Errors from coordinated transition application.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoordinatorError {
    /// The meeting id is unknown; fatal to the request
    #[error("meeting not found: {id}")]
    NotFound {
        /// The unknown id
        id: MeetingId,
    },

    /// The caller's read is stale; re-read before retrying
    #[error("version conflict on {id}: expected {expected}, current {actual}")]
    VersionConflict {
        /// The contested meeting
        id: MeetingId,
        /// The version the caller expected
        expected: u64,
        /// The version currently stored
        actual: u64,
    },

    /// The state machine rejected the transition; surfaced verbatim
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// The storage backend failed
    #[error(transparent)]
    Repository(RepositoryError),
}

impl CoordinatorError {
    /// Whether retrying with a fresh read can succeed.
    ///
    /// Only version conflicts are worth retrying, and only after
    /// re-deriving the command from the re-read state.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }

    fn from_repository(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { id } => Self::NotFound { id },
            RepositoryError::ConcurrentModification {
                id,
                expected,
                actual,
            } => Self::VersionConflict {
                id,
                expected,
                actual,
            },
            other => Self::Repository(other),
        }
    }
}

// ============================================================================
// COORDINATOR
// ============================================================================

/// Serializes concurrent transition attempts on meetings.
///
/// Generic over the repository and the event sink so callers can inject
/// their own persistence and notification backends.
#[derive(Debug)]
pub struct NegotiationCoordinator<R, S> {
    repository: R,
    sink: S,
}

impl<R, S> NegotiationCoordinator<R, S>
where
    R: MeetingRepository,
    S: EventSink,
{
    /// Create a coordinator over the given repository and event sink.
    pub const fn new(repository: R, sink: S) -> Self {
        Self { repository, sink }
    }

    /// The repository this coordinator writes through.
    pub const fn repository(&self) -> &R {
        &self.repository
    }

    /// Create a meeting from the requester's initial proposal.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] for an invalid draft, or a
    /// repository error if the id already exists or storage fails.
    pub fn create(
        &self,
        draft: MeetingDraft,
        now: DateTime<Utc>,
    ) -> Result<Meeting, CoordinatorError> {
        let operation = Operation::Create;
        let (meeting, event) = match Meeting::propose(draft, now) {
            Ok(transition) => transition,
            Err(err) => {
                tracing::debug!(%operation, error = %err, "create rejected");
                return Err(err.into());
            }
        };
        self.repository
            .insert(&meeting)
            .map_err(CoordinatorError::from_repository)?;

        tracing::info!(
            meeting = %meeting.id,
            actor = %meeting.requester_id,
            %operation,
            "meeting proposed"
        );
        self.sink.publish(&event);
        Ok(meeting)
    }

    /// Apply one client-invoked transition against an expected version.
    ///
    /// On success the committed snapshot is returned and exactly one
    /// domain event is published. On any failure nothing is written and
    /// nothing is published.
    ///
    /// # Errors
    ///
    /// - [`CoordinatorError::NotFound`] — unknown meeting id
    /// - [`CoordinatorError::VersionConflict`] — the caller read a stale
    ///   version, or another writer won the race; re-read and decide
    /// - [`CoordinatorError::Transition`] — the state machine rejected
    ///   the request; the record is untouched
    /// - [`CoordinatorError::Repository`] — storage failure
    pub fn apply_transition(
        &self,
        id: &MeetingId,
        actor: &ParticipantId,
        expected_version: u64,
        command: TransitionCommand,
        now: DateTime<Utc>,
    ) -> Result<Meeting, CoordinatorError> {
        let operation = command.operation();
        let current = self
            .repository
            .load(id)
            .map_err(CoordinatorError::from_repository)?;

        if current.version != expected_version {
            return Err(CoordinatorError::VersionConflict {
                id: id.clone(),
                expected: expected_version,
                actual: current.version,
            });
        }

        let (next, event) = match current.apply(actor, command, now) {
            Ok(transition) => transition,
            Err(err) => {
                tracing::debug!(
                    meeting = %id,
                    %actor,
                    %operation,
                    error = %err,
                    "transition rejected"
                );
                return Err(err.into());
            }
        };

        self.repository
            .compare_and_swap(expected_version, &next)
            .map_err(CoordinatorError::from_repository)?;

        tracing::info!(
            meeting = %next.id,
            %actor,
            %operation,
            status = %next.status,
            version = next.version,
            "transition committed"
        );
        self.sink.publish(&event);
        Ok(next)
    }

    /// Complete every confirmed meeting whose end time has elapsed.
    ///
    /// Returns how many meetings were completed. Races lost to concurrent
    /// writers (say, a cancellation landing mid-sweep) are skipped; the
    /// next sweep re-observes whatever state won.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Repository`] on storage failure.
    pub fn run_completion_sweep(&self, now: DateTime<Utc>) -> Result<usize, CoordinatorError> {
        let due = self
            .repository
            .find_due_confirmed(now)
            .map_err(CoordinatorError::from_repository)?;

        let mut completed = 0;
        for meeting in due {
            match meeting.complete(now) {
                Ok(Some((next, event))) => {
                    match self.repository.compare_and_swap(meeting.version, &next) {
                        Ok(()) => {
                            tracing::info!(meeting = %next.id, "meeting completed");
                            self.sink.publish(&event);
                            completed += 1;
                        }
                        Err(
                            RepositoryError::ConcurrentModification { .. }
                            | RepositoryError::NotFound { .. },
                        ) => {
                            tracing::warn!(meeting = %meeting.id, "completion lost a race, skipping");
                        }
                        Err(err) => return Err(CoordinatorError::Repository(err)),
                    }
                }
                // Already completed, or the due list was stale and the
                // meeting moved on. Either way there is nothing to write.
                Ok(None) => {}
                Err(err) => {
                    tracing::debug!(meeting = %meeting.id, error = %err, "not completable");
                }
            }
        }
        Ok(completed)
    }

    /// Periodically run the completion sweep.
    ///
    /// Runs until the enclosing task is dropped. Sweep failures are
    /// logged and the loop keeps ticking.
    pub async fn run_sweeper(&self, period: std::time::Duration) {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            match self.run_completion_sweep(Utc::now()) {
                Ok(0) => {}
                Ok(count) => tracing::info!(completed = count, "completion sweep"),
                Err(err) => tracing::warn!(error = %err, "completion sweep failed"),
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

//! Attendance store: records of the batch being marked.

use super::{Correlated, random_base36, simulate_latency};
use crate::dataset::MockDataset;
use crate::error::OperationError;
use crate::types::{
    Attendance, AttendanceId, AttendanceStatus, BatchId, EventId, NewAttendance, UserId,
};
use eventhub_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec, try_effect};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Attendance store state
#[derive(Clone, Debug, Default)]
pub struct AttendanceState {
    /// Records of the loaded batch plus any marked since
    pub attendance_records: Vec<Attendance>,
    /// An operation is in flight
    pub is_loading: bool,
    /// Last failure
    pub error: Option<String>,
}

/// Actions for the attendance store
#[derive(Clone, Debug)]
pub enum AttendanceAction {
    // Commands
    /// Load the records of one batch of one event
    FetchAttendance {
        /// Correlation ID
        correlation_id: Uuid,
        /// Event
        event_id: EventId,
        /// Batch
        batch_id: BatchId,
    },
    /// Store a new record (never deduplicated)
    MarkAttendance {
        /// Correlation ID
        correlation_id: Uuid,
        /// Record without ID
        record: NewAttendance,
    },
    /// Change status and notes of a record
    UpdateAttendance {
        /// Correlation ID
        correlation_id: Uuid,
        /// Record
        attendance_id: AttendanceId,
        /// New status
        status: AttendanceStatus,
        /// New notes (replaces the old ones, `None` clears)
        notes: Option<String>,
    },
    /// Read one user's records at one event without touching the list
    GetUserAttendance {
        /// Correlation ID
        correlation_id: Uuid,
        /// User
        user_id: UserId,
        /// Event
        event_id: EventId,
    },
    /// Clear the error banner
    DismissError,

    // Outcomes
    /// Batch records loaded
    AttendanceLoaded {
        /// Correlation ID
        correlation_id: Uuid,
        /// Records
        records: Vec<Attendance>,
    },
    /// Record stored
    AttendanceMarked {
        /// Correlation ID
        correlation_id: Uuid,
        /// Stored record
        record: Attendance,
    },
    /// Record changed
    AttendanceUpdated {
        /// Correlation ID
        correlation_id: Uuid,
        /// Record
        attendance_id: AttendanceId,
        /// New status
        status: AttendanceStatus,
        /// New notes
        notes: Option<String>,
    },
    /// User records read
    UserAttendanceLoaded {
        /// Correlation ID
        correlation_id: Uuid,
        /// Records
        records: Vec<Attendance>,
    },
    /// Any command failed
    OperationFailed {
        /// Correlation ID
        correlation_id: Uuid,
        /// Failure
        error: OperationError,
    },
}

impl Correlated for AttendanceAction {
    fn correlation_id(&self) -> Option<Uuid> {
        match self {
            Self::FetchAttendance { correlation_id, .. }
            | Self::MarkAttendance { correlation_id, .. }
            | Self::UpdateAttendance { correlation_id, .. }
            | Self::GetUserAttendance { correlation_id, .. }
            | Self::AttendanceLoaded { correlation_id, .. }
            | Self::AttendanceMarked { correlation_id, .. }
            | Self::AttendanceUpdated { correlation_id, .. }
            | Self::UserAttendanceLoaded { correlation_id, .. }
            | Self::OperationFailed { correlation_id, .. } => Some(*correlation_id),
            Self::DismissError => None,
        }
    }

    fn failure(&self) -> Option<&OperationError> {
        match self {
            Self::OperationFailed { error, .. } => Some(error),
            _ => None,
        }
    }

    fn is_outcome(&self) -> bool {
        matches!(
            self,
            Self::AttendanceLoaded { .. }
                | Self::AttendanceMarked { .. }
                | Self::AttendanceUpdated { .. }
                | Self::UserAttendanceLoaded { .. }
                | Self::OperationFailed { .. }
        )
    }
}

/// Environment dependencies for the attendance store
#[derive(Clone)]
pub struct AttendanceEnvironment {
    /// Mock remote
    pub dataset: Arc<MockDataset>,
    /// Simulated round trip
    pub latency: Duration,
}

impl AttendanceEnvironment {
    /// Creates a new `AttendanceEnvironment`
    #[must_use]
    pub const fn new(dataset: Arc<MockDataset>, latency: Duration) -> Self {
        Self { dataset, latency }
    }
}

/// Reducer for the attendance store
#[derive(Clone, Debug, Default)]
pub struct AttendanceReducer;

impl AttendanceReducer {
    /// Creates a new `AttendanceReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for AttendanceReducer {
    type State = AttendanceState;
    type Action = AttendanceAction;
    type Environment = AttendanceEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let dataset = Arc::clone(&env.dataset);
        let latency = env.latency;

        match action {
            AttendanceAction::FetchAttendance {
                correlation_id,
                event_id,
                batch_id,
            } => {
                state.is_loading = true;
                state.error = None;
                smallvec![try_effect! {
                    run: async {
                        simulate_latency(latency).await;
                        dataset.attendance_for_batch(&event_id, &batch_id).await
                    },
                    ok: |records| AttendanceAction::AttendanceLoaded { correlation_id, records },
                    err: |error| AttendanceAction::OperationFailed { correlation_id, error }
                }]
            },

            AttendanceAction::MarkAttendance {
                correlation_id,
                record,
            } => {
                state.is_loading = true;
                state.error = None;
                let record = record.with_id(AttendanceId::new(random_base36(9)));
                smallvec![try_effect! {
                    run: async {
                        simulate_latency(latency).await;
                        dataset.insert_attendance(record).await
                    },
                    ok: |record| AttendanceAction::AttendanceMarked { correlation_id, record },
                    err: |error| AttendanceAction::OperationFailed { correlation_id, error }
                }]
            },

            AttendanceAction::UpdateAttendance {
                correlation_id,
                attendance_id,
                status,
                notes,
            } => {
                state.is_loading = true;
                state.error = None;
                let target = attendance_id.clone();
                let saved_notes = notes.clone();
                smallvec![try_effect! {
                    run: async move {
                        simulate_latency(latency).await;
                        dataset.update_attendance(&target, status, saved_notes).await
                    },
                    ok: |_unit| AttendanceAction::AttendanceUpdated {
                        correlation_id,
                        attendance_id,
                        status,
                        notes,
                    },
                    err: |error| AttendanceAction::OperationFailed { correlation_id, error }
                }]
            },

            AttendanceAction::GetUserAttendance {
                correlation_id,
                user_id,
                event_id,
            } => {
                state.is_loading = true;
                state.error = None;
                smallvec![try_effect! {
                    run: async {
                        simulate_latency(latency).await;
                        dataset.attendance_for_user(&user_id, &event_id).await
                    },
                    ok: |records| AttendanceAction::UserAttendanceLoaded {
                        correlation_id,
                        records,
                    },
                    err: |error| AttendanceAction::OperationFailed { correlation_id, error }
                }]
            },

            AttendanceAction::DismissError => {
                state.error = None;
                SmallVec::new()
            },

            AttendanceAction::AttendanceLoaded { records, .. } => {
                state.attendance_records = records;
                state.is_loading = false;
                SmallVec::new()
            },

            AttendanceAction::AttendanceMarked { record, .. } => {
                state.attendance_records.push(record);
                state.is_loading = false;
                SmallVec::new()
            },

            AttendanceAction::AttendanceUpdated {
                attendance_id,
                status,
                notes,
                ..
            } => {
                if let Some(record) = state
                    .attendance_records
                    .iter_mut()
                    .find(|r| r.id == attendance_id)
                {
                    record.status = status;
                    record.notes = notes;
                }
                state.is_loading = false;
                SmallVec::new()
            },

            AttendanceAction::UserAttendanceLoaded { .. } => {
                state.is_loading = false;
                SmallVec::new()
            },

            AttendanceAction::OperationFailed { error, .. } => {
                tracing::warn!(error = %error, "Attendance operation failed");
                state.error = Some(error.to_string());
                state.is_loading = false;
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::dataset::fixtures;
    use chrono::NaiveDate;
    use eventhub_testing::{ReducerTest, assertions, resolve_effects};

    fn environment() -> AttendanceEnvironment {
        AttendanceEnvironment::new(Arc::new(MockDataset::seeded()), Duration::ZERO)
    }

    fn record(id: &str, status: AttendanceStatus) -> Attendance {
        Attendance {
            id: AttendanceId::new(id),
            user_id: UserId::new(fixtures::ATTENDEE_ID),
            event_id: EventId::new(fixtures::ATTENDANCE_EVENT_ID),
            batch_id: BatchId::new(fixtures::ATTENDANCE_BATCH_ID),
            date: NaiveDate::from_ymd_opt(2025, 6, 20).unwrap(),
            status,
            notes: None,
        }
    }

    #[tokio::test]
    async fn mark_assigns_nine_character_id() {
        let env = environment();
        let mut state = AttendanceState::default();
        let new = NewAttendance {
            user_id: UserId::new(fixtures::ATTENDEE_ID),
            event_id: EventId::new(fixtures::ATTENDANCE_EVENT_ID),
            batch_id: BatchId::new(fixtures::ATTENDANCE_BATCH_ID),
            date: NaiveDate::from_ymd_opt(2025, 6, 20).unwrap(),
            status: AttendanceStatus::Present,
            notes: None,
        };
        let effects = AttendanceReducer::new().reduce(
            &mut state,
            AttendanceAction::MarkAttendance {
                correlation_id: Uuid::new_v4(),
                record: new,
            },
            &env,
        );
        assert!(state.is_loading);

        let outcomes = resolve_effects(effects.into_vec()).await;
        let [AttendanceAction::AttendanceMarked { record, .. }] = outcomes.as_slice() else {
            unreachable!("marking succeeds against the seeded dataset");
        };
        assert_eq!(record.id.as_str().len(), 9);
        assert!(record.id.as_str().chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn update_touches_only_the_matching_record() {
        ReducerTest::new(AttendanceReducer::new())
            .with_env(environment())
            .given_state(AttendanceState {
                attendance_records: vec![
                    record("a", AttendanceStatus::Present),
                    record("b", AttendanceStatus::Present),
                ],
                is_loading: true,
                error: None,
            })
            .when_action(AttendanceAction::AttendanceUpdated {
                correlation_id: Uuid::new_v4(),
                attendance_id: AttendanceId::new("b"),
                status: AttendanceStatus::Late,
                notes: Some("Bus delay".to_string()),
            })
            .then_state(|state| {
                assert_eq!(state.attendance_records[0].status, AttendanceStatus::Present);
                assert_eq!(state.attendance_records[1].status, AttendanceStatus::Late);
                assert_eq!(state.attendance_records[1].notes.as_deref(), Some("Bus delay"));
                assert!(!state.is_loading);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn user_read_leaves_list_alone() {
        ReducerTest::new(AttendanceReducer::new())
            .with_env(environment())
            .given_state(AttendanceState {
                attendance_records: vec![record("a", AttendanceStatus::Absent)],
                is_loading: true,
                error: None,
            })
            .when_action(AttendanceAction::UserAttendanceLoaded {
                correlation_id: Uuid::new_v4(),
                records: Vec::new(),
            })
            .then_state(|state| {
                assert_eq!(state.attendance_records.len(), 1);
                assert!(!state.is_loading);
            })
            .run();
    }
}

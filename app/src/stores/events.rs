//! Event store: the catalogue and the current user's enrollments.
//!
//! All remote work goes through [`Backend`]. Every mutation is applied only
//! after the backend confirmed it.

use super::Correlated;
use crate::backend::{Backend, EventPatch, NewEvent, NewRegistration};
use crate::error::OperationError;
use crate::mapper::{is_uuid_v4, map_enrollment, map_event};
use crate::types::{BatchId, Enrollment, EnrollmentId, EnrollmentStatus, Event, EventId, UserId};
use chrono::Months;
use eventhub_core::{
    SmallVec, effect::Effect, environment::Clock, reducer::Reducer, smallvec, try_effect,
};
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// State
// ============================================================================

/// Event store state
#[derive(Clone, Debug, Default)]
pub struct EventState {
    /// Mapped catalogue
    pub events: Vec<Event>,
    /// Enrollments of the current user, newest first after a fetch
    pub user_enrollments: Vec<Enrollment>,
    /// An operation is in flight
    pub is_loading: bool,
    /// Last failure, shown until dismissed or overwritten
    pub error: Option<String>,
}

// ============================================================================
// Actions
// ============================================================================

/// Actions for the event store
#[derive(Clone, Debug)]
pub enum EventAction {
    // Commands
    /// Load the whole catalogue
    FetchEvents {
        /// Correlation ID
        correlation_id: Uuid,
    },
    /// Load one event with its relations; the catalogue is left alone
    FetchEventById {
        /// Correlation ID
        correlation_id: Uuid,
        /// Event to load
        event_id: EventId,
    },
    /// Load a user's enrollments
    FetchUserEnrollments {
        /// Correlation ID
        correlation_id: Uuid,
        /// User (must be a UUID v4)
        user_id: UserId,
    },
    /// Register a user for an event
    EnrollInEvent {
        /// Correlation ID
        correlation_id: Uuid,
        /// User (must be a UUID v4)
        user_id: UserId,
        /// Event
        event_id: EventId,
        /// Optional batch; its enrollment count is incremented
        batch_id: Option<BatchId>,
    },
    /// Cancel an enrollment
    CancelEnrollment {
        /// Correlation ID
        correlation_id: Uuid,
        /// Enrollment
        enrollment_id: EnrollmentId,
    },
    /// Create an event
    CreateEvent {
        /// Correlation ID
        correlation_id: Uuid,
        /// New event
        event: NewEvent,
    },
    /// Update an event
    UpdateEvent {
        /// Correlation ID
        correlation_id: Uuid,
        /// Event
        event_id: EventId,
        /// Fields to change
        patch: EventPatch,
    },
    /// Clear the error banner
    DismissError,

    // Outcomes
    /// Catalogue loaded
    EventsLoaded {
        /// Correlation ID
        correlation_id: Uuid,
        /// Mapped events
        events: Vec<Event>,
    },
    /// One event loaded (`None` if it does not exist)
    EventLoaded {
        /// Correlation ID
        correlation_id: Uuid,
        /// Mapped event
        event: Option<Event>,
    },
    /// Enrollments loaded
    EnrollmentsLoaded {
        /// Correlation ID
        correlation_id: Uuid,
        /// Enrollments, newest first
        enrollments: Vec<Enrollment>,
    },
    /// Enrollment stored
    Enrolled {
        /// Correlation ID
        correlation_id: Uuid,
        /// The new enrollment with its event mapped
        enrollment: Enrollment,
    },
    /// Enrollment cancelled remotely
    EnrollmentCancelled {
        /// Correlation ID
        correlation_id: Uuid,
        /// Enrollment
        enrollment_id: EnrollmentId,
    },
    /// Event created
    EventCreated {
        /// Correlation ID
        correlation_id: Uuid,
        /// Mapped event
        event: Event,
    },
    /// Event updated
    EventUpdated {
        /// Correlation ID
        correlation_id: Uuid,
        /// Mapped event
        event: Event,
    },
    /// Any command failed
    OperationFailed {
        /// Correlation ID
        correlation_id: Uuid,
        /// Failure
        error: OperationError,
    },
}

impl Correlated for EventAction {
    fn correlation_id(&self) -> Option<Uuid> {
        match self {
            Self::FetchEvents { correlation_id }
            | Self::FetchEventById { correlation_id, .. }
            | Self::FetchUserEnrollments { correlation_id, .. }
            | Self::EnrollInEvent { correlation_id, .. }
            | Self::CancelEnrollment { correlation_id, .. }
            | Self::CreateEvent { correlation_id, .. }
            | Self::UpdateEvent { correlation_id, .. }
            | Self::EventsLoaded { correlation_id, .. }
            | Self::EventLoaded { correlation_id, .. }
            | Self::EnrollmentsLoaded { correlation_id, .. }
            | Self::Enrolled { correlation_id, .. }
            | Self::EnrollmentCancelled { correlation_id, .. }
            | Self::EventCreated { correlation_id, .. }
            | Self::EventUpdated { correlation_id, .. }
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
            Self::EventsLoaded { .. }
                | Self::EventLoaded { .. }
                | Self::EnrollmentsLoaded { .. }
                | Self::Enrolled { .. }
                | Self::EnrollmentCancelled { .. }
                | Self::EventCreated { .. }
                | Self::EventUpdated { .. }
                | Self::OperationFailed { .. }
        )
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Environment dependencies for the event store
#[derive(Clone)]
pub struct EventEnvironment {
    /// Hosted backend
    pub backend: Arc<dyn Backend>,
    /// Clock for enrollment windows and display dates
    pub clock: Arc<dyn Clock>,
    /// Validity window of a new enrollment
    pub enrollment_months: u32,
}

impl EventEnvironment {
    /// Creates a new `EventEnvironment`
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, clock: Arc<dyn Clock>, enrollment_months: u32) -> Self {
        Self {
            backend,
            clock,
            enrollment_months,
        }
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the event store
#[derive(Clone, Debug, Default)]
pub struct EventReducer;

impl EventReducer {
    /// Creates a new `EventReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn start(state: &mut EventState) {
        state.is_loading = true;
        state.error = None;
    }

    fn reject(correlation_id: Uuid, error: OperationError) -> Effect<EventAction> {
        Effect::send(EventAction::OperationFailed {
            correlation_id,
            error,
        })
    }

    fn fetch_events(correlation_id: Uuid, env: &EventEnvironment) -> Effect<EventAction> {
        let backend = Arc::clone(&env.backend);
        let clock = Arc::clone(&env.clock);
        tracing::debug!(auth = %backend.auth_handle(), "Fetching events");
        try_effect! {
            run: backend.list_events(),
            ok: |rows| EventAction::EventsLoaded {
                correlation_id,
                events: rows.into_iter().map(|row| map_event(row, clock.as_ref())).collect(),
            },
            err: |error| EventAction::OperationFailed { correlation_id, error: error.into() }
        }
    }

    fn enroll(
        correlation_id: Uuid,
        user_id: UserId,
        event_id: EventId,
        batch_id: Option<BatchId>,
        env: &EventEnvironment,
    ) -> Effect<EventAction> {
        let backend = Arc::clone(&env.backend);
        let clock = Arc::clone(&env.clock);
        let months = env.enrollment_months;

        try_effect! {
            run: async {
                let event = backend
                    .get_event_row(event_id.clone())
                    .await?
                    .ok_or(OperationError::EventNotFound)?;

                let start_date = clock.now();
                let end_date = start_date
                    .checked_add_months(Months::new(months))
                    .unwrap_or(start_date);

                let registration = backend
                    .insert_registration(NewRegistration {
                        user_id,
                        event_id,
                        batch_id: batch_id.clone(),
                        status: EnrollmentStatus::Pending,
                        start_date,
                        end_date,
                        total_amount: event.base_price,
                        final_amount: event.base_price,
                    })
                    .await?;

                if let Some(batch_id) = batch_id {
                    backend.increment_batch_enrollment(batch_id).await?;
                }

                Ok::<_, OperationError>(map_enrollment(registration, Some(event), clock.as_ref()))
            },
            ok: |enrollment| EventAction::Enrolled { correlation_id, enrollment },
            err: |error| EventAction::OperationFailed { correlation_id, error }
        }
    }
}

impl Reducer for EventReducer {
    type State = EventState;
    type Action = EventAction;
    type Environment = EventEnvironment;

    #[allow(clippy::too_many_lines)] // one arm per command and outcome
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // Commands
            EventAction::FetchEvents { correlation_id } => {
                Self::start(state);
                smallvec![Self::fetch_events(correlation_id, env)]
            },

            EventAction::FetchEventById {
                correlation_id,
                event_id,
            } => {
                Self::start(state);
                let backend = Arc::clone(&env.backend);
                let clock = Arc::clone(&env.clock);
                smallvec![try_effect! {
                    run: backend.get_event(event_id),
                    ok: |row| EventAction::EventLoaded {
                        correlation_id,
                        event: row.map(|row| map_event(row, clock.as_ref())),
                    },
                    err: |error| EventAction::OperationFailed {
                        correlation_id,
                        error: error.into(),
                    }
                }]
            },

            EventAction::FetchUserEnrollments {
                correlation_id,
                user_id,
            } => {
                Self::start(state);
                if !is_uuid_v4(user_id.as_str()) {
                    return smallvec![Self::reject(correlation_id, OperationError::InvalidUserId)];
                }
                let backend = Arc::clone(&env.backend);
                let clock = Arc::clone(&env.clock);
                smallvec![try_effect! {
                    run: backend.list_registrations(user_id),
                    ok: |rows| EventAction::EnrollmentsLoaded {
                        correlation_id,
                        enrollments: rows
                            .into_iter()
                            .map(|row| map_enrollment(row, None, clock.as_ref()))
                            .collect(),
                    },
                    err: |error| EventAction::OperationFailed {
                        correlation_id,
                        error: error.into(),
                    }
                }]
            },

            EventAction::EnrollInEvent {
                correlation_id,
                user_id,
                event_id,
                batch_id,
            } => {
                Self::start(state);
                if !is_uuid_v4(user_id.as_str()) {
                    return smallvec![Self::reject(correlation_id, OperationError::InvalidUserId)];
                }
                smallvec![Self::enroll(correlation_id, user_id, event_id, batch_id, env)]
            },

            EventAction::CancelEnrollment {
                correlation_id,
                enrollment_id,
            } => {
                Self::start(state);
                let backend = Arc::clone(&env.backend);
                smallvec![try_effect! {
                    run: backend.update_registration_status(
                        enrollment_id.clone(),
                        EnrollmentStatus::Cancelled,
                    ),
                    ok: |_unit| EventAction::EnrollmentCancelled { correlation_id, enrollment_id },
                    err: |error| EventAction::OperationFailed {
                        correlation_id,
                        error: error.into(),
                    }
                }]
            },

            EventAction::CreateEvent {
                correlation_id,
                event,
            } => {
                Self::start(state);
                let backend = Arc::clone(&env.backend);
                let clock = Arc::clone(&env.clock);
                smallvec![try_effect! {
                    run: backend.insert_event(event),
                    ok: |row| EventAction::EventCreated {
                        correlation_id,
                        event: map_event(row, clock.as_ref()),
                    },
                    err: |error| EventAction::OperationFailed {
                        correlation_id,
                        error: error.into(),
                    }
                }]
            },

            EventAction::UpdateEvent {
                correlation_id,
                event_id,
                patch,
            } => {
                Self::start(state);
                let backend = Arc::clone(&env.backend);
                let clock = Arc::clone(&env.clock);
                smallvec![try_effect! {
                    run: backend.update_event(event_id, patch),
                    ok: |row| EventAction::EventUpdated {
                        correlation_id,
                        event: map_event(row, clock.as_ref()),
                    },
                    err: |error| EventAction::OperationFailed {
                        correlation_id,
                        error: error.into(),
                    }
                }]
            },

            EventAction::DismissError => {
                state.error = None;
                SmallVec::new()
            },

            // Outcomes
            EventAction::EventsLoaded { events, .. } => {
                state.events = events;
                state.is_loading = false;
                SmallVec::new()
            },

            EventAction::EventLoaded { .. } => {
                state.is_loading = false;
                SmallVec::new()
            },

            EventAction::EnrollmentsLoaded { enrollments, .. } => {
                state.user_enrollments = enrollments;
                state.is_loading = false;
                SmallVec::new()
            },

            EventAction::Enrolled { enrollment, .. } => {
                state.user_enrollments.push(enrollment);
                state.is_loading = false;
                SmallVec::new()
            },

            EventAction::EnrollmentCancelled { enrollment_id, .. } => {
                if let Some(enrollment) = state
                    .user_enrollments
                    .iter_mut()
                    .find(|e| e.id == enrollment_id)
                {
                    enrollment.status = EnrollmentStatus::Cancelled;
                }
                state.is_loading = false;
                SmallVec::new()
            },

            EventAction::EventCreated { event, .. } => {
                state.events.push(event);
                state.is_loading = false;
                SmallVec::new()
            },

            EventAction::EventUpdated { event, .. } => {
                if let Some(existing) = state.events.iter_mut().find(|e| e.id == event.id) {
                    *existing = event;
                }
                state.is_loading = false;
                SmallVec::new()
            },

            EventAction::OperationFailed { error, .. } => {
                tracing::warn!(error = %error, "Event store operation failed");
                state.error = Some(error.to_string());
                state.is_loading = false;
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::types::{Money, PriceType};
    use eventhub_testing::{ReducerTest, assertions, resolve_effects, test_clock};

    fn environment() -> (InMemoryBackend, EventEnvironment) {
        let clock = Arc::new(test_clock());
        let backend = InMemoryBackend::new(clock.clone());
        let env = EventEnvironment::new(Arc::new(backend.clone()), clock, 1);
        (backend, env)
    }

    fn sample_event(id: &str) -> Event {
        let clock = test_clock();
        let now = clock.now();
        map_event(
            crate::backend::EventRecord {
                id: EventId::new(id),
                name: "Chess".to_string(),
                description: "Weekly games".to_string(),
                organizer_id: UserId::new("o1"),
                event_type: "regular".to_string(),
                price_type: PriceType::Weekly,
                base_price: Money::from_dollars(10),
                min_hours: None,
                min_weeks: None,
                min_months: None,
                created_at: now,
                updated_at: now,
                profile: None,
                batches: Vec::new(),
                discounts: Vec::new(),
            },
            &clock,
        )
    }

    #[test]
    fn fetch_sets_loading_and_clears_error() {
        let (_backend, env) = environment();
        ReducerTest::new(EventReducer::new())
            .with_env(env)
            .given_state(EventState {
                error: Some("old".to_string()),
                ..EventState::default()
            })
            .when_action(EventAction::FetchEvents {
                correlation_id: Uuid::new_v4(),
            })
            .then_state(|state| {
                assert!(state.is_loading);
                assert!(state.error.is_none());
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[tokio::test]
    async fn malformed_user_id_never_reaches_backend() {
        let (backend, env) = environment();
        let mut state = EventState::default();
        let correlation_id = Uuid::new_v4();

        let effects = EventReducer::new().reduce(
            &mut state,
            EventAction::FetchUserEnrollments {
                correlation_id,
                user_id: UserId::new("not-a-uuid"),
            },
            &env,
        );
        let outcomes = resolve_effects(effects.into_vec()).await;

        assert_eq!(backend.call_count(), 0);
        assert!(matches!(
            outcomes.as_slice(),
            [EventAction::OperationFailed { error: OperationError::InvalidUserId, .. }]
        ));
    }

    #[test]
    fn failure_sets_banner_and_stops_loading() {
        let (_backend, env) = environment();
        ReducerTest::new(EventReducer::new())
            .with_env(env)
            .given_state(EventState {
                is_loading: true,
                ..EventState::default()
            })
            .when_action(EventAction::OperationFailed {
                correlation_id: Uuid::new_v4(),
                error: OperationError::EventNotFound,
            })
            .then_state(|state| {
                assert!(!state.is_loading);
                assert_eq!(state.error.as_deref(), Some("Event not found"));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn update_replaces_matching_event_only() {
        let (_backend, env) = environment();
        let mut renamed = sample_event("e2");
        renamed.name = "Speed Chess".to_string();

        ReducerTest::new(EventReducer::new())
            .with_env(env)
            .given_state(EventState {
                events: vec![sample_event("e1"), sample_event("e2")],
                ..EventState::default()
            })
            .when_action(EventAction::EventUpdated {
                correlation_id: Uuid::new_v4(),
                event: renamed,
            })
            .then_state(|state| {
                assert_eq!(state.events[0].name, "Chess");
                assert_eq!(state.events[1].name, "Speed Chess");
            })
            .run();
    }

    #[test]
    fn dismiss_clears_error_only() {
        let (_backend, env) = environment();
        ReducerTest::new(EventReducer::new())
            .with_env(env)
            .given_state(EventState {
                events: vec![sample_event("e1")],
                error: Some("Event not found".to_string()),
                ..EventState::default()
            })
            .when_action(EventAction::DismissError)
            .then_state(|state| {
                assert!(state.error.is_none());
                assert_eq!(state.events.len(), 1);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn correlation_covers_commands_and_outcomes() {
        let id = Uuid::new_v4();
        let command = EventAction::FetchEvents { correlation_id: id };
        let outcome = EventAction::EventsLoaded {
            correlation_id: id,
            events: Vec::new(),
        };
        assert_eq!(command.correlation_id(), Some(id));
        assert!(!command.is_outcome());
        assert!(outcome.is_outcome());
        assert_eq!(EventAction::DismissError.correlation_id(), None);
    }
}

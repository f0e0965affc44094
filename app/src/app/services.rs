//! Store services - the operations the view layer calls.
//!
//! Each service owns one [`Store`] and turns a command into a request/response
//! call:
//! 1. Tag the command with a fresh correlation ID
//! 2. Send it and wait for the outcome with the same ID
//! 3. Return the outcome's payload, or its error
//!
//! State is only read through the store, so a service can be cloned freely.

use crate::backend::{EventPatch, NewEvent};
use crate::error::{OperationError, ServiceError, ServiceResult};
use crate::payment_gateway::PaymentRequest;
use crate::stores::{
    AttendanceAction, AttendanceEnvironment, AttendanceReducer, AttendanceState, AuthAction,
    AuthEnvironment, AuthReducer, AuthState, Correlated, EventAction, EventEnvironment,
    EventReducer, EventState, NotificationAction, NotificationEnvironment, NotificationReducer,
    NotificationState, PaymentAction, PaymentEnvironment, PaymentReducer, PaymentState,
    ProfileAction, ProfileEnvironment, ProfileReducer, ProfileState,
};
use crate::types::{
    Attendance, AttendanceId, AttendanceStatus, BatchId, Enrollment, EnrollmentId, Event, EventId,
    Money, NewAttendance, Notification, NotificationId, PaymentDetails, ProfilePatch, User,
    UserId, UserProfile,
};
use eventhub_core::reducer::Reducer;
use eventhub_runtime::Store;
use std::time::Duration;
use uuid::Uuid;

/// Event store
pub type EventStore = Store<EventState, EventAction, EventEnvironment, EventReducer>;
/// Attendance store
pub type AttendanceStore =
    Store<AttendanceState, AttendanceAction, AttendanceEnvironment, AttendanceReducer>;
/// Payment store
pub type PaymentStore = Store<PaymentState, PaymentAction, PaymentEnvironment, PaymentReducer>;
/// Auth store
pub type AuthStore = Store<AuthState, AuthAction, AuthEnvironment, AuthReducer>;
/// Notification store
pub type NotificationStore =
    Store<NotificationState, NotificationAction, NotificationEnvironment, NotificationReducer>;
/// Profile store
pub type ProfileStore = Store<ProfileState, ProfileAction, ProfileEnvironment, ProfileReducer>;

/// Send a command and wait for its outcome
///
/// Failed outcomes become [`ServiceError::Operation`]; the store has already
/// recorded the same error in its state.
async fn request<S, A, E, R>(
    store: &Store<S, A, E, R>,
    operation: &'static str,
    command: A,
    timeout: Duration,
) -> ServiceResult<A>
where
    R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
    A: Correlated + std::fmt::Debug + Send + Clone + 'static,
    S: Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    let correlation_id = command.correlation_id();
    tracing::debug!(operation, ?correlation_id, "Operation started");

    let outcome = store
        .send_and_wait_for(
            command,
            |action| action.is_outcome() && action.correlation_id() == correlation_id,
            timeout,
        )
        .await
        .inspect_err(|error| {
            tracing::warn!(operation, error = %error, "Operation did not complete");
        })?;

    if let Some(error) = outcome.failure() {
        tracing::warn!(operation, error = %error, "Operation failed");
        return Err(ServiceError::Operation(error.clone()));
    }

    tracing::debug!(operation, ?correlation_id, "Operation finished");
    Ok(outcome)
}

fn unexpected<A: std::fmt::Debug>(outcome: &A) -> ServiceError {
    ServiceError::UnexpectedOutcome(format!("{outcome:?}"))
}

// ============================================================================
// Events
// ============================================================================

/// Catalogue, enrollments and organizer operations
#[derive(Clone)]
pub struct EventService {
    store: EventStore,
    timeout: Duration,
}

impl EventService {
    /// Create a service around an event store
    #[must_use]
    pub const fn new(store: EventStore, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Load and map the whole catalogue, replacing the cached list
    ///
    /// # Errors
    ///
    /// Returns the backend failure or a store error.
    pub async fn fetch_events(&self) -> ServiceResult<Vec<Event>> {
        let command = EventAction::FetchEvents {
            correlation_id: Uuid::new_v4(),
        };
        match request(&self.store, "fetch_events", command, self.timeout).await? {
            EventAction::EventsLoaded { events, .. } => Ok(events),
            other => Err(unexpected(&other)),
        }
    }

    /// Load one event with organizer, batches and discounts
    ///
    /// The cached catalogue is not touched. A missing event is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns the backend failure or a store error.
    pub async fn fetch_event_by_id(&self, event_id: EventId) -> ServiceResult<Option<Event>> {
        let command = EventAction::FetchEventById {
            correlation_id: Uuid::new_v4(),
            event_id,
        };
        match request(&self.store, "fetch_event_by_id", command, self.timeout).await? {
            EventAction::EventLoaded { event, .. } => Ok(event),
            other => Err(unexpected(&other)),
        }
    }

    /// Load a user's enrollments, newest first
    ///
    /// # Errors
    ///
    /// [`OperationError::InvalidUserId`] if `user_id` is not a UUID v4; the
    /// backend is not called in that case.
    pub async fn fetch_user_enrollments(&self, user_id: UserId) -> ServiceResult<Vec<Enrollment>> {
        let command = EventAction::FetchUserEnrollments {
            correlation_id: Uuid::new_v4(),
            user_id,
        };
        match request(&self.store, "fetch_user_enrollments", command, self.timeout).await? {
            EventAction::EnrollmentsLoaded { enrollments, .. } => Ok(enrollments),
            other => Err(unexpected(&other)),
        }
    }

    /// Register a user for an event, optionally in a batch
    ///
    /// # Errors
    ///
    /// [`OperationError::InvalidUserId`], [`OperationError::EventNotFound`] or
    /// the backend failure.
    pub async fn enroll_in_event(
        &self,
        user_id: UserId,
        event_id: EventId,
        batch_id: Option<BatchId>,
    ) -> ServiceResult<Enrollment> {
        let command = EventAction::EnrollInEvent {
            correlation_id: Uuid::new_v4(),
            user_id,
            event_id,
            batch_id,
        };
        match request(&self.store, "enroll_in_event", command, self.timeout).await? {
            EventAction::Enrolled { enrollment, .. } => Ok(enrollment),
            other => Err(unexpected(&other)),
        }
    }

    /// Cancel an enrollment
    ///
    /// # Errors
    ///
    /// Returns the backend failure or a store error.
    pub async fn cancel_enrollment(&self, enrollment_id: EnrollmentId) -> ServiceResult<()> {
        let command = EventAction::CancelEnrollment {
            correlation_id: Uuid::new_v4(),
            enrollment_id,
        };
        match request(&self.store, "cancel_enrollment", command, self.timeout).await? {
            EventAction::EnrollmentCancelled { .. } => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    /// Create an event and add it to the catalogue
    ///
    /// # Errors
    ///
    /// Returns the backend failure or a store error.
    pub async fn create_event(&self, event: NewEvent) -> ServiceResult<Event> {
        let command = EventAction::CreateEvent {
            correlation_id: Uuid::new_v4(),
            event,
        };
        match request(&self.store, "create_event", command, self.timeout).await? {
            EventAction::EventCreated { event, .. } => Ok(event),
            other => Err(unexpected(&other)),
        }
    }

    /// Update an event and replace its cached entry
    ///
    /// # Errors
    ///
    /// Returns the backend failure or a store error.
    pub async fn update_event(&self, event_id: EventId, patch: EventPatch) -> ServiceResult<Event> {
        let command = EventAction::UpdateEvent {
            correlation_id: Uuid::new_v4(),
            event_id,
            patch,
        };
        match request(&self.store, "update_event", command, self.timeout).await? {
            EventAction::EventUpdated { event, .. } => Ok(event),
            other => Err(unexpected(&other)),
        }
    }

    /// Cached events organized by this user
    pub async fn organizer_events(&self, organizer_id: &UserId) -> Vec<Event> {
        self.store
            .state(|s| {
                s.events
                    .iter()
                    .filter(|e| &e.organizer_id == organizer_id)
                    .cloned()
                    .collect()
            })
            .await
    }

    /// Snapshot of the store state
    pub async fn snapshot(&self) -> EventState {
        self.store.state(Clone::clone).await
    }

    /// Clear the error banner
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] if the store is shutting down.
    pub async fn dismiss_error(&self) -> ServiceResult<()> {
        self.store.send(EventAction::DismissError).await?;
        Ok(())
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &EventStore {
        &self.store
    }
}

// ============================================================================
// Attendance
// ============================================================================

/// Attendance marking for organizers
#[derive(Clone)]
pub struct AttendanceService {
    store: AttendanceStore,
    timeout: Duration,
}

impl AttendanceService {
    /// Create a service around an attendance store
    #[must_use]
    pub const fn new(store: AttendanceStore, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Load the records of one batch, replacing the cached list
    ///
    /// # Errors
    ///
    /// Returns the dataset failure or a store error.
    pub async fn fetch_attendance(
        &self,
        event_id: EventId,
        batch_id: BatchId,
    ) -> ServiceResult<Vec<Attendance>> {
        let command = AttendanceAction::FetchAttendance {
            correlation_id: Uuid::new_v4(),
            event_id,
            batch_id,
        };
        match request(&self.store, "fetch_attendance", command, self.timeout).await? {
            AttendanceAction::AttendanceLoaded { records, .. } => Ok(records),
            other => Err(unexpected(&other)),
        }
    }

    /// Store a new record; an existing record for the same day is kept too
    ///
    /// # Errors
    ///
    /// Returns the dataset failure or a store error.
    pub async fn mark_attendance(&self, record: NewAttendance) -> ServiceResult<Attendance> {
        let command = AttendanceAction::MarkAttendance {
            correlation_id: Uuid::new_v4(),
            record,
        };
        match request(&self.store, "mark_attendance", command, self.timeout).await? {
            AttendanceAction::AttendanceMarked { record, .. } => Ok(record),
            other => Err(unexpected(&other)),
        }
    }

    /// Replace status and notes of a record
    ///
    /// # Errors
    ///
    /// Returns the dataset failure or a store error.
    pub async fn update_attendance(
        &self,
        attendance_id: AttendanceId,
        status: AttendanceStatus,
        notes: Option<String>,
    ) -> ServiceResult<()> {
        let command = AttendanceAction::UpdateAttendance {
            correlation_id: Uuid::new_v4(),
            attendance_id,
            status,
            notes,
        };
        match request(&self.store, "update_attendance", command, self.timeout).await? {
            AttendanceAction::AttendanceUpdated { .. } => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    /// One user's records at one event; the cached list is not touched
    ///
    /// # Errors
    ///
    /// Returns the dataset failure or a store error.
    pub async fn get_user_attendance(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> ServiceResult<Vec<Attendance>> {
        let command = AttendanceAction::GetUserAttendance {
            correlation_id: Uuid::new_v4(),
            user_id,
            event_id,
        };
        match request(&self.store, "get_user_attendance", command, self.timeout).await? {
            AttendanceAction::UserAttendanceLoaded { records, .. } => Ok(records),
            other => Err(unexpected(&other)),
        }
    }

    /// Mark or correct a user's attendance for a batch on a date
    ///
    /// Updates the cached record with the same user, batch and date if there
    /// is one, otherwise marks a new record.
    ///
    /// # Errors
    ///
    /// Returns the dataset failure or a store error.
    pub async fn record_attendance(&self, record: NewAttendance) -> ServiceResult<Attendance> {
        let existing = self
            .store
            .state(|s| {
                s.attendance_records
                    .iter()
                    .find(|r| {
                        r.user_id == record.user_id
                            && r.batch_id == record.batch_id
                            && r.date == record.date
                    })
                    .cloned()
            })
            .await;

        match existing {
            Some(existing) => {
                self.update_attendance(existing.id.clone(), record.status, record.notes.clone())
                    .await?;
                Ok(Attendance {
                    status: record.status,
                    notes: record.notes,
                    ..existing
                })
            },
            None => self.mark_attendance(record).await,
        }
    }

    /// Snapshot of the store state
    pub async fn snapshot(&self) -> AttendanceState {
        self.store.state(Clone::clone).await
    }

    /// Clear the error banner
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] if the store is shutting down.
    pub async fn dismiss_error(&self) -> ServiceResult<()> {
        self.store.send(AttendanceAction::DismissError).await?;
        Ok(())
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &AttendanceStore {
        &self.store
    }
}

// ============================================================================
// Payment
// ============================================================================

/// Payment processing
#[derive(Clone)]
pub struct PaymentService {
    store: PaymentStore,
    timeout: Duration,
}

impl PaymentService {
    /// Create a service around a payment store
    #[must_use]
    pub const fn new(store: PaymentStore, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Charge a user for an event
    ///
    /// # Errors
    ///
    /// [`OperationError::Payment`] when the gateway refuses, or a store error.
    pub async fn process_payment(
        &self,
        user_id: UserId,
        event_id: EventId,
        amount: Money,
        payment_method: impl Into<String>,
    ) -> ServiceResult<PaymentDetails> {
        let command = PaymentAction::ProcessPayment {
            correlation_id: Uuid::new_v4(),
            request: PaymentRequest {
                user_id,
                event_id,
                amount,
                payment_method: payment_method.into(),
            },
        };
        match request(&self.store, "process_payment", command, self.timeout).await? {
            PaymentAction::PaymentProcessed { payment, .. } => Ok(payment),
            other => Err(unexpected(&other)),
        }
    }

    /// Snapshot of the store state
    pub async fn snapshot(&self) -> PaymentState {
        self.store.state(Clone::clone).await
    }

    /// Clear the error banner
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] if the store is shutting down.
    pub async fn dismiss_error(&self) -> ServiceResult<()> {
        self.store.send(PaymentAction::DismissError).await?;
        Ok(())
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &PaymentStore {
        &self.store
    }
}

// ============================================================================
// Auth
// ============================================================================

/// Placeholder authentication
#[derive(Clone)]
pub struct AuthService {
    store: AuthStore,
    timeout: Duration,
}

impl AuthService {
    /// Create a service around an auth store
    #[must_use]
    pub const fn new(store: AuthStore, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Sign in
    ///
    /// # Errors
    ///
    /// [`OperationError::InvalidCredentials`] for an unknown email or a wrong
    /// password.
    pub async fn login(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> ServiceResult<User> {
        let command = AuthAction::Login {
            correlation_id: Uuid::new_v4(),
            email: email.into(),
            password: password.into(),
        };
        match request(&self.store, "login", command, self.timeout).await? {
            AuthAction::LoggedIn { user, .. } => Ok(user),
            other => Err(unexpected(&other)),
        }
    }

    /// Create an account and sign in as it
    ///
    /// # Errors
    ///
    /// [`OperationError::EmailInUse`] if the email belongs to a known user.
    pub async fn register(
        &self,
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> ServiceResult<User> {
        let command = AuthAction::Register {
            correlation_id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            password: password.into(),
        };
        match request(&self.store, "register", command, self.timeout).await? {
            AuthAction::Registered { user, .. } => Ok(user),
            other => Err(unexpected(&other)),
        }
    }

    /// Sign out
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] if the store is shutting down.
    pub async fn logout(&self) -> ServiceResult<()> {
        self.store.send(AuthAction::Logout).await?;
        Ok(())
    }

    /// Check that a reset mail could be sent; nothing is sent
    ///
    /// # Errors
    ///
    /// [`OperationError::EmailNotFound`] for an unknown email.
    pub async fn reset_password(&self, email: impl Into<String>) -> ServiceResult<()> {
        let command = AuthAction::ResetPassword {
            correlation_id: Uuid::new_v4(),
            email: email.into(),
        };
        match request(&self.store, "reset_password", command, self.timeout).await? {
            AuthAction::PasswordResetRequested { .. } => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    /// Signed-in user
    pub async fn current_user(&self) -> Option<User> {
        self.store.state(|s| s.user.clone()).await
    }

    /// Snapshot of the store state
    pub async fn snapshot(&self) -> AuthState {
        self.store.state(Clone::clone).await
    }

    /// Clear the error banner
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] if the store is shutting down.
    pub async fn dismiss_error(&self) -> ServiceResult<()> {
        self.store.send(AuthAction::DismissError).await?;
        Ok(())
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &AuthStore {
        &self.store
    }
}

// ============================================================================
// Notifications
// ============================================================================

/// Notification inbox
#[derive(Clone)]
pub struct NotificationService {
    store: NotificationStore,
    timeout: Duration,
}

impl NotificationService {
    /// Create a service around a notification store
    #[must_use]
    pub const fn new(store: NotificationStore, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Load a user's notifications
    ///
    /// # Errors
    ///
    /// Returns the dataset failure or a store error.
    pub async fn fetch_notifications(&self, user_id: UserId) -> ServiceResult<Vec<Notification>> {
        let command = NotificationAction::FetchNotifications {
            correlation_id: Uuid::new_v4(),
            user_id,
        };
        match request(&self.store, "fetch_notifications", command, self.timeout).await? {
            NotificationAction::NotificationsLoaded { notifications, .. } => Ok(notifications),
            other => Err(unexpected(&other)),
        }
    }

    /// Mark one notification read
    ///
    /// # Errors
    ///
    /// Returns the dataset failure or a store error.
    pub async fn mark_as_read(&self, notification_id: NotificationId) -> ServiceResult<()> {
        let command = NotificationAction::MarkAsRead {
            correlation_id: Uuid::new_v4(),
            notification_id,
        };
        match request(&self.store, "mark_as_read", command, self.timeout).await? {
            NotificationAction::MarkedAsRead { .. } => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    /// Mark every loaded notification read
    ///
    /// # Errors
    ///
    /// Returns the dataset failure or a store error.
    pub async fn mark_all_as_read(&self) -> ServiceResult<()> {
        let command = NotificationAction::MarkAllAsRead {
            correlation_id: Uuid::new_v4(),
        };
        match request(&self.store, "mark_all_as_read", command, self.timeout).await? {
            NotificationAction::AllMarkedAsRead { .. } => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    /// Unread notifications of the loaded user
    pub async fn unread_count(&self) -> usize {
        self.store.state(|s| s.unread_count).await
    }

    /// Snapshot of the store state
    pub async fn snapshot(&self) -> NotificationState {
        self.store.state(Clone::clone).await
    }

    /// Clear the error banner
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] if the store is shutting down.
    pub async fn dismiss_error(&self) -> ServiceResult<()> {
        self.store.send(NotificationAction::DismissError).await?;
        Ok(())
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &NotificationStore {
        &self.store
    }
}

// ============================================================================
// Profile
// ============================================================================

/// Profile page
#[derive(Clone)]
pub struct ProfileService {
    store: ProfileStore,
    timeout: Duration,
}

impl ProfileService {
    /// Create a service around a profile store
    #[must_use]
    pub const fn new(store: ProfileStore, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Build a user's profile
    ///
    /// # Errors
    ///
    /// [`OperationError::UserNotFound`] for an unknown user.
    pub async fn fetch_user_profile(&self, user_id: UserId) -> ServiceResult<UserProfile> {
        let command = ProfileAction::FetchUserProfile {
            correlation_id: Uuid::new_v4(),
            user_id,
        };
        match request(&self.store, "fetch_user_profile", command, self.timeout).await? {
            ProfileAction::ProfileLoaded { profile, .. } => Ok(profile),
            other => Err(unexpected(&other)),
        }
    }

    /// Merge fields into the loaded profile and return the result
    ///
    /// # Errors
    ///
    /// [`OperationError::ProfileNotLoaded`] unless this user's profile is loaded.
    pub async fn update_user_profile(
        &self,
        user_id: UserId,
        patch: ProfilePatch,
    ) -> ServiceResult<UserProfile> {
        let command = ProfileAction::UpdateUserProfile {
            correlation_id: Uuid::new_v4(),
            user_id,
            patch,
        };
        match request(&self.store, "update_user_profile", command, self.timeout).await? {
            ProfileAction::ProfileUpdated { .. } => self
                .store
                .state(|s| s.profile.clone())
                .await
                .ok_or(ServiceError::Operation(OperationError::ProfileNotLoaded)),
            other => Err(unexpected(&other)),
        }
    }

    /// Snapshot of the store state
    pub async fn snapshot(&self) -> ProfileState {
        self.store.state(Clone::clone).await
    }

    /// Clear the error banner
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] if the store is shutting down.
    pub async fn dismiss_error(&self) -> ServiceResult<()> {
        self.store.send(ProfileAction::DismissError).await?;
        Ok(())
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &ProfileStore {
        &self.store
    }
}

//! Backend client abstraction.
//!
//! The hosted backend offers table reads with relation embedding, inserts,
//! updates, one remote procedure (`increment_batch_enrollment`) and an auth
//! handle that is only logged. [`Backend`] is that surface; the event store
//! talks to nothing else. [`InMemoryBackend`] implements it for tests and the
//! demo.

use crate::error::BackendError;
use crate::types::{
    Batch, BatchId, Discount, EnrollmentId, EnrollmentStatus, EventId, Money, PriceType, UserId,
};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

mod memory;

pub use memory::InMemoryBackend;

/// Backend call result
pub type BackendResult<T> = Result<T, BackendError>;

/// Boxed future returned by [`Backend`] methods
pub type BackendFuture<T> = BoxFuture<'static, BackendResult<T>>;

/// Organizer profile embedded in an event row
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizerProfile {
    /// Profile ID (same as the user ID)
    pub id: UserId,
    /// Display name
    pub full_name: Option<String>,
}

/// Raw `events` row with whatever relations the query embedded
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event ID
    pub id: EventId,
    /// Name
    pub name: String,
    /// Description
    pub description: String,
    /// Organizer
    pub organizer_id: UserId,
    /// Raw type column; may hold values the app does not know
    pub event_type: String,
    /// Billing period
    pub price_type: PriceType,
    /// Price per period
    pub base_price: Money,
    /// Minimum hours
    pub min_hours: Option<u32>,
    /// Minimum weeks
    pub min_weeks: Option<u32>,
    /// Minimum months
    pub min_months: Option<u32>,
    /// Created
    pub created_at: DateTime<Utc>,
    /// Updated
    pub updated_at: DateTime<Utc>,
    /// Embedded organizer profile
    pub profile: Option<OrganizerProfile>,
    /// Embedded batches, in insertion order
    pub batches: Vec<Batch>,
    /// Embedded discounts
    pub discounts: Vec<Discount>,
}

/// Raw `registrations` row, optionally with its event embedded
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    /// Registration ID
    pub id: EnrollmentId,
    /// User
    pub user_id: UserId,
    /// Event
    pub event_id: EventId,
    /// Batch
    pub batch_id: Option<BatchId>,
    /// Hours bought
    pub hours_registered: Option<u32>,
    /// Weeks bought
    pub weeks_registered: Option<u32>,
    /// Months bought
    pub months_registered: Option<u32>,
    /// Charge before discount
    pub total_amount: Money,
    /// Discount taken off
    pub discount_applied: Money,
    /// Amount charged
    pub final_amount: Money,
    /// Status
    pub status: EnrollmentStatus,
    /// Validity start
    pub start_date: DateTime<Utc>,
    /// Validity end
    pub end_date: DateTime<Utc>,
    /// Created
    pub created_at: DateTime<Utc>,
    /// Updated
    pub updated_at: DateTime<Utc>,
    /// Embedded event
    pub event: Option<EventRecord>,
}

/// Insert payload for `registrations`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRegistration {
    /// User
    pub user_id: UserId,
    /// Event
    pub event_id: EventId,
    /// Batch
    pub batch_id: Option<BatchId>,
    /// Initial status
    pub status: EnrollmentStatus,
    /// Validity start
    pub start_date: DateTime<Utc>,
    /// Validity end
    pub end_date: DateTime<Utc>,
    /// Charge before discount
    pub total_amount: Money,
    /// Amount charged
    pub final_amount: Money,
}

/// Insert payload for `events`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    /// Name
    pub name: String,
    /// Description
    pub description: String,
    /// Organizer
    pub organizer_id: UserId,
    /// Raw type
    pub event_type: String,
    /// Billing period
    pub price_type: PriceType,
    /// Price per period
    pub base_price: Money,
    /// Minimum hours
    pub min_hours: Option<u32>,
    /// Minimum weeks
    pub min_weeks: Option<u32>,
    /// Minimum months
    pub min_months: Option<u32>,
}

/// Partial update for `events`; `None` leaves the column unchanged
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPatch {
    /// Name
    pub name: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Raw type
    pub event_type: Option<String>,
    /// Billing period
    pub price_type: Option<PriceType>,
    /// Price per period
    pub base_price: Option<Money>,
    /// Minimum hours
    pub min_hours: Option<u32>,
    /// Minimum weeks
    pub min_weeks: Option<u32>,
    /// Minimum months
    pub min_months: Option<u32>,
}

/// Hosted backend surface used by the event store
pub trait Backend: Send + Sync {
    /// Description of the auth handle, for diagnostic logging only
    fn auth_handle(&self) -> String;

    /// `select *` from `events`; relations may be empty
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or rejects the query.
    fn list_events(&self) -> BackendFuture<Vec<EventRecord>>;

    /// One event with organizer profile, batches and discounts embedded
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or rejects the query.
    fn get_event(&self, id: EventId) -> BackendFuture<Option<EventRecord>>;

    /// One bare event row, without relations
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or rejects the query.
    fn get_event_row(&self, id: EventId) -> BackendFuture<Option<EventRecord>>;

    /// A user's registrations with their event (profile and batches)
    /// embedded, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or rejects the query.
    fn list_registrations(&self, user_id: UserId) -> BackendFuture<Vec<RegistrationRecord>>;

    /// Insert a registration and return the stored row
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or rejects the insert.
    fn insert_registration(
        &self,
        registration: NewRegistration,
    ) -> BackendFuture<RegistrationRecord>;

    /// Set the status of a registration
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if no registration has this ID.
    fn update_registration_status(
        &self,
        id: EnrollmentId,
        status: EnrollmentStatus,
    ) -> BackendFuture<()>;

    /// Remote procedure `increment_batch_enrollment`
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if no batch has this ID.
    fn increment_batch_enrollment(&self, batch_id: BatchId) -> BackendFuture<()>;

    /// Insert an event and return the stored row
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or rejects the insert.
    fn insert_event(&self, event: NewEvent) -> BackendFuture<EventRecord>;

    /// Update an event and return the stored row
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if no event has this ID.
    fn update_event(&self, id: EventId, patch: EventPatch) -> BackendFuture<EventRecord>;
}

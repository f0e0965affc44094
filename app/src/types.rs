//! Domain types for EventHub.
//!
//! Records shared by every store: users, events and their batches, discounts,
//! enrollments, attendance, notifications, payments and profiles. Display-only
//! event fields are produced by [`crate::mapper`] and never persisted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an identifier string
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw identifier
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(id: uuid::Uuid) -> Self {
                Self(id.to_string())
            }
        }
    };
}

string_id!(
    /// Identifier of a user (UUID v4 for backend-issued accounts)
    UserId
);
string_id!(
    /// Identifier of an event row
    EventId
);
string_id!(
    /// Identifier of a batch (a scheduled session of an event)
    BatchId
);
string_id!(
    /// Identifier of a registration row
    EnrollmentId
);
string_id!(
    /// Identifier of an attendance record
    AttendanceId
);
string_id!(
    /// Identifier of a notification
    NotificationId
);
string_id!(
    /// Identifier of a processed payment
    PaymentId
);

// ============================================================================
// Money
// ============================================================================

/// Amount of money in cents
///
/// Stored as integer cents so price buckets and charge fields compare exactly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Creates money from whole dollars
    #[must_use]
    pub const fn from_dollars(dollars: u64) -> Self {
        Self(dollars * 100)
    }

    /// Creates money from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Gets the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// True for a zero amount
    #[must_use]
    pub const fn is_free(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Users
// ============================================================================

/// Role of a user
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular attendee
    User,
    /// Creates and runs events
    Organizer,
    /// Full access
    Admin,
}

/// A user account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User ID
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
    /// Role
    pub role: Role,
    /// Avatar URL
    pub avatar: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
    /// Postal address
    pub address: Option<String>,
    /// Join date (`YYYY-MM-DD`)
    pub join_date: Option<String>,
}

impl User {
    /// Organizers and admins see the organizer dashboard
    #[must_use]
    pub const fn can_manage_events(&self) -> bool {
        matches!(self.role, Role::Organizer | Role::Admin)
    }
}

// ============================================================================
// Events
// ============================================================================

/// Known event levels
///
/// Raw records carry the type as free text; unknown values still map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// Regular level
    Regular,
    /// Intermediate level
    Intermediate,
    /// Advanced level
    Advanced,
    /// Summer program
    Summer,
}

impl EventType {
    /// All known types
    pub const ALL: [Self; 4] = [Self::Regular, Self::Intermediate, Self::Advanced, Self::Summer];

    /// Parses the raw `event_type` column
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "regular" => Some(Self::Regular),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            "summer" => Some(Self::Summer),
            _ => None,
        }
    }

    /// Raw column value
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Summer => "summer",
        }
    }
}

/// Billing period of an event's base price
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceType {
    /// Per hour
    Hourly,
    /// Per week
    Weekly,
    /// Per month
    Monthly,
}

/// A scheduled session of an event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    /// Batch ID
    pub id: BatchId,
    /// Parent event
    pub event_id: EventId,
    /// Batch name
    pub name: String,
    /// Free-form schedule, shown as the event location
    pub schedule: String,
    /// Start time (`HH:MM:SS`)
    pub start_time: String,
    /// End time (`HH:MM:SS`)
    pub end_time: String,
    /// Weekday labels
    pub working_days: Vec<String>,
    /// Seats
    pub capacity: u32,
    /// Seats taken; the backend keeps this at or below `capacity`
    pub enrolled: u32,
    /// Created
    pub created_at: DateTime<Utc>,
    /// Updated
    pub updated_at: DateTime<Utc>,
}

/// Kind of discount
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// Seasonal promotion
    Seasonal,
    /// Multiple registrations
    Bulk,
    /// Registering early
    EarlyBird,
}

/// A discount offered on an event
///
/// Carried for display; enrollment charges never apply it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    /// Discount ID
    pub id: String,
    /// Event this applies to
    pub event_id: EventId,
    /// Name
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Type
    pub discount_type: DiscountType,
    /// Percentage off
    pub percentage: u8,
    /// Minimum registration value for the discount to apply
    pub min_registration_value: Option<Money>,
    /// Valid from
    pub valid_from: DateTime<Utc>,
    /// Valid until
    pub valid_until: DateTime<Utc>,
    /// Created
    pub created_at: DateTime<Utc>,
    /// Updated
    pub updated_at: DateTime<Utc>,
}

/// A view-ready event
///
/// Produced only by [`crate::mapper::map_event`]. The trailing display fields
/// (`category` through `image_url`) are derived, never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event ID
    pub id: EventId,
    /// Name
    pub name: String,
    /// Description
    pub description: String,
    /// Organizer
    pub organizer_id: UserId,
    /// Organizer display name
    pub organizer_name: String,
    /// Raw event type
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
    /// Scheduled sessions
    pub batches: Vec<Batch>,
    /// Discounts on offer
    pub discounts: Vec<Discount>,
    /// Capitalized event type
    pub category: String,
    /// Display date
    pub date: String,
    /// `HH:MM - HH:MM` of the first batch
    pub time: String,
    /// First batch schedule
    pub location: String,
    /// First batch capacity
    pub capacity: u32,
    /// First batch enrollment
    pub enrolled: u32,
    /// Cover image
    pub image_url: String,
}

/// How full an event is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillLevel {
    /// Below 70%
    Open,
    /// 70% to 89%
    Filling,
    /// 90% and above
    AlmostFull,
}

impl Event {
    /// Seats left in the first batch
    #[must_use]
    pub const fn remaining_spots(&self) -> u32 {
        self.capacity.saturating_sub(self.enrolled)
    }

    /// Percent of seats taken, 0 when there is no capacity
    #[must_use]
    pub fn percent_full(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        f64::from(self.enrolled) / f64::from(self.capacity) * 100.0
    }

    /// No seats left
    #[must_use]
    pub const fn is_sold_out(&self) -> bool {
        self.capacity > 0 && self.enrolled >= self.capacity
    }

    /// Occupancy bucket used for badges
    #[must_use]
    pub fn fill_level(&self) -> FillLevel {
        let percent = self.percent_full();
        if percent >= 90.0 {
            FillLevel::AlmostFull
        } else if percent >= 70.0 {
            FillLevel::Filling
        } else {
            FillLevel::Open
        }
    }
}

// ============================================================================
// Enrollments
// ============================================================================

/// Registration status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    /// Awaiting confirmation
    Pending,
    /// In progress
    Active,
    /// Finished
    Completed,
    /// Cancelled by the user
    Cancelled,
}

/// A user's registration for an event, with the mapped event embedded
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    /// Registration ID
    pub id: EnrollmentId,
    /// Registered user
    pub user_id: UserId,
    /// Event
    pub event_id: EventId,
    /// Chosen batch
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
    /// The event, mapped for display
    pub event: Option<Event>,
}

// ============================================================================
// Attendance
// ============================================================================

/// Attendance mark
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    /// On time
    Present,
    /// Did not attend
    Absent,
    /// Arrived late
    Late,
}

impl AttendanceStatus {
    /// Weight used by the attendance heatmap
    #[must_use]
    pub const fn heat_weight(&self) -> f32 {
        match self {
            Self::Present => 1.0,
            Self::Late => 0.5,
            Self::Absent => 0.0,
        }
    }

    /// Counts toward the attendance rate
    #[must_use]
    pub const fn is_attended(&self) -> bool {
        matches!(self, Self::Present | Self::Late)
    }
}

/// One attendance mark for a user in a batch on a date
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    /// Record ID
    pub id: AttendanceId,
    /// Attendee
    pub user_id: UserId,
    /// Event
    pub event_id: EventId,
    /// Batch
    pub batch_id: BatchId,
    /// Session date
    pub date: NaiveDate,
    /// Mark
    pub status: AttendanceStatus,
    /// Free-form notes
    pub notes: Option<String>,
}

/// An attendance mark before it has an ID
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAttendance {
    /// Attendee
    pub user_id: UserId,
    /// Event
    pub event_id: EventId,
    /// Batch
    pub batch_id: BatchId,
    /// Session date
    pub date: NaiveDate,
    /// Mark
    pub status: AttendanceStatus,
    /// Free-form notes
    pub notes: Option<String>,
}

impl NewAttendance {
    /// Attaches an ID
    #[must_use]
    pub fn with_id(self, id: AttendanceId) -> Attendance {
        Attendance {
            id,
            user_id: self.user_id,
            event_id: self.event_id,
            batch_id: self.batch_id,
            date: self.date,
            status: self.status,
            notes: self.notes,
        }
    }
}

/// Share of attended (present or late) sessions as a rounded percentage
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn attendance_rate(records: &[Attendance]) -> u8 {
    if records.is_empty() {
        return 0;
    }
    let attended = records.iter().filter(|r| r.status.is_attended()).count();
    (attended as f64 / records.len() as f64 * 100.0).round() as u8
}

// ============================================================================
// Notifications
// ============================================================================

/// An in-app notification
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Notification ID
    pub id: NotificationId,
    /// Recipient
    pub user_id: UserId,
    /// Title
    pub title: String,
    /// Body
    pub message: String,
    /// Read flag
    pub read: bool,
    /// Created
    pub created_at: DateTime<Utc>,
    /// Deep link
    pub link: Option<String>,
}

// ============================================================================
// Payments
// ============================================================================

/// Payment status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Submitted
    Pending,
    /// Charged
    Completed,
    /// Returned
    Refunded,
}

/// A processed payment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    /// Payment ID
    pub id: PaymentId,
    /// Payer
    pub user_id: UserId,
    /// Event paid for
    pub event_id: EventId,
    /// Amount
    pub amount: Money,
    /// Status
    pub status: PaymentStatus,
    /// Method label (e.g. `credit_card`)
    pub payment_method: String,
    /// When charged
    pub payment_date: DateTime<Utc>,
    /// Gateway transaction ID
    pub transaction_id: String,
}

// ============================================================================
// Profiles
// ============================================================================

/// Summary numbers on the profile page
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    /// All events joined
    pub total_events: u32,
    /// Finished events
    pub completed_events: u32,
    /// Upcoming events
    pub upcoming_events: u32,
    /// Attendance percentage
    pub attendance_rate: u8,
}

/// Aggregate profile shown on the profile page
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User with contact fields
    pub user: User,
    /// Enrollments
    pub enrollments: Vec<Enrollment>,
    /// Attendance history
    pub attendance: Vec<Attendance>,
    /// Payment history
    pub payments: Vec<PaymentDetails>,
    /// Summary
    pub stats: ProfileStats,
}

/// Top-level fields to replace on a profile; `None` keeps the current value
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePatch {
    /// Replacement user
    pub user: Option<User>,
    /// Replacement enrollments
    pub enrollments: Option<Vec<Enrollment>>,
    /// Replacement attendance
    pub attendance: Option<Vec<Attendance>>,
    /// Replacement payments
    pub payments: Option<Vec<PaymentDetails>>,
    /// Replacement stats
    pub stats: Option<ProfileStats>,
}

impl UserProfile {
    /// Shallow merge: each present field replaces the current one
    pub fn apply(&mut self, patch: ProfilePatch) {
        if let Some(user) = patch.user {
            self.user = user;
        }
        if let Some(enrollments) = patch.enrollments {
            self.enrollments = enrollments;
        }
        if let Some(attendance) = patch.attendance {
            self.attendance = attendance;
        }
        if let Some(payments) = patch.payments {
            self.payments = payments;
        }
        if let Some(stats) = patch.stats {
            self.stats = stats;
        }
    }
}

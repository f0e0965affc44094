//! Mock dataset standing in for the remote behind the auth, attendance,
//! notification and profile stores.
//!
//! Latency is simulated by the stores; the dataset only holds rows and an
//! optional injected failure.

use crate::error::OperationError;
use crate::types::{
    Attendance, AttendanceId, AttendanceStatus, BatchId, EventId, Notification, NotificationId,
    User, UserId,
};
use tokio::sync::RwLock;

/// Seeded rows for the mock remote
#[derive(Debug)]
pub struct MockDataset {
    users: RwLock<Vec<User>>,
    attendance: RwLock<Vec<Attendance>>,
    notifications: RwLock<Vec<Notification>>,
    failure: RwLock<Option<String>>,
}

impl MockDataset {
    /// Dataset with the given rows
    #[must_use]
    pub fn new(
        users: Vec<User>,
        attendance: Vec<Attendance>,
        notifications: Vec<Notification>,
    ) -> Self {
        Self {
            users: RwLock::new(users),
            attendance: RwLock::new(attendance),
            notifications: RwLock::new(notifications),
            failure: RwLock::new(None),
        }
    }

    /// Dataset with the demo fixtures
    #[must_use]
    pub fn seeded() -> Self {
        Self::new(fixtures::users(), fixtures::attendance(), fixtures::notifications())
    }

    /// Make every access fail with this message, or recover with `None`
    pub async fn fail_with(&self, message: Option<String>) {
        *self.failure.write().await = message;
    }

    async fn check_available(&self) -> Result<(), OperationError> {
        match self.failure.read().await.as_ref() {
            Some(message) => Err(OperationError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }

    /// User with this email
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Unavailable`] when a failure is injected.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, OperationError> {
        self.check_available().await?;
        Ok(self.users.read().await.iter().find(|u| u.email == email).cloned())
    }

    /// User with this ID
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Unavailable`] when a failure is injected.
    pub async fn find_user(&self, id: &UserId) -> Result<Option<User>, OperationError> {
        self.check_available().await?;
        Ok(self.users.read().await.iter().find(|u| &u.id == id).cloned())
    }

    /// Number of seeded users
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    /// Attendance for one batch of one event
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Unavailable`] when a failure is injected.
    pub async fn attendance_for_batch(
        &self,
        event_id: &EventId,
        batch_id: &BatchId,
    ) -> Result<Vec<Attendance>, OperationError> {
        self.check_available().await?;
        Ok(self
            .attendance
            .read()
            .await
            .iter()
            .filter(|r| &r.event_id == event_id && &r.batch_id == batch_id)
            .cloned()
            .collect())
    }

    /// Attendance of one user at one event
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Unavailable`] when a failure is injected.
    pub async fn attendance_for_user(
        &self,
        user_id: &UserId,
        event_id: &EventId,
    ) -> Result<Vec<Attendance>, OperationError> {
        self.check_available().await?;
        Ok(self
            .attendance
            .read()
            .await
            .iter()
            .filter(|r| &r.user_id == user_id && &r.event_id == event_id)
            .cloned()
            .collect())
    }

    /// Store a new attendance record; duplicates are accepted
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Unavailable`] when a failure is injected.
    pub async fn insert_attendance(
        &self,
        record: Attendance,
    ) -> Result<Attendance, OperationError> {
        self.check_available().await?;
        self.attendance.write().await.push(record.clone());
        Ok(record)
    }

    /// Replace status and notes of a stored record
    ///
    /// Records created outside the dataset are not an error: the update
    /// still reports success and the store patches its own copy.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Unavailable`] when a failure is injected.
    pub async fn update_attendance(
        &self,
        id: &AttendanceId,
        status: AttendanceStatus,
        notes: Option<String>,
    ) -> Result<(), OperationError> {
        self.check_available().await?;
        if let Some(record) = self.attendance.write().await.iter_mut().find(|r| &r.id == id) {
            record.status = status;
            record.notes = notes;
        }
        Ok(())
    }

    /// Notifications for one user
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Unavailable`] when a failure is injected.
    pub async fn notifications_for(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Notification>, OperationError> {
        self.check_available().await?;
        Ok(self
            .notifications
            .read()
            .await
            .iter()
            .filter(|n| &n.user_id == user_id)
            .cloned()
            .collect())
    }

    /// Set the read flag on the given notifications
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Unavailable`] when a failure is injected.
    pub async fn mark_notifications_read(
        &self,
        ids: &[NotificationId],
    ) -> Result<(), OperationError> {
        self.check_available().await?;
        for notification in self.notifications.write().await.iter_mut() {
            if ids.contains(&notification.id) {
                notification.read = true;
            }
        }
        Ok(())
    }
}

impl Default for MockDataset {
    fn default() -> Self {
        Self::seeded()
    }
}

/// Demo fixtures
pub mod fixtures {
    use super::{
        Attendance, AttendanceId, AttendanceStatus, BatchId, EventId, Notification,
        NotificationId, User, UserId,
    };
    use crate::types::Role;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    /// Attendee account; also the example user in the docs
    pub const ATTENDEE_ID: &str = "a1b2c3d4-e5f6-4789-8abc-1234567890ab";
    /// Organizer account
    pub const ORGANIZER_ID: &str = "5f8d0d55-2b6e-4c3a-9f1e-7a6b5c4d3e2f";
    /// Admin account
    pub const ADMIN_ID: &str = "c0ffee00-1234-4abc-bdef-0123456789ab";
    /// Event referenced by the attendance fixtures
    pub const ATTENDANCE_EVENT_ID: &str = "demo-event-1";
    /// Batch referenced by the attendance fixtures
    pub const ATTENDANCE_BATCH_ID: &str = "demo-batch-1";

    fn user(id: &str, name: &str, email: &str, role: Role) -> User {
        User {
            id: UserId::new(id),
            name: name.to_string(),
            email: email.to_string(),
            role,
            avatar: None,
            phone: None,
            address: None,
            join_date: None,
        }
    }

    /// Attendee, organizer and admin, in that order
    #[must_use]
    pub fn users() -> Vec<User> {
        vec![
            user(ATTENDEE_ID, "Alex Morgan", "alex@example.com", Role::User),
            user(ORGANIZER_ID, "Jamie Rivera", "jamie@example.com", Role::Organizer),
            user(ADMIN_ID, "Priya Shah", "priya@example.com", Role::Admin),
        ]
    }

    /// Two sessions of the attendee, one on time and one late
    #[must_use]
    pub fn attendance() -> Vec<Attendance> {
        let record = |id: &str, day: u32, status, notes: Option<&str>| Attendance {
            id: AttendanceId::new(id),
            user_id: UserId::new(ATTENDEE_ID),
            event_id: EventId::new(ATTENDANCE_EVENT_ID),
            batch_id: BatchId::new(ATTENDANCE_BATCH_ID),
            date: NaiveDate::from_ymd_opt(2025, 6, day).unwrap_or(NaiveDate::MIN),
            status,
            notes: notes.map(str::to_string),
        };
        vec![
            record("1", 15, AttendanceStatus::Present, None),
            record("2", 16, AttendanceStatus::Late, Some("Arrived 15 minutes late")),
        ]
    }

    /// Three notifications for the attendee (two unread), one for the organizer
    #[must_use]
    pub fn notifications() -> Vec<Notification> {
        let at = |day: u32| {
            Utc.with_ymd_and_hms(2025, 6, day, 9, 0, 0)
                .single()
                .unwrap_or(DateTime::<Utc>::MIN_UTC)
        };
        let notification = |id: &str, user: &str, text: (&str, &str), read: bool, day: u32| {
            Notification {
                id: NotificationId::new(id),
                user_id: UserId::new(user),
                title: text.0.to_string(),
                message: text.1.to_string(),
                read,
                created_at: at(day),
                link: None,
            }
        };
        vec![
            Notification {
                link: Some("/user/events".to_string()),
                ..notification(
                    "n1",
                    ATTENDEE_ID,
                    ("Enrollment confirmed", "You are enrolled in Morning Yoga Basics."),
                    false,
                    10,
                )
            },
            notification(
                "n2",
                ATTENDEE_ID,
                ("Schedule change", "Intermediate Pottery now starts at 18:30."),
                false,
                12,
            ),
            notification("n3", ATTENDEE_ID, ("Welcome", "Thanks for joining EventHub."), true, 1),
            Notification {
                link: Some("/organizer".to_string()),
                ..notification(
                    "n4",
                    ORGANIZER_ID,
                    ("New enrollment", "Alex Morgan joined your event."),
                    false,
                    10,
                )
            },
        ]
    }
}

//! Domain stores for EventHub.
//!
//! Each store is a reducer over one slice of state:
//! - **Events**: event catalogue and the current user's enrollments
//! - **Attendance**: attendance records of one batch
//! - **Payment**: last processed payment
//! - **Auth**: current user
//! - **Notifications**: a user's notifications and unread count
//! - **Profile**: the aggregate profile page
//!
//! Commands start an effect that talks to the backend, the mock dataset or
//! the payment gateway. The effect answers with exactly one outcome action
//! carrying the command's correlation ID; local state changes only when that
//! outcome is reduced.

pub mod attendance;
pub mod auth;
pub mod events;
pub mod notifications;
pub mod payment;
pub mod profile;

pub use attendance::{AttendanceAction, AttendanceEnvironment, AttendanceReducer, AttendanceState};
pub use auth::{AuthAction, AuthEnvironment, AuthReducer, AuthState};
pub use events::{EventAction, EventEnvironment, EventReducer, EventState};
pub use notifications::{
    NotificationAction, NotificationEnvironment, NotificationReducer, NotificationState,
};
pub use payment::{PaymentAction, PaymentEnvironment, PaymentReducer, PaymentState};
pub use profile::{ProfileAction, ProfileEnvironment, ProfileReducer, ProfileState};

use crate::error::OperationError;
use std::time::Duration;
use uuid::Uuid;

/// Actions that can be matched to the command that caused them
pub trait Correlated {
    /// Correlation ID of a command or outcome; `None` for local-only actions
    fn correlation_id(&self) -> Option<Uuid>;

    /// True for actions produced by effects
    fn is_outcome(&self) -> bool;

    /// The error carried by a failed outcome
    fn failure(&self) -> Option<&OperationError>;
}

/// Random lowercase base-36 token, used for mock-issued identifiers
pub(crate) fn random_base36(len: usize) -> String {
    use rand::Rng;

    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect()
}

/// Wait out the simulated round trip of a mock remote
pub(crate) async fn simulate_latency(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

//! Error types for EventHub stores and services.

use eventhub_runtime::StoreError;
use thiserror::Error;

/// A failed store operation
///
/// Carried inside outcome actions, so it is `Clone`. The `Display` text is the
/// sentence shown in the store's error banner.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// User ID is not a UUID v4
    #[error("Invalid user ID format. Expected UUID.")]
    InvalidUserId,

    /// Event lookup came back empty
    #[error("Event not found")]
    EventNotFound,

    /// User lookup came back empty
    #[error("User not found")]
    UserNotFound,

    /// Password reset for an unknown email
    #[error("Email not found")]
    EmailNotFound,

    /// Login rejected
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Registration with an existing email
    #[error("Email already in use")]
    EmailInUse,

    /// Profile update before a profile was loaded
    #[error("User profile is not loaded")]
    ProfileNotLoaded,

    /// Backend call failed
    #[error("{0}")]
    Backend(String),

    /// Payment could not be processed
    #[error("{0}")]
    Payment(String),

    /// Simulated remote is unavailable
    #[error("{0}")]
    Unavailable(String),
}

/// Backend client failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// No row matched
    #[error("No {table} row with id {id}")]
    NotFound {
        /// Table queried
        table: &'static str,
        /// ID requested
        id: String,
    },

    /// The backend refused the request
    #[error("{0}")]
    Rejected(String),

    /// The backend could not be reached
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl From<BackendError> for OperationError {
    fn from(error: BackendError) -> Self {
        Self::Backend(error.to_string())
    }
}

/// Payment gateway failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentGatewayError {
    /// Card declined
    #[error("Card declined: {reason}")]
    CardDeclined {
        /// Decline reason
        reason: String,
    },

    /// Insufficient funds
    #[error("Insufficient funds")]
    InsufficientFunds,

    /// Invalid payment method
    #[error("Invalid payment method: {reason}")]
    InvalidPaymentMethod {
        /// Invalid reason
        reason: String,
    },

    /// Gateway timeout
    #[error("Gateway timeout")]
    Timeout,

    /// Other error
    #[error("Payment error: {message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl From<PaymentGatewayError> for OperationError {
    fn from(error: PaymentGatewayError) -> Self {
        Self::Payment(error.to_string())
    }
}

/// Errors returned by service methods
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The operation itself failed; the store's error field holds the same text
    #[error(transparent)]
    Operation(#[from] OperationError),

    /// The store could not run the operation
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The store answered with an outcome the operation does not produce
    #[error("Unexpected outcome: {0}")]
    UnexpectedOutcome(String),
}

impl ServiceError {
    /// The domain error, if this is one
    #[must_use]
    pub const fn operation(&self) -> Option<&OperationError> {
        match self {
            Self::Operation(error) => Some(error),
            Self::Store(_) | Self::UnexpectedOutcome(_) => None,
        }
    }
}

/// Result of a service method
pub type ServiceResult<T> = Result<T, ServiceError>;

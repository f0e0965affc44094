//! Auth store: the signed-in user.
//!
//! Authentication is a demo placeholder. Credentials are checked against the
//! seeded users with one shared password, registrations are not persisted and
//! nothing survives the process.

use super::{Correlated, simulate_latency};
use crate::dataset::MockDataset;
use crate::error::OperationError;
use crate::types::{Role, User, UserId};
use eventhub_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec, try_effect};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// The only password the demo accepts
pub const DEMO_PASSWORD: &str = "password";

/// Auth store state
#[derive(Clone, Debug, Default)]
pub struct AuthState {
    /// Signed-in user
    pub user: Option<User>,
    /// A user is signed in
    pub is_authenticated: bool,
    /// An operation is in flight
    pub is_loading: bool,
    /// Last failure
    pub error: Option<String>,
}

/// Actions for the auth store
#[derive(Clone, Debug)]
pub enum AuthAction {
    // Commands
    /// Sign in with email and password
    Login {
        /// Correlation ID
        correlation_id: Uuid,
        /// Email
        email: String,
        /// Password
        password: String,
    },
    /// Create an account and sign in as it
    Register {
        /// Correlation ID
        correlation_id: Uuid,
        /// Display name
        name: String,
        /// Email
        email: String,
        /// Password (accepted, never stored)
        password: String,
    },
    /// Forget the signed-in user
    Logout,
    /// Ask for a password reset mail
    ResetPassword {
        /// Correlation ID
        correlation_id: Uuid,
        /// Email
        email: String,
    },
    /// Clear the error banner
    DismissError,

    // Outcomes
    /// Credentials accepted
    LoggedIn {
        /// Correlation ID
        correlation_id: Uuid,
        /// User
        user: User,
    },
    /// Account created
    Registered {
        /// Correlation ID
        correlation_id: Uuid,
        /// New user
        user: User,
    },
    /// Email exists; a reset would be sent
    PasswordResetRequested {
        /// Correlation ID
        correlation_id: Uuid,
        /// Email
        email: String,
    },
    /// Any command failed
    OperationFailed {
        /// Correlation ID
        correlation_id: Uuid,
        /// Failure
        error: OperationError,
    },
}

impl Correlated for AuthAction {
    fn correlation_id(&self) -> Option<Uuid> {
        match self {
            Self::Login { correlation_id, .. }
            | Self::Register { correlation_id, .. }
            | Self::ResetPassword { correlation_id, .. }
            | Self::LoggedIn { correlation_id, .. }
            | Self::Registered { correlation_id, .. }
            | Self::PasswordResetRequested { correlation_id, .. }
            | Self::OperationFailed { correlation_id, .. } => Some(*correlation_id),
            Self::Logout | Self::DismissError => None,
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
            Self::LoggedIn { .. }
                | Self::Registered { .. }
                | Self::PasswordResetRequested { .. }
                | Self::OperationFailed { .. }
        )
    }
}

/// Environment dependencies for the auth store
#[derive(Clone)]
pub struct AuthEnvironment {
    /// Known users
    pub dataset: Arc<MockDataset>,
    /// Simulated round trip
    pub latency: Duration,
}

impl AuthEnvironment {
    /// Creates a new `AuthEnvironment`
    #[must_use]
    pub const fn new(dataset: Arc<MockDataset>, latency: Duration) -> Self {
        Self { dataset, latency }
    }
}

/// Reducer for the auth store
#[derive(Clone, Debug, Default)]
pub struct AuthReducer;

impl AuthReducer {
    /// Creates a new `AuthReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for AuthReducer {
    type State = AuthState;
    type Action = AuthAction;
    type Environment = AuthEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let dataset = Arc::clone(&env.dataset);
        let latency = env.latency;

        match action {
            AuthAction::Login {
                correlation_id,
                email,
                password,
            } => {
                state.is_loading = true;
                state.error = None;
                smallvec![try_effect! {
                    run: authenticate(dataset, latency, email, password),
                    ok: |user| AuthAction::LoggedIn { correlation_id, user },
                    err: |error| AuthAction::OperationFailed { correlation_id, error }
                }]
            },

            AuthAction::Register {
                correlation_id,
                name,
                email,
                password: _,
            } => {
                state.is_loading = true;
                state.error = None;
                let id = UserId::from(Uuid::new_v4());
                smallvec![try_effect! {
                    run: create_account(dataset, latency, id, name, email),
                    ok: |user| AuthAction::Registered { correlation_id, user },
                    err: |error| AuthAction::OperationFailed { correlation_id, error }
                }]
            },

            AuthAction::Logout => {
                state.user = None;
                state.is_authenticated = false;
                SmallVec::new()
            },

            AuthAction::ResetPassword {
                correlation_id,
                email,
            } => {
                state.is_loading = true;
                state.error = None;
                smallvec![try_effect! {
                    run: request_reset(dataset, latency, email),
                    ok: |email| AuthAction::PasswordResetRequested { correlation_id, email },
                    err: |error| AuthAction::OperationFailed { correlation_id, error }
                }]
            },

            AuthAction::DismissError => {
                state.error = None;
                SmallVec::new()
            },

            AuthAction::LoggedIn { user, .. } | AuthAction::Registered { user, .. } => {
                tracing::info!(user_id = %user.id, role = ?user.role, "Signed in");
                state.user = Some(user);
                state.is_authenticated = true;
                state.is_loading = false;
                SmallVec::new()
            },

            AuthAction::PasswordResetRequested { .. } => {
                state.is_loading = false;
                SmallVec::new()
            },

            AuthAction::OperationFailed { error, .. } => {
                tracing::warn!(error = %error, "Auth operation failed");
                state.error = Some(error.to_string());
                state.is_loading = false;
                SmallVec::new()
            },
        }
    }
}

async fn authenticate(
    dataset: Arc<MockDataset>,
    latency: Duration,
    email: String,
    password: String,
) -> Result<User, OperationError> {
    simulate_latency(latency).await;
    match dataset.find_user_by_email(&email).await? {
        Some(user) if password == DEMO_PASSWORD => Ok(user),
        _ => Err(OperationError::InvalidCredentials),
    }
}

async fn create_account(
    dataset: Arc<MockDataset>,
    latency: Duration,
    id: UserId,
    name: String,
    email: String,
) -> Result<User, OperationError> {
    simulate_latency(latency).await;
    if dataset.find_user_by_email(&email).await?.is_some() {
        return Err(OperationError::EmailInUse);
    }
    Ok(User {
        id,
        name,
        email,
        role: Role::User,
        avatar: None,
        phone: None,
        address: None,
        join_date: None,
    })
}

async fn request_reset(
    dataset: Arc<MockDataset>,
    latency: Duration,
    email: String,
) -> Result<String, OperationError> {
    simulate_latency(latency).await;
    match dataset.find_user_by_email(&email).await? {
        Some(_) => Ok(email),
        None => Err(OperationError::EmailNotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures;
    use eventhub_testing::{ReducerTest, assertions, resolve_effects};

    fn environment() -> AuthEnvironment {
        AuthEnvironment::new(Arc::new(MockDataset::seeded()), Duration::ZERO)
    }

    async fn outcome(
        env: &AuthEnvironment,
        state: &mut AuthState,
        action: AuthAction,
    ) -> AuthAction {
        let reducer = AuthReducer::new();
        let effects = reducer.reduce(state, action, env);
        let mut outcomes = resolve_effects(effects.into_vec()).await;
        assert_eq!(outcomes.len(), 1);
        let outcome = outcomes.remove(0);
        let _ = reducer.reduce(state, outcome.clone(), env);
        outcome
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let mut state = AuthState::default();
        let result = outcome(
            &environment(),
            &mut state,
            AuthAction::Login {
                correlation_id: Uuid::new_v4(),
                email: "alex@example.com".to_string(),
                password: "hunter2".to_string(),
            },
        )
        .await;

        assert!(matches!(
            result,
            AuthAction::OperationFailed { error: OperationError::InvalidCredentials, .. }
        ));
        assert!(!state.is_authenticated);
        assert_eq!(state.error.as_deref(), Some("Invalid email or password"));
    }

    #[tokio::test]
    async fn register_rejects_seeded_email() {
        let mut state = AuthState::default();
        let result = outcome(
            &environment(),
            &mut state,
            AuthAction::Register {
                correlation_id: Uuid::new_v4(),
                name: "Someone".to_string(),
                email: "jamie@example.com".to_string(),
                password: "password".to_string(),
            },
        )
        .await;

        assert!(matches!(
            result,
            AuthAction::OperationFailed {
                error: OperationError::EmailInUse,
                ..
            }
        ));
        assert!(state.user.is_none());
    }

    #[tokio::test]
    async fn register_authenticates_without_persisting() {
        let env = environment();
        let mut state = AuthState::default();
        let _ = outcome(
            &env,
            &mut state,
            AuthAction::Register {
                correlation_id: Uuid::new_v4(),
                name: "Sam Lee".to_string(),
                email: "sam@example.com".to_string(),
                password: "secret".to_string(),
            },
        )
        .await;

        let user = state.user.as_ref().map(|u| (u.role, u.email.clone()));
        assert_eq!(user, Some((Role::User, "sam@example.com".to_string())));
        assert!(state.is_authenticated);
        assert_eq!(env.dataset.user_count().await, fixtures::users().len());
    }

    #[tokio::test]
    async fn reset_for_unknown_email_fails() {
        let mut state = AuthState::default();
        let result = outcome(
            &environment(),
            &mut state,
            AuthAction::ResetPassword {
                correlation_id: Uuid::new_v4(),
                email: "nobody@example.com".to_string(),
            },
        )
        .await;
        assert!(matches!(
            result,
            AuthAction::OperationFailed {
                error: OperationError::EmailNotFound,
                ..
            }
        ));
    }

    #[test]
    fn logout_is_local() {
        ReducerTest::new(AuthReducer::new())
            .with_env(environment())
            .given_state(AuthState {
                user: fixtures::users().into_iter().next(),
                is_authenticated: true,
                ..AuthState::default()
            })
            .when_action(AuthAction::Logout)
            .then_state(|state| {
                assert!(state.user.is_none());
                assert!(!state.is_authenticated);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }
}

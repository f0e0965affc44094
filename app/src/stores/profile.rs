//! Profile store: the aggregate profile page.
//!
//! The profile is fabricated from the seeded user on every fetch. Its lists
//! and stats are placeholders and do not follow the other stores; updates
//! are merged into the loaded profile only.

use super::{Correlated, simulate_latency};
use crate::dataset::MockDataset;
use crate::error::OperationError;
use crate::types::{ProfilePatch, ProfileStats, User, UserId, UserProfile};
use eventhub_core::{SmallVec, async_effect, delay, effect::Effect, reducer::Reducer, smallvec};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const PLACEHOLDER_PHONE: &str = "+1 (555) 123-4567";
const PLACEHOLDER_ADDRESS: &str = "123 Main St, City, State 12345";
const PLACEHOLDER_JOIN_DATE: &str = "2025-01-15";

const PLACEHOLDER_STATS: ProfileStats = ProfileStats {
    total_events: 3,
    completed_events: 1,
    upcoming_events: 2,
    attendance_rate: 85,
};

/// Profile store state
#[derive(Clone, Debug, Default)]
pub struct ProfileState {
    /// Loaded profile
    pub profile: Option<UserProfile>,
    /// An operation is in flight
    pub is_loading: bool,
    /// Last failure
    pub error: Option<String>,
}

/// Actions for the profile store
#[derive(Clone, Debug)]
pub enum ProfileAction {
    // Commands
    /// Build the profile of a user
    FetchUserProfile {
        /// Correlation ID
        correlation_id: Uuid,
        /// User
        user_id: UserId,
    },
    /// Merge fields into the loaded profile
    UpdateUserProfile {
        /// Correlation ID
        correlation_id: Uuid,
        /// Must match the loaded profile
        user_id: UserId,
        /// Fields to replace
        patch: ProfilePatch,
    },
    /// Clear the error banner
    DismissError,

    // Outcomes
    /// Profile built
    ProfileLoaded {
        /// Correlation ID
        correlation_id: Uuid,
        /// Profile
        profile: UserProfile,
    },
    /// Patch accepted
    ProfileUpdated {
        /// Correlation ID
        correlation_id: Uuid,
        /// Fields to replace
        patch: ProfilePatch,
    },
    /// Any command failed
    OperationFailed {
        /// Correlation ID
        correlation_id: Uuid,
        /// Failure
        error: OperationError,
    },
}

impl Correlated for ProfileAction {
    fn correlation_id(&self) -> Option<Uuid> {
        match self {
            Self::FetchUserProfile { correlation_id, .. }
            | Self::UpdateUserProfile { correlation_id, .. }
            | Self::ProfileLoaded { correlation_id, .. }
            | Self::ProfileUpdated { correlation_id, .. }
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
            Self::ProfileLoaded { .. } | Self::ProfileUpdated { .. } | Self::OperationFailed { .. }
        )
    }
}

/// Environment dependencies for the profile store
#[derive(Clone)]
pub struct ProfileEnvironment {
    /// Known users
    pub dataset: Arc<MockDataset>,
    /// Simulated round trip
    pub latency: Duration,
}

impl ProfileEnvironment {
    /// Creates a new `ProfileEnvironment`
    #[must_use]
    pub const fn new(dataset: Arc<MockDataset>, latency: Duration) -> Self {
        Self { dataset, latency }
    }
}

/// Reducer for the profile store
#[derive(Clone, Debug, Default)]
pub struct ProfileReducer;

impl ProfileReducer {
    /// Creates a new `ProfileReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn placeholder_profile(user: User) -> UserProfile {
    UserProfile {
        user: User {
            phone: Some(PLACEHOLDER_PHONE.to_string()),
            address: Some(PLACEHOLDER_ADDRESS.to_string()),
            join_date: Some(PLACEHOLDER_JOIN_DATE.to_string()),
            ..user
        },
        enrollments: Vec::new(),
        attendance: Vec::new(),
        payments: Vec::new(),
        stats: PLACEHOLDER_STATS,
    }
}

impl Reducer for ProfileReducer {
    type State = ProfileState;
    type Action = ProfileAction;
    type Environment = ProfileEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            ProfileAction::FetchUserProfile {
                correlation_id,
                user_id,
            } => {
                state.is_loading = true;
                state.error = None;
                let dataset = Arc::clone(&env.dataset);
                let latency = env.latency;
                smallvec![async_effect! {
                    simulate_latency(latency).await;
                    let outcome = match dataset.find_user(&user_id).await {
                        Ok(Some(user)) => ProfileAction::ProfileLoaded {
                            correlation_id,
                            profile: placeholder_profile(user),
                        },
                        Ok(None) => ProfileAction::OperationFailed {
                            correlation_id,
                            error: OperationError::UserNotFound,
                        },
                        Err(error) => ProfileAction::OperationFailed { correlation_id, error },
                    };
                    Some(outcome)
                }]
            },

            ProfileAction::UpdateUserProfile {
                correlation_id,
                user_id,
                patch,
            } => {
                let loaded = state.profile.as_ref().is_some_and(|p| p.user.id == user_id);
                if !loaded {
                    return smallvec![Effect::send(ProfileAction::OperationFailed {
                        correlation_id,
                        error: OperationError::ProfileNotLoaded,
                    })];
                }
                state.is_loading = true;
                state.error = None;
                smallvec![delay! {
                    duration: env.latency,
                    action: ProfileAction::ProfileUpdated { correlation_id, patch }
                }]
            },

            ProfileAction::DismissError => {
                state.error = None;
                SmallVec::new()
            },

            ProfileAction::ProfileLoaded { profile, .. } => {
                state.profile = Some(profile);
                state.is_loading = false;
                SmallVec::new()
            },

            ProfileAction::ProfileUpdated { patch, .. } => {
                if let Some(profile) = state.profile.as_mut() {
                    profile.apply(patch);
                }
                state.is_loading = false;
                SmallVec::new()
            },

            ProfileAction::OperationFailed { error, .. } => {
                tracing::warn!(error = %error, "Profile operation failed");
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
    use eventhub_testing::{ReducerTest, resolve_effects};

    fn environment() -> ProfileEnvironment {
        ProfileEnvironment::new(Arc::new(MockDataset::seeded()), Duration::ZERO)
    }

    fn loaded_state() -> ProfileState {
        let user = fixtures::users().into_iter().next().unwrap();
        ProfileState {
            profile: Some(placeholder_profile(user)),
            ..ProfileState::default()
        }
    }

    #[tokio::test]
    async fn fetch_decorates_seeded_user() {
        let env = environment();
        let mut state = ProfileState::default();
        let effects = ProfileReducer::new().reduce(
            &mut state,
            ProfileAction::FetchUserProfile {
                correlation_id: Uuid::new_v4(),
                user_id: UserId::new(fixtures::ORGANIZER_ID),
            },
            &env,
        );
        let outcomes = resolve_effects(effects.into_vec()).await;
        let [ProfileAction::ProfileLoaded { profile, .. }] = outcomes.as_slice() else {
            unreachable!("the organizer is seeded");
        };

        assert_eq!(profile.user.name, "Jamie Rivera");
        assert_eq!(profile.user.phone.as_deref(), Some(PLACEHOLDER_PHONE));
        assert_eq!(profile.stats, PLACEHOLDER_STATS);
        assert!(profile.enrollments.is_empty() && profile.payments.is_empty());
    }

    #[tokio::test]
    async fn fetch_unknown_user_fails() {
        let env = environment();
        let mut state = ProfileState::default();
        let effects = ProfileReducer::new().reduce(
            &mut state,
            ProfileAction::FetchUserProfile {
                correlation_id: Uuid::new_v4(),
                user_id: UserId::new("missing"),
            },
            &env,
        );
        let outcomes = resolve_effects(effects.into_vec()).await;
        assert!(matches!(
            outcomes.as_slice(),
            [ProfileAction::OperationFailed { error: OperationError::UserNotFound, .. }]
        ));
    }

    #[test]
    fn update_without_profile_is_rejected() {
        ReducerTest::new(ProfileReducer::new())
            .with_env(environment())
            .given_state(ProfileState::default())
            .when_action(ProfileAction::UpdateUserProfile {
                correlation_id: Uuid::new_v4(),
                user_id: UserId::new(fixtures::ATTENDEE_ID),
                patch: ProfilePatch::default(),
            })
            .then_state(|state| assert!(!state.is_loading))
            .then_effects(|effects| {
                assert!(matches!(
                    effects,
                    [Effect::Future(_)]
                ));
            })
            .run();
    }

    #[test]
    fn merged_update_replaces_only_given_fields() {
        let stats = ProfileStats {
            total_events: 9,
            completed_events: 4,
            upcoming_events: 5,
            attendance_rate: 70,
        };
        ReducerTest::new(ProfileReducer::new())
            .with_env(environment())
            .given_state(loaded_state())
            .when_action(ProfileAction::ProfileUpdated {
                correlation_id: Uuid::new_v4(),
                patch: ProfilePatch {
                    stats: Some(stats),
                    ..ProfilePatch::default()
                },
            })
            .then_state(move |state| {
                let profile = state.profile.as_ref().unwrap();
                assert_eq!(profile.stats, stats);
                assert_eq!(profile.user.name, "Alex Morgan");
            })
            .run();
    }
}

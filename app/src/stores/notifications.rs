//! Notification store: one user's notifications and their unread count.

use super::{Correlated, simulate_latency};
use crate::dataset::MockDataset;
use crate::error::OperationError;
use crate::types::{Notification, NotificationId, UserId};
use eventhub_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec, try_effect};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Notification store state
#[derive(Clone, Debug, Default)]
pub struct NotificationState {
    /// Notifications of the loaded user
    pub notifications: Vec<Notification>,
    /// Number of entries with `read == false`
    pub unread_count: usize,
    /// An operation is in flight
    pub is_loading: bool,
    /// Last failure
    pub error: Option<String>,
}

impl NotificationState {
    fn recount(&mut self) {
        self.unread_count = self.notifications.iter().filter(|n| !n.read).count();
    }
}

/// Actions for the notification store
#[derive(Clone, Debug)]
pub enum NotificationAction {
    // Commands
    /// Load a user's notifications
    FetchNotifications {
        /// Correlation ID
        correlation_id: Uuid,
        /// Recipient
        user_id: UserId,
    },
    /// Mark one notification read
    MarkAsRead {
        /// Correlation ID
        correlation_id: Uuid,
        /// Notification
        notification_id: NotificationId,
    },
    /// Mark every loaded notification read
    MarkAllAsRead {
        /// Correlation ID
        correlation_id: Uuid,
    },
    /// Clear the error banner
    DismissError,

    // Outcomes
    /// Notifications loaded
    NotificationsLoaded {
        /// Correlation ID
        correlation_id: Uuid,
        /// Notifications
        notifications: Vec<Notification>,
    },
    /// One notification marked
    MarkedAsRead {
        /// Correlation ID
        correlation_id: Uuid,
        /// Notification
        notification_id: NotificationId,
    },
    /// The notifications loaded when the command ran were marked
    AllMarkedAsRead {
        /// Correlation ID
        correlation_id: Uuid,
        /// Notifications marked
        ids: Vec<NotificationId>,
    },
    /// Any command failed
    OperationFailed {
        /// Correlation ID
        correlation_id: Uuid,
        /// Failure
        error: OperationError,
    },
}

impl Correlated for NotificationAction {
    fn correlation_id(&self) -> Option<Uuid> {
        match self {
            Self::FetchNotifications { correlation_id, .. }
            | Self::MarkAsRead { correlation_id, .. }
            | Self::MarkAllAsRead { correlation_id }
            | Self::NotificationsLoaded { correlation_id, .. }
            | Self::MarkedAsRead { correlation_id, .. }
            | Self::AllMarkedAsRead { correlation_id, .. }
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
            Self::NotificationsLoaded { .. }
                | Self::MarkedAsRead { .. }
                | Self::AllMarkedAsRead { .. }
                | Self::OperationFailed { .. }
        )
    }
}

/// Environment dependencies for the notification store
#[derive(Clone)]
pub struct NotificationEnvironment {
    /// Mock remote
    pub dataset: Arc<MockDataset>,
    /// Simulated round trip
    pub latency: Duration,
}

impl NotificationEnvironment {
    /// Creates a new `NotificationEnvironment`
    #[must_use]
    pub const fn new(dataset: Arc<MockDataset>, latency: Duration) -> Self {
        Self { dataset, latency }
    }
}

/// Reducer for the notification store
#[derive(Clone, Debug, Default)]
pub struct NotificationReducer;

impl NotificationReducer {
    /// Creates a new `NotificationReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for NotificationReducer {
    type State = NotificationState;
    type Action = NotificationAction;
    type Environment = NotificationEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let dataset = Arc::clone(&env.dataset);
        let latency = env.latency;

        match action {
            NotificationAction::FetchNotifications {
                correlation_id,
                user_id,
            } => {
                state.is_loading = true;
                state.error = None;
                smallvec![try_effect! {
                    run: async move {
                        simulate_latency(latency).await;
                        dataset.notifications_for(&user_id).await
                    },
                    ok: |notifications| NotificationAction::NotificationsLoaded {
                        correlation_id,
                        notifications,
                    },
                    err: |error| NotificationAction::OperationFailed { correlation_id, error }
                }]
            },

            NotificationAction::MarkAsRead {
                correlation_id,
                notification_id,
            } => {
                state.error = None;
                let ids = vec![notification_id.clone()];
                smallvec![try_effect! {
                    run: async move {
                        simulate_latency(latency).await;
                        dataset.mark_notifications_read(&ids).await
                    },
                    ok: |_unit| NotificationAction::MarkedAsRead {
                        correlation_id,
                        notification_id,
                    },
                    err: |error| NotificationAction::OperationFailed { correlation_id, error }
                }]
            },

            NotificationAction::MarkAllAsRead { correlation_id } => {
                state.error = None;
                let ids: Vec<NotificationId> =
                    state.notifications.iter().map(|n| n.id.clone()).collect();
                smallvec![try_effect! {
                    run: async move {
                        simulate_latency(latency).await;
                        let marked = dataset.mark_notifications_read(&ids).await;
                        marked.map(|()| ids)
                    },
                    ok: |ids| NotificationAction::AllMarkedAsRead { correlation_id, ids },
                    err: |error| NotificationAction::OperationFailed { correlation_id, error }
                }]
            },

            NotificationAction::DismissError => {
                state.error = None;
                SmallVec::new()
            },

            NotificationAction::NotificationsLoaded { notifications, .. } => {
                state.notifications = notifications;
                state.recount();
                state.is_loading = false;
                SmallVec::new()
            },

            NotificationAction::MarkedAsRead { notification_id, .. } => {
                if let Some(notification) = state
                    .notifications
                    .iter_mut()
                    .find(|n| n.id == notification_id)
                {
                    notification.read = true;
                }
                state.recount();
                SmallVec::new()
            },

            NotificationAction::AllMarkedAsRead { ids, .. } => {
                for notification in &mut state.notifications {
                    if ids.contains(&notification.id) {
                        notification.read = true;
                    }
                }
                state.recount();
                SmallVec::new()
            },

            NotificationAction::OperationFailed { error, .. } => {
                tracing::warn!(error = %error, "Notification operation failed");
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
    use eventhub_core::environment::Clock;
    use eventhub_testing::{ReducerTest, assertions, resolve_effects};
    use proptest::prelude::*;

    fn environment() -> NotificationEnvironment {
        NotificationEnvironment::new(Arc::new(MockDataset::seeded()), Duration::ZERO)
    }

    fn notification(id: &str, read: bool) -> Notification {
        Notification {
            id: NotificationId::new(id),
            user_id: UserId::new(fixtures::ATTENDEE_ID),
            title: "Reminder".to_string(),
            message: "Class starts soon".to_string(),
            read,
            created_at: eventhub_testing::test_clock().now(),
            link: None,
        }
    }

    #[tokio::test]
    async fn fetch_counts_unread() {
        let env = environment();
        let reducer = NotificationReducer::new();
        let mut state = NotificationState::default();

        let effects = reducer.reduce(
            &mut state,
            NotificationAction::FetchNotifications {
                correlation_id: Uuid::new_v4(),
                user_id: UserId::new(fixtures::ATTENDEE_ID),
            },
            &env,
        );
        for outcome in resolve_effects(effects.into_vec()).await {
            let _ = reducer.reduce(&mut state, outcome, &env);
        }

        assert_eq!(state.notifications.len(), 3);
        assert_eq!(state.unread_count, 2);
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn mark_as_read_writes_through() {
        let env = environment();
        let reducer = NotificationReducer::new();
        let mut state = NotificationState {
            notifications: fixtures::notifications()
                .into_iter()
                .filter(|n| n.user_id.as_str() == fixtures::ATTENDEE_ID)
                .collect(),
            ..NotificationState::default()
        };
        state.recount();
        let target = state.notifications.iter().find(|n| !n.read).map(|n| n.id.clone()).unwrap();

        let effects = reducer.reduce(
            &mut state,
            NotificationAction::MarkAsRead {
                correlation_id: Uuid::new_v4(),
                notification_id: target.clone(),
            },
            &env,
        );
        for outcome in resolve_effects(effects.into_vec()).await {
            let _ = reducer.reduce(&mut state, outcome, &env);
        }

        assert_eq!(state.unread_count, 1);
        let stored = env
            .dataset
            .notifications_for(&UserId::new(fixtures::ATTENDEE_ID))
            .await
            .unwrap();
        assert!(stored.iter().any(|n| n.id == target && n.read));
    }

    #[tokio::test]
    async fn mark_all_skips_notifications_loaded_afterwards() {
        let env = environment();
        let reducer = NotificationReducer::new();
        let mut state = NotificationState {
            notifications: vec![notification("n1", false), notification("n2", false)],
            ..NotificationState::default()
        };
        state.recount();

        let effects = reducer.reduce(
            &mut state,
            NotificationAction::MarkAllAsRead {
                correlation_id: Uuid::new_v4(),
            },
            &env,
        );
        let _ = reducer.reduce(
            &mut state,
            NotificationAction::NotificationsLoaded {
                correlation_id: Uuid::new_v4(),
                notifications: vec![
                    notification("n1", false),
                    notification("n2", false),
                    notification("late", false),
                ],
            },
            &env,
        );
        for outcome in resolve_effects(effects.into_vec()).await {
            let _ = reducer.reduce(&mut state, outcome, &env);
        }

        assert_eq!(state.unread_count, 1);
        let late = state.notifications.iter().find(|n| n.id.as_str() == "late").unwrap();
        assert!(!late.read);
    }

    proptest! {
        #[test]
        fn all_marked_leaves_nothing_unread(
            flags in proptest::collection::vec(any::<bool>(), 0..12)
        ) {
            let notifications: Vec<Notification> = flags
                .iter()
                .enumerate()
                .map(|(i, read)| notification(&format!("n{i}"), *read))
                .collect();
            let unread = flags.iter().filter(|read| !**read).count();

            let ids = notifications.iter().map(|n| n.id.clone()).collect();

            ReducerTest::new(NotificationReducer::new())
                .with_env(environment())
                .given_state(NotificationState {
                    notifications,
                    unread_count: unread,
                    ..NotificationState::default()
                })
                .when_action(NotificationAction::AllMarkedAsRead {
                    correlation_id: Uuid::new_v4(),
                    ids,
                })
                .then_state(|state| {
                    assert_eq!(state.unread_count, 0);
                    assert!(state.notifications.iter().all(|n| n.read));
                })
                .then_effects(assertions::assert_no_effects)
                .run();
        }
    }
}

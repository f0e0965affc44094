//! Account Integration Tests
//!
//! Sign-in, notifications, payments and the profile page against the seeded
//! mock dataset.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use eventhub::{
    Config, EventHub, OperationError,
    backend::InMemoryBackend,
    dataset::{MockDataset, fixtures},
    types::{
        EventId, Money, NotificationId, PaymentStatus, ProfilePatch, ProfileStats, Role, UserId,
    },
};
use eventhub_core::environment::Clock;
use eventhub_testing::{init_test_tracing, test_clock};
use std::sync::Arc;
use std::time::Duration;

fn setup() -> (EventHub, Arc<MockDataset>) {
    init_test_tracing();
    let clock: Arc<dyn Clock> = Arc::new(test_clock());
    let dataset = Arc::new(MockDataset::seeded());
    let hub = EventHub::with_clock(
        &Config::for_tests(),
        Arc::new(InMemoryBackend::new(Arc::clone(&clock))),
        Arc::clone(&dataset),
        clock,
    );
    (hub, dataset)
}

fn attendee() -> UserId {
    UserId::new(fixtures::ATTENDEE_ID)
}

#[tokio::test]
async fn test_login_with_demo_password() {
    let (hub, _dataset) = setup();

    let user = hub.auth.login("jamie@example.com", "password").await.unwrap();

    assert_eq!(user.role, Role::Organizer);
    assert!(user.can_manage_events());
    let state = hub.auth.snapshot().await;
    assert!(state.is_authenticated);
    assert!(!state.is_loading);
    assert_eq!(hub.auth.current_user().await, Some(user));
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let (hub, _dataset) = setup();

    let error = hub.auth.login("alex@example.com", "hunter2").await.unwrap_err();

    assert_eq!(error.operation(), Some(&OperationError::InvalidCredentials));
    let state = hub.auth.snapshot().await;
    assert!(!state.is_authenticated);
    assert_eq!(state.error.as_deref(), Some("Invalid email or password"));

    hub.auth.dismiss_error().await.unwrap();
    assert!(hub.auth.snapshot().await.error.is_none());
}

#[tokio::test]
async fn test_register_then_logout() {
    let (hub, dataset) = setup();

    let user = hub
        .auth
        .register("Sam Lee", "sam@example.com", "password")
        .await
        .unwrap();
    assert_eq!(user.role, Role::User);
    assert_eq!(hub.auth.current_user().await, Some(user));
    assert_eq!(dataset.user_count().await, 3, "new accounts are not persisted");

    hub.auth.logout().await.unwrap();
    let state = hub.auth.snapshot().await;
    assert!(state.user.is_none());
    assert!(!state.is_authenticated);

    let taken = hub
        .auth
        .register("Alex Again", "alex@example.com", "password")
        .await
        .unwrap_err();
    assert_eq!(taken.operation(), Some(&OperationError::EmailInUse));
}

#[tokio::test]
async fn test_password_reset_needs_known_email() {
    let (hub, _dataset) = setup();

    hub.auth.reset_password("priya@example.com").await.unwrap();

    let error = hub.auth.reset_password("nobody@example.com").await.unwrap_err();
    assert_eq!(error.operation(), Some(&OperationError::EmailNotFound));
}

#[tokio::test]
async fn test_unavailable_dataset_fails_sign_in() {
    let (hub, dataset) = setup();
    dataset.fail_with(Some("mock service offline".to_string())).await;

    let error = hub.auth.login("alex@example.com", "password").await.unwrap_err();

    assert_eq!(
        error.operation(),
        Some(&OperationError::Unavailable("mock service offline".to_string()))
    );
    assert_eq!(
        hub.auth.snapshot().await.error.as_deref(),
        Some("mock service offline")
    );
}

#[tokio::test]
async fn test_notifications_unread_count_follows_reads() {
    let (hub, dataset) = setup();

    let loaded = hub.notifications.fetch_notifications(attendee()).await.unwrap();
    assert_eq!(loaded.len(), 3);
    assert_eq!(hub.notifications.unread_count().await, 2);

    hub.notifications.mark_as_read(NotificationId::new("n1")).await.unwrap();
    assert_eq!(hub.notifications.unread_count().await, 1);

    hub.notifications.mark_all_as_read().await.unwrap();
    assert_eq!(hub.notifications.unread_count().await, 0);

    let stored = dataset.notifications_for(&attendee()).await.unwrap();
    assert!(stored.iter().all(|n| n.read));

    let organizer = dataset
        .notifications_for(&UserId::new(fixtures::ORGANIZER_ID))
        .await
        .unwrap();
    assert!(organizer.iter().any(|n| !n.read), "other inboxes are untouched");
}

#[tokio::test]
async fn test_shutdown_lets_running_fetch_finish() {
    init_test_tracing();
    let mut config = Config::for_tests();
    config.simulation.latency = Duration::from_millis(100);
    let clock: Arc<dyn Clock> = Arc::new(test_clock());
    let hub = EventHub::with_clock(
        &config,
        Arc::new(InMemoryBackend::new(Arc::clone(&clock))),
        Arc::new(MockDataset::seeded()),
        clock,
    );

    let fetch = tokio::spawn({
        let hub = hub.clone();
        async move { hub.notifications.fetch_notifications(attendee()).await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    hub.shutdown().await.unwrap();

    assert_eq!(fetch.await.unwrap().unwrap().len(), 3);
    assert_eq!(hub.notifications.unread_count().await, 2);
    assert!(hub.notifications.fetch_notifications(attendee()).await.is_err());
}

#[tokio::test]
async fn test_payments_get_distinct_ids() {
    let (hub, _dataset) = setup();
    let event_id = EventId::new("event-1");

    let first = hub
        .payments
        .process_payment(attendee(), event_id.clone(), Money::from_dollars(45), "credit_card")
        .await
        .unwrap();
    let second = hub
        .payments
        .process_payment(attendee(), event_id, Money::from_dollars(45), "credit_card")
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    assert_ne!(first.transaction_id, second.transaction_id);
    assert!(first.id.as_str().starts_with("pay_"));
    assert!(first.transaction_id.starts_with("txn_"));
    assert_eq!(first.status, PaymentStatus::Completed);
    assert_eq!(first.payment_date, test_clock().now());

    let state = hub.payments.snapshot().await;
    assert_eq!(state.payment_details, Some(second));
    assert!(!state.is_processing);
}

#[tokio::test]
async fn test_profile_fetch_and_merge() {
    let (hub, _dataset) = setup();

    let profile = hub.profile.fetch_user_profile(attendee()).await.unwrap();
    assert_eq!(profile.user.name, "Alex Morgan");
    assert_eq!(profile.user.join_date.as_deref(), Some("2025-01-15"));
    assert!(profile.user.phone.is_some());
    assert_eq!(profile.stats.attendance_rate, 85);

    let stats = ProfileStats {
        total_events: 4,
        completed_events: 2,
        upcoming_events: 2,
        attendance_rate: 90,
    };
    let merged = hub
        .profile
        .update_user_profile(
            attendee(),
            ProfilePatch {
                stats: Some(stats),
                ..ProfilePatch::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(merged.stats, stats);
    assert_eq!(merged.user, profile.user);
    assert_eq!(hub.profile.snapshot().await.profile, Some(merged));
}

#[tokio::test]
async fn test_profile_update_for_other_user_is_rejected() {
    let (hub, _dataset) = setup();
    hub.profile.fetch_user_profile(attendee()).await.unwrap();

    let error = hub
        .profile
        .update_user_profile(UserId::new(fixtures::ORGANIZER_ID), ProfilePatch::default())
        .await
        .unwrap_err();

    assert_eq!(error.operation(), Some(&OperationError::ProfileNotLoaded));
    let state = hub.profile.snapshot().await;
    assert_eq!(state.error.as_deref(), Some("User profile is not loaded"));
    assert_eq!(
        state.profile.map(|p| p.user.id),
        Some(attendee()),
        "loaded profile is kept"
    );
}

#[tokio::test]
async fn test_unknown_user_has_no_profile() {
    let (hub, _dataset) = setup();

    let error = hub
        .profile
        .fetch_user_profile(UserId::new("missing"))
        .await
        .unwrap_err();

    assert_eq!(error.operation(), Some(&OperationError::UserNotFound));
    assert!(hub.profile.snapshot().await.profile.is_none());
}

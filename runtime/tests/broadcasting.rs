//! Integration tests for Store outcome broadcasting
//!
//! Services build request/response calls on top of `send_and_wait_for`,
//! matching outcomes to requests by correlation id.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use eventhub_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use eventhub_runtime::{Store, StoreConfig, StoreError};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum CounterAction {
    /// Command: add after a simulated remote round trip
    Add { request: u64, amount: u32 },
    /// Outcome
    Added { request: u64, total: u32 },
    /// Command that fails remotely
    Reject { request: u64 },
    /// Outcome
    Failed { request: u64, error: String },
}

impl CounterAction {
    const fn request(&self) -> u64 {
        match self {
            Self::Add { request, .. }
            | Self::Added { request, .. }
            | Self::Reject { request }
            | Self::Failed { request, .. } => *request,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct CounterState {
    total: u32,
    pending: u32,
    error: Option<String>,
}

#[derive(Clone)]
struct CounterEnvironment {
    latency: Duration,
}

#[derive(Clone)]
struct CounterReducer;

impl Reducer for CounterReducer {
    type State = CounterState;
    type Action = CounterAction;
    type Environment = CounterEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            CounterAction::Add { request, amount } => {
                state.pending += 1;
                let latency = env.latency;
                let total = state.total;
                smallvec![Effect::Future(Box::pin(async move {
                    tokio::time::sleep(latency).await;
                    Some(CounterAction::Added {
                        request,
                        total: total + amount,
                    })
                }))]
            },
            CounterAction::Added { total, .. } => {
                state.pending -= 1;
                state.total = state.total.max(total);
                SmallVec::new()
            },
            CounterAction::Reject { request } => {
                state.pending += 1;
                smallvec![Effect::send(CounterAction::Failed {
                    request,
                    error: "rejected".to_string(),
                })]
            },
            CounterAction::Failed { error, .. } => {
                state.pending -= 1;
                state.error = Some(error);
                SmallVec::new()
            },
        }
    }
}

type CounterStore = Store<CounterState, CounterAction, CounterEnvironment, CounterReducer>;

fn counter_store(latency: Duration) -> CounterStore {
    counter_store_with_capacity(latency, 16)
}

fn counter_store_with_capacity(latency: Duration, capacity: usize) -> CounterStore {
    Store::with_config(
        CounterState::default(),
        CounterReducer,
        CounterEnvironment { latency },
        StoreConfig::default().with_broadcast_capacity(capacity),
    )
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn waiter_observes_state_after_outcome() {
    eventhub_testing::init_test_tracing();
    let store = counter_store(Duration::from_millis(5));

    let outcome = store
        .send_and_wait_for(
            CounterAction::Add {
                request: 1,
                amount: 3,
            },
            |a| matches!(a, CounterAction::Added { request: 1, .. }),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

    assert_eq!(outcome, CounterAction::Added { request: 1, total: 3 });
    let (total, pending) = store.state(|s| (s.total, s.pending)).await;
    assert_eq!(total, 3);
    assert_eq!(pending, 0);
}

#[tokio::test]
async fn concurrent_requests_are_matched_by_correlation() {
    let store = Arc::new(counter_store(Duration::from_millis(10)));

    let waits = (1..=5_u64).map(|request| {
        let store = Arc::clone(&store);
        async move {
            store
                .send_and_wait_for(
                    CounterAction::Add { request, amount: 1 },
                    move |a| matches!(a, CounterAction::Added { .. }) && a.request() == request,
                    Duration::from_secs(2),
                )
                .await
        }
    });

    let outcomes = futures::future::join_all(waits).await;
    for (index, outcome) in outcomes.into_iter().enumerate() {
        let outcome = outcome.unwrap();
        assert_eq!(outcome.request(), index as u64 + 1);
    }
    assert_eq!(store.state(|s| s.pending).await, 0);
}

#[tokio::test]
async fn capacity_covering_all_waiters_delivers_every_outcome() {
    let requests = 32_u64;
    let store = Arc::new(counter_store_with_capacity(Duration::from_millis(10), 32));

    let waits = (1..=requests).map(|request| {
        let store = Arc::clone(&store);
        async move {
            store
                .send_and_wait_for(
                    CounterAction::Add { request, amount: 1 },
                    move |a| matches!(a, CounterAction::Added { .. }) && a.request() == request,
                    Duration::from_secs(2),
                )
                .await
        }
    });

    let outcomes = futures::future::join_all(waits).await;
    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), requests as usize);
    assert_eq!(store.state(|s| s.pending).await, 0);
}

#[tokio::test]
async fn failure_outcome_reaches_waiter() {
    let store = counter_store(Duration::ZERO);

    let outcome = store
        .send_and_wait_for(
            CounterAction::Reject { request: 9 },
            |a| a.request() == 9 && matches!(a, CounterAction::Failed { .. }),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

    assert!(matches!(outcome, CounterAction::Failed { .. }));
    assert_eq!(store.state(|s| s.error.clone()).await.as_deref(), Some("rejected"));
}

#[tokio::test]
async fn subscribers_only_see_outcomes() {
    let store = counter_store(Duration::ZERO);
    let mut rx = store.subscribe_actions();

    store
        .send(CounterAction::Add {
            request: 4,
            amount: 2,
        })
        .await
        .unwrap();

    let first = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first, CounterAction::Added { request: 4, total: 2 });
}

#[tokio::test]
async fn shutdown_waits_for_in_flight_effects() {
    let store = counter_store(Duration::from_millis(30));
    store
        .send(CounterAction::Add {
            request: 1,
            amount: 1,
        })
        .await
        .unwrap();
    assert_eq!(store.pending_effects(), 1);

    store.shutdown(Duration::from_secs(1)).await.unwrap();
    assert_eq!(store.pending_effects(), 0);

    let rejected = store.send(CounterAction::Reject { request: 2 }).await;
    assert!(matches!(rejected, Err(StoreError::ShutdownInProgress)));
}

#[tokio::test]
async fn shutdown_times_out_on_slow_effects() {
    let store = counter_store(Duration::from_secs(5));
    store
        .send(CounterAction::Add {
            request: 1,
            amount: 1,
        })
        .await
        .unwrap();

    let result = store.shutdown(Duration::from_millis(30)).await;
    assert_eq!(result, Err(StoreError::ShutdownTimeout(1)));
}

#[tokio::test]
async fn waiter_gets_outcome_when_shutdown_starts_mid_flight() {
    let store = Arc::new(counter_store(Duration::from_millis(100)));

    let waiter = tokio::spawn({
        let store = Arc::clone(&store);
        async move {
            store
                .send_and_wait_for(
                    CounterAction::Add {
                        request: 7,
                        amount: 4,
                    },
                    |a| matches!(a, CounterAction::Added { request: 7, .. }),
                    Duration::from_secs(2),
                )
                .await
        }
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    store.shutdown(Duration::from_secs(1)).await.unwrap();

    let outcome = waiter.await.unwrap().unwrap();
    assert_eq!(outcome, CounterAction::Added { request: 7, total: 4 });
    assert_eq!(store.pending_effects(), 0);
    let (total, pending) = store.state(|s| (s.total, s.pending)).await;
    assert_eq!(total, 4);
    assert_eq!(pending, 0);
}

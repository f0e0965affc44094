//! # EventHub Testing
//!
//! Testing utilities and helpers for EventHub stores.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - The `ReducerTest` Given/When/Then builder
//! - Helpers for resolving effects without a runtime
//!
//! ## Example
//!
//! ```ignore
//! use eventhub_testing::{test_clock, ReducerTest};
//!
//! ReducerTest::new(EventReducer::new())
//!     .with_env(test_environment())
//!     .given_state(EventState::default())
//!     .when_action(EventAction::FetchEvents { correlation_id })
//!     .then_state(|s| assert!(s.is_loading))
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use eventhub_core::environment::Clock;


/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use eventhub_testing::mocks::FixedClock;
    /// use eventhub_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse, which cannot happen.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Test helpers and utilities
pub mod helpers {
    use eventhub_core::effect::Effect;
    use futures::future::BoxFuture;
    use std::sync::Once;
    use uuid::Uuid;

    /// Run every effect to completion and collect the actions they produce
    ///
    /// Delays are skipped and their action is returned directly. Lets reducer
    /// tests check the outcome of a command without starting a store.
    pub fn resolve_effects<A>(effects: Vec<Effect<A>>) -> BoxFuture<'static, Vec<A>>
    where
        A: Send + 'static,
    {
        Box::pin(async move {
            let mut produced = Vec::new();
            for effect in effects {
                match effect {
                    Effect::None => {},
                    Effect::Future(fut) => produced.extend(fut.await),
                    Effect::Delay { action, .. } => produced.push(*action),
                    Effect::Parallel(inner) | Effect::Sequential(inner) => {
                        produced.extend(resolve_effects(inner).await);
                    },
                }
            }
            produced
        })
    }

    /// Deterministic version-4 UUID derived from a seed byte
    #[must_use]
    pub fn test_uuid(seed: u8) -> Uuid {
        uuid::Builder::from_random_bytes([seed; 16]).into_uuid()
    }

    static TRACING: Once = Once::new();

    /// Install a test-friendly tracing subscriber once per process
    ///
    /// Honors `RUST_LOG`; output is captured by the test harness.
    pub fn init_test_tracing() {
        TRACING.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
                )
                .with_test_writer()
                .try_init();
        });
    }
}

// Re-export commonly used items
pub use helpers::{init_test_tracing, resolve_effects, test_uuid};
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::{Reduced, ReducerTest, Scenario, assertions};

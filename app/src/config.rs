//! Configuration management for EventHub.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Simulated round-trip latencies for the mock remotes
    pub simulation: SimulationConfig,
    /// Store runtime settings
    pub store: StoreSettings,
    /// Enrollment rules
    pub enrollment: EnrollmentConfig,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Simulated latency of mock remotes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Mock dataset round trip (attendance, notifications, profiles)
    pub latency: Duration,
    /// Auth round trip
    pub auth_latency: Duration,
    /// Payment processing delay
    pub payment_latency: Duration,
}

/// Store runtime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// How long a service waits for an operation's outcome
    pub operation_timeout: Duration,
    /// Outcome actions buffered per store (`EVENTHUB_BROADCAST_CAPACITY`)
    ///
    /// Callers waiting on a store that falls further behind than this can
    /// miss their outcome and time out. Keep it above the number of
    /// concurrent operations per store.
    pub broadcast_capacity: usize,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
}

/// Enrollment rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentConfig {
    /// Length of the validity window of a new enrollment
    pub validity_months: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            simulation: SimulationConfig {
                latency: Duration::from_millis(env_or("EVENTHUB_SIMULATED_LATENCY_MS", 500)),
                auth_latency: Duration::from_millis(env_or("EVENTHUB_AUTH_LATENCY_MS", 1000)),
                payment_latency: Duration::from_millis(env_or("EVENTHUB_PAYMENT_LATENCY_MS", 2000)),
            },
            store: StoreSettings {
                operation_timeout: Duration::from_secs(env_or(
                    "EVENTHUB_OPERATION_TIMEOUT_SECS",
                    30,
                )),
                broadcast_capacity: env_or("EVENTHUB_BROADCAST_CAPACITY", 64),
                shutdown_timeout: Duration::from_secs(env_or("EVENTHUB_SHUTDOWN_TIMEOUT_SECS", 10)),
            },
            enrollment: EnrollmentConfig {
                validity_months: env_or("EVENTHUB_ENROLLMENT_MONTHS", 1),
            },
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// Zero latency and short timeouts for tests
    #[must_use]
    pub fn for_tests() -> Self {
        Self {
            simulation: SimulationConfig {
                latency: Duration::ZERO,
                auth_latency: Duration::ZERO,
                payment_latency: Duration::ZERO,
            },
            store: StoreSettings {
                operation_timeout: Duration::from_secs(5),
                broadcast_capacity: 64,
                shutdown_timeout: Duration::from_secs(1),
            },
            enrollment: EnrollmentConfig { validity_months: 1 },
            log_level: "warn".to_string(),
        }
    }

    /// Runtime configuration for each store
    #[must_use]
    pub const fn store_config(&self) -> eventhub_runtime::StoreConfig {
        eventhub_runtime::StoreConfig::new(
            self.store.broadcast_capacity,
            self.store.shutdown_timeout,
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

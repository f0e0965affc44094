//! # EventHub
//!
//! Store layer of an event discovery and registration app: users browse
//! events and enroll (optionally in a paid batch), organizers create events
//! and mark attendance, and profiles show a user's history.
//!
//! ## Architecture
//!
//! - **Stores** ([`stores`]): one reducer per domain area (events,
//!   attendance, payment, auth, notifications, profile). Commands start an
//!   effect; the outcome action is the only thing that changes state.
//! - **Services** ([`app`]): async methods over each store, returning
//!   `Result<T, ServiceError>`.
//! - **Backend** ([`backend`]): the hosted tables and RPC, with an in-memory
//!   implementation.
//! - **Mock dataset** ([`dataset`]): seeded users, attendance and
//!   notifications standing in for a remote service.
//! - **Display mapper** ([`mapper`]): raw event rows to view-ready events.
//!
//! ## Example
//!
//! ```rust,no_run
//! use eventhub::app::EventHub;
//! use eventhub::backend::InMemoryBackend;
//! use eventhub::config::Config;
//! use eventhub::dataset::MockDataset;
//! use eventhub_core::environment::SystemClock;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), eventhub::error::ServiceError> {
//! let backend = InMemoryBackend::new(Arc::new(SystemClock));
//! let dataset = Arc::new(MockDataset::seeded());
//! let hub = EventHub::new(&Config::from_env(), Arc::new(backend), dataset);
//!
//! let user = hub.auth.login("alex@example.com", "password").await?;
//! let _events = hub.events.fetch_events().await?;
//! let _enrollments = hub.events.fetch_user_enrollments(user.id).await?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod backend;
pub mod config;
pub mod dataset;
pub mod error;
pub mod filters;
pub mod mapper;
pub mod metrics;
pub mod payment_gateway;
pub mod stores;
pub mod types;

pub use app::EventHub;
pub use config::Config;
pub use error::{OperationError, ServiceError, ServiceResult};

//! Application registry - wires the stores together.
//!
//! [`EventHub`] builds one store per domain area, wraps each in its service
//! and hands them out. Every store shares the same clock, backend and mock
//! dataset. Services are passed to callers explicitly; there are no globals.

mod coordinator;
mod services;

pub use coordinator::{EnrollmentCoordinator, EnrollmentReceipt};
pub use services::{
    AttendanceService, AttendanceStore, AuthService, AuthStore, EventService, EventStore,
    NotificationService, NotificationStore, PaymentService, PaymentStore, ProfileService,
    ProfileStore,
};

use crate::backend::Backend;
use crate::config::Config;
use crate::dataset::MockDataset;
use crate::payment_gateway::{MockPaymentGateway, PaymentGateway};
use crate::stores::{
    AttendanceEnvironment, AttendanceReducer, AttendanceState, AuthEnvironment, AuthReducer,
    AuthState, EventEnvironment, EventReducer, EventState, NotificationEnvironment,
    NotificationReducer, NotificationState, PaymentEnvironment, PaymentReducer, PaymentState,
    ProfileEnvironment, ProfileReducer, ProfileState,
};
use eventhub_core::environment::{Clock, SystemClock};
use eventhub_runtime::{Store, StoreError};
use std::sync::Arc;

/// All services of the application
#[derive(Clone)]
pub struct EventHub {
    /// Catalogue and enrollments
    pub events: EventService,
    /// Attendance marking
    pub attendance: AttendanceService,
    /// Payments
    pub payments: PaymentService,
    /// Sign-in
    pub auth: AuthService,
    /// Notification inbox
    pub notifications: NotificationService,
    /// Profile page
    pub profile: ProfileService,
    /// Pay-then-enroll flow
    pub enrollment: EnrollmentCoordinator,
}

impl EventHub {
    /// Build every store on the system clock and the mock payment gateway
    #[must_use]
    pub fn new(config: &Config, backend: Arc<dyn Backend>, dataset: Arc<MockDataset>) -> Self {
        Self::with_clock(config, backend, dataset, Arc::new(SystemClock))
    }

    /// Build every store on the given clock and the mock payment gateway
    #[must_use]
    pub fn with_clock(
        config: &Config,
        backend: Arc<dyn Backend>,
        dataset: Arc<MockDataset>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let gateway =
            MockPaymentGateway::shared(Arc::clone(&clock), config.simulation.payment_latency);
        Self::with_gateway(config, backend, dataset, clock, gateway)
    }

    /// Build every store with an explicit payment gateway
    #[must_use]
    pub fn with_gateway(
        config: &Config,
        backend: Arc<dyn Backend>,
        dataset: Arc<MockDataset>,
        clock: Arc<dyn Clock>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let store_config = config.store_config();
        let timeout = config.store.operation_timeout;
        let latency = config.simulation.latency;

        let events = EventService::new(
            Store::with_config(
                EventState::default(),
                EventReducer::new(),
                EventEnvironment::new(backend, clock, config.enrollment.validity_months),
                store_config,
            ),
            timeout,
        );
        let attendance = AttendanceService::new(
            Store::with_config(
                AttendanceState::default(),
                AttendanceReducer::new(),
                AttendanceEnvironment::new(Arc::clone(&dataset), latency),
                store_config,
            ),
            timeout,
        );
        let payments = PaymentService::new(
            Store::with_config(
                PaymentState::default(),
                PaymentReducer::new(),
                PaymentEnvironment::new(gateway),
                store_config,
            ),
            timeout,
        );
        let auth = AuthService::new(
            Store::with_config(
                AuthState::default(),
                AuthReducer::new(),
                AuthEnvironment::new(Arc::clone(&dataset), config.simulation.auth_latency),
                store_config,
            ),
            timeout,
        );
        let notifications = NotificationService::new(
            Store::with_config(
                NotificationState::default(),
                NotificationReducer::new(),
                NotificationEnvironment::new(Arc::clone(&dataset), latency),
                store_config,
            ),
            timeout,
        );
        let profile = ProfileService::new(
            Store::with_config(
                ProfileState::default(),
                ProfileReducer::new(),
                ProfileEnvironment::new(dataset, latency),
                store_config,
            ),
            timeout,
        );
        let enrollment = EnrollmentCoordinator::new(events.clone(), payments.clone());

        tracing::info!("EventHub stores ready");

        Self {
            events,
            attendance,
            payments,
            auth,
            notifications,
            profile,
            enrollment,
        }
    }

    /// Shut the stores down one after another
    ///
    /// Each store rejects new commands, then waits for its in-flight effects.
    /// Operations already running still complete and return their result.
    ///
    /// # Errors
    ///
    /// Returns the first [`StoreError::ShutdownTimeout`] among the stores.
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        let results = [
            self.events.store().shutdown_gracefully().await,
            self.attendance.store().shutdown_gracefully().await,
            self.payments.store().shutdown_gracefully().await,
            self.auth.store().shutdown_gracefully().await,
            self.notifications.store().shutdown_gracefully().await,
            self.profile.store().shutdown_gracefully().await,
        ];
        tracing::info!("EventHub shut down");
        results.into_iter().collect()
    }
}

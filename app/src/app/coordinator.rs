//! Enrollment coordinator - the event detail page's register flow.
//!
//! Paid events are charged first and enrolled only after the payment went
//! through. Free events enroll directly.

use super::services::{EventService, PaymentService};
use crate::error::{OperationError, ServiceResult};
use crate::mapper::is_uuid_v4;
use crate::metrics;
use crate::types::{BatchId, Enrollment, EventId, PaymentDetails, UserId};
use serde::Serialize;
use std::time::Instant;

/// Result of a registration
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnrollmentReceipt {
    /// The new enrollment
    pub enrollment: Enrollment,
    /// The payment, for paid events
    pub payment: Option<PaymentDetails>,
}

/// Runs the pay-then-enroll flow across the payment and event stores
#[derive(Clone)]
pub struct EnrollmentCoordinator {
    events: EventService,
    payments: PaymentService,
}

impl EnrollmentCoordinator {
    /// Create a coordinator over the two services
    #[must_use]
    pub const fn new(events: EventService, payments: PaymentService) -> Self {
        Self { events, payments }
    }

    /// Register a user for an event
    ///
    /// 1. Validate the user ID
    /// 2. Load the event for its price
    /// 3. Charge the base price if it is not zero
    /// 4. Enroll
    ///
    /// A payment that succeeded is not refunded if enrolling fails; the
    /// receipt is only returned when both steps succeeded.
    ///
    /// # Errors
    ///
    /// - [`OperationError::InvalidUserId`] before anything is charged
    /// - [`OperationError::EventNotFound`] for an unknown event
    /// - the payment or enrollment failure
    #[tracing::instrument(
        skip(self, payment_method),
        fields(user_id = %user_id, event_id = %event_id)
    )]
    pub async fn register(
        &self,
        user_id: UserId,
        event_id: EventId,
        batch_id: Option<BatchId>,
        payment_method: &str,
    ) -> ServiceResult<EnrollmentReceipt> {
        let started = Instant::now();

        if !is_uuid_v4(user_id.as_str()) {
            return Err(OperationError::InvalidUserId.into());
        }

        let event = self
            .events
            .fetch_event_by_id(event_id.clone())
            .await?
            .ok_or(OperationError::EventNotFound)?;

        let payment = if event.base_price.is_free() {
            None
        } else {
            tracing::info!(amount = %event.base_price, "Charging before enrollment");
            let payment = self
                .payments
                .process_payment(
                    user_id.clone(),
                    event_id.clone(),
                    event.base_price,
                    payment_method,
                )
                .await
                .inspect_err(|_| metrics::record_registration_failed("payment"))?;
            Some(payment)
        };

        let enrollment = self
            .events
            .enroll_in_event(user_id, event_id, batch_id)
            .await
            .inspect_err(|error| {
                metrics::record_registration_failed("enrollment");
                if let Some(payment) = &payment {
                    tracing::error!(
                        payment_id = %payment.id,
                        error = %error,
                        "Enrollment failed after payment"
                    );
                }
            })?;

        metrics::record_enrollment(
            payment.as_ref().map(|p| p.amount.cents()),
            started.elapsed().as_secs_f64(),
        );
        tracing::info!(enrollment_id = %enrollment.id, "Registration complete");

        Ok(EnrollmentReceipt { enrollment, payment })
    }
}

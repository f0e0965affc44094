//! Payment store: the last processed payment.

use super::Correlated;
use crate::error::OperationError;
use crate::payment_gateway::{PaymentGateway, PaymentRequest};
use crate::types::PaymentDetails;
use eventhub_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec, try_effect};
use std::sync::Arc;
use uuid::Uuid;

/// Payment store state
#[derive(Clone, Debug, Default)]
pub struct PaymentState {
    /// Last successful payment
    pub payment_details: Option<PaymentDetails>,
    /// A payment is in flight
    pub is_processing: bool,
    /// Last failure
    pub error: Option<String>,
}

/// Actions for the payment store
#[derive(Clone, Debug)]
pub enum PaymentAction {
    /// Charge a payment
    ProcessPayment {
        /// Correlation ID
        correlation_id: Uuid,
        /// What to charge
        request: PaymentRequest,
    },
    /// Clear the error banner
    DismissError,
    /// Gateway accepted the payment
    PaymentProcessed {
        /// Correlation ID
        correlation_id: Uuid,
        /// Receipt
        payment: PaymentDetails,
    },
    /// Gateway refused the payment
    OperationFailed {
        /// Correlation ID
        correlation_id: Uuid,
        /// Failure
        error: OperationError,
    },
}

impl Correlated for PaymentAction {
    fn correlation_id(&self) -> Option<Uuid> {
        match self {
            Self::ProcessPayment { correlation_id, .. }
            | Self::PaymentProcessed { correlation_id, .. }
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
        matches!(self, Self::PaymentProcessed { .. } | Self::OperationFailed { .. })
    }
}

/// Environment dependencies for the payment store
#[derive(Clone)]
pub struct PaymentEnvironment {
    /// Payment processor
    pub gateway: Arc<dyn PaymentGateway>,
}

impl PaymentEnvironment {
    /// Creates a new `PaymentEnvironment`
    #[must_use]
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { gateway }
    }
}

/// Reducer for the payment store
#[derive(Clone, Debug, Default)]
pub struct PaymentReducer;

impl PaymentReducer {
    /// Creates a new `PaymentReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for PaymentReducer {
    type State = PaymentState;
    type Action = PaymentAction;
    type Environment = PaymentEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            PaymentAction::ProcessPayment {
                correlation_id,
                request,
            } => {
                state.is_processing = true;
                state.error = None;
                let gateway = Arc::clone(&env.gateway);
                smallvec![try_effect! {
                    run: gateway.process_payment(request),
                    ok: |payment| PaymentAction::PaymentProcessed { correlation_id, payment },
                    err: |error| PaymentAction::OperationFailed {
                        correlation_id,
                        error: error.into(),
                    }
                }]
            },

            PaymentAction::DismissError => {
                state.error = None;
                SmallVec::new()
            },

            PaymentAction::PaymentProcessed { payment, .. } => {
                state.payment_details = Some(payment);
                state.is_processing = false;
                SmallVec::new()
            },

            PaymentAction::OperationFailed { error, .. } => {
                tracing::warn!(error = %error, "Payment failed");
                state.error = Some(error.to_string());
                state.is_processing = false;
                SmallVec::new()
            },
        }
    }
}

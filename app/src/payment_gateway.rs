//! Payment gateway abstraction and the mock gateway used by the demo.
//!
//! The mock charges nothing and always succeeds after a simulated delay.
//! A real processor would implement [`PaymentGateway`] instead.

use crate::error::PaymentGatewayError;
use crate::stores::{random_base36, simulate_latency};
use crate::types::{EventId, Money, PaymentDetails, PaymentId, PaymentStatus, UserId};
use eventhub_core::environment::Clock;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Payment gateway result
pub type GatewayResult<T> = Result<T, PaymentGatewayError>;

/// What to charge
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Payer
    pub user_id: UserId,
    /// Event paid for
    pub event_id: EventId,
    /// Amount
    pub amount: Money,
    /// Method label, e.g. `credit_card`
    pub payment_method: String,
}

/// Payment gateway trait
///
/// Abstraction over payment processors.
pub trait PaymentGateway: Send + Sync {
    /// Charge a payment
    ///
    /// # Errors
    ///
    /// Returns error if the payment fails
    fn process_payment(
        &self,
        request: PaymentRequest,
    ) -> BoxFuture<'static, GatewayResult<PaymentDetails>>;
}

/// Mock payment gateway (always succeeds)
///
/// Issues `pay_…` and `txn_…` identifiers with 13 random base-36 characters.
#[derive(Clone)]
pub struct MockPaymentGateway {
    clock: Arc<dyn Clock>,
    latency: Duration,
}

impl MockPaymentGateway {
    /// Creates a new mock payment gateway
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, latency: Duration) -> Self {
        Self { clock, latency }
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared(clock: Arc<dyn Clock>, latency: Duration) -> Arc<dyn PaymentGateway> {
        Arc::new(Self::new(clock, latency))
    }
}

impl std::fmt::Debug for MockPaymentGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPaymentGateway")
            .field("latency", &self.latency)
            .finish_non_exhaustive()
    }
}

impl PaymentGateway for MockPaymentGateway {
    fn process_payment(
        &self,
        request: PaymentRequest,
    ) -> BoxFuture<'static, GatewayResult<PaymentDetails>> {
        let clock = Arc::clone(&self.clock);
        let latency = self.latency;
        Box::pin(async move {
            simulate_latency(latency).await;

            let payment = PaymentDetails {
                id: PaymentId::new(format!("pay_{}", random_base36(13))),
                user_id: request.user_id,
                event_id: request.event_id,
                amount: request.amount,
                status: PaymentStatus::Completed,
                payment_method: request.payment_method,
                payment_date: clock.now(),
                transaction_id: format!("txn_{}", random_base36(13)),
            };

            tracing::info!(
                payment_id = %payment.id,
                amount = payment.amount.cents(),
                transaction_id = %payment.transaction_id,
                "Mock payment processed successfully"
            );

            Ok(payment)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use eventhub_testing::test_clock;

    fn request() -> PaymentRequest {
        PaymentRequest {
            user_id: UserId::new("u1"),
            event_id: EventId::new("e1"),
            amount: Money::from_dollars(45),
            payment_method: "credit_card".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_payment_success() {
        let gateway = MockPaymentGateway::new(Arc::new(test_clock()), Duration::ZERO);
        let payment = gateway.process_payment(request()).await.unwrap();

        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(payment.amount, Money::from_dollars(45));
        assert!(payment.id.as_str().starts_with("pay_"));
        assert_eq!(payment.id.as_str().len(), 17);
        assert!(payment.transaction_id.starts_with("txn_"));
        assert_eq!(payment.payment_date, test_clock().now());
    }

    #[tokio::test]
    async fn ids_differ_between_payments() {
        let gateway = MockPaymentGateway::new(Arc::new(test_clock()), Duration::ZERO);
        let first = gateway.process_payment(request()).await.unwrap();
        let second = gateway.process_payment(request()).await.unwrap();
        assert_ne!(first.id, second.id);
        assert_ne!(first.transaction_id, second.transaction_id);
    }

    #[tokio::test]
    async fn payment_future_outlives_gateway() {
        let gateway: Arc<dyn PaymentGateway> = MockPaymentGateway::shared(
            Arc::new(test_clock()),
            Duration::from_millis(5),
        );
        let pending = gateway.process_payment(request());
        drop(gateway);

        let payment = tokio::spawn(pending).await.unwrap().unwrap();
        assert_eq!(payment.user_id, UserId::new("u1"));
    }
}

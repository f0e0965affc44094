//! Business metrics for enrollment and payment.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! host installs a recorder.
//!
//! ## Counters
//! - `eventhub_enrollments_total{kind}` - Enrollments by kind (free, paid)
//! - `eventhub_enrollments_failed_total{stage}` - Failed registrations by stage
//! - `eventhub_payment_revenue_cents_total` - Revenue from mock payments in cents
//!
//! ## Histograms
//! - `eventhub_registration_duration_seconds` - Time for the whole pay-and-enroll flow

use metrics::{describe_counter, describe_histogram};

/// Register metric descriptions; call once at startup.
pub fn register_business_metrics() {
    describe_counter!(
        "eventhub_enrollments_total",
        "Total number of enrollments by kind (free, paid)"
    );
    describe_counter!(
        "eventhub_enrollments_failed_total",
        "Total number of failed registrations by stage (payment, enrollment)"
    );
    describe_counter!(
        "eventhub_payment_revenue_cents_total",
        "Total revenue from successful payments in cents"
    );
    describe_histogram!(
        "eventhub_registration_duration_seconds",
        "Time taken by the pay-and-enroll flow"
    );

    tracing::info!("Business metrics registered");
}

/// Record a completed registration.
///
/// # Arguments
///
/// * `paid_cents` - Amount charged, `None` for free events
/// * `duration_secs` - Time the flow took
pub fn record_enrollment(paid_cents: Option<u64>, duration_secs: f64) {
    let kind = if paid_cents.is_some() { "paid" } else { "free" };
    metrics::counter!("eventhub_enrollments_total", "kind" => kind).increment(1);
    if let Some(cents) = paid_cents {
        metrics::counter!("eventhub_payment_revenue_cents_total").increment(cents);
    }
    metrics::histogram!("eventhub_registration_duration_seconds").record(duration_secs);
    tracing::debug!(kind, duration_secs, "Recorded enrollment metric");
}

/// Record a registration that stopped at `stage`.
pub fn record_registration_failed(stage: &'static str) {
    metrics::counter!("eventhub_enrollments_failed_total", "stage" => stage).increment(1);
    tracing::debug!(stage, "Recorded registration_failed metric");
}

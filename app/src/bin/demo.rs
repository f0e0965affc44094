//! EventHub Demo
//!
//! Walks through the attendee flow against the in-memory backend:
//! - Sign in as the seeded attendee
//! - Browse and filter the catalogue
//! - Pay for and enroll in a batch, then enroll in a free event
//! - List and cancel enrollments
//! - Read notifications and the profile page
//!
//! # Usage
//!
//! ```bash
//! # Skip the simulated delays
//! EVENTHUB_SIMULATED_LATENCY_MS=0 EVENTHUB_AUTH_LATENCY_MS=0 EVENTHUB_PAYMENT_LATENCY_MS=0 \
//!     cargo run --bin eventhub-demo
//! ```

use anyhow::Context;
use eventhub::{
    Config, EventHub,
    backend::InMemoryBackend,
    dataset::{MockDataset, fixtures},
    filters::{EventFilter, PriceRange},
    metrics,
    types::User,
};
use eventhub_core::environment::{Clock, SystemClock};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,eventhub=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("\n============================================");
    println!("   EventHub - Live Demo");
    println!("============================================\n");

    let config = Config::from_env();
    metrics::register_business_metrics();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let backend = InMemoryBackend::new(Arc::clone(&clock));
    let organizer: User = fixtures::users()
        .into_iter()
        .nth(1)
        .context("fixtures contain an organizer")?;
    backend.seed_demo(&organizer).await;

    let hub = EventHub::with_clock(
        &config,
        Arc::new(backend),
        Arc::new(MockDataset::seeded()),
        clock,
    );

    // Step 1: sign in
    println!("1. Signing in as alex@example.com...");
    let user = hub.auth.login("alex@example.com", "password").await?;
    println!("   Signed in: {} ({:?})\n", user.name, user.role);

    // Step 2: browse
    println!("2. Browsing events...");
    let events = hub.events.fetch_events().await?;
    for event in &events {
        println!(
            "   - {} [{}] {} | {} | {}/{} enrolled",
            event.name, event.category, event.base_price, event.time, event.enrolled, event.capacity
        );
    }

    let filter = EventFilter::from_query_pairs([("priceRange", "under-50")]);
    let affordable = filter.apply(&events);
    println!(
        "   Filter {:?} -> {} event(s)\n",
        filter.to_query_pairs(),
        affordable.len()
    );

    // Step 3: pay and enroll in a batch
    let pottery = events
        .iter()
        .find(|e| PriceRange::Under50.contains(e.base_price))
        .context("demo catalogue has a paid event under $50")?;
    let detail = hub
        .events
        .fetch_event_by_id(pottery.id.clone())
        .await?
        .context("listed event can be loaded")?;
    println!(
        "3. Registering for {} ({}) at {}, {}...",
        detail.name, detail.base_price, detail.location, detail.time
    );
    let receipt = hub
        .enrollment
        .register(
            user.id.clone(),
            detail.id.clone(),
            detail.batches.first().map(|b| b.id.clone()),
            "credit_card",
        )
        .await?;
    println!("{}\n", serde_json::to_string_pretty(&receipt)?);

    // Step 4: free event
    let yoga = events
        .iter()
        .find(|e| e.base_price.is_free())
        .context("demo catalogue has a free event")?;
    println!("4. Registering for {} (free)...", yoga.name);
    let free = hub
        .enrollment
        .register(user.id.clone(), yoga.id.clone(), None, "none")
        .await?;
    println!("   Enrollment {} is {:?}\n", free.enrollment.id, free.enrollment.status);

    // Step 5: list and cancel
    println!("5. My enrollments...");
    let enrollments = hub.events.fetch_user_enrollments(user.id.clone()).await?;
    for enrollment in &enrollments {
        let name = enrollment.event.as_ref().map_or("?", |e| e.name.as_str());
        println!("   - {} {:?} {}", name, enrollment.status, enrollment.final_amount);
    }
    hub.events.cancel_enrollment(free.enrollment.id.clone()).await?;
    println!("   Cancelled {}\n", free.enrollment.id);

    // Step 6: notifications
    println!("6. Notifications...");
    let notifications = hub.notifications.fetch_notifications(user.id.clone()).await?;
    println!(
        "   {} notification(s), {} unread",
        notifications.len(),
        hub.notifications.unread_count().await
    );
    hub.notifications.mark_all_as_read().await?;
    println!("   After mark-all: {} unread\n", hub.notifications.unread_count().await);

    // Step 7: profile
    println!("7. Profile...");
    let profile = hub.profile.fetch_user_profile(user.id.clone()).await?;
    println!("{}\n", serde_json::to_string_pretty(&profile)?);

    hub.shutdown().await?;

    println!("============================================");
    println!("   Demo complete");
    println!("============================================\n");

    Ok(())
}

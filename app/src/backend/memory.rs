//! In-memory backend for tests and the demo binary.

use super::{
    Backend, BackendFuture, BackendResult, EventPatch, EventRecord, NewEvent, NewRegistration,
    OrganizerProfile, RegistrationRecord,
};
use crate::error::BackendError;
use crate::types::{
    Batch, BatchId, Discount, EnrollmentId, EnrollmentStatus, EventId, Money, UserId,
};
use eventhub_core::environment::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Tables of the hosted backend kept in memory
///
/// Row IDs are UUID v4 and timestamps come from the injected clock. Every
/// trait call is counted, and [`InMemoryBackend::fail_with`] makes all calls
/// fail until cleared.
///
/// # Example
///
/// ```ignore
/// let backend = InMemoryBackend::new(Arc::new(SystemClock));
/// backend.seed_demo(&organizer).await;
/// assert_eq!(backend.call_count(), 0);
/// ```
#[derive(Clone)]
pub struct InMemoryBackend {
    inner: Arc<Tables>,
}

struct Tables {
    clock: Arc<dyn Clock>,
    profiles: RwLock<HashMap<UserId, OrganizerProfile>>,
    events: RwLock<Vec<EventRecord>>,
    batches: RwLock<Vec<Batch>>,
    discounts: RwLock<Vec<Discount>>,
    registrations: RwLock<Vec<RegistrationRecord>>,
    failure: RwLock<Option<String>>,
    calls: AtomicUsize,
}

impl InMemoryBackend {
    /// Creates an empty backend
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Tables {
                clock,
                profiles: RwLock::new(HashMap::new()),
                events: RwLock::new(Vec::new()),
                batches: RwLock::new(Vec::new()),
                discounts: RwLock::new(Vec::new()),
                registrations: RwLock::new(Vec::new()),
                failure: RwLock::new(None),
                calls: AtomicUsize::new(0),
            }),
        }
    }

    /// Number of [`Backend`] calls made so far
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    /// Make every call fail with this message, or recover with `None`
    pub async fn fail_with(&self, message: Option<String>) {
        *self.inner.failure.write().await = message;
    }

    /// Add or replace an organizer profile
    pub async fn insert_profile(&self, profile: OrganizerProfile) {
        self.inner.profiles.write().await.insert(profile.id.clone(), profile);
    }

    /// Add an event row; embedded relations are split into their own tables
    pub async fn insert_event_record(&self, mut record: EventRecord) {
        if let Some(profile) = record.profile.take() {
            self.insert_profile(profile).await;
        }
        self.inner.batches.write().await.append(&mut record.batches);
        self.inner.discounts.write().await.append(&mut record.discounts);
        self.inner.events.write().await.push(record);
    }

    /// Add a registration row as-is (embedded event is dropped)
    pub async fn insert_registration_record(&self, mut record: RegistrationRecord) {
        record.event = None;
        self.inner.registrations.write().await.push(record);
    }

    /// Read one batch row
    pub async fn batch(&self, id: &BatchId) -> Option<Batch> {
        self.inner.batches.read().await.iter().find(|b| &b.id == id).cloned()
    }

    /// Read one registration row
    pub async fn registration(&self, id: &EnrollmentId) -> Option<RegistrationRecord> {
        self.inner
            .registrations
            .read()
            .await
            .iter()
            .find(|r| &r.id == id)
            .cloned()
    }

    /// Seed demo events run by `organizer`
    pub async fn seed_demo(&self, organizer: &crate::types::User) {
        for record in demo_events(&organizer.id, &organizer.name, self.inner.clock.now()) {
            self.insert_event_record(record).await;
        }
    }

    fn begin_call(&self) -> Arc<Tables> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        Arc::clone(&self.inner)
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackend")
            .field("calls", &self.call_count())
            .finish_non_exhaustive()
    }
}

impl Tables {
    async fn check_available(&self) -> BackendResult<()> {
        match self.failure.read().await.as_ref() {
            Some(message) => Err(BackendError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }

    async fn event_row(&self, id: &EventId) -> Option<EventRecord> {
        self.events.read().await.iter().find(|e| &e.id == id).cloned()
    }

    /// Embed profile and batches, plus discounts when asked
    async fn embed(&self, mut record: EventRecord, with_discounts: bool) -> EventRecord {
        record.profile = self.profiles.read().await.get(&record.organizer_id).cloned();
        record.batches = self
            .batches
            .read()
            .await
            .iter()
            .filter(|b| b.event_id == record.id)
            .cloned()
            .collect();
        if with_discounts {
            record.discounts = self
                .discounts
                .read()
                .await
                .iter()
                .filter(|d| d.event_id == record.id)
                .cloned()
                .collect();
        }
        record
    }
}

impl Backend for InMemoryBackend {
    fn auth_handle(&self) -> String {
        "in-memory admin handle (no session)".to_string()
    }

    fn list_events(&self) -> BackendFuture<Vec<EventRecord>> {
        let tables = self.begin_call();
        Box::pin(async move {
            tables.check_available().await?;
            Ok(tables.events.read().await.clone())
        })
    }

    fn get_event(&self, id: EventId) -> BackendFuture<Option<EventRecord>> {
        let tables = self.begin_call();
        Box::pin(async move {
            tables.check_available().await?;
            match tables.event_row(&id).await {
                Some(record) => Ok(Some(tables.embed(record, true).await)),
                None => Ok(None),
            }
        })
    }

    fn get_event_row(&self, id: EventId) -> BackendFuture<Option<EventRecord>> {
        let tables = self.begin_call();
        Box::pin(async move {
            tables.check_available().await?;
            Ok(tables.event_row(&id).await)
        })
    }

    fn list_registrations(&self, user_id: UserId) -> BackendFuture<Vec<RegistrationRecord>> {
        let tables = self.begin_call();
        Box::pin(async move {
            tables.check_available().await?;
            let mut rows: Vec<RegistrationRecord> = tables
                .registrations
                .read()
                .await
                .iter()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

            for row in &mut rows {
                if let Some(event) = tables.event_row(&row.event_id).await {
                    row.event = Some(tables.embed(event, false).await);
                }
            }
            Ok(rows)
        })
    }

    fn insert_registration(
        &self,
        registration: NewRegistration,
    ) -> BackendFuture<RegistrationRecord> {
        let tables = self.begin_call();
        Box::pin(async move {
            tables.check_available().await?;
            let now = tables.clock.now();
            let row = RegistrationRecord {
                id: EnrollmentId::from(Uuid::new_v4()),
                user_id: registration.user_id,
                event_id: registration.event_id,
                batch_id: registration.batch_id,
                hours_registered: None,
                weeks_registered: None,
                months_registered: None,
                total_amount: registration.total_amount,
                discount_applied: Money::ZERO,
                final_amount: registration.final_amount,
                status: registration.status,
                start_date: registration.start_date,
                end_date: registration.end_date,
                created_at: now,
                updated_at: now,
                event: None,
            };
            tables.registrations.write().await.push(row.clone());
            Ok(row)
        })
    }

    fn update_registration_status(
        &self,
        id: EnrollmentId,
        status: EnrollmentStatus,
    ) -> BackendFuture<()> {
        let tables = self.begin_call();
        Box::pin(async move {
            tables.check_available().await?;
            let now = tables.clock.now();
            let mut rows = tables.registrations.write().await;
            let row = rows
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| BackendError::NotFound {
                    table: "registrations",
                    id: id.to_string(),
                })?;
            row.status = status;
            row.updated_at = now;
            Ok(())
        })
    }

    fn increment_batch_enrollment(&self, batch_id: BatchId) -> BackendFuture<()> {
        let tables = self.begin_call();
        Box::pin(async move {
            tables.check_available().await?;
            let now = tables.clock.now();
            let mut batches = tables.batches.write().await;
            let batch = batches
                .iter_mut()
                .find(|b| b.id == batch_id)
                .ok_or_else(|| BackendError::NotFound {
                    table: "batches",
                    id: batch_id.to_string(),
                })?;
            batch.enrolled += 1;
            batch.updated_at = now;
            Ok(())
        })
    }

    fn insert_event(&self, event: NewEvent) -> BackendFuture<EventRecord> {
        let tables = self.begin_call();
        Box::pin(async move {
            tables.check_available().await?;
            let now = tables.clock.now();
            let row = EventRecord {
                id: EventId::from(Uuid::new_v4()),
                name: event.name,
                description: event.description,
                organizer_id: event.organizer_id,
                event_type: event.event_type,
                price_type: event.price_type,
                base_price: event.base_price,
                min_hours: event.min_hours,
                min_weeks: event.min_weeks,
                min_months: event.min_months,
                created_at: now,
                updated_at: now,
                profile: None,
                batches: Vec::new(),
                discounts: Vec::new(),
            };
            tables.events.write().await.push(row.clone());
            Ok(row)
        })
    }

    fn update_event(&self, id: EventId, patch: EventPatch) -> BackendFuture<EventRecord> {
        let tables = self.begin_call();
        Box::pin(async move {
            tables.check_available().await?;
            let now = tables.clock.now();
            let mut events = tables.events.write().await;
            let row = events
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| BackendError::NotFound {
                    table: "events",
                    id: id.to_string(),
                })?;

            if let Some(name) = patch.name {
                row.name = name;
            }
            if let Some(description) = patch.description {
                row.description = description;
            }
            if let Some(event_type) = patch.event_type {
                row.event_type = event_type;
            }
            if let Some(price_type) = patch.price_type {
                row.price_type = price_type;
            }
            if let Some(base_price) = patch.base_price {
                row.base_price = base_price;
            }
            if patch.min_hours.is_some() {
                row.min_hours = patch.min_hours;
            }
            if patch.min_weeks.is_some() {
                row.min_weeks = patch.min_weeks;
            }
            if patch.min_months.is_some() {
                row.min_months = patch.min_months;
            }
            row.updated_at = now;
            Ok(row.clone())
        })
    }
}

/// Demo catalogue: one event per level, the first two with batches
fn demo_events(
    organizer_id: &UserId,
    organizer_name: &str,
    now: chrono::DateTime<chrono::Utc>,
) -> Vec<EventRecord> {
    use crate::types::{DiscountType, PriceType};

    let catalogue = [
        (
            "Morning Yoga Basics",
            "Gentle flow for newcomers.",
            "regular",
            PriceType::Monthly,
            0,
            Some(("Downtown Studio, Mon/Wed", "07:00:00", "08:30:00", 20, 12)),
        ),
        (
            "Intermediate Pottery",
            "Wheel throwing and glazing.",
            "intermediate",
            PriceType::Weekly,
            45,
            Some(("Arts Center, Tue/Thu", "18:00:00", "20:00:00", 12, 11)),
        ),
        (
            "Advanced Data Structures",
            "Trees, heaps and graphs in depth.",
            "advanced",
            PriceType::Monthly,
            150,
            None,
        ),
        (
            "Summer Coding Camp",
            "Four weeks of projects for teens.",
            "summer",
            PriceType::Weekly,
            250,
            None,
        ),
    ];

    catalogue
        .into_iter()
        .map(|(name, description, event_type, price_type, dollars, batch)| {
            let event_id = EventId::from(Uuid::new_v4());
            let batches = batch
                .map(|(schedule, start, end, capacity, enrolled)| Batch {
                    id: BatchId::from(Uuid::new_v4()),
                    event_id: event_id.clone(),
                    name: format!("{name} - Batch 1"),
                    schedule: schedule.to_string(),
                    start_time: start.to_string(),
                    end_time: end.to_string(),
                    working_days: vec!["Monday".to_string(), "Wednesday".to_string()],
                    capacity,
                    enrolled,
                    created_at: now,
                    updated_at: now,
                })
                .into_iter()
                .collect();
            let discounts = if event_type == "summer" {
                vec![Discount {
                    id: Uuid::new_v4().to_string(),
                    event_id: event_id.clone(),
                    name: "Early bird".to_string(),
                    description: Some("Book a month ahead".to_string()),
                    discount_type: DiscountType::EarlyBird,
                    percentage: 15,
                    min_registration_value: None,
                    valid_from: now,
                    valid_until: now + chrono::Duration::days(30),
                    created_at: now,
                    updated_at: now,
                }]
            } else {
                Vec::new()
            };

            EventRecord {
                id: event_id,
                name: name.to_string(),
                description: description.to_string(),
                organizer_id: organizer_id.clone(),
                event_type: event_type.to_string(),
                price_type,
                base_price: Money::from_dollars(dollars),
                min_hours: None,
                min_weeks: None,
                min_months: None,
                created_at: now,
                updated_at: now,
                profile: Some(OrganizerProfile {
                    id: organizer_id.clone(),
                    full_name: Some(organizer_name.to_string()),
                }),
                batches,
                discounts,
            }
        })
        .collect()
}

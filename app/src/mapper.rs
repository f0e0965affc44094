//! Display mapping from raw event rows to view-ready [`Event`]s.
//!
//! Pure apart from the clock: the display `date` of a scheduled event is the
//! clock's current date, not the batch's own date.

use crate::backend::{EventRecord, RegistrationRecord};
use crate::types::{Enrollment, Event, EventType};
use eventhub_core::environment::Clock;
use uuid::Uuid;

/// Display date used when the event has no batch
pub const FLEXIBLE_DATE: &str = "Flexible";

/// Time and location used when the event has no batch
pub const TO_BE_ANNOUNCED: &str = "To be announced";

/// Organizer name used when the profile is missing
pub const UNKNOWN_ORGANIZER: &str = "Unknown Organizer";

/// Cover image for an event type
#[must_use]
pub const fn image_url(event_type: EventType) -> &'static str {
    match event_type {
        EventType::Regular => "https://images.pexels.com/photos/3184360/pexels-photo-3184360.jpeg",
        EventType::Intermediate => {
            "https://images.pexels.com/photos/3184291/pexels-photo-3184291.jpeg"
        },
        EventType::Advanced => "https://images.pexels.com/photos/3184339/pexels-photo-3184339.jpeg",
        EventType::Summer => "https://images.pexels.com/photos/3184302/pexels-photo-3184302.jpeg",
    }
}

/// Cover image for a raw type column, falling back to the regular image
#[must_use]
pub fn image_url_for(raw_event_type: &str) -> &'static str {
    image_url(EventType::parse(raw_event_type).unwrap_or(EventType::Regular))
}

/// First letter uppercased, rest untouched
#[must_use]
pub fn category_label(raw_event_type: &str) -> String {
    let mut chars = raw_event_type.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// First five characters of a `HH:MM:SS` time
fn clock_prefix(time: &str) -> &str {
    time.get(..5).unwrap_or(time)
}

/// Map a raw event row (and its first batch) to a view-ready event
#[must_use]
pub fn map_event(record: EventRecord, clock: &dyn Clock) -> Event {
    let (date, time, location, capacity, enrolled) = match record.batches.first() {
        Some(batch) => (
            clock.now().format("%B %d, %Y").to_string(),
            format!("{} - {}", clock_prefix(&batch.start_time), clock_prefix(&batch.end_time)),
            batch.schedule.clone(),
            batch.capacity,
            batch.enrolled,
        ),
        None => (
            FLEXIBLE_DATE.to_string(),
            TO_BE_ANNOUNCED.to_string(),
            TO_BE_ANNOUNCED.to_string(),
            0,
            0,
        ),
    };

    let organizer_name = record
        .profile
        .and_then(|p| p.full_name)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_ORGANIZER.to_string());

    Event {
        category: category_label(&record.event_type),
        image_url: image_url_for(&record.event_type).to_string(),
        id: record.id,
        name: record.name,
        description: record.description,
        organizer_id: record.organizer_id,
        organizer_name,
        event_type: record.event_type,
        price_type: record.price_type,
        base_price: record.base_price,
        min_hours: record.min_hours,
        min_weeks: record.min_weeks,
        min_months: record.min_months,
        created_at: record.created_at,
        updated_at: record.updated_at,
        batches: record.batches,
        discounts: record.discounts,
        date,
        time,
        location,
        capacity,
        enrolled,
    }
}

/// Map a registration row, replacing its embedded event with a mapped one
///
/// `event` overrides the embedded row, for rows returned by an insert.
#[must_use]
pub fn map_enrollment(
    record: RegistrationRecord,
    event: Option<EventRecord>,
    clock: &dyn Clock,
) -> Enrollment {
    let event = event.or(record.event).map(|e| map_event(e, clock));
    Enrollment {
        id: record.id,
        user_id: record.user_id,
        event_id: record.event_id,
        batch_id: record.batch_id,
        hours_registered: record.hours_registered,
        weeks_registered: record.weeks_registered,
        months_registered: record.months_registered,
        total_amount: record.total_amount,
        discount_applied: record.discount_applied,
        final_amount: record.final_amount,
        status: record.status,
        start_date: record.start_date,
        end_date: record.end_date,
        created_at: record.created_at,
        updated_at: record.updated_at,
        event,
    }
}

/// `xxxxxxxx-xxxx-4xxx-[89ab]xxx-xxxxxxxxxxxx`, case-insensitive
#[must_use]
pub fn is_uuid_v4(candidate: &str) -> bool {
    // try_parse also accepts simple, braced and urn forms
    if candidate.len() != 36 {
        return false;
    }
    Uuid::try_parse(candidate).is_ok_and(|id| {
        id.get_version_num() == 4 && id.get_variant() == uuid::Variant::RFC4122
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::OrganizerProfile;
    use crate::types::{Batch, BatchId, EventId, Money, PriceType, UserId};
    use eventhub_testing::test_clock;
    use proptest::prelude::*;

    fn record(event_type: &str, batches: Vec<Batch>) -> EventRecord {
        let now = test_clock().now();
        EventRecord {
            id: EventId::new("e1"),
            name: "Pottery".to_string(),
            description: "Clay".to_string(),
            organizer_id: UserId::new("o1"),
            event_type: event_type.to_string(),
            price_type: PriceType::Weekly,
            base_price: Money::from_dollars(45),
            min_hours: None,
            min_weeks: None,
            min_months: None,
            created_at: now,
            updated_at: now,
            profile: None,
            batches,
            discounts: Vec::new(),
        }
    }

    fn batch(start: &str, end: &str) -> Batch {
        let now = test_clock().now();
        Batch {
            id: BatchId::new("b1"),
            event_id: EventId::new("e1"),
            name: "Evening".to_string(),
            schedule: "Arts Center, Tue/Thu".to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            working_days: vec!["Tuesday".to_string()],
            capacity: 12,
            enrolled: 5,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn event_without_batches_is_flexible() {
        let event = map_event(record("advanced", Vec::new()), &test_clock());
        assert_eq!(event.date, "Flexible");
        assert_eq!(event.time, "To be announced");
        assert_eq!(event.location, "To be announced");
        assert_eq!((event.capacity, event.enrolled), (0, 0));
        assert_eq!(event.category, "Advanced");
        assert_eq!(event.organizer_name, "Unknown Organizer");
    }

    #[test]
    fn first_batch_drives_schedule_fields() {
        let mut second = batch("06:00:00", "07:00:00");
        second.schedule = "Elsewhere".to_string();
        let event = map_event(
            record("intermediate", vec![batch("09:00:00", "17:30:00"), second]),
            &test_clock(),
        );
        assert_eq!(event.time, "09:00 - 17:30");
        assert_eq!(event.location, "Arts Center, Tue/Thu");
        assert_eq!(event.date, "January 01, 2025");
        assert_eq!((event.capacity, event.enrolled), (12, 5));
    }

    #[test]
    fn short_time_strings_are_kept_whole() {
        let event = map_event(record("regular", vec![batch("9:00", "")]), &test_clock());
        assert_eq!(event.time, "9:00 - ");
    }

    #[test]
    fn organizer_name_comes_from_profile() {
        let mut raw = record("summer", Vec::new());
        raw.profile = Some(OrganizerProfile {
            id: UserId::new("o1"),
            full_name: Some("Jamie Rivera".to_string()),
        });
        assert_eq!(map_event(raw, &test_clock()).organizer_name, "Jamie Rivera");
    }

    #[test]
    fn unknown_type_gets_regular_image() {
        let event = map_event(record("workshop", Vec::new()), &test_clock());
        assert_eq!(event.image_url, image_url(EventType::Regular));
        assert_eq!(event.category, "Workshop");
    }

    #[test]
    fn uuid_v4_check() {
        assert!(is_uuid_v4("a1b2c3d4-e5f6-4789-8abc-1234567890ab"));
        assert!(is_uuid_v4("A1B2C3D4-E5F6-4789-8ABC-1234567890AB"));
        assert!(!is_uuid_v4("not-a-uuid"));
        // version 1
        assert!(!is_uuid_v4("a1b2c3d4-e5f6-1789-8abc-1234567890ab"));
        // wrong variant
        assert!(!is_uuid_v4("a1b2c3d4-e5f6-4789-cabc-1234567890ab"));
        assert!(!is_uuid_v4("a1b2c3d4e5f647898abc1234567890ab"));
    }

    proptest! {
        #[test]
        fn image_url_is_never_empty(raw in ".{0,16}") {
            let url = image_url_for(&raw);
            prop_assert!(!url.is_empty());
            if EventType::parse(&raw).is_none() {
                prop_assert_eq!(url, image_url(EventType::Regular));
            }
        }

        #[test]
        fn time_is_sliced_to_minutes(
            (sh, sm, ss) in (0u8..24, 0u8..60, 0u8..60),
            (eh, em, es) in (0u8..24, 0u8..60, 0u8..60),
        ) {
            let start = format!("{sh:02}:{sm:02}:{ss:02}");
            let end = format!("{eh:02}:{em:02}:{es:02}");
            let event = map_event(record("regular", vec![batch(&start, &end)]), &test_clock());
            prop_assert_eq!(event.time, format!("{sh:02}:{sm:02} - {eh:02}:{em:02}"));
        }

        #[test]
        fn random_v4_uuids_pass(bytes in any::<[u8; 16]>()) {
            let id = uuid::Builder::from_random_bytes(bytes).into_uuid();
            prop_assert!(is_uuid_v4(&id.to_string()));
        }
    }
}

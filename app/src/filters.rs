//! Listing filters and their address-bar form.
//!
//! Query keys are `search`, `category`, `priceRange`, `location` and
//! `dateRange`. Empty values are dropped when writing and read as absent.

use crate::types::{Event, Money};
use serde::{Deserialize, Serialize};

/// Price bucket on `base_price`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceRange {
    /// Exactly zero
    Free,
    /// Above zero, below $50
    Under50,
    /// $50 to $100 inclusive
    From50To100,
    /// Above $100, up to $200
    From100To200,
    /// Above $200
    Over200,
    /// Unrecognized token; kept for the round trip, filters nothing
    Other(String),
}

impl PriceRange {
    /// Parse a query token
    #[must_use]
    pub fn parse(token: &str) -> Self {
        match token {
            "free" => Self::Free,
            "under-50" => Self::Under50,
            "50-100" => Self::From50To100,
            "100-200" => Self::From100To200,
            "over-200" => Self::Over200,
            other => Self::Other(other.to_string()),
        }
    }

    /// Query token
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Free => "free",
            Self::Under50 => "under-50",
            Self::From50To100 => "50-100",
            Self::From100To200 => "100-200",
            Self::Over200 => "over-200",
            Self::Other(token) => token,
        }
    }

    /// Whether a price falls in this bucket
    #[must_use]
    pub fn contains(&self, price: Money) -> bool {
        let fifty = Money::from_dollars(50);
        let hundred = Money::from_dollars(100);
        let two_hundred = Money::from_dollars(200);
        match self {
            Self::Free => price.is_free(),
            Self::Under50 => !price.is_free() && price < fifty,
            Self::From50To100 => price >= fifty && price <= hundred,
            Self::From100To200 => price > hundred && price <= two_hundred,
            Self::Over200 => price > two_hundred,
            Self::Other(_) => true,
        }
    }
}

/// Date window chosen on the listing
///
/// Parsed and written back but not applied: events carry no schedule date to
/// compare against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateRange {
    /// `today`
    Today,
    /// `this-week`
    ThisWeek,
    /// `this-weekend`
    ThisWeekend,
    /// `next-week`
    NextWeek,
    /// `this-month`
    ThisMonth,
    /// `next-month`
    NextMonth,
    /// Unrecognized token
    Other(String),
}

impl DateRange {
    /// Parse a query token
    #[must_use]
    pub fn parse(token: &str) -> Self {
        match token {
            "today" => Self::Today,
            "this-week" => Self::ThisWeek,
            "this-weekend" => Self::ThisWeekend,
            "next-week" => Self::NextWeek,
            "this-month" => Self::ThisMonth,
            "next-month" => Self::NextMonth,
            other => Self::Other(other.to_string()),
        }
    }

    /// Query token
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Today => "today",
            Self::ThisWeek => "this-week",
            Self::ThisWeekend => "this-weekend",
            Self::NextWeek => "next-week",
            Self::ThisMonth => "this-month",
            Self::NextMonth => "next-month",
            Self::Other(token) => token,
        }
    }
}

/// Filters of the event listing
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilter {
    /// Case-insensitive text in name or description
    pub search: Option<String>,
    /// Exact category label
    pub category: Option<String>,
    /// Price bucket
    pub price_range: Option<PriceRange>,
    /// Text contained in the location
    pub location: Option<String>,
    /// Date window
    pub date_range: Option<DateRange>,
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl EventFilter {
    /// Read filters from query pairs; unknown keys are ignored
    #[must_use]
    pub fn from_query_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut filter = Self::default();
        for (key, value) in pairs {
            match key {
                "search" => filter.search = non_empty(value),
                "category" => filter.category = non_empty(value),
                "priceRange" => {
                    filter.price_range = non_empty(value).map(|v| PriceRange::parse(&v));
                },
                "location" => filter.location = non_empty(value),
                "dateRange" => filter.date_range = non_empty(value).map(|v| DateRange::parse(&v)),
                _ => {},
            }
        }
        filter
    }

    /// Query pairs for the set filters, in listing order
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let pairs = [
            ("search", self.search.clone()),
            ("category", self.category.clone()),
            ("priceRange", self.price_range.as_ref().map(|p| p.as_str().to_string())),
            ("location", self.location.clone()),
            ("dateRange", self.date_range.as_ref().map(|d| d.as_str().to_string())),
        ];
        pairs
            .into_iter()
            .filter_map(|(key, value)| value.filter(|v| !v.is_empty()).map(|v| (key, v)))
            .collect()
    }

    /// True when no filter is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_query_pairs().is_empty()
    }

    /// Whether one event passes every set filter
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !event.name.to_lowercase().contains(&needle)
                && !event.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if &event.category != category {
                return false;
            }
        }
        if let Some(range) = &self.price_range {
            if !range.contains(event.base_price) {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if !event.location.contains(location.as_str()) {
                return false;
            }
        }
        true
    }

    /// Events passing every set filter, in their original order
    #[must_use]
    pub fn apply(&self, events: &[Event]) -> Vec<Event> {
        events.iter().filter(|e| self.matches(e)).cloned().collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::EventRecord;
    use crate::mapper::map_event;
    use crate::types::{EventId, PriceType, UserId};
    use eventhub_testing::test_clock;
    use proptest::prelude::*;

    fn event(name: &str, event_type: &str, dollars: u64) -> Event {
        let clock = test_clock();
        map_event(
            EventRecord {
                id: EventId::new(name),
                name: name.to_string(),
                description: format!("About {name}"),
                organizer_id: UserId::new("org"),
                event_type: event_type.to_string(),
                price_type: PriceType::Hourly,
                base_price: Money::from_dollars(dollars),
                min_hours: None,
                min_weeks: None,
                min_months: None,
                created_at: eventhub_core::environment::Clock::now(&clock),
                updated_at: eventhub_core::environment::Clock::now(&clock),
                profile: None,
                batches: Vec::new(),
                discounts: Vec::new(),
            },
            &clock,
        )
    }

    #[test]
    fn query_round_trip_drops_empty_values() {
        let filter = EventFilter::from_query_pairs([
            ("search", "yoga"),
            ("category", ""),
            ("priceRange", "under-50"),
            ("dateRange", "this-week"),
            ("page", "2"),
        ]);
        assert_eq!(filter.category, None);
        assert_eq!(filter.price_range, Some(PriceRange::Under50));
        assert_eq!(
            filter.to_query_pairs(),
            vec![
                ("search", "yoga".to_string()),
                ("priceRange", "under-50".to_string()),
                ("dateRange", "this-week".to_string()),
            ]
        );
    }

    #[test]
    fn price_buckets_match_listing_bounds() {
        let events = vec![
            event("free", "regular", 0),
            event("cheap", "regular", 45),
            event("fifty", "regular", 50),
            event("hundred", "regular", 100),
            event("pricey", "advanced", 150),
            event("camp", "summer", 250),
        ];
        let names = |range: PriceRange| -> Vec<String> {
            EventFilter {
                price_range: Some(range),
                ..EventFilter::default()
            }
            .apply(&events)
            .into_iter()
            .map(|e| e.name)
            .collect()
        };
        assert_eq!(names(PriceRange::Free), ["free"]);
        assert_eq!(names(PriceRange::Under50), ["cheap"]);
        assert_eq!(names(PriceRange::From50To100), ["fifty", "hundred"]);
        assert_eq!(names(PriceRange::From100To200), ["pricey"]);
        assert_eq!(names(PriceRange::Over200), ["camp"]);
        assert_eq!(names(PriceRange::parse("cheapest")).len(), events.len());
    }

    #[test]
    fn search_is_case_insensitive_and_category_exact() {
        let events = vec![event("Pottery", "intermediate", 45), event("Yoga", "regular", 0)];
        let filter = EventFilter {
            search: Some("POTT".to_string()),
            category: Some("Intermediate".to_string()),
            ..EventFilter::default()
        };
        let found = filter.apply(&events);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Pottery");

        let lowercase_category = EventFilter {
            category: Some("intermediate".to_string()),
            ..EventFilter::default()
        };
        assert!(lowercase_category.apply(&events).is_empty());
    }

    #[test]
    fn date_range_is_not_applied() {
        let events = vec![event("Yoga", "regular", 0)];
        let filter = EventFilter {
            date_range: Some(DateRange::NextMonth),
            ..EventFilter::default()
        };
        assert_eq!(filter.apply(&events).len(), 1);
    }

    proptest! {
        #[test]
        fn known_price_tokens_round_trip(
            token in prop::sample::select(vec!["free", "under-50", "50-100", "100-200", "over-200"])
        ) {
            let parsed = PriceRange::parse(token);
            prop_assert_eq!(parsed.as_str(), token);
        }

        #[test]
        fn empty_filter_keeps_everything(prices in proptest::collection::vec(0u64..500, 0..8)) {
            let events: Vec<Event> = prices
                .iter()
                .enumerate()
                .map(|(i, p)| event(&format!("e{i}"), "regular", *p))
                .collect();
            prop_assert_eq!(EventFilter::default().apply(&events).len(), events.len());
        }
    }
}

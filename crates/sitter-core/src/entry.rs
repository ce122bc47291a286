//! Raw and enriched calendar entries.
//!
//! A [`CalendarEntry`] is what the calendar collaborator hands us; an
//! [`EnrichedEntry`] is the same entry after classification. All timestamps
//! are naive wall-clock values: the feed is normalized to a single zone
//! before it reaches this crate.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::types::{CalendarId, EntryId, EntryStatus, ServiceType};

/// An attendee attached to a calendar entry.
///
/// The display name may seed the extracted client label when title parsing
/// yields nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    /// Display name as reported by the provider.
    pub name: String,
    /// Email address, if the provider exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A raw calendar entry from a third-party calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    /// Unique identifier within the source calendar.
    pub id: EntryId,
    /// The calendar this entry belongs to.
    pub calendar: CalendarId,
    /// Free-text title. All classification heuristics read this.
    pub title: String,
    /// Optional free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional location string. Used verbatim for travel-leg estimation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Start of the entry.
    pub start: NaiveDateTime,
    /// End of the entry. Never before `start`, except zero-length all-day
    /// markers where `start == end`.
    pub end: NaiveDateTime,
    /// Whether this is an all-day entry.
    #[serde(default)]
    pub all_day: bool,
    /// Confirmation status.
    pub status: EntryStatus,
    /// Recurring-series identifier, if the entry is an expanded occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<String>,
    /// Attendees, if the provider exposes them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<Attendee>,
}

impl CalendarEntry {
    /// Total span of the entry in whole minutes.
    #[must_use]
    pub fn span_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Whether the entry's span touches the given calendar day.
    #[must_use]
    pub fn overlaps_day(&self, date: NaiveDate) -> bool {
        self.start.date() <= date && date <= self.end.date()
    }
}

/// A calendar entry plus everything classification derived from it.
///
/// Invariants: `is_overnight` implies `is_work`; `client_label` and
/// `service` are only populated when `is_work` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedEntry {
    /// The underlying raw entry.
    #[serde(flatten)]
    pub entry: CalendarEntry,
    /// Whether the entry represents billable pet-sitting work.
    pub is_work: bool,
    /// Whether the entry is an overnight stay. Only meaningful when work.
    pub is_overnight: bool,
    /// Client label extracted from the title (or attendees).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_label: Option<String>,
    /// Resolved service type. Only populated when work.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceType>,
    /// Nominal service duration in minutes derived from the title, not from
    /// the start/end span.
    pub service_minutes: u32,
}

impl EnrichedEntry {
    /// A non-work enrichment of the given entry. No other fields populated.
    #[must_use]
    pub const fn personal(entry: CalendarEntry) -> Self {
        Self {
            entry,
            is_work: false,
            is_overnight: false,
            client_label: None,
            service: None,
            service_minutes: 0,
        }
    }
}

//! Multi-visit generation and conflict detection.
//!
//! Expands a [`RecurrenceConfig`] into a batch of candidate calendar
//! entries, one per slot per day, and checks the batch against an existing
//! schedule for time overlaps. Generated entries are plain
//! [`CalendarEntry`] values whose titles re-enter the classifier.
//!
//! Generation favors forward progress over strict correctness: an unknown
//! template reference degrades to a zero-length entry instead of aborting
//! the batch. Validation is the place where problems are surfaced, as an
//! accumulated list rather than a first-failure error.

use std::collections::HashMap;

use chrono::{Datelike, Days, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entry::CalendarEntry;
use crate::types::{CalendarId, EntryId, EntryStatus, ServiceType, TemplateId};

/// How a recurrence booking is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingKind {
    /// One or more timed visits on each day in the range.
    DailyVisits,
    /// A single stay spanning the whole range.
    OvernightStay,
}

/// One visit slot within a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitSlot {
    /// Time of day the visit starts.
    pub time: NaiveTime,
    /// Visit length in minutes. 0 means "use the referenced template's
    /// duration".
    #[serde(default)]
    pub duration_minutes: u32,
    /// Template supplying the duration when `duration_minutes` is 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateId>,
}

/// Overnight-stay specifics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvernightBlock {
    /// Arrival time on the first day of the range.
    pub arrival: NaiveTime,
    /// Departure time on the last day of the range.
    pub departure: NaiveTime,
    /// Optional extra drop-in on the arrival day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop_in: Option<VisitSlot>,
}

/// A recurrence request from the booking flow. Consumed once; not mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceConfig {
    /// Client label stamped into generated titles.
    pub client_label: String,
    /// Location copied onto every generated entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Calendar the generated entries target.
    #[serde(default = "default_calendar")]
    pub calendar: CalendarId,
    /// First day of the booking, inclusive.
    pub start_date: NaiveDate,
    /// Last day of the booking, inclusive.
    pub end_date: NaiveDate,
    /// Booking shape.
    pub kind: BookingKind,
    /// Slots applied on weekdays (and weekends without an override).
    #[serde(default)]
    pub weekday_slots: Vec<VisitSlot>,
    /// Slot override for Saturdays and Sundays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekend_slots: Option<Vec<VisitSlot>>,
    /// Stay configuration for overnight bookings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overnight: Option<OvernightBlock>,
}

fn default_calendar() -> CalendarId {
    CalendarId::new("planned").expect("literal is non-empty")
}

/// A reusable visit template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitTemplate {
    pub id: TemplateId,
    pub name: String,
    pub service: ServiceType,
    pub duration_minutes: u32,
}

/// Template lookup table for slot-duration resolution.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: HashMap<TemplateId, VisitTemplate>,
}

impl TemplateCatalog {
    #[must_use]
    pub fn new(templates: impl IntoIterator<Item = VisitTemplate>) -> Self {
        Self {
            templates: templates.into_iter().map(|t| (t.id.clone(), t)).collect(),
        }
    }

    #[must_use]
    pub fn get(&self, id: &TemplateId) -> Option<&VisitTemplate> {
        self.templates.get(id)
    }

    /// Duration of the referenced template, if it exists.
    #[must_use]
    pub fn duration_for(&self, id: &TemplateId) -> Option<u32> {
        self.templates.get(id).map(|t| t.duration_minutes)
    }
}

/// A time overlap between an existing entry and a generated one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub existing: CalendarEntry,
    pub generated: CalendarEntry,
}

/// Checks a recurrence config, accumulating every violation.
///
/// Returns human-readable problems; an empty list means the config is
/// usable. Never panics.
#[must_use]
pub fn validate(config: &RecurrenceConfig) -> Vec<String> {
    let mut problems = Vec::new();

    if config.client_label.trim().is_empty() {
        problems.push("client label must not be empty".to_string());
    }

    if config.start_date > config.end_date {
        problems.push(format!(
            "start date {} is after end date {}",
            config.start_date, config.end_date
        ));
    }

    match config.kind {
        BookingKind::DailyVisits => {
            let has_weekday = !config.weekday_slots.is_empty();
            let has_weekend = config
                .weekend_slots
                .as_ref()
                .is_some_and(|slots| !slots.is_empty());
            if !has_weekday && !has_weekend {
                problems.push("daily-visits booking needs at least one visit slot".to_string());
            }
        }
        BookingKind::OvernightStay => {
            if config.overnight.is_none() {
                problems.push("overnight-stay booking needs an overnight configuration".to_string());
            }
        }
    }

    problems
}

/// Resolves a slot's duration, falling back through its template.
///
/// An unknown template id degrades to 0 minutes so the rest of the batch
/// still generates.
fn slot_minutes(slot: &VisitSlot, templates: &TemplateCatalog) -> u32 {
    if slot.duration_minutes > 0 {
        return slot.duration_minutes;
    }
    match &slot.template {
        Some(id) => templates.duration_for(id).unwrap_or_else(|| {
            tracing::warn!(template = %id, "unknown template, generating zero-length visit");
            0
        }),
        None => 0,
    }
}

fn mint_id() -> EntryId {
    EntryId::new(Uuid::new_v4().to_string()).expect("uuid is non-empty")
}

/// Builds one generated entry.
fn visit_entry(
    config: &RecurrenceConfig,
    series_id: &str,
    title: String,
    start: chrono::NaiveDateTime,
    minutes: u32,
) -> CalendarEntry {
    CalendarEntry {
        id: mint_id(),
        calendar: config.calendar.clone(),
        title,
        description: None,
        location: config.location.clone(),
        start,
        end: start + chrono::Duration::minutes(i64::from(minutes)),
        all_day: false,
        status: EntryStatus::Tentative,
        series_id: Some(series_id.to_string()),
        attendees: vec![],
    }
}

/// Expands a recurrence config into candidate entries.
///
/// Iterates every day in the inclusive range. Daily-visit bookings pick the
/// weekend override on Saturday/Sunday when one is supplied, otherwise the
/// weekday slots. Overnight bookings produce one spanning entry (which may
/// legitimately exceed 24 hours) plus at most one arrival-day drop-in.
///
/// An inverted range generates nothing; [`validate`] is where that
/// surfaces as an error.
#[must_use]
pub fn generate(config: &RecurrenceConfig, templates: &TemplateCatalog) -> Vec<CalendarEntry> {
    let series_id = Uuid::new_v4().to_string();
    let label = config.client_label.trim();
    let mut entries = Vec::new();

    match config.kind {
        BookingKind::DailyVisits => {
            let mut date = config.start_date;
            while date <= config.end_date {
                let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
                let slots = match (&config.weekend_slots, weekend) {
                    (Some(overrides), true) => overrides.as_slice(),
                    _ => config.weekday_slots.as_slice(),
                };

                for slot in slots {
                    let minutes = slot_minutes(slot, templates);
                    let title = if minutes > 0 {
                        format!("{label} - {minutes}")
                    } else {
                        format!("{label} - visit")
                    };
                    entries.push(visit_entry(
                        config,
                        &series_id,
                        title,
                        date.and_time(slot.time),
                        minutes,
                    ));
                }

                let Some(next) = date.checked_add_days(Days::new(1)) else {
                    break;
                };
                date = next;
            }
        }
        BookingKind::OvernightStay => {
            let Some(block) = &config.overnight else {
                return entries;
            };
            if config.start_date > config.end_date {
                return entries;
            }

            let start = config.start_date.and_time(block.arrival);
            let end = config.end_date.and_time(block.departure);
            entries.push(CalendarEntry {
                id: mint_id(),
                calendar: config.calendar.clone(),
                title: format!("{label} - O/N"),
                description: None,
                location: config.location.clone(),
                start,
                end: end.max(start),
                all_day: false,
                status: EntryStatus::Tentative,
                series_id: Some(series_id.clone()),
                attendees: vec![],
            });

            if let Some(drop_in) = &block.drop_in {
                let minutes = slot_minutes(drop_in, templates);
                let title = if minutes > 0 {
                    format!("{label} - {minutes}")
                } else {
                    format!("{label} - visit")
                };
                entries.push(visit_entry(
                    config,
                    &series_id,
                    title,
                    config.start_date.and_time(drop_in.time),
                    minutes,
                ));
            }
        }
    }

    tracing::debug!(count = entries.len(), kind = ?config.kind, "generated visit batch");
    entries
}

/// True when two half-open `[start, end)` intervals overlap.
///
/// Touching boundaries do not overlap: an entry ending at 10:00 and one
/// starting at 10:00 are compatible.
fn overlaps(a: &CalendarEntry, b: &CalendarEntry) -> bool {
    a.start < b.end && b.start < a.end
}

/// Compares a generated batch against the existing schedule.
///
/// Returns every overlapping (existing, generated) pair; no resolution or
/// rescheduling is attempted. Cancelled existing entries are skipped.
#[must_use]
pub fn detect_conflicts(
    existing: &[CalendarEntry],
    generated: &[CalendarEntry],
) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    for g in generated {
        for e in existing {
            if e.status == EntryStatus::Cancelled {
                continue;
            }
            if overlaps(e, g) {
                conflicts.push(Conflict {
                    existing: e.clone(),
                    generated: g.clone(),
                });
            }
        }
    }
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        day(y, m, d).and_hms_opt(h, min, 0).unwrap()
    }

    fn catalog() -> TemplateCatalog {
        TemplateCatalog::new([VisitTemplate {
            id: TemplateId::new("standard-drop-in").unwrap(),
            name: "Standard drop-in".to_string(),
            service: ServiceType::DropIn,
            duration_minutes: 30,
        }])
    }

    fn daily_config() -> RecurrenceConfig {
        RecurrenceConfig {
            client_label: "Fluffy".to_string(),
            location: Some("12 Oak St".to_string()),
            calendar: CalendarId::new("planned").unwrap(),
            start_date: day(2024, 1, 6),
            end_date: day(2024, 1, 7),
            kind: BookingKind::DailyVisits,
            weekday_slots: vec![VisitSlot {
                time: time(9, 0),
                duration_minutes: 0,
                template: Some(TemplateId::new("standard-drop-in").unwrap()),
            }],
            weekend_slots: None,
            overnight: None,
        }
    }

    fn existing(id: &str, start: NaiveDateTime, end: NaiveDateTime) -> CalendarEntry {
        CalendarEntry {
            id: EntryId::new(id).unwrap(),
            calendar: CalendarId::new("main").unwrap(),
            title: "Rex - 30".to_string(),
            description: None,
            location: None,
            start,
            end,
            all_day: false,
            status: EntryStatus::Confirmed,
            series_id: None,
            attendees: vec![],
        }
    }

    // ========== Validation ==========

    #[test]
    fn valid_config_has_no_problems() {
        assert!(validate(&daily_config()).is_empty());
    }

    #[test]
    fn validation_accumulates_all_problems() {
        let config = RecurrenceConfig {
            client_label: "  ".to_string(),
            start_date: day(2024, 1, 7),
            end_date: day(2024, 1, 6),
            weekday_slots: vec![],
            ..daily_config()
        };
        let problems = validate(&config);
        assert_eq!(problems.len(), 3);
        assert!(problems[0].contains("client label"));
        assert!(problems[1].contains("after end date"));
        assert!(problems[2].contains("visit slot"));
    }

    #[test]
    fn overnight_booking_requires_block() {
        let config = RecurrenceConfig {
            kind: BookingKind::OvernightStay,
            overnight: None,
            ..daily_config()
        };
        let problems = validate(&config);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("overnight"));
    }

    #[test]
    fn weekend_only_slots_satisfy_daily_booking() {
        let config = RecurrenceConfig {
            weekday_slots: vec![],
            weekend_slots: Some(vec![VisitSlot {
                time: time(9, 0),
                duration_minutes: 30,
                template: None,
            }]),
            ..daily_config()
        };
        assert!(validate(&config).is_empty());
    }

    // ========== Generation ==========

    #[test]
    fn weekend_override_applies_only_on_weekend() {
        // Jan 6 2024 is a Saturday, Jan 7 a Sunday; the range holds no
        // weekdays, so with an override the template slot is never used.
        let config = RecurrenceConfig {
            weekend_slots: Some(vec![VisitSlot {
                time: time(10, 0),
                duration_minutes: 45,
                template: None,
            }]),
            ..daily_config()
        };
        let entries = generate(&config, &catalog());
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.span_minutes() == 45));
    }

    #[test]
    fn template_duration_fills_zero_duration_slot() {
        // No weekend override: Saturday and Sunday both fall back to the
        // weekday slot, which defers to the 30-minute template.
        let entries = generate(&daily_config(), &catalog());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].start, dt(2024, 1, 6, 9, 0));
        assert!(entries.iter().all(|e| e.span_minutes() == 30));
        assert!(entries.iter().all(|e| e.title == "Fluffy - 30"));
    }

    #[test]
    fn mixed_weekend_and_template_durations() {
        // Saturday + Sunday with a 45-minute weekend override, then a
        // Monday that uses the weekday template slot.
        let config = RecurrenceConfig {
            end_date: day(2024, 1, 8),
            weekend_slots: Some(vec![VisitSlot {
                time: time(10, 0),
                duration_minutes: 45,
                template: None,
            }]),
            ..daily_config()
        };
        let entries = generate(&config, &catalog());
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].span_minutes(), 45);
        assert_eq!(entries[1].span_minutes(), 45);
        assert_eq!(entries[2].span_minutes(), 30);
    }

    #[test]
    fn unknown_template_degrades_to_zero_length() {
        let config = RecurrenceConfig {
            weekday_slots: vec![VisitSlot {
                time: time(9, 0),
                duration_minutes: 0,
                template: Some(TemplateId::new("no-such-template").unwrap()),
            }],
            ..daily_config()
        };
        let entries = generate(&config, &catalog());
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.span_minutes() == 0));
        assert!(entries.iter().all(|e| e.title == "Fluffy - visit"));
    }

    #[test]
    fn inverted_range_generates_nothing() {
        let config = RecurrenceConfig {
            start_date: day(2024, 1, 7),
            end_date: day(2024, 1, 6),
            ..daily_config()
        };
        assert!(generate(&config, &catalog()).is_empty());
    }

    #[test]
    fn generated_entries_share_a_series_and_carry_location() {
        let entries = generate(&daily_config(), &catalog());
        let series: Vec<_> = entries.iter().map(|e| e.series_id.as_deref()).collect();
        assert!(series[0].is_some());
        assert!(series.iter().all(|s| *s == series[0]));
        assert!(entries.iter().all(|e| e.location.as_deref() == Some("12 Oak St")));
        assert!(entries.iter().all(|e| e.status == EntryStatus::Tentative));
    }

    #[test]
    fn overnight_stay_spans_range_and_appends_drop_in() {
        let config = RecurrenceConfig {
            kind: BookingKind::OvernightStay,
            start_date: day(2024, 1, 5),
            end_date: day(2024, 1, 8),
            overnight: Some(OvernightBlock {
                arrival: time(18, 0),
                departure: time(9, 0),
                drop_in: Some(VisitSlot {
                    time: time(12, 0),
                    duration_minutes: 30,
                    template: None,
                }),
            }),
            weekday_slots: vec![],
            ..daily_config()
        };
        let entries = generate(&config, &catalog());
        assert_eq!(entries.len(), 2);

        let stay = &entries[0];
        assert_eq!(stay.start, dt(2024, 1, 5, 18, 0));
        assert_eq!(stay.end, dt(2024, 1, 8, 9, 0));
        assert!(stay.span_minutes() > 24 * 60);
        assert_eq!(stay.title, "Fluffy - O/N");

        let drop_in = &entries[1];
        assert_eq!(drop_in.start, dt(2024, 1, 5, 12, 0));
        assert_eq!(drop_in.span_minutes(), 30);
    }

    // ========== Conflict Detection ==========

    #[test]
    fn overlapping_pair_is_reported_once() {
        let existing_entries = vec![existing("e1", dt(2024, 1, 6, 10, 30), dt(2024, 1, 6, 11, 30))];
        let generated = vec![existing("g1", dt(2024, 1, 6, 10, 0), dt(2024, 1, 6, 11, 0))];
        let conflicts = detect_conflicts(&existing_entries, &generated);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].existing.id.as_str(), "e1");
        assert_eq!(conflicts[0].generated.id.as_str(), "g1");
    }

    #[test]
    fn touching_boundaries_do_not_conflict() {
        let existing_entries = vec![existing("e1", dt(2024, 1, 6, 9, 0), dt(2024, 1, 6, 10, 0))];
        let generated = vec![existing("g1", dt(2024, 1, 6, 10, 0), dt(2024, 1, 6, 11, 0))];
        assert!(detect_conflicts(&existing_entries, &generated).is_empty());

        let generated = vec![existing("g2", dt(2024, 1, 6, 9, 59), dt(2024, 1, 6, 11, 0))];
        assert_eq!(detect_conflicts(&existing_entries, &generated).len(), 1);
    }

    #[test]
    fn conflict_detection_is_symmetric() {
        let a = vec![existing("a", dt(2024, 1, 6, 10, 30), dt(2024, 1, 6, 11, 30))];
        let b = vec![existing("b", dt(2024, 1, 6, 10, 0), dt(2024, 1, 6, 11, 0))];
        assert_eq!(detect_conflicts(&a, &b).len(), detect_conflicts(&b, &a).len());
    }

    #[test]
    fn cancelled_existing_entries_are_skipped() {
        let mut cancelled = existing("e1", dt(2024, 1, 6, 10, 30), dt(2024, 1, 6, 11, 30));
        cancelled.status = EntryStatus::Cancelled;
        let generated = vec![existing("g1", dt(2024, 1, 6, 10, 0), dt(2024, 1, 6, 11, 0))];
        assert!(detect_conflicts(&[cancelled], &generated).is_empty());
    }

    #[test]
    fn batch_is_checked_against_every_existing_entry() {
        let existing_entries = vec![
            existing("e1", dt(2024, 1, 6, 9, 0), dt(2024, 1, 6, 9, 30)),
            existing("e2", dt(2024, 1, 7, 9, 0), dt(2024, 1, 7, 9, 30)),
        ];
        let generated = generate(&daily_config(), &catalog());
        // Both generated 9:00-9:30 visits collide with their day's entry.
        assert_eq!(detect_conflicts(&existing_entries, &generated).len(), 2);
    }
}

//! Title classification rule engine.
//!
//! Turns raw calendar entries into [`EnrichedEntry`] values by testing the
//! title against two ordered rule tables:
//!
//! 1. "Definitely personal" rules. A single match anywhere short-circuits to
//!    personal: explicit personal markers are rarer and more specific than
//!    work signals, so they win (e.g. "Dog walk - personal errand").
//! 2. Work signal rules. Any match marks the entry as work; the full set of
//!    matched signals then drives service-type resolution in a fixed
//!    priority order.
//!
//! Malformed or ambiguous titles degrade to personal/other; nothing in this
//! module returns an error.

use std::sync::LazyLock;

use chrono::{Days, NaiveDate};
use rayon::prelude::*;
use regex::Regex;

use crate::entry::{CalendarEntry, EnrichedEntry};
use crate::types::ServiceType;

/// Span length at or above which a multi-day entry counts as overnight even
/// without an overnight keyword (8 hours).
const OVERNIGHT_SPAN_MINUTES: i64 = 8 * 60;

/// Cap applied by [`duration_for_day`] to overnight entries (12 hours), so a
/// multi-day stay cannot dominate every day's workload total.
const OVERNIGHT_DAILY_CAP_MINUTES: i64 = 12 * 60;

/// Default nominal duration when the title carries no duration token.
const DEFAULT_SERVICE_MINUTES: u32 = 30;

/// Fixed nominal durations for stay-type services.
const HOUSESIT_MINUTES: u32 = 24 * 60;
const OVERNIGHT_MINUTES: u32 = 12 * 60;

macro_rules! rule_regex {
    ($name:ident, $pattern:literal) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($pattern).expect("rule pattern must compile"));
    };
}

// Personal rules, in evaluation order.
rule_regex!(RE_ADMINISTRATIVE, r"(?i)\b(admin|invoice|invoicing|billing|taxes|bookkeeping|paperwork|errands?)\b");
rule_regex!(RE_DAY_OFF, r"(?i)\b(day off|off day|no work|vacation|pto)\b");
rule_regex!(RE_PERSONAL_APPT, r"(?i)\b(dentist|doctor|therapy|haircut|salon|gym)\b|\bdr\.");
rule_regex!(RE_BLOCKED, r"(?i)\b(block(ed)?|hold|unavailable)\b");
rule_regex!(RE_HOLIDAY, r"(?i)\b(holiday|christmas|thanksgiving|new year)\b");
rule_regex!(RE_MEAL, r"(?i)\b(breakfast|brunch|lunch|dinner)\b");
rule_regex!(RE_TRAVEL, r"(?i)\b(flight|airport|travel|trip)\b");
rule_regex!(RE_ENTERTAINMENT, r"(?i)\b(movie|concert|party|birthday|church)\b");
rule_regex!(RE_SELF_CARE, r"(?i)\b(yoga|massage|self[ -]?care|me time|personal)\b");

// Work signal rules.
rule_regex!(RE_DURATION_TOKEN, r"\b(15|20|30|45|60)\b");
rule_regex!(RE_MEET_GREET, r"(?i)m&g|meet\s*(&|and)\s*greet|meet[- ]?greet");
rule_regex!(RE_HOUSESIT, r"(?i)\bhs\b|house[- ]?sit");
rule_regex!(RE_OVERNIGHT, r"(?i)\bovernight\b|\bo/n\b");
rule_regex!(RE_NAIL_TRIM, r"(?i)\bnails?\b|nail[- ]?trim");
rule_regex!(RE_WALK, r"(?i)\bwalks?\b|\bwalkies\b");
rule_regex!(RE_DROP_IN, r"(?i)drop[- ]?in|\bvisit\b");
rule_regex!(RE_NAME_DASH, r"^\S.{0,39}?\s+[-–—]\s+");

/// A named personal-title rule. Name is surfaced for explainability.
struct PersonalRule {
    name: &'static str,
    pattern: &'static LazyLock<Regex>,
}

/// Personal rules in fixed evaluation order.
static PERSONAL_RULES: &[PersonalRule] = &[
    PersonalRule { name: "administrative", pattern: &RE_ADMINISTRATIVE },
    PersonalRule { name: "day-off", pattern: &RE_DAY_OFF },
    PersonalRule { name: "personal-appointment", pattern: &RE_PERSONAL_APPT },
    PersonalRule { name: "blocked-time", pattern: &RE_BLOCKED },
    PersonalRule { name: "holiday", pattern: &RE_HOLIDAY },
    PersonalRule { name: "meal", pattern: &RE_MEAL },
    PersonalRule { name: "travel", pattern: &RE_TRAVEL },
    PersonalRule { name: "entertainment", pattern: &RE_ENTERTAINMENT },
    PersonalRule { name: "self-care", pattern: &RE_SELF_CARE },
];

/// A work signal detected in a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkSignal {
    DurationToken,
    MeetGreet,
    Housesit,
    Overnight,
    NailTrim,
    Walk,
    DropIn,
    NameDash,
}

/// Work signal rules in fixed evaluation order.
static WORK_RULES: &[(WorkSignal, &LazyLock<Regex>)] = &[
    (WorkSignal::DurationToken, &RE_DURATION_TOKEN),
    (WorkSignal::MeetGreet, &RE_MEET_GREET),
    (WorkSignal::Housesit, &RE_HOUSESIT),
    (WorkSignal::Overnight, &RE_OVERNIGHT),
    (WorkSignal::NailTrim, &RE_NAIL_TRIM),
    (WorkSignal::Walk, &RE_WALK),
    (WorkSignal::DropIn, &RE_DROP_IN),
    (WorkSignal::NameDash, &RE_NAME_DASH),
];

/// Separators that end the leading client-label segment of a title.
static LABEL_SEPARATORS: &[&str] = &[" - ", " – ", " — ", " | ", " @ "];

/// Returns the name of the first personal rule matching the title, if any.
///
/// Exposed so the priority contract (personal before work) stays
/// independently testable and so callers can explain a classification.
#[must_use]
pub fn matched_personal_rule(title: &str) -> Option<&'static str> {
    PERSONAL_RULES
        .iter()
        .find(|rule| rule.pattern.is_match(title))
        .map(|rule| rule.name)
}

/// All work signals matching the title, in rule order.
fn work_signals(title: &str) -> Vec<WorkSignal> {
    WORK_RULES
        .iter()
        .filter(|(_, pattern)| pattern.is_match(title))
        .map(|(signal, _)| *signal)
        .collect()
}

/// First duration token (15/20/30/45/60) in the title, as minutes.
fn duration_token(title: &str) -> Option<u32> {
    RE_DURATION_TOKEN
        .find(title)
        .and_then(|m| m.as_str().parse().ok())
}

/// Extracts the client label from a title.
///
/// The leading segment before the first separator wins; an empty segment
/// falls back to the first attendee's display name, then to the full
/// trimmed title.
fn extract_client_label(entry: &CalendarEntry) -> Option<String> {
    let title = entry.title.trim();

    let leading = LABEL_SEPARATORS
        .iter()
        .filter_map(|sep| title.find(sep).map(|idx| (idx, *sep)))
        .min_by_key(|(idx, _)| *idx)
        .map(|(idx, _)| title[..idx].trim());

    match leading {
        Some(segment) if !segment.is_empty() => Some(segment.to_string()),
        _ => entry
            .attendees
            .first()
            .map(|a| a.name.trim().to_string())
            .filter(|name| !name.is_empty())
            .or_else(|| (!title.is_empty()).then(|| title.to_string())),
    }
}

/// Resolves service type and nominal duration from the matched signals.
///
/// Priority: meet-greet > housesit > overnight > nail-trim > walk > drop-in
/// > duration-only > other. Stay-type services carry fixed durations.
fn resolve_service(signals: &[WorkSignal], token: Option<u32>) -> (ServiceType, u32) {
    let has = |s: WorkSignal| signals.contains(&s);

    if has(WorkSignal::MeetGreet) {
        (ServiceType::MeetGreet, token.unwrap_or(DEFAULT_SERVICE_MINUTES))
    } else if has(WorkSignal::Housesit) {
        (ServiceType::Housesit, HOUSESIT_MINUTES)
    } else if has(WorkSignal::Overnight) {
        (ServiceType::Overnight, OVERNIGHT_MINUTES)
    } else if has(WorkSignal::NailTrim) {
        (ServiceType::NailTrim, token.unwrap_or(DEFAULT_SERVICE_MINUTES))
    } else if has(WorkSignal::Walk) {
        (ServiceType::Walk, token.unwrap_or(DEFAULT_SERVICE_MINUTES))
    } else if has(WorkSignal::DropIn) {
        (ServiceType::DropIn, token.unwrap_or(DEFAULT_SERVICE_MINUTES))
    } else if let Some(minutes) = token {
        // A bare duration token is how regulars book drop-ins.
        (ServiceType::DropIn, minutes)
    } else {
        (ServiceType::Other, DEFAULT_SERVICE_MINUTES)
    }
}

/// Classifies a raw calendar entry.
///
/// Personal precedence is absolute: a title matching any personal rule is
/// personal regardless of simultaneously matching work signals.
#[must_use]
pub fn classify(entry: &CalendarEntry) -> EnrichedEntry {
    let title = entry.title.trim();
    if title.is_empty() {
        return EnrichedEntry::personal(entry.clone());
    }

    if let Some(rule) = matched_personal_rule(title) {
        tracing::trace!(id = %entry.id, rule, "classified personal");
        return EnrichedEntry::personal(entry.clone());
    }

    let signals = work_signals(title);
    if signals.is_empty() {
        return EnrichedEntry::personal(entry.clone());
    }

    let (service, service_minutes) = resolve_service(&signals, duration_token(title));

    let stay_keyword =
        signals.contains(&WorkSignal::Housesit) || signals.contains(&WorkSignal::Overnight);
    let is_overnight = stay_keyword
        || (entry.span_minutes() >= OVERNIGHT_SPAN_MINUTES
            && entry.start.date() != entry.end.date());

    EnrichedEntry {
        entry: entry.clone(),
        is_work: true,
        is_overnight,
        client_label: extract_client_label(entry),
        service: Some(service),
        service_minutes,
    }
}

/// Classifies a batch of entries in parallel, preserving input order.
#[must_use]
pub fn classify_all(entries: &[CalendarEntry]) -> Vec<EnrichedEntry> {
    entries.par_iter().map(classify).collect()
}

/// Minutes of the entry that fall on the given calendar day.
///
/// The entry span is clipped to `[00:00, 24:00)` of `date`; days outside the
/// span report 0. Overnight entries are capped at 12 hours per day.
#[must_use]
pub fn duration_for_day(enriched: &EnrichedEntry, date: NaiveDate) -> i64 {
    let day_start = date.and_hms_opt(0, 0, 0).expect("midnight is always valid");
    let Some(day_end) = date
        .checked_add_days(Days::new(1))
        .map(|next| next.and_hms_opt(0, 0, 0).expect("midnight is always valid"))
    else {
        return 0;
    };

    let start = enriched.entry.start.max(day_start);
    let end = enriched.entry.end.min(day_end);
    let minutes = (end - start).num_minutes().max(0);

    if enriched.is_overnight {
        minutes.min(OVERNIGHT_DAILY_CAP_MINUTES)
    } else {
        minutes
    }
}

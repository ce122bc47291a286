//! Workload metric aggregation.
//!
//! Computes per-day and per-period workload from classified entries:
//! scheduled work minutes, estimated travel minutes, a discrete workload
//! level against caller-supplied thresholds, and over-limit warnings.
//!
//! Travel time is a heuristic, not a routing calculation: every visit costs
//! two fixed-length legs unless it shares a location with the visit directly
//! before it, in which case the return trip is reused and it costs one.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classify::duration_for_day;
use crate::entry::EnrichedEntry;
use crate::types::EntryStatus;

/// Aggregation errors.
///
/// An inverted date range is the one caller contract violation this module
/// refuses to tolerate silently; everything else degrades to empty output.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkloadError {
    /// The requested range ends before it starts.
    #[error("range start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

/// Three ascending hour boundaries separating workload levels.
///
/// Ordering is caller-supplied and not enforced automatically; an unordered
/// set degrades the bucket boundaries. Use [`LevelBoundaries::validate`] to
/// surface violations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelBoundaries {
    /// Hours at or below this are comfortable.
    pub comfortable: f64,
    /// Hours at or below this (and above comfortable) are busy.
    pub busy: f64,
    /// Hours at or below this (and above busy) are high; above is burnout.
    pub high: f64,
}

impl LevelBoundaries {
    /// Returns accumulated ordering violations, empty when well-formed.
    #[must_use]
    pub fn validate(&self, period: &str) -> Vec<String> {
        let mut problems = Vec::new();
        if self.comfortable >= self.busy {
            problems.push(format!(
                "{period}: comfortable boundary ({}) must be below busy ({})",
                self.comfortable, self.busy
            ));
        }
        if self.busy >= self.high {
            problems.push(format!(
                "{period}: busy boundary ({}) must be below high ({})",
                self.busy, self.high
            ));
        }
        problems
    }
}

/// Hour boundaries per aggregation period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub daily: LevelBoundaries,
    pub weekly: LevelBoundaries,
    pub monthly: LevelBoundaries,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            daily: LevelBoundaries { comfortable: 4.0, busy: 6.0, high: 8.0 },
            weekly: LevelBoundaries { comfortable: 20.0, busy: 30.0, high: 40.0 },
            monthly: LevelBoundaries { comfortable: 80.0, busy: 120.0, high: 160.0 },
        }
    }
}

impl ThresholdConfig {
    /// Returns accumulated ordering violations across all periods.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut problems = self.daily.validate("daily");
        problems.extend(self.weekly.validate("weekly"));
        problems.extend(self.monthly.validate("monthly"));
        problems
    }
}

/// Caps that trigger workload warnings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarningLimits {
    /// Maximum visits in one day.
    pub daily_visits: u32,
    /// Maximum scheduled+travel hours in one day.
    pub daily_hours: f64,
    /// Maximum scheduled+travel hours in one Monday-based week.
    pub weekly_hours: f64,
}

impl Default for WarningLimits {
    fn default() -> Self {
        Self {
            daily_visits: 8,
            daily_hours: 10.0,
            weekly_hours: 50.0,
        }
    }
}

/// Aggregation options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadOptions {
    /// Level boundaries per period.
    pub thresholds: ThresholdConfig,
    /// Whether travel legs contribute to totals.
    pub include_travel: bool,
    /// Estimated minutes per travel leg.
    pub travel_minutes_per_leg: u32,
    /// Fraction of a limit above which a warning (not yet critical) fires.
    pub warning_ratio: f64,
    /// Caps checked by [`check_warnings`].
    pub limits: WarningLimits,
}

impl Default for WorkloadOptions {
    fn default() -> Self {
        Self {
            thresholds: ThresholdConfig::default(),
            include_travel: true,
            travel_minutes_per_leg: 15,
            warning_ratio: 0.8,
            limits: WarningLimits::default(),
        }
    }
}

/// Discrete workload bucket for a day or period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadLevel {
    None,
    Comfortable,
    Busy,
    High,
    Burnout,
}

impl WorkloadLevel {
    /// String representation for display and JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Comfortable => "comfortable",
            Self::Busy => "busy",
            Self::High => "high",
            Self::Burnout => "burnout",
        }
    }
}

impl std::fmt::Display for WorkloadLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Workload for a single calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkloadMetric {
    /// The day this metric describes.
    pub date: NaiveDate,
    /// Minutes of scheduled work clipped to this day.
    pub work_minutes: i64,
    /// Estimated travel minutes.
    pub travel_minutes: i64,
    /// Work plus travel.
    pub total_minutes: i64,
    /// Number of work entries touching this day.
    pub event_count: usize,
    /// Level judged against the daily boundaries.
    pub level: WorkloadLevel,
}

/// Period granularity for [`period_summary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryPeriod {
    /// Monday-based week containing the anchor date.
    Week,
    /// Calendar month containing the anchor date.
    Month,
}

/// Aggregated workload over a week or month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub period: SummaryPeriod,
    /// First day of the period, inclusive.
    pub start: NaiveDate,
    /// Last day of the period, inclusive.
    pub end: NaiveDate,
    /// One metric per day in the period, in date order.
    pub days: Vec<WorkloadMetric>,
    /// Sum of total minutes across the period.
    pub total_minutes: i64,
    /// The single busiest day; ties break to the first in date order.
    pub busiest_day: Option<NaiveDate>,
    /// Arithmetic mean over the days actually in the period.
    pub mean_minutes_per_day: f64,
    /// Level judged against this period's boundaries.
    pub level: WorkloadLevel,
}

/// Which cap a warning refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    DailyVisitCount,
    DailyHours,
    WeeklyHours,
}

impl WarningKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DailyVisitCount => "daily-visit-count",
            Self::DailyHours => "daily-hours",
            Self::WeeklyHours => "weekly-hours",
        }
    }
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Warning severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Above the configured warning ratio of a limit.
    Warning,
    /// Above 100% of a limit.
    Critical,
}

impl Severity {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A cap-exceeded warning. Produced transiently, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkloadWarning {
    pub kind: WarningKind,
    pub severity: Severity,
    /// Current value in the cap's own unit (visits or hours).
    pub current: f64,
    /// The configured limit.
    pub limit: f64,
    /// Current value as a percentage of the limit.
    pub percent_of_limit: f64,
}

/// Buckets hours into a workload level with inclusive upper bounds.
///
/// Zero or negative hours are `None`, not `Comfortable`.
#[must_use]
pub fn level_for_hours(hours: f64, boundaries: &LevelBoundaries) -> WorkloadLevel {
    if hours <= 0.0 {
        WorkloadLevel::None
    } else if hours <= boundaries.comfortable {
        WorkloadLevel::Comfortable
    } else if hours <= boundaries.busy {
        WorkloadLevel::Busy
    } else if hours <= boundaries.high {
        WorkloadLevel::High
    } else {
        WorkloadLevel::Burnout
    }
}

const MINUTES_PER_HOUR: f64 = 60.0;

/// Work entries that count toward the given day, in start order.
fn qualifying_for_day<'a>(
    date: NaiveDate,
    entries: &'a [EnrichedEntry],
) -> Vec<&'a EnrichedEntry> {
    let mut qualifying: Vec<&EnrichedEntry> = entries
        .iter()
        .filter(|e| e.is_work)
        .filter(|e| e.entry.status != EntryStatus::Cancelled)
        .filter(|e| e.entry.overlaps_day(date))
        .collect();
    qualifying.sort_by_key(|e| e.entry.start);
    qualifying
}

/// Estimated travel minutes for a day's visits.
///
/// Entries must be sorted by start. Each costs two legs unless its location
/// is identical to the immediately preceding entry's location, which reuses
/// the return trip and costs one.
fn travel_minutes(sorted: &[&EnrichedEntry], minutes_per_leg: u32) -> i64 {
    let mut legs: i64 = 0;
    let mut previous_location: Option<&Option<String>> = None;
    for e in sorted {
        let location = &e.entry.location;
        legs += match previous_location {
            Some(prev) if prev == location => 1,
            _ => 2,
        };
        previous_location = Some(location);
    }
    legs * i64::from(minutes_per_leg)
}

/// Computes the workload metric for a single day.
#[must_use]
pub fn daily_metric(
    date: NaiveDate,
    entries: &[EnrichedEntry],
    options: &WorkloadOptions,
) -> WorkloadMetric {
    let qualifying = qualifying_for_day(date, entries);

    let work_minutes: i64 = qualifying.iter().map(|e| duration_for_day(e, date)).sum();
    let travel = if options.include_travel {
        travel_minutes(&qualifying, options.travel_minutes_per_leg)
    } else {
        0
    };
    let total_minutes = work_minutes + travel;

    #[allow(clippy::cast_precision_loss)]
    let hours = total_minutes as f64 / MINUTES_PER_HOUR;

    WorkloadMetric {
        date,
        work_minutes,
        travel_minutes: travel,
        total_minutes,
        event_count: qualifying.len(),
        level: level_for_hours(hours, &options.thresholds.daily),
    }
}

/// Computes one metric per day over an inclusive date range.
pub fn range_metrics(
    start: NaiveDate,
    end: NaiveDate,
    entries: &[EnrichedEntry],
    options: &WorkloadOptions,
) -> Result<Vec<WorkloadMetric>, WorkloadError> {
    if start > end {
        return Err(WorkloadError::InvalidRange { start, end });
    }

    let mut metrics = Vec::new();
    let mut date = start;
    while date <= end {
        metrics.push(daily_metric(date, entries, options));
        let Some(next) = date.checked_add_days(Days::new(1)) else {
            break;
        };
        date = next;
    }
    Ok(metrics)
}

/// Inclusive first/last day of the Monday-based week containing `anchor`.
#[must_use]
pub fn week_bounds(anchor: NaiveDate) -> (NaiveDate, NaiveDate) {
    let days_since_monday = i64::from(anchor.weekday().num_days_from_monday());
    let monday = anchor - chrono::Duration::days(days_since_monday);
    (monday, monday + chrono::Duration::days(6))
}

/// Inclusive first/last day of the calendar month containing `anchor`.
#[must_use]
pub fn month_bounds(anchor: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = anchor.with_day(1).expect("day 1 is valid for every month");
    let next_month = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    }
    .expect("first of month is always valid");
    (first, next_month - chrono::Duration::days(1))
}

/// Aggregates a weekly or monthly summary around an anchor date.
///
/// The mean divides by the number of days actually in the period, not a
/// 7/30-day assumption (a February summary divides by 28 or 29).
pub fn period_summary(
    period: SummaryPeriod,
    anchor: NaiveDate,
    entries: &[EnrichedEntry],
    options: &WorkloadOptions,
) -> Result<PeriodSummary, WorkloadError> {
    let (start, end) = match period {
        SummaryPeriod::Week => week_bounds(anchor),
        SummaryPeriod::Month => month_bounds(anchor),
    };
    let days = range_metrics(start, end, entries, options)?;

    let total_minutes: i64 = days.iter().map(|m| m.total_minutes).sum();

    // min_by_key keeps the first of equal elements, giving the earliest
    // date on ties; max_by_key would keep the last.
    let busiest_day = days
        .iter()
        .filter(|m| m.total_minutes > 0)
        .min_by_key(|m| std::cmp::Reverse(m.total_minutes))
        .map(|m| m.date);

    #[allow(clippy::cast_precision_loss)]
    let mean_minutes_per_day = if days.is_empty() {
        0.0
    } else {
        total_minutes as f64 / days.len() as f64
    };

    let boundaries = match period {
        SummaryPeriod::Week => &options.thresholds.weekly,
        SummaryPeriod::Month => &options.thresholds.monthly,
    };
    #[allow(clippy::cast_precision_loss)]
    let hours = total_minutes as f64 / MINUTES_PER_HOUR;

    Ok(PeriodSummary {
        period,
        start,
        end,
        days,
        total_minutes,
        busiest_day,
        mean_minutes_per_day,
        level: level_for_hours(hours, boundaries),
    })
}

/// Severity for a current value against a limit, if any.
fn severity_for(current: f64, limit: f64, warning_ratio: f64) -> Option<Severity> {
    if limit <= 0.0 {
        return None;
    }
    let ratio = current / limit;
    if ratio > 1.0 {
        Some(Severity::Critical)
    } else if ratio > warning_ratio {
        Some(Severity::Warning)
    } else {
        None
    }
}

fn warning(kind: WarningKind, current: f64, limit: f64, severity: Severity) -> WorkloadWarning {
    WorkloadWarning {
        kind,
        severity,
        current,
        limit,
        percent_of_limit: current / limit * 100.0,
    }
}

/// Checks the configured caps for one day.
///
/// The three kinds fire independently; all can be present at once. The
/// weekly check covers the Monday-based week containing `date`.
#[must_use]
pub fn check_warnings(
    date: NaiveDate,
    entries: &[EnrichedEntry],
    options: &WorkloadOptions,
) -> Vec<WorkloadWarning> {
    let mut warnings = Vec::new();
    let limits = &options.limits;
    let metric = daily_metric(date, entries, options);

    #[allow(clippy::cast_precision_loss)]
    let visit_count = metric.event_count as f64;
    if let Some(severity) =
        severity_for(visit_count, f64::from(limits.daily_visits), options.warning_ratio)
    {
        warnings.push(warning(
            WarningKind::DailyVisitCount,
            visit_count,
            f64::from(limits.daily_visits),
            severity,
        ));
    }

    #[allow(clippy::cast_precision_loss)]
    let day_hours = metric.total_minutes as f64 / MINUTES_PER_HOUR;
    if let Some(severity) = severity_for(day_hours, limits.daily_hours, options.warning_ratio) {
        warnings.push(warning(
            WarningKind::DailyHours,
            day_hours,
            limits.daily_hours,
            severity,
        ));
    }

    let (week_start, week_end) = week_bounds(date);
    // Range is never inverted here; week_bounds is ordered by construction.
    let week_total: i64 = range_metrics(week_start, week_end, entries, options)
        .map(|days| days.iter().map(|m| m.total_minutes).sum())
        .unwrap_or(0);
    #[allow(clippy::cast_precision_loss)]
    let week_hours = week_total as f64 / MINUTES_PER_HOUR;
    if let Some(severity) = severity_for(week_hours, limits.weekly_hours, options.warning_ratio) {
        warnings.push(warning(
            WarningKind::WeeklyHours,
            week_hours,
            limits.weekly_hours,
            severity,
        ));
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::entry::CalendarEntry;
    use crate::types::{CalendarId, EntryId, EntryStatus};
    use chrono::NaiveDateTime;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn work_entry(
        id: &str,
        title: &str,
        location: Option<&str>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> crate::entry::EnrichedEntry {
        classify(&CalendarEntry {
            id: EntryId::new(id).unwrap(),
            calendar: CalendarId::new("main").unwrap(),
            title: title.to_string(),
            description: None,
            location: location.map(String::from),
            start,
            end,
            all_day: false,
            status: EntryStatus::Confirmed,
            series_id: None,
            attendees: vec![],
        })
    }

    // ========== Level Bucketing ==========

    #[test]
    fn level_boundaries_are_inclusive_upper() {
        let b = LevelBoundaries { comfortable: 4.0, busy: 6.0, high: 8.0 };
        assert_eq!(level_for_hours(4.0, &b), WorkloadLevel::Comfortable);
        assert_eq!(level_for_hours(4.001, &b), WorkloadLevel::Busy);
        assert_eq!(level_for_hours(6.0, &b), WorkloadLevel::Busy);
        assert_eq!(level_for_hours(8.0, &b), WorkloadLevel::High);
        assert_eq!(level_for_hours(8.001, &b), WorkloadLevel::Burnout);
    }

    #[test]
    fn zero_or_negative_hours_is_none() {
        let b = ThresholdConfig::default().daily;
        assert_eq!(level_for_hours(0.0, &b), WorkloadLevel::None);
        assert_eq!(level_for_hours(-1.0, &b), WorkloadLevel::None);
    }

    #[test]
    fn threshold_validate_accumulates_problems() {
        let config = ThresholdConfig {
            daily: LevelBoundaries { comfortable: 6.0, busy: 4.0, high: 8.0 },
            weekly: LevelBoundaries { comfortable: 20.0, busy: 30.0, high: 25.0 },
            monthly: ThresholdConfig::default().monthly,
        };
        let problems = config.validate();
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("daily"));
        assert!(problems[1].contains("weekly"));
    }

    // ========== Daily Metric ==========

    #[test]
    fn daily_metric_sums_work_and_counts_events() {
        let entries = vec![
            work_entry("a", "Fluffy - 30", Some("12 Oak St"), dt(2024, 3, 1, 9, 0), dt(2024, 3, 1, 9, 30)),
            work_entry("b", "Daisy walk 45", Some("3 Elm Ave"), dt(2024, 3, 1, 11, 0), dt(2024, 3, 1, 11, 45)),
            work_entry("c", "Lunch", None, dt(2024, 3, 1, 12, 0), dt(2024, 3, 1, 13, 0)),
        ];
        let options = WorkloadOptions { include_travel: false, ..WorkloadOptions::default() };
        let metric = daily_metric(day(2024, 3, 1), &entries, &options);

        assert_eq!(metric.work_minutes, 75);
        assert_eq!(metric.travel_minutes, 0);
        assert_eq!(metric.event_count, 2);
        assert_eq!(metric.level, WorkloadLevel::Comfortable);
    }

    #[test]
    fn cancelled_entries_do_not_contribute() {
        let mut cancelled =
            work_entry("a", "Fluffy - 30", None, dt(2024, 3, 1, 9, 0), dt(2024, 3, 1, 9, 30));
        cancelled.entry.status = EntryStatus::Cancelled;
        let metric = daily_metric(day(2024, 3, 1), &[cancelled], &WorkloadOptions::default());
        assert_eq!(metric.event_count, 0);
        assert_eq!(metric.total_minutes, 0);
        assert_eq!(metric.level, WorkloadLevel::None);
    }

    #[test]
    fn travel_charges_two_legs_per_visit() {
        let entries = vec![
            work_entry("a", "Fluffy - 30", Some("12 Oak St"), dt(2024, 3, 1, 9, 0), dt(2024, 3, 1, 9, 30)),
            work_entry("b", "Daisy walk", Some("3 Elm Ave"), dt(2024, 3, 1, 11, 0), dt(2024, 3, 1, 11, 30)),
        ];
        let metric = daily_metric(day(2024, 3, 1), &entries, &WorkloadOptions::default());
        // 2 visits x 2 legs x 15 min
        assert_eq!(metric.travel_minutes, 60);
    }

    #[test]
    fn travel_reuses_leg_for_back_to_back_same_location() {
        let entries = vec![
            work_entry("a", "Fluffy - 30", Some("12 Oak St"), dt(2024, 3, 1, 9, 0), dt(2024, 3, 1, 9, 30)),
            work_entry("b", "Rex walk", Some("12 Oak St"), dt(2024, 3, 1, 9, 30), dt(2024, 3, 1, 10, 0)),
            work_entry("c", "Daisy - 30", Some("3 Elm Ave"), dt(2024, 3, 1, 11, 0), dt(2024, 3, 1, 11, 30)),
        ];
        let metric = daily_metric(day(2024, 3, 1), &entries, &WorkloadOptions::default());
        // 2 + 1 + 2 legs x 15 min
        assert_eq!(metric.travel_minutes, 75);
    }

    #[test]
    fn travel_ordering_uses_start_time_not_input_order() {
        // Same location but not adjacent once sorted by start.
        let entries = vec![
            work_entry("a", "Fluffy - 30", Some("12 Oak St"), dt(2024, 3, 1, 9, 0), dt(2024, 3, 1, 9, 30)),
            work_entry("b", "Rex walk", Some("12 Oak St"), dt(2024, 3, 1, 14, 0), dt(2024, 3, 1, 14, 30)),
            work_entry("c", "Daisy - 30", Some("3 Elm Ave"), dt(2024, 3, 1, 11, 0), dt(2024, 3, 1, 11, 30)),
        ];
        let metric = daily_metric(day(2024, 3, 1), &entries, &WorkloadOptions::default());
        // Sorted: Oak, Elm, Oak -- no sharing. 6 legs x 15 min.
        assert_eq!(metric.travel_minutes, 90);
    }

    // ========== Range & Period ==========

    #[test]
    fn range_metrics_rejects_inverted_range() {
        let result = range_metrics(day(2024, 3, 5), day(2024, 3, 1), &[], &WorkloadOptions::default());
        assert_eq!(
            result,
            Err(WorkloadError::InvalidRange { start: day(2024, 3, 5), end: day(2024, 3, 1) })
        );
    }

    #[test]
    fn range_metrics_emits_one_metric_per_day() {
        let metrics =
            range_metrics(day(2024, 3, 1), day(2024, 3, 3), &[], &WorkloadOptions::default())
                .unwrap();
        assert_eq!(metrics.len(), 3);
        assert_eq!(metrics[0].date, day(2024, 3, 1));
        assert_eq!(metrics[2].date, day(2024, 3, 3));
        assert!(metrics.iter().all(|m| m.level == WorkloadLevel::None));
    }

    #[test]
    fn week_bounds_are_monday_based() {
        // 2024-01-06 is a Saturday.
        let (start, end) = week_bounds(day(2024, 1, 6));
        assert_eq!(start, day(2024, 1, 1));
        assert_eq!(end, day(2024, 1, 7));
        // Anchoring on the Monday itself.
        let (start, end) = week_bounds(day(2024, 1, 1));
        assert_eq!(start, day(2024, 1, 1));
        assert_eq!(end, day(2024, 1, 7));
    }

    #[test]
    fn month_bounds_cover_leap_february() {
        let (start, end) = month_bounds(day(2024, 2, 15));
        assert_eq!(start, day(2024, 2, 1));
        assert_eq!(end, day(2024, 2, 29));
        let (start, end) = month_bounds(day(2023, 12, 31));
        assert_eq!(start, day(2023, 12, 1));
        assert_eq!(end, day(2023, 12, 31));
    }

    #[test]
    fn summary_mean_uses_actual_day_count() {
        let entries = vec![work_entry(
            "a",
            "Fluffy - 60",
            None,
            dt(2024, 2, 5, 9, 0),
            dt(2024, 2, 5, 10, 0),
        )];
        let options = WorkloadOptions { include_travel: false, ..WorkloadOptions::default() };
        let summary =
            period_summary(SummaryPeriod::Month, day(2024, 2, 10), &entries, &options).unwrap();
        assert_eq!(summary.days.len(), 29); // leap February
        assert_eq!(summary.total_minutes, 60);
        assert!((summary.mean_minutes_per_day - 60.0 / 29.0).abs() < 1e-9);
    }

    #[test]
    fn summary_busiest_day_tie_breaks_to_first() {
        let entries = vec![
            work_entry("a", "Fluffy - 30", None, dt(2024, 3, 5, 9, 0), dt(2024, 3, 5, 9, 30)),
            work_entry("b", "Rex - 30", None, dt(2024, 3, 7, 9, 0), dt(2024, 3, 7, 9, 30)),
        ];
        let options = WorkloadOptions { include_travel: false, ..WorkloadOptions::default() };
        let summary =
            period_summary(SummaryPeriod::Week, day(2024, 3, 5), &entries, &options).unwrap();
        assert_eq!(summary.busiest_day, Some(day(2024, 3, 5)));
    }

    #[test]
    fn summary_busiest_day_absent_for_empty_period() {
        let summary =
            period_summary(SummaryPeriod::Week, day(2024, 3, 5), &[], &WorkloadOptions::default())
                .unwrap();
        assert_eq!(summary.busiest_day, None);
        assert_eq!(summary.level, WorkloadLevel::None);
    }

    // ========== Warnings ==========

    fn nth_visit(i: u32) -> crate::entry::EnrichedEntry {
        work_entry(
            &format!("v{i}"),
            "Fluffy - 60",
            Some("12 Oak St"),
            dt(2024, 3, 4, 7 + i, 0),
            dt(2024, 3, 4, 7 + i, 45),
        )
    }

    #[test]
    fn no_warnings_below_ratio() {
        let entries: Vec<_> = (0..2).map(nth_visit).collect();
        let options = WorkloadOptions { include_travel: false, ..WorkloadOptions::default() };
        assert!(check_warnings(day(2024, 3, 4), &entries, &options).is_empty());
    }

    #[test]
    fn visit_count_warning_then_critical() {
        let options = WorkloadOptions { include_travel: false, ..WorkloadOptions::default() };

        // 7 of 8 visits = 87.5% -> warning
        let entries: Vec<_> = (0..7).map(nth_visit).collect();
        let warnings = check_warnings(day(2024, 3, 4), &entries, &options);
        let visits = warnings
            .iter()
            .find(|w| w.kind == WarningKind::DailyVisitCount)
            .unwrap();
        assert_eq!(visits.severity, Severity::Warning);

        // 9 of 8 visits -> critical
        let entries: Vec<_> = (0..9).map(nth_visit).collect();
        let warnings = check_warnings(day(2024, 3, 4), &entries, &options);
        let visits = warnings
            .iter()
            .find(|w| w.kind == WarningKind::DailyVisitCount)
            .unwrap();
        assert_eq!(visits.severity, Severity::Critical);
        assert!((visits.percent_of_limit - 112.5).abs() < 1e-9);
    }

    #[test]
    fn exactly_at_limit_is_warning_not_critical() {
        let options = WorkloadOptions { include_travel: false, ..WorkloadOptions::default() };
        let entries: Vec<_> = (0..8).map(nth_visit).collect();
        let warnings = check_warnings(day(2024, 3, 4), &entries, &options);
        let visits = warnings
            .iter()
            .find(|w| w.kind == WarningKind::DailyVisitCount)
            .unwrap();
        assert_eq!(visits.severity, Severity::Warning);
    }

    #[test]
    fn all_three_kinds_fire_independently() {
        // Eleven 70-minute visits per day blow the visit and hour caps;
        // stacking four such days in one week blows the weekly cap too.
        let mut entries = Vec::new();
        for d in [4, 5, 6, 7] {
            for i in 0..11u32 {
                entries.push(work_entry(
                    &format!("d{d}v{i}"),
                    "Fluffy - 60",
                    Some("12 Oak St"),
                    dt(2024, 3, d, 7, 0) + chrono::Duration::minutes(i64::from(i) * 70),
                    dt(2024, 3, d, 8, 10) + chrono::Duration::minutes(i64::from(i) * 70),
                ));
            }
        }
        let options = WorkloadOptions { include_travel: false, ..WorkloadOptions::default() };
        let warnings = check_warnings(day(2024, 3, 4), &entries, &options);
        let kinds: Vec<_> = warnings.iter().map(|w| w.kind).collect();
        assert!(kinds.contains(&WarningKind::DailyVisitCount));
        assert!(kinds.contains(&WarningKind::DailyHours));
        assert!(kinds.contains(&WarningKind::WeeklyHours));
    }
}

//! Report command for workload summaries.
//!
//! This module implements `sitter report` with day/week/month periods and
//! output formats (human-readable, JSON).

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use serde::Serialize;

use sitter_core::{
    EnrichedEntry, PeriodSummary, SummaryPeriod, WorkloadLevel, WorkloadMetric, WorkloadOptions,
    WorkloadWarning, check_warnings, classify_all, daily_metric, period_summary,
};
use sitter_db::Database;

/// Report period type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    Week,
    Month,
}

/// A warning tagged with the day it fired on.
#[derive(Debug, Clone, Serialize)]
pub struct DatedWarning {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub warning: WorkloadWarning,
}

/// Computed report data.
#[derive(Debug, Serialize)]
pub struct ReportData {
    pub anchor: NaiveDate,
    pub days: Vec<WorkloadMetric>,
    pub total_minutes: i64,
    pub busiest_day: Option<NaiveDate>,
    pub mean_minutes_per_day: f64,
    pub level: WorkloadLevel,
    pub warnings: Vec<DatedWarning>,
}

// ========== Duration Formatting ==========

/// Formats minutes as a duration string.
/// Returns "Xh Ym" if >= 1 hour, "Xm" if < 1 hour.
/// Negative durations are treated as 0m.
pub fn format_minutes(minutes: i64) -> String {
    if minutes < 0 {
        return "0m".to_string();
    }
    let hours = minutes / 60;
    let rest = minutes % 60;

    if hours >= 1 {
        format!("{hours}h {rest}m")
    } else {
        format!("{rest}m")
    }
}

// ========== Progress Bar ==========

/// Generates a 10-character progress bar.
/// Values <5% of max get a single block for visibility.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn progress_bar(value: i64, max: i64) -> String {
    if max == 0 {
        return "░░░░░░░░░░".to_string();
    }

    let ratio = value as f64 / max as f64;
    let filled = if ratio < 0.05 && value > 0 {
        1
    } else {
        (ratio * 10.0).round().min(10.0) as usize
    };

    let empty = 10 - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

// ========== Report Generation ==========

/// Collects warnings for every day carrying any work.
fn collect_warnings(
    days: &[WorkloadMetric],
    enriched: &[EnrichedEntry],
    options: &WorkloadOptions,
) -> Vec<DatedWarning> {
    days.iter()
        .filter(|metric| metric.total_minutes > 0)
        .flat_map(|metric| {
            check_warnings(metric.date, enriched, options)
                .into_iter()
                .map(|warning| DatedWarning { date: metric.date, warning })
        })
        .collect()
}

/// Builds report data for a single day.
fn day_report(
    anchor: NaiveDate,
    enriched: &[EnrichedEntry],
    options: &WorkloadOptions,
) -> ReportData {
    let metric = daily_metric(anchor, enriched, options);
    let warnings = check_warnings(anchor, enriched, options)
        .into_iter()
        .map(|warning| DatedWarning { date: anchor, warning })
        .collect();

    #[allow(clippy::cast_precision_loss)]
    let mean = metric.total_minutes as f64;
    ReportData {
        anchor,
        total_minutes: metric.total_minutes,
        busiest_day: (metric.total_minutes > 0).then_some(anchor),
        mean_minutes_per_day: mean,
        level: metric.level,
        warnings,
        days: vec![metric],
    }
}

/// Builds report data for a week or month.
fn summary_report(
    period: SummaryPeriod,
    anchor: NaiveDate,
    enriched: &[EnrichedEntry],
    options: &WorkloadOptions,
) -> Result<ReportData> {
    let summary: PeriodSummary = period_summary(period, anchor, enriched, options)?;
    let warnings = collect_warnings(&summary.days, enriched, options);

    Ok(ReportData {
        anchor,
        total_minutes: summary.total_minutes,
        busiest_day: summary.busiest_day,
        mean_minutes_per_day: summary.mean_minutes_per_day,
        level: summary.level,
        warnings,
        days: summary.days,
    })
}

/// Generates report data from stored entries.
pub fn generate_report_data(
    db: &Database,
    period: Period,
    anchor: NaiveDate,
    options: &WorkloadOptions,
) -> Result<ReportData> {
    let entries = db.get_entries()?;
    let enriched = classify_all(&entries);

    match period {
        Period::Day => Ok(day_report(anchor, &enriched, options)),
        Period::Week => summary_report(SummaryPeriod::Week, anchor, &enriched, options),
        Period::Month => summary_report(SummaryPeriod::Month, anchor, &enriched, options),
    }
}

/// Formats the period description for the report header.
fn format_period_description(period: Period, data: &ReportData) -> String {
    match period {
        Period::Day => format!("{}", data.anchor.format("%A, %b %-d, %Y")),
        Period::Week => {
            let start = data.days.first().map_or(data.anchor, |m| m.date);
            format!("Week of {}", start.format("%b %-d, %Y"))
        }
        Period::Month => format!("{}", data.anchor.format("%B %Y")),
    }
}

/// Formats the human-readable report output.
pub fn format_report(period: Period, data: &ReportData) -> String {
    let mut output = String::new();

    let period_desc = format_period_description(period, data);
    writeln!(output, "WORKLOAD REPORT: {period_desc}").unwrap();

    if data.total_minutes == 0 {
        writeln!(output).unwrap();
        writeln!(output, "No work scheduled in this period.").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "Hint: Run 'sitter classify' to check what was imported.").unwrap();
        return output;
    }

    let max_total = data.days.iter().map(|m| m.total_minutes).max().unwrap_or(0);

    writeln!(output).unwrap();
    writeln!(output, "DAYS").unwrap();
    writeln!(output, "────").unwrap();
    for metric in &data.days {
        if period != Period::Day && metric.total_minutes == 0 {
            continue;
        }
        let bar = progress_bar(metric.total_minutes, max_total);
        writeln!(
            output,
            "{}  {:>2} visits  {:>7}  {bar}  {}",
            metric.date.format("%Y-%m-%d %a"),
            metric.event_count,
            format_minutes(metric.total_minutes),
            metric.level,
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    writeln!(output, "SUMMARY").unwrap();
    writeln!(output, "───────").unwrap();
    writeln!(output, "Total:        {}", format_minutes(data.total_minutes)).unwrap();
    if period != Period::Day {
        if let Some(busiest) = data.busiest_day {
            let minutes = data
                .days
                .iter()
                .find(|m| m.date == busiest)
                .map_or(0, |m| m.total_minutes);
            writeln!(output, "Busiest day:  {busiest} ({})", format_minutes(minutes)).unwrap();
        }
        #[allow(clippy::cast_possible_truncation)]
        let mean = data.mean_minutes_per_day.round() as i64;
        writeln!(output, "Average/day:  {}", format_minutes(mean)).unwrap();
    }
    writeln!(output, "Level:        {}", data.level).unwrap();

    writeln!(output).unwrap();
    if data.warnings.is_empty() {
        writeln!(output, "No warnings.").unwrap();
    } else {
        writeln!(output, "WARNINGS").unwrap();
        writeln!(output, "────────").unwrap();
        for dated in &data.warnings {
            writeln!(
                output,
                "{}  [{}] {}: {:.1} of {:.1} ({:.0}%)",
                dated.date,
                dated.warning.severity,
                dated.warning.kind,
                dated.warning.current,
                dated.warning.limit,
                dated.warning.percent_of_limit,
            )
            .unwrap();
        }
    }

    output
}

// ========== Public Interface ==========

/// Runs the report command.
pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    period: Period,
    anchor: Option<NaiveDate>,
    json: bool,
    options: &WorkloadOptions,
) -> Result<()> {
    let anchor = anchor.unwrap_or_else(|| Local::now().date_naive());
    let data = generate_report_data(db, period, anchor, options)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&data)?)?;
    } else {
        write!(writer, "{}", format_report(period, &data))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use sitter_core::{CalendarEntry, CalendarId, EntryId, EntryStatus};

    // ========== Duration Formatting Tests ==========

    #[test]
    fn test_format_minutes_hours_and_minutes() {
        assert_snapshot!(format_minutes(150), @"2h 30m");
        assert_snapshot!(format_minutes(60), @"1h 0m");
        assert_snapshot!(format_minutes(90), @"1h 30m");
    }

    #[test]
    fn test_format_minutes_only() {
        assert_snapshot!(format_minutes(45), @"45m");
        assert_snapshot!(format_minutes(0), @"0m");
    }

    #[test]
    fn test_format_minutes_negative_is_zero() {
        assert_eq!(format_minutes(-30), "0m");
    }

    // ========== Progress Bar Tests ==========

    #[test]
    fn test_progress_bar_full() {
        assert_eq!(progress_bar(100, 100), "██████████");
    }

    #[test]
    fn test_progress_bar_partial() {
        assert_eq!(progress_bar(50, 100), "█████░░░░░");
        assert_eq!(progress_bar(20, 100), "██░░░░░░░░");
    }

    #[test]
    fn test_progress_bar_minimum_visibility() {
        assert_eq!(progress_bar(1, 100), "█░░░░░░░░░");
    }

    #[test]
    fn test_progress_bar_zero_max() {
        assert_eq!(progress_bar(0, 0), "░░░░░░░░░░");
    }

    // ========== Report Tests ==========

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(id: &str, title: &str, date: NaiveDate, h: u32, len: u32) -> CalendarEntry {
        let start = date.and_hms_opt(h, 0, 0).unwrap();
        CalendarEntry {
            id: EntryId::new(id).unwrap(),
            calendar: CalendarId::new("main").unwrap(),
            title: title.to_string(),
            description: None,
            location: Some("12 Oak St".to_string()),
            start,
            end: start + chrono::Duration::minutes(i64::from(len)),
            all_day: false,
            status: EntryStatus::Confirmed,
            series_id: None,
            attendees: vec![],
        }
    }

    fn seeded_db() -> Database {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_entries(&[
            entry("e1", "Fluffy - 30", day(2024, 3, 4), 9, 30),
            entry("e2", "Rex walk 45", day(2024, 3, 5), 9, 45),
            entry("e3", "Daisy - 30", day(2024, 3, 5), 11, 30),
            entry("e4", "Lunch", day(2024, 3, 5), 12, 60),
        ])
        .unwrap();
        db
    }

    fn no_travel() -> WorkloadOptions {
        WorkloadOptions { include_travel: false, ..WorkloadOptions::default() }
    }

    #[test]
    fn week_report_aggregates_work_days() {
        let db = seeded_db();
        let data =
            generate_report_data(&db, Period::Week, day(2024, 3, 4), &no_travel()).unwrap();

        assert_eq!(data.days.len(), 7);
        assert_eq!(data.total_minutes, 105);
        assert_eq!(data.busiest_day, Some(day(2024, 3, 5)));

        let output = format_report(Period::Week, &data);
        assert!(output.contains("WORKLOAD REPORT: Week of Mar 4, 2024"));
        assert!(output.contains("2024-03-05"));
        assert!(output.contains("Busiest day:  2024-03-05"));
        // Personal lunch entry contributes nothing.
        assert!(output.contains("Total:        1h 45m"));
    }

    #[test]
    fn day_report_shows_single_metric() {
        let db = seeded_db();
        let data = generate_report_data(&db, Period::Day, day(2024, 3, 5), &no_travel()).unwrap();

        assert_eq!(data.days.len(), 1);
        assert_eq!(data.total_minutes, 75);

        let output = format_report(Period::Day, &data);
        assert!(output.contains("WORKLOAD REPORT: Tuesday, Mar 5, 2024"));
        assert!(output.contains("2 visits"));
        assert!(output.contains("No warnings."));
    }

    #[test]
    fn empty_period_prints_hint() {
        let db = Database::open_in_memory().unwrap();
        let data =
            generate_report_data(&db, Period::Week, day(2024, 3, 4), &no_travel()).unwrap();
        let output = format_report(Period::Week, &data);
        assert!(output.contains("No work scheduled in this period."));
        assert!(output.contains("sitter classify"));
    }

    #[test]
    fn overloaded_day_reports_warnings() {
        let mut db = Database::open_in_memory().unwrap();
        let anchor = day(2024, 3, 4);
        let entries: Vec<_> = (0..11u32)
            .map(|i| entry(&format!("v{i}"), "Fluffy - 60", anchor, 7 + i, 60))
            .collect();
        db.insert_entries(&entries).unwrap();

        let data = generate_report_data(&db, Period::Day, anchor, &no_travel()).unwrap();
        assert!(!data.warnings.is_empty());

        let output = format_report(Period::Day, &data);
        assert!(output.contains("WARNINGS"));
        assert!(output.contains("[critical] daily-visit-count"));
    }

    #[test]
    fn json_report_serializes_cleanly() {
        let db = seeded_db();
        let mut output = Vec::new();
        run(&mut output, &db, Period::Week, Some(day(2024, 3, 4)), true, &no_travel()).unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&output).expect("report JSON must parse");
        assert_eq!(json["total_minutes"], 105);
        assert_eq!(json["busiest_day"], "2024-03-05");
    }
}

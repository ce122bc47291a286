//! Core scheduling intelligence for the pet-sitting toolkit.
//!
//! This crate contains the fundamental types and logic for:
//! - Classification: deciding which calendar entries are billable work
//! - Workload: per-day/period metrics, levels, and over-limit warnings
//! - Booking: expanding recurrence configs into visits and finding conflicts
//! - Matching: linking loosely-named entries to known clients
//!
//! Every operation is a pure, synchronous computation over the data passed
//! in; persistence and presentation live in the sibling crates.

pub mod booking;
pub mod classify;
pub mod client;
pub mod entry;
pub mod matcher;
pub mod types;
pub mod workload;

pub use booking::{
    BookingKind, Conflict, OvernightBlock, RecurrenceConfig, TemplateCatalog, VisitSlot,
    VisitTemplate, detect_conflicts, generate, validate,
};
pub use classify::{classify, classify_all, duration_for_day};
pub use client::{Client, MappingSnapshot, Pet, normalize_label};
pub use entry::{Attendee, CalendarEntry, EnrichedEntry};
pub use matcher::{ClientSuggestion, MatchWeights, auto_match, similarity, suggest};
pub use types::{
    CalendarId, ClientId, Confidence, EntryId, EntryStatus, MatchSource, ServiceType, TemplateId,
    ValidationError,
};
pub use workload::{
    LevelBoundaries, PeriodSummary, Severity, SummaryPeriod, ThresholdConfig, WarningKind,
    WarningLimits, WorkloadError, WorkloadLevel, WorkloadMetric, WorkloadOptions, WorkloadWarning,
    check_warnings, daily_metric, period_summary, range_metrics,
};

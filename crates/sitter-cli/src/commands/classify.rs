//! Classify command: show work/personal classification of stored entries.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;

use sitter_core::{EnrichedEntry, classify_all};
use sitter_db::Database;

/// Formats classified entries as an aligned table.
pub fn format_table(enriched: &[EnrichedEntry]) -> String {
    let mut output = String::new();

    writeln!(
        output,
        "{:<19}  {:<5}  {:<10}  {:>5}  {}",
        "START", "WORK", "SERVICE", "MIN", "TITLE"
    )
    .unwrap();

    for e in enriched {
        let service = e.service.map_or("-", |s| s.as_str());
        let minutes = if e.is_work {
            e.service_minutes.to_string()
        } else {
            "-".to_string()
        };
        writeln!(
            output,
            "{:<19}  {:<5}  {:<10}  {:>5}  {}",
            e.entry.start.format("%Y-%m-%d %H:%M"),
            if e.is_work { "work" } else { "-" },
            service,
            minutes,
            e.entry.title,
        )
        .unwrap();
    }

    let work = enriched.iter().filter(|e| e.is_work).count();
    writeln!(output).unwrap();
    writeln!(output, "{work} work / {} total", enriched.len()).unwrap();
    output
}

pub fn run<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let entries = db.get_entries()?;
    let enriched = classify_all(&entries);

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&enriched)?)?;
    } else if enriched.is_empty() {
        writeln!(writer, "No entries stored. Run 'sitter import <file>' first.")?;
    } else {
        write!(writer, "{}", format_table(&enriched))?;
    }

    Ok(())
}

//! Import command for loading raw calendar entries.
//!
//! The calendar collaborator hands entries over as a JSON array; this
//! command validates and stores them. Re-importing the same file is safe:
//! duplicates are ignored by entry ID.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use sitter_core::CalendarEntry;
use sitter_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &mut Database, file: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let entries: Vec<CalendarEntry> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse entries from {}", file.display()))?;

    let inserted = db.insert_entries(&entries)?;
    let skipped = entries.len() - inserted;

    writeln!(writer, "Imported {inserted} entries ({skipped} already present)")?;
    Ok(())
}

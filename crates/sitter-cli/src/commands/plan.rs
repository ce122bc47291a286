//! Plan command: expand a recurrence config and check for conflicts.
//!
//! Reads a TOML plan file holding one booking plus optional visit
//! templates, validates it (reporting every problem at once), generates the
//! candidate visits, and compares them against the stored schedule. With
//! `--commit` the batch is stored, but only when it is conflict-free.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use sitter_core::{
    CalendarEntry, Conflict, RecurrenceConfig, TemplateCatalog, VisitTemplate, detect_conflicts,
    generate, validate,
};
use sitter_db::Database;

/// On-disk plan file shape.
#[derive(Debug, Deserialize)]
pub struct PlanFile {
    pub booking: RecurrenceConfig,
    #[serde(default)]
    pub templates: Vec<VisitTemplate>,
}

/// Computed plan output.
#[derive(Debug, Serialize)]
pub struct PlanData {
    pub generated: Vec<CalendarEntry>,
    pub conflicts: Vec<Conflict>,
}

/// Loads and validates a plan file, writing every violation before failing.
fn load_plan<W: Write>(writer: &mut W, file: &Path) -> Result<PlanFile> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let plan: PlanFile = toml::from_str(&raw)
        .with_context(|| format!("failed to parse plan from {}", file.display()))?;

    let problems = validate(&plan.booking);
    if !problems.is_empty() {
        writeln!(writer, "Plan is invalid:")?;
        for problem in &problems {
            writeln!(writer, "- {problem}")?;
        }
        bail!("plan validation failed with {} problem(s)", problems.len());
    }
    Ok(plan)
}

/// Formats the human-readable plan output.
pub fn format_plan(data: &PlanData) -> String {
    use std::fmt::Write as _;

    let mut output = String::new();

    writeln!(output, "PROPOSED VISITS ({})", data.generated.len()).unwrap();
    for entry in &data.generated {
        writeln!(
            output,
            "{} - {}  {}",
            entry.start.format("%Y-%m-%d %H:%M"),
            entry.end.format("%H:%M"),
            entry.title,
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    if data.conflicts.is_empty() {
        writeln!(output, "No conflicts with the existing schedule.").unwrap();
    } else {
        writeln!(output, "CONFLICTS ({})", data.conflicts.len()).unwrap();
        for conflict in &data.conflicts {
            writeln!(
                output,
                "{} \"{}\" overlaps existing \"{}\" ({} - {})",
                conflict.generated.start.format("%Y-%m-%d %H:%M"),
                conflict.generated.title,
                conflict.existing.title,
                conflict.existing.start.format("%H:%M"),
                conflict.existing.end.format("%H:%M"),
            )
            .unwrap();
        }
    }

    output
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    file: &Path,
    commit: bool,
    json: bool,
) -> Result<()> {
    let plan = load_plan(writer, file)?;
    let templates = TemplateCatalog::new(plan.templates);

    let generated = generate(&plan.booking, &templates);
    let existing = db.get_entries()?;
    let conflicts = detect_conflicts(&existing, &generated);
    let data = PlanData { generated, conflicts };

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&data)?)?;
    } else {
        write!(writer, "{}", format_plan(&data))?;
    }

    if commit {
        if data.conflicts.is_empty() {
            let stored = db.insert_entries(&data.generated)?;
            writeln!(writer, "Stored {stored} visits.")?;
        } else {
            bail!(
                "refusing to commit: {} conflict(s) with the existing schedule",
                data.conflicts.len()
            );
        }
    }

    Ok(())
}

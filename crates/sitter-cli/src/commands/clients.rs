//! Client roster commands: list, add, map labels, and suggest matches.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::Local;
use uuid::Uuid;

use sitter_core::{
    CalendarEntry, CalendarId, Client, ClientId, ClientSuggestion, EntryId, EntryStatus,
    MatchWeights, Pet, classify, suggest,
};
use sitter_db::Database;

/// Lists the roster with pets and mapping counts.
pub fn list<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    let clients = db.get_clients()?;
    if clients.is_empty() {
        writeln!(writer, "No clients. Run 'sitter clients add <name>' first.")?;
        return Ok(());
    }

    for client in &clients {
        let pets = if client.pets.is_empty() {
            "(no pets)".to_string()
        } else {
            client
                .pets
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        writeln!(writer, "{}  {}  {pets}", client.id, client.name)?;
    }
    writeln!(writer)?;
    writeln!(
        writer,
        "{} clients, {} label mappings",
        clients.len(),
        db.count_mappings()?
    )?;
    Ok(())
}

/// Adds or updates a client. Generates an ID when none is supplied.
pub fn add<W: Write>(
    writer: &mut W,
    db: &mut Database,
    name: &str,
    id: Option<&str>,
    pets: &[String],
) -> Result<()> {
    if name.trim().is_empty() {
        bail!("client name must not be empty");
    }

    let id = match id {
        Some(id) => ClientId::new(id).context("invalid client ID")?,
        None => ClientId::new(Uuid::new_v4().to_string()).expect("uuid is non-empty"),
    };

    let client = Client {
        id: id.clone(),
        name: name.trim().to_string(),
        phone: None,
        email: None,
        address: None,
        pets: pets.iter().map(|p| Pet { name: p.clone() }).collect(),
    };
    db.upsert_client(&client)?;
    writeln!(writer, "Saved client {id} ({})", client.name)?;
    Ok(())
}

/// Links a label to a client.
pub fn map<W: Write>(writer: &mut W, db: &Database, label: &str, client_id: &str) -> Result<()> {
    let client_id = ClientId::new(client_id).context("invalid client ID")?;
    let known = db.get_clients()?.iter().any(|c| c.id == client_id);
    if !known {
        bail!("no client with ID {client_id}");
    }

    db.set_mapping(label, &client_id)?;
    writeln!(writer, "Mapped \"{label}\" to {client_id}")?;
    Ok(())
}

/// Removes a label link.
pub fn unmap<W: Write>(writer: &mut W, db: &Database, label: &str) -> Result<()> {
    if db.remove_mapping(label)? {
        writeln!(writer, "Unmapped \"{label}\"")?;
    } else {
        writeln!(writer, "No mapping for \"{label}\"")?;
    }
    Ok(())
}

/// Builds a throwaway entry so the classifier can extract a label from an
/// ad-hoc title.
fn adhoc_entry(title: &str) -> CalendarEntry {
    let now = Local::now().naive_local();
    CalendarEntry {
        id: EntryId::new("adhoc").expect("literal is non-empty"),
        calendar: CalendarId::new("adhoc").expect("literal is non-empty"),
        title: title.to_string(),
        description: None,
        location: None,
        start: now,
        end: now,
        all_day: false,
        status: EntryStatus::Confirmed,
        series_id: None,
        attendees: vec![],
    }
}

/// Suggests clients for a title, mapping lookups first.
pub fn suggest_for_title(
    db: &Database,
    title: &str,
    weights: &MatchWeights,
) -> Result<Vec<ClientSuggestion>> {
    let clients = db.get_clients()?;
    let mappings = db.mapping_snapshot()?;
    let enriched = classify(&adhoc_entry(title));

    Ok(suggest(
        title,
        enriched.client_label.as_deref(),
        &clients,
        &mappings,
        weights,
    ))
}

/// Runs the suggest subcommand.
pub fn run_suggest<W: Write>(
    writer: &mut W,
    db: &Database,
    title: &str,
    json: bool,
    weights: &MatchWeights,
) -> Result<()> {
    let suggestions = suggest_for_title(db, title, weights)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&suggestions)?)?;
        return Ok(());
    }

    if suggestions.is_empty() {
        writeln!(writer, "No matching clients for \"{title}\".")?;
        return Ok(());
    }

    for (rank, s) in suggestions.iter().enumerate() {
        writeln!(
            writer,
            "{}. {}  {}  [{}]",
            rank + 1,
            s.client_name,
            s.confidence,
            s.source,
        )?;
        for reason in &s.reasons {
            writeln!(writer, "   - {reason}")?;
        }
    }
    Ok(())
}

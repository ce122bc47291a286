//! Storage layer for the pet-sitting toolkit.
//!
//! Provides persistence for calendar entries, the client roster, and the
//! label-to-client mapping table using `rusqlite`. The analysis crate never
//! opens its own storage handle; it receives plain data loaded here.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but
//! not `Sync`. A `Database` instance can be moved between threads but cannot
//! be shared across threads without external synchronization.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Entry timestamps are stored as TEXT in ISO 8601 format without a zone
//! (e.g., `2024-03-01T09:00:00`): the whole feed is normalized to one
//! wall-clock zone before it reaches this crate, and the format keeps
//! lexicographic ordering aligned with chronological ordering.
//!
//! ## Attendee Storage
//!
//! The `attendees` column stores a JSON array payload. Adding fields to the
//! attendee shape is backward compatible; removing or renaming them requires
//! a migration.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use sitter_core::{
    Attendee, CalendarEntry, Client, ClientId, MappingSnapshot, Pet, normalize_label,
};

/// Storage format for entry timestamps.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to parse a stored entry timestamp.
    #[error("invalid timestamp for entry {entry_id}: {timestamp}")]
    TimestampParse {
        entry_id: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored row held a value the core types reject.
    #[error("invalid stored data for {id}: {message}")]
    InvalidStoredData { id: String, message: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection
    /// closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            -- Calendar entries cached from the provider feed (or committed
            -- from the visit planner). Timestamps: ISO 8601, single zone.
            CREATE TABLE IF NOT EXISTS entries (
                id TEXT PRIMARY KEY,
                calendar TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                location TEXT,
                start_at TEXT NOT NULL,
                end_at TEXT NOT NULL,
                all_day INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL,
                series_id TEXT,
                attendees TEXT NOT NULL DEFAULT '[]'
            );

            CREATE INDEX IF NOT EXISTS idx_entries_start ON entries(start_at);
            CREATE INDEX IF NOT EXISTS idx_entries_calendar ON entries(calendar);

            CREATE TABLE IF NOT EXISTS clients (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                phone TEXT,
                email TEXT,
                address TEXT
            );

            CREATE TABLE IF NOT EXISTS pets (
                client_id TEXT NOT NULL,
                name TEXT NOT NULL,
                PRIMARY KEY (client_id, name),
                FOREIGN KEY (client_id) REFERENCES clients(id) ON DELETE CASCADE
            );

            -- Label-to-client links. Labels are stored normalized
            -- (lowercase, collapsed whitespace).
            CREATE TABLE IF NOT EXISTS client_mappings (
                label TEXT PRIMARY KEY,
                client_id TEXT NOT NULL,
                FOREIGN KEY (client_id) REFERENCES clients(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_mappings_client ON client_mappings(client_id);
            ",
        )?;
        Ok(())
    }

    // ========== Entries ==========

    /// Inserts a batch of entries, ignoring duplicates by ID.
    ///
    /// Returns the number of rows actually inserted.
    pub fn insert_entries(&mut self, entries: &[CalendarEntry]) -> Result<usize, DbError> {
        if entries.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT OR IGNORE INTO entries
                (id, calendar, title, description, location, start_at, end_at, all_day, status, series_id, attendees)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )?;
            for entry in entries {
                let attendees = serde_json::to_string(&entry.attendees).map_err(|e| {
                    DbError::InvalidStoredData {
                        id: entry.id.to_string(),
                        message: e.to_string(),
                    }
                })?;
                inserted += stmt.execute(params![
                    entry.id.as_str(),
                    entry.calendar.as_str(),
                    entry.title,
                    entry.description,
                    entry.location,
                    entry.start.format(TIMESTAMP_FORMAT).to_string(),
                    entry.end.format(TIMESTAMP_FORMAT).to_string(),
                    entry.all_day,
                    entry.status.as_str(),
                    entry.series_id,
                    attendees,
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(inserted, total = entries.len(), "stored entry batch");
        Ok(inserted)
    }

    /// Loads every stored entry, ordered by start time.
    pub fn get_entries(&self) -> Result<Vec<CalendarEntry>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, calendar, title, description, location, start_at, end_at, all_day, status, series_id, attendees
            FROM entries ORDER BY start_at, id
            ",
        )?;
        let rows = stmt.query_map([], row_to_entry_parts)?;
        rows.map(|row| row?.into_entry()).collect()
    }

    /// Loads entries whose span touches `[start, end]`.
    pub fn get_entries_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<CalendarEntry>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, calendar, title, description, location, start_at, end_at, all_day, status, series_id, attendees
            FROM entries
            WHERE start_at <= ? AND end_at >= ?
            ORDER BY start_at, id
            ",
        )?;
        let rows = stmt.query_map(
            params![
                end.format(TIMESTAMP_FORMAT).to_string(),
                start.format(TIMESTAMP_FORMAT).to_string(),
            ],
            row_to_entry_parts,
        )?;
        rows.map(|row| row?.into_entry()).collect()
    }

    /// Number of stored entries.
    pub fn count_entries(&self) -> Result<usize, DbError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    // ========== Clients ==========

    /// Creates or replaces a client and its pet list.
    pub fn upsert_client(&mut self, client: &Client) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "
            INSERT INTO clients (id, name, phone, email, address)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                phone = excluded.phone,
                email = excluded.email,
                address = excluded.address
            ",
            params![
                client.id.as_str(),
                client.name,
                client.phone,
                client.email,
                client.address,
            ],
        )?;
        tx.execute("DELETE FROM pets WHERE client_id = ?", params![client.id.as_str()])?;
        {
            let mut stmt = tx.prepare("INSERT OR IGNORE INTO pets (client_id, name) VALUES (?, ?)")?;
            for pet in &client.pets {
                stmt.execute(params![client.id.as_str(), pet.name])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Loads the full client roster with pets, ordered by name.
    pub fn get_clients(&self) -> Result<Vec<Client>, DbError> {
        let mut pets_by_client: HashMap<String, Vec<Pet>> = HashMap::new();
        {
            let mut stmt = self
                .conn
                .prepare("SELECT client_id, name FROM pets ORDER BY client_id, name")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            for row in rows {
                let (client_id, name) = row?;
                pets_by_client.entry(client_id).or_default().push(Pet { name });
            }
        }

        let mut stmt = self
            .conn
            .prepare("SELECT id, name, phone, email, address FROM clients ORDER BY name, id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;

        let mut clients = Vec::new();
        for row in rows {
            let (id, name, phone, email, address) = row?;
            let pets = pets_by_client.remove(&id).unwrap_or_default();
            let id = ClientId::new(&id).map_err(|e| DbError::InvalidStoredData {
                id,
                message: e.to_string(),
            })?;
            clients.push(Client { id, name, phone, email, address, pets });
        }
        Ok(clients)
    }

    /// Number of stored clients.
    pub fn count_clients(&self) -> Result<usize, DbError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM clients", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    // ========== Label Mappings ==========

    /// Links a label to a client, replacing any previous link.
    ///
    /// The label is normalized before storage.
    pub fn set_mapping(&self, label: &str, client: &ClientId) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO client_mappings (label, client_id) VALUES (?, ?)
            ON CONFLICT(label) DO UPDATE SET client_id = excluded.client_id
            ",
            params![normalize_label(label), client.as_str()],
        )?;
        Ok(())
    }

    /// Looks up the client linked to a label, if any.
    pub fn get_mapping(&self, label: &str) -> Result<Option<ClientId>, DbError> {
        let id: Option<String> = self
            .conn
            .query_row(
                "SELECT client_id FROM client_mappings WHERE label = ?",
                params![normalize_label(label)],
                |row| row.get(0),
            )
            .optional()?;
        match id {
            None => Ok(None),
            Some(id) => ClientId::new(&id)
                .map(Some)
                .map_err(|e| DbError::InvalidStoredData { id, message: e.to_string() }),
        }
    }

    /// Removes one label link. Returns true when a row was deleted.
    pub fn remove_mapping(&self, label: &str) -> Result<bool, DbError> {
        let deleted = self.conn.execute(
            "DELETE FROM client_mappings WHERE label = ?",
            params![normalize_label(label)],
        )?;
        Ok(deleted > 0)
    }

    /// Removes every label linked to a client. Returns how many were
    /// deleted.
    pub fn remove_mappings_for_client(&self, client: &ClientId) -> Result<usize, DbError> {
        let deleted = self.conn.execute(
            "DELETE FROM client_mappings WHERE client_id = ?",
            params![client.as_str()],
        )?;
        Ok(deleted)
    }

    /// Number of stored label mappings.
    pub fn count_mappings(&self) -> Result<usize, DbError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM client_mappings", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Loads the whole mapping table as a snapshot for the matcher.
    pub fn mapping_snapshot(&self) -> Result<MappingSnapshot, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT label, client_id FROM client_mappings")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut mappings = Vec::new();
        for row in rows {
            let (label, id) = row?;
            let id = ClientId::new(&id).map_err(|e| DbError::InvalidStoredData {
                id,
                message: e.to_string(),
            })?;
            mappings.push((label, id));
        }
        Ok(MappingSnapshot::new(mappings))
    }
}

/// Raw column values for one entry row.
struct EntryRow {
    id: String,
    calendar: String,
    title: String,
    description: Option<String>,
    location: Option<String>,
    start_at: String,
    end_at: String,
    all_day: bool,
    status: String,
    series_id: Option<String>,
    attendees: String,
}

fn row_to_entry_parts(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntryRow> {
    Ok(EntryRow {
        id: row.get(0)?,
        calendar: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        location: row.get(4)?,
        start_at: row.get(5)?,
        end_at: row.get(6)?,
        all_day: row.get(7)?,
        status: row.get(8)?,
        series_id: row.get(9)?,
        attendees: row.get(10)?,
    })
}

impl EntryRow {
    fn parse_timestamp(&self, value: &str) -> Result<NaiveDateTime, DbError> {
        NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|source| {
            DbError::TimestampParse {
                entry_id: self.id.clone(),
                timestamp: value.to_string(),
                source,
            }
        })
    }

    fn into_entry(self) -> Result<CalendarEntry, DbError> {
        let start = self.parse_timestamp(&self.start_at)?;
        let end = self.parse_timestamp(&self.end_at)?;
        let invalid = |message: String| DbError::InvalidStoredData {
            id: self.id.clone(),
            message,
        };

        let attendees: Vec<Attendee> =
            serde_json::from_str(&self.attendees).map_err(|e| invalid(e.to_string()))?;
        let status = self.status.parse().map_err(|e: sitter_core::ValidationError| {
            invalid(e.to_string())
        })?;
        let id = sitter_core::EntryId::new(&self.id).map_err(|e| invalid(e.to_string()))?;
        let calendar =
            sitter_core::CalendarId::new(&self.calendar).map_err(|e| invalid(e.to_string()))?;

        Ok(CalendarEntry {
            id,
            calendar,
            title: self.title,
            description: self.description,
            location: self.location,
            start,
            end,
            all_day: self.all_day,
            status,
            series_id: self.series_id,
            attendees,
        })
    }
}

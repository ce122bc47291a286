//! Client roster types and the persisted label mapping snapshot.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::ClientId;

/// A pet on a client's record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub name: String,
}

/// A known client. Supplied read-only by the roster collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pets: Vec<Pet>,
}

/// Normalizes a label for mapping lookups and fuzzy comparison:
/// lowercased, trimmed, inner whitespace collapsed to single spaces.
#[must_use]
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// A caller-owned snapshot of the persisted label-to-client table.
///
/// The storage collaborator loads and saves it; within a matching call it is
/// an immutable snapshot, so concurrent use needs no coordination. Keys are
/// normalized on every access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingSnapshot {
    map: HashMap<String, ClientId>,
}

impl MappingSnapshot {
    #[must_use]
    pub fn new(mappings: impl IntoIterator<Item = (String, ClientId)>) -> Self {
        Self {
            map: mappings
                .into_iter()
                .map(|(label, id)| (normalize_label(&label), id))
                .collect(),
        }
    }

    /// Exact lookup after normalization.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&ClientId> {
        self.map.get(&normalize_label(label))
    }

    /// Records a label for a client, replacing any previous owner.
    pub fn set(&mut self, label: &str, client: ClientId) {
        self.map.insert(normalize_label(label), client);
    }

    /// Drops one label. Returns the client it pointed at, if any.
    pub fn remove(&mut self, label: &str) -> Option<ClientId> {
        self.map.remove(&normalize_label(label))
    }

    /// Drops every label pointing at the given client. Returns how many
    /// were removed.
    pub fn remove_client(&mut self, client: &ClientId) -> usize {
        let before = self.map.len();
        self.map.retain(|_, id| id != client);
        before - self.map.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates (normalized label, client id) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ClientId)> {
        self.map.iter()
    }
}

//! Fuzzy client matching.
//!
//! Scores each roster client against an entry title by combining
//! independent signals additively, capped at 1.0. The weights are
//! configuration, not control flow: tuning them (or swapping in a learned
//! scorer) must not require touching the matching logic.

use serde::{Deserialize, Serialize};

use crate::client::{Client, MappingSnapshot, normalize_label};
use crate::types::{ClientId, Confidence, MatchSource};

/// Scoring constants for [`auto_match`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchWeights {
    /// Client name appears verbatim in the title.
    pub name_substring: f32,
    /// Client name contains the title's first word.
    pub first_word: f32,
    /// Multiplier applied to edit-distance similarity.
    pub similarity_scale: f32,
    /// A pet name appears in the title.
    pub pet_name: f32,
    /// The segment before a " - " separator closely matches the name.
    pub leading_segment: f32,
    /// Minimum similarity before the scaled-similarity signal applies.
    pub similarity_cutoff: f32,
    /// Minimum similarity for the leading-segment signal.
    pub leading_segment_cutoff: f32,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            name_substring: 0.8,
            first_word: 0.4,
            similarity_scale: 0.5,
            pet_name: 0.6,
            leading_segment: 0.3,
            similarity_cutoff: 0.6,
            leading_segment_cutoff: 0.8,
        }
    }
}

/// Floor applied to auto-match results inside [`suggest`].
const SUGGEST_THRESHOLD: f32 = 0.3;

/// A ranked client candidate for an entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientSuggestion {
    pub client_id: ClientId,
    pub client_name: String,
    pub confidence: Confidence,
    /// Human-readable justifications, in signal order.
    pub reasons: Vec<String>,
    pub source: MatchSource,
}

/// Classic Levenshtein edit distance (insert/delete/substitute cost 1).
///
/// Operates on Unicode scalar values, two-row DP.
#[must_use]
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Similarity in \[0, 1\]: `(max_len - distance) / max_len`.
///
/// Symmetric and reflexive; two empty strings are identical (1.0).
#[must_use]
pub fn similarity(a: &str, b: &str) -> f32 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let score = (max_len - levenshtein(a, b)) as f32 / max_len as f32;
    score
}

/// Scores one client against a normalized title. Returns `None` when no
/// signal fires at all.
fn score_client(
    norm_title: &str,
    client: &Client,
    weights: &MatchWeights,
) -> Option<(f32, Vec<String>)> {
    let norm_name = normalize_label(&client.name);
    if norm_name.is_empty() {
        return None;
    }

    let mut score = 0.0f32;
    let mut reasons = Vec::new();

    if norm_title.contains(&norm_name) {
        score += weights.name_substring;
        reasons.push(format!("client name \"{}\" appears in the title", client.name));
    } else if let Some(first_word) = norm_title.split_whitespace().next() {
        if norm_name.contains(first_word) {
            score += weights.first_word;
            reasons.push(format!("client name contains the title's first word \"{first_word}\""));
        } else {
            let sim = similarity(&norm_name, norm_title);
            if sim > weights.similarity_cutoff {
                score += sim * weights.similarity_scale;
                reasons.push(format!(
                    "title is {:.0}% similar to the client name",
                    sim * 100.0
                ));
            }
        }
    }

    // Pet signal fires at most once, on the first matching pet.
    if let Some(pet) = client.pets.iter().find(|pet| {
        let norm_pet = normalize_label(&pet.name);
        !norm_pet.is_empty() && norm_title.contains(&norm_pet)
    }) {
        score += weights.pet_name;
        reasons.push(format!("pet name \"{}\" appears in the title", pet.name));
    }

    if let Some(idx) = norm_title.find(" - ") {
        let segment = norm_title[..idx].trim();
        if similarity(segment, &norm_name) > weights.leading_segment_cutoff {
            score += weights.leading_segment;
            reasons.push("the segment before \" - \" closely matches the client name".to_string());
        }
    }

    if reasons.is_empty() {
        None
    } else {
        Some((score.min(1.0), reasons))
    }
}

/// Fuzzy-matches a title against the roster.
///
/// Results under `threshold` are discarded; survivors are sorted by
/// descending confidence (stable, so input order breaks ties).
#[must_use]
pub fn auto_match(
    title: &str,
    clients: &[Client],
    threshold: f32,
    weights: &MatchWeights,
) -> Vec<ClientSuggestion> {
    let norm_title = normalize_label(title);
    if norm_title.is_empty() {
        return Vec::new();
    }

    let mut suggestions: Vec<ClientSuggestion> = clients
        .iter()
        .filter_map(|client| {
            let (score, reasons) = score_client(&norm_title, client, weights)?;
            (score >= threshold).then(|| ClientSuggestion {
                client_id: client.id.clone(),
                client_name: client.name.clone(),
                confidence: Confidence::clamped(score),
                reasons,
                source: MatchSource::AutoMatch,
            })
        })
        .collect();

    suggestions.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    suggestions
}

/// Suggests clients for an entry, mapping lookups first.
///
/// A persisted mapping hit for `label` leads at confidence 1.0; auto-match
/// results follow in their own order for any client not already suggested.
/// A mapping that points at a client missing from the roster is skipped.
#[must_use]
pub fn suggest(
    title: &str,
    label: Option<&str>,
    clients: &[Client],
    mappings: &MappingSnapshot,
    weights: &MatchWeights,
) -> Vec<ClientSuggestion> {
    let mut suggestions = Vec::new();

    if let Some(label) = label {
        if let Some(client_id) = mappings.get(label) {
            if let Some(client) = clients.iter().find(|c| &c.id == client_id) {
                suggestions.push(ClientSuggestion {
                    client_id: client.id.clone(),
                    client_name: client.name.clone(),
                    confidence: Confidence::MAX,
                    reasons: vec![format!("\"{label}\" was previously linked to this client")],
                    source: MatchSource::ExistingMapping,
                });
            } else {
                tracing::debug!(%client_id, "mapping points at a client missing from the roster");
            }
        }
    }

    for candidate in auto_match(title, clients, SUGGEST_THRESHOLD, weights) {
        if suggestions.iter().any(|s| s.client_id == candidate.client_id) {
            continue;
        }
        suggestions.push(candidate);
    }

    suggestions
}

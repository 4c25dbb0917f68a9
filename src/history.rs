//! Codec for the correction ledgers
//!
//! A claim carries two append-only ledgers, each stored as a JSON array
//! of `{time, note}` records in a single column. The column is always
//! written as a full replacement of the list, never a patch. Decoding
//! is tolerant: a missing or malformed column yields an empty ledger so
//! reads never fail on old or foreign data.

use crate::claim::TimeStamp;
use crate::error::ClaimError;
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub time: TimeStamp<Utc>,
    pub note: String,
}

impl HistoryEntry {
    pub fn new(time: TimeStamp<Utc>, note: &str) -> Self {
        Self {
            time,
            note: note.to_string(),
        }
    }
}

/// Decode a stored ledger column. `None`, empty, or malformed input all
/// come back as an empty list.
pub fn decode(raw: Option<&str>) -> Vec<HistoryEntry> {
    match raw {
        Some(text) if !text.trim().is_empty() => match serde_json::from_str(text) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("discarding malformed history column: {e}");
                vec![]
            }
        },
        _ => vec![],
    }
}

/// Encode a full ledger for storage.
pub fn encode(entries: &[HistoryEntry]) -> Result<String, ClaimError> {
    serde_json::to_string(entries).map_err(|e| ClaimError::Codec(e.to_string()))
}

/// Read the stored ledger, push one entry, and return the replacement
/// column value. The caller holds the read and the write inside one
/// transaction, so the decoded list cannot go stale.
pub fn append(raw: Option<&str>, entry: HistoryEntry) -> Result<String, ClaimError> {
    let mut entries = decode(raw);
    entries.push(entry);
    encode(&entries)
}

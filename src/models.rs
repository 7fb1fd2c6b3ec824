//! Core data models for the Planning Center sync.
//!
//! Remote records as they come off the API, the deduplicated catalog built
//! from them, and the warnings produced while resolving per-song metadata.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Defaults
// ============================================================================

/// Tempo used when a song has no usable arrangement BPM
pub const DEFAULT_BPM: f64 = 80.0;

/// Pedal time-signature code for 4/4, used when nothing better is known
pub const DEFAULT_TIME_SIG: u8 = 3;

/// Title given to remote songs that carry no title attribute
pub const UNKNOWN_TITLE: &str = "Unknown Song";

// ============================================================================
// Remote records
// ============================================================================

/// A song as listed by the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSong {
    pub id: String,
    pub title: String,
}

/// Per-song arrangement detail. Only the first arrangement of a song is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Arrangement {
    /// Number, numeric string, empty string or null depending on who typed it in
    #[serde(default)]
    pub bpm: Option<Value>,
    #[serde(default)]
    pub time_signature: Option<String>,
}

/// What an arrangement says about tempo.
#[derive(Debug, Clone, PartialEq)]
pub enum BpmReading {
    /// Absent, null, empty or zero
    Missing,
    Value(f64),
    /// Present but not a finite number; carries the raw text
    Invalid(String),
}

impl Arrangement {
    pub fn bpm_reading(&self) -> BpmReading {
        match &self.bpm {
            None | Some(Value::Null) => BpmReading::Missing,
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) if v == 0.0 => BpmReading::Missing,
                Some(v) => BpmReading::Value(v),
                None => BpmReading::Invalid(n.to_string()),
            },
            Some(Value::String(s)) if s.is_empty() => BpmReading::Missing,
            Some(Value::String(s)) => match s.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => BpmReading::Value(v),
                _ => BpmReading::Invalid(s.clone()),
            },
            Some(other) => BpmReading::Invalid(other.to_string()),
        }
    }

    /// Time signature text, if non-empty.
    pub fn time_signature(&self) -> Option<&str> {
        self.time_signature.as_deref().filter(|s| !s.is_empty())
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// A remote song reduced to what the pedal needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub title: String,
    pub bpm: f64,
    pub time_sig: u8,
}

/// Non-fatal problems met while resolving a song's tempo and meter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatalogWarning {
    ArrangementFetch { title: String, error: String },
    BpmParse { title: String, raw: String },
}

impl std::fmt::Display for CatalogWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogWarning::ArrangementFetch { title, error } => {
                write!(f, "Could not fetch arrangements for {}: {}", title, error)
            }
            CatalogWarning::BpmParse { title, raw } => {
                write!(f, "Could not convert BPM value '{}' to number for song {}", raw, title)
            }
        }
    }
}

/// Title-keyed catalog that remembers discovery order.
///
/// Entries live in a Vec; the index maps title to position so lookups stay
/// O(1) while iteration follows the order songs were first seen.
#[derive(Debug, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    index: FxHashMap<String, usize>,
    warnings: Vec<CatalogWarning>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry unless its title is already known.
    /// Returns false when the title was taken (first seen wins).
    pub fn insert(&mut self, entry: CatalogEntry) -> bool {
        if self.index.contains_key(&entry.title) {
            return false;
        }
        self.index.insert(entry.title.clone(), self.entries.len());
        self.entries.push(entry);
        true
    }

    pub fn contains(&self, title: &str) -> bool {
        self.index.contains_key(title)
    }

    pub fn get(&self, title: &str) -> Option<&CatalogEntry> {
        self.index.get(title).map(|&i| &self.entries[i])
    }

    /// Entries in discovery order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push_warning(&mut self, warning: CatalogWarning) {
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[CatalogWarning] {
        &self.warnings
    }
}

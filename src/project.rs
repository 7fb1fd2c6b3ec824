//! Pedal project file load/save.
//!
//! The document and every song are kept as ordered JSON maps. The sync only
//! reads `name`, `bpm` and `metro_time_sig` and overwrites them in place, so
//! anything else (including key order and explicit nulls) is written back
//! exactly as it was read.

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const SONGS_KEY: &str = "songs";
const NAME_KEY: &str = "name";
const BPM_KEY: &str = "bpm";
const TIME_SIG_KEY: &str = "metro_time_sig";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Could not read project file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Project file '{}' is not a valid pedal project: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not serialize project: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Could not write project file '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProjectError {
    /// True for failures of the save step, false for load failures.
    pub fn is_save_error(&self) -> bool {
        matches!(self, ProjectError::Serialize(_) | ProjectError::Write { .. })
    }
}

/// One slot of the pedal's fixed-length song list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectSong {
    fields: Map<String, Value>,
}

impl ProjectSong {
    /// Slot name; load guarantees it is a string.
    pub fn name(&self) -> &str {
        self.fields
            .get(NAME_KEY)
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// Rename the slot, returning the previous name.
    pub fn set_name(&mut self, name: &str) -> String {
        let old = self.name().to_string();
        self.fields
            .insert(NAME_KEY.to_string(), Value::String(name.to_string()));
        old
    }

    pub fn bpm_f64(&self) -> Option<f64> {
        self.fields.get(BPM_KEY).and_then(Value::as_f64)
    }

    pub fn metro_time_sig(&self) -> Option<u64> {
        self.fields.get(TIME_SIG_KEY).and_then(Value::as_u64)
    }

    /// Any other key on the slot.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Overwrite tempo and meter; returns true if either value changed.
    pub fn set_tempo(&mut self, bpm: f64, time_sig: u8) -> bool {
        let changed =
            self.bpm_f64() != Some(bpm) || self.metro_time_sig() != Some(u64::from(time_sig));
        self.fields
            .insert(BPM_KEY.to_string(), Value::Number(bpm_number(bpm)));
        self.fields
            .insert(TIME_SIG_KEY.to_string(), Value::from(time_sig));
        changed
    }
}

/// Whole-number tempos are stored as integers, the rest as floats.
pub fn bpm_number(bpm: f64) -> Number {
    if bpm.fract() == 0.0 && (0.0..=u64::MAX as f64).contains(&bpm) {
        Number::from(bpm as u64)
    } else {
        Number::from_f64(bpm).unwrap_or_else(|| Number::from(0u64))
    }
}

/// The pedal companion app's project document.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectFile {
    /// Document as read; its `songs` entry is rebuilt from `songs` on save
    doc: Map<String, Value>,
    pub songs: Vec<ProjectSong>,
}

impl ProjectFile {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let mut doc: Map<String, Value> = serde_json::from_str(text)?;
        // Leave the key where it is so the document order survives
        let songs = doc
            .get_mut(SONGS_KEY)
            .map(Value::take)
            .ok_or_else(|| serde_json::Error::missing_field(SONGS_KEY))?;
        let songs: Vec<ProjectSong> = serde_json::from_value(songs)?;

        for (i, song) in songs.iter().enumerate() {
            if !matches!(song.get(NAME_KEY), Some(Value::String(_))) {
                return Err(serde_json::Error::custom(format!(
                    "song {} has no string \"name\"",
                    i
                )));
            }
        }

        Ok(Self { doc, songs })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut doc = self.doc.clone();
        // Existing key: replaced in place
        doc.insert(SONGS_KEY.to_string(), serde_json::to_value(&self.songs)?);
        serde_json::to_string(&doc)
    }

    /// Any top-level key other than the song list.
    pub fn get(&self, key: &str) -> Option<&Value> {
        if key == SONGS_KEY {
            return None;
        }
        self.doc.get(key)
    }
}

/// Load and parse a project file, keeping song order.
pub fn load_project(path: &Path) -> Result<ProjectFile, ProjectError> {
    let text = fs::read_to_string(path).map_err(|source| ProjectError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ProjectFile::from_json(&text).map_err(|source| ProjectError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize the project and overwrite `path`. Not atomic.
pub fn save_project(project: &ProjectFile, path: &Path) -> Result<(), ProjectError> {
    let text = project.to_json().map_err(ProjectError::Serialize)?;
    fs::write(path, text).map_err(|source| ProjectError::Write {
        path: path.to_path_buf(),
        source,
    })
}

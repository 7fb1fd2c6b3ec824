//! Merge the catalog into the pedal's song slots.
//!
//! Two linear passes over the slot list:
//! 1. update: every slot whose name is a catalog title gets that entry's
//!    tempo and meter. Several slots with the same name all match.
//! 2. fill: placeholder slots receive catalog entries that no slot matched,
//!    in discovery order, until either runs out.
//!
//! The slot list is never grown or shrunk.

use rustc_hash::FxHashSet;
use serde::Serialize;
use tracing::info;

use crate::models::{Catalog, CatalogEntry};
use crate::project::ProjectSong;

/// Unused slots are blank or keep the companion app's "Song N" default name.
pub fn is_placeholder(name: &str) -> bool {
    name.is_empty() || name.starts_with("Song ")
}

/// A slot whose name matched a catalog title.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotUpdate {
    pub slot: usize,
    pub title: String,
    pub bpm: f64,
    pub time_sig: u8,
    /// False when the slot already held these values
    pub changed: bool,
}

/// A placeholder slot that received a new song.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotFill {
    pub slot: usize,
    pub replaced: String,
    pub title: String,
    pub bpm: f64,
    pub time_sig: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeOutcome {
    pub updated: Vec<SlotUpdate>,
    pub added: Vec<SlotFill>,
    /// Catalog titles left without a slot, in discovery order
    pub not_added: Vec<String>,
}

impl MergeOutcome {
    /// Slots written by either pass
    pub fn slots_mutated(&self) -> usize {
        self.updated.len() + self.added.len()
    }

    /// Slots whose content actually differs from before the merge
    pub fn slots_changed(&self) -> usize {
        self.updated.iter().filter(|u| u.changed).count() + self.added.len()
    }
}

/// Run the update pass then the fill pass.
pub fn merge_catalog(catalog: &Catalog, songs: &mut [ProjectSong]) -> MergeOutcome {
    let mut placed: FxHashSet<&str> = FxHashSet::default();

    let updated = update_existing(catalog, songs, &mut placed);
    let added = fill_placeholders(catalog, songs, &mut placed);

    let not_added = catalog
        .entries()
        .iter()
        .filter(|e| !placed.contains(e.title.as_str()))
        .map(|e| e.title.clone())
        .collect();

    MergeOutcome {
        updated,
        added,
        not_added,
    }
}

fn update_existing<'c>(
    catalog: &'c Catalog,
    songs: &mut [ProjectSong],
    placed: &mut FxHashSet<&'c str>,
) -> Vec<SlotUpdate> {
    let mut updated = Vec::new();

    for (slot, song) in songs.iter_mut().enumerate() {
        // Matched against the whole catalog, not what is still unplaced
        let Some(entry) = catalog.get(song.name()) else {
            continue;
        };
        let changed = song.set_tempo(entry.bpm, entry.time_sig);
        placed.insert(entry.title.as_str());
        info!(
            "Updated song: {} (BPM: {}, Time Sig: {})",
            entry.title, entry.bpm, entry.time_sig
        );
        updated.push(SlotUpdate {
            slot,
            title: entry.title.clone(),
            bpm: entry.bpm,
            time_sig: entry.time_sig,
            changed,
        });
    }

    updated
}

fn fill_placeholders<'c>(
    catalog: &'c Catalog,
    songs: &mut [ProjectSong],
    placed: &mut FxHashSet<&'c str>,
) -> Vec<SlotFill> {
    let pending: Vec<&'c CatalogEntry> = catalog
        .entries()
        .iter()
        .filter(|e| !placed.contains(e.title.as_str()))
        .collect();
    let mut pending = pending.into_iter();
    let mut added = Vec::new();

    for (slot, song) in songs.iter_mut().enumerate() {
        if !is_placeholder(song.name()) {
            continue;
        }
        let Some(entry) = pending.next() else {
            break;
        };

        let replaced = song.set_name(&entry.title);
        song.set_tempo(entry.bpm, entry.time_sig);
        placed.insert(entry.title.as_str());
        info!(
            "Added new song: {} (BPM: {}, Time Sig: {})",
            entry.title, entry.bpm, entry.time_sig
        );
        added.push(SlotFill {
            slot,
            replaced,
            title: entry.title.clone(),
            bpm: entry.bpm,
            time_sig: entry.time_sig,
        });
    }

    added
}

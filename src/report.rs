//! End-of-run report.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::merge::{MergeOutcome, SlotFill, SlotUpdate};
use crate::models::{Catalog, CatalogWarning};

/// Unplaced titles listed before collapsing into "... and N more"
pub const NOT_ADDED_PREVIEW: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub catalog_size: usize,
    pub warnings: Vec<CatalogWarning>,
    pub updated: Vec<SlotUpdate>,
    pub added: Vec<SlotFill>,
    pub not_added: Vec<String>,
    pub slots_mutated: usize,
    pub slots_changed: usize,
    /// Where the project was written; `None` on a dry run
    pub saved_to: Option<PathBuf>,
}

impl SyncReport {
    pub fn new(catalog: &Catalog, outcome: MergeOutcome) -> Self {
        Self {
            catalog_size: catalog.len(),
            warnings: catalog.warnings().to_vec(),
            slots_mutated: outcome.slots_mutated(),
            slots_changed: outcome.slots_changed(),
            updated: outcome.updated,
            added: outcome.added,
            not_added: outcome.not_added,
            saved_to: None,
        }
    }

    /// First titles that found no slot, and how many more were left out.
    pub fn not_added_preview(&self) -> (&[String], usize) {
        let shown = self.not_added.len().min(NOT_ADDED_PREVIEW);
        (&self.not_added[..shown], self.not_added.len() - shown)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Sync complete! Updated {} songs ({} changed, {} added).",
            self.slots_mutated,
            self.slots_changed,
            self.added.len()
        )?;
        writeln!(f, "  Catalog songs: {}", self.catalog_size)?;
        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings: {}", self.warnings.len())?;
        }
        match &self.saved_to {
            Some(path) => writeln!(f, "  Saved to: {}", path.display())?,
            None => writeln!(f, "  Dry run: project file not written")?,
        }

        let (shown, remaining) = self.not_added_preview();
        if !shown.is_empty() {
            writeln!(
                f,
                "\n{} PCO songs weren't added (no more slots available). First {}:",
                self.not_added.len(),
                shown.len()
            )?;
            for title in shown {
                writeln!(f, "- {}", title)?;
            }
            if remaining > 0 {
                writeln!(f, "... and {} more", remaining)?;
            }
        }
        Ok(())
    }
}

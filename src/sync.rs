//! One sync run: build the catalog, merge it into the project.
//!
//! Saving is left to the caller so nothing is written unless the whole
//! catalog was fetched.

use tracing::info;

use crate::catalog::{build_catalog, CatalogError, SongCatalog};
use crate::merge::merge_catalog;
use crate::progress::ProgressMode;
use crate::project::ProjectFile;
use crate::report::SyncReport;

pub fn sync_project<C: SongCatalog + ?Sized>(
    client: &C,
    project: &mut ProjectFile,
    max_songs: usize,
    mode: ProgressMode,
) -> Result<SyncReport, CatalogError> {
    info!("Fetching songs from Planning Center Online...");
    let catalog = build_catalog(client, max_songs, mode)?;
    let outcome = merge_catalog(&catalog, &mut project.songs);
    Ok(SyncReport::new(&catalog, outcome))
}

//! Remote catalog access and catalog building.
//!
//! `SongCatalog` is the seam between the merge logic and the network. The
//! Planning Center implementation lives in `pco`; tests use an in-memory fake.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{
    Arrangement, BpmReading, Catalog, CatalogEntry, CatalogWarning, RemoteSong, DEFAULT_BPM,
};
use crate::progress::{CatalogProgress, ProgressMode};
use crate::time_signature::normalize_time_signature;

/// Page size hint passed to the remote enumeration
pub const PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Authentication failed (HTTP 401)")]
    Unauthorized,

    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Could not decode API response: {0}")]
    Decode(String),
}

impl CatalogError {
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, CatalogError::Unauthorized)
    }
}

/// One page of remote songs plus the cursor for the next one.
#[derive(Debug, Clone, Default)]
pub struct SongPage {
    pub songs: Vec<RemoteSong>,
    /// Opaque cursor; `None` on the last page
    pub next: Option<String>,
}

pub trait SongCatalog {
    /// Fetch a page of songs. `cursor` is `None` for the first page.
    fn song_page(&self, cursor: Option<&str>, per_page: usize) -> Result<SongPage, CatalogError>;

    /// Fetch all arrangements of a song.
    fn arrangements(&self, song_id: &str) -> Result<Vec<Arrangement>, CatalogError>;
}

/// Lazily walks the remote song list.
///
/// A page is only requested once the previous one is drained, so a caller
/// that stops early never triggers further requests.
pub struct SongPages<'a, C: SongCatalog + ?Sized> {
    client: &'a C,
    per_page: usize,
    buffer: std::vec::IntoIter<RemoteSong>,
    cursor: Option<String>,
    started: bool,
    done: bool,
}

impl<'a, C: SongCatalog + ?Sized> SongPages<'a, C> {
    pub fn new(client: &'a C, per_page: usize) -> Self {
        Self {
            client,
            per_page,
            buffer: Vec::new().into_iter(),
            cursor: None,
            started: false,
            done: false,
        }
    }
}

impl<C: SongCatalog + ?Sized> Iterator for SongPages<'_, C> {
    type Item = Result<RemoteSong, CatalogError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(song) = self.buffer.next() {
                return Some(Ok(song));
            }
            if self.done {
                return None;
            }

            let cursor = if self.started {
                match self.cursor.take() {
                    Some(c) => Some(c),
                    None => {
                        self.done = true;
                        return None;
                    }
                }
            } else {
                None
            };
            self.started = true;

            match self.client.song_page(cursor.as_deref(), self.per_page) {
                Ok(page) => {
                    debug!("Fetched page of {} songs", page.songs.len());
                    self.done = page.next.is_none();
                    self.cursor = page.next;
                    self.buffer = page.songs.into_iter();
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Reduce a song and its arrangement lookup to a catalog entry.
///
/// Fetch failures and unreadable BPMs fall back to defaults and come back
/// as warnings; they never fail the song.
pub fn resolve_entry(
    title: &str,
    arrangements: Result<Vec<Arrangement>, CatalogError>,
) -> (CatalogEntry, Vec<CatalogWarning>) {
    let mut warnings = Vec::new();
    let mut bpm = DEFAULT_BPM;
    let mut time_sig = normalize_time_signature(None);

    match arrangements {
        Ok(arrangements) => {
            if let Some(first) = arrangements.first() {
                match first.bpm_reading() {
                    BpmReading::Value(v) => bpm = v,
                    BpmReading::Missing => {}
                    BpmReading::Invalid(raw) => warnings.push(CatalogWarning::BpmParse {
                        title: title.to_string(),
                        raw,
                    }),
                }
                if let Some(ts) = first.time_signature() {
                    time_sig = normalize_time_signature(Some(ts));
                }
            }
        }
        Err(e) => warnings.push(CatalogWarning::ArrangementFetch {
            title: title.to_string(),
            error: e.to_string(),
        }),
    }

    let entry = CatalogEntry {
        title: title.to_string(),
        bpm,
        time_sig,
    };
    (entry, warnings)
}

/// Build the title-deduplicated catalog from up to `max_songs` distinct titles.
///
/// Any enumeration failure aborts; arrangement failures only degrade the
/// affected song to defaults.
pub fn build_catalog<C: SongCatalog + ?Sized>(
    client: &C,
    max_songs: usize,
    mode: ProgressMode,
) -> Result<Catalog, CatalogError> {
    let mut catalog = Catalog::new();
    let mut progress = CatalogProgress::new(max_songs as u64, mode);
    let mut pages = SongPages::new(client, PAGE_SIZE);

    while catalog.len() < max_songs {
        let song = match pages.next() {
            Some(song) => song?,
            None => break,
        };

        if catalog.contains(&song.title) {
            debug!("Skipping duplicate title: {} (ID: {})", song.title, song.id);
            continue;
        }

        debug!(
            "Processing song [{}]: {} (ID: {})",
            catalog.len() + 1,
            song.title,
            song.id
        );

        let (entry, warnings) = resolve_entry(&song.title, client.arrangements(&song.id));
        for warning in warnings {
            warn!("{}", warning);
            catalog.push_warning(warning);
        }
        debug!(
            "Found: {} (BPM: {}, Time Sig: {})",
            entry.title, entry.bpm, entry.time_sig
        );
        catalog.insert(entry);

        progress.song_added();
    }

    if max_songs > 0 && catalog.len() >= max_songs {
        info!("Reached maximum song limit ({}).", max_songs);
    }
    progress.finish();
    info!("Fetched {} songs from Planning Center Online.", catalog.len());

    Ok(catalog)
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pages_walk_all_pages() {
        let fake = FakeCatalog::new(vec![
            vec![song("1", "A"), song("2", "B")],
            vec![],
            vec![song("3", "C")],
        ]);
        let titles: Vec<String> = SongPages::new(&fake, 2)
            .map(|s| s.unwrap().title)
            .collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
        assert_eq!(fake.page_calls.get(), 3);
    }

    #[test]
    fn test_pages_are_lazy() {
        let fake = FakeCatalog::new(vec![vec![song("1", "A")], vec![song("2", "B")]]);
        let mut pages = SongPages::new(&fake, 1);
        assert_eq!(pages.next().unwrap().unwrap().title, "A");
        assert_eq!(fake.page_calls.get(), 1);
    }

    #[test]
    fn test_pages_stop_after_error() {
        let mut fake = FakeCatalog::new(vec![vec![song("1", "A")]]);
        fake.page_error = Some(CatalogError::Unauthorized);
        let mut pages = SongPages::new(&fake, 1);
        assert!(pages.next().unwrap().unwrap_err().is_auth_failure());
        assert!(pages.next().is_none());
        assert_eq!(fake.page_calls.get(), 1);
    }

    #[test]
    fn test_resolve_entry_from_first_arrangement() {
        let (entry, warnings) = resolve_entry(
            "Amazing Grace",
            Ok(vec![
                arrangement(json!("72"), Some("3/4")),
                arrangement(json!(140), Some("6/8")),
            ]),
        );
        assert_eq!(entry.bpm, 72.0);
        assert_eq!(entry.time_sig, 2);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_resolve_entry_defaults() {
        let (entry, warnings) = resolve_entry("Quiet", Ok(vec![]));
        assert_eq!(entry.bpm, 80.0);
        assert_eq!(entry.time_sig, 3);
        assert!(warnings.is_empty());

        let (entry, _) = resolve_entry("Sparse", Ok(vec![Arrangement::default()]));
        assert_eq!(entry.bpm, 80.0);
        assert_eq!(entry.time_sig, 3);
    }

    #[test]
    fn test_resolve_entry_bad_bpm_warns() {
        let (entry, warnings) =
            resolve_entry("Odd", Ok(vec![arrangement(json!("about 90"), Some("4/4"))]));
        assert_eq!(entry.bpm, 80.0);
        assert_eq!(entry.time_sig, 3);
        assert_eq!(
            warnings,
            vec![CatalogWarning::BpmParse {
                title: "Odd".to_string(),
                raw: "about 90".to_string(),
            }]
        );
    }

    #[test]
    fn test_resolve_entry_fetch_failure_warns() {
        let (entry, warnings) = resolve_entry(
            "Gone",
            Err(CatalogError::Status {
                status: 404,
                body: "not found".to_string(),
            }),
        );
        assert_eq!(entry.bpm, 80.0);
        assert_eq!(entry.time_sig, 3);
        assert!(matches!(warnings[0], CatalogWarning::ArrangementFetch { .. }));
    }

    #[test]
    fn test_build_catalog_dedups_by_title() {
        let fake = FakeCatalog::new(vec![vec![
            song("10", "Amazing Grace"),
            song("11", "Amazing Grace"),
        ]])
        .with_arrangements("10", vec![arrangement(json!(72), Some("3/4"))])
        .with_arrangements("11", vec![arrangement(json!(100), Some("4/4"))]);

        let catalog = build_catalog(&fake, 128, ProgressMode::Hidden).unwrap();
        assert_eq!(catalog.len(), 1);
        let entry = catalog.get("Amazing Grace").unwrap();
        assert_eq!(entry.bpm, 72.0);
        assert_eq!(entry.time_sig, 2);
        // The duplicate is skipped before its arrangements are fetched
        assert_eq!(fake.arrangement_calls.get(), 1);
    }

    #[test]
    fn test_build_catalog_respects_cap() {
        let fake = FakeCatalog::new(vec![
            vec![song("1", "A"), song("2", "B"), song("3", "C")],
            vec![song("4", "D"), song("5", "E")],
        ]);
        let catalog = build_catalog(&fake, 1, ProgressMode::Hidden).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.entries()[0].title, "A");
        assert_eq!(fake.page_calls.get(), 1);
        assert_eq!(fake.arrangement_calls.get(), 1);
    }

    #[test]
    fn test_build_catalog_duplicates_do_not_count_toward_cap() {
        let fake = FakeCatalog::new(vec![vec![song("1", "A"), song("2", "A"), song("3", "B")]]);
        let catalog = build_catalog(&fake, 2, ProgressMode::Hidden).unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_build_catalog_zero_cap_fetches_nothing() {
        let fake = FakeCatalog::new(vec![vec![song("1", "A")]]);
        let catalog = build_catalog(&fake, 0, ProgressMode::Hidden).unwrap();
        assert!(catalog.is_empty());
        assert_eq!(fake.page_calls.get(), 0);
    }

    #[test]
    fn test_build_catalog_arrangement_error_is_not_fatal() {
        let fake = FakeCatalog::new(vec![vec![song("1", "A"), song("2", "B")]])
            .with_arrangement_error("1", CatalogError::Transport("reset".to_string()))
            .with_arrangements("2", vec![arrangement(json!("bogus"), None)]);
        let catalog = build_catalog(&fake, 128, ProgressMode::Hidden).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.warnings().len(), 2);
        assert_eq!(catalog.get("A").unwrap().bpm, 80.0);
    }

    #[test]
    fn test_build_catalog_enumeration_error_aborts() {
        let mut fake = FakeCatalog::new(vec![vec![song("1", "A")]]);
        fake.page_error = Some(CatalogError::Unauthorized);
        let err = build_catalog(&fake, 128, ProgressMode::Hidden).unwrap_err();
        assert!(err.is_auth_failure());
    }
}

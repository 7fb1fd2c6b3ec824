//! Planning Center Services API client.
//!
//! Blocking HTTP with basic auth (application id + secret). Responses are
//! JSON:API documents; only the attributes the sync needs are decoded.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::catalog::{CatalogError, SongCatalog, SongPage};
use crate::config::PcoCredentials;
use crate::models::{Arrangement, RemoteSong, UNKNOWN_TITLE};

const PCO_BASE_URL: &str = "https://api.planningcenteronline.com";
const USER_AGENT: &str = concat!("pco-pedal-sync/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct Links {
    next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SongAttributes {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SongResource {
    id: String,
    #[serde(default)]
    attributes: SongAttributes,
}

#[derive(Debug, Deserialize)]
struct SongDocument {
    #[serde(default)]
    data: Option<Vec<SongResource>>,
    #[serde(default)]
    links: Option<Links>,
}

#[derive(Debug, Deserialize)]
struct ArrangementResource {
    #[serde(default)]
    attributes: Arrangement,
}

#[derive(Debug, Deserialize)]
struct ArrangementDocument {
    #[serde(default)]
    data: Option<Vec<ArrangementResource>>,
}

/// Decode a `/services/v2/songs` page. `next` is the absolute URL of the
/// following page.
pub fn parse_song_page(body: &str) -> Result<SongPage, CatalogError> {
    let doc: SongDocument =
        serde_json::from_str(body).map_err(|e| CatalogError::Decode(e.to_string()))?;
    let songs = doc
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|r| RemoteSong {
            id: r.id,
            title: r.attributes.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        })
        .collect();
    let next = doc.links.and_then(|l| l.next);
    Ok(SongPage { songs, next })
}

/// Decode a `/services/v2/songs/{id}/arrangements` response.
pub fn parse_arrangements(body: &str) -> Result<Vec<Arrangement>, CatalogError> {
    let doc: ArrangementDocument =
        serde_json::from_str(body).map_err(|e| CatalogError::Decode(e.to_string()))?;
    Ok(doc
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|r| r.attributes)
        .collect())
}

// ============================================================================
// Client
// ============================================================================

pub struct PcoClient {
    http: Client,
    credentials: PcoCredentials,
}

impl PcoClient {
    pub fn new(credentials: PcoCredentials) -> Result<Self, CatalogError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| CatalogError::Transport(e.to_string()))?;
        Ok(Self { http, credentials })
    }

    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<String, CatalogError> {
        debug!(url = %url, "Querying Planning Center API");

        let response = self
            .http
            .get(url)
            .basic_auth(&self.credentials.app_id, Some(&self.credentials.secret))
            .query(query)
            .send()
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| CatalogError::Transport(e.to_string()))?;
        check_status(status, body)
    }
}

/// Map a response status to the body on success, or to a typed error.
/// 401 gets its own variant so callers can point at the credentials.
pub fn check_status(status: StatusCode, body: String) -> Result<String, CatalogError> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(CatalogError::Unauthorized);
    }
    if !status.is_success() {
        return Err(CatalogError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

impl SongCatalog for PcoClient {
    fn song_page(&self, cursor: Option<&str>, per_page: usize) -> Result<SongPage, CatalogError> {
        let body = match cursor {
            // links.next already carries per_page and offset
            Some(url) => self.get(url, &[])?,
            None => self.get(
                &format!("{}/services/v2/songs", PCO_BASE_URL),
                &[("per_page", per_page.to_string())],
            )?,
        };
        parse_song_page(&body)
    }

    fn arrangements(&self, song_id: &str) -> Result<Vec<Arrangement>, CatalogError> {
        let url = format!("{}/services/v2/songs/{}/arrangements", PCO_BASE_URL, song_id);
        parse_arrangements(&self.get(&url, &[])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BpmReading;

    const SONGS_PAGE: &str = r#"{
        "links": {
            "self": "https://api.planningcenteronline.com/services/v2/songs?per_page=2",
            "next": "https://api.planningcenteronline.com/services/v2/songs?offset=2&per_page=2"
        },
        "data": [
            {"type": "Song", "id": "101", "attributes": {"title": "Amazing Grace", "author": "John Newton"}},
            {"type": "Song", "id": "102", "attributes": {"ccli_number": 12345}}
        ],
        "included": [],
        "meta": {"total_count": 3, "count": 2, "next": {"offset": 2}}
    }"#;

    const LAST_PAGE: &str = r#"{
        "links": {"self": "https://api.planningcenteronline.com/services/v2/songs?offset=2&per_page=2"},
        "data": [{"type": "Song", "id": "103", "attributes": {"title": "Be Thou My Vision"}}],
        "meta": {"total_count": 3, "count": 1}
    }"#;

    const ARRANGEMENTS: &str = r#"{
        "data": [
            {"type": "Arrangement", "id": "9", "attributes": {"name": "Default", "bpm": 72.0, "time_signature": "3/4"}},
            {"type": "Arrangement", "id": "10", "attributes": {"name": "Fast", "bpm": null, "time_signature": null}}
        ]
    }"#;

    #[test]
    fn test_parse_song_page() {
        let page = parse_song_page(SONGS_PAGE).unwrap();
        assert_eq!(page.songs.len(), 2);
        assert_eq!(page.songs[0].id, "101");
        assert_eq!(page.songs[0].title, "Amazing Grace");
        assert_eq!(page.songs[1].title, "Unknown Song");
        assert!(page.next.unwrap().contains("offset=2"));
    }

    #[test]
    fn test_parse_last_page_has_no_next() {
        let page = parse_song_page(LAST_PAGE).unwrap();
        assert_eq!(page.songs.len(), 1);
        assert!(page.next.is_none());
    }

    #[test]
    fn test_parse_arrangements() {
        let arrangements = parse_arrangements(ARRANGEMENTS).unwrap();
        assert_eq!(arrangements.len(), 2);
        assert_eq!(arrangements[0].bpm_reading(), BpmReading::Value(72.0));
        assert_eq!(arrangements[0].time_signature(), Some("3/4"));
        assert_eq!(arrangements[1].bpm_reading(), BpmReading::Missing);
    }

    #[test]
    fn test_parse_empty_and_null_data() {
        assert!(parse_arrangements(r#"{"data": []}"#).unwrap().is_empty());
        assert!(parse_arrangements(r#"{"data": null}"#).unwrap().is_empty());
        assert!(parse_song_page(r#"{"data": []}"#).unwrap().songs.is_empty());
    }

    #[test]
    fn test_check_status_success_returns_body() {
        assert_eq!(
            check_status(StatusCode::OK, "{}".to_string()).unwrap(),
            "{}"
        );
    }

    #[test]
    fn test_check_status_401_is_auth_failure() {
        let err = check_status(
            StatusCode::UNAUTHORIZED,
            r#"{"errors":[{"status":"401"}]}"#.to_string(),
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::Unauthorized));
        assert!(err.is_auth_failure());
    }

    #[test]
    fn test_check_status_other_errors_keep_status_and_body() {
        let err = check_status(StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string()).unwrap_err();
        assert!(!err.is_auth_failure());
        match err {
            CatalogError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            check_status(StatusCode::FORBIDDEN, String::new()),
            Err(CatalogError::Status { status: 403, .. })
        ));
    }

    #[test]
    fn test_parse_garbage_is_decode_error() {
        assert!(matches!(
            parse_song_page("<html>oops</html>"),
            Err(CatalogError::Decode(_))
        ));
    }
}

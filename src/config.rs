//! Planning Center credentials from `config.ini`.

use ini::{Ini, ParseOption};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Section holding the credentials
pub const SECTION: &str = "pco";

pub const APP_ID_KEY: &str = "app_id";
pub const SECRET_KEY: &str = "secret";

/// Shown whenever the config cannot be used
pub const EXAMPLE_CONFIG: &str = "[pco]\napp_id = YOUR_PCO_APP_ID\nsecret = YOUR_PCO_SECRET";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file '{}' not found", .0.display())]
    NotFound(PathBuf),

    #[error("Could not read config file '{}': {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("'{0}' section not found in config file")]
    SectionMissing(String),

    #[error("'{key}' not found in '{section}' section of config file")]
    KeyMissing { section: String, key: String },
}

/// Application id and secret for HTTP basic auth. Not masked anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcoCredentials {
    pub app_id: String,
    pub secret: String,
}

/// Values are taken verbatim: quotes and backslashes are part of a secret.
fn parse_option() -> ParseOption {
    ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..Default::default()
    }
}

/// Load credentials from an INI file.
pub fn load_credentials(path: &Path) -> Result<PcoCredentials, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let ini =
        Ini::load_from_file_opt(path, parse_option()).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
    credentials_from_ini(&ini)
}

/// Pull the two required keys out of an already parsed document. Key names
/// match case-insensitively; the section name must be exactly `pco`.
pub fn credentials_from_ini(ini: &Ini) -> Result<PcoCredentials, ConfigError> {
    let section = ini
        .section(Some(SECTION))
        .ok_or_else(|| ConfigError::SectionMissing(SECTION.to_string()))?;

    let get = |key: &str| {
        section
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.to_string())
            .ok_or_else(|| ConfigError::KeyMissing {
                section: SECTION.to_string(),
                key: key.to_string(),
            })
    };

    Ok(PcoCredentials {
        app_id: get(APP_ID_KEY)?,
        secret: get(SECRET_KEY)?,
    })
}

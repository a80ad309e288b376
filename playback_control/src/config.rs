//! `config.ini` loading.
//!
//! ```ini
//! [spotify]
//! client_id     = ...
//! client_secret = ...
//! redirect_uri  = http://localhost:8888/callback
//! scope         = user-read-playback-state user-modify-playback-state user-library-modify
//! ```

use std::path::Path;

use ini::Ini;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config.ini";

/// Scopes every gesture action needs; used when `scope` is absent.
pub const DEFAULT_SCOPE: &str =
    "user-read-playback-state user-modify-playback-state user-library-modify";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot load {path}: {message}")]
    Load { path: String, message: String },

    #[error("missing [spotify] section")]
    MissingSection,

    #[error("missing key `{0}` in [spotify]")]
    MissingKey(&'static str),
}

/// Spotify application credentials.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpotifyConfig {
    pub client_id:     String,
    pub client_secret: String,
    pub redirect_uri:  String,
    pub scope:         String,
}

impl SpotifyConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Load {
            path:    path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Load {
            path:    "<string>".to_string(),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let section = ini.section(Some("spotify")).ok_or(ConfigError::MissingSection)?;
        let required = |key: &'static str| {
            section
                .get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingKey(key))
        };

        Ok(SpotifyConfig {
            client_id:     required("client_id")?,
            client_secret: required("client_secret")?,
            redirect_uri:  required("redirect_uri")?,
            scope:         section
                .get("scope")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = "\
[spotify]
client_id = abc
client_secret = s3cret
redirect_uri = http://localhost:8888/callback
scope = user-read-playback-state
";

    #[test]
    fn parses_all_keys() {
        let cfg = SpotifyConfig::parse(FULL).unwrap();
        assert_eq!(cfg.client_id, "abc");
        assert_eq!(cfg.client_secret, "s3cret");
        assert_eq!(cfg.redirect_uri, "http://localhost:8888/callback");
        assert_eq!(cfg.scope, "user-read-playback-state");
    }

    #[test]
    fn scope_falls_back_to_default() {
        let text = "[spotify]\nclient_id=a\nclient_secret=b\nredirect_uri=http://x/cb\n";
        assert_eq!(SpotifyConfig::parse(text).unwrap().scope, DEFAULT_SCOPE);
    }

    #[test]
    fn missing_section_is_reported() {
        assert!(matches!(SpotifyConfig::parse("[other]\nx=1\n"), Err(ConfigError::MissingSection)));
    }

    #[test]
    fn missing_key_is_named() {
        let text = "[spotify]\nclient_id=a\nredirect_uri=http://x/cb\n";
        assert!(matches!(
            SpotifyConfig::parse(text),
            Err(ConfigError::MissingKey("client_secret"))
        ));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = SpotifyConfig::load("/definitely/not/here/config.ini").unwrap_err();
        assert!(matches!(err, ConfigError::Load { .. }));
    }
}

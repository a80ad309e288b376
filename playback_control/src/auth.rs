//! One-time authorization-code handshake with the Spotify accounts
//! service, plus an on-disk token cache.
//!
//! First run: print the authorize URL, the user grants access in a
//! browser and pastes back the URL they were redirected to, the `code` in
//! it is exchanged for an access/refresh token pair, and the pair is
//! written to [`DEFAULT_CACHE_PATH`].  Later runs reuse the cached token,
//! refreshing it when it has expired.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::blocking::Client;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SpotifyConfig;

pub const AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
pub const TOKEN_URL:     &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_CACHE_PATH: &str = ".spotify_caches/cache";

/// Refresh this many seconds before the token actually expires.
const EXPIRY_MARGIN_SECS: u64 = 60;

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token endpoint returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("authorization denied: {0}")]
    Denied(String),

    #[error("no authorization code in {0:?}")]
    MissingCode(String),

    #[error("token has no refresh token; re-authorize")]
    NoRefreshToken,

    #[error("token cache I/O: {0}")]
    CacheIo(#[from] io::Error),

    #[error("token cache is corrupt: {0}")]
    CacheFormat(#[from] serde_json::Error),
}

// ════════════════════════════════════════════════════════════════════════════
// Token
// ════════════════════════════════════════════════════════════════════════════

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// An access token and what is needed to renew it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token:  String,
    pub refresh_token: Option<String>,
    /// Unix seconds.
    pub expires_at:    u64,
    #[serde(default)]
    pub scope:         String,
}

impl Token {
    pub fn is_expired(&self, now: u64) -> bool {
        now + EXPIRY_MARGIN_SECS >= self.expires_at
    }
}

/// Token endpoint reply.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token:  String,
    expires_in:    u64,
    refresh_token: Option<String>,
    #[serde(default)]
    scope:         Option<String>,
}

impl TokenResponse {
    fn into_token(self, now: u64, previous_refresh: Option<String>) -> Token {
        Token {
            access_token:  self.access_token,
            // Refresh replies usually omit the refresh token; keep the old one.
            refresh_token: self.refresh_token.or(previous_refresh),
            expires_at:    now + self.expires_in,
            scope:         self.scope.unwrap_or_default(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TokenCache
// ════════════════════════════════════════════════════════════════════════════

/// JSON file holding the last token.
#[derive(Clone, Debug)]
pub struct TokenCache {
    path: PathBuf,
}

impl Default for TokenCache {
    fn default() -> Self { TokenCache::new(DEFAULT_CACHE_PATH) }
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self { TokenCache { path: path.into() } }

    pub fn path(&self) -> &Path { &self.path }

    /// `Ok(None)` when nothing has been cached yet.
    pub fn load(&self) -> Result<Option<Token>, AuthError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn store(&self, token: &Token) -> Result<(), AuthError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(token)?)?;
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// OAuth
// ════════════════════════════════════════════════════════════════════════════

/// Extract the `code` query parameter from the URL the browser was
/// redirected to.
pub fn parse_response_code(redirected: &str) -> Result<String, AuthError> {
    let url = Url::parse(redirected.trim())
        .map_err(|_| AuthError::MissingCode(redirected.trim().to_string()))?;
    let mut code = None;
    for (k, v) in url.query_pairs() {
        match k.as_ref() {
            "code"  => code = Some(v.into_owned()),
            "error" => return Err(AuthError::Denied(v.into_owned())),
            _ => {}
        }
    }
    code.ok_or_else(|| AuthError::MissingCode(redirected.trim().to_string()))
}

/// Authorization-code flow against the Spotify accounts service.
pub struct OAuth {
    config: SpotifyConfig,
    cache:  TokenCache,
    http:   Client,
}

impl OAuth {
    pub fn new(config: SpotifyConfig, cache: TokenCache) -> Self {
        OAuth { config, cache, http: Client::new() }
    }

    pub fn cache(&self) -> &TokenCache { &self.cache }

    /// URL the user opens to grant access.
    pub fn authorize_url(&self) -> String {
        Url::parse_with_params(AUTHORIZE_URL, &[
            ("client_id",     self.config.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri",  self.config.redirect_uri.as_str()),
            ("scope",         self.config.scope.as_str()),
        ])
        .map(String::from)
        .unwrap_or_else(|_| AUTHORIZE_URL.to_string())
    }

    pub fn exchange_code(&self, code: &str) -> Result<Token, AuthError> {
        let token = self.request_token(&[
            ("grant_type",   "authorization_code"),
            ("code",         code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ], None)?;
        self.cache.store(&token)?;
        Ok(token)
    }

    pub fn refresh(&self, token: &Token) -> Result<Token, AuthError> {
        let refresh = token.refresh_token.as_deref().ok_or(AuthError::NoRefreshToken)?;
        let renewed = self.request_token(&[
            ("grant_type",    "refresh_token"),
            ("refresh_token", refresh),
        ], token.refresh_token.clone())?;
        self.cache.store(&renewed)?;
        log::info!("access token refreshed");
        Ok(renewed)
    }

    fn request_token(
        &self,
        form: &[(&str, &str)],
        previous_refresh: Option<String>,
    ) -> Result<Token, AuthError> {
        let resp = self.http
            .post(TOKEN_URL)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(form)
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(AuthError::Rejected { status: status.as_u16(), body });
        }
        let reply: TokenResponse = resp.json()?;
        Ok(reply.into_token(unix_now(), previous_refresh))
    }

    /// Return a usable token: the cached one (refreshed if stale) or, on
    /// first run, one obtained through the interactive handshake.
    /// `prompt` shows the authorize URL and returns the redirected URL.
    pub fn authorize_interactive(
        &self,
        prompt: impl FnOnce(&str) -> String,
    ) -> Result<Token, AuthError> {
        match self.cache.load() {
            Ok(Some(token)) if !token.is_expired(unix_now()) => return Ok(token),
            Ok(Some(token)) => match self.refresh(&token) {
                Ok(t)  => return Ok(t),
                Err(e) => log::warn!("cached token could not be refreshed: {}", e),
            },
            Ok(None) => {}
            Err(e)   => log::warn!("ignoring token cache {}: {}", self.cache.path().display(), e),
        }

        let redirected = prompt(&self.authorize_url());
        let code = parse_response_code(&redirected)?;
        self.exchange_code(&code)
    }
}

/// Console prompt for [`OAuth::authorize_interactive`].
pub fn stdin_prompt(authorize_url: &str) -> String {
    println!("Please authorize the application.");
    println!("Open this URL in your browser: {}", authorize_url);
    print!("Enter the URL you were redirected to: ");
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oauth(cache: TokenCache) -> OAuth {
        OAuth::new(
            SpotifyConfig {
                client_id:     "cid".into(),
                client_secret: "secret".into(),
                redirect_uri:  "http://localhost:8888/callback".into(),
                scope:         "user-read-playback-state user-library-modify".into(),
            },
            cache,
        )
    }

    fn token(expires_at: u64) -> Token {
        Token {
            access_token:  "acc".into(),
            refresh_token: Some("ref".into()),
            expires_at,
            scope:         String::new(),
        }
    }

    #[test]
    fn authorize_url_carries_client_and_scope() {
        let url = Url::parse(&oauth(TokenCache::default()).authorize_url()).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("client_id".into(), "cid".into())));
        assert!(pairs.contains(&("response_type".into(), "code".into())));
        assert!(pairs.contains(&("redirect_uri".into(), "http://localhost:8888/callback".into())));
        assert!(pairs.contains(&("scope".into(), "user-read-playback-state user-library-modify".into())));
    }

    #[test]
    fn code_is_parsed_from_redirect() {
        let code = parse_response_code("http://localhost:8888/callback?code=AQB42&state=x\n").unwrap();
        assert_eq!(code, "AQB42");
    }

    #[test]
    fn denied_redirect_is_an_error() {
        let err = parse_response_code("http://localhost:8888/callback?error=access_denied").unwrap_err();
        assert!(matches!(err, AuthError::Denied(ref e) if e == "access_denied"));
    }

    #[test]
    fn garbage_redirect_has_no_code() {
        assert!(matches!(parse_response_code("not a url"), Err(AuthError::MissingCode(_))));
    }

    #[test]
    fn expiry_uses_safety_margin() {
        let t = token(1_000);
        assert!(!t.is_expired(900));
        assert!(t.is_expired(950));
        assert!(t.is_expired(1_000));
    }

    #[test]
    fn refresh_reply_keeps_previous_refresh_token() {
        let reply = TokenResponse {
            access_token:  "new".into(),
            expires_in:    3600,
            refresh_token: None,
            scope:         None,
        };
        let t = reply.into_token(100, Some("old-ref".into()));
        assert_eq!(t.refresh_token.as_deref(), Some("old-ref"));
        assert_eq!(t.expires_at, 3700);
    }

    #[test]
    fn cache_round_trips_and_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::new(dir.path().join(".spotify_caches").join("cache"));
        assert_eq!(cache.load().unwrap(), None);
        cache.store(&token(42)).unwrap();
        assert_eq!(cache.load().unwrap(), Some(token(42)));
    }

    #[test]
    fn corrupt_cache_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(TokenCache::new(path).load(), Err(AuthError::CacheFormat(_))));
    }

    #[test]
    fn fresh_cached_token_skips_the_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::new(dir.path().join("cache"));
        let t = token(unix_now() + 3_600);
        cache.store(&t).unwrap();
        let got = oauth(cache)
            .authorize_interactive(|_| panic!("prompt must not be shown"))
            .unwrap();
        assert_eq!(got, t);
    }

    #[test]
    fn refreshing_without_refresh_token_fails_fast() {
        let t = Token { refresh_token: None, ..token(0) };
        assert!(matches!(oauth(TokenCache::default()).refresh(&t), Err(AuthError::NoRefreshToken)));
    }
}

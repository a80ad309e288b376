//! Spotify Web API playback client.
//!
//! Implements [`PlaybackClient`] with blocking HTTP calls.  The access
//! token is refreshed transparently when it has expired; every failure is
//! mapped onto [`ActionError`] so the dispatcher can log it and move on.

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::CONTENT_LENGTH;
use reqwest::Method;
use serde::Deserialize;

use gesture_core::{ActionError, PlaybackClient, PlaybackState};

use crate::auth::{unix_now, AuthError, OAuth, Token};

pub const API_BASE: &str = "https://api.spotify.com/v1";

// ════════════════════════════════════════════════════════════════════════════
// Wire types
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct CurrentPlayback {
    #[serde(default)]
    is_playing: bool,
    item:       Option<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeviceList {
    devices: Vec<Device>,
}

#[derive(Debug, Deserialize)]
struct Device {
    id: Option<String>,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

// ════════════════════════════════════════════════════════════════════════════
// Response parsing
// ════════════════════════════════════════════════════════════════════════════

/// `GET /me/player`.  204 means no active playback session.
pub fn parse_playback(status: u16, body: &str) -> Result<Option<PlaybackState>, ActionError> {
    if status == 204 || body.trim().is_empty() {
        return Ok(None);
    }
    let cp: CurrentPlayback = serde_json::from_str(body)
        .map_err(|e| ActionError::Other(format!("bad playback JSON: {}", e)))?;
    Ok(Some(PlaybackState {
        is_playing: cp.is_playing,
        item:       cp.item.and_then(|i| i.id),
    }))
}

/// `GET /me/player/devices` → device names.  Restricted devices come
/// without an id but still count as present.
pub fn parse_devices(body: &str) -> Result<Vec<String>, ActionError> {
    let list: DeviceList = serde_json::from_str(body)
        .map_err(|e| ActionError::Other(format!("bad devices JSON: {}", e)))?;
    Ok(list.devices.into_iter().map(|d| {
        log::debug!("device {:?} ({})", d.id, d.name);
        match (d.name.is_empty(), d.id) {
            (true, Some(id)) => id,
            (true, None)     => "unnamed device".to_string(),
            (false, _)       => d.name,
        }
    }).collect())
}

/// Map a non-2xx reply onto an [`ActionError`].
pub fn api_error(status: u16, body: &str) -> ActionError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string());
    match status {
        401 => ActionError::Auth(message),
        _   => ActionError::Api { status, message },
    }
}

fn auth_failure(e: AuthError) -> ActionError { ActionError::Auth(e.to_string()) }

fn transport(e: reqwest::Error) -> ActionError { ActionError::Transport(e.to_string()) }

// ════════════════════════════════════════════════════════════════════════════
// SpotifyClient
// ════════════════════════════════════════════════════════════════════════════

pub struct SpotifyClient {
    oauth:    OAuth,
    token:    Token,
    http:     Client,
    base_url: String,
}

impl SpotifyClient {
    pub fn new(oauth: OAuth, token: Token) -> Self {
        SpotifyClient { oauth, token, http: Client::new(), base_url: API_BASE.to_string() }
    }

    /// Authorize (interactively on first run) and build a client.
    pub fn connect(oauth: OAuth, prompt: impl FnOnce(&str) -> String) -> Result<Self, AuthError> {
        let token = oauth.authorize_interactive(prompt)?;
        Ok(SpotifyClient::new(oauth, token))
    }

    fn bearer(&mut self) -> Result<String, ActionError> {
        if self.token.is_expired(unix_now()) {
            self.token = self.oauth.refresh(&self.token).map_err(auth_failure)?;
        }
        Ok(self.token.access_token.clone())
    }

    fn request(&mut self, method: Method, path: &str) -> Result<RequestBuilder, ActionError> {
        let bearer = self.bearer()?;
        let url = format!("{}{}", self.base_url, path);
        Ok(self.http.request(method, url).bearer_auth(bearer))
    }

    fn send(req: RequestBuilder) -> Result<(u16, String), ActionError> {
        let resp: Response = req.send().map_err(transport)?;
        let status = resp.status().as_u16();
        let body = resp.text().map_err(transport)?;
        if !(200..300).contains(&status) {
            return Err(api_error(status, &body));
        }
        Ok((status, body))
    }

    /// Body-less PUT/POST command.
    fn command(&mut self, method: Method, path: &str) -> Result<(), ActionError> {
        let req = self.request(method, path)?.header(CONTENT_LENGTH, "0");
        Self::send(req).map(|_| ())
    }
}

impl PlaybackClient for SpotifyClient {
    fn current_playback(&mut self) -> Result<Option<PlaybackState>, ActionError> {
        let (status, body) = Self::send(self.request(Method::GET, "/me/player")?)?;
        parse_playback(status, &body)
    }

    fn devices(&mut self) -> Result<Vec<String>, ActionError> {
        let (_, body) = Self::send(self.request(Method::GET, "/me/player/devices")?)?;
        parse_devices(&body)
    }

    fn start_playback(&mut self) -> Result<(), ActionError> {
        self.command(Method::PUT, "/me/player/play")
    }

    fn pause_playback(&mut self) -> Result<(), ActionError> {
        self.command(Method::PUT, "/me/player/pause")
    }

    fn next_track(&mut self) -> Result<(), ActionError> {
        self.command(Method::POST, "/me/player/next")
    }

    fn previous_track(&mut self) -> Result<(), ActionError> {
        self.command(Method::POST, "/me/player/previous")
    }

    fn save_track(&mut self, track_id: &str) -> Result<(), ActionError> {
        let req = self.request(Method::PUT, "/me/tracks")?
            .query(&[("ids", track_id)])
            .header(CONTENT_LENGTH, "0");
        Self::send(req).map(|_| ())
    }
}

//! # playback_control
//!
//! The concrete capabilities behind the gesture dispatcher:
//!
//! | Module | Provides |
//! |---|---|
//! | [`config`]  | `config.ini` loading ([`SpotifyConfig`]) |
//! | [`auth`]    | authorization-code handshake and the on-disk [`TokenCache`] |
//! | [`spotify`] | [`SpotifyClient`], a [`PlaybackClient`] over the Spotify Web API |
//! | [`volume`]  | platform output-volume backends and [`volume::probe`] |
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use gesture_core::{Dispatcher, Gesture};
//! use playback_control::{connect, stdin_prompt, volume};
//! use std::time::Instant;
//!
//! let spotify = connect("config.ini", stdin_prompt).unwrap();
//! let mut dispatcher = Dispatcher::new(spotify, volume::probe());
//! dispatcher.process(Some(Gesture::OpenFist), Instant::now());
//! ```
//!
//! [`PlaybackClient`]: gesture_core::PlaybackClient

use std::path::Path;

use thiserror::Error;

pub mod auth;
pub mod config;
pub mod spotify;
pub mod volume;

pub use auth::{stdin_prompt, AuthError, OAuth, Token, TokenCache, DEFAULT_CACHE_PATH};
pub use config::{ConfigError, SpotifyConfig, DEFAULT_CONFIG_PATH};
pub use spotify::SpotifyClient;
pub use volume::{AppleScriptVolume, PulseAudioVolume};
#[cfg(target_os = "windows")]
pub use volume::EndpointVolume;

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Load credentials from `config_path`, authorize against the default
/// token cache, and return a ready client.
pub fn connect(
    config_path: impl AsRef<Path>,
    prompt: impl FnOnce(&str) -> String,
) -> Result<SpotifyClient, ConnectError> {
    let config = SpotifyConfig::load(config_path)?;
    let oauth = OAuth::new(config, TokenCache::default());
    let client = SpotifyClient::connect(oauth, prompt)?;
    log::info!("connected to Spotify");
    Ok(client)
}

//! Capabilities the dispatcher drives: a media-playback client and a
//! system volume control.
//!
//! Both are traits so the dispatcher can be built against the real
//! Spotify / OS backends (see `playback_control`) or against fakes in
//! tests.  Every call may fail independently; the dispatcher logs the
//! failure and carries on.

use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

/// Why a downstream action did not take effect.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActionError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("authorization error: {0}")]
    Auth(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("volume control is not supported on {0}")]
    NotSupported(String),

    #[error("{0}")]
    Other(String),
}

// ════════════════════════════════════════════════════════════════════════════
// Playback
// ════════════════════════════════════════════════════════════════════════════

/// Snapshot of the user's current playback.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlaybackState {
    pub is_playing: bool,
    /// Id of the active track, if any.
    pub item:       Option<String>,
}

/// A remote media-playback service.
pub trait PlaybackClient {
    /// `None` when the account has no active playback session at all.
    fn current_playback(&mut self) -> Result<Option<PlaybackState>, ActionError>;
    /// Names of the devices visible to the account, restricted ones included.
    fn devices(&mut self) -> Result<Vec<String>, ActionError>;
    fn start_playback(&mut self) -> Result<(), ActionError>;
    fn pause_playback(&mut self) -> Result<(), ActionError>;
    fn next_track(&mut self) -> Result<(), ActionError>;
    fn previous_track(&mut self) -> Result<(), ActionError>;
    /// Add a track to the user's saved ("liked") tracks.
    fn save_track(&mut self, track_id: &str) -> Result<(), ActionError>;
}

impl<T: PlaybackClient + ?Sized> PlaybackClient for Box<T> {
    fn current_playback(&mut self) -> Result<Option<PlaybackState>, ActionError> {
        (**self).current_playback()
    }
    fn devices(&mut self) -> Result<Vec<String>, ActionError>          { (**self).devices() }
    fn start_playback(&mut self) -> Result<(), ActionError>            { (**self).start_playback() }
    fn pause_playback(&mut self) -> Result<(), ActionError>            { (**self).pause_playback() }
    fn next_track(&mut self) -> Result<(), ActionError>                { (**self).next_track() }
    fn previous_track(&mut self) -> Result<(), ActionError>            { (**self).previous_track() }
    fn save_track(&mut self, id: &str) -> Result<(), ActionError>      { (**self).save_track(id) }
}

// ════════════════════════════════════════════════════════════════════════════
// Volume
// ════════════════════════════════════════════════════════════════════════════

/// System output volume.
pub trait VolumeControl {
    /// Change the volume by `delta` percentage points.  The absolute level
    /// is clamped to 0–100; the new level is returned.
    fn adjust_volume(&mut self, delta: i32) -> Result<u8, ActionError>;

    /// Short backend name for logs.
    fn backend_name(&self) -> &str;
}

impl<T: VolumeControl + ?Sized> VolumeControl for Box<T> {
    fn adjust_volume(&mut self, delta: i32) -> Result<u8, ActionError> { (**self).adjust_volume(delta) }
    fn backend_name(&self) -> &str                                     { (**self).backend_name() }
}

/// Clamp `current + delta` to the 0–100 volume range.
pub fn clamp_level(current: i32, delta: i32) -> u8 {
    current.saturating_add(delta).clamp(0, 100) as u8
}

// ════════════════════════════════════════════════════════════════════════════
// Null backends
// ════════════════════════════════════════════════════════════════════════════

/// Offline playback: logs each command and reports nothing playing.
#[derive(Debug, Default)]
pub struct LoggingPlayback {
    playing: bool,
}

impl PlaybackClient for LoggingPlayback {
    fn current_playback(&mut self) -> Result<Option<PlaybackState>, ActionError> {
        Ok(Some(PlaybackState { is_playing: self.playing, item: None }))
    }
    fn devices(&mut self) -> Result<Vec<String>, ActionError> {
        Ok(vec!["offline".to_string()])
    }
    fn start_playback(&mut self) -> Result<(), ActionError> {
        log::info!("[offline] start playback");
        self.playing = true;
        Ok(())
    }
    fn pause_playback(&mut self) -> Result<(), ActionError> {
        log::info!("[offline] pause playback");
        self.playing = false;
        Ok(())
    }
    fn next_track(&mut self) -> Result<(), ActionError> {
        log::info!("[offline] next track");
        Ok(())
    }
    fn previous_track(&mut self) -> Result<(), ActionError> {
        log::info!("[offline] previous track");
        Ok(())
    }
    fn save_track(&mut self, track_id: &str) -> Result<(), ActionError> {
        log::info!("[offline] save track {}", track_id);
        Ok(())
    }
}

/// Volume backend for platforms without one.
#[derive(Debug, Clone)]
pub struct NoVolume {
    pub platform: String,
}

impl Default for NoVolume {
    fn default() -> Self { NoVolume { platform: std::env::consts::OS.to_string() } }
}

impl VolumeControl for NoVolume {
    fn adjust_volume(&mut self, _delta: i32) -> Result<u8, ActionError> {
        Err(ActionError::NotSupported(self.platform.clone()))
    }
    fn backend_name(&self) -> &str { "none" }
}

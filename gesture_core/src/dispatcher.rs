//! Debounced action dispatcher.
//!
//! Consumes one classification per frame and decides whether it should
//! fire a downstream action.  A newly recognised gesture fires exactly
//! once, then is *held* for [`HOLD_DURATION`]: while held, re-detections
//! of the same gesture are ignored and its name stays on the overlay even
//! if the hand has already moved away.
//!
//! ```text
//!            ┌──────── same gesture / no hand ────────┐
//!            ▼                                        │
//!  Idle ──gesture G──▶ Holding(G, now+hold, acted) ───┘
//!   ▲   (fire G)         │          │
//!   │                    │          └─ different gesture H ─▶ Holding(H, …)  (fire H)
//!   └───── now ≥ expiry ─┘
//! ```
//!
//! The clock is injected: [`Dispatcher::process`] takes `now` so the
//! state machine can be driven deterministically.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Action |
//! |---|---|
//! | ClosedFist | start playback, unless already playing or no device is available |
//! | OpenFist | pause playback, unless already paused |
//! | ThumbsUp | save ("like") the current track, if there is one |
//! | PointingUp | volume +10 |
//! | PointingDown | volume −10 |
//! | PointingRight | next track |
//! | PointingLeft | previous track |

use std::time::{Duration, Instant};

use crate::actions::{ActionError, PlaybackClient, PlaybackState, VolumeControl};
use crate::classifier::Gesture;

/// How long a fired gesture suppresses repeats and stays on screen.
pub const HOLD_DURATION: Duration = Duration::from_secs(3);

/// Longest accepted hold; [`Dispatcher::with_hold`] clamps to it.
pub const MAX_HOLD: Duration = Duration::from_secs(3600);

/// Overlay text when no gesture is held.
pub const NO_HAND_TEXT: &str = "No Hand Detected";

/// Volume change per pointing-up / pointing-down gesture, in percent.
pub const VOLUME_STEP: i32 = 10;

// ════════════════════════════════════════════════════════════════════════════
// State
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Holding {
        gesture:    Gesture,
        expires_at: Instant,
        /// The gesture's action has already been attempted.
        acted:      bool,
    },
}

/// Result of one attempted action.  Only `Failed` is an error; a skip is
/// a logical no-op (nothing to pause, no device, …).
#[derive(Clone, Debug, PartialEq)]
pub enum ActionOutcome {
    Performed(String),
    Skipped(String),
    Failed(ActionError),
}

/// What happened during one [`Dispatcher::process`] call.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    /// Text to draw on the overlay this frame.
    pub overlay: &'static str,
    /// The action fired this frame, if any.
    pub fired:   Option<(Gesture, ActionOutcome)>,
    /// A held gesture expired this frame.
    pub expired: bool,
}

// ════════════════════════════════════════════════════════════════════════════
// Dispatcher
// ════════════════════════════════════════════════════════════════════════════

pub struct Dispatcher<P, V> {
    playback: P,
    volume:   V,
    hold:     Duration,
    state:    DispatchState,
}

impl<P: PlaybackClient, V: VolumeControl> Dispatcher<P, V> {
    pub fn new(playback: P, volume: V) -> Self {
        Dispatcher { playback, volume, hold: HOLD_DURATION, state: DispatchState::Idle }
    }

    /// Override the hold duration, clamped to [`MAX_HOLD`].
    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = hold.min(MAX_HOLD);
        self
    }

    pub fn state(&self) -> DispatchState { self.state }
    pub fn hold(&self) -> Duration       { self.hold }
    pub fn playback(&self) -> &P         { &self.playback }
    pub fn volume(&self) -> &V           { &self.volume }

    /// Forget any held gesture.
    pub fn reset(&mut self) { self.state = DispatchState::Idle; }

    /// Hand the capabilities back, e.g. to reuse them in a new session.
    pub fn into_parts(self) -> (P, V) { (self.playback, self.volume) }

    pub fn overlay_text(&self) -> &'static str {
        match self.state {
            DispatchState::Idle                     => NO_HAND_TEXT,
            DispatchState::Holding { gesture, .. } => gesture.name(),
        }
    }

    /// Advance the state machine by one frame.
    ///
    /// An expired hold clears to `Idle` first and nothing else happens that
    /// frame; the next frame re-evaluates from `Idle`.
    pub fn process(&mut self, seen: Option<Gesture>, now: Instant) -> FrameReport {
        if let DispatchState::Holding { gesture, expires_at, .. } = self.state {
            if now >= expires_at {
                log::debug!("{} hold expired", gesture);
                self.state = DispatchState::Idle;
                return FrameReport { overlay: NO_HAND_TEXT, fired: None, expired: true };
            }
        }

        match (self.state, seen) {
            (DispatchState::Idle, Some(g)) => self.engage(g, now),
            (DispatchState::Holding { gesture, .. }, Some(g)) if g != gesture => {
                log::debug!("switching {} → {}", gesture, g);
                self.engage(g, now);
            }
            _ => {}
        }

        let mut fired = None;
        if let DispatchState::Holding { gesture, expires_at, acted: false } = self.state {
            self.state = DispatchState::Holding { gesture, expires_at, acted: true };
            fired = Some((gesture, self.perform(gesture)));
        }

        FrameReport { overlay: self.overlay_text(), fired, expired: false }
    }

    fn engage(&mut self, gesture: Gesture, now: Instant) {
        let expires_at = now.checked_add(self.hold).unwrap_or_else(|| {
            log::warn!("{} hold of {:?} overflows the clock; expiring next frame", gesture, self.hold);
            now
        });
        self.state = DispatchState::Holding { gesture, expires_at, acted: false };
    }

    // ── per-gesture actions ──────────────────────────────────────────────

    /// Run `gesture`'s action.  Failures are logged and returned, never
    /// propagated.
    fn perform(&mut self, gesture: Gesture) -> ActionOutcome {
        let result = match gesture {
            Gesture::ClosedFist    => self.play(),
            Gesture::OpenFist      => self.pause(),
            Gesture::ThumbsUp      => self.like(),
            Gesture::PointingUp    => self.change_volume(VOLUME_STEP),
            Gesture::PointingDown  => self.change_volume(-VOLUME_STEP),
            Gesture::PointingRight => self.playback.next_track()
                .map(|()| ActionOutcome::Performed("skipped to next track".into())),
            Gesture::PointingLeft  => self.playback.previous_track()
                .map(|()| ActionOutcome::Performed("went back to previous track".into())),
        };

        let outcome = result.unwrap_or_else(ActionOutcome::Failed);
        match &outcome {
            ActionOutcome::Performed(msg) => log::info!("{}: {}", gesture, msg),
            ActionOutcome::Skipped(msg)   => log::info!("{}: {}; no action taken", gesture, msg),
            ActionOutcome::Failed(err)    => log::warn!("{}: action failed: {}", gesture, err),
        }
        outcome
    }

    fn play(&mut self) -> Result<ActionOutcome, ActionError> {
        if matches!(self.playback.current_playback()?, Some(PlaybackState { is_playing: true, .. })) {
            return Ok(ActionOutcome::Skipped("a song is already playing".into()));
        }
        if self.playback.devices()?.is_empty() {
            return Ok(ActionOutcome::Skipped("no active devices found for playback".into()));
        }
        self.playback.start_playback()?;
        Ok(ActionOutcome::Performed("playing song".into()))
    }

    /// With no active session at all, pause is still sent and Spotify
    /// decides.
    fn pause(&mut self) -> Result<ActionOutcome, ActionError> {
        if matches!(self.playback.current_playback()?, Some(PlaybackState { is_playing: false, .. })) {
            return Ok(ActionOutcome::Skipped("a song is already paused".into()));
        }
        self.playback.pause_playback()?;
        Ok(ActionOutcome::Performed("pausing song".into()))
    }

    fn like(&mut self) -> Result<ActionOutcome, ActionError> {
        match self.playback.current_playback()?.and_then(|s| s.item) {
            Some(id) => {
                self.playback.save_track(&id)?;
                Ok(ActionOutcome::Performed(format!("liked track {}", id)))
            }
            None => Ok(ActionOutcome::Skipped("no song is currently playing".into())),
        }
    }

    fn change_volume(&mut self, delta: i32) -> Result<ActionOutcome, ActionError> {
        let level = self.volume.adjust_volume(delta)?;
        Ok(ActionOutcome::Performed(format!(
            "volume set to {}% via {}", level, self.volume.backend_name()
        )))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::clamp_level;

    #[derive(Default)]
    struct FakePlayback {
        playing: bool,
        item:    Option<String>,
        devices: Vec<String>,
        /// No playback session exists (Spotify answers 204).
        inactive: bool,
        /// Every call fails with a transport error.
        broken:  bool,
        calls:   Vec<String>,
    }

    impl FakePlayback {
        fn with_device() -> Self {
            FakePlayback { devices: vec!["desk".into()], ..Default::default() }
        }

        fn record(&mut self, call: &str) -> Result<(), ActionError> {
            self.calls.push(call.to_string());
            if self.broken { Err(ActionError::Transport("offline".into())) } else { Ok(()) }
        }

        fn count(&self, call: &str) -> usize {
            self.calls.iter().filter(|c| c.as_str() == call).count()
        }
    }

    impl PlaybackClient for FakePlayback {
        fn current_playback(&mut self) -> Result<Option<PlaybackState>, ActionError> {
            self.record("current_playback")?;
            if self.inactive {
                return Ok(None);
            }
            Ok(Some(PlaybackState { is_playing: self.playing, item: self.item.clone() }))
        }
        fn devices(&mut self) -> Result<Vec<String>, ActionError> {
            self.record("devices")?;
            Ok(self.devices.clone())
        }
        fn start_playback(&mut self) -> Result<(), ActionError>  { self.record("start") }
        fn pause_playback(&mut self) -> Result<(), ActionError>  { self.record("pause") }
        fn next_track(&mut self) -> Result<(), ActionError>      { self.record("next") }
        fn previous_track(&mut self) -> Result<(), ActionError>  { self.record("previous") }
        fn save_track(&mut self, id: &str) -> Result<(), ActionError> {
            self.record(&format!("save:{}", id))
        }
    }

    struct FakeVolume {
        level:     u8,
        supported: bool,
    }

    impl VolumeControl for FakeVolume {
        fn adjust_volume(&mut self, delta: i32) -> Result<u8, ActionError> {
            if !self.supported {
                return Err(ActionError::NotSupported("test".into()));
            }
            self.level = clamp_level(self.level as i32, delta);
            Ok(self.level)
        }
        fn backend_name(&self) -> &str { "fake" }
    }

    fn dispatcher(playback: FakePlayback) -> Dispatcher<FakePlayback, FakeVolume> {
        Dispatcher::new(playback, FakeVolume { level: 50, supported: true })
    }

    fn secs(s: f32) -> Duration { Duration::from_secs_f32(s) }

    #[test]
    fn idle_without_hand_shows_no_hand() {
        let mut d = dispatcher(FakePlayback::with_device());
        let r = d.process(None, Instant::now());
        assert_eq!(r.overlay, NO_HAND_TEXT);
        assert!(r.fired.is_none());
        assert_eq!(d.state(), DispatchState::Idle);
    }

    #[test]
    fn first_detection_fires_immediately() {
        let t0 = Instant::now();
        let mut d = dispatcher(FakePlayback::with_device());
        let r = d.process(Some(Gesture::PointingRight), t0);
        assert_eq!(r.overlay, "Pointing Right");
        assert!(matches!(r.fired, Some((Gesture::PointingRight, ActionOutcome::Performed(_)))));
        assert_eq!(d.state(), DispatchState::Holding {
            gesture: Gesture::PointingRight, expires_at: t0 + HOLD_DURATION, acted: true,
        });
    }

    #[test]
    fn repeated_gesture_within_hold_fires_once() {
        let t0 = Instant::now();
        let mut d = dispatcher(FakePlayback::with_device());
        for i in 0..30 {
            d.process(Some(Gesture::PointingRight), t0 + secs(i as f32 * 0.1));
        }
        assert_eq!(d.playback().count("next"), 1);
    }

    #[test]
    fn overlay_persists_after_hand_leaves() {
        let t0 = Instant::now();
        let mut d = dispatcher(FakePlayback::with_device());
        d.process(Some(Gesture::PointingLeft), t0);
        let r = d.process(None, t0 + secs(2.0));
        assert_eq!(r.overlay, "Pointing Left");
        assert!(r.fired.is_none());
    }

    #[test]
    fn expiry_clears_then_same_gesture_fires_again() {
        let t0 = Instant::now();
        let mut d = dispatcher(FakePlayback::with_device());
        d.process(Some(Gesture::PointingRight), t0);

        let r = d.process(Some(Gesture::PointingRight), t0 + HOLD_DURATION);
        assert!(r.expired);
        assert!(r.fired.is_none());
        assert_eq!(r.overlay, NO_HAND_TEXT);
        assert_eq!(d.state(), DispatchState::Idle);

        let r = d.process(Some(Gesture::PointingRight), t0 + HOLD_DURATION + secs(0.03));
        assert!(r.fired.is_some());
        assert_eq!(d.playback().count("next"), 2);
    }

    #[test]
    fn expiry_wins_over_a_new_gesture_on_the_same_frame() {
        let t0 = Instant::now();
        let mut d = dispatcher(FakePlayback::with_device());
        d.process(Some(Gesture::PointingRight), t0);
        let r = d.process(Some(Gesture::PointingLeft), t0 + secs(3.5));
        assert!(r.expired);
        assert_eq!(d.playback().count("previous"), 0);
        d.process(Some(Gesture::PointingLeft), t0 + secs(3.6));
        assert_eq!(d.playback().count("previous"), 1);
    }

    #[test]
    fn switching_gesture_mid_hold_fires_and_restarts_hold() {
        let t0 = Instant::now();
        let mut d = dispatcher(FakePlayback::with_device());
        d.process(Some(Gesture::ClosedFist), t0);
        let t1 = t0 + secs(1.0);
        let r = d.process(Some(Gesture::PointingRight), t1);
        assert!(matches!(r.fired, Some((Gesture::PointingRight, _))));
        assert_eq!(d.state(), DispatchState::Holding {
            gesture: Gesture::PointingRight, expires_at: t1 + HOLD_DURATION, acted: true,
        });
        assert_eq!(d.playback().count("start"), 1);
        assert_eq!(d.playback().count("next"), 1);
    }

    #[test]
    fn closed_fist_while_playing_is_a_no_op() {
        let mut d = dispatcher(FakePlayback { playing: true, ..FakePlayback::with_device() });
        let r = d.process(Some(Gesture::ClosedFist), Instant::now());
        assert!(matches!(r.fired, Some((Gesture::ClosedFist, ActionOutcome::Skipped(_)))));
        assert_eq!(d.playback().count("start"), 0);
        assert!(matches!(d.state(), DispatchState::Holding { gesture: Gesture::ClosedFist, acted: true, .. }));
    }

    #[test]
    fn closed_fist_without_device_is_skipped() {
        let mut d = dispatcher(FakePlayback::default());
        let r = d.process(Some(Gesture::ClosedFist), Instant::now());
        assert!(matches!(r.fired, Some((_, ActionOutcome::Skipped(_)))));
        assert_eq!(d.playback().count("devices"), 1);
        assert_eq!(d.playback().count("start"), 0);
    }

    #[test]
    fn closed_fist_starts_paused_playback() {
        let mut d = dispatcher(FakePlayback::with_device());
        d.process(Some(Gesture::ClosedFist), Instant::now());
        assert_eq!(d.playback().count("start"), 1);
    }

    #[test]
    fn open_fist_pauses_only_when_playing() {
        let mut d = dispatcher(FakePlayback::with_device());
        let r = d.process(Some(Gesture::OpenFist), Instant::now());
        assert!(matches!(r.fired, Some((_, ActionOutcome::Skipped(_)))));
        assert_eq!(d.playback().count("pause"), 0);

        let mut d = dispatcher(FakePlayback { playing: true, ..FakePlayback::with_device() });
        d.process(Some(Gesture::OpenFist), Instant::now());
        assert_eq!(d.playback().count("pause"), 1);
    }

    #[test]
    fn open_fist_without_active_session_still_sends_pause() {
        let mut d = dispatcher(FakePlayback { inactive: true, ..FakePlayback::with_device() });
        let r = d.process(Some(Gesture::OpenFist), Instant::now());
        assert!(matches!(r.fired, Some((Gesture::OpenFist, ActionOutcome::Performed(_)))));
        assert_eq!(d.playback().count("pause"), 1);
    }

    #[test]
    fn closed_fist_without_active_session_starts_playback() {
        let mut d = dispatcher(FakePlayback { inactive: true, ..FakePlayback::with_device() });
        d.process(Some(Gesture::ClosedFist), Instant::now());
        assert_eq!(d.playback().count("start"), 1);
    }

    #[test]
    fn thumbs_up_without_active_session_is_skipped() {
        let mut d = dispatcher(FakePlayback { inactive: true, ..FakePlayback::with_device() });
        let r = d.process(Some(Gesture::ThumbsUp), Instant::now());
        assert!(matches!(r.fired, Some((_, ActionOutcome::Skipped(_)))));
    }

    #[test]
    fn thumbs_up_likes_current_track() {
        let mut d = dispatcher(FakePlayback { item: Some("trk42".into()), ..FakePlayback::with_device() });
        d.process(Some(Gesture::ThumbsUp), Instant::now());
        assert_eq!(d.playback().count("save:trk42"), 1);
    }

    #[test]
    fn thumbs_up_with_nothing_playing_is_skipped() {
        let mut d = dispatcher(FakePlayback::with_device());
        let r = d.process(Some(Gesture::ThumbsUp), Instant::now());
        assert!(matches!(r.fired, Some((_, ActionOutcome::Skipped(_)))));
    }

    #[test]
    fn pointing_up_and_down_adjust_volume() {
        let t0 = Instant::now();
        let mut d = dispatcher(FakePlayback::with_device());
        d.process(Some(Gesture::PointingUp), t0);
        assert_eq!(d.volume().level, 60);
        d.process(Some(Gesture::PointingDown), t0 + secs(0.5));
        assert_eq!(d.volume().level, 50);
    }

    #[test]
    fn failed_action_still_counts_as_acted() {
        let t0 = Instant::now();
        let mut d = dispatcher(FakePlayback { broken: true, ..FakePlayback::with_device() });
        let r = d.process(Some(Gesture::PointingRight), t0);
        assert!(matches!(r.fired, Some((_, ActionOutcome::Failed(ActionError::Transport(_))))));
        assert_eq!(r.overlay, "Pointing Right");

        let r = d.process(Some(Gesture::PointingRight), t0 + secs(1.0));
        assert!(r.fired.is_none());
        assert_eq!(d.playback().count("next"), 1);
    }

    #[test]
    fn unsupported_volume_is_reported_not_raised() {
        let mut d = Dispatcher::new(FakePlayback::with_device(), FakeVolume { level: 50, supported: false });
        let r = d.process(Some(Gesture::PointingUp), Instant::now());
        assert!(matches!(r.fired, Some((_, ActionOutcome::Failed(ActionError::NotSupported(_))))));
    }

    #[test]
    fn custom_hold_duration_is_respected() {
        let t0 = Instant::now();
        let mut d = dispatcher(FakePlayback::with_device()).with_hold(secs(0.5));
        d.process(Some(Gesture::PointingRight), t0);
        assert!(d.process(None, t0 + secs(0.6)).expired);
    }

    #[test]
    fn oversized_hold_is_clamped_and_does_not_panic() {
        let t0 = Instant::now();
        let mut d = dispatcher(FakePlayback::with_device()).with_hold(Duration::MAX);
        assert_eq!(d.hold(), MAX_HOLD);
        let r = d.process(Some(Gesture::PointingRight), t0);
        assert!(r.fired.is_some());
        assert!(!d.process(Some(Gesture::PointingRight), t0 + secs(600.0)).expired);
        assert_eq!(d.playback().count("next"), 1);
    }

    #[test]
    fn into_parts_returns_capabilities() {
        let mut d = dispatcher(FakePlayback::with_device());
        d.process(Some(Gesture::PointingLeft), Instant::now());
        let (playback, _volume) = d.into_parts();
        assert_eq!(playback.count("previous"), 1);
    }
}

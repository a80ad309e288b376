//! # gesture_core
//!
//! Turns a per-frame hand landmark snapshot into media-playback commands.
//!
//! ```text
//! HandSnapshot ──▶ Classifier ──▶ Option<Gesture> ──▶ Dispatcher ──▶ PlaybackClient / VolumeControl
//!                                                        └──▶ overlay text
//! ```
//!
//! * [`classifier`] — stateless geometric rules, first match wins.
//! * [`dispatcher`] — hold/debounce state machine that fires each newly
//!   recognised gesture's action exactly once.
//! * [`actions`] — the capability traits the dispatcher drives, plus null
//!   backends for offline use.
//! * [`poses`] — one canned snapshot per gesture, for simulation.
//!
//! ## Quick start
//!
//! ```rust
//! use std::time::Instant;
//! use gesture_core::{Classifier, Dispatcher, HandSnapshot, Landmark, LoggingPlayback, NoVolume, Point};
//!
//! let hand = HandSnapshot::uniform(Point::new(0.5, 0.5))
//!     .with(Landmark::IndexTip, (0.9, 0.5));
//!
//! let gesture = Classifier::default().classify(&hand);
//! let mut dispatcher = Dispatcher::new(LoggingPlayback::default(), NoVolume::default());
//! let report = dispatcher.process(gesture, Instant::now());
//! assert_eq!(report.overlay, "Pointing Right");
//! ```

pub mod landmarks;
pub mod classifier;
pub mod actions;
pub mod dispatcher;
pub mod poses;

pub use landmarks::{HandSnapshot, Landmark, Point, SnapshotError, HAND_CONNECTIONS, LANDMARK_COUNT};
pub use classifier::{Classifier, Gesture, Thresholds};
pub use actions::{
    clamp_level, ActionError, LoggingPlayback, NoVolume, PlaybackClient, PlaybackState, VolumeControl,
};
pub use poses::{pose, pose_spec, PoseSpec};
pub use dispatcher::{
    ActionOutcome, DispatchState, Dispatcher, FrameReport, HOLD_DURATION, MAX_HOLD, NO_HAND_TEXT,
    VOLUME_STEP,
};

//! # gesture_remote
//!
//! Camera hand-gesture remote for Spotify playback and system volume, with
//! a software-rendered overlay window and a Start/Stop toggle.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Action |
//! |---|---|
//! | Closed fist | Start playback (unless already playing) |
//! | Open hand, index and middle together | Pause playback (unless already paused) |
//! | Thumbs up | Like the current track |
//! | Point up / down | Volume ±10 |
//! | Point right / left | Next / previous track |
//!
//! A fired gesture is held for three seconds: its name stays on screen and
//! repeats are ignored.
//!
//! ## Pipeline
//!
//! ```text
//! camera ─▶ mirror ─▶ detector ─▶ classifier ─▶ dispatcher ─▶ Spotify / volume
//!   (camera)           (detector)   (gesture_core)              (playback_control)
//!                └──────────────── task thread ─────────────┘
//!                                      │ SharedStatus
//!                                      ▼
//!                                 visualizer (window)
//! ```
//!
//! ## Feature flags
//!
//! * (default) — **Simulation mode**: synthetic frames; keys pose the hand.
//! * `camera` — **Hardware mode**: webcam via `nokhwa`, MediaPipe landmarker
//!   in a Python subprocess (`scripts/hand_detect.py`).
//!
//! ### Keyboard
//!
//! | Key | Effect |
//! |---|---|
//! | `G` / click button | Start / stop recognition |
//! | `1`–`7` | Pose the simulated hand (simulation mode) |
//! | `0` | Remove the simulated hand |
//! | `Q` / `Esc` | Quit |

pub mod frame;
pub mod camera;
pub mod detector;
pub mod task;
pub mod visualizer;
pub mod app;

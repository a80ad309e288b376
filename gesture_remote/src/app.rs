//! Top-level wiring: build the capabilities once, then drive the window.
//!
//! Everything with a lifetime of the whole process (playback client,
//! volume backend, detector) is constructed here and handed to the
//! [`GestureTask`]; the window loop only toggles the task and draws its
//! status.

use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use gesture_core::{Classifier, Dispatcher, LoggingPlayback, Thresholds, HOLD_DURATION};
use playback_control::{connect, stdin_prompt, volume, DEFAULT_CONFIG_PATH};

use crate::camera::{CameraChoice, CameraFactory};
use crate::detector::{HandDetector, SimDetector, SimPose, DEFAULT_MIN_CONFIDENCE};
use crate::task::{BoxedPlayback, GestureTask, Rig};
use crate::visualizer::{Visualizer, VIEW_H, VIEW_W};

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Where frames and hands come from.
#[derive(Clone, Debug, PartialEq)]
pub enum InputMode {
    /// Synthetic frames; keys `1`–`7` pose a virtual hand.
    Simulated,
    /// Webcam plus the MediaPipe landmarker subprocess.
    #[cfg(feature = "camera")]
    Camera { index: u32, python: PathBuf, script: PathBuf },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub config_path:    PathBuf,
    /// Log playback commands instead of calling Spotify.
    pub offline:        bool,
    pub hold:           Duration,
    pub min_confidence: f32,
    pub thresholds:     Thresholds,
    pub mirror:         bool,
    pub input:          InputMode,
    /// Start the gesture loop without waiting for the button.
    pub autostart:      bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            config_path:    PathBuf::from(DEFAULT_CONFIG_PATH),
            offline:        false,
            hold:           HOLD_DURATION,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            thresholds:     Thresholds::default(),
            mirror:         true,
            input:          InputMode::Simulated,
            autostart:      false,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Capability construction
// ════════════════════════════════════════════════════════════════════════════

fn build_playback(cfg: &AppConfig) -> Result<BoxedPlayback> {
    if cfg.offline {
        log::info!("offline mode: playback commands are only logged");
        return Ok(Box::new(LoggingPlayback::default()));
    }
    let client = connect(&cfg.config_path, stdin_prompt).with_context(|| {
        format!("Spotify setup from {} failed (use --offline to run without it)",
                cfg.config_path.display())
    })?;
    Ok(Box::new(client))
}

type Input = (Box<dyn CameraFactory>, Box<dyn HandDetector>, Option<Sender<SimPose>>);

fn build_input(cfg: &AppConfig) -> Result<Input> {
    match &cfg.input {
        InputMode::Simulated => {
            let (tx, detector) = SimDetector::channel();
            let camera = CameraChoice::Simulated { width: VIEW_W, height: VIEW_H };
            Ok((Box::new(camera), Box::new(detector), Some(tx)))
        }
        #[cfg(feature = "camera")]
        InputMode::Camera { index, python, script } => {
            let detector = crate::detector::MediaPipeDetector::spawn(python, script, cfg.min_confidence)
                .context("starting the hand detector")?;
            Ok((Box::new(CameraChoice::Device(*index)), Box::new(detector), None))
        }
    }
}

/// Construct the rig and the simulation sender, if any.
pub fn build_rig(cfg: &AppConfig) -> Result<(Rig, Option<Sender<SimPose>>)> {
    let playback = build_playback(cfg)?;
    let dispatcher = Dispatcher::new(playback, volume::probe()).with_hold(cfg.hold);
    let (camera, detector, sim_tx) = build_input(cfg)?;

    log::info!("input: {} via {}", camera.describe(), detector.name());
    let rig = Rig {
        camera,
        detector,
        classifier: Classifier::new(cfg.thresholds),
        dispatcher,
        mirror: cfg.mirror,
    };
    Ok((rig, sim_tx))
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run until the window closes or the user quits.
pub fn run(cfg: AppConfig) -> Result<()> {
    let (rig, sim_tx) = build_rig(&cfg)?;
    let mut task = GestureTask::new(rig);
    let mut vis = Visualizer::new(sim_tx).map_err(|e| anyhow!("opening window: {}", e))?;

    if cfg.autostart {
        task.start();
    }

    while vis.is_open() {
        let input = vis.poll_input();
        if input.quit {
            break;
        }
        if input.toggle {
            task.toggle();
        }

        vis.draw(&task.status());
        vis.present();
    }

    task.stop();
    log::info!("window closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gesture_core::{pose, Gesture};

    #[test]
    fn offline_simulated_rig_builds_without_hardware() {
        let cfg = AppConfig { offline: true, ..AppConfig::default() };
        let (mut rig, sim_tx) = build_rig(&cfg).unwrap();
        assert!(sim_tx.is_some());
        assert_eq!(rig.dispatcher.hold(), HOLD_DURATION);

        let tx = sim_tx.unwrap();
        tx.send(SimPose::Hand(Gesture::ThumbsUp)).unwrap();
        let mut source = rig.camera.open().unwrap();
        let frame = source.read_frame().unwrap();
        let hand = rig.detector.detect(&frame).unwrap().unwrap();
        assert_eq!(hand, pose(Gesture::ThumbsUp).with_confidence(1.0));
        assert_eq!(rig.classifier.classify(&hand), Some(Gesture::ThumbsUp));
    }

    #[test]
    fn missing_credentials_explain_offline_flag() {
        let cfg = AppConfig {
            config_path: PathBuf::from("/definitely/not/here/config.ini"),
            ..AppConfig::default()
        };
        let err = build_rig(&cfg).err().unwrap();
        assert!(format!("{:#}", err).contains("--offline"));
    }

    #[test]
    fn hold_override_reaches_dispatcher() {
        let cfg = AppConfig { offline: true, hold: Duration::from_millis(1500), ..AppConfig::default() };
        let (rig, _) = build_rig(&cfg).unwrap();
        assert_eq!(rig.dispatcher.hold(), Duration::from_millis(1500));
    }
}

//! Hand detectors, both the MediaPipe landmarker and keyboard simulation.
//!
//! A [`HandDetector`] turns one [`Frame`] into at most one
//! [`HandSnapshot`]: the best-scoring hand above the confidence
//! threshold, or `None` when no hand is visible.  The gesture thread
//! does not know which implementation it is driving.
//!
//! ## MediaPipe subprocess protocol
//!
//! The landmarker runs in a Python child process
//! (`scripts/hand_detect.py`).  After start-up it prints `READY`, then for
//! every frame:
//!
//! ```text
//! stdin  ← width:u32 LE | height:u32 LE | channels:u32 LE | width*height*channels RGB bytes
//! stdout → {"hands": [{"handedness": "Right", "score": 0.93,
//!                      "landmarks": [{"x": .., "y": .., "z": ..}, × 21]}]}\n
//! ```

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use gesture_core::{pose, Gesture, HandSnapshot, Point, SnapshotError};
use serde::Deserialize;
use thiserror::Error;

use crate::frame::Frame;

/// Minimum detection score for a hand to be reported.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.7;

// ════════════════════════════════════════════════════════════════════════════
// HandDetector trait
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("detector process: {0}")]
    Io(#[from] std::io::Error),

    #[error("detector did not start: {0}")]
    Startup(String),

    #[error("bad detector reply {line:?}: {message}")]
    Protocol { line: String, message: String },

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

pub trait HandDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Option<HandSnapshot>, DetectorError>;
    fn name(&self) -> &str;
}

impl<T: HandDetector + ?Sized> HandDetector for Box<T> {
    fn detect(&mut self, frame: &Frame) -> Result<Option<HandSnapshot>, DetectorError> {
        (**self).detect(frame)
    }
    fn name(&self) -> &str { (**self).name() }
}

// ════════════════════════════════════════════════════════════════════════════
// Reply parsing
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct LandmarkJson {
    x: f32,
    y: f32,
}

#[derive(Debug, Deserialize)]
struct HandJson {
    #[serde(default)]
    handedness: String,
    score:      f32,
    landmarks:  Vec<LandmarkJson>,
}

#[derive(Debug, Deserialize)]
struct DetectionReply {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

/// Decode one reply line, keeping only the best-scoring hand at or above
/// `min_confidence`.  A reply carrying `error` is reported as no hand.
pub fn parse_reply(line: &str, min_confidence: f32) -> Result<Option<HandSnapshot>, DetectorError> {
    let reply: DetectionReply = serde_json::from_str(line.trim()).map_err(|e| DetectorError::Protocol {
        line:    line.trim().to_string(),
        message: e.to_string(),
    })?;

    if let Some(err) = reply.error {
        log::warn!("detector error: {}", err);
        return Ok(None);
    }

    let best = reply
        .hands
        .into_iter()
        .filter(|h| h.score >= min_confidence)
        .max_by(|a, b| a.score.total_cmp(&b.score));

    let Some(hand) = best else { return Ok(None) };
    let points: Vec<Point> = hand.landmarks.iter().map(|l| Point::new(l.x, l.y)).collect();
    let snapshot = HandSnapshot::from_slice(&points)?.with_confidence(hand.score);
    log::debug!("{} hand, score {:.2}", hand.handedness, hand.score);
    Ok(Some(snapshot))
}

// ════════════════════════════════════════════════════════════════════════════
// SimDetector — keyboard-selected poses (always available)
// ════════════════════════════════════════════════════════════════════════════

/// What the simulated hand is doing, selected from the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimPose {
    Hand(Gesture),
    NoHand,
}

/// Reports the canned landmark snapshot for the most recently selected
/// pose on every frame until another pose arrives.
pub struct SimDetector {
    rx:      Receiver<SimPose>,
    current: Option<Gesture>,
}

impl SimDetector {
    pub fn new(rx: Receiver<SimPose>) -> Self {
        SimDetector { rx, current: None }
    }

    /// A detector plus the sender the window uses to drive it.
    pub fn channel() -> (Sender<SimPose>, SimDetector) {
        let (tx, rx) = mpsc::channel();
        (tx, SimDetector::new(rx))
    }

    fn drain(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(SimPose::Hand(g)) => self.current = Some(g),
                Ok(SimPose::NoHand)  => self.current = None,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }
}

impl HandDetector for SimDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Option<HandSnapshot>, DetectorError> {
        self.drain();
        Ok(self.current.map(|g| pose(g).with_confidence(1.0)))
    }

    fn name(&self) -> &str { "keyboard simulation" }
}

// ════════════════════════════════════════════════════════════════════════════
// MediaPipeDetector — Python subprocess (feature = "camera")
// ════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "camera")]
pub use mediapipe::MediaPipeDetector;

#[cfg(feature = "camera")]
mod mediapipe {
    use std::io::{BufRead, BufReader, Write};
    use std::path::Path;
    use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

    use gesture_core::HandSnapshot;

    use super::{parse_reply, DetectorError, HandDetector};
    use crate::frame::Frame;

    pub struct MediaPipeDetector {
        process:        Child,
        stdin:          ChildStdin,
        stdout:         BufReader<ChildStdout>,
        min_confidence: f32,
    }

    impl MediaPipeDetector {
        /// Start `python script` and wait for its `READY` line.
        pub fn spawn(python: &Path, script: &Path, min_confidence: f32) -> Result<Self, DetectorError> {
            if !script.exists() {
                return Err(DetectorError::Startup(format!("script not found at {}", script.display())));
            }
            log::info!("starting MediaPipe hand detector ({} {})", python.display(), script.display());

            let mut process = Command::new(python)
                .arg(script)
                .arg("--min-confidence")
                .arg(min_confidence.to_string())
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::inherit())
                .spawn()
                .map_err(|e| DetectorError::Startup(format!("{}: {}", python.display(), e)))?;

            let (Some(stdin), Some(stdout)) = (process.stdin.take(), process.stdout.take()) else {
                let _ = process.kill();
                return Err(DetectorError::Startup("child pipes unavailable".into()));
            };
            let mut stdout = BufReader::new(stdout);

            let mut ready = String::new();
            stdout.read_line(&mut ready)?;
            if ready.trim() != "READY" {
                let _ = process.kill();
                return Err(DetectorError::Startup(format!("expected READY, got {:?}", ready.trim())));
            }

            log::info!("MediaPipe hand detector ready");
            Ok(MediaPipeDetector { process, stdin, stdout, min_confidence: min_confidence.clamp(0.0, 1.0) })
        }
    }

    impl HandDetector for MediaPipeDetector {
        fn detect(&mut self, frame: &Frame) -> Result<Option<HandSnapshot>, DetectorError> {
            if frame.is_empty() {
                return Ok(None);
            }
            self.stdin.write_all(&(frame.width as u32).to_le_bytes())?;
            self.stdin.write_all(&(frame.height as u32).to_le_bytes())?;
            self.stdin.write_all(&3u32.to_le_bytes())?;
            self.stdin.write_all(&frame.rgb)?;
            self.stdin.flush()?;

            let mut line = String::new();
            if self.stdout.read_line(&mut line)? == 0 {
                return Err(DetectorError::Startup("detector process exited".into()));
            }
            parse_reply(&line, self.min_confidence)
        }

        fn name(&self) -> &str { "MediaPipe" }
    }

    impl Drop for MediaPipeDetector {
        fn drop(&mut self) {
            let _ = self.process.kill();
            let _ = self.process.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gesture_core::{Classifier, LANDMARK_COUNT};

    fn hand_json(score: f32, x: f32) -> String {
        let pts: Vec<String> = (0..LANDMARK_COUNT)
            .map(|_| format!(r#"{{"x": {}, "y": 0.5, "z": 0.0}}"#, x))
            .collect();
        format!(r#"{{"handedness": "Right", "score": {}, "landmarks": [{}]}}"#, score, pts.join(","))
    }

    #[test]
    fn empty_reply_is_no_hand() {
        assert!(parse_reply(r#"{"hands": []}"#, 0.7).unwrap().is_none());
    }

    #[test]
    fn low_confidence_hands_are_dropped() {
        let line = format!(r#"{{"hands": [{}]}}"#, hand_json(0.5, 0.1));
        assert!(parse_reply(&line, 0.7).unwrap().is_none());
    }

    #[test]
    fn best_scoring_hand_wins() {
        let line = format!(r#"{{"hands": [{}, {}]}}"#, hand_json(0.8, 0.1), hand_json(0.95, 0.9));
        let hand = parse_reply(&line, 0.7).unwrap().unwrap();
        assert_eq!(hand.confidence, 0.95);
        assert_eq!(hand.points()[0].x, 0.9);
    }

    #[test]
    fn error_field_means_no_hand() {
        assert!(parse_reply(r#"{"hands": [], "error": "bad frame"}"#, 0.7).unwrap().is_none());
    }

    #[test]
    fn short_landmark_list_is_rejected() {
        let line = r#"{"hands": [{"score": 0.9, "landmarks": [{"x": 0.1, "y": 0.2, "z": 0}]}]}"#;
        assert!(matches!(parse_reply(line, 0.7), Err(DetectorError::Snapshot(_))));
    }

    #[test]
    fn garbage_is_a_protocol_error() {
        assert!(matches!(parse_reply("Traceback (most recent call last)", 0.7),
                         Err(DetectorError::Protocol { .. })));
    }

    #[test]
    fn sim_detector_follows_latest_pose() {
        let (tx, mut det) = SimDetector::channel();
        let frame = Frame::filled(2, 2, [0, 0, 0]);
        let classifier = Classifier::default();

        assert!(det.detect(&frame).unwrap().is_none());

        tx.send(SimPose::Hand(Gesture::OpenFist)).unwrap();
        tx.send(SimPose::Hand(Gesture::ThumbsUp)).unwrap();
        let hand = det.detect(&frame).unwrap().unwrap();
        assert_eq!(classifier.classify(&hand), Some(Gesture::ThumbsUp));

        // Held until told otherwise.
        assert!(det.detect(&frame).unwrap().is_some());

        tx.send(SimPose::NoHand).unwrap();
        assert!(det.detect(&frame).unwrap().is_none());
    }

    #[test]
    fn sim_detector_keeps_pose_after_sender_drops() {
        let (tx, mut det) = SimDetector::channel();
        tx.send(SimPose::Hand(Gesture::PointingLeft)).unwrap();
        drop(tx);
        let frame = Frame::filled(1, 1, [0, 0, 0]);
        assert!(det.detect(&frame).unwrap().is_some());
    }
}

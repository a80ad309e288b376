//! Canned hand poses, one per gesture.
//!
//! Used by the keyboard simulator in `gesture_remote` and by the
//! interactive `gesture_menu`.  Intermediate joints are interpolated from
//! the wrist and fingertips so the skeleton draws like a plausible hand.

use crate::classifier::Gesture;
use crate::landmarks::{HandSnapshot, Landmark, Point, LANDMARK_COUNT};

/// Key landmarks a pose is specified by; every other joint is derived.
#[derive(Clone, Copy, Debug)]
pub struct PoseSpec {
    pub wrist:      (f32, f32),
    pub thumb_tip:  (f32, f32),
    pub thumb_ip:   (f32, f32),
    pub index_tip:  (f32, f32),
    pub middle_tip: (f32, f32),
    pub ring_tip:   (f32, f32),
    pub pinky_tip:  (f32, f32),
}

fn lerp(a: Point, b: Point, t: f32) -> Point {
    Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

impl PoseSpec {
    /// Expand to a full snapshot.
    pub fn build(&self) -> HandSnapshot {
        let wrist = Point::from(self.wrist);
        let mut pts = [wrist; LANDMARK_COUNT];

        let thumb_ip = Point::from(self.thumb_ip);
        pts[Landmark::ThumbCmc.index()] = lerp(wrist, thumb_ip, 0.3);
        pts[Landmark::ThumbMcp.index()] = lerp(wrist, thumb_ip, 0.65);
        pts[Landmark::ThumbIp.index()]  = thumb_ip;
        pts[Landmark::ThumbTip.index()] = Point::from(self.thumb_tip);

        let fingers = [
            (Landmark::IndexMcp,  self.index_tip),
            (Landmark::MiddleMcp, self.middle_tip),
            (Landmark::RingMcp,   self.ring_tip),
            (Landmark::PinkyMcp,  self.pinky_tip),
        ];
        for (mcp, tip) in fingers {
            let tip = Point::from(tip);
            let base = mcp.index();
            let knuckle = lerp(wrist, tip, 0.4);
            pts[base]     = knuckle;
            pts[base + 1] = lerp(knuckle, tip, 0.4);
            pts[base + 2] = lerp(knuckle, tip, 0.7);
            pts[base + 3] = tip;
        }

        HandSnapshot::from_points(pts)
    }

    /// Flip horizontally (`x → 1 − x`).
    pub fn mirrored(&self) -> PoseSpec {
        let m = |(x, y): (f32, f32)| (1.0 - x, y);
        PoseSpec {
            wrist:      m(self.wrist),
            thumb_tip:  m(self.thumb_tip),
            thumb_ip:   m(self.thumb_ip),
            index_tip:  m(self.index_tip),
            middle_tip: m(self.middle_tip),
            ring_tip:   m(self.ring_tip),
            pinky_tip:  m(self.pinky_tip),
        }
    }
}

const POINTING_RIGHT: PoseSpec = PoseSpec {
    wrist:      (0.3,  0.5),
    thumb_tip:  (0.4,  0.6),
    thumb_ip:   (0.37, 0.58),
    index_tip:  (0.75, 0.48),
    middle_tip: (0.42, 0.55),
    ring_tip:   (0.41, 0.57),
    pinky_tip:  (0.4,  0.58),
};

/// The pose spec for `gesture`.
pub fn pose_spec(gesture: Gesture) -> PoseSpec {
    match gesture {
        Gesture::ClosedFist => PoseSpec {
            wrist:      (0.5,  0.7),
            thumb_tip:  (0.56, 0.6),
            thumb_ip:   (0.58, 0.64),
            index_tip:  (0.52, 0.55),
            middle_tip: (0.5,  0.56),
            ring_tip:   (0.48, 0.57),
            pinky_tip:  (0.46, 0.6),
        },
        Gesture::OpenFist => PoseSpec {
            wrist:      (0.5,  0.8),
            thumb_tip:  (0.3,  0.6),
            thumb_ip:   (0.34, 0.65),
            index_tip:  (0.45, 0.4),
            middle_tip: (0.5,  0.38),
            ring_tip:   (0.55, 0.42),
            pinky_tip:  (0.6,  0.48),
        },
        Gesture::ThumbsUp => PoseSpec {
            wrist:      (0.5,  0.7),
            thumb_tip:  (0.5,  0.25),
            thumb_ip:   (0.5,  0.4),
            index_tip:  (0.58, 0.6),
            middle_tip: (0.58, 0.62),
            ring_tip:   (0.57, 0.64),
            pinky_tip:  (0.56, 0.66),
        },
        Gesture::PointingUp => PoseSpec {
            wrist:      (0.5,  0.8),
            thumb_tip:  (0.58, 0.66),
            thumb_ip:   (0.6,  0.7),
            index_tip:  (0.52, 0.3),
            middle_tip: (0.55, 0.68),
            ring_tip:   (0.53, 0.7),
            pinky_tip:  (0.51, 0.72),
        },
        Gesture::PointingDown => PoseSpec {
            wrist:      (0.5,  0.3),
            thumb_tip:  (0.58, 0.44),
            thumb_ip:   (0.6,  0.4),
            index_tip:  (0.52, 0.8),
            middle_tip: (0.55, 0.42),
            ring_tip:   (0.53, 0.4),
            pinky_tip:  (0.51, 0.38),
        },
        Gesture::PointingRight => POINTING_RIGHT,
        Gesture::PointingLeft  => POINTING_RIGHT.mirrored(),
    }
}

/// A snapshot that classifies as `gesture` under default thresholds.
pub fn pose(gesture: Gesture) -> HandSnapshot { pose_spec(gesture).build() }

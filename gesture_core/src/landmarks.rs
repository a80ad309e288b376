//! Hand landmark snapshot — the per-frame output of the hand detector.
//!
//! Coordinates are normalised to the frame: `x` in `[0, 1]` left → right,
//! `y` in `[0, 1]` top → bottom (screen space, so "up" is a *smaller* `y`).
//! Landmark numbering follows the MediaPipe hand model.

use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// Point
// ════════════════════════════════════════════════════════════════════════════

/// A normalised 2-D image position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self { Point { x, y } }

    /// Planar Euclidean distance.
    pub fn distance(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(self) -> bool { self.x.is_finite() && self.y.is_finite() }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self { Point { x, y } }
}

// ════════════════════════════════════════════════════════════════════════════
// Landmark names
// ════════════════════════════════════════════════════════════════════════════

/// Number of landmarks in one hand snapshot.
pub const LANDMARK_COUNT: usize = 21;

/// The 21 named hand landmarks, in model order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Landmark {
    Wrist           = 0,
    ThumbCmc        = 1,
    ThumbMcp        = 2,
    ThumbIp         = 3,
    ThumbTip        = 4,
    IndexMcp        = 5,
    IndexPip        = 6,
    IndexDip        = 7,
    IndexTip        = 8,
    MiddleMcp       = 9,
    MiddlePip       = 10,
    MiddleDip       = 11,
    MiddleTip       = 12,
    RingMcp         = 13,
    RingPip         = 14,
    RingDip         = 15,
    RingTip         = 16,
    PinkyMcp        = 17,
    PinkyPip        = 18,
    PinkyDip        = 19,
    PinkyTip        = 20,
}

impl Landmark {
    pub const ALL: [Landmark; LANDMARK_COUNT] = [
        Landmark::Wrist,
        Landmark::ThumbCmc,  Landmark::ThumbMcp,  Landmark::ThumbIp,   Landmark::ThumbTip,
        Landmark::IndexMcp,  Landmark::IndexPip,  Landmark::IndexDip,  Landmark::IndexTip,
        Landmark::MiddleMcp, Landmark::MiddlePip, Landmark::MiddleDip, Landmark::MiddleTip,
        Landmark::RingMcp,   Landmark::RingPip,   Landmark::RingDip,   Landmark::RingTip,
        Landmark::PinkyMcp,  Landmark::PinkyPip,  Landmark::PinkyDip,  Landmark::PinkyTip,
    ];

    /// Position of this landmark in the snapshot array.
    pub fn index(self) -> usize { self as usize }
}

/// Bones of the hand skeleton, as landmark pairs.  Used to draw the hand
/// over the camera frame.
pub const HAND_CONNECTIONS: [(Landmark, Landmark); 21] = [
    (Landmark::Wrist,     Landmark::ThumbCmc),
    (Landmark::ThumbCmc,  Landmark::ThumbMcp),
    (Landmark::ThumbMcp,  Landmark::ThumbIp),
    (Landmark::ThumbIp,   Landmark::ThumbTip),
    (Landmark::Wrist,     Landmark::IndexMcp),
    (Landmark::IndexMcp,  Landmark::IndexPip),
    (Landmark::IndexPip,  Landmark::IndexDip),
    (Landmark::IndexDip,  Landmark::IndexTip),
    (Landmark::IndexMcp,  Landmark::MiddleMcp),
    (Landmark::MiddleMcp, Landmark::MiddlePip),
    (Landmark::MiddlePip, Landmark::MiddleDip),
    (Landmark::MiddleDip, Landmark::MiddleTip),
    (Landmark::MiddleMcp, Landmark::RingMcp),
    (Landmark::RingMcp,   Landmark::RingPip),
    (Landmark::RingPip,   Landmark::RingDip),
    (Landmark::RingDip,   Landmark::RingTip),
    (Landmark::RingMcp,   Landmark::PinkyMcp),
    (Landmark::Wrist,     Landmark::PinkyMcp),
    (Landmark::PinkyMcp,  Landmark::PinkyPip),
    (Landmark::PinkyPip,  Landmark::PinkyDip),
    (Landmark::PinkyDip,  Landmark::PinkyTip),
];

// ════════════════════════════════════════════════════════════════════════════
// HandSnapshot
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error, PartialEq)]
pub enum SnapshotError {
    #[error("expected 21 landmarks, got {0}")]
    WrongCount(usize),
}

/// All landmarks of one detected hand in one frame.
///
/// Immutable once built; a new snapshot is produced for every frame and
/// carries no identity across frames.
#[derive(Clone, Debug, PartialEq)]
pub struct HandSnapshot {
    points:         [Point; LANDMARK_COUNT],
    /// Detector confidence, 0.0–1.0.
    pub confidence: f32,
}

impl HandSnapshot {
    pub fn from_points(points: [Point; LANDMARK_COUNT]) -> Self {
        HandSnapshot { points, confidence: 1.0 }
    }

    /// Build from a detector's landmark list.  Fails unless exactly
    /// [`LANDMARK_COUNT`] points are supplied.
    pub fn from_slice(points: &[Point]) -> Result<Self, SnapshotError> {
        let points: [Point; LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| SnapshotError::WrongCount(points.len()))?;
        Ok(Self::from_points(points))
    }

    /// Every landmark at the same position.
    pub fn uniform(p: Point) -> Self { Self::from_points([p; LANDMARK_COUNT]) }

    /// Builder-style replacement of one landmark.
    pub fn with(mut self, landmark: Landmark, p: impl Into<Point>) -> Self {
        self.points[landmark.index()] = p.into();
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn get(&self, landmark: Landmark) -> Point { self.points[landmark.index()] }

    pub fn points(&self) -> &[Point; LANDMARK_COUNT] { &self.points }

    /// Distance between two landmarks.
    pub fn distance(&self, a: Landmark, b: Landmark) -> f32 {
        self.get(a).distance(self.get(b))
    }

    pub fn is_finite(&self) -> bool { self.points.iter().all(|p| p.is_finite()) }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

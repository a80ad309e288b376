//! Gesture classifier — geometric rules over one [`HandSnapshot`].
//!
//! Every gesture has an independent predicate.  The rules are *not*
//! mutually exclusive (a tight fist also satisfies "pointing down"), so
//! [`Classifier::classify`] evaluates them in [`Gesture::PRIORITY`] order
//! and the first one that holds wins.
//!
//! ## Rules (default thresholds)
//!
//! | Gesture | Rule |
//! |---|---|
//! | ClosedFist | index, middle, ring tips within 0.3 of wrist **and** thumb tip within 0.4 |
//! | PointingDown | index tip below wrist, horizontal offset < 0.2 |
//! | OpenFist | index, middle, ring tips farther than 0.2 from wrist **and** index–middle tips within 0.15 |
//! | ThumbsUp | thumb tip above both thumb IP joint and index tip |
//! | PointingUp | index tip above wrist, horizontal offset < 0.2 |
//! | PointingRight | index tip right of wrist, vertical offset < 0.4 |
//! | PointingLeft | index tip left of wrist, vertical offset < 0.4 |
//!
//! "OpenFist" models fingers extended *and held together*; a widely spread
//! hand fails the index–middle clause.  "ThumbsUp" only looks at the thumb,
//! so a pointing hand with the thumb cocked upward also matches.
//!
//! Non-finite coordinates make every comparison false, so a degenerate
//! snapshot classifies as no gesture instead of failing.

use std::fmt;

use crate::landmarks::{HandSnapshot, Landmark};

// ════════════════════════════════════════════════════════════════════════════
// Gesture
// ════════════════════════════════════════════════════════════════════════════

/// A recognised hand gesture.  "No gesture" is `Option::<Gesture>::None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Gesture {
    ClosedFist,
    OpenFist,
    PointingRight,
    PointingLeft,
    PointingUp,
    PointingDown,
    ThumbsUp,
}

impl Gesture {
    /// Evaluation order; earlier entries win ties.
    pub const PRIORITY: [Gesture; 7] = [
        Gesture::ClosedFist,
        Gesture::PointingDown,
        Gesture::OpenFist,
        Gesture::ThumbsUp,
        Gesture::PointingUp,
        Gesture::PointingRight,
        Gesture::PointingLeft,
    ];

    /// Overlay text.
    pub fn name(self) -> &'static str {
        match self {
            Gesture::ClosedFist    => "Closed Fist",
            Gesture::OpenFist      => "Open Fist",
            Gesture::PointingRight => "Pointing Right",
            Gesture::PointingLeft  => "Pointing Left",
            Gesture::PointingUp    => "Pointing Up",
            Gesture::PointingDown  => "Pointing Down",
            Gesture::ThumbsUp      => "Thumbs Up",
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Thresholds
// ════════════════════════════════════════════════════════════════════════════

/// Tunable distances, all in normalised frame units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    /// ClosedFist: max index/middle/ring tip → wrist distance.
    pub fist_finger_radius:  f32,
    /// ClosedFist: max thumb tip → wrist distance.
    pub fist_thumb_radius:   f32,
    /// OpenFist: min index/middle/ring tip → wrist distance.
    pub open_finger_radius:  f32,
    /// OpenFist: max index tip → middle tip distance.
    pub open_tip_gap:        f32,
    /// PointingLeft/Right: max vertical index → wrist offset.
    pub horizontal_max_dy:   f32,
    /// PointingUp/Down: max horizontal index → wrist offset.
    pub vertical_max_dx:     f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            fist_finger_radius: 0.3,
            fist_thumb_radius:  0.4,
            open_finger_radius: 0.2,
            open_tip_gap:       0.15,
            horizontal_max_dy:  0.4,
            vertical_max_dx:    0.2,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Predicates
// ════════════════════════════════════════════════════════════════════════════

const FINGER_TIPS: [Landmark; 3] = [Landmark::IndexTip, Landmark::MiddleTip, Landmark::RingTip];

pub fn is_closed_fist(hand: &HandSnapshot, t: &Thresholds) -> bool {
    FINGER_TIPS.iter().all(|&tip| hand.distance(tip, Landmark::Wrist) < t.fist_finger_radius)
        && hand.distance(Landmark::ThumbTip, Landmark::Wrist) < t.fist_thumb_radius
}

pub fn is_open_fist(hand: &HandSnapshot, t: &Thresholds) -> bool {
    FINGER_TIPS.iter().all(|&tip| hand.distance(tip, Landmark::Wrist) > t.open_finger_radius)
        && hand.distance(Landmark::MiddleTip, Landmark::IndexTip) < t.open_tip_gap
}

pub fn is_pointing_right(hand: &HandSnapshot, t: &Thresholds) -> bool {
    let (tip, wrist) = (hand.get(Landmark::IndexTip), hand.get(Landmark::Wrist));
    tip.x > wrist.x && (tip.y - wrist.y).abs() < t.horizontal_max_dy
}

pub fn is_pointing_left(hand: &HandSnapshot, t: &Thresholds) -> bool {
    let (tip, wrist) = (hand.get(Landmark::IndexTip), hand.get(Landmark::Wrist));
    tip.x < wrist.x && (tip.y - wrist.y).abs() < t.horizontal_max_dy
}

pub fn is_pointing_up(hand: &HandSnapshot, t: &Thresholds) -> bool {
    let (tip, wrist) = (hand.get(Landmark::IndexTip), hand.get(Landmark::Wrist));
    tip.y < wrist.y && (tip.x - wrist.x).abs() < t.vertical_max_dx
}

pub fn is_pointing_down(hand: &HandSnapshot, t: &Thresholds) -> bool {
    let (tip, wrist) = (hand.get(Landmark::IndexTip), hand.get(Landmark::Wrist));
    tip.y > wrist.y && (tip.x - wrist.x).abs() < t.vertical_max_dx
}

/// Thumb tip is the topmost of thumb tip, thumb IP joint and index tip.
/// The other fingers are not checked.
pub fn is_thumbs_up(hand: &HandSnapshot, _t: &Thresholds) -> bool {
    let thumb = hand.get(Landmark::ThumbTip).y;
    thumb < hand.get(Landmark::ThumbIp).y && thumb < hand.get(Landmark::IndexTip).y
}

// ════════════════════════════════════════════════════════════════════════════
// Classifier
// ════════════════════════════════════════════════════════════════════════════

/// Stateless first-match-wins classifier.
#[derive(Clone, Copy, Debug, Default)]
pub struct Classifier {
    pub thresholds: Thresholds,
}

impl Classifier {
    pub fn new(thresholds: Thresholds) -> Self { Classifier { thresholds } }

    /// Does `gesture`'s rule hold for `hand`?
    pub fn holds(&self, gesture: Gesture, hand: &HandSnapshot) -> bool {
        let t = &self.thresholds;
        match gesture {
            Gesture::ClosedFist    => is_closed_fist(hand, t),
            Gesture::OpenFist      => is_open_fist(hand, t),
            Gesture::PointingRight => is_pointing_right(hand, t),
            Gesture::PointingLeft  => is_pointing_left(hand, t),
            Gesture::PointingUp    => is_pointing_up(hand, t),
            Gesture::PointingDown  => is_pointing_down(hand, t),
            Gesture::ThumbsUp      => is_thumbs_up(hand, t),
        }
    }

    /// The highest-priority gesture whose rule holds, if any.
    pub fn classify(&self, hand: &HandSnapshot) -> Option<Gesture> {
        Gesture::PRIORITY.into_iter().find(|&g| self.holds(g, hand))
    }

    /// Every gesture whose rule holds, in priority order.
    pub fn matches(&self, hand: &HandSnapshot) -> Vec<Gesture> {
        Gesture::PRIORITY.into_iter().filter(|&g| self.holds(g, hand)).collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

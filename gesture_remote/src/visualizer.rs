//! Software-rendered overlay window using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌───────────────────────────────────────────┬──────────────┐
//! │ GESTURE NAME / NO HAND DETECTED           │ [ START ]    │
//! │                                           │  STOPPED     │
//! │        camera frame + hand skeleton       │              │
//! │                                           │  key legend  │
//! │                                           │              │
//! ├───────────────────────────────────────────┴──────────────┤
//! │ last action                                              │
//! │ error                                                    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! All drawing goes through [`Canvas`], which needs no window and is what
//! the tests exercise.

use std::sync::mpsc::Sender;
use std::time::Duration;

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use gesture_core::{Gesture, HandSnapshot, Point, HAND_CONNECTIONS, NO_HAND_TEXT};

use crate::detector::SimPose;
use crate::frame::Frame;
use crate::task::SharedStatus;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:     usize = 860;
pub const WIN_H:     usize = 560;
pub const VIEW_W:    usize = 640;
pub const VIEW_H:    usize = 480;
const PANEL_X:       usize = VIEW_W;
const BUTTON:        Rect  = Rect { x: PANEL_X + 20, y: 20, w: 180, h: 44 };
const BG_COLOR:      u32   = 0xFF1A1A2E;
const PANEL_BG:      u32   = 0xFF16213E;
const TEXT_BG:       u32   = 0xFF0F3460;
const OVERLAY_COLOR: u32   = 0xFF00FF00;  // green, like the classic camera overlay
const BONE_COLOR:    u32   = 0xFFFFFFFF;
const JOINT_COLOR:   u32   = 0xFFFF3030;
const START_COLOR:   u32   = 0xFF2E8B57;
const STOP_COLOR:    u32   = 0xFFB22222;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl Rect {
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x as f32 && py >= self.y as f32
            && px < (self.x + self.w) as f32 && py < (self.y + self.h) as f32
    }
}

/// Keys `1`–`7` select these poses in simulation mode.
pub const POSE_KEYS: [(Key, Gesture); 7] = [
    (Key::Key1, Gesture::ClosedFist),
    (Key::Key2, Gesture::OpenFist),
    (Key::Key3, Gesture::ThumbsUp),
    (Key::Key4, Gesture::PointingUp),
    (Key::Key5, Gesture::PointingDown),
    (Key::Key6, Gesture::PointingRight),
    (Key::Key7, Gesture::PointingLeft),
];

// ════════════════════════════════════════════════════════════════════════════
// Canvas — pixel buffer plus primitive drawing
// ════════════════════════════════════════════════════════════════════════════

pub struct Canvas {
    pub width:  usize,
    pub height: usize,
    pub buf:    Vec<u32>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Canvas { width, height, buf: vec![BG_COLOR; width * height] }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.buf[y * self.width + x])
    }

    pub fn clear(&mut self, color: u32) { self.buf.fill(color); }

    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                self.buf[row * self.width + col] = color;
            }
        }
    }

    pub fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        for col in x..x + w {
            self.set_pixel(col, y, color);
            self.set_pixel(col, y + h - 1, color);
        }
        for row in y..y + h {
            self.set_pixel(x, row, color);
            self.set_pixel(x + w - 1, row, color);
        }
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < self.width && y < self.height {
            self.buf[y * self.width + x] = color;
        }
    }

    fn set_pixel_i(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize, color);
        }
    }

    /// Bresenham line.
    pub fn draw_line(&mut self, x0: isize, y0: isize, x1: isize, y1: isize, color: u32) {
        let (dx, dy) = ((x1 - x0).abs(), -(y1 - y0).abs());
        let (sx, sy) = (if x0 < x1 { 1 } else { -1 }, if y0 < y1 { 1 } else { -1 });
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        loop {
            self.set_pixel_i(x, y, color);
            if x == x1 && y == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x += sx; }
            if e2 <= dx { err += dx; y += sy; }
        }
    }

    pub fn draw_dot(&mut self, cx: isize, cy: isize, r: isize, color: u32) {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.set_pixel_i(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// Nearest-neighbour scale `frame` into the given rectangle.
    pub fn blit_frame(&mut self, frame: &Frame, dest: Rect) {
        if frame.is_empty() { return; }
        let argb = frame.to_argb();
        for row in 0..dest.h {
            let sy = row * frame.height / dest.h;
            for col in 0..dest.w {
                let sx = col * frame.width / dest.w;
                self.set_pixel(dest.x + col, dest.y + row, argb[sy * frame.width + sx]);
            }
        }
    }

    /// Bones and joints of `hand`, with normalised coordinates mapped
    /// into `dest`.
    pub fn draw_hand(&mut self, hand: &HandSnapshot, dest: Rect) {
        let to_px = |p: Point| {
            (dest.x as isize + (p.x * dest.w as f32) as isize,
             dest.y as isize + (p.y * dest.h as f32) as isize)
        };
        for (a, b) in HAND_CONNECTIONS {
            let (x0, y0) = to_px(hand.get(a));
            let (x1, y1) = to_px(hand.get(b));
            self.draw_line(x0, y0, x1, y1, BONE_COLOR);
        }
        for p in hand.points() {
            let (x, y) = to_px(*p);
            self.draw_dot(x, y, 3, JOINT_COLOR);
        }
    }

    /// 3×5 bitmap text; `scale` multiplies each font pixel.
    pub fn draw_label(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let scale = scale.max(1);
        let mut cx = x;
        for ch in text.chars() {
            if cx + 3 * scale > self.width { break; }
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Screen composition
// ════════════════════════════════════════════════════════════════════════════

const VIEW: Rect = Rect { x: 0, y: 0, w: VIEW_W, h: VIEW_H };

/// Draw a complete screen for `status` into `canvas`.
pub fn compose(canvas: &mut Canvas, status: &SharedStatus, simulation: bool) {
    canvas.clear(BG_COLOR);

    // ── camera view ───────────────────────────────────────────────────────
    match &status.frame {
        Some(frame) if status.running => canvas.blit_frame(frame, VIEW),
        _ => canvas.draw_label("CAMERA OFF", VIEW_W / 2 - 60, VIEW_H / 2 - 6, 3, 0xFF555577),
    }
    if let Some(hand) = &status.landmarks {
        canvas.draw_hand(hand, VIEW);
    }
    let overlay = if status.running { status.overlay } else { NO_HAND_TEXT };
    canvas.draw_label(&overlay.to_uppercase(), 10, 12, 4, OVERLAY_COLOR);

    // ── side panel ────────────────────────────────────────────────────────
    canvas.fill_rect(PANEL_X, 0, WIN_W - PANEL_X, VIEW_H, PANEL_BG);
    let (label, color) = if status.running { ("STOP", STOP_COLOR) } else { ("START", START_COLOR) };
    canvas.fill_rect(BUTTON.x, BUTTON.y, BUTTON.w, BUTTON.h, color);
    canvas.draw_border(BUTTON.x, BUTTON.y, BUTTON.w, BUTTON.h, 0xFFEEEEEE);
    let text_w = label.len() * 4 * 3;
    canvas.draw_label(label, BUTTON.x + (BUTTON.w - text_w) / 2, BUTTON.y + 15, 3, 0xFFFFFFFF);

    let state = if status.running { "RUNNING" } else { "STOPPED" };
    canvas.draw_label(state, PANEL_X + 20, 80, 2, 0xFFAADDFF);
    canvas.draw_label(&format!("frames: {}", status.frames), PANEL_X + 20, 100, 1, 0xFF888888);

    let mut y = 130;
    canvas.draw_label("G / click = start/stop", PANEL_X + 10, y, 1, 0xFFCCCCCC);
    y += 12;
    canvas.draw_label("Q / Esc = quit", PANEL_X + 10, y, 1, 0xFFCCCCCC);
    if simulation {
        y += 24;
        canvas.draw_label("SIMULATED HAND", PANEL_X + 10, y, 1, 0xFFFFD700);
        for (i, (_, g)) in POSE_KEYS.iter().enumerate() {
            y += 12;
            canvas.draw_label(&format!("{} = {}", i + 1, g), PANEL_X + 10, y, 1, 0xFFCCCCCC);
        }
        y += 12;
        canvas.draw_label("0 = no hand", PANEL_X + 10, y, 1, 0xFFCCCCCC);
    }

    // ── status bar ────────────────────────────────────────────────────────
    canvas.fill_rect(0, VIEW_H, WIN_W, WIN_H - VIEW_H, TEXT_BG);
    if let Some(action) = &status.last_action {
        canvas.draw_label(action, 10, VIEW_H + 14, 2, 0xFFEEEEEE);
    }
    if let Some(err) = &status.error {
        canvas.draw_label(err, 10, VIEW_H + 44, 2, 0xFFFF6666);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer — window + input
// ════════════════════════════════════════════════════════════════════════════

/// What the user asked for this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UiInput {
    pub toggle: bool,
    pub quit:   bool,
}

pub struct Visualizer {
    window:     Window,
    canvas:     Canvas,
    sim_tx:     Option<Sender<SimPose>>,
    mouse_was:  bool,
}

impl Visualizer {
    /// `sim_tx` is present in simulation mode; pose keys are forwarded to it.
    pub fn new(sim_tx: Option<Sender<SimPose>>) -> Result<Self, minifb::Error> {
        let mut window = Window::new(
            "Gesture Remote",
            WIN_W, WIN_H,
            WindowOptions { resize: false, ..WindowOptions::default() },
        )?;
        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

        Ok(Visualizer { window, canvas: Canvas::new(WIN_W, WIN_H), sim_tx, mouse_was: false })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    pub fn poll_input(&mut self) -> UiInput {
        let mut input = UiInput::default();
        if !self.window.is_open() {
            input.quit = true;
            return input;
        }
        let pressed = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);

        input.quit = pressed(Key::Q) || pressed(Key::Escape);
        input.toggle = pressed(Key::G);

        if let Some(tx) = &self.sim_tx {
            for (key, gesture) in POSE_KEYS {
                if pressed(key) {
                    log::debug!("simulated pose: {}", gesture);
                    let _ = tx.send(SimPose::Hand(gesture));
                }
            }
            if pressed(Key::Key0) {
                let _ = tx.send(SimPose::NoHand);
            }
        }

        // Click = press edge inside the button.
        let down = self.window.get_mouse_down(MouseButton::Left);
        if down && !self.mouse_was {
            if let Some((mx, my)) = self.window.get_mouse_pos(MouseMode::Discard) {
                input.toggle |= BUTTON.contains(mx, my);
            }
        }
        self.mouse_was = down;

        input
    }

    /// Compose the next screen.  Cheap; safe to call with the status lock
    /// held.
    pub fn draw(&mut self, status: &SharedStatus) {
        compose(&mut self.canvas, status, self.sim_tx.is_some());
    }

    /// Push the composed screen to the window.  Blocks for the frame-rate
    /// limit, so call it without holding the status lock.
    pub fn present(&mut self) {
        if let Err(e) = self.window.update_with_buffer(&self.canvas.buf, WIN_W, WIN_H) {
            log::warn!("window update failed: {}", e);
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '#' => [0b101, 0b111, 0b101, 0b111, 0b101],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '\'' => [0b010, 0b010, 0b000, 0b000, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

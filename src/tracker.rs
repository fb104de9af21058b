//! Press tracking: button geometry, the live interaction session and the
//! resistance mapping used for on-screen feedback.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, k: f64) -> Vec2 {
        Vec2::new(self.x * k, self.y * k)
    }
}

/// Button rectangle in page coordinates, as measured by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Pointer position relative to the top-left corner of the button.
    pub fn local(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x - self.left, p.y - self.top)
    }
}

/// One press-to-release cycle.
///
/// `distance` is never stored: it is always derived from the current
/// displacement so the two cannot drift apart.
#[derive(Debug, Clone)]
pub struct Session {
    origin: Vec2,
    grab_offset: Vec2,
    real_position: Vec2,
    pub started_at: u64,
    pub action_counter: u32,
    pub hold_fired: bool,
}

impl Session {
    /// `real_position` is where the button actually is at press time; it
    /// differs from `origin` when a return animation was interrupted.
    pub fn begin(origin: Vec2, real_position: Vec2, pointer: Vec2, t: u64) -> Self {
        Self {
            origin,
            grab_offset: pointer - real_position,
            real_position,
            started_at: t,
            action_counter: 0,
            hold_fired: false,
        }
    }

    /// Move the grab point to `pointer`, keeping the offset captured at press.
    pub fn track(&mut self, pointer: Vec2) {
        self.real_position = pointer - self.grab_offset;
    }

    pub fn real_position(&self) -> Vec2 {
        self.real_position
    }

    pub fn displacement(&self) -> Vec2 {
        self.real_position - self.origin
    }

    pub fn distance(&self) -> f64 {
        self.displacement().length()
    }
}

/// Saturating offset magnitude: `(1 - s/(d+s)) * max_drag`, with
/// `s = max_drag * stop_speed_factor`. Approaches `max_drag` but never reaches it.
pub fn resistance(distance: f64, max_drag: f64, stop_speed_factor: f64) -> f64 {
    let stop = max_drag * stop_speed_factor;
    if distance <= 0.0 || distance + stop <= 0.0 {
        return 0.0;
    }
    (1.0 - stop / (distance + stop)) * max_drag
}

/// Raw displacement → displayed offset along the same direction.
pub fn resisted_offset(displacement: Vec2, max_drag: f64, stop_speed_factor: f64) -> Vec2 {
    let d = displacement.length();
    if d <= 0.0 || !d.is_finite() {
        return Vec2::ZERO;
    }
    displacement * (resistance(d, max_drag, stop_speed_factor) / d)
}

/// Which of the four directions have an action behind them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisMask {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

/// Zero any displayed component that points toward an unbound direction.
pub fn lock_axes(offset: Vec2, mask: AxisMask) -> Vec2 {
    let mut out = offset;
    if (out.y > 0.0 && !mask.down) || (out.y < 0.0 && !mask.up) {
        out.y = 0.0;
    }
    if (out.x > 0.0 && !mask.right) || (out.x < 0.0 && !mask.left) {
        out.x = 0.0;
    }
    out
}

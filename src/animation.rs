//! Return-to-origin animation.

use std::f64::consts::PI;

use crate::tracker::Vec2;

/// Exponent of the non-bouncing ease-out curve.
const EASE_OUT_POWER: f64 = 1.675;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    /// `1 - (1-p)^1.675`, monotonic, no overshoot.
    EaseOut,
    /// `1 - 2^(-10p) * cos(2πp / damping)`; smaller damping bounces more.
    Spring { damping: f64 },
}

impl Easing {
    pub fn from_damping(damping: f64) -> Self {
        if damping >= 2.0 {
            Easing::EaseOut
        } else {
            Easing::Spring { damping }
        }
    }

    pub fn apply(self, progress: f64) -> f64 {
        let p = progress.clamp(0.0, 1.0);
        match self {
            Easing::EaseOut => 1.0 - (1.0 - p).powf(EASE_OUT_POWER),
            Easing::Spring { damping } => {
                1.0 - 2f64.powf(-10.0 * p) * (p * PI * 2.0 / damping).cos()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Remaining raw displacement from the origin (before resistance).
    pub displacement: Vec2,
    pub done: bool,
}

#[derive(Debug, Clone, Copy)]
struct Run {
    from: Vec2,
    started_at: u64,
    last: Vec2,
}

#[derive(Debug, Clone)]
pub struct ReturnAnimator {
    duration_ms: u64,
    easing: Easing,
    run: Option<Run>,
}

impl ReturnAnimator {
    pub fn new(duration_ms: u64, easing: Easing) -> Self {
        Self {
            duration_ms,
            easing,
            run: None,
        }
    }

    pub fn start(&mut self, from: Vec2, now: u64) {
        self.run = Some(Run {
            from,
            started_at: now,
            last: from,
        });
    }

    pub fn is_active(&self) -> bool {
        self.run.is_some()
    }

    /// Stop in place. Returns the last reported displacement, which is where
    /// the button visually is.
    pub fn cancel(&mut self) -> Option<Vec2> {
        self.run.take().map(|r| r.last)
    }

    pub fn sample(&mut self, now: u64) -> Option<Frame> {
        let run = self.run.as_mut()?;
        let elapsed = now.saturating_sub(run.started_at);
        let progress = if self.duration_ms == 0 {
            1.0
        } else {
            (elapsed as f64 / self.duration_ms as f64).min(1.0)
        };

        if progress >= 1.0 {
            self.run = None;
            return Some(Frame {
                displacement: Vec2::ZERO,
                done: true,
            });
        }

        let eased = self.easing.apply(progress);
        run.last = run.from * (1.0 - eased);
        Some(Frame {
            displacement: run.last,
            done: false,
        })
    }
}

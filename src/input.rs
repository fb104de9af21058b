//! Raw mouse/touch events and their normalization into one pointer stream.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::tracker::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawKind {
    MouseDown,
    MouseMove,
    MouseUp,
    TouchStart,
    TouchMove,
    TouchEnd,
    TouchCancel,
}

impl RawKind {
    fn source(self) -> Source {
        match self {
            RawKind::MouseDown | RawKind::MouseMove | RawKind::MouseUp => Source::Mouse,
            _ => Source::Touch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPointerEvent {
    pub t: u64,
    pub kind: RawKind,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Start,
    Move,
    End,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
    pub t: u64,
    pub phase: Phase,
}

impl PointerSample {
    pub fn new(phase: Phase, x: f64, y: f64, t: u64) -> Self {
        Self { x, y, t, phase }
    }

    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Mouse,
    Touch,
}

/// Unifies mouse and touch into one stream.
///
/// Touch devices emit a compatibility mouse press shortly after `touch_end`;
/// that press and everything up to its release are swallowed.
#[derive(Debug, Clone)]
pub struct PointerNormalizer {
    guard_ms: u64,
    last_touch_end: Option<u64>,
    active: Option<Source>,
    swallowing: bool,
}

impl PointerNormalizer {
    pub fn new(guard_ms: u64) -> Self {
        Self {
            guard_ms,
            last_touch_end: None,
            active: None,
            swallowing: false,
        }
    }

    pub fn normalize(&mut self, ev: &RawPointerEvent) -> Option<PointerSample> {
        let source = ev.kind.source();

        if source == Source::Mouse && self.swallowing {
            match ev.kind {
                RawKind::MouseUp => {
                    self.swallowing = false;
                    return None;
                }
                // a press outside the guard window is real even if the
                // compatibility release never arrived
                RawKind::MouseDown if !self.within_guard(ev.t) => self.swallowing = false,
                _ => return None,
            }
        }

        if let Some(active) = self.active {
            if active != source {
                debug!("input: dropping {:?} while {:?} press is active", ev.kind, active);
                return None;
            }
        }

        let phase = match ev.kind {
            RawKind::MouseDown => {
                if self.within_guard(ev.t) {
                    debug!("input: suppressing compatibility mouse press at t={}", ev.t);
                    self.swallowing = true;
                    return None;
                }
                self.active = Some(Source::Mouse);
                Phase::Start
            }
            RawKind::TouchStart => {
                self.swallowing = false;
                self.active = Some(Source::Touch);
                Phase::Start
            }
            RawKind::MouseMove | RawKind::TouchMove => {
                self.active?;
                Phase::Move
            }
            RawKind::MouseUp => {
                self.active.take()?;
                Phase::End
            }
            RawKind::TouchEnd => {
                self.last_touch_end = Some(ev.t);
                self.active.take()?;
                Phase::End
            }
            RawKind::TouchCancel => {
                self.last_touch_end = Some(ev.t);
                self.active.take()?;
                Phase::Cancel
            }
        };

        Some(PointerSample::new(phase, ev.x, ev.y, ev.t))
    }

    fn within_guard(&self, t: u64) -> bool {
        self.last_touch_end
            .is_some_and(|end| t.saturating_sub(end) < self.guard_ms)
    }
}

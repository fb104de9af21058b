use serde::{Deserialize, Serialize};

use crate::tracker::Vec2;

/// Highest click multiplicity the widget knows a gesture for.
pub const MAX_CLICK_MULTIPLICITY: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureId {
    Up,
    Down,
    Left,
    Right,
    Click,
    DoubleClick,
    TripleClick,
    QuadrupleClick,
    FivefoldClick,
    SixfoldClick,
    Hold,
}

impl GestureId {
    pub const ALL: [GestureId; 11] = [
        GestureId::Up,
        GestureId::Down,
        GestureId::Left,
        GestureId::Right,
        GestureId::Click,
        GestureId::DoubleClick,
        GestureId::TripleClick,
        GestureId::QuadrupleClick,
        GestureId::FivefoldClick,
        GestureId::SixfoldClick,
        GestureId::Hold,
    ];

    pub fn from_click_count(n: u8) -> Option<GestureId> {
        Some(match n {
            1 => GestureId::Click,
            2 => GestureId::DoubleClick,
            3 => GestureId::TripleClick,
            4 => GestureId::QuadrupleClick,
            5 => GestureId::FivefoldClick,
            6 => GestureId::SixfoldClick,
            _ => return None,
        })
    }

    pub fn click_count(self) -> Option<u8> {
        Some(match self {
            GestureId::Click => 1,
            GestureId::DoubleClick => 2,
            GestureId::TripleClick => 3,
            GestureId::QuadrupleClick => 4,
            GestureId::FivefoldClick => 5,
            GestureId::SixfoldClick => 6,
            _ => return None,
        })
    }

    /// Key used for this gesture in a profile's `[bindings]` table.
    pub fn binding_key(self) -> &'static str {
        match self {
            GestureId::Up => "up",
            GestureId::Down => "down",
            GestureId::Left => "left",
            GestureId::Right => "right",
            GestureId::Click => "center",
            GestureId::DoubleClick => "double",
            GestureId::TripleClick => "triple",
            GestureId::QuadrupleClick => "quadruple",
            GestureId::FivefoldClick => "fivefold",
            GestureId::SixfoldClick => "sixfold",
            GestureId::Hold => "hold",
        }
    }

    pub fn from_binding_key(key: &str) -> Option<GestureId> {
        let key = key.trim().to_ascii_lowercase();
        match key.as_str() {
            "click" => Some(GestureId::Click),
            "double_click" => Some(GestureId::DoubleClick),
            "triple_click" => Some(GestureId::TripleClick),
            other => GestureId::ALL
                .into_iter()
                .find(|g| g.binding_key() == other),
        }
    }
}

/// Whether a classification runs on release or from the hold timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    Release,
    Repeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Small displacement on the first hold evaluation.
    Hold,
    /// Small displacement on release; feeds the click accumulator.
    Tap,
    Swipe(GestureId),
    /// Small displacement on a later repeat tick: nothing to do.
    Nothing,
}

/// Dominant-axis direction. `|dx| == |dy|` falls through to the vertical axis.
pub fn swipe_direction(d: Vec2) -> GestureId {
    if d.x.abs() > d.y.abs() {
        if d.x > 0.0 {
            GestureId::Right
        } else {
            GestureId::Left
        }
    } else if d.y > 0.0 {
        GestureId::Down
    } else {
        GestureId::Up
    }
}

pub fn classify(
    displacement: Vec2,
    deadzone: f64,
    mode: ResolveMode,
    action_counter: u32,
) -> Resolution {
    if displacement.length() < deadzone {
        match mode {
            ResolveMode::Repeat if action_counter == 0 => Resolution::Hold,
            ResolveMode::Repeat => Resolution::Nothing,
            ResolveMode::Release => Resolution::Tap,
        }
    } else {
        Resolution::Swipe(swipe_direction(displacement))
    }
}

/// Multi-click counter. Lives across presses; the engine owns the debounce
/// timer that decides when the count is final.
#[derive(Debug, Clone, Default)]
pub struct ClickAccumulator {
    count: u8,
}

impl ClickAccumulator {
    pub fn register(&mut self) -> u8 {
        self.count = self.count.saturating_add(1);
        self.count
    }

    pub fn count(&self) -> u8 {
        self.count
    }

    pub fn take(&mut self) -> u8 {
        std::mem::take(&mut self.count)
    }
}

use serde::Serialize;

use crate::tracker::{Bounds, Vec2};

/// Start radius as a fraction of the button's longer side.
const START_RADIUS_RATIO: f64 = 0.2;

/// Expanding ripple for a press, in button-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ripple {
    pub center: Vec2,
    pub radius: f64,
    /// Scale at which the ripple reaches the furthest corner.
    pub scale: f64,
}

pub fn ripple_for(bounds: &Bounds, pointer: Vec2) -> Ripple {
    let local = bounds.local(pointer);
    let radius = bounds.width.max(bounds.height) * START_RADIUS_RATIO;

    let corner_x = if local.x > bounds.width / 2.0 {
        0.0
    } else {
        bounds.width
    };
    let corner_y = if local.y > bounds.height / 2.0 {
        0.0
    } else {
        bounds.height
    };
    let reach = (Vec2::new(corner_x, corner_y) - local).length();

    let scale = if radius > 0.0 { reach / radius } else { 0.0 };
    Ripple {
        center: local,
        radius,
        scale,
    }
}

//! Pan/zoom state and its clamping rules.

use serde::{Deserialize, Serialize};

use crate::ChartConfig;

/// Scale `k` followed by translation `(x, y)`, applied to unzoomed chart units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        k: 1.0,
        x: 0.0,
        y: 0.0,
    };

    pub fn new(k: f64, x: f64, y: f64) -> Self {
        Self { k, x, y }
    }

    pub fn apply_x(&self, value: f64) -> f64 {
        value * self.k + self.x
    }

    pub fn apply_y(&self, value: f64) -> f64 {
        value * self.k + self.y
    }

    pub fn invert_x(&self, position: f64) -> f64 {
        (position - self.x) / self.k
    }

    pub fn invert_y(&self, position: f64) -> f64 {
        (position - self.y) / self.k
    }

    /// Moves by `(dx, dy)` expressed in unzoomed units.
    fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            k: self.k,
            x: self.x + self.k * dx,
            y: self.y + self.k * dy,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Box, in unzoomed units, that the visible area may not leave.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TranslateExtent {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl TranslateExtent {
    /// Extent for a timeline of `timeline_width`, with half a viewport of
    /// slack on both sides at minimum zoom and a small vertical overscroll.
    pub fn for_layout(timeline_width: f64, viewport: ViewportSize, config: &ChartConfig) -> Self {
        let min_zoom = config.min_zoom;
        let margin = config.axis_margin;
        Self {
            x0: -viewport.width / 2.0 / min_zoom,
            y0: (-viewport.height + margin) / min_zoom * (1.0 - min_zoom),
            x1: timeline_width + viewport.width / 2.0 / min_zoom,
            y1: (viewport.height - margin) / min_zoom,
        }
    }
}

/// Label density for zoom `k`: one label every `2^(4(1-k))` days, kept
/// within one day and two weeks.
pub fn tick_frequency(k: f64) -> u32 {
    let days = 2f64.powf(4.0 * (1.0 - k)).floor();
    if days.is_nan() {
        return 1;
    }
    days.clamp(1.0, 14.0) as u32
}

/// Owner of the current [`Transform`]; the only place it changes.
#[derive(Debug, Clone)]
pub struct ViewportController {
    transform: Transform,
    min_zoom: f64,
    max_zoom: f64,
}

impl ViewportController {
    pub fn new(config: &ChartConfig) -> Self {
        Self {
            transform: Transform::IDENTITY,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
        }
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn tick_frequency(&self) -> u32 {
        tick_frequency(self.transform.k)
    }

    pub fn reset(&mut self) {
        self.transform = Transform::IDENTITY;
    }

    /// Clamps a requested transform and stores it.
    ///
    /// Out-of-range or non-finite values never fail: the scale is clamped to
    /// the zoom range, and the translation is pulled back until the viewport
    /// lies inside `extent` (or is centred on it when it cannot fit).
    pub fn apply_gesture(
        &mut self,
        requested: Transform,
        viewport: ViewportSize,
        extent: &TranslateExtent,
    ) -> Transform {
        let k = if requested.k.is_nan() {
            self.transform.k
        } else {
            requested.k.clamp(self.min_zoom, self.max_zoom)
        };
        let x = finite_or(requested.x, self.transform.x);
        let y = finite_or(requested.y, self.transform.y);

        let clamped = constrain(Transform { k, x, y }, viewport, extent);
        if clamped != requested {
            log::debug!("gesture {requested:?} clamped to {clamped:?}");
        }
        self.transform = clamped;
        clamped
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

fn constrain(transform: Transform, viewport: ViewportSize, extent: &TranslateExtent) -> Transform {
    let dx0 = transform.invert_x(0.0) - extent.x0;
    let dx1 = transform.invert_x(viewport.width) - extent.x1;
    let dy0 = transform.invert_y(0.0) - extent.y0;
    let dy1 = transform.invert_y(viewport.height) - extent.y1;
    transform.translate(pull_back(dx0, dx1), pull_back(dy0, dy1))
}

/// Shift along one axis: centre when the viewport is wider than the
/// extent, otherwise undo whichever edge overshoots.
fn pull_back(d0: f64, d1: f64) -> f64 {
    if d1 > d0 {
        (d0 + d1) / 2.0
    } else if d0 < 0.0 {
        d0
    } else {
        d1.max(0.0)
    }
}

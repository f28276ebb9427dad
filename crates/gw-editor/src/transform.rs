//! Rotation-aware corner resize and ring rotate.
//!
//! Resize works in tile space (`x` = col, `y` = row). The corner opposite
//! the dragged one is the anchor: its world position is captured when the
//! drag starts and every update re-derives the frame around it, so it stays
//! put however the entity is rotated.

use gw_core::geometry::{Corner, GridDims, frame_corner, rotate_vec};
use gw_core::model::{Frame, normalize_rotation};
use kurbo::{Point, Vec2};

#[derive(Debug, Clone, PartialEq)]
pub struct ResizeDrag {
    corner: Corner,
    anchor: Point,
    start: Frame,
    linked: bool,
    min_extent: f64,
}

impl ResizeDrag {
    pub fn begin(frame: &Frame, corner: Corner, linked: bool, min_extent: f64) -> Self {
        Self {
            corner,
            anchor: frame_corner(frame, corner.opposite()),
            start: *frame,
            linked,
            min_extent: min_extent.max(1.0),
        }
    }

    pub fn corner(&self) -> Corner {
        self.corner
    }

    /// World position of the fixed corner.
    pub fn anchor(&self) -> Point {
        self.anchor
    }

    pub fn start(&self) -> &Frame {
        &self.start
    }

    /// The frame for a pointer at `pointer` (tile space), before clamping.
    pub fn resolve(&self, pointer: Point) -> Frame {
        let rotation = self.start.rotation;
        let (sx, sy) = self.corner.signs();
        let local = rotate_vec(pointer - self.anchor, -rotation);

        // Half extents, kept on the dragged corner's side of the anchor.
        let min_half = self.min_extent / 2.0;
        let half_w = (local.x * sx / 2.0).max(min_half);
        let half_h = (local.y * sy / 2.0).max(min_half);

        let mut w = (half_w * 2.0).round().max(1.0);
        let mut h = (half_h * 2.0).round().max(1.0);
        if self.linked {
            let m = w.max(h);
            w = m;
            h = m;
        }

        let center = self.anchor + rotate_vec(Vec2::new(sx * w / 2.0, sy * h / 2.0), rotation);
        Frame {
            row: center.y - h / 2.0,
            col: center.x - w / 2.0,
            w_tiles: w as u32,
            h_tiles: h as u32,
            ..self.start
        }
    }

    /// Resolve and clamp into the grid.
    pub fn update(&self, pointer: Point, dims: GridDims) -> Frame {
        self.resolve(pointer).sanitized(dims)
    }
}

/// Rotation for a start rotation plus a signed delta in degrees, normalized
/// into `[0, 360)`.
pub fn accumulate(start: f64, delta: f64) -> f64 {
    normalize_rotation(start + delta)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RotateDrag {
    center: Point,
    start_angle: f64,
    start_rotation: f64,
}

impl RotateDrag {
    /// `center` and `pointer` share one coordinate space (CSS px).
    pub fn begin(center: Point, pointer: Point, start_rotation: f64) -> Self {
        Self {
            center,
            start_angle: (pointer - center).atan2(),
            start_rotation,
        }
    }

    pub fn start_rotation(&self) -> f64 {
        self.start_rotation
    }

    pub fn update(&self, pointer: Point) -> f64 {
        let angle = (pointer - self.center).atan2();
        accumulate(self.start_rotation, (angle - self.start_angle).to_degrees())
    }
}

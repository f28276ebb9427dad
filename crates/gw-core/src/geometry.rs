//! Grid geometry: CSS-pixel ↔ grid conversions, quantization, footprints,
//! and rotated-corner math shared by hit testing and transforms.
//!
//! Tile space uses `x` for the column axis and `y` for the row axis, so a
//! `kurbo::Point` in tile space is `(col, row)`.

use crate::model::{Frame, StampSettings};
use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDims {
    pub rows: usize,
    pub cols: usize,
}

impl GridDims {
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub fn contains_cell(&self, row: i64, col: i64) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.rows && (col as usize) < self.cols
    }
}

/// A fractional grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub row: f64,
    pub col: f64,
}

impl GridPoint {
    pub const fn new(row: f64, col: f64) -> Self {
        Self { row, col }
    }

    /// Tile-space point (`x` = col, `y` = row).
    pub fn to_point(self) -> Point {
        Point::new(self.col, self.row)
    }

    pub fn from_point(p: Point) -> Self {
        Self::new(p.y, p.x)
    }

    /// The integer cell containing this point.
    pub fn cell(self) -> (i64, i64) {
        (self.row.floor() as i64, self.col.floor() as i64)
    }
}

/// Maps the on-screen canvas (CSS pixels) onto the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasMetrics {
    pub dims: GridDims,
    pub css_width: f64,
    pub css_height: f64,
}

impl CanvasMetrics {
    pub fn new(dims: GridDims, css_width: f64, css_height: f64) -> Self {
        Self {
            dims,
            css_width,
            css_height,
        }
    }

    /// `row = (y/cssHeight)*rows`, `col = (x/cssWidth)*cols`.
    pub fn to_grid(&self, css: Point) -> GridPoint {
        let row = if self.css_height > 0.0 {
            css.y / self.css_height * self.dims.rows as f64
        } else {
            0.0
        };
        let col = if self.css_width > 0.0 {
            css.x / self.css_width * self.dims.cols as f64
        } else {
            0.0
        };
        GridPoint::new(row, col)
    }

    pub fn to_css(&self, gp: GridPoint) -> Point {
        Point::new(
            gp.col * self.tile_px().x,
            gp.row * self.tile_px().y,
        )
    }

    /// On-screen size of one tile.
    pub fn tile_px(&self) -> Vec2 {
        Vec2::new(
            self.css_width / self.dims.cols.max(1) as f64,
            self.css_height / self.dims.rows.max(1) as f64,
        )
    }
}

/// Quantize to a step: `floor(v/step)*step`. A step of 1 is identical to
/// integer snapping. Non-positive steps leave the value untouched.
pub fn quantize(v: f64, step: f64) -> f64 {
    if step > 0.0 && step.is_finite() {
        (v / step).floor() * step
    } else {
        v
    }
}

/// Apply the placement snapping rule of the current settings.
pub fn snap_point(gp: GridPoint, settings: &StampSettings) -> GridPoint {
    if settings.snap_to_grid {
        GridPoint::new(gp.row.floor(), gp.col.floor())
    } else {
        GridPoint::new(
            quantize(gp.row, settings.snap_step),
            quantize(gp.col, settings.snap_step),
        )
    }
}

/// Raster buffer size for a layer. Independent of zoom so freehand strokes
/// keep a constant resolution.
pub fn raster_buffer_size(dims: GridDims, base_tile_px: u32) -> (u32, u32) {
    (
        dims.cols as u32 * base_tile_px,
        dims.rows as u32 * base_tile_px,
    )
}

// ─── Footprint ───────────────────────────────────────────────────────────

/// Axis-aligned tile rectangle an entity occupies, independent of rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub row: f64,
    pub col: f64,
    pub w: f64,
    pub h: f64,
}

impl Footprint {
    pub const fn new(row: f64, col: f64, w: f64, h: f64) -> Self {
        Self { row, col, w, h }
    }

    /// Center a `w×h` footprint on a target.
    ///
    /// Snap-like placement centers on the target *cell* and lands on whole
    /// tiles; free placement centers on the pointer and quantizes to `step`.
    pub fn centered_on(target: GridPoint, w: u32, h: u32, snap_like: bool, step: f64) -> Self {
        let (w, h) = (f64::from(w.max(1)), f64::from(h.max(1)));
        if snap_like {
            let (r, c) = (target.row.floor(), target.col.floor());
            Self::new(
                (r + 0.5 - h / 2.0).floor(),
                (c + 0.5 - w / 2.0).floor(),
                w,
                h,
            )
        } else {
            Self::new(
                quantize(target.row - h / 2.0, step),
                quantize(target.col - w / 2.0, step),
                w,
                h,
            )
        }
    }

    /// Inclusive cell span between two grid points, as used by marquees.
    pub fn spanning(a: GridPoint, b: GridPoint) -> Self {
        let r0 = a.row.min(b.row).floor();
        let c0 = a.col.min(b.col).floor();
        let r1 = a.row.max(b.row).floor() + 1.0;
        let c1 = a.col.max(b.col).floor() + 1.0;
        Self::new(r0, c0, c1 - c0, r1 - r0)
    }

    pub fn end_row(&self) -> f64 {
        self.row + self.h
    }

    pub fn end_col(&self) -> f64 {
        self.col + self.w
    }

    /// Half-open overlap on both axes: `!(aEnd<=bStart || bEnd<=aStart)`.
    pub fn intersects(&self, other: &Footprint) -> bool {
        let rows = !(self.end_row() <= other.row || other.end_row() <= self.row);
        let cols = !(self.end_col() <= other.col || other.end_col() <= self.col);
        rows && cols
    }

    pub fn contains(&self, gp: GridPoint) -> bool {
        gp.row >= self.row && gp.row < self.end_row() && gp.col >= self.col && gp.col < self.end_col()
    }

    /// Clamp into `[0,rows)×[0,cols)`: sizes to `1..=dim`, origin so the far
    /// edge stays in bounds.
    pub fn clamp_into(&self, dims: GridDims) -> Self {
        let max_w = dims.cols.max(1) as f64;
        let max_h = dims.rows.max(1) as f64;
        let w = sanitize_extent(self.w).min(max_w);
        let h = sanitize_extent(self.h).min(max_h);
        let col = finite_or_zero(self.col).clamp(0.0, (dims.cols as f64 - w).max(0.0));
        let row = finite_or_zero(self.row).clamp(0.0, (dims.rows as f64 - h).max(0.0));
        Self::new(row, col, w, h)
    }

    /// Whole cells touched by this footprint, clipped to the grid.
    pub fn covered_cells(&self, dims: GridDims) -> SmallVec<[(usize, usize); 16]> {
        let mut out = SmallVec::new();
        let r0 = self.row.floor().max(0.0) as usize;
        let c0 = self.col.floor().max(0.0) as usize;
        let r1 = (self.end_row().ceil().max(0.0) as usize).min(dims.rows);
        let c1 = (self.end_col().ceil().max(0.0) as usize).min(dims.cols);
        for r in r0..r1 {
            for c in c0..c1 {
                out.push((r, c));
            }
        }
        out
    }

    /// Bounding box of several footprints.
    pub fn union_all<'a>(items: impl IntoIterator<Item = &'a Footprint>) -> Option<Self> {
        let mut it = items.into_iter();
        let first = *it.next()?;
        Some(it.fold(first, |acc, f| {
            let row = acc.row.min(f.row);
            let col = acc.col.min(f.col);
            let end_row = acc.end_row().max(f.end_row());
            let end_col = acc.end_col().max(f.end_col());
            Self::new(row, col, end_col - col, end_row - row)
        }))
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.col, self.row, self.end_col(), self.end_row())
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

fn sanitize_extent(v: f64) -> f64 {
    if v.is_finite() { v.round().max(1.0) } else { 1.0 }
}

// ─── Rotated corners ─────────────────────────────────────────────────────

/// A footprint corner in the entity's local (un-rotated) frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    /// Unit signs `(sx, sy)` of this corner relative to the center.
    pub fn signs(self) -> (f64, f64) {
        match self {
            Corner::TopLeft => (-1.0, -1.0),
            Corner::TopRight => (1.0, -1.0),
            Corner::BottomRight => (1.0, 1.0),
            Corner::BottomLeft => (-1.0, 1.0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomRight => Corner::TopLeft,
            Corner::BottomLeft => Corner::TopRight,
        }
    }
}

/// Rotate a vector by `degrees` (clockwise on a y-down canvas).
pub fn rotate_vec(v: Vec2, degrees: f64) -> Vec2 {
    let p = Affine::rotate(degrees.to_radians()) * v.to_point();
    p.to_vec2()
}

/// World position of a frame corner in tile space, honoring rotation.
pub fn frame_corner(frame: &Frame, corner: Corner) -> Point {
    let (sx, sy) = corner.signs();
    let half = Vec2::new(
        sx * f64::from(frame.w_tiles) / 2.0,
        sy * f64::from(frame.h_tiles) / 2.0,
    );
    frame.center() + rotate_vec(half, frame.rotation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DIMS: GridDims = GridDims::new(10, 10);

    #[test]
    fn css_to_grid_is_proportional() {
        let m = CanvasMetrics::new(GridDims::new(10, 20), 400.0, 200.0);
        let gp = m.to_grid(Point::new(100.0, 50.0));
        assert_eq!(gp, GridPoint::new(2.5, 5.0));
        assert_eq!(m.tile_px(), Vec2::new(20.0, 20.0));
        assert_eq!(m.to_css(gp), Point::new(100.0, 50.0));
    }

    #[test]
    fn step_one_behaves_like_snap() {
        let snap = StampSettings {
            snap_to_grid: true,
            ..StampSettings::default()
        };
        let free_step_one = StampSettings {
            snap_to_grid: false,
            snap_step: 1.0,
            ..StampSettings::default()
        };
        let gp = GridPoint::new(3.7, 2.2);
        assert_eq!(snap_point(gp, &snap), snap_point(gp, &free_step_one));
        assert!(free_step_one.is_snap_like());
    }

    #[test]
    fn fractional_step_quantizes() {
        let s = StampSettings {
            snap_to_grid: false,
            snap_step: 0.25,
            ..StampSettings::default()
        };
        assert_eq!(snap_point(GridPoint::new(3.7, 2.2), &s), GridPoint::new(3.5, 2.0));
        assert!(!s.is_snap_like());
        let raw = StampSettings {
            snap_to_grid: false,
            snap_step: 0.0,
            ..StampSettings::default()
        };
        assert_eq!(snap_point(GridPoint::new(3.7, 2.2), &raw), GridPoint::new(3.7, 2.2));
    }

    #[test]
    fn buffer_size_ignores_zoom() {
        assert_eq!(raster_buffer_size(GridDims::new(10, 20), 32), (640, 320));
    }

    #[test]
    fn centered_stamp_at_origin_clamps_into_grid() {
        let fp = Footprint::centered_on(GridPoint::new(0.0, 0.0), 2, 2, true, 1.0);
        assert_eq!(fp, Footprint::new(-1.0, -1.0, 2.0, 2.0));
        assert_eq!(fp.clamp_into(DIMS), Footprint::new(0.0, 0.0, 2.0, 2.0));
    }

    #[test]
    fn odd_sizes_center_on_cell() {
        let fp = Footprint::centered_on(GridPoint::new(5.3, 5.9), 3, 1, true, 1.0);
        assert_eq!(fp, Footprint::new(5.0, 4.0, 3.0, 1.0));
    }

    #[test]
    fn clamp_respects_far_edge_and_min_size() {
        let fp = Footprint::new(9.0, 8.5, 3.0, 0.0).clamp_into(DIMS);
        assert_eq!(fp, Footprint::new(9.0, 7.0, 3.0, 1.0));
        let huge = Footprint::new(0.0, 0.0, 40.0, 40.0).clamp_into(DIMS);
        assert_eq!(huge, Footprint::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn intersects_is_half_open() {
        let a = Footprint::new(0.0, 0.0, 2.0, 2.0);
        assert!(!a.intersects(&Footprint::new(0.0, 2.0, 1.0, 1.0)));
        assert!(a.intersects(&Footprint::new(1.0, 1.0, 1.0, 1.0)));
        assert!(!a.intersects(&Footprint::new(2.0, 0.0, 1.0, 1.0)));
    }

    #[test]
    fn spanning_covers_inclusive_cells() {
        let fp = Footprint::spanning(GridPoint::new(5.4, 5.1), GridPoint::new(2.2, 2.9));
        assert_eq!(fp, Footprint::new(2.0, 2.0, 4.0, 4.0));
    }

    #[test]
    fn covered_cells_clip_to_grid() {
        let cells = Footprint::new(-1.0, 8.0, 3.0, 2.0).covered_cells(DIMS);
        assert_eq!(cells.as_slice(), &[(0, 8), (0, 9)]);
    }

    #[test]
    fn corners_follow_rotation() {
        let f = Frame {
            row: 0.0,
            col: 0.0,
            w_tiles: 2,
            h_tiles: 2,
            rotation: 90.0,
            ..Frame::default()
        };
        // Top-left (-1,-1) rotated 90° clockwise lands at (1,-1) from center.
        let p = frame_corner(&f, Corner::TopLeft);
        assert!((p.x - 2.0).abs() < 1e-9 && (p.y - 0.0).abs() < 1e-9, "{p:?}");
    }
}

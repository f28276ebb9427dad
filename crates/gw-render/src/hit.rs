//! Hit testing: grid point → entity, pointer → transform handle.
//!
//! Entity lists are painted in order, so the last entry is topmost and
//! lookups walk them in reverse.

use gw_core::geometry::{CanvasMetrics, Corner, Footprint, GridPoint, frame_corner};
use gw_core::id::EntityId;
use gw_core::model::{Frame, Placed};
use kurbo::Point;

/// Find the topmost entity whose footprint contains `gp`.
pub fn hit_test<T: Placed>(items: &[T], gp: GridPoint) -> Option<&T> {
    items
        .iter()
        .rev()
        .find(|item| item.frame().footprint().contains(gp))
}

/// All entities whose footprint intersects `rect`, in paint order.
/// Used for marquee selection.
pub fn hit_test_rect<T: Placed>(items: &[T], rect: &Footprint) -> Vec<EntityId> {
    items
        .iter()
        .filter(|item| item.frame().footprint().intersects(rect))
        .map(Placed::id)
        .collect()
}

fn corner_css(frame: &Frame, corner: Corner, metrics: &CanvasMetrics) -> Point {
    let tile = frame_corner(frame, corner);
    metrics.to_css(GridPoint::from_point(tile))
}

/// The resize handle under `css`, if any. Handles sit on the rotated
/// corners; when several are in reach the nearest wins.
pub fn hit_handle(
    frame: &Frame,
    metrics: &CanvasMetrics,
    css: Point,
    radius_px: f64,
) -> Option<Corner> {
    Corner::ALL
        .into_iter()
        .map(|c| (c, corner_css(frame, c, metrics).distance(css)))
        .filter(|(_, d)| *d <= radius_px)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(c, _)| c)
}

/// Radius of the rotate ring in CSS px: half the on-screen diagonal plus
/// `gap_px`.
pub fn ring_radius(frame: &Frame, metrics: &CanvasMetrics, gap_px: f64) -> f64 {
    let tile = metrics.tile_px();
    let w = f64::from(frame.w_tiles) * tile.x;
    let h = f64::from(frame.h_tiles) * tile.y;
    w.hypot(h) / 2.0 + gap_px
}

/// Whether `css` lies on the invisible rotate ring around `frame`.
pub fn hit_ring(
    frame: &Frame,
    metrics: &CanvasMetrics,
    css: Point,
    gap_px: f64,
    tolerance_px: f64,
) -> bool {
    let center = metrics.to_css(GridPoint::from_point(frame.center()));
    let radius = ring_radius(frame, metrics, gap_px);
    (center.distance(css) - radius).abs() <= tolerance_px
}

//! Freehand brush: EMA-smoothed stroke path with spacing-based stamping.
//!
//! Points are in raster-buffer pixels. Each raw sample pulls the smoothed
//! position toward it by `alpha`; whenever the smoothed position has moved
//! more than `spacing` away from the last stamp, the gap is filled with
//! `ceil(distance / spacing)` evenly spaced stamps.

use gw_core::model::{BlendMode, BrushSettings, clamp_opacity};
use gw_render::{RasterLayer, StampMode};
use image::RgbaImage;
use kurbo::{Point, Vec2};
use smallvec::SmallVec;

pub type Stamps = SmallVec<[Point; 8]>;

/// Stamp spacing in buffer pixels: `max(1, radius * spacing_fraction)`.
pub fn spacing_for(brush: &BrushSettings) -> f64 {
    let s = brush.radius_px * brush.spacing_fraction;
    if s.is_finite() { s.max(1.0) } else { 1.0 }
}

/// Evenly spaced stamp points from `from` (exclusive) to `to` (inclusive).
/// Empty when the points are no farther apart than `spacing`.
pub fn interpolate(from: Point, to: Point, spacing: f64) -> Stamps {
    let d = from.distance(to);
    if !(d > spacing) || spacing <= 0.0 {
        return Stamps::new();
    }
    let n = (d / spacing).ceil() as usize;
    (1..=n)
        .map(|i| from.lerp(to, i as f64 / n as f64))
        .collect()
}

/// State of one in-progress stroke.
#[derive(Debug, Clone)]
pub struct BrushStroke {
    alpha: f64,
    spacing: f64,
    ema: Point,
    last_stamp: Point,
    stamped: usize,
}

impl BrushStroke {
    /// Start a stroke at `start`. The caller stamps `start` itself.
    pub fn begin(start: Point, alpha: f64, spacing: f64) -> Self {
        Self {
            alpha: alpha.clamp(f64::EPSILON, 1.0),
            spacing: spacing.max(1.0),
            ema: start,
            last_stamp: start,
            stamped: 1,
        }
    }

    pub fn smoothed(&self) -> Point {
        self.ema
    }

    /// Total stamps emitted, including the initial one.
    pub fn stamp_count(&self) -> usize {
        self.stamped
    }

    /// Feed one raw sample; returns the stamps it produced.
    pub fn push(&mut self, raw: Point) -> Stamps {
        self.ema += (raw - self.ema) * self.alpha;
        let stamps = interpolate(self.last_stamp, self.ema, self.spacing);
        if let Some(last) = stamps.last() {
            self.last_stamp = *last;
            self.stamped += stamps.len();
        }
        stamps
    }

    /// Feed a batch of coalesced samples in arrival order.
    pub fn advance(&mut self, samples: &[Point]) -> Vec<Point> {
        samples.iter().flat_map(|p| self.push(*p)).collect()
    }
}

/// What each stamp draws.
#[derive(Debug, Clone, Copy)]
pub enum BrushTip<'a> {
    /// Solid disc of the active material color.
    Disc([u8; 4]),
    /// The selected image asset, transformed per stamp settings.
    Image {
        image: &'a RgbaImage,
        rotation: f64,
        flip_x: bool,
        flip_y: bool,
    },
}

/// Composite `tip` at every point.
pub fn stamp_all(
    layer: &mut RasterLayer,
    tip: &BrushTip<'_>,
    points: &[Point],
    brush: &BrushSettings,
    erase: bool,
) {
    let mode = if erase {
        StampMode::Erase
    } else {
        StampMode::Paint(brush.blend)
    };
    let opacity = clamp_opacity(brush.opacity);
    let radius = brush.radius_px.max(0.5);
    for p in points {
        match *tip {
            BrushTip::Disc(color) => layer.stamp_disc(*p, radius, color, opacity, mode),
            BrushTip::Image {
                image,
                rotation,
                flip_x,
                flip_y,
            } => {
                let aspect = f64::from(image.width().max(1)) / f64::from(image.height().max(1));
                let size = Vec2::new(radius * 2.0, radius * 2.0 / aspect);
                layer.stamp_image(image, *p, size, rotation, flip_x, flip_y, opacity, mode);
            }
        }
    }
}

/// The disc color erase strokes use. Only its alpha matters.
pub const ERASE_COLOR: [u8; 4] = [0, 0, 0, 255];

/// Compositing label for logs.
pub fn mode_label(brush: &BrushSettings, erase: bool) -> &'static str {
    if erase {
        return "erase";
    }
    match brush.blend {
        BlendMode::SourceOver => "source-over",
        BlendMode::Multiply => "multiply",
        BlendMode::Screen => "screen",
        BlendMode::Lighten => "lighten",
        BlendMode::Darken => "darken",
    }
}

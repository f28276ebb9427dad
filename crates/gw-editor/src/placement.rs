//! Placement engine: footprints, transforms, and randomization for tile
//! color stamps, image/natural stamps, and token stamps, plus erase.
//!
//! Everything here is a pure planning step. The router turns a plan into
//! host mutator calls.

use gw_core::geometry::{Footprint, GridDims, GridPoint};
use gw_core::id::{AssetId, EntityId};
use gw_core::model::{
    Asset, AssetKind, Frame, PlacedObject, Placed, StampSettings, TileColor, Token, TokenMeta,
    clamp_opacity, normalize_rotation,
};
use gw_render::hit::hit_test_rect;
use rand::Rng;
use smallvec::SmallVec;

/// Resolve `(w, h)` in tiles from the stamp settings.
///
/// `link_xy` forces a square of the single linked size. With only one axis
/// set, the other follows `aspect` (width / height).
pub fn resolve_size(settings: &StampSettings, aspect: f64) -> (u32, u32) {
    let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
    let cols = settings.size_cols.filter(|v| *v > 0);
    let rows = settings.size_rows.filter(|v| *v > 0);
    if settings.link_xy {
        let s = cols.or(rows).unwrap_or(1);
        return (s, s);
    }
    let derive = |v: f64| (v.round() as u32).max(1);
    match (cols, rows) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, derive(f64::from(w) / aspect)),
        (None, Some(h)) => (derive(f64::from(h) * aspect), h),
        (None, None) => (1, derive(1.0 / aspect)),
    }
}

/// Rotation, flips, and opacity of one stamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StampTransform {
    pub rotation: f64,
    pub flip_x: bool,
    pub flip_y: bool,
    pub opacity: f64,
}

impl StampTransform {
    pub fn from_settings(settings: &StampSettings) -> Self {
        Self {
            rotation: normalize_rotation(settings.rotation),
            flip_x: settings.flip_x,
            flip_y: settings.flip_y,
            opacity: clamp_opacity(settings.opacity),
        }
    }
}

/// Each property comes from the asset's randomization when enabled, else
/// from the stamp settings.
pub fn resolve_transform<R: Rng>(
    asset: &Asset,
    settings: &StampSettings,
    rng: &mut R,
) -> StampTransform {
    let mut t = StampTransform::from_settings(settings);
    let r = &asset.randomize;
    if r.rotation {
        t.rotation = f64::from(rng.random_range(0..4u32) * 90);
    }
    if r.flip_x {
        t.flip_x = rng.random_bool(0.5);
    }
    if r.flip_y {
        t.flip_y = rng.random_bool(0.5);
    }
    if let Some((min, max)) = r.opacity {
        t.opacity = clamp_opacity(uniform(rng, min, max));
    }
    t
}

/// Variant index: random when the asset enables it, else the first.
/// Assets without variants have none.
pub fn resolve_variant<R: Rng>(asset: &Asset, rng: &mut R) -> Option<usize> {
    match asset.variants.len() {
        0 => None,
        n if asset.randomize.variant => Some(rng.random_range(0..n)),
        _ => Some(0),
    }
}

fn uniform<R: Rng>(rng: &mut R, a: f64, b: f64) -> f64 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if !(lo.is_finite() && hi.is_finite()) || lo == hi {
        return lo;
    }
    rng.random_range(lo..=hi)
}

/// Plan an image/natural stamp centered on `target`.
pub fn plan_image_stamp<R: Rng>(
    asset: &Asset,
    target: GridPoint,
    dims: GridDims,
    settings: &StampSettings,
    rng: &mut R,
) -> PlacedObject {
    let variant = resolve_variant(asset, rng);
    let (mut w, mut h) = resolve_size(settings, asset.variant_aspect(variant));
    if let Some((min, max)) = asset.randomize.size {
        let scale = uniform(rng, min, max).max(0.0);
        w = ((f64::from(w) * scale).round() as u32).max(1);
        h = ((f64::from(h) * scale).round() as u32).max(1);
    }
    let t = resolve_transform(asset, settings, rng);
    let fp = Footprint::centered_on(target, w, h, settings.is_snap_like(), settings.snap_step)
        .clamp_into(dims);
    PlacedObject {
        id: EntityId::new_object(),
        asset_id: asset.id,
        frame: frame_at(fp, t),
        variant_index: variant,
        link_xy: settings.link_xy.then_some(true),
    }
}

fn frame_at(fp: Footprint, t: StampTransform) -> Frame {
    Frame {
        row: fp.row,
        col: fp.col,
        w_tiles: fp.w as u32,
        h_tiles: fp.h as u32,
        rotation: t.rotation,
        flip_x: t.flip_x,
        flip_y: t.flip_y,
        opacity: t.opacity,
    }
}

/// A batch of tile writes.
#[derive(Debug, Clone, PartialEq)]
pub struct TileStamp {
    pub cells: SmallVec<[(usize, usize); 16]>,
    /// `None` clears the cells.
    pub color: Option<TileColor>,
}

/// Footprint a tile stamp or erase covers at `target`.
pub fn brush_footprint(target: GridPoint, dims: GridDims, settings: &StampSettings) -> Footprint {
    let (w, h) = resolve_size(settings, 1.0);
    Footprint::centered_on(target, w, h, true, 1.0).clamp_into(dims)
}

/// Plan a color stamp. Only fires for color materials, or when erasing.
pub fn plan_color_stamp(
    asset: Option<&Asset>,
    target: GridPoint,
    dims: GridDims,
    settings: &StampSettings,
    erase: bool,
) -> Option<TileStamp> {
    let color = if erase {
        None
    } else {
        Some(asset?.material()?)
    };
    let cells = brush_footprint(target, dims, settings).covered_cells(dims);
    (!cells.is_empty()).then_some(TileStamp { cells, color })
}

/// Objects an erase rectangle removes: every one whose footprint overlaps.
pub fn objects_hit_by_erase(objects: &[PlacedObject], rect: &Footprint) -> Vec<EntityId> {
    hit_test_rect(objects, rect)
}

fn token_size(asset: &Asset, settings: &StampSettings) -> (u32, u32) {
    match asset.native_tiles {
        Some((w, h)) => (w.max(1), h.max(1)),
        None => resolve_size(settings, asset.aspect_ratio),
    }
}

fn make_token(asset: &Asset, fp: Footprint, settings: &StampSettings) -> Token {
    Token {
        id: EntityId::new_token(),
        asset_id: asset.id,
        frame: frame_at(fp, StampTransform::from_settings(settings)),
        link_xy: settings.link_xy.then_some(true),
        meta: TokenMeta {
            name: asset.name.clone(),
            hp: None,
            initiative: None,
        },
        glow_color: asset.glow_default.clone(),
    }
}

/// Plan a token or token-group stamp.
///
/// A single token is centered and clamped like an image stamp. A group
/// places its members left to right starting where the first member would
/// center; each member's column cursor advances by the previous member's
/// width. Unknown or non-token members are skipped.
pub fn plan_token_stamp<'a>(
    asset: &'a Asset,
    lookup: impl Fn(AssetId) -> Option<&'a Asset>,
    target: GridPoint,
    dims: GridDims,
    settings: &StampSettings,
) -> Vec<Token> {
    let snap_like = settings.is_snap_like();
    match asset.kind {
        AssetKind::Token => {
            let (w, h) = token_size(asset, settings);
            let fp = Footprint::centered_on(target, w, h, snap_like, settings.snap_step)
                .clamp_into(dims);
            vec![make_token(asset, fp, settings)]
        }
        AssetKind::TokenGroup => {
            let members: Vec<&Asset> = asset
                .members
                .iter()
                .filter_map(|id| lookup(*id))
                .filter(|m| m.kind == AssetKind::Token)
                .collect();
            let mut out = Vec::with_capacity(members.len());
            let mut cursor: Option<f64> = None;
            for member in members {
                let (w, h) = token_size(member, settings);
                let centered = Footprint::centered_on(target, w, h, snap_like, settings.snap_step);
                let col = cursor.unwrap_or(centered.col);
                let fp = Footprint::new(centered.row, col, centered.w, centered.h).clamp_into(dims);
                cursor = Some(col + centered.w);
                out.push(make_token(member, fp, settings));
            }
            out
        }
        _ => Vec::new(),
    }
}

/// Suppresses repeat stamps onto the same cell within one drag stroke.
#[derive(Debug, Clone, Default)]
pub struct StrokeMemo {
    last_cell: Option<(i64, i64)>,
}

impl StrokeMemo {
    /// Whether a stamp at `cell` should fire. Only snap-like strokes are
    /// deduplicated; free placement always stamps.
    pub fn should_stamp(&mut self, cell: (i64, i64), snap_like: bool) -> bool {
        if snap_like && self.last_cell == Some(cell) {
            return false;
        }
        self.last_cell = Some(cell);
        true
    }
}

/// Check a committed footprint lies inside the grid.
pub fn within_bounds<T: Placed>(item: &T, dims: GridDims) -> bool {
    let fp = item.frame().footprint();
    fp.row >= 0.0
        && fp.col >= 0.0
        && fp.end_row() <= dims.rows as f64
        && fp.end_col() <= dims.cols as f64
        && fp.w >= 1.0
        && fp.h >= 1.0
}

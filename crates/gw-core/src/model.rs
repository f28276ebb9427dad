//! Map data model: tile grids, placed objects, tokens, assets, and the
//! settings/tool state a host hands to the engine each frame.
//!
//! Every entity that can be moved, resized, or rotated carries a [`Frame`];
//! the shared [`Placed`] trait lets transform code treat objects and tokens
//! alike.

use crate::geometry::{Footprint, GridDims};
use crate::id::{AssetId, EntityId};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Lower bound for every opacity the engine commits.
pub const MIN_OPACITY: f64 = 0.05;

/// Clamp an opacity into `[MIN_OPACITY, 1]`. NaN falls back to fully opaque.
pub fn clamp_opacity(opacity: f64) -> f64 {
    if opacity.is_nan() {
        return 1.0;
    }
    opacity.clamp(MIN_OPACITY, 1.0)
}

/// Normalize degrees into `[0, 360)`.
pub fn normalize_rotation(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let r = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if r >= 360.0 { 0.0 } else { r }
}

// ─── Colors ──────────────────────────────────────────────────────────────

/// A tile cell value: either a named palette token (`"grass"`) or a CSS
/// color string (`"#3a5"`, `"rgba(0,0,0,0.5)"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TileColor {
    Named(String),
    Css(String),
}

impl From<String> for TileColor {
    fn from(s: String) -> Self {
        let t = s.trim();
        if t.starts_with('#') || t.starts_with("rgb") {
            TileColor::Css(s)
        } else {
            TileColor::Named(s)
        }
    }
}

impl From<&str> for TileColor {
    fn from(s: &str) -> Self {
        TileColor::from(s.to_string())
    }
}

impl From<TileColor> for String {
    fn from(c: TileColor) -> Self {
        match c {
            TileColor::Named(s) | TileColor::Css(s) => s,
        }
    }
}

impl TileColor {
    pub fn as_str(&self) -> &str {
        match self {
            TileColor::Named(s) | TileColor::Css(s) => s,
        }
    }

    /// Resolve to straight RGBA8. Named tokens need a palette, so they
    /// resolve to `None` here.
    pub fn to_rgba(&self) -> Option<[u8; 4]> {
        match self {
            TileColor::Named(_) => None,
            TileColor::Css(s) => parse_css_color(s),
        }
    }
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Parse `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`, `rgb(r,g,b)` and
/// `rgba(r,g,b,a)` (alpha in `0..=1`).
pub fn parse_css_color(s: &str) -> Option<[u8; 4]> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        let b = hex.as_bytes();
        return match b.len() {
            3 | 4 => {
                let mut out = [255u8; 4];
                for (i, c) in b.iter().enumerate() {
                    out[i] = hex_val(*c)? * 17;
                }
                Some(out)
            }
            6 | 8 => {
                let mut out = [255u8; 4];
                for i in 0..b.len() / 2 {
                    out[i] = hex_val(b[2 * i])? << 4 | hex_val(b[2 * i + 1])?;
                }
                Some(out)
            }
            _ => None,
        };
    }

    let inner = s
        .strip_prefix("rgba(")
        .or_else(|| s.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let mut out = [255u8; 4];
    for (i, p) in parts.iter().take(3).enumerate() {
        out[i] = p.parse::<f64>().ok()?.round().clamp(0.0, 255.0) as u8;
    }
    if let Some(a) = parts.get(3) {
        out[3] = (a.parse::<f64>().ok()?.clamp(0.0, 1.0) * 255.0).round() as u8;
    }
    Some(out)
}

// ─── Grid ────────────────────────────────────────────────────────────────

/// A per-layer 2D array of cell values, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Option<TileColor>>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![None; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn dims(&self) -> GridDims {
        GridDims::new(self.rows, self.cols)
    }

    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&TileColor> {
        if !self.in_bounds(row, col) {
            return None;
        }
        self.cells[row * self.cols + col].as_ref()
    }

    /// Write a cell. Out-of-bounds writes are ignored. Returns whether the
    /// cell value changed.
    pub fn set(&mut self, row: usize, col: usize, value: Option<TileColor>) -> bool {
        if !self.in_bounds(row, col) {
            return false;
        }
        let slot = &mut self.cells[row * self.cols + col];
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }

    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

// ─── Placed entities ─────────────────────────────────────────────────────

/// Position, extent, and appearance of a placed entity, in tile units.
///
/// `row`/`col` name the top-left of the axis-aligned footprint; rotation is
/// applied around the footprint center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub row: f64,
    pub col: f64,
    pub w_tiles: u32,
    pub h_tiles: u32,
    /// Degrees in `[0, 360)`.
    pub rotation: f64,
    pub flip_x: bool,
    pub flip_y: bool,
    pub opacity: f64,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            row: 0.0,
            col: 0.0,
            w_tiles: 1,
            h_tiles: 1,
            rotation: 0.0,
            flip_x: false,
            flip_y: false,
            opacity: 1.0,
        }
    }
}

impl Frame {
    pub fn footprint(&self) -> Footprint {
        Footprint::new(
            self.row,
            self.col,
            f64::from(self.w_tiles),
            f64::from(self.h_tiles),
        )
    }

    /// Footprint center in tile space (`x` = column axis, `y` = row axis).
    pub fn center(&self) -> Point {
        Point::new(
            self.col + f64::from(self.w_tiles) / 2.0,
            self.row + f64::from(self.h_tiles) / 2.0,
        )
    }

    /// Apply the silent corrections every committed frame must satisfy:
    /// sizes ≥ 1 and within the grid, rotation in `[0,360)`, opacity in
    /// `[0.05,1]`, and the footprint inside `[0,rows)×[0,cols)`.
    pub fn sanitized(mut self, dims: GridDims) -> Self {
        let fp = self.footprint().clamp_into(dims);
        self.row = fp.row;
        self.col = fp.col;
        self.w_tiles = fp.w as u32;
        self.h_tiles = fp.h as u32;
        self.rotation = normalize_rotation(self.rotation);
        self.opacity = clamp_opacity(self.opacity);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedObject {
    pub id: EntityId,
    pub asset_id: AssetId,
    #[serde(flatten)]
    pub frame: Frame,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_xy: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenMeta {
    pub name: String,
    pub hp: Option<i32>,
    pub initiative: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: EntityId,
    pub asset_id: AssetId,
    #[serde(flatten)]
    pub frame: Frame,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_xy: Option<bool>,
    #[serde(default)]
    pub meta: TokenMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glow_color: Option<String>,
}

/// Common surface of objects and tokens for transform and selection code.
pub trait Placed: Clone {
    fn id(&self) -> EntityId;
    fn asset_id(&self) -> AssetId;
    fn frame(&self) -> &Frame;
    fn frame_mut(&mut self) -> &mut Frame;
    fn link_xy(&self) -> bool;
}

impl Placed for PlacedObject {
    fn id(&self) -> EntityId {
        self.id
    }
    fn asset_id(&self) -> AssetId {
        self.asset_id
    }
    fn frame(&self) -> &Frame {
        &self.frame
    }
    fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }
    fn link_xy(&self) -> bool {
        self.link_xy.unwrap_or(false)
    }
}

impl Placed for Token {
    fn id(&self) -> EntityId {
        self.id
    }
    fn asset_id(&self) -> AssetId {
        self.asset_id
    }
    fn frame(&self) -> &Frame {
        &self.frame
    }
    fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }
    fn link_xy(&self) -> bool {
        self.link_xy.unwrap_or(false)
    }
}

// ─── Assets ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetKind {
    Image,
    Color,
    Natural,
    Token,
    TokenGroup,
}

impl AssetKind {
    /// Kinds that place a token instead of painting or stamping.
    pub fn is_token(&self) -> bool {
        matches!(self, AssetKind::Token | AssetKind::TokenGroup)
    }

    /// Kinds that become a `PlacedObject` on stamp.
    pub fn is_stampable_image(&self) -> bool {
        matches!(self, AssetKind::Image | AssetKind::Natural)
    }
}

/// Per-placement randomization of a natural asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Randomization {
    pub variant: bool,
    /// One of {0, 90, 180, 270} per stamp.
    pub rotation: bool,
    pub flip_x: bool,
    pub flip_y: bool,
    /// Uniform opacity range, clamped into `[0.05, 1]`.
    pub opacity: Option<(f64, f64)>,
    /// Uniform scale range applied to the resolved stamp size.
    pub size: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetVariant {
    pub name: String,
    #[serde(default)]
    pub aspect_ratio: Option<f64>,
}

/// A library asset. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    pub kind: AssetKind,
    /// Width / height.
    #[serde(default = "one")]
    pub aspect_ratio: f64,
    /// Material color for `Color` assets.
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub variants: Vec<AssetVariant>,
    /// Member token assets of a `TokenGroup`, placed left to right.
    #[serde(default)]
    pub members: Vec<AssetId>,
    #[serde(default)]
    pub glow_default: Option<String>,
    /// Native footprint for tokens; falls back to the stamp size.
    #[serde(default)]
    pub native_tiles: Option<(u32, u32)>,
    #[serde(default)]
    pub randomize: Randomization,
}

fn one() -> f64 {
    1.0
}

impl Asset {
    pub fn new(id: AssetId, name: impl Into<String>, kind: AssetKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            aspect_ratio: 1.0,
            color: None,
            variants: Vec::new(),
            members: Vec::new(),
            glow_default: None,
            native_tiles: None,
            randomize: Randomization::default(),
        }
    }

    /// Material color of a `Color` asset.
    pub fn material(&self) -> Option<TileColor> {
        match self.kind {
            AssetKind::Color => self.color.as_deref().map(TileColor::from),
            _ => None,
        }
    }

    /// Aspect ratio of a variant, falling back to the asset's own.
    pub fn variant_aspect(&self, variant: Option<usize>) -> f64 {
        let ar = variant
            .and_then(|i| self.variants.get(i))
            .and_then(|v| v.aspect_ratio)
            .unwrap_or(self.aspect_ratio);
        if ar.is_finite() && ar > 0.0 { ar } else { 1.0 }
    }
}

// ─── Settings & tool state ───────────────────────────────────────────────

/// "What to stamp next" defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StampSettings {
    pub size_cols: Option<u32>,
    pub size_rows: Option<u32>,
    /// Single linked size: rows follow cols.
    pub link_xy: bool,
    pub rotation: f64,
    pub flip_x: bool,
    pub flip_y: bool,
    pub opacity: f64,
    pub snap_to_grid: bool,
    /// Free-placement quantization step in tiles; `0` disables it.
    pub snap_step: f64,
}

impl Default for StampSettings {
    fn default() -> Self {
        Self {
            size_cols: Some(1),
            size_rows: None,
            link_xy: false,
            rotation: 0.0,
            flip_x: false,
            flip_y: false,
            opacity: 1.0,
            snap_to_grid: true,
            snap_step: 1.0,
        }
    }
}

impl StampSettings {
    /// Snap-like placement: explicit snapping, or a free step of exactly 1.
    pub fn is_snap_like(&self) -> bool {
        self.snap_to_grid || self.snap_step == 1.0
    }
}

/// Compositing mode for freehand stamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    SourceOver,
    Multiply,
    Screen,
    Lighten,
    Darken,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrushSettings {
    /// Radius in raster-buffer pixels.
    pub radius_px: f64,
    /// Stamp spacing as a fraction of the radius.
    pub spacing_fraction: f64,
    pub blend: BlendMode,
    pub opacity: f64,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            radius_px: 12.0,
            spacing_fraction: 0.35,
            blend: BlendMode::SourceOver,
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub zoom: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InteractionMode {
    #[default]
    Draw,
    Select,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrawEngine {
    #[default]
    Grid,
    Freehand,
}

/// Active interaction mode and tool toggles, as set by the host toolbar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolState {
    pub mode: InteractionMode,
    pub engine: DrawEngine,
    pub erase: bool,
    pub pan: bool,
    pub zoom: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_normalizes_into_range() {
        assert_eq!(normalize_rotation(370.0), 10.0);
        assert_eq!(normalize_rotation(-90.0), 270.0);
        assert_eq!(normalize_rotation(360.0), 0.0);
        assert_eq!(normalize_rotation(f64::NAN), 0.0);
        let tiny = normalize_rotation(-1e-15);
        assert!((0.0..360.0).contains(&tiny));
    }

    #[test]
    fn opacity_clamps() {
        assert_eq!(clamp_opacity(0.0), MIN_OPACITY);
        assert_eq!(clamp_opacity(3.0), 1.0);
        assert_eq!(clamp_opacity(0.4), 0.4);
    }

    #[test]
    fn tile_color_classifies_strings() {
        assert!(matches!(TileColor::from("#ff0000"), TileColor::Css(_)));
        assert!(matches!(TileColor::from("rgba(1,2,3,0.5)"), TileColor::Css(_)));
        assert!(matches!(TileColor::from("grass"), TileColor::Named(_)));
    }

    #[test]
    fn css_colors_parse() {
        assert_eq!(parse_css_color("#f00"), Some([255, 0, 0, 255]));
        assert_eq!(parse_css_color("#00ff0080"), Some([0, 255, 0, 128]));
        assert_eq!(parse_css_color("rgb(10, 20, 30)"), Some([10, 20, 30, 255]));
        assert_eq!(parse_css_color("rgba(10,20,30,0.5)"), Some([10, 20, 30, 128]));
        assert_eq!(parse_css_color("#12"), None);
        assert_eq!(TileColor::from("grass").to_rgba(), None);
    }

    #[test]
    fn grid_set_reports_change() {
        let mut g = Grid::new(2, 3);
        assert!(g.set(1, 2, Some("grass".into())));
        assert!(!g.set(1, 2, Some("grass".into())));
        assert!(!g.set(5, 5, Some("grass".into())));
        assert_eq!(g.get(1, 2).map(TileColor::as_str), Some("grass"));
        assert_eq!(g.filled_count(), 1);
    }

    #[test]
    fn frame_sanitize_clamps_everything() {
        let f = Frame {
            row: -3.0,
            col: 9.0,
            w_tiles: 0,
            h_tiles: 20,
            rotation: -45.0,
            opacity: 0.0,
            ..Frame::default()
        }
        .sanitized(GridDims::new(10, 10));
        assert_eq!(f.row, 0.0);
        assert_eq!(f.h_tiles, 10);
        assert_eq!(f.w_tiles, 1);
        assert_eq!(f.col, 9.0);
        assert_eq!(f.rotation, 315.0);
        assert_eq!(f.opacity, MIN_OPACITY);
    }

    #[test]
    fn object_serializes_flat_camel_case() {
        let obj = PlacedObject {
            id: EntityId::intern("o1"),
            asset_id: AssetId::intern("rock"),
            frame: Frame::default(),
            variant_index: Some(2),
            link_xy: None,
        };
        let json = serde_json::to_value(&obj).unwrap();
        assert_eq!(json["wTiles"], 1);
        assert_eq!(json["variantIndex"], 2);
        assert!(json.get("linkXy").is_none());
    }
}

//! Selection sets and the settings-panel synchronization rule.
//!
//! The panel has two targets: the host's stamp defaults (nothing selected)
//! and the live selection. [`LiveEdit`] records which one the panel is
//! currently bound to. A single selection takes absolute values; a
//! multi-selection takes deltas against a neutral baseline, so members of
//! different sizes all move by the same amount.

use gw_core::geometry::{Footprint, GridDims, GridPoint};
use gw_core::id::EntityId;
use gw_core::model::{Frame, Placed, StampSettings, clamp_opacity, normalize_rotation};
use serde::{Deserialize, Serialize};

/// Which entities are selected. Object and token selections are exclusive:
/// selecting one kind clears the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    objects: Vec<EntityId>,
    tokens: Vec<EntityId>,
}

/// The one selected entity, when exactly one is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selected {
    Object(EntityId),
    Token(EntityId),
}

impl Selection {
    pub fn objects(&self) -> &[EntityId] {
        &self.objects
    }

    pub fn tokens(&self) -> &[EntityId] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.objects.len() + self.tokens.len()
    }

    pub fn has_object(&self, id: EntityId) -> bool {
        self.objects.contains(&id)
    }

    pub fn has_token(&self, id: EntityId) -> bool {
        self.tokens.contains(&id)
    }

    pub fn single(&self) -> Option<Selected> {
        match (self.objects.as_slice(), self.tokens.as_slice()) {
            ([id], []) => Some(Selected::Object(*id)),
            ([], [id]) => Some(Selected::Token(*id)),
            _ => None,
        }
    }

    pub fn select_object(&mut self, id: EntityId) {
        self.tokens.clear();
        self.objects.clear();
        self.objects.push(id);
    }

    pub fn select_token(&mut self, id: EntityId) {
        self.objects.clear();
        self.tokens.clear();
        self.tokens.push(id);
    }

    /// Add or remove `id`; returns whether it is now selected.
    pub fn toggle_object(&mut self, id: EntityId) -> bool {
        self.tokens.clear();
        toggle(&mut self.objects, id)
    }

    pub fn toggle_token(&mut self, id: EntityId) -> bool {
        self.objects.clear();
        toggle(&mut self.tokens, id)
    }

    pub fn set_objects(&mut self, ids: Vec<EntityId>) {
        self.tokens.clear();
        self.objects = dedup(ids);
    }

    pub fn set_tokens(&mut self, ids: Vec<EntityId>) {
        self.objects.clear();
        self.tokens = dedup(ids);
    }

    /// Returns whether anything was selected.
    pub fn clear(&mut self) -> bool {
        let had = !self.is_empty();
        self.objects.clear();
        self.tokens.clear();
        had
    }

    /// Drop ids that no longer exist. Returns whether anything was dropped.
    pub fn prune(
        &mut self,
        object_exists: impl Fn(EntityId) -> bool,
        token_exists: impl Fn(EntityId) -> bool,
    ) -> bool {
        let before = self.len();
        self.objects.retain(|id| object_exists(*id));
        self.tokens.retain(|id| token_exists(*id));
        before != self.len()
    }
}

fn toggle(ids: &mut Vec<EntityId>, id: EntityId) -> bool {
    if let Some(i) = ids.iter().position(|x| *x == id) {
        ids.remove(i);
        false
    } else {
        ids.push(id);
        true
    }
}

fn dedup(ids: Vec<EntityId>) -> Vec<EntityId> {
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

/// Inclusive cell rectangle between a marquee's start and current points.
pub fn marquee_rect(start: GridPoint, current: GridPoint) -> Footprint {
    Footprint::spanning(start, current)
}

// ─── Panel values ───────────────────────────────────────────────────────

/// What the settings panel shows and sends back.
///
/// Bound to a single entity these are absolute values. Bound to a
/// multi-selection they are deltas from [`PanelValues::NEUTRAL`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelValues {
    pub size_cols: Option<i32>,
    pub size_rows: Option<i32>,
    pub link_xy: bool,
    pub rotation: f64,
    pub flip_x: bool,
    pub flip_y: bool,
    pub opacity: f64,
}

impl PanelValues {
    /// Multi-edit baseline: no size, rotation, or opacity change.
    pub const NEUTRAL: Self = Self {
        size_cols: Some(0),
        size_rows: Some(0),
        link_xy: false,
        rotation: 0.0,
        flip_x: false,
        flip_y: false,
        opacity: 0.0,
    };

    pub fn from_frame(frame: &Frame, link_xy: bool) -> Self {
        Self {
            size_cols: Some(frame.w_tiles as i32),
            size_rows: Some(frame.h_tiles as i32),
            link_xy,
            rotation: frame.rotation,
            flip_x: frame.flip_x,
            flip_y: frame.flip_y,
            opacity: frame.opacity,
        }
    }

    pub fn from_stamp(s: &StampSettings) -> Self {
        Self {
            size_cols: s.size_cols.map(|v| v as i32),
            size_rows: s.size_rows.map(|v| v as i32),
            link_xy: s.link_xy,
            rotation: s.rotation,
            flip_x: s.flip_x,
            flip_y: s.flip_y,
            opacity: s.opacity,
        }
    }

    /// Write these values into stamp defaults, keeping snapping untouched.
    pub fn to_stamp(&self, base: &StampSettings) -> StampSettings {
        let size = |v: Option<i32>| v.filter(|v| *v > 0).map(|v| v as u32);
        StampSettings {
            size_cols: size(self.size_cols),
            size_rows: size(self.size_rows),
            link_xy: self.link_xy,
            rotation: normalize_rotation(self.rotation),
            flip_x: self.flip_x,
            flip_y: self.flip_y,
            opacity: clamp_opacity(self.opacity),
            ..base.clone()
        }
    }
}

/// What the panel is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LiveEdit {
    /// Edits go to the stamp defaults.
    #[default]
    None,
    Single { values: PanelValues },
    /// `applied` is the delta already pushed into every member.
    Multi { applied: PanelValues },
}

impl LiveEdit {
    /// Panel contents to display.
    pub fn values(&self) -> Option<PanelValues> {
        match self {
            LiveEdit::None => None,
            LiveEdit::Single { values } => Some(*values),
            LiveEdit::Multi { applied } => Some(*applied),
        }
    }
}

/// Re-center a `w×h` footprint on the old center and clamp it.
fn recenter(frame: &mut Frame, w: u32, h: u32, dims: GridDims, snap_like: bool, step: f64) {
    let c = frame.center();
    let fp = Footprint::centered_on(GridPoint::new(c.y, c.x), w, h, snap_like, step).clamp_into(dims);
    frame.row = fp.row;
    frame.col = fp.col;
    frame.w_tiles = fp.w as u32;
    frame.h_tiles = fp.h as u32;
}

/// Apply absolute panel values to one entity.
///
/// Size honors `aspect` (width / height) when only one axis is set and
/// `link_xy` forces a square; position re-centers on the old center.
pub fn apply_absolute<T: Placed>(
    item: &T,
    values: &PanelValues,
    aspect: f64,
    dims: GridDims,
    stamp: &StampSettings,
) -> T {
    let mut out = item.clone();
    let f = *item.frame();
    let pos = |v: Option<i32>| v.filter(|v| *v > 0).map(|v| v as u32);
    let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
    let derive = |v: f64| (v.round() as u32).max(1);
    let (w, h) = match (pos(values.size_cols), pos(values.size_rows)) {
        (Some(w), _) if values.link_xy => (w, w),
        (None, Some(h)) if values.link_xy => (h, h),
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, derive(f64::from(w) / aspect)),
        (None, Some(h)) => (derive(f64::from(h) * aspect), h),
        (None, None) => (f.w_tiles, f.h_tiles),
    };
    let frame = out.frame_mut();
    recenter(frame, w, h, dims, stamp.is_snap_like(), stamp.snap_step);
    frame.rotation = normalize_rotation(values.rotation);
    frame.flip_x = values.flip_x;
    frame.flip_y = values.flip_y;
    frame.opacity = clamp_opacity(values.opacity);
    out
}

/// Apply the change from `applied` to `new` to one multi-selection member.
///
/// A member with its own `link_xy` receives the same delta on both axes:
/// the width delta when non-zero, else the height delta.
pub fn apply_delta<T: Placed>(
    item: &T,
    applied: &PanelValues,
    new: &PanelValues,
    dims: GridDims,
    stamp: &StampSettings,
) -> T {
    let mut out = item.clone();
    let d_cols = i64::from(new.size_cols.unwrap_or(0)) - i64::from(applied.size_cols.unwrap_or(0));
    let d_rows = i64::from(new.size_rows.unwrap_or(0)) - i64::from(applied.size_rows.unwrap_or(0));
    let (d_cols, d_rows) = if item.link_xy() {
        let d = if d_cols != 0 { d_cols } else { d_rows };
        (d, d)
    } else {
        (d_cols, d_rows)
    };
    let f = *item.frame();
    let grow = |v: u32, d: i64| (i64::from(v) + d).max(1) as u32;
    let (w, h) = (grow(f.w_tiles, d_cols), grow(f.h_tiles, d_rows));

    let frame = out.frame_mut();
    if (w, h) != (f.w_tiles, f.h_tiles) {
        recenter(frame, w, h, dims, stamp.is_snap_like(), stamp.snap_step);
    }
    frame.rotation = normalize_rotation(f.rotation + new.rotation - applied.rotation);
    frame.opacity = clamp_opacity(f.opacity + new.opacity - applied.opacity);
    frame.flip_x ^= new.flip_x != applied.flip_x;
    frame.flip_y ^= new.flip_y != applied.flip_y;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use gw_core::id::AssetId;
    use gw_core::model::PlacedObject;
    use pretty_assertions::assert_eq;

    const DIMS: GridDims = GridDims::new(20, 20);

    fn obj(id: &str, col: f64, w: u32) -> PlacedObject {
        PlacedObject {
            id: EntityId::intern(id),
            asset_id: AssetId::intern("crate"),
            frame: Frame {
                row: 4.0,
                col,
                w_tiles: w,
                h_tiles: 2,
                ..Frame::default()
            },
            variant_index: None,
            link_xy: None,
        }
    }

    #[test]
    fn kinds_are_exclusive() {
        let mut s = Selection::default();
        s.select_object(EntityId::intern("a"));
        s.toggle_token(EntityId::intern("t"));
        assert!(s.objects().is_empty());
        assert_eq!(s.single(), Some(Selected::Token(EntityId::intern("t"))));
    }

    #[test]
    fn toggle_adds_and_removes() {
        let mut s = Selection::default();
        let (a, b) = (EntityId::intern("a"), EntityId::intern("b"));
        assert!(s.toggle_object(a));
        assert!(s.toggle_object(b));
        assert_eq!(s.single(), None);
        assert!(!s.toggle_object(a));
        assert_eq!(s.objects(), &[b]);
    }

    #[test]
    fn prune_drops_missing_ids() {
        let mut s = Selection::default();
        s.set_objects(vec![EntityId::intern("live"), EntityId::intern("gone")]);
        let live = EntityId::intern("live");
        assert!(s.prune(|id| id == live, |_| false));
        assert_eq!(s.objects(), &[live]);
        assert!(!s.prune(|id| id == live, |_| false));
    }

    #[test]
    fn multi_delta_keeps_relative_sizes() {
        let stamp = StampSettings::default();
        let applied = PanelValues::NEUTRAL;
        let new = PanelValues {
            size_cols: Some(1),
            ..PanelValues::NEUTRAL
        };
        let a = apply_delta(&obj("a", 0.0, 2), &applied, &new, DIMS, &stamp);
        let b = apply_delta(&obj("b", 6.0, 4), &applied, &new, DIMS, &stamp);
        assert_eq!((a.frame.w_tiles, b.frame.w_tiles), (3, 5));
        assert_eq!((a.frame.h_tiles, b.frame.h_tiles), (2, 2));
    }

    #[test]
    fn repeated_edits_apply_only_the_difference() {
        let stamp = StampSettings::default();
        let step1 = PanelValues {
            rotation: 30.0,
            opacity: -0.2,
            ..PanelValues::NEUTRAL
        };
        let step2 = PanelValues {
            rotation: 45.0,
            opacity: -0.2,
            flip_x: true,
            ..PanelValues::NEUTRAL
        };
        let o = obj("a", 0.0, 2);
        let o = apply_delta(&o, &PanelValues::NEUTRAL, &step1, DIMS, &stamp);
        let o = apply_delta(&o, &step1, &step2, DIMS, &stamp);
        assert_eq!(o.frame.rotation, 45.0);
        assert!((o.frame.opacity - 0.8).abs() < 1e-9);
        assert!(o.frame.flip_x);
    }

    #[test]
    fn linked_member_grows_both_axes() {
        let mut o = obj("l", 0.0, 2);
        o.link_xy = Some(true);
        let new = PanelValues {
            size_rows: Some(2),
            ..PanelValues::NEUTRAL
        };
        let out = apply_delta(&o, &PanelValues::NEUTRAL, &new, DIMS, &StampSettings::default());
        assert_eq!((out.frame.w_tiles, out.frame.h_tiles), (4, 4));
    }

    #[test]
    fn absolute_edit_derives_height_and_recenters() {
        let o = obj("a", 4.0, 2);
        let values = PanelValues {
            size_cols: Some(4),
            size_rows: None,
            ..PanelValues::from_frame(&o.frame, false)
        };
        let out = apply_absolute(&o, &values, 2.0, DIMS, &StampSettings::default());
        assert_eq!((out.frame.w_tiles, out.frame.h_tiles), (4, 2));
        assert_eq!(out.frame.col, 3.0);
        assert_eq!(out.frame.row, 4.0);
    }

    #[test]
    fn absolute_edit_clamps_into_grid() {
        let o = obj("edge", 18.0, 2);
        let values = PanelValues {
            size_cols: Some(8),
            size_rows: Some(8),
            opacity: 0.0,
            rotation: -30.0,
            ..PanelValues::from_frame(&o.frame, false)
        };
        let out = apply_absolute(&o, &values, 1.0, DIMS, &StampSettings::default());
        assert_eq!(out.frame.col + 8.0, 20.0);
        assert_eq!(out.frame.opacity, 0.05);
        assert_eq!(out.frame.rotation, 330.0);
    }

    #[test]
    fn panel_values_use_camel_case() {
        let values = PanelValues::NEUTRAL;
        let json = serde_json::to_value(values).unwrap();
        assert_eq!(json["sizeCols"], 0);
        assert_eq!(json["linkXy"], false);
        let back: PanelValues = serde_json::from_value(json).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn marquee_spans_inclusive_cells() {
        let r = marquee_rect(GridPoint::new(5.5, 2.1), GridPoint::new(2.2, 5.9));
        assert_eq!(r, Footprint::new(2.0, 2.0, 4.0, 4.0));
    }
}

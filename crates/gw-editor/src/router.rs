//! Pointer gesture router.
//!
//! Classifies every pointer-down into exactly one gesture, in priority
//! order: zoom marquee, pan, resize handle, rotate ring, token placement,
//! hidden-layer guard, select-mode hit testing, grid stamping, freehand
//! brushing. The active gesture is a single value owned by [`GridEngine`];
//! moves feed it and pointer-up (on the canvas or anywhere in the window)
//! finalizes and clears it.

use crate::brush::{BrushStroke, BrushTip, ERASE_COLOR, mode_label, spacing_for, stamp_all};
use crate::history::{EntryKind, History, HistoryEntry};
use crate::host::{MapHost, StrokeKind, find_object, find_token, metrics_of};
use crate::input::{InputEvent, Modifiers, PointerButton};
use crate::placement::{
    StrokeMemo, brush_footprint, objects_hit_by_erase, plan_color_stamp, plan_image_stamp,
    plan_token_stamp, within_bounds,
};
use crate::selection::{
    LiveEdit, PanelValues, Selected, Selection, apply_absolute, apply_delta, marquee_rect,
};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::transform::{ResizeDrag, RotateDrag};
use gw_core::config::EngineConfig;
use gw_core::geometry::{CanvasMetrics, Corner, Footprint, GridPoint};
use gw_core::id::{AssetId, EntityId, LayerId};
use gw_core::model::{
    Asset, AssetKind, DrawEngine, Frame, InteractionMode, Placed, PlacedObject, StampSettings,
    Token,
};
use gw_render::hit::{hit_handle, hit_ring, hit_test, hit_test_rect};
use image::RgbaImage;
use kurbo::{Point, Rect};
use log::{debug, trace, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Cursor the host should show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CursorHint {
    #[default]
    Default,
    Crosshair,
    /// Pan is armed.
    Grab,
    Move,
    Resize(Corner),
    Rotate,
    /// A pan is in progress.
    Pan,
}

/// Pointer feedback for previews, updated on every move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoverState {
    /// Cell under the pointer, when inside the grid.
    pub cell: Option<(usize, usize)>,
    pub cursor: CursorHint,
}

/// The in-progress drag, if any.
#[derive(Debug, Clone, PartialEq)]
pub enum DragState {
    Object {
        layer: LayerId,
        id: EntityId,
        start: GridPoint,
        origin: Frame,
    },
    /// Group move; `bounds` is the union of every member's footprint and
    /// must stay inside the grid.
    MultiObject {
        layer: LayerId,
        start: GridPoint,
        origins: Vec<(EntityId, Frame)>,
        bounds: Footprint,
    },
    Token {
        id: EntityId,
        start: GridPoint,
        origin: Frame,
    },
    ResizeObject {
        layer: LayerId,
        id: EntityId,
        drag: ResizeDrag,
    },
    ResizeToken {
        id: EntityId,
        drag: ResizeDrag,
    },
    RotateObject {
        layer: LayerId,
        id: EntityId,
        drag: RotateDrag,
    },
    RotateToken {
        id: EntityId,
        drag: RotateDrag,
    },
    MarqueeObjects {
        layer: LayerId,
        start: GridPoint,
        current: GridPoint,
    },
    MarqueeTokens {
        start: GridPoint,
        current: GridPoint,
    },
    /// CSS-pixel corners of the zoom rectangle.
    ZoomMarquee {
        start: Point,
        current: Point,
    },
}

impl DragState {
    fn cursor(&self) -> CursorHint {
        match self {
            DragState::Object { .. } | DragState::MultiObject { .. } | DragState::Token { .. } => {
                CursorHint::Move
            }
            DragState::ResizeObject { drag, .. } | DragState::ResizeToken { drag, .. } => {
                CursorHint::Resize(drag.corner())
            }
            DragState::RotateObject { .. } | DragState::RotateToken { .. } => CursorHint::Rotate,
            DragState::MarqueeObjects { .. }
            | DragState::MarqueeTokens { .. }
            | DragState::ZoomMarquee { .. } => CursorHint::Crosshair,
        }
    }
}

#[derive(Debug)]
enum StampTarget {
    Tiles(Asset),
    Objects(Asset),
    Erase,
}

#[derive(Debug)]
struct StampStroke {
    layer: LayerId,
    target: StampTarget,
    memo: StrokeMemo,
}

#[derive(Debug)]
enum OwnedTip {
    Disc([u8; 4]),
    Image {
        image: RgbaImage,
        rotation: f64,
        flip_x: bool,
        flip_y: bool,
    },
}

impl OwnedTip {
    fn as_tip(&self) -> BrushTip<'_> {
        match self {
            OwnedTip::Disc(color) => BrushTip::Disc(*color),
            OwnedTip::Image {
                image,
                rotation,
                flip_x,
                flip_y,
            } => BrushTip::Image {
                image,
                rotation: *rotation,
                flip_x: *flip_x,
                flip_y: *flip_y,
            },
        }
    }
}

#[derive(Debug)]
struct BrushGesture {
    layer: LayerId,
    stroke: BrushStroke,
    tip: OwnedTip,
    erase: bool,
}

#[derive(Debug)]
enum Gesture {
    Pan { last: Point },
    Stamp(StampStroke),
    Brush(BrushGesture),
    Drag(DragState),
}

/// The grid interaction engine. Owns gesture, selection, and history
/// state; all map state lives in the [`MapHost`].
#[derive(Debug)]
pub struct GridEngine {
    config: EngineConfig,
    rng: ChaCha8Rng,
    history: History,
    selection: Selection,
    live_edit: LiveEdit,
    gesture: Option<Gesture>,
    hover: HoverState,
    attached: bool,
    space_held: bool,
}

impl Default for GridEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl GridEngine {
    pub fn new(config: EngineConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        };
        Self {
            history: History::new(config.history_depth),
            config,
            rng,
            selection: Selection::default(),
            live_edit: LiveEdit::None,
            gesture: None,
            hover: HoverState::default(),
            attached: false,
            space_held: false,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn live_edit(&self) -> LiveEdit {
        self.live_edit
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn hover(&self) -> HoverState {
        self.hover
    }

    pub fn drag(&self) -> Option<&DragState> {
        match &self.gesture {
            Some(Gesture::Drag(d)) => Some(d),
            _ => None,
        }
    }

    pub fn is_gesture_active(&self) -> bool {
        self.gesture.is_some()
    }

    /// Rectangle of the object/token marquee in progress, for previews.
    pub fn marquee(&self) -> Option<Footprint> {
        match self.drag()? {
            DragState::MarqueeObjects { start, current, .. }
            | DragState::MarqueeTokens { start, current } => Some(marquee_rect(*start, *current)),
            _ => None,
        }
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Open the window-level input subscription.
    pub fn attach(&mut self) {
        if !self.attached {
            debug!("window input subscription attached");
        }
        self.attached = true;
    }

    /// Close the subscription and drop any gesture state.
    pub fn detach<H: MapHost + ?Sized>(&mut self, host: &mut H) {
        self.reset_gesture(host);
        self.space_held = false;
        if self.attached {
            debug!("window input subscription detached");
        }
        self.attached = false;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    // ─── Event entry points ──────────────────────────────────────────────

    /// Events delivered by the grid canvas. Returns whether map or
    /// selection state changed.
    pub fn handle_event<H: MapHost + ?Sized>(&mut self, host: &mut H, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerDown {
                x,
                y,
                button,
                modifiers,
            } => self.pointer_down(host, Point::new(*x, *y), *button, *modifiers),
            InputEvent::PointerMove { .. } => self.pointer_move(host, event),
            InputEvent::PointerUp { x, y, .. } => self.pointer_up(host, Point::new(*x, *y)),
            InputEvent::KeyDown { key, modifiers } => self.key(host, key, *modifiers, true),
            InputEvent::KeyUp { key, modifiers } => self.key(host, key, *modifiers, false),
        }
    }

    /// Events from the window-level subscription: pointer-up anywhere and
    /// keys. Ignored while detached.
    pub fn handle_window_event<H: MapHost + ?Sized>(
        &mut self,
        host: &mut H,
        event: &InputEvent,
    ) -> bool {
        if !self.attached {
            return false;
        }
        match event {
            InputEvent::PointerUp { x, y, .. } => self.pointer_up(host, Point::new(*x, *y)),
            InputEvent::KeyDown { .. } | InputEvent::KeyUp { .. } => self.handle_event(host, event),
            _ => false,
        }
    }

    fn key<H: MapHost + ?Sized>(
        &mut self,
        host: &mut H,
        key: &str,
        modifiers: Modifiers,
        pressed: bool,
    ) -> bool {
        match ShortcutMap::resolve(key, modifiers, pressed) {
            Some(action) => self.run_shortcut(host, action),
            None => false,
        }
    }

    pub fn run_shortcut<H: MapHost + ?Sized>(&mut self, host: &mut H, action: ShortcutAction) -> bool {
        trace!("shortcut {action:?}");
        match action {
            ShortcutAction::Undo => self.undo(host).is_some(),
            ShortcutAction::Redo => self.redo(host).is_some(),
            ShortcutAction::DeleteSelection => self.delete_selection(host),
            ShortcutAction::SelectAll => self.select_all(host),
            ShortcutAction::Cancel => self.cancel(host),
            ShortcutAction::PanHoldStart => {
                self.space_held = true;
                if self.gesture.is_none() {
                    self.hover.cursor = CursorHint::Grab;
                }
                false
            }
            ShortcutAction::PanHoldEnd => {
                self.space_held = false;
                if self.gesture.is_none() {
                    self.hover.cursor = CursorHint::Default;
                }
                false
            }
        }
    }

    /// Abort the active gesture. Mutations it already made stay and remain
    /// undoable. Returns whether a gesture was active.
    pub fn cancel<H: MapHost + ?Sized>(&mut self, host: &mut H) -> bool {
        let active = self.gesture.is_some();
        self.reset_gesture(host);
        active
    }

    fn reset_gesture<H: MapHost + ?Sized>(&mut self, host: &mut H) {
        if self.gesture.take().is_some() {
            trace!("gesture reset");
        }
        self.history.end_batch(&*host);
        self.hover.cursor = CursorHint::Default;
    }

    // ─── Pointer down ────────────────────────────────────────────────────

    fn pointer_down<H: MapHost + ?Sized>(
        &mut self,
        host: &mut H,
        css: Point,
        button: PointerButton,
        modifiers: Modifiers,
    ) -> bool {
        // A stray gesture (missed pointer-up) is closed before a new one.
        if self.gesture.is_some() {
            self.reset_gesture(host);
        }
        let tools = host.tool_state();
        let metrics = metrics_of(&*host);
        let gp = metrics.to_grid(css);

        if tools.zoom {
            if button != PointerButton::Left {
                return false;
            }
            trace!("down: zoom marquee at {css:?}");
            self.hover.cursor = CursorHint::Crosshair;
            self.gesture = Some(Gesture::Drag(DragState::ZoomMarquee {
                start: css,
                current: css,
            }));
            return true;
        }

        if tools.pan || self.space_held || button == PointerButton::Middle {
            trace!("down: pan");
            self.hover.cursor = CursorHint::Pan;
            self.gesture = Some(Gesture::Pan { last: css });
            return true;
        }

        if button != PointerButton::Left {
            return false;
        }

        if self.try_begin_transform(host, css, &metrics) {
            return true;
        }

        if tools.mode == InteractionMode::Draw {
            let token_asset = host
                .selected_asset()
                .and_then(|id| host.asset(id))
                .filter(|a| a.kind.is_token())
                .cloned();
            if let Some(asset) = token_asset {
                return self.place_tokens(host, &asset, gp);
            }
        }

        let layer = host.current_layer();
        if !host.is_layer_visible(layer) {
            trace!("down: {layer:?} hidden, ignored");
            return false;
        }

        match (tools.mode, tools.engine) {
            (InteractionMode::Select, _) => self.begin_select(host, gp, modifiers),
            (InteractionMode::Draw, DrawEngine::Grid) => self.begin_stamp(host, gp, tools.erase),
            (InteractionMode::Draw, DrawEngine::Freehand) => self.begin_brush(host, gp, tools.erase),
        }
    }

    fn begin_drag<H: MapHost + ?Sized>(
        &mut self,
        host: &mut H,
        before: HistoryEntry,
        kind: StrokeKind,
        layer: Option<LayerId>,
        drag: DragState,
    ) {
        self.history.begin_batch(&*host, before);
        host.on_begin_stroke(kind, layer);
        self.hover.cursor = drag.cursor();
        self.gesture = Some(Gesture::Drag(drag));
    }

    /// Frame and link flag of the single selected entity.
    fn single_frame<H: MapHost + ?Sized>(&self, host: &H) -> Option<(Selected, Frame, bool)> {
        let sel = self.selection.single()?;
        match sel {
            Selected::Object(id) => find_object(host, host.current_layer(), id)
                .map(|o| (sel, o.frame, o.link_xy())),
            Selected::Token(id) => find_token(host, id).map(|t| (sel, t.frame, t.link_xy())),
        }
    }

    fn try_begin_transform<H: MapHost + ?Sized>(
        &mut self,
        host: &mut H,
        css: Point,
        metrics: &CanvasMetrics,
    ) -> bool {
        let Some((sel, frame, linked)) = self.single_frame(&*host) else {
            return false;
        };
        let layer = host.current_layer();

        if let Some(corner) = hit_handle(&frame, metrics, css, self.config.handle_hit_px) {
            trace!("down: resize {corner:?} of {sel:?}");
            let drag = ResizeDrag::begin(&frame, corner, linked, self.config.min_extent_tiles);
            match sel {
                Selected::Object(id) => {
                    let before = HistoryEntry::objects(&*host, layer);
                    let state = DragState::ResizeObject { layer, id, drag };
                    self.begin_drag(host, before, StrokeKind::Objects, Some(layer), state);
                }
                Selected::Token(id) => {
                    let before = HistoryEntry::tokens(&*host);
                    let state = DragState::ResizeToken { id, drag };
                    self.begin_drag(host, before, StrokeKind::Tokens, None, state);
                }
            }
            return true;
        }

        let (gap, tolerance) = (self.config.ring_gap_px, self.config.ring_hit_px);
        if hit_ring(&frame, metrics, css, gap, tolerance) {
            trace!("down: rotate {sel:?}");
            let center = metrics.to_css(GridPoint::from_point(frame.center()));
            let drag = RotateDrag::begin(center, css, frame.rotation);
            match sel {
                Selected::Object(id) => {
                    let before = HistoryEntry::objects(&*host, layer);
                    let state = DragState::RotateObject { layer, id, drag };
                    self.begin_drag(host, before, StrokeKind::Objects, Some(layer), state);
                }
                Selected::Token(id) => {
                    let before = HistoryEntry::tokens(&*host);
                    let state = DragState::RotateToken { id, drag };
                    self.begin_drag(host, before, StrokeKind::Tokens, None, state);
                }
            }
            return true;
        }
        false
    }

    fn place_tokens<H: MapHost + ?Sized>(&mut self, host: &mut H, asset: &Asset, gp: GridPoint) -> bool {
        let library: &H = host;
        let tokens = plan_token_stamp(
            asset,
            |id| library.asset(id),
            gp,
            library.dims(),
            library.stamp_settings(),
        );
        if tokens.is_empty() {
            warn!("token asset {:?} produced nothing to place", asset.id);
            return false;
        }
        trace!("down: place {} token(s) of {:?}", tokens.len(), asset.id);
        let before = HistoryEntry::tokens(&*host);
        self.history.record(before);
        host.on_begin_stroke(StrokeKind::Tokens, None);
        let dims = host.dims();
        for token in tokens {
            debug_assert!(
                dims.rows == 0 || dims.cols == 0 || within_bounds(&token, dims),
                "token out of bounds: {:?}",
                token.frame
            );
            host.add_token(token);
        }
        true
    }

    fn begin_select<H: MapHost + ?Sized>(
        &mut self,
        host: &mut H,
        gp: GridPoint,
        modifiers: Modifiers,
    ) -> bool {
        let layer = host.current_layer();
        let additive = modifiers.is_additive();

        let token_hit = if host.is_layer_visible(LayerId::tokens()) {
            hit_test(host.tokens(), gp).map(|t| (t.id, t.frame))
        } else {
            None
        };
        if let Some((id, origin)) = token_hit {
            trace!("down: token {id:?}");
            if additive {
                self.selection.toggle_token(id);
                self.publish_selection(host);
                return true;
            }
            if !self.selection.has_token(id) {
                self.selection.select_token(id);
                self.publish_selection(host);
            }
            let before = HistoryEntry::tokens(&*host);
            let state = DragState::Token {
                id,
                start: gp,
                origin,
            };
            self.begin_drag(host, before, StrokeKind::Tokens, None, state);
            return true;
        }

        let object_hit = hit_test(host.objects(layer), gp).map(|o| (o.id, o.frame));
        if let Some((id, origin)) = object_hit {
            trace!("down: object {id:?}");
            if additive {
                let added = self.selection.toggle_object(id);
                self.publish_selection(host);
                if added && self.selection.objects().len() >= 2 {
                    self.begin_group_move(host, layer, gp);
                }
                return true;
            }
            if self.selection.has_object(id) && self.selection.objects().len() >= 2 {
                self.begin_group_move(host, layer, gp);
                return true;
            }
            if self.selection.single() != Some(Selected::Object(id)) {
                self.selection.select_object(id);
                self.publish_selection(host);
            }
            let before = HistoryEntry::objects(&*host, layer);
            let state = DragState::Object {
                layer,
                id,
                start: gp,
                origin,
            };
            self.begin_drag(host, before, StrokeKind::Objects, Some(layer), state);
            return true;
        }

        trace!("down: empty, marquee");
        if !additive && self.selection.clear() {
            self.publish_selection(host);
        }
        let drag = if layer.is_tokens() {
            DragState::MarqueeTokens {
                start: gp,
                current: gp,
            }
        } else {
            DragState::MarqueeObjects {
                layer,
                start: gp,
                current: gp,
            }
        };
        self.hover.cursor = drag.cursor();
        self.gesture = Some(Gesture::Drag(drag));
        true
    }

    fn begin_group_move<H: MapHost + ?Sized>(&mut self, host: &mut H, layer: LayerId, gp: GridPoint) {
        let origins: Vec<(EntityId, Frame)> = self
            .selection
            .objects()
            .iter()
            .filter_map(|id| find_object(&*host, layer, *id))
            .map(|o| (o.id, o.frame))
            .collect();
        let footprints: Vec<Footprint> = origins.iter().map(|(_, f)| f.footprint()).collect();
        let Some(bounds) = Footprint::union_all(&footprints) else {
            return;
        };
        trace!("down: group move of {}", origins.len());
        let before = HistoryEntry::objects(&*host, layer);
        let state = DragState::MultiObject {
            layer,
            start: gp,
            origins,
            bounds,
        };
        self.begin_drag(host, before, StrokeKind::Objects, Some(layer), state);
    }

    fn begin_stamp<H: MapHost + ?Sized>(&mut self, host: &mut H, gp: GridPoint, erase: bool) -> bool {
        let layer = host.current_layer();
        let asset = host.selected_asset().and_then(|id| host.asset(id)).cloned();
        let (target, before, kind) = if erase {
            let mut parts = vec![HistoryEntry::objects(&*host, layer)];
            parts.extend(HistoryEntry::tiles(&*host, layer));
            (StampTarget::Erase, HistoryEntry::Compound(parts), StrokeKind::Erase)
        } else {
            match asset {
                Some(a) if a.kind == AssetKind::Color => {
                    let Some(before) = HistoryEntry::tiles(&*host, layer) else {
                        warn!("{layer:?} has no tile grid");
                        return false;
                    };
                    (StampTarget::Tiles(a), before, StrokeKind::Tiles)
                }
                Some(a) if a.kind.is_stampable_image() => (
                    StampTarget::Objects(a),
                    HistoryEntry::objects(&*host, layer),
                    StrokeKind::Objects,
                ),
                _ => {
                    trace!("down: nothing to stamp");
                    return false;
                }
            }
        };
        trace!("down: grid stroke {kind:?} on {layer:?}");
        self.history.begin_batch(&*host, before);
        host.on_begin_stroke(kind, Some(layer));
        self.hover.cursor = CursorHint::Crosshair;

        let mut stroke = StampStroke {
            layer,
            target,
            memo: StrokeMemo::default(),
        };
        let changed = self.stamp_at(host, &mut stroke, gp);
        if changed {
            self.history.touch();
        }
        self.gesture = Some(Gesture::Stamp(stroke));
        true
    }

    fn stamp_at<H: MapHost + ?Sized>(
        &mut self,
        host: &mut H,
        stroke: &mut StampStroke,
        gp: GridPoint,
    ) -> bool {
        let dims = host.dims();
        let stamp: StampSettings = host.stamp_settings().clone();
        if !stroke.memo.should_stamp(gp.cell(), stamp.is_snap_like()) {
            return false;
        }
        let layer = stroke.layer;
        match &stroke.target {
            StampTarget::Erase => {
                let fp = brush_footprint(gp, dims, &stamp);
                let cells = fp.covered_cells(dims);
                let had_tiles = host
                    .tile_grid(layer)
                    .is_some_and(|g| cells.iter().any(|&(r, c)| g.get(r, c).is_some()));
                if had_tiles {
                    host.place_tiles(layer, &cells, None);
                }
                let doomed = objects_hit_by_erase(host.objects(layer), &fp);
                for id in &doomed {
                    host.remove_object(layer, *id);
                }
                if !doomed.is_empty() {
                    debug!("erase removed {} object(s)", doomed.len());
                    self.prune_selection(host);
                }
                had_tiles || !doomed.is_empty()
            }
            StampTarget::Tiles(asset) => {
                match plan_color_stamp(Some(asset), gp, dims, &stamp, false) {
                    Some(t) => {
                        host.place_tiles(layer, &t.cells, t.color.as_ref());
                        true
                    }
                    None => false,
                }
            }
            StampTarget::Objects(asset) => {
                let object = plan_image_stamp(asset, gp, dims, &stamp, &mut self.rng);
                trace!("stamp {:?} at {:?}", object.asset_id, object.frame.footprint());
                debug_assert!(
                    dims.rows == 0 || dims.cols == 0 || within_bounds(&object, dims),
                    "stamp out of bounds: {:?}",
                    object.frame
                );
                host.add_object(layer, object);
                true
            }
        }
    }

    fn buffer_point(&self, gp: GridPoint) -> Point {
        let base = f64::from(self.config.base_tile_px);
        Point::new(gp.col * base, gp.row * base)
    }

    fn resolve_tip<H: MapHost + ?Sized>(host: &H, erase: bool) -> Option<OwnedTip> {
        if erase {
            return Some(OwnedTip::Disc(ERASE_COLOR));
        }
        let asset = host.selected_asset().and_then(|id| host.asset(id))?;
        match asset.kind {
            AssetKind::Color => {
                let color = asset.material()?;
                let rgba = color.to_rgba();
                if rgba.is_none() {
                    warn!("material {:?} has no RGBA form, brush disabled", color.as_str());
                }
                rgba.map(OwnedTip::Disc)
            }
            AssetKind::Image | AssetKind::Natural => {
                let image = host.asset_image(asset.id, 0)?.clone();
                let s = host.stamp_settings();
                Some(OwnedTip::Image {
                    image,
                    rotation: s.rotation,
                    flip_x: s.flip_x,
                    flip_y: s.flip_y,
                })
            }
            AssetKind::Token | AssetKind::TokenGroup => None,
        }
    }

    fn begin_brush<H: MapHost + ?Sized>(&mut self, host: &mut H, gp: GridPoint, erase: bool) -> bool {
        let layer = host.current_layer();
        if host.raster_layer(layer).is_none() {
            warn!("{layer:?} has no raster layer for freehand painting");
            return false;
        }
        let Some(tip) = Self::resolve_tip(&*host, erase) else {
            trace!("down: no brush tip");
            return false;
        };
        match HistoryEntry::canvas(&*host, layer) {
            Some(before) => self.history.begin_batch(&*host, before),
            None => self.history.discard_batch(),
        }
        host.on_begin_stroke(StrokeKind::Canvas, Some(layer));

        let brush = host.brush_settings().clone();
        trace!("down: brush stroke ({})", mode_label(&brush, erase));
        let start = self.buffer_point(gp);
        let gesture = BrushGesture {
            layer,
            stroke: BrushStroke::begin(start, self.config.brush_smoothing, spacing_for(&brush)),
            tip,
            erase,
        };
        if Self::paint(host, &gesture, &[start]) {
            self.history.touch();
        }
        self.hover.cursor = CursorHint::Crosshair;
        self.gesture = Some(Gesture::Brush(gesture));
        true
    }

    fn paint<H: MapHost + ?Sized>(host: &mut H, gesture: &BrushGesture, points: &[Point]) -> bool {
        if points.is_empty() {
            return false;
        }
        let brush = host.brush_settings().clone();
        let Some(raster) = host.raster_layer_mut(gesture.layer) else {
            return false;
        };
        stamp_all(raster, &gesture.tip.as_tip(), points, &brush, gesture.erase);
        true
    }

    // ─── Pointer move ────────────────────────────────────────────────────

    fn pointer_move<H: MapHost + ?Sized>(&mut self, host: &mut H, event: &InputEvent) -> bool {
        let Some(css) = event.position() else {
            return false;
        };
        let metrics = metrics_of(&*host);
        let Some(gesture) = self.gesture.take() else {
            self.update_hover(&*host, css, &metrics);
            return false;
        };

        let (gesture, changed) = match gesture {
            Gesture::Pan { last } => {
                let (dx, dy) = (css.x - last.x, css.y - last.y);
                if dx != 0.0 || dy != 0.0 {
                    host.scroll_by(-dx, -dy);
                }
                (Gesture::Pan { last: css }, false)
            }
            Gesture::Stamp(mut stroke) => {
                let mut changed = false;
                for p in event.samples() {
                    changed |= self.stamp_at(host, &mut stroke, metrics.to_grid(p));
                }
                (Gesture::Stamp(stroke), changed)
            }
            Gesture::Brush(mut brush) => {
                let raw: Vec<Point> = event
                    .samples()
                    .iter()
                    .map(|p| self.buffer_point(metrics.to_grid(*p)))
                    .collect();
                let stamps = brush.stroke.advance(&raw);
                let changed = Self::paint(host, &brush, &stamps);
                (Gesture::Brush(brush), changed)
            }
            Gesture::Drag(mut drag) => {
                let changed = self.drag_to(host, &mut drag, css, metrics.to_grid(css));
                (Gesture::Drag(drag), changed)
            }
        };
        self.gesture = Some(gesture);
        self.hover.cell = hover_cell(&metrics, css);
        if changed {
            self.history.touch();
        }
        changed
    }

    fn drag_to<H: MapHost + ?Sized>(
        &mut self,
        host: &mut H,
        drag: &mut DragState,
        css: Point,
        gp: GridPoint,
    ) -> bool {
        let dims = host.dims();
        match drag {
            DragState::Object {
                layer,
                id,
                start,
                origin,
            } => {
                let (dr, dc) = move_delta(host.stamp_settings(), *start, gp);
                let to = Frame {
                    row: origin.row + dr,
                    col: origin.col + dc,
                    ..*origin
                }
                .sanitized(dims);
                match find_object(&*host, *layer, *id) {
                    Some(o) if (o.frame.row, o.frame.col) != (to.row, to.col) => {
                        host.move_object(*layer, *id, to.row, to.col);
                        true
                    }
                    _ => false,
                }
            }
            DragState::MultiObject {
                layer,
                start,
                origins,
                bounds,
            } => {
                let (dr, dc) = move_delta(host.stamp_settings(), *start, gp);
                let dr = clamp_shift(dr, -bounds.row, dims.rows as f64 - bounds.end_row());
                let dc = clamp_shift(dc, -bounds.col, dims.cols as f64 - bounds.end_col());
                let mut changed = false;
                for (id, origin) in origins.iter() {
                    let (row, col) = (origin.row + dr, origin.col + dc);
                    if let Some(o) = find_object(&*host, *layer, *id) {
                        if (o.frame.row, o.frame.col) != (row, col) {
                            host.move_object(*layer, *id, row, col);
                            changed = true;
                        }
                    }
                }
                changed
            }
            DragState::Token { id, start, origin } => {
                let (dr, dc) = move_delta(host.stamp_settings(), *start, gp);
                let to = Frame {
                    row: origin.row + dr,
                    col: origin.col + dc,
                    ..*origin
                }
                .sanitized(dims);
                match find_token(&*host, *id) {
                    Some(t) if (t.frame.row, t.frame.col) != (to.row, to.col) => {
                        host.move_token(*id, to.row, to.col);
                        true
                    }
                    _ => false,
                }
            }
            DragState::ResizeObject { layer, id, drag } => {
                let frame = drag.update(gp.to_point(), dims);
                update_object_frame(host, *layer, *id, |f| *f = frame)
            }
            DragState::ResizeToken { id, drag } => {
                let frame = drag.update(gp.to_point(), dims);
                update_token_frame(host, *id, |f| *f = frame)
            }
            DragState::RotateObject { layer, id, drag } => {
                let rotation = drag.update(css);
                update_object_frame(host, *layer, *id, |f| f.rotation = rotation)
            }
            DragState::RotateToken { id, drag } => {
                let rotation = drag.update(css);
                update_token_frame(host, *id, |f| f.rotation = rotation)
            }
            DragState::MarqueeObjects { current, .. } | DragState::MarqueeTokens { current, .. } => {
                *current = gp;
                false
            }
            DragState::ZoomMarquee { current, .. } => {
                *current = css;
                false
            }
        }
    }

    fn update_hover<H: MapHost + ?Sized>(&mut self, host: &H, css: Point, metrics: &CanvasMetrics) {
        self.hover.cell = hover_cell(metrics, css);
        self.hover.cursor = self.cursor_at(host, css, metrics);
    }

    fn cursor_at<H: MapHost + ?Sized>(&self, host: &H, css: Point, metrics: &CanvasMetrics) -> CursorHint {
        let tools = host.tool_state();
        if tools.zoom {
            return CursorHint::Crosshair;
        }
        if tools.pan || self.space_held {
            return CursorHint::Grab;
        }
        if let Some((_, frame, _)) = self.single_frame(host) {
            if let Some(corner) = hit_handle(&frame, metrics, css, self.config.handle_hit_px) {
                return CursorHint::Resize(corner);
            }
            if hit_ring(&frame, metrics, css, self.config.ring_gap_px, self.config.ring_hit_px) {
                return CursorHint::Rotate;
            }
        }
        match tools.mode {
            InteractionMode::Select => {
                let gp = metrics.to_grid(css);
                let over = hit_test(host.tokens(), gp).is_some()
                    || hit_test(host.objects(host.current_layer()), gp).is_some();
                if over { CursorHint::Move } else { CursorHint::Default }
            }
            InteractionMode::Draw => CursorHint::Crosshair,
        }
    }

    // ─── Pointer up ──────────────────────────────────────────────────────

    fn pointer_up<H: MapHost + ?Sized>(&mut self, host: &mut H, css: Point) -> bool {
        let Some(gesture) = self.gesture.take() else {
            return false;
        };
        let changed = match gesture {
            Gesture::Pan { .. } => false,
            Gesture::Stamp(_) | Gesture::Brush(_) => self.history.end_batch(&*host),
            Gesture::Drag(drag) => self.finish_drag(host, drag, css),
        };
        self.hover.cursor = if self.space_held {
            CursorHint::Grab
        } else {
            CursorHint::Default
        };
        changed
    }

    fn finish_drag<H: MapHost + ?Sized>(&mut self, host: &mut H, drag: DragState, css: Point) -> bool {
        let metrics = metrics_of(&*host);
        match drag {
            DragState::MarqueeObjects { layer, start, .. } => {
                let rect = marquee_rect(start, metrics.to_grid(css));
                let ids = hit_test_rect(host.objects(layer), &rect);
                debug!("marquee {rect:?} selected {} object(s)", ids.len());
                self.selection.set_objects(ids);
                self.publish_selection(host);
                true
            }
            DragState::MarqueeTokens { start, .. } => {
                let rect = marquee_rect(start, metrics.to_grid(css));
                let ids = hit_test_rect(host.tokens(), &rect);
                debug!("marquee {rect:?} selected {} token(s)", ids.len());
                self.selection.set_tokens(ids);
                self.publish_selection(host);
                true
            }
            DragState::ZoomMarquee { start, .. } => {
                let rect = Rect::from_points(start, css);
                let min = self.config.marquee_min_px;
                if rect.width() < min && rect.height() < min {
                    trace!("zoom marquee too small, ignored");
                    return false;
                }
                self.record_view_change(host);
                host.on_zoom_tool_rect(rect);
                true
            }
            DragState::Object { .. }
            | DragState::MultiObject { .. }
            | DragState::Token { .. }
            | DragState::ResizeObject { .. }
            | DragState::ResizeToken { .. }
            | DragState::RotateObject { .. }
            | DragState::RotateToken { .. } => {
                let pushed = self.history.end_batch(&*host);
                if pushed && self.selection.single().is_some() {
                    self.publish_selection(host);
                }
                pushed
            }
        }
    }

    // ─── Selection & panel ───────────────────────────────────────────────

    /// Rebind the panel and notify the host of the current selection.
    fn publish_selection<H: MapHost + ?Sized>(&mut self, host: &mut H) {
        let layer = host.current_layer();
        let objects: Vec<PlacedObject> = self
            .selection
            .objects()
            .iter()
            .filter_map(|id| find_object(&*host, layer, *id))
            .collect();
        let tokens: Vec<Token> = self
            .selection
            .tokens()
            .iter()
            .filter_map(|id| find_token(&*host, *id))
            .collect();
        self.live_edit = match (objects.as_slice(), tokens.as_slice()) {
            ([], []) => LiveEdit::None,
            ([o], []) => LiveEdit::Single {
                values: PanelValues::from_frame(&o.frame, o.link_xy()),
            },
            ([], [t]) => LiveEdit::Single {
                values: PanelValues::from_frame(&t.frame, t.link_xy()),
            },
            _ => LiveEdit::Multi {
                applied: PanelValues::NEUTRAL,
            },
        };
        debug!(
            "selection: {} object(s), {} token(s)",
            objects.len(),
            tokens.len()
        );
        host.on_selection_change(&objects);
        host.on_token_selection_change(&tokens);
    }

    /// Route a settings-panel edit: stamp defaults with nothing selected,
    /// absolute values for one entity, deltas for a multi-selection.
    pub fn apply_panel_edit<H: MapHost + ?Sized>(&mut self, host: &mut H, values: PanelValues) -> bool {
        let dims = host.dims();
        let layer = host.current_layer();
        let stamp = host.stamp_settings().clone();

        if self.selection.is_empty() {
            let next = values.to_stamp(&stamp);
            if next == stamp {
                return false;
            }
            let before = HistoryEntry::settings(&*host);
            self.history.record(before);
            host.on_begin_stroke(StrokeKind::Settings, None);
            host.set_stamp_settings(next);
            return true;
        }

        if let Some(sel) = self.selection.single() {
            return match sel {
                Selected::Object(id) => {
                    let Some(old) = find_object(&*host, layer, id) else {
                        warn!("selected object {id:?} is gone");
                        return false;
                    };
                    let aspect = host
                        .asset(old.asset_id)
                        .map_or(1.0, |a| a.variant_aspect(old.variant_index));
                    let mut new = apply_absolute(&old, &values, aspect, dims, &stamp);
                    if values.link_xy != old.link_xy() {
                        new.link_xy = Some(values.link_xy);
                    }
                    self.live_edit = LiveEdit::Single {
                        values: PanelValues::from_frame(&new.frame, new.link_xy()),
                    };
                    if new == old {
                        return false;
                    }
                    let before = HistoryEntry::objects(&*host, layer);
                    self.history.record(before);
                    host.on_begin_stroke(StrokeKind::Objects, Some(layer));
                    host.update_object(layer, &new);
                    true
                }
                Selected::Token(id) => {
                    let Some(old) = find_token(&*host, id) else {
                        warn!("selected token {id:?} is gone");
                        return false;
                    };
                    let aspect = host.asset(old.asset_id).map_or(1.0, |a| a.aspect_ratio);
                    let mut new = apply_absolute(&old, &values, aspect, dims, &stamp);
                    if values.link_xy != old.link_xy() {
                        new.link_xy = Some(values.link_xy);
                    }
                    self.live_edit = LiveEdit::Single {
                        values: PanelValues::from_frame(&new.frame, new.link_xy()),
                    };
                    if new == old {
                        return false;
                    }
                    let before = HistoryEntry::tokens(&*host);
                    self.history.record(before);
                    host.on_begin_stroke(StrokeKind::Tokens, None);
                    host.update_token(&new);
                    true
                }
            };
        }

        let applied = match self.live_edit {
            LiveEdit::Multi { applied } => applied,
            _ => PanelValues::NEUTRAL,
        };
        self.live_edit = LiveEdit::Multi { applied: values };

        if !self.selection.objects().is_empty() {
            let changed: Vec<PlacedObject> = self
                .selection
                .objects()
                .iter()
                .filter_map(|id| find_object(&*host, layer, *id))
                .filter_map(|o| {
                    let n = apply_delta(&o, &applied, &values, dims, &stamp);
                    (n != o).then_some(n)
                })
                .collect();
            if changed.is_empty() {
                return false;
            }
            let before = HistoryEntry::objects(&*host, layer);
            self.history.record(before);
            host.on_begin_stroke(StrokeKind::Objects, Some(layer));
            for o in &changed {
                host.update_object(layer, o);
            }
        } else {
            let changed: Vec<Token> = self
                .selection
                .tokens()
                .iter()
                .filter_map(|id| find_token(&*host, *id))
                .filter_map(|t| {
                    let n = apply_delta(&t, &applied, &values, dims, &stamp);
                    (n != t).then_some(n)
                })
                .collect();
            if changed.is_empty() {
                return false;
            }
            let before = HistoryEntry::tokens(&*host);
            self.history.record(before);
            host.on_begin_stroke(StrokeKind::Tokens, None);
            for t in &changed {
                host.update_token(t);
            }
        }
        true
    }

    /// Remove every selected object or token as one undo step.
    pub fn delete_selection<H: MapHost + ?Sized>(&mut self, host: &mut H) -> bool {
        self.reset_gesture(host);
        let layer = host.current_layer();
        let objects: Vec<EntityId> = self
            .selection
            .objects()
            .iter()
            .copied()
            .filter(|id| find_object(&*host, layer, *id).is_some())
            .collect();
        let tokens: Vec<EntityId> = self
            .selection
            .tokens()
            .iter()
            .copied()
            .filter(|id| find_token(&*host, *id).is_some())
            .collect();
        if objects.is_empty() && tokens.is_empty() {
            self.prune_selection(host);
            return false;
        }
        if !objects.is_empty() {
            let before = HistoryEntry::objects(&*host, layer);
            self.history.record(before);
            host.on_begin_stroke(StrokeKind::Objects, Some(layer));
            for id in &objects {
                host.remove_object(layer, *id);
            }
        } else {
            let before = HistoryEntry::tokens(&*host);
            self.history.record(before);
            host.on_begin_stroke(StrokeKind::Tokens, None);
            for id in &tokens {
                host.remove_token(*id);
            }
        }
        debug!("deleted {} object(s), {} token(s)", objects.len(), tokens.len());
        self.selection.clear();
        self.publish_selection(host);
        true
    }

    /// Select every object on the current layer, or every token when the
    /// token layer is current.
    pub fn select_all<H: MapHost + ?Sized>(&mut self, host: &mut H) -> bool {
        let layer = host.current_layer();
        if layer.is_tokens() {
            let ids = host.tokens().iter().map(|t| t.id).collect::<Vec<_>>();
            self.selection.set_tokens(ids);
        } else {
            let ids = host.objects(layer).iter().map(|o| o.id).collect::<Vec<_>>();
            self.selection.set_objects(ids);
        }
        self.publish_selection(host);
        !self.selection.is_empty()
    }

    /// Drop selected ids whose entities no longer exist.
    pub fn prune_selection<H: MapHost + ?Sized>(&mut self, host: &mut H) -> bool {
        let layer = host.current_layer();
        let pruned = {
            let objects = host.objects(layer);
            let tokens = host.tokens();
            self.selection.prune(
                |id| objects.iter().any(|o| o.id == id),
                |id| tokens.iter().any(|t| t.id == id),
            )
        };
        if pruned {
            self.publish_selection(host);
        }
        pruned
    }

    /// Remove asset `from` from the library and reassign the objects on
    /// `layer` that use it to `to`, or remove them when `to` is `None`.
    /// Recorded as one bundle undo step.
    pub fn reassign_asset<H: MapHost + ?Sized>(
        &mut self,
        host: &mut H,
        layer: LayerId,
        from: AssetId,
        to: Option<AssetId>,
    ) -> bool {
        if host.asset(from).is_none() {
            warn!("reassign: unknown asset {from:?}");
            return false;
        }
        if let Some(to) = to {
            if to == from || host.asset(to).is_none() {
                warn!("reassign: invalid target {to:?}");
                return false;
            }
        }
        self.reset_gesture(host);
        let before = HistoryEntry::bundle(&*host, layer);
        self.history.record(before);
        host.on_begin_stroke(StrokeKind::Objects, Some(layer));

        let assets: Vec<Asset> = host.assets().iter().filter(|a| a.id != from).cloned().collect();
        host.set_assets(assets);
        let affected: Vec<PlacedObject> = host
            .objects(layer)
            .iter()
            .filter(|o| o.asset_id == from)
            .cloned()
            .collect();
        for mut object in affected {
            match to {
                Some(to) => {
                    object.asset_id = to;
                    object.variant_index = None;
                    host.update_object(layer, &object);
                }
                None => host.remove_object(layer, object.id),
            }
        }
        self.prune_selection(host);
        true
    }

    /// Snapshot the viewport before a zoom or scroll the host is about to
    /// apply.
    pub fn record_view_change<H: MapHost + ?Sized>(&mut self, host: &mut H) {
        let before = HistoryEntry::view(&*host);
        self.history.record(before);
        host.on_begin_stroke(StrokeKind::View, None);
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo<H: MapHost + ?Sized>(&mut self, host: &mut H) -> Option<EntryKind> {
        self.reset_gesture(host);
        let kind = self.history.undo(host)?;
        self.after_history(host);
        Some(kind)
    }

    pub fn redo<H: MapHost + ?Sized>(&mut self, host: &mut H) -> Option<EntryKind> {
        self.reset_gesture(host);
        let kind = self.history.redo(host)?;
        self.after_history(host);
        Some(kind)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn after_history<H: MapHost + ?Sized>(&mut self, host: &mut H) {
        if !self.prune_selection(host) && !self.selection.is_empty() {
            self.publish_selection(host);
        }
    }
}

fn hover_cell(metrics: &CanvasMetrics, css: Point) -> Option<(usize, usize)> {
    let (r, c) = metrics.to_grid(css).cell();
    metrics
        .dims
        .contains_cell(r, c)
        .then_some((r as usize, c as usize))
}

/// Clamp a group shift into `[lo, hi]`, widened to include zero. Bounds
/// that already overhang a shrunken grid give `hi < 0` or `lo > 0`; the
/// group may then stay put or move back in, never further out.
fn clamp_shift(d: f64, lo: f64, hi: f64) -> f64 {
    d.clamp(lo.min(0.0), hi.max(0.0))
}

/// Move offset from the drag start: whole cells when snap-like, otherwise
/// rounded to the snap step.
fn move_delta(stamp: &StampSettings, start: GridPoint, gp: GridPoint) -> (f64, f64) {
    if stamp.is_snap_like() {
        return (
            gp.row.floor() - start.row.floor(),
            gp.col.floor() - start.col.floor(),
        );
    }
    let (dr, dc) = (gp.row - start.row, gp.col - start.col);
    let step = stamp.snap_step;
    if step > 0.0 && step.is_finite() {
        ((dr / step).round() * step, (dc / step).round() * step)
    } else {
        (dr, dc)
    }
}

fn update_object_frame<H: MapHost + ?Sized>(
    host: &mut H,
    layer: LayerId,
    id: EntityId,
    edit: impl FnOnce(&mut Frame),
) -> bool {
    let Some(mut object) = find_object(&*host, layer, id) else {
        return false;
    };
    let before = object.frame;
    edit(&mut object.frame);
    if object.frame == before {
        return false;
    }
    host.update_object(layer, &object);
    true
}

fn update_token_frame<H: MapHost + ?Sized>(
    host: &mut H,
    id: EntityId,
    edit: impl FnOnce(&mut Frame),
) -> bool {
    let Some(mut token) = find_token(&*host, id) else {
        return false;
    };
    let before = token.frame;
    edit(&mut token.frame);
    if token.frame == before {
        return false;
    }
    host.update_token(&token);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryHost;
    use pretty_assertions::assert_eq;

    fn seeded() -> GridEngine {
        GridEngine::new(EngineConfig {
            rng_seed: Some(7),
            ..EngineConfig::default()
        })
    }

    #[test]
    fn move_delta_snaps_to_cells() {
        let s = StampSettings::default();
        let d = move_delta(&s, GridPoint::new(2.9, 2.9), GridPoint::new(3.1, 4.0));
        assert_eq!(d, (1.0, 2.0));
        let free = StampSettings {
            snap_to_grid: false,
            snap_step: 0.5,
            ..StampSettings::default()
        };
        assert_eq!(move_delta(&free, GridPoint::new(0.0, 0.0), GridPoint::new(0.7, 1.2)), (0.5, 1.0));
    }

    #[test]
    fn group_shift_tolerates_overhanging_bounds() {
        assert_eq!(clamp_shift(3.0, -2.0, 1.0), 1.0);
        assert_eq!(clamp_shift(-5.0, -2.0, 1.0), -2.0);
        // Far edge already past the grid: only moves back in are allowed.
        assert_eq!(clamp_shift(1.0, 0.0, -4.0), 0.0);
        assert_eq!(clamp_shift(-1.0, -3.0, -4.0), -1.0);
        // Overhanging both edges: frozen.
        assert_eq!(clamp_shift(2.0, 1.0, -1.0), 0.0);
    }

    #[test]
    fn zoom_tool_wins_over_everything() {
        let mut host = MemoryHost::new(10, 10, 20.0);
        host.tools.zoom = true;
        host.tools.pan = true;
        let mut engine = seeded();
        assert!(engine.handle_event(&mut host, &InputEvent::down(10.0, 10.0)));
        assert!(matches!(engine.drag(), Some(DragState::ZoomMarquee { .. })));
        engine.handle_event(&mut host, &InputEvent::moved(90.0, 70.0));
        assert!(engine.handle_event(&mut host, &InputEvent::up(90.0, 70.0)));
        assert_eq!(
            host.events.last(),
            Some(&crate::memory::HostEvent::ZoomRect(Rect::new(10.0, 10.0, 90.0, 70.0)))
        );
        assert!(engine.can_undo());
    }

    #[test]
    fn tiny_zoom_marquee_is_ignored() {
        let mut host = MemoryHost::new(10, 10, 20.0);
        host.tools.zoom = true;
        let mut engine = seeded();
        engine.handle_event(&mut host, &InputEvent::down(10.0, 10.0));
        assert!(!engine.handle_event(&mut host, &InputEvent::up(11.0, 11.0)));
        assert!(!engine.can_undo());
    }

    #[test]
    fn middle_button_pans() {
        let mut host = MemoryHost::new(10, 10, 20.0);
        let mut engine = seeded();
        let down = InputEvent::down_with(50.0, 50.0, PointerButton::Middle, Modifiers::NONE);
        engine.handle_event(&mut host, &down);
        assert_eq!(engine.hover().cursor, CursorHint::Pan);
        engine.handle_event(&mut host, &InputEvent::moved(40.0, 45.0));
        assert_eq!((host.view.scroll_x, host.view.scroll_y), (10.0, 5.0));
        engine.handle_event(&mut host, &InputEvent::up(40.0, 45.0));
        assert!(!engine.is_gesture_active());
    }

    #[test]
    fn hidden_layer_ignores_drawing() {
        let mut host = MemoryHost::new(10, 10, 20.0);
        host.hidden.insert(host.current_layer);
        let mut engine = seeded();
        assert!(!engine.handle_event(&mut host, &InputEvent::down(15.0, 15.0)));
        assert!(!engine.is_gesture_active());
    }

    #[test]
    fn window_events_need_attach() {
        let mut host = MemoryHost::new(10, 10, 20.0);
        host.tools.pan = true;
        let mut engine = seeded();
        engine.handle_event(&mut host, &InputEvent::down(5.0, 5.0));
        assert!(!engine.handle_window_event(&mut host, &InputEvent::up(500.0, 500.0)));
        assert!(engine.is_gesture_active());

        engine.attach();
        engine.handle_window_event(&mut host, &InputEvent::up(500.0, 500.0));
        assert!(!engine.is_gesture_active());

        engine.handle_event(&mut host, &InputEvent::down(5.0, 5.0));
        engine.detach(&mut host);
        assert!(!engine.is_gesture_active());
        assert!(!engine.is_attached());
    }

    #[test]
    fn hover_tracks_cell() {
        let mut host = MemoryHost::new(10, 10, 20.0);
        let mut engine = seeded();
        engine.handle_event(&mut host, &InputEvent::moved(45.0, 65.0));
        assert_eq!(engine.hover().cell, Some((3, 2)));
        assert_eq!(engine.hover().cursor, CursorHint::Crosshair);
        engine.handle_event(&mut host, &InputEvent::moved(-4.0, 65.0));
        assert_eq!(engine.hover().cell, None);
    }
}

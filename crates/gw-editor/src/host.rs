//! The host interface.
//!
//! The engine owns no map state. Each frame the host exposes read-only views
//! of grids, entity lists, assets, and settings; the engine writes back only
//! through the mutators below. Mutators and notifications default to no-ops,
//! so a host that leaves one out simply gets a gesture that does nothing.

use gw_core::geometry::{CanvasMetrics, GridDims};
use gw_core::id::{AssetId, EntityId, LayerId};
use gw_core::model::{
    Asset, BrushSettings, Grid, PlacedObject, StampSettings, TileColor, Token, ToolState,
    ViewState,
};
use gw_render::RasterLayer;
use image::RgbaImage;
use kurbo::Rect;

/// What kind of mutation a stroke is about to perform, passed to
/// [`MapHost::on_begin_stroke`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrokeKind {
    Tiles,
    Canvas,
    Objects,
    Tokens,
    Erase,
    Settings,
    View,
}

#[allow(unused_variables)]
pub trait MapHost {
    // ─── Reads ───────────────────────────────────────────────────────────

    fn dims(&self) -> GridDims;

    /// On-screen size of the grid canvas in CSS pixels.
    fn canvas_css_size(&self) -> (f64, f64);

    fn current_layer(&self) -> LayerId;

    fn is_layer_visible(&self, layer: LayerId) -> bool {
        true
    }

    fn tile_grid(&self, layer: LayerId) -> Option<&Grid>;

    fn objects(&self, layer: LayerId) -> &[PlacedObject];

    fn tokens(&self) -> &[Token];

    fn assets(&self) -> &[Asset];

    fn asset(&self, id: AssetId) -> Option<&Asset> {
        self.assets().iter().find(|a| a.id == id)
    }

    /// The asset the toolbar has armed for the next stamp.
    fn selected_asset(&self) -> Option<AssetId>;

    fn stamp_settings(&self) -> &StampSettings;

    fn brush_settings(&self) -> &BrushSettings;

    fn tool_state(&self) -> ToolState;

    fn view(&self) -> ViewState;

    /// Decoded pixels of an image asset variant, for freehand image stamps.
    fn asset_image(&self, asset: AssetId, variant: usize) -> Option<&RgbaImage> {
        None
    }

    fn raster_layer(&self, layer: LayerId) -> Option<&RasterLayer> {
        None
    }

    fn raster_layer_mut(&mut self, layer: LayerId) -> Option<&mut RasterLayer> {
        None
    }

    // ─── Mutators ────────────────────────────────────────────────────────

    /// Write `color` (or clear, when `None`) into each cell.
    fn place_tiles(&mut self, layer: LayerId, cells: &[(usize, usize)], color: Option<&TileColor>) {}

    fn add_object(&mut self, layer: LayerId, object: PlacedObject) {}

    fn move_object(&mut self, layer: LayerId, id: EntityId, row: f64, col: f64) {}

    /// Replace the object with the same id.
    fn update_object(&mut self, layer: LayerId, object: &PlacedObject) {}

    fn remove_object(&mut self, layer: LayerId, id: EntityId) {}

    fn add_token(&mut self, token: Token) {}

    fn move_token(&mut self, id: EntityId, row: f64, col: f64) {}

    fn update_token(&mut self, token: &Token) {}

    fn remove_token(&mut self, id: EntityId) {}

    /// Scroll the viewport by a raw pixel delta.
    fn scroll_by(&mut self, dx: f64, dy: f64) {}

    // ─── Snapshot restore (history) ──────────────────────────────────────

    fn set_tile_grid(&mut self, layer: LayerId, grid: Grid) {}

    fn set_objects(&mut self, layer: LayerId, objects: Vec<PlacedObject>) {}

    fn set_tokens(&mut self, tokens: Vec<Token>) {}

    fn set_stamp_settings(&mut self, settings: StampSettings) {}

    fn set_view(&mut self, view: ViewState) {}

    fn set_assets(&mut self, assets: Vec<Asset>) {}

    // ─── Notifications ───────────────────────────────────────────────────

    fn on_begin_stroke(&mut self, kind: StrokeKind, layer: Option<LayerId>) {}

    fn on_selection_change(&mut self, objects: &[PlacedObject]) {}

    fn on_token_selection_change(&mut self, tokens: &[Token]) {}

    /// The zoom tool finished a marquee; `rect` is in CSS pixels.
    fn on_zoom_tool_rect(&mut self, rect: Rect) {}
}

/// Canvas metrics derived from the host's current dims and CSS size.
pub fn metrics_of(host: &(impl MapHost + ?Sized)) -> CanvasMetrics {
    let (w, h) = host.canvas_css_size();
    CanvasMetrics::new(host.dims(), w, h)
}

pub fn find_object<H: MapHost + ?Sized>(host: &H, layer: LayerId, id: EntityId) -> Option<PlacedObject> {
    host.objects(layer).iter().find(|o| o.id == id).cloned()
}

pub fn find_token<H: MapHost + ?Sized>(host: &H, id: EntityId) -> Option<Token> {
    host.tokens().iter().find(|t| t.id == id).cloned()
}

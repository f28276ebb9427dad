//! In-memory [`MapHost`]: owns every layer, entity list, and setting in
//! plain collections. Backs the test suite and simple embedders.

use crate::host::{MapHost, StrokeKind};
use gw_core::geometry::GridDims;
use gw_core::id::{AssetId, EntityId, LayerId};
use gw_core::model::{
    Asset, BrushSettings, Grid, PlacedObject, StampSettings, TileColor, Token, ToolState,
    ViewState,
};
use gw_render::RasterLayer;
use image::RgbaImage;
use kurbo::Rect;
use std::collections::{HashMap, HashSet};

/// A notification the engine delivered to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    BeginStroke(StrokeKind, Option<LayerId>),
    SelectionChanged(Vec<EntityId>),
    TokenSelectionChanged(Vec<EntityId>),
    ZoomRect(Rect),
}

#[derive(Debug, Clone)]
pub struct MemoryHost {
    pub dims: GridDims,
    pub tile_px: f64,
    pub current_layer: LayerId,
    pub hidden: HashSet<LayerId>,
    pub grids: HashMap<LayerId, Grid>,
    pub objects: HashMap<LayerId, Vec<PlacedObject>>,
    pub tokens: Vec<Token>,
    pub assets: Vec<Asset>,
    pub images: HashMap<(AssetId, usize), RgbaImage>,
    pub rasters: HashMap<LayerId, RasterLayer>,
    pub selected_asset: Option<AssetId>,
    pub stamp: StampSettings,
    pub brush: BrushSettings,
    pub tools: ToolState,
    pub view: ViewState,
    pub events: Vec<HostEvent>,
}

impl MemoryHost {
    /// A `rows×cols` map drawn at `tile_px` CSS pixels per tile, with one
    /// visible layer named `ground`.
    pub fn new(rows: usize, cols: usize, tile_px: f64) -> Self {
        let ground = LayerId::intern("ground");
        let dims = GridDims::new(rows, cols);
        let mut grids = HashMap::new();
        grids.insert(ground, Grid::new(rows, cols));
        Self {
            dims,
            tile_px,
            current_layer: ground,
            hidden: HashSet::new(),
            grids,
            objects: HashMap::new(),
            tokens: Vec::new(),
            assets: Vec::new(),
            images: HashMap::new(),
            rasters: HashMap::new(),
            selected_asset: None,
            stamp: StampSettings::default(),
            brush: BrushSettings::default(),
            tools: ToolState::default(),
            view: ViewState::default(),
            events: Vec::new(),
        }
    }

    pub fn with_asset(mut self, asset: Asset) -> Self {
        self.assets.push(asset);
        self
    }

    /// Attach a freehand raster to `layer`.
    pub fn with_raster(mut self, layer: LayerId, base_tile_px: u32) -> Self {
        self.rasters.insert(layer, RasterLayer::new(self.dims, base_tile_px));
        self
    }

    pub fn layer_objects(&self) -> &[PlacedObject] {
        self.objects(self.current_layer)
    }

    pub fn object(&self, id: EntityId) -> Option<&PlacedObject> {
        self.objects.values().flatten().find(|o| o.id == id)
    }

    pub fn token(&self, id: EntityId) -> Option<&Token> {
        self.tokens.iter().find(|t| t.id == id)
    }

    /// Tile grid of the current layer, if it has one.
    pub fn grid(&self) -> Option<&Grid> {
        self.grids.get(&self.current_layer)
    }

    fn grid_mut(&mut self, layer: LayerId) -> &mut Grid {
        let dims = self.dims;
        self.grids
            .entry(layer)
            .or_insert_with(|| Grid::new(dims.rows, dims.cols))
    }
}

impl MapHost for MemoryHost {
    fn dims(&self) -> GridDims {
        self.dims
    }

    fn canvas_css_size(&self) -> (f64, f64) {
        (
            self.dims.cols as f64 * self.tile_px,
            self.dims.rows as f64 * self.tile_px,
        )
    }

    fn current_layer(&self) -> LayerId {
        self.current_layer
    }

    fn is_layer_visible(&self, layer: LayerId) -> bool {
        !self.hidden.contains(&layer)
    }

    fn tile_grid(&self, layer: LayerId) -> Option<&Grid> {
        self.grids.get(&layer)
    }

    fn objects(&self, layer: LayerId) -> &[PlacedObject] {
        self.objects.get(&layer).map(Vec::as_slice).unwrap_or(&[])
    }

    fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    fn assets(&self) -> &[Asset] {
        &self.assets
    }

    fn selected_asset(&self) -> Option<AssetId> {
        self.selected_asset
    }

    fn stamp_settings(&self) -> &StampSettings {
        &self.stamp
    }

    fn brush_settings(&self) -> &BrushSettings {
        &self.brush
    }

    fn tool_state(&self) -> ToolState {
        self.tools
    }

    fn view(&self) -> ViewState {
        self.view
    }

    fn asset_image(&self, asset: AssetId, variant: usize) -> Option<&RgbaImage> {
        self.images.get(&(asset, variant))
    }

    fn raster_layer(&self, layer: LayerId) -> Option<&RasterLayer> {
        self.rasters.get(&layer)
    }

    fn raster_layer_mut(&mut self, layer: LayerId) -> Option<&mut RasterLayer> {
        self.rasters.get_mut(&layer)
    }

    fn place_tiles(&mut self, layer: LayerId, cells: &[(usize, usize)], color: Option<&TileColor>) {
        let grid = self.grid_mut(layer);
        for &(r, c) in cells {
            grid.set(r, c, color.cloned());
        }
    }

    fn add_object(&mut self, layer: LayerId, object: PlacedObject) {
        self.objects.entry(layer).or_default().push(object);
    }

    fn move_object(&mut self, layer: LayerId, id: EntityId, row: f64, col: f64) {
        if let Some(o) = self
            .objects
            .get_mut(&layer)
            .and_then(|list| list.iter_mut().find(|o| o.id == id))
        {
            o.frame.row = row;
            o.frame.col = col;
        }
    }

    fn update_object(&mut self, layer: LayerId, object: &PlacedObject) {
        if let Some(o) = self
            .objects
            .get_mut(&layer)
            .and_then(|list| list.iter_mut().find(|o| o.id == object.id))
        {
            *o = object.clone();
        }
    }

    fn remove_object(&mut self, layer: LayerId, id: EntityId) {
        if let Some(list) = self.objects.get_mut(&layer) {
            list.retain(|o| o.id != id);
        }
    }

    fn add_token(&mut self, token: Token) {
        self.tokens.push(token);
    }

    fn move_token(&mut self, id: EntityId, row: f64, col: f64) {
        if let Some(t) = self.tokens.iter_mut().find(|t| t.id == id) {
            t.frame.row = row;
            t.frame.col = col;
        }
    }

    fn update_token(&mut self, token: &Token) {
        if let Some(t) = self.tokens.iter_mut().find(|t| t.id == token.id) {
            *t = token.clone();
        }
    }

    fn remove_token(&mut self, id: EntityId) {
        self.tokens.retain(|t| t.id != id);
    }

    fn scroll_by(&mut self, dx: f64, dy: f64) {
        self.view.scroll_x += dx;
        self.view.scroll_y += dy;
    }

    fn set_tile_grid(&mut self, layer: LayerId, grid: Grid) {
        self.grids.insert(layer, grid);
    }

    fn set_objects(&mut self, layer: LayerId, objects: Vec<PlacedObject>) {
        self.objects.insert(layer, objects);
    }

    fn set_tokens(&mut self, tokens: Vec<Token>) {
        self.tokens = tokens;
    }

    fn set_stamp_settings(&mut self, settings: StampSettings) {
        self.stamp = settings;
    }

    fn set_view(&mut self, view: ViewState) {
        self.view = view;
    }

    fn set_assets(&mut self, assets: Vec<Asset>) {
        self.assets = assets;
    }

    fn on_begin_stroke(&mut self, kind: StrokeKind, layer: Option<LayerId>) {
        self.events.push(HostEvent::BeginStroke(kind, layer));
    }

    fn on_selection_change(&mut self, objects: &[PlacedObject]) {
        self.events
            .push(HostEvent::SelectionChanged(objects.iter().map(|o| o.id).collect()));
    }

    fn on_token_selection_change(&mut self, tokens: &[Token]) {
        self.events
            .push(HostEvent::TokenSelectionChanged(tokens.iter().map(|t| t.id).collect()));
    }

    fn on_zoom_tool_rect(&mut self, rect: Rect) {
        self.events.push(HostEvent::ZoomRect(rect));
    }
}

//! Undo/redo history.
//!
//! Every entry is a tagged snapshot of the host state one mutation is about
//! to change. `undo` captures the same slice of *current* state onto the
//! redo stack before restoring; `redo` mirrors it.
//!
//! Drag gestures use **snapshot batching**: the snapshot is captured when the
//! gesture starts and only pushed when the gesture ends, and only if the
//! host state actually changed in between. A click that merely selects
//! leaves no undo step.

use crate::host::MapHost;
use gw_core::id::LayerId;
use gw_core::model::{Asset, Grid, PlacedObject, StampSettings, Token, ViewState};
use log::{debug, warn};

/// A pre-mutation snapshot of one slice of host state.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEntry {
    Tilemap {
        layer: LayerId,
        grid: Grid,
    },
    /// PNG-encoded raster layer.
    Canvas {
        layer: LayerId,
        png: Vec<u8>,
    },
    Objects {
        layer: LayerId,
        objects: Vec<PlacedObject>,
    },
    Tokens {
        tokens: Vec<Token>,
    },
    Settings {
        stamp: StampSettings,
    },
    View {
        view: ViewState,
    },
    /// Asset list plus one layer's objects, for asset edits that cascade
    /// into object reassignment.
    Bundle {
        assets: Vec<Asset>,
        layer: LayerId,
        objects: Vec<PlacedObject>,
    },
    /// Several slices changed by one gesture, restored together.
    Compound(Vec<HistoryEntry>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Tilemap,
    Canvas,
    Objects,
    Tokens,
    Settings,
    View,
    Bundle,
    Compound,
}

impl HistoryEntry {
    pub fn kind(&self) -> EntryKind {
        match self {
            HistoryEntry::Tilemap { .. } => EntryKind::Tilemap,
            HistoryEntry::Canvas { .. } => EntryKind::Canvas,
            HistoryEntry::Objects { .. } => EntryKind::Objects,
            HistoryEntry::Tokens { .. } => EntryKind::Tokens,
            HistoryEntry::Settings { .. } => EntryKind::Settings,
            HistoryEntry::View { .. } => EntryKind::View,
            HistoryEntry::Bundle { .. } => EntryKind::Bundle,
            HistoryEntry::Compound(_) => EntryKind::Compound,
        }
    }

    pub fn tiles<H: MapHost + ?Sized>(host: &H, layer: LayerId) -> Option<Self> {
        host.tile_grid(layer).map(|grid| HistoryEntry::Tilemap {
            layer,
            grid: grid.clone(),
        })
    }

    /// Encode the raster layer. Encode failures are logged and yield `None`:
    /// the edit still applies but cannot be undone.
    pub fn canvas<H: MapHost + ?Sized>(host: &H, layer: LayerId) -> Option<Self> {
        let raster = host.raster_layer(layer)?;
        match raster.snapshot() {
            Ok(png) => Some(HistoryEntry::Canvas { layer, png }),
            Err(err) => {
                warn!("raster snapshot of {layer:?} failed, stroke will not be undoable: {err}");
                None
            }
        }
    }

    pub fn objects<H: MapHost + ?Sized>(host: &H, layer: LayerId) -> Self {
        HistoryEntry::Objects {
            layer,
            objects: host.objects(layer).to_vec(),
        }
    }

    pub fn tokens<H: MapHost + ?Sized>(host: &H) -> Self {
        HistoryEntry::Tokens {
            tokens: host.tokens().to_vec(),
        }
    }

    pub fn settings<H: MapHost + ?Sized>(host: &H) -> Self {
        HistoryEntry::Settings {
            stamp: host.stamp_settings().clone(),
        }
    }

    pub fn view<H: MapHost + ?Sized>(host: &H) -> Self {
        HistoryEntry::View { view: host.view() }
    }

    pub fn bundle<H: MapHost + ?Sized>(host: &H, layer: LayerId) -> Self {
        HistoryEntry::Bundle {
            assets: host.assets().to_vec(),
            layer,
            objects: host.objects(layer).to_vec(),
        }
    }

    /// Snapshot the host's current state for the same slice(s).
    fn capture<H: MapHost + ?Sized>(&self, host: &H) -> Option<Self> {
        match self {
            HistoryEntry::Tilemap { layer, .. } => Self::tiles(host, *layer),
            HistoryEntry::Canvas { layer, .. } => Self::canvas(host, *layer),
            HistoryEntry::Objects { layer, .. } => Some(Self::objects(host, *layer)),
            HistoryEntry::Tokens { .. } => Some(Self::tokens(host)),
            HistoryEntry::Settings { .. } => Some(Self::settings(host)),
            HistoryEntry::View { .. } => Some(Self::view(host)),
            HistoryEntry::Bundle { layer, .. } => Some(Self::bundle(host, *layer)),
            HistoryEntry::Compound(parts) => {
                let parts: Vec<_> = parts.iter().filter_map(|p| p.capture(host)).collect();
                (!parts.is_empty()).then_some(HistoryEntry::Compound(parts))
            }
        }
    }

    /// Write this snapshot back into the host.
    fn restore<H: MapHost + ?Sized>(self, host: &mut H) {
        match self {
            HistoryEntry::Tilemap { layer, grid } => host.set_tile_grid(layer, grid),
            HistoryEntry::Canvas { layer, png } => match host.raster_layer_mut(layer) {
                Some(raster) => {
                    if let Err(err) = raster.restore(&png) {
                        warn!("could not restore raster {layer:?}: {err}");
                    }
                }
                None => warn!("raster {layer:?} no longer exists"),
            },
            HistoryEntry::Objects { layer, objects } => host.set_objects(layer, objects),
            HistoryEntry::Tokens { tokens } => host.set_tokens(tokens),
            HistoryEntry::Settings { stamp } => host.set_stamp_settings(stamp),
            HistoryEntry::View { view } => host.set_view(view),
            HistoryEntry::Bundle {
                assets,
                layer,
                objects,
            } => {
                host.set_assets(assets);
                host.set_objects(layer, objects);
            }
            HistoryEntry::Compound(parts) => {
                for part in parts {
                    part.restore(host);
                }
            }
        }
    }
}

/// Manages undo/redo stacks with batch grouping for drag gestures.
#[derive(Debug)]
pub struct History {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    max_depth: usize,
    /// Snapshot captured when the open batch began.
    batch: Option<HistoryEntry>,
    /// Whether the open batch has mutated anything.
    batch_dirty: bool,
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
            batch: None,
            batch_dirty: false,
        }
    }

    /// Push a pre-mutation snapshot and clear redo.
    pub fn record(&mut self, entry: HistoryEntry) {
        debug!("history: push {:?}", entry.kind());
        self.undo_stack.push(entry);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    /// Open a batch with the snapshot taken before the gesture. A batch
    /// already open is closed first.
    pub fn begin_batch<H: MapHost + ?Sized>(&mut self, host: &H, entry: HistoryEntry) {
        if self.batch.is_some() {
            self.end_batch(host);
        }
        self.batch = Some(entry);
        self.batch_dirty = false;
    }

    /// Mark the open batch as having mutated host state.
    pub fn touch(&mut self) {
        if self.batch.is_some() {
            self.batch_dirty = true;
        }
    }

    /// Close the open batch. Pushes its snapshot if the gesture mutated
    /// something and the state really differs. Returns whether it pushed.
    pub fn end_batch<H: MapHost + ?Sized>(&mut self, host: &H) -> bool {
        let Some(before) = self.batch.take() else {
            return false;
        };
        let dirty = std::mem::take(&mut self.batch_dirty);
        if !dirty {
            return false;
        }
        // Only push if state actually changed
        if before.capture(host).as_ref() == Some(&before) {
            debug!("history: batch {:?} left state unchanged", before.kind());
            return false;
        }
        self.record(before);
        true
    }

    /// Drop the open batch without recording it.
    pub fn discard_batch(&mut self) {
        self.batch = None;
        self.batch_dirty = false;
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Restore the most recent snapshot. The current state moves to redo.
    pub fn undo<H: MapHost + ?Sized>(&mut self, host: &mut H) -> Option<EntryKind> {
        let entry = self.undo_stack.pop()?;
        let kind = entry.kind();
        match entry.capture(host) {
            Some(current) => self.redo_stack.push(current),
            None => warn!("history: could not capture {kind:?} for redo"),
        }
        entry.restore(host);
        debug!("history: undo {kind:?}");
        Some(kind)
    }

    /// Re-apply the most recently undone snapshot.
    pub fn redo<H: MapHost + ?Sized>(&mut self, host: &mut H) -> Option<EntryKind> {
        let entry = self.redo_stack.pop()?;
        let kind = entry.kind();
        match entry.capture(host) {
            Some(current) => {
                self.undo_stack.push(current);
                if self.undo_stack.len() > self.max_depth {
                    self.undo_stack.remove(0);
                }
            }
            None => warn!("history: could not capture {kind:?} for undo"),
        }
        entry.restore(host);
        debug!("history: redo {kind:?}");
        Some(kind)
    }
}

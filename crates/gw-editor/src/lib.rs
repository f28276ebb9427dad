pub mod brush;
pub mod history;
pub mod host;
pub mod input;
pub mod memory;
pub mod placement;
pub mod router;
pub mod selection;
pub mod shortcuts;
pub mod transform;

pub use history::{EntryKind, History, HistoryEntry};
pub use host::{MapHost, StrokeKind};
pub use input::{InputEvent, Modifiers, PointerButton};
pub use memory::{HostEvent, MemoryHost};
pub use router::{CursorHint, DragState, GridEngine, HoverState};
pub use selection::{LiveEdit, PanelValues, Selected, Selection};
pub use shortcuts::{ShortcutAction, ShortcutMap};

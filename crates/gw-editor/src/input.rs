//! Input abstraction layer.
//!
//! Normalizes mouse, pen, and touch pointer events into a unified
//! `InputEvent` enum consumed by the gesture router. Coordinates are CSS
//! pixels relative to the grid canvas.

use kurbo::Point;
use smallvec::SmallVec;

/// Keyboard modifier state at the time of an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    /// Shift, Ctrl, or ⌘: toggles entities in/out of the selection.
    pub fn is_additive(&self) -> bool {
        self.shift || self.ctrl || self.meta
    }

    /// Ctrl on most platforms, ⌘ on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PointerButton {
    #[default]
    Left,
    Middle,
    Right,
}

/// A normalized input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown {
        x: f64,
        y: f64,
        button: PointerButton,
        modifiers: Modifiers,
    },

    /// Pointer moved. `coalesced` holds the batched native samples in arrival
    /// order; when empty, `(x, y)` is the only sample.
    PointerMove {
        x: f64,
        y: f64,
        modifiers: Modifiers,
        coalesced: SmallVec<[Point; 4]>,
    },

    PointerUp {
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },

    KeyDown {
        key: String,
        modifiers: Modifiers,
    },

    KeyUp {
        key: String,
        modifiers: Modifiers,
    },
}

impl InputEvent {
    pub fn down(x: f64, y: f64) -> Self {
        Self::PointerDown {
            x,
            y,
            button: PointerButton::Left,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn down_with(x: f64, y: f64, button: PointerButton, modifiers: Modifiers) -> Self {
        Self::PointerDown {
            x,
            y,
            button,
            modifiers,
        }
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self::PointerMove {
            x,
            y,
            modifiers: Modifiers::NONE,
            coalesced: SmallVec::new(),
        }
    }

    /// A move carrying several coalesced samples; the last one is the
    /// reported position.
    pub fn moved_coalesced(samples: &[Point]) -> Self {
        let last = samples.last().copied().unwrap_or(Point::ZERO);
        Self::PointerMove {
            x: last.x,
            y: last.y,
            modifiers: Modifiers::NONE,
            coalesced: samples.iter().copied().collect(),
        }
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self::PointerUp {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn key_down(key: &str, modifiers: Modifiers) -> Self {
        Self::KeyDown {
            key: key.to_string(),
            modifiers,
        }
    }

    pub fn key_up(key: &str) -> Self {
        Self::KeyUp {
            key: key.to_string(),
            modifiers: Modifiers::NONE,
        }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. } => Some(Point::new(*x, *y)),
            _ => None,
        }
    }

    /// Every pointer sample carried by this event, in arrival order.
    pub fn samples(&self) -> SmallVec<[Point; 4]> {
        match self {
            Self::PointerMove { coalesced, .. } if !coalesced.is_empty() => coalesced.clone(),
            _ => self.position().into_iter().collect(),
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        match self {
            Self::PointerDown { modifiers, .. }
            | Self::PointerMove { modifiers, .. }
            | Self::PointerUp { modifiers, .. }
            | Self::KeyDown { modifiers, .. }
            | Self::KeyUp { modifiers, .. } => *modifiers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_move_has_one_sample() {
        let ev = InputEvent::moved(3.0, 4.0);
        assert_eq!(ev.samples().as_slice(), &[Point::new(3.0, 4.0)]);
    }

    #[test]
    fn coalesced_samples_keep_order() {
        let pts = [Point::new(1.0, 1.0), Point::new(2.0, 1.0), Point::new(3.0, 2.0)];
        let ev = InputEvent::moved_coalesced(&pts);
        assert_eq!(ev.samples().as_slice(), &pts);
        assert_eq!(ev.position(), Some(Point::new(3.0, 2.0)));
    }

    #[test]
    fn additive_modifiers() {
        assert!(Modifiers::SHIFT.is_additive());
        assert!(Modifiers { meta: true, ..Modifiers::NONE }.is_additive());
        assert!(!Modifiers { alt: true, ..Modifiers::NONE }.is_additive());
    }
}

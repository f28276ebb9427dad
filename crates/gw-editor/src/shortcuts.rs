//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. Keys are
//! `KeyboardEvent.key` values. ⌘ on macOS and Ctrl elsewhere play the same
//! role.

use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Undo,
    Redo,
    DeleteSelection,
    SelectAll,
    /// Abort the active gesture and reset gesture state.
    Cancel,
    /// Space held: pointer drags pan the viewport.
    PanHoldStart,
    PanHoldEnd,
}

pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key press (`pressed = true`) or release to an action.
    /// Returns `None` if the combo has no binding.
    pub fn resolve(key: &str, modifiers: Modifiers, pressed: bool) -> Option<ShortcutAction> {
        if !pressed {
            return match key {
                " " => Some(ShortcutAction::PanHoldEnd),
                _ => None,
            };
        }

        let cmd = modifiers.command();

        // ── Modifier combos first (most specific) ──
        if cmd && modifiers.shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "a" | "A" => Some(ShortcutAction::SelectAll),
                _ => None,
            };
        }

        match key {
            "Delete" | "Backspace" => Some(ShortcutAction::DeleteSelection),
            "Escape" => Some(ShortcutAction::Cancel),
            " " => Some(ShortcutAction::PanHoldStart),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CMD: Modifiers = Modifiers {
        meta: true,
        ..Modifiers::NONE
    };
    const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };

    #[test]
    fn resolve_undo_redo() {
        assert_eq!(ShortcutMap::resolve("z", CMD, true), Some(ShortcutAction::Undo));
        assert_eq!(ShortcutMap::resolve("z", CTRL, true), Some(ShortcutAction::Undo));
        let cmd_shift = Modifiers { shift: true, ..CMD };
        assert_eq!(ShortcutMap::resolve("Z", cmd_shift, true), Some(ShortcutAction::Redo));
        assert_eq!(ShortcutMap::resolve("y", CTRL, true), Some(ShortcutAction::Redo));
    }

    #[test]
    fn resolve_delete_and_escape() {
        assert_eq!(
            ShortcutMap::resolve("Backspace", Modifiers::NONE, true),
            Some(ShortcutAction::DeleteSelection)
        );
        assert_eq!(
            ShortcutMap::resolve("Escape", Modifiers::NONE, true),
            Some(ShortcutAction::Cancel)
        );
    }

    #[test]
    fn space_hold_and_release() {
        assert_eq!(
            ShortcutMap::resolve(" ", Modifiers::NONE, true),
            Some(ShortcutAction::PanHoldStart)
        );
        assert_eq!(
            ShortcutMap::resolve(" ", Modifiers::NONE, false),
            Some(ShortcutAction::PanHoldEnd)
        );
    }

    #[test]
    fn unmodified_letters_are_unbound() {
        assert_eq!(ShortcutMap::resolve("z", Modifiers::NONE, true), None);
        assert_eq!(ShortcutMap::resolve("Escape", Modifiers::NONE, false), None);
    }
}

//! X11 KeySym helpers for key-press driven visibility re-evaluation.
//!
//! Every non-modifier key press re-runs the active-window decision, so that
//! typing into an application is enough to bring the mirror back.  Pressing
//! Shift or Ctrl alone must not.
//!
//! # What is a KeySym? (for beginners)
//!
//! The X server reports raw key presses as *keycodes*: small numbers that
//! identify a physical key on this particular keyboard.  The keyboard mapping
//! translates each keycode into one or more *KeySyms* (symbolic names such as
//! `XK_Shift_L = 0xFFE1`).  Values come from `X11/keysymdef.h`.

/// XK_ISO_Level3_Shift (AltGr on many layouts).
const XK_ISO_LEVEL3_SHIFT: u32 = 0xFE03;
/// XK_Mode_switch.
const XK_MODE_SWITCH: u32 = 0xFF7E;
/// XK_Num_Lock.
const XK_NUM_LOCK: u32 = 0xFF7F;
/// XK_Shift_L, first of the contiguous modifier block.
const XK_SHIFT_L: u32 = 0xFFE1;
/// XK_Hyper_R, last of the contiguous modifier block.
const XK_HYPER_R: u32 = 0xFFEE;

/// Returns `true` for modifier-only keys (Shift, Control, Caps/Shift Lock,
/// Meta, Alt, Super, Hyper, AltGr, Mode_switch, Num_Lock).
pub fn is_modifier_keysym(keysym: u32) -> bool {
    matches!(
        keysym,
        XK_SHIFT_L..=XK_HYPER_R | XK_ISO_LEVEL3_SHIFT | XK_MODE_SWITCH | XK_NUM_LOCK
    )
}

/// A snapshot of the server's keycode → KeySym table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyboardMapping {
    min_keycode: u32,
    keysyms_per_keycode: usize,
    keysyms: Vec<u32>,
}

impl KeyboardMapping {
    pub fn new(min_keycode: u8, keysyms_per_keycode: u8, keysyms: Vec<u32>) -> Self {
        Self {
            min_keycode: u32::from(min_keycode),
            keysyms_per_keycode: usize::from(keysyms_per_keycode),
            keysyms,
        }
    }

    /// The unshifted KeySym bound to `keycode`, or `None` if the keycode is
    /// out of range or unbound.
    pub fn keysym(&self, keycode: u32) -> Option<u32> {
        if self.keysyms_per_keycode == 0 || keycode < self.min_keycode {
            return None;
        }
        let index = (keycode - self.min_keycode) as usize * self.keysyms_per_keycode;
        match self.keysyms.get(index) {
            Some(0) | None => None,
            Some(sym) => Some(*sym),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_keysyms_are_recognised() {
        for sym in [0xFFE1, 0xFFE3, 0xFFE5, 0xFFE9, 0xFFEB, 0xFFEE, 0xFE03, 0xFF7E] {
            assert!(is_modifier_keysym(sym), "{sym:#x} should be a modifier");
        }
    }

    #[test]
    fn test_regular_keysyms_are_not_modifiers() {
        for sym in [0x0061, 0xFF0D, 0xFF1B, 0xFFBE, 0xFFFF] {
            assert!(!is_modifier_keysym(sym), "{sym:#x} should not be a modifier");
        }
    }

    #[test]
    fn test_keyboard_mapping_returns_first_column() {
        // Arrange: keycodes 8..=10, two keysyms per keycode
        let map = KeyboardMapping::new(8, 2, vec![0xFFE1, 0, 0x0061, 0x0041, 0, 0]);

        // Act / Assert
        assert_eq!(map.keysym(8), Some(0xFFE1));
        assert_eq!(map.keysym(9), Some(0x0061));
        assert_eq!(map.keysym(10), None);
        assert_eq!(map.keysym(11), None);
        assert_eq!(map.keysym(7), None);
    }
}

use std::fmt;

use bitflags::bitflags;
use winit::event::{ModifiersState, VirtualKeyCode};

bitflags! {
    /// Keyboard modifiers held down during an event, X11 mask layout.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct KeyModifierFlags: u32 {
        const SHIFT = 0x001;
        const CAPS_LOCK = 0x002;
        const CTRL = 0x004;
        const MOD_1 = 0x008;
        const MOD_2 = 0x010;
        const MOD_3 = 0x020;
        const MOD_4 = 0x040;
        const MOD_5 = 0x080;
    }
}

impl From<ModifiersState> for KeyModifierFlags {
    fn from(state: ModifiersState) -> Self {
        let mut mods = KeyModifierFlags::empty();
        if state.shift() {
            mods |= KeyModifierFlags::SHIFT;
        }
        if state.ctrl() {
            mods |= KeyModifierFlags::CTRL;
        }
        if state.alt() {
            mods |= KeyModifierFlags::MOD_1;
        }
        if state.logo() {
            mods |= KeyModifierFlags::MOD_4;
        }
        mods
    }
}

impl fmt::Display for KeyModifierFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (KeyModifierFlags::SHIFT, "Shift"),
            (KeyModifierFlags::CAPS_LOCK, "CapsLock"),
            (KeyModifierFlags::CTRL, "Ctrl"),
            (KeyModifierFlags::MOD_1, "Mod1"),
            (KeyModifierFlags::MOD_2, "Mod2"),
            (KeyModifierFlags::MOD_3, "Mod3"),
            (KeyModifierFlags::MOD_4, "Mod4"),
            (KeyModifierFlags::MOD_5, "Mod5"),
        ];

        let mut first = true;
        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    write!(f, "+")?;
                }
                write!(f, "{}", name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Shift and caps-lock each flip letter case; together they cancel out.
pub fn uses_uppercase(mods: KeyModifierFlags) -> bool {
    mods.contains(KeyModifierFlags::SHIFT) != mods.contains(KeyModifierFlags::CAPS_LOCK)
}

/// Maps a key to the unicode code point it produces under the given
/// modifiers. Keys that produce no text yield nothing.
pub fn to_code_point(key: VirtualKeyCode, mods: KeyModifierFlags) -> Option<char> {
    use VirtualKeyCode::*;

    let base = match key {
        A => 'a',
        B => 'b',
        C => 'c',
        D => 'd',
        E => 'e',
        F => 'f',
        G => 'g',
        H => 'h',
        I => 'i',
        J => 'j',
        K => 'k',
        L => 'l',
        M => 'm',
        N => 'n',
        O => 'o',
        P => 'p',
        Q => 'q',
        R => 'r',
        S => 's',
        T => 't',
        U => 'u',
        V => 'v',
        W => 'w',
        X => 'x',
        Y => 'y',
        Z => 'z',
        Key0 | Numpad0 => '0',
        Key1 | Numpad1 => '1',
        Key2 | Numpad2 => '2',
        Key3 | Numpad3 => '3',
        Key4 | Numpad4 => '4',
        Key5 | Numpad5 => '5',
        Key6 | Numpad6 => '6',
        Key7 | Numpad7 => '7',
        Key8 | Numpad8 => '8',
        Key9 | Numpad9 => '9',
        Space => ' ',
        Tab => '\t',
        Return | NumpadEnter => '\r',
        Minus | NumpadSubtract => '-',
        Equals => '=',
        NumpadAdd => '+',
        NumpadMultiply => '*',
        NumpadDivide => '/',
        Period | NumpadDecimal => '.',
        Comma => ',',
        Semicolon => ';',
        Apostrophe => '\'',
        Slash => '/',
        Backslash => '\\',
        LBracket => '[',
        RBracket => ']',
        Grave => '`',
        _ => return None,
    };

    if base.is_ascii_lowercase() && uses_uppercase(mods) {
        Some(base.to_ascii_uppercase())
    } else {
        Some(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_and_caps_lock_cancel_out() {
        assert!(!uses_uppercase(KeyModifierFlags::empty()));
        assert!(uses_uppercase(KeyModifierFlags::SHIFT));
        assert!(uses_uppercase(KeyModifierFlags::CAPS_LOCK));
        assert!(!uses_uppercase(
            KeyModifierFlags::SHIFT | KeyModifierFlags::CAPS_LOCK
        ));
    }

    #[test]
    fn letters_follow_case_rules() {
        assert_eq!(
            to_code_point(VirtualKeyCode::A, KeyModifierFlags::empty()),
            Some('a')
        );
        assert_eq!(
            to_code_point(VirtualKeyCode::A, KeyModifierFlags::SHIFT),
            Some('A')
        );
        assert_eq!(
            to_code_point(VirtualKeyCode::A, KeyModifierFlags::CAPS_LOCK),
            Some('A')
        );
    }

    #[test]
    fn non_text_keys_produce_nothing() {
        assert_eq!(
            to_code_point(VirtualKeyCode::F1, KeyModifierFlags::empty()),
            None
        );
        assert_eq!(
            to_code_point(VirtualKeyCode::LShift, KeyModifierFlags::empty()),
            None
        );
    }

    #[test]
    fn modifier_display_joins_with_plus() {
        let mods = KeyModifierFlags::SHIFT | KeyModifierFlags::CTRL;
        assert_eq!(mods.to_string(), "Shift+Ctrl");
        assert_eq!(KeyModifierFlags::empty().to_string(), "");
    }

    #[test]
    fn winit_state_translation() {
        let state = ModifiersState::SHIFT | ModifiersState::ALT;
        let mods: KeyModifierFlags = state.into();
        assert_eq!(mods, KeyModifierFlags::SHIFT | KeyModifierFlags::MOD_1);
    }
}

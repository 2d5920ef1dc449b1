//! Config key-name resolution.
//!
//! Maps the lowercase key names accepted in the config file
//! (`excluded_keys`, `no_repeat_keys`) onto hook key identities.

use std::collections::HashSet;

use rdev::Key;

/// Resolve a config key name. Names are matched case-insensitively.
pub fn key_from_name(name: &str) -> Option<Key> {
    let key = match name.to_ascii_lowercase().as_str() {
        // Letters
        "a" => Key::KeyA,
        "b" => Key::KeyB,
        "c" => Key::KeyC,
        "d" => Key::KeyD,
        "e" => Key::KeyE,
        "f" => Key::KeyF,
        "g" => Key::KeyG,
        "h" => Key::KeyH,
        "i" => Key::KeyI,
        "j" => Key::KeyJ,
        "k" => Key::KeyK,
        "l" => Key::KeyL,
        "m" => Key::KeyM,
        "n" => Key::KeyN,
        "o" => Key::KeyO,
        "p" => Key::KeyP,
        "q" => Key::KeyQ,
        "r" => Key::KeyR,
        "s" => Key::KeyS,
        "t" => Key::KeyT,
        "u" => Key::KeyU,
        "v" => Key::KeyV,
        "w" => Key::KeyW,
        "x" => Key::KeyX,
        "y" => Key::KeyY,
        "z" => Key::KeyZ,

        // Number row
        "0" => Key::Num0,
        "1" => Key::Num1,
        "2" => Key::Num2,
        "3" => Key::Num3,
        "4" => Key::Num4,
        "5" => Key::Num5,
        "6" => Key::Num6,
        "7" => Key::Num7,
        "8" => Key::Num8,
        "9" => Key::Num9,

        // Special keys, with left/right variants
        "space" => Key::Space,
        "enter" => Key::Return,
        "tab" => Key::Tab,
        "lshift" | "shift" => Key::ShiftLeft,
        "rshift" => Key::ShiftRight,
        "lctrl" | "ctrl" => Key::ControlLeft,
        "rctrl" => Key::ControlRight,
        "lalt" | "alt" => Key::Alt,
        "ralt" => Key::AltGr,
        "escape" => Key::Escape,
        "backspace" => Key::Backspace,
        "delete" => Key::Delete,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" => Key::PageUp,
        "pagedown" => Key::PageDown,
        "insert" => Key::Insert,
        "capslock" => Key::CapsLock,

        // Arrows
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,

        // Function keys
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,

        // Numpad
        "numpad0" => Key::Kp0,
        "numpad1" => Key::Kp1,
        "numpad2" => Key::Kp2,
        "numpad3" => Key::Kp3,
        "numpad4" => Key::Kp4,
        "numpad5" => Key::Kp5,
        "numpad6" => Key::Kp6,
        "numpad7" => Key::Kp7,
        "numpad8" => Key::Kp8,
        "numpad9" => Key::Kp9,
        "numpadenter" => Key::KpReturn,
        "numpadplus" => Key::KpPlus,
        "numpadminus" => Key::KpMinus,
        "numpadmultiply" => Key::KpMultiply,
        "numpaddivide" => Key::KpDivide,
        "numpaddot" => Key::KpDelete,

        // Misc
        "printscreen" => Key::PrintScreen,
        "scrolllock" => Key::ScrollLock,
        "pause" => Key::Pause,
        "lwin" | "win" => Key::MetaLeft,
        "rwin" => Key::MetaRight,

        // Punctuation
        "semicolon" => Key::SemiColon,
        "apostrophe" => Key::Quote,
        "grave" => Key::BackQuote,
        "backslash" => Key::BackSlash,
        "comma" => Key::Comma,
        "dot" => Key::Dot,
        "slash" => Key::Slash,
        "leftbracket" => Key::LeftBracket,
        "rightbracket" => Key::RightBracket,
        "equal" => Key::Equal,
        "minus" => Key::Minus,

        _ => return None,
    };
    Some(key)
}

/// Resolve a list of config key names into a set, logging names that do not
/// match anything.
pub fn resolve_key_set(names: &[String]) -> HashSet<Key> {
    let mut keys = HashSet::with_capacity(names.len());
    for name in names {
        match key_from_name(name) {
            Some(key) => {
                keys.insert(key);
            }
            None => tracing::warn!("Ignoring unknown key name in config: {name}"),
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_and_digits() {
        assert_eq!(key_from_name("a"), Some(Key::KeyA));
        assert_eq!(key_from_name("Z"), Some(Key::KeyZ));
        assert_eq!(key_from_name("0"), Some(Key::Num0));
        assert_eq!(key_from_name("9"), Some(Key::Num9));
    }

    #[test]
    fn test_special_keys_and_aliases() {
        assert_eq!(key_from_name("space"), Some(Key::Space));
        assert_eq!(key_from_name("shift"), Some(Key::ShiftLeft));
        assert_eq!(key_from_name("rshift"), Some(Key::ShiftRight));
        assert_eq!(key_from_name("CapsLock"), Some(Key::CapsLock));
        assert_eq!(key_from_name("f12"), Some(Key::F12));
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(key_from_name("hyperkey"), None);
        assert_eq!(key_from_name(""), None);
    }

    #[test]
    fn test_resolve_key_set_skips_unknown() {
        let names = vec![
            "a".to_string(),
            "nosuchkey".to_string(),
            "space".to_string(),
        ];
        let keys = resolve_key_set(&names);
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&Key::KeyA));
        assert!(keys.contains(&Key::Space));
    }
}

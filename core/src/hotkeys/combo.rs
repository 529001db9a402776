//! Key combinations and their string form.
//!
//! A [`KeyCombo`] wraps a `global-hotkey` [`HotKey`], so the value parsed from
//! config is the one handed to the OS.

use std::fmt;
use std::str::FromStr;

use global_hotkey::hotkey::{Code, HotKey, Modifiers};

use super::error::HotkeyParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCombo(HotKey);

impl KeyCombo {
    pub fn new(modifiers: Modifiers, key: Code) -> Self {
        Self(HotKey::new(Some(modifiers), key))
    }

    pub fn hotkey(&self) -> HotKey {
        self.0
    }

    /// Id the OS reports in hotkey events for this combo.
    pub fn id(&self) -> u32 {
        self.0.id()
    }

    pub fn modifiers(&self) -> Modifiers {
        self.0.mods
    }

    pub fn key(&self) -> Code {
        self.0.key
    }
}

/// Accelerator aliases `global-hotkey` does not know about.
fn normalize_part(part: &str) -> &str {
    match part.to_lowercase().as_str() {
        "win" | "meta" | "logo" => "Super",
        "pgup" => "PageUp",
        "pgdn" => "PageDown",
        "esc" => "Escape",
        "ins" => "Insert",
        "del" => "Delete",
        "return" => "Enter",
        _ => part,
    }
}

impl FromStr for KeyCombo {
    type Err = HotkeyParseError;

    /// Parse `"Ctrl+Shift+F5"` style strings, case-insensitively. Modifier
    /// names follow the usual accelerator aliases (`CommandOrControl`,
    /// `Super`, `Win`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s
            .split('+')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(normalize_part)
            .collect();
        if parts.is_empty() {
            return Err(HotkeyParseError::Empty);
        }

        parts
            .join("+")
            .parse::<HotKey>()
            .map(KeyCombo)
            .map_err(|e| HotkeyParseError::Invalid {
                combo: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Modifiers::CONTROL, "Ctrl"),
            (Modifiers::ALT, "Alt"),
            (Modifiers::SHIFT, "Shift"),
            (Modifiers::SUPER, "Win"),
        ];
        for (modifier, name) in names {
            if self.modifiers().contains(modifier) {
                write!(f, "{name}+")?;
            }
        }

        let key = self.key().to_string();
        let key = key
            .strip_prefix("Key")
            .or_else(|| key.strip_prefix("Digit"))
            .unwrap_or(&key);
        f.write_str(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_modifiers_and_key() {
        let combo: KeyCombo = "Ctrl+Shift+F5".parse().unwrap();
        assert_eq!(combo.modifiers(), Modifiers::CONTROL | Modifiers::SHIFT);
        assert_eq!(combo.key(), Code::F5);
        assert_eq!(combo, KeyCombo::new(Modifiers::CONTROL | Modifiers::SHIFT, Code::F5));
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let a: KeyCombo = "ctrl+alt+c".parse().unwrap();
        let b: KeyCombo = "CONTROL + ALT + C".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.key(), Code::KeyC);
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn test_parse_aliases() {
        let combo: KeyCombo = "Win+Alt+Ins".parse().unwrap();
        assert_eq!(combo.modifiers(), Modifiers::ALT | Modifiers::SUPER);
        assert_eq!(combo.key(), Code::Insert);
        assert_eq!("Alt+Numpad3".parse::<KeyCombo>().unwrap().key(), Code::Numpad3);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<KeyCombo>(), Err(HotkeyParseError::Empty));
        assert_eq!(" + ".parse::<KeyCombo>(), Err(HotkeyParseError::Empty));
        for bad in ["Ctrl+Alt", "Ctrl+Blorp", "Ctrl+A+B"] {
            match bad.parse::<KeyCombo>() {
                Err(HotkeyParseError::Invalid { combo, .. }) => assert_eq!(combo, bad),
                other => panic!("{bad}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_display_is_canonical() {
        let combo: KeyCombo = "shift+ctrl+pgdn".parse().unwrap();
        assert_eq!(combo.to_string(), "Ctrl+Shift+PageDown");
        let combo: KeyCombo = "win+alt+f12".parse().unwrap();
        assert_eq!(combo.to_string(), "Alt+Win+F12");
        assert_eq!("Ctrl+7".parse::<KeyCombo>().unwrap().to_string(), "Ctrl+7");

        let combo: KeyCombo = "Ctrl+Alt+V".parse().unwrap();
        assert_eq!(combo.to_string().parse::<KeyCombo>().unwrap(), combo);
    }
}

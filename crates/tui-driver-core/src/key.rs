//! Keyboard key enumeration and name parsing.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A key that can participate in a chord.
///
/// The enumeration is closed: modifiers, single printable characters,
/// and the named specials below. Unknown names are rejected by
/// [`Key::parse`] with an error listing the valid set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    // Modifiers
    /// Control modifier
    Ctrl,
    /// Alt modifier
    Alt,
    /// Shift modifier
    Shift,
    /// Meta modifier
    Meta,

    // Single characters: letters, digits, printable punctuation
    /// A single printable character
    Char(char),

    // Actions
    /// Enter/Return key
    Enter,
    /// Escape key
    Esc,
    /// Tab key
    Tab,
    /// Space key
    Space,
    /// Backspace key
    Backspace,
    /// Delete key
    Delete,
    /// Insert key
    Insert,

    // Navigation
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
    /// Home key
    Home,
    /// End key
    End,
    /// Page Up
    PageUp,
    /// Page Down
    PageDown,
    /// Clear key
    Clear,
    /// Line feed
    Linefeed,

    // Function keys
    /// F1
    F1,
    /// F2
    F2,
    /// F3
    F3,
    /// F4
    F4,
    /// F5
    F5,
    /// F6
    F6,
    /// F7
    F7,
    /// F8
    F8,
    /// F9
    F9,
    /// F10
    F10,
    /// F11
    F11,
    /// F12
    F12,
}

/// Recognized key names, including aliases, lowercase.
const NAMED_KEYS: &[(&str, Key)] = &[
    ("alt", Key::Alt),
    ("backspace", Key::Backspace),
    ("clear", Key::Clear),
    ("ctrl", Key::Ctrl),
    ("delete", Key::Delete),
    ("down", Key::Down),
    ("end", Key::End),
    ("enter", Key::Enter),
    ("esc", Key::Esc),
    ("escape", Key::Esc),
    ("f1", Key::F1),
    ("f2", Key::F2),
    ("f3", Key::F3),
    ("f4", Key::F4),
    ("f5", Key::F5),
    ("f6", Key::F6),
    ("f7", Key::F7),
    ("f8", Key::F8),
    ("f9", Key::F9),
    ("f10", Key::F10),
    ("f11", Key::F11),
    ("f12", Key::F12),
    ("home", Key::Home),
    ("insert", Key::Insert),
    ("left", Key::Left),
    ("linefeed", Key::Linefeed),
    ("meta", Key::Meta),
    ("pagedown", Key::PageDown),
    ("pageup", Key::PageUp),
    ("return", Key::Enter),
    ("right", Key::Right),
    ("shift", Key::Shift),
    ("space", Key::Space),
    ("tab", Key::Tab),
    ("up", Key::Up),
];

impl Key {
    /// Parse a key from its name.
    ///
    /// Names are the lowercase forms listed by [`Key::valid_names`]
    /// (`"enter"`, `"ctrl"`, `"pageup"`, ...) or any single printable
    /// character (`"a"`, `"7"`, `"%"`).
    pub fn parse(name: &str) -> Result<Self> {
        if let Some((_, key)) = NAMED_KEYS.iter().find(|(n, _)| *n == name) {
            return Ok(*key);
        }

        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_graphic() {
                return Ok(Key::Char(c));
            }
        }

        Err(Error::InvalidKey {
            keys: vec![name.to_string()],
            valid: Self::valid_names(),
        })
    }

    /// The recognized key names, sorted. Single printable characters are
    /// also accepted by [`Key::parse`] but are not enumerated here.
    pub fn valid_names() -> Vec<String> {
        let mut names: Vec<String> = NAMED_KEYS.iter().map(|(n, _)| (*n).to_string()).collect();
        names.sort();
        names
    }

    /// Check whether this key is a modifier.
    pub fn is_modifier(&self) -> bool {
        matches!(self, Key::Ctrl | Key::Alt | Key::Shift | Key::Meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_parse_char() {
        assert_eq!(Key::parse("a").unwrap(), Key::Char('a'));
        assert_eq!(Key::parse("Z").unwrap(), Key::Char('Z'));
        assert_eq!(Key::parse("5").unwrap(), Key::Char('5'));
        assert_eq!(Key::parse("%").unwrap(), Key::Char('%'));
    }

    #[test]
    fn test_key_parse_named() {
        assert_eq!(Key::parse("enter").unwrap(), Key::Enter);
        assert_eq!(Key::parse("return").unwrap(), Key::Enter);
        assert_eq!(Key::parse("esc").unwrap(), Key::Esc);
        assert_eq!(Key::parse("escape").unwrap(), Key::Esc);
        assert_eq!(Key::parse("pageup").unwrap(), Key::PageUp);
        assert_eq!(Key::parse("linefeed").unwrap(), Key::Linefeed);
        assert_eq!(Key::parse("f1").unwrap(), Key::F1);
        assert_eq!(Key::parse("f12").unwrap(), Key::F12);
    }

    #[test]
    fn test_key_parse_modifiers() {
        assert_eq!(Key::parse("ctrl").unwrap(), Key::Ctrl);
        assert_eq!(Key::parse("alt").unwrap(), Key::Alt);
        assert_eq!(Key::parse("shift").unwrap(), Key::Shift);
        assert_eq!(Key::parse("meta").unwrap(), Key::Meta);
    }

    #[test]
    fn test_key_parse_invalid() {
        let err = Key::parse("bogus").unwrap_err();
        match err {
            Error::InvalidKey { keys, valid } => {
                assert_eq!(keys, vec!["bogus".to_string()]);
                assert!(valid.contains(&"enter".to_string()));
            }
            other => panic!("expected InvalidKey, got {other:?}"),
        }

        assert!(Key::parse("").is_err());
        assert!(Key::parse("ab").is_err());
        // Non-printable single characters are not keys.
        assert!(Key::parse("\x07").is_err());
    }

    #[test]
    fn test_key_valid_names_sorted() {
        let names = Key::valid_names();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(names.contains(&"pagedown".to_string()));
        assert!(names.contains(&"meta".to_string()));
    }

    #[test]
    fn test_key_is_modifier() {
        assert!(Key::Ctrl.is_modifier());
        assert!(Key::Meta.is_modifier());
        assert!(!Key::Enter.is_modifier());
        assert!(!Key::Char('c').is_modifier());
    }

    #[test]
    fn test_key_serialization() {
        let key = Key::PageUp;
        let json = serde_json::to_string(&key).unwrap();
        let deserialized: Key = serde_json::from_str(&json).unwrap();
        assert_eq!(key, deserialized);
    }
}

//! Event model matching the on-disk JSON format
//!
//! Every event serializes to a flat object with `type` ("mouse"|"key"),
//! `subtype`, `time` (float seconds since recording start), and
//! type-specific fields. Key and button identifiers keep the string values
//! older recordings used ("left", "Key.space", "a") but are closed enums
//! internally, resolved only at synthesis time.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One captured input occurrence plus its position on the replay timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(flatten)]
    pub kind: EventKind,
    /// Seconds since recording start, non-decreasing across a recording.
    pub time: f64,
}

impl Event {
    pub fn new(kind: EventKind, time: f64) -> Self {
        Self { kind, time }
    }

    pub fn is_mouse(&self) -> bool {
        matches!(self.kind, EventKind::Mouse(_))
    }
}

/// Tagged event union - `type` field on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventKind {
    Mouse(MouseAction),
    Key(KeyAction),
}

/// Pointer events - `subtype` field on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subtype", rename_all = "lowercase")]
pub enum MouseAction {
    Move { x: f64, y: f64 },
    Click { x: f64, y: f64, button: Button, pressed: bool },
    Scroll { x: f64, y: f64, dx: i32, dy: i32 },
}

/// Key events - `subtype` field on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subtype", rename_all = "lowercase")]
pub enum KeyAction {
    Press { key: Key },
    Release { key: Key },
}

/// Mouse button identifier. `Other` carries an unrecognized identifier
/// through load verbatim; it fails at synthesis, not before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Button {
    Left,
    Right,
    Middle,
    Other(String),
}

impl Button {
    pub fn as_str(&self) -> &str {
        match self {
            Button::Left => "left",
            Button::Right => "right",
            Button::Middle => "middle",
            Button::Other(s) => s,
        }
    }
}

impl From<&str> for Button {
    fn from(s: &str) -> Self {
        match s {
            "left" => Button::Left,
            "right" => Button::Right,
            "middle" => Button::Middle,
            other => Button::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Button {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Button {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Button::from(s.as_str()))
    }
}

/// A key identifier: a literal printable character, a symbolic key from the
/// fixed [`NamedKey`] set, or an unresolved name carried through as-is.
///
/// Named keys serialize as `Key.<name>` to stay compatible with existing
/// recordings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Named(NamedKey),
    Unknown(String),
}

impl Key {
    /// Wire representation of this key.
    pub fn repr(&self) -> String {
        match self {
            Key::Char(c) => c.to_string(),
            Key::Named(k) => format!("Key.{}", k.as_str()),
            Key::Unknown(s) => s.clone(),
        }
    }

    /// Parse a wire representation. Never fails: unresolvable symbolic
    /// names become [`Key::Unknown`].
    pub fn parse(s: &str) -> Self {
        if let Some(name) = s.strip_prefix("Key.") {
            return match NamedKey::from_name(name) {
                Some(k) => Key::Named(k),
                None => Key::Unknown(s.to_string()),
            };
        }
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Key::Char(c),
            _ => Key::Unknown(s.to_string()),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.repr())
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Key::parse(&s))
    }
}

macro_rules! named_keys {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// The fixed set of non-printable keys.
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum NamedKey {
            $($variant,)+
        }

        impl NamedKey {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(NamedKey::$variant => $name,)+
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(NamedKey::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

named_keys! {
    Alt => "alt",
    AltL => "alt_l",
    AltR => "alt_r",
    AltGr => "alt_gr",
    Backspace => "backspace",
    CapsLock => "caps_lock",
    Cmd => "cmd",
    CmdL => "cmd_l",
    CmdR => "cmd_r",
    Ctrl => "ctrl",
    CtrlL => "ctrl_l",
    CtrlR => "ctrl_r",
    Delete => "delete",
    Down => "down",
    End => "end",
    Enter => "enter",
    Esc => "esc",
    F1 => "f1",
    F2 => "f2",
    F3 => "f3",
    F4 => "f4",
    F5 => "f5",
    F6 => "f6",
    F7 => "f7",
    F8 => "f8",
    F9 => "f9",
    F10 => "f10",
    F11 => "f11",
    F12 => "f12",
    Home => "home",
    Insert => "insert",
    Left => "left",
    Menu => "menu",
    NumLock => "num_lock",
    PageDown => "page_down",
    PageUp => "page_up",
    Pause => "pause",
    PrintScreen => "print_screen",
    Right => "right",
    ScrollLock => "scroll_lock",
    Shift => "shift",
    ShiftL => "shift_l",
    ShiftR => "shift_r",
    Space => "space",
    Tab => "tab",
    Up => "up",
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn click_serializes_to_flat_object() {
        let ev = Event::new(
            EventKind::Mouse(MouseAction::Click {
                x: 10.0,
                y: 20.0,
                button: Button::Left,
                pressed: true,
            }),
            0.5,
        );
        let v = serde_json::to_value(&ev).unwrap();
        assert_eq!(
            v,
            json!({
                "type": "mouse",
                "subtype": "click",
                "x": 10.0,
                "y": 20.0,
                "button": "left",
                "pressed": true,
                "time": 0.5,
            })
        );
    }

    #[test]
    fn key_press_serializes_with_symbolic_name() {
        let ev = Event::new(
            EventKind::Key(KeyAction::Press {
                key: Key::Named(NamedKey::Space),
            }),
            1.25,
        );
        let v = serde_json::to_value(&ev).unwrap();
        assert_eq!(
            v,
            json!({
                "type": "key",
                "subtype": "press",
                "key": "Key.space",
                "time": 1.25,
            })
        );
    }

    #[test]
    fn deserializes_legacy_fields() {
        let ev: Event = serde_json::from_str(
            r#"{"type": "mouse", "subtype": "scroll", "x": 5, "y": 7, "dx": 0, "dy": -2, "time": 3.1}"#,
        )
        .unwrap();
        assert_eq!(
            ev.kind,
            EventKind::Mouse(MouseAction::Scroll {
                x: 5.0,
                y: 7.0,
                dx: 0,
                dy: -2,
            })
        );
        assert_eq!(ev.time, 3.1);
    }

    #[test]
    fn key_repr_round_trips() {
        for repr in ["a", "Z", "Key.shift", "Key.f11", "Key.page_down"] {
            assert_eq!(Key::parse(repr).repr(), repr);
        }
    }

    #[test]
    fn unresolvable_key_is_preserved_verbatim() {
        let key = Key::parse("Key.hyper_mega");
        assert_eq!(key, Key::Unknown("Key.hyper_mega".to_string()));
        assert_eq!(key.repr(), "Key.hyper_mega");

        let ev: Event =
            serde_json::from_str(r#"{"type":"key","subtype":"release","key":"Key.hyper_mega","time":0.0}"#)
                .unwrap();
        let back = serde_json::to_string(&ev).unwrap();
        assert!(back.contains("Key.hyper_mega"));
    }

    #[test]
    fn unknown_button_is_preserved_verbatim() {
        let ev: Event = serde_json::from_str(
            r#"{"type":"mouse","subtype":"click","x":0,"y":0,"button":"button9","pressed":false,"time":0.0}"#,
        )
        .unwrap();
        match &ev.kind {
            EventKind::Mouse(MouseAction::Click { button, .. }) => {
                assert_eq!(*button, Button::Other("button9".to_string()));
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }
}

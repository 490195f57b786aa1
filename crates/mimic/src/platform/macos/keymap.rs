//! macOS keycode mapping, both directions.
//!
//! Capture resolves hardware keycodes to the portable [`Key`] model;
//! synthesis resolves the model back to keycodes. Keys with no macOS
//! equivalent (num_lock and friends) simply have no keycode and fail at
//! synthesis like any other unknown identifier.

use crate::events::{Key, NamedKey};

pub const FLAG_CAPS: u64 = 0x10000;
pub const FLAG_SHIFT: u64 = 0x20000;
pub const FLAG_CTRL: u64 = 0x40000;
pub const FLAG_ALT: u64 = 0x80000;
pub const FLAG_CMD: u64 = 0x100000;

/// Resolve a captured keycode. Unknown codes are carried through in
/// `<keycode>` notation so they survive a save/load round trip.
pub fn key_from_keycode(keycode: u16, shift: bool) -> Key {
    if let Some(named) = keycode_to_named(keycode) {
        return Key::Named(named);
    }
    if let Some(c) = char_for_keycode(keycode, shift) {
        return Key::Char(c);
    }
    Key::Unknown(format!("<{keycode}>"))
}

/// Resolve a key for synthesis: `(keycode, needs_shift)`.
pub fn keycode_for_key(key: &Key) -> Option<(u16, bool)> {
    match key {
        Key::Char(c) => keycode_for_char(*c),
        Key::Named(named) => named_to_keycode(*named).map(|code| (code, false)),
        Key::Unknown(_) => None,
    }
}

/// Modifier keys arrive as FLAGS_CHANGED; map keycode to the named key and
/// the flag bit that indicates whether it is now pressed.
pub fn modifier_from_keycode(keycode: u16) -> Option<(NamedKey, u64)> {
    Some(match keycode {
        56 => (NamedKey::Shift, FLAG_SHIFT),
        60 => (NamedKey::ShiftR, FLAG_SHIFT),
        59 => (NamedKey::Ctrl, FLAG_CTRL),
        62 => (NamedKey::CtrlR, FLAG_CTRL),
        58 => (NamedKey::Alt, FLAG_ALT),
        61 => (NamedKey::AltR, FLAG_ALT),
        55 => (NamedKey::Cmd, FLAG_CMD),
        54 => (NamedKey::CmdR, FLAG_CMD),
        57 => (NamedKey::CapsLock, FLAG_CAPS),
        _ => return None,
    })
}

fn keycode_to_named(keycode: u16) -> Option<NamedKey> {
    Some(match keycode {
        36 => NamedKey::Enter,
        48 => NamedKey::Tab,
        49 => NamedKey::Space,
        51 => NamedKey::Backspace,
        53 => NamedKey::Esc,
        114 => NamedKey::Insert,
        115 => NamedKey::Home,
        116 => NamedKey::PageUp,
        117 => NamedKey::Delete,
        119 => NamedKey::End,
        121 => NamedKey::PageDown,
        123 => NamedKey::Left,
        124 => NamedKey::Right,
        125 => NamedKey::Down,
        126 => NamedKey::Up,
        110 => NamedKey::Menu,
        122 => NamedKey::F1,
        120 => NamedKey::F2,
        99 => NamedKey::F3,
        118 => NamedKey::F4,
        96 => NamedKey::F5,
        97 => NamedKey::F6,
        98 => NamedKey::F7,
        100 => NamedKey::F8,
        101 => NamedKey::F9,
        109 => NamedKey::F10,
        103 => NamedKey::F11,
        111 => NamedKey::F12,
        _ => return None,
    })
}

fn named_to_keycode(named: NamedKey) -> Option<u16> {
    Some(match named {
        NamedKey::Enter => 36,
        NamedKey::Tab => 48,
        NamedKey::Space => 49,
        NamedKey::Backspace => 51,
        NamedKey::Esc => 53,
        NamedKey::Insert => 114,
        NamedKey::Home => 115,
        NamedKey::PageUp => 116,
        NamedKey::Delete => 117,
        NamedKey::End => 119,
        NamedKey::PageDown => 121,
        NamedKey::Left => 123,
        NamedKey::Right => 124,
        NamedKey::Down => 125,
        NamedKey::Up => 126,
        NamedKey::Menu => 110,
        NamedKey::Shift | NamedKey::ShiftL => 56,
        NamedKey::ShiftR => 60,
        NamedKey::Ctrl | NamedKey::CtrlL => 59,
        NamedKey::CtrlR => 62,
        NamedKey::Alt | NamedKey::AltL => 58,
        NamedKey::AltR | NamedKey::AltGr => 61,
        NamedKey::Cmd | NamedKey::CmdL => 55,
        NamedKey::CmdR => 54,
        NamedKey::CapsLock => 57,
        NamedKey::F1 => 122,
        NamedKey::F2 => 120,
        NamedKey::F3 => 99,
        NamedKey::F4 => 118,
        NamedKey::F5 => 96,
        NamedKey::F6 => 97,
        NamedKey::F7 => 98,
        NamedKey::F8 => 100,
        NamedKey::F9 => 101,
        NamedKey::F10 => 109,
        NamedKey::F11 => 103,
        NamedKey::F12 => 111,
        NamedKey::NumLock
        | NamedKey::Pause
        | NamedKey::PrintScreen
        | NamedKey::ScrollLock => return None,
    })
}

fn char_for_keycode(keycode: u16, shift: bool) -> Option<char> {
    let c = match keycode {
        // Letters
        0 => 'a',
        1 => 's',
        2 => 'd',
        3 => 'f',
        4 => 'h',
        5 => 'g',
        6 => 'z',
        7 => 'x',
        8 => 'c',
        9 => 'v',
        11 => 'b',
        12 => 'q',
        13 => 'w',
        14 => 'e',
        15 => 'r',
        16 => 'y',
        17 => 't',
        31 => 'o',
        32 => 'u',
        34 => 'i',
        35 => 'p',
        37 => 'l',
        38 => 'j',
        40 => 'k',
        45 => 'n',
        46 => 'm',
        // Numbers
        18 => if shift { '!' } else { '1' },
        19 => if shift { '@' } else { '2' },
        20 => if shift { '#' } else { '3' },
        21 => if shift { '$' } else { '4' },
        22 => if shift { '^' } else { '6' },
        23 => if shift { '%' } else { '5' },
        24 => if shift { '+' } else { '=' },
        25 => if shift { '(' } else { '9' },
        26 => if shift { '&' } else { '7' },
        27 => if shift { '_' } else { '-' },
        28 => if shift { '*' } else { '8' },
        29 => if shift { ')' } else { '0' },
        // Punctuation
        30 => if shift { '}' } else { ']' },
        33 => if shift { '{' } else { '[' },
        39 => if shift { '"' } else { '\'' },
        41 => if shift { ':' } else { ';' },
        42 => if shift { '|' } else { '\\' },
        43 => if shift { '<' } else { ',' },
        44 => if shift { '?' } else { '/' },
        47 => if shift { '>' } else { '.' },
        50 => if shift { '~' } else { '`' },
        _ => return None,
    };

    if shift && c.is_ascii_lowercase() {
        Some(c.to_ascii_uppercase())
    } else {
        Some(c)
    }
}

/// `(keycode, needs_shift)` for a literal character.
fn keycode_for_char(c: char) -> Option<(u16, bool)> {
    Some(match c {
        'a' | 'A' => (0, c.is_uppercase()),
        'b' | 'B' => (11, c.is_uppercase()),
        'c' | 'C' => (8, c.is_uppercase()),
        'd' | 'D' => (2, c.is_uppercase()),
        'e' | 'E' => (14, c.is_uppercase()),
        'f' | 'F' => (3, c.is_uppercase()),
        'g' | 'G' => (5, c.is_uppercase()),
        'h' | 'H' => (4, c.is_uppercase()),
        'i' | 'I' => (34, c.is_uppercase()),
        'j' | 'J' => (38, c.is_uppercase()),
        'k' | 'K' => (40, c.is_uppercase()),
        'l' | 'L' => (37, c.is_uppercase()),
        'm' | 'M' => (46, c.is_uppercase()),
        'n' | 'N' => (45, c.is_uppercase()),
        'o' | 'O' => (31, c.is_uppercase()),
        'p' | 'P' => (35, c.is_uppercase()),
        'q' | 'Q' => (12, c.is_uppercase()),
        'r' | 'R' => (15, c.is_uppercase()),
        's' | 'S' => (1, c.is_uppercase()),
        't' | 'T' => (17, c.is_uppercase()),
        'u' | 'U' => (32, c.is_uppercase()),
        'v' | 'V' => (9, c.is_uppercase()),
        'w' | 'W' => (13, c.is_uppercase()),
        'x' | 'X' => (7, c.is_uppercase()),
        'y' | 'Y' => (16, c.is_uppercase()),
        'z' | 'Z' => (6, c.is_uppercase()),
        '0' | ')' => (29, c == ')'),
        '1' | '!' => (18, c == '!'),
        '2' | '@' => (19, c == '@'),
        '3' | '#' => (20, c == '#'),
        '4' | '$' => (21, c == '$'),
        '5' | '%' => (23, c == '%'),
        '6' | '^' => (22, c == '^'),
        '7' | '&' => (26, c == '&'),
        '8' | '*' => (28, c == '*'),
        '9' | '(' => (25, c == '('),
        ' ' => (49, false),
        '\n' => (36, false),
        '\t' => (48, false),
        '-' | '_' => (27, c == '_'),
        '=' | '+' => (24, c == '+'),
        '[' | '{' => (33, c == '{'),
        ']' | '}' => (30, c == '}'),
        '\\' | '|' => (42, c == '|'),
        ';' | ':' => (41, c == ':'),
        '\'' | '"' => (39, c == '"'),
        ',' | '<' => (43, c == '<'),
        '.' | '>' => (47, c == '>'),
        '/' | '?' => (44, c == '?'),
        '`' | '~' => (50, c == '~'),
        _ => return None,
    })
}

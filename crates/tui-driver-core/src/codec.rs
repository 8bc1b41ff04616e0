//! Chord-to-bytes input encoding.
//!
//! Implements the encoding an xterm-compatible terminal sends for key and
//! mouse input: C0 control bytes for ctrl+letter, CSI-u for modified
//! specials, fixed escape sequences for navigation and function keys, and
//! SGR (1006) mouse reports for pointer events. Pure functions, no state.

use crate::key::Key;

const ESC: u8 = 0x1b;

/// SGR button code for the left mouse button.
const BUTTON_LEFT: u8 = 0;
/// SGR button code for wheel-up.
const BUTTON_WHEEL_UP: u8 = 64;
/// SGR button code for wheel-down.
const BUTTON_WHEEL_DOWN: u8 = 65;

/// Encode a chord into the byte string to write to the PTY.
///
/// Modifiers anywhere in the chord apply to every main key; main keys are
/// encoded in input order and their encodings concatenated. A chord of
/// only modifiers encodes to the empty string.
pub fn encode_chord(keys: &[Key]) -> Vec<u8> {
    let ctrl = keys.contains(&Key::Ctrl);
    let alt = keys.contains(&Key::Alt);
    let shift = keys.contains(&Key::Shift);

    let mut out = Vec::new();
    for key in keys.iter().filter(|k| !k.is_modifier()) {
        encode_main(*key, ctrl, alt, shift, &mut out);
    }
    out
}

fn encode_main(key: Key, ctrl: bool, alt: bool, shift: bool, out: &mut Vec<u8>) {
    // ctrl+letter collapses to a C0 control byte; ctrl with any other
    // single character passes the character through. Shift and alt are
    // ignored on this branch.
    if ctrl {
        if let Key::Char(c) = key {
            if c.is_ascii_alphabetic() {
                out.push(c.to_ascii_lowercase() as u8 - b'a' + 1);
            } else {
                push_char(c, out);
            }
            return;
        }
    }

    // Modified enter/tab/backspace/esc need CSI-u; the legacy sequences
    // cannot carry modifiers for these keys.
    if ctrl || alt || shift {
        if let Some(code) = csi_u_keycode(key) {
            let modifier = 1 + u8::from(shift) + 2 * u8::from(alt) + 4 * u8::from(ctrl);
            out.extend_from_slice(format!("\x1b[{code};{modifier}u").as_bytes());
            return;
        }
    }

    if let Some(seq) = fixed_sequence(key) {
        if alt {
            out.push(ESC);
        }
        out.extend_from_slice(seq);
        return;
    }

    if let Key::Char(c) = key {
        if alt {
            out.push(ESC);
        }
        let c = if shift { c.to_ascii_uppercase() } else { c };
        push_char(c, out);
    }
}

fn push_char(c: char, out: &mut Vec<u8>) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

/// Unicode codepoint used in the CSI-u encoding for a modified special.
fn csi_u_keycode(key: Key) -> Option<u32> {
    match key {
        Key::Enter => Some(13),
        Key::Tab => Some(9),
        Key::Backspace => Some(127),
        Key::Esc => Some(27),
        _ => None,
    }
}

/// Fixed escape sequence for a named special, if it has one.
fn fixed_sequence(key: Key) -> Option<&'static [u8]> {
    let seq: &'static [u8] = match key {
        Key::Enter => b"\r",
        Key::Tab => b"\t",
        Key::Space => b" ",
        Key::Backspace => b"\x7f",
        Key::Delete => b"\x1b[3~",
        Key::Insert => b"\x1b[2~",
        Key::Up => b"\x1b[A",
        Key::Down => b"\x1b[B",
        Key::Right => b"\x1b[C",
        Key::Left => b"\x1b[D",
        Key::Home => b"\x1b[H",
        Key::End => b"\x1b[F",
        Key::PageUp => b"\x1b[5~",
        Key::PageDown => b"\x1b[6~",
        Key::Clear => b"\x1b[E",
        Key::Linefeed => b"\n",
        Key::Esc => b"\x1b",
        Key::F1 => b"\x1bOP",
        Key::F2 => b"\x1bOQ",
        Key::F3 => b"\x1bOR",
        Key::F4 => b"\x1bOS",
        Key::F5 => b"\x1b[15~",
        Key::F6 => b"\x1b[17~",
        Key::F7 => b"\x1b[18~",
        Key::F8 => b"\x1b[19~",
        Key::F9 => b"\x1b[20~",
        Key::F10 => b"\x1b[21~",
        Key::F11 => b"\x1b[23~",
        Key::F12 => b"\x1b[24~",
        _ => return None,
    };
    Some(seq)
}

fn sgr_event(button: u8, x: u16, y: u16, press: bool) -> String {
    // Wire coordinates are 1-based.
    let terminator = if press { 'M' } else { 'm' };
    format!("\x1b[<{button};{};{}{terminator}", x + 1, y + 1)
}

/// Encode an SGR press+release pair for a left click at cell (x, y).
pub fn mouse_click(x: u16, y: u16) -> Vec<u8> {
    let mut out = sgr_event(BUTTON_LEFT, x, y, true);
    out.push_str(&sgr_event(BUTTON_LEFT, x, y, false));
    out.into_bytes()
}

/// Encode `count` wheel-up events at cell (x, y).
pub fn mouse_scroll_up(x: u16, y: u16, count: u16) -> Vec<u8> {
    sgr_event(BUTTON_WHEEL_UP, x, y, true)
        .repeat(count as usize)
        .into_bytes()
}

/// Encode `count` wheel-down events at cell (x, y).
pub fn mouse_scroll_down(x: u16, y: u16, count: u16) -> Vec<u8> {
    sgr_event(BUTTON_WHEEL_DOWN, x, y, true)
        .repeat(count as usize)
        .into_bytes()
}

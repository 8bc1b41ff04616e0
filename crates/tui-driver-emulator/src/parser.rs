//! ANSI/VT escape sequence parsing using the VTE crate.

use vte::{Params, Perform};

use tui_driver_core::{CellAttributes, Color};

use crate::grid::Grid;

/// ANSI parser feeding a terminal grid.
///
/// The VTE state machine persists across `feed` calls, so escape
/// sequences split across chunk boundaries parse correctly. The parser
/// is total over arbitrary byte streams: unknown sequences are ignored.
pub struct Parser {
    machine: vte::Parser,
    performer: Performer,
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("grid", &self.performer.grid)
            .finish_non_exhaustive()
    }
}

impl Parser {
    /// Create a new parser over the given grid.
    pub fn new(grid: Grid) -> Self {
        Self {
            machine: vte::Parser::new(),
            performer: Performer { grid },
        }
    }

    /// Feed bytes through the state machine, updating the grid.
    pub fn feed(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.machine.advance(&mut self.performer, *byte);
        }
    }

    /// Get a reference to the grid.
    pub fn grid(&self) -> &Grid {
        &self.performer.grid
    }

    /// Get a mutable reference to the grid.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.performer.grid
    }
}

struct Performer {
    grid: Grid,
}

/// First value of the nth parameter, or the default.
fn param(params: &Params, idx: usize, default: u16) -> u16 {
    params.iter().nth(idx).map(|p| p[0]).unwrap_or(default)
}

/// Count parameter: a missing or zero value means 1.
fn count_param(params: &Params, idx: usize) -> u16 {
    match param(params, idx, 1) {
        0 => 1,
        n => n,
    }
}

impl Performer {
    fn cursor_forward(&mut self, n: u16) {
        let dims = self.grid.dimensions();
        let col = self.grid.cursor().position.col;
        let row = self.grid.cursor().position.row;
        self.grid
            .move_cursor(row, (col + n).min(dims.cols.saturating_sub(1)));
    }

    fn cursor_backward(&mut self, n: u16) {
        let pos = self.grid.cursor().position;
        self.grid.move_cursor(pos.row, pos.col.saturating_sub(n));
    }

    fn cursor_down(&mut self, n: u16) {
        let dims = self.grid.dimensions();
        let pos = self.grid.cursor().position;
        self.grid
            .move_cursor((pos.row + n).min(dims.rows.saturating_sub(1)), pos.col);
    }

    fn cursor_up(&mut self, n: u16) {
        let pos = self.grid.cursor().position;
        self.grid.move_cursor(pos.row.saturating_sub(n), pos.col);
    }

    fn process_sgr(&mut self, params: &Params) {
        if params.len() == 0 {
            self.sgr_reset();
            return;
        }

        let mut iter = params.iter();
        while let Some(p) = iter.next() {
            let code = p[0];
            match code {
                0 => self.sgr_reset(),
                1 => self.update_attrs(|a| a.bold = true),
                2 => self.update_attrs(|a| a.dim = true),
                3 => self.update_attrs(|a| a.italic = true),
                4 => self.update_attrs(|a| a.underline = true),
                5 => self.update_attrs(|a| a.blink = true),
                7 => self.update_attrs(|a| a.reverse = true),
                8 => self.update_attrs(|a| a.hidden = true),
                9 => self.update_attrs(|a| a.strikethrough = true),
                22 => self.update_attrs(|a| {
                    a.bold = false;
                    a.dim = false;
                }),
                23 => self.update_attrs(|a| a.italic = false),
                24 => self.update_attrs(|a| a.underline = false),
                25 => self.update_attrs(|a| a.blink = false),
                27 => self.update_attrs(|a| a.reverse = false),
                28 => self.update_attrs(|a| a.hidden = false),
                29 => self.update_attrs(|a| a.strikethrough = false),

                // Classic and bright ANSI colors map into the palette
                30..=37 => self.grid.set_current_fg(Color::Indexed((code - 30) as u8)),
                39 => self.grid.set_current_fg(Color::Default),
                40..=47 => self.grid.set_current_bg(Color::Indexed((code - 40) as u8)),
                49 => self.grid.set_current_bg(Color::Default),
                90..=97 => self
                    .grid
                    .set_current_fg(Color::Indexed((code - 90 + 8) as u8)),
                100..=107 => self
                    .grid
                    .set_current_bg(Color::Indexed((code - 100 + 8) as u8)),

                // Extended colors: 38/48 ; 5 ; n  or  38/48 ; 2 ; r ; g ; b
                38 | 48 => {
                    let color = match p.get(1) {
                        // Colon-separated subparameters arrive in one slice
                        Some(&5) => p.get(2).map(|&n| Color::Indexed(n as u8)),
                        Some(&2) => match (p.get(2), p.get(3), p.get(4)) {
                            (Some(&r), Some(&g), Some(&b)) => Some(Color::Rgb {
                                r: r as u8,
                                g: g as u8,
                                b: b as u8,
                            }),
                            _ => None,
                        },
                        // Semicolon-separated form spans several parameters
                        None => match iter.next().map(|p| p[0]) {
                            Some(5) => iter.next().map(|n| Color::Indexed(n[0] as u8)),
                            Some(2) => {
                                match (iter.next(), iter.next(), iter.next()) {
                                    (Some(r), Some(g), Some(b)) => Some(Color::Rgb {
                                        r: r[0] as u8,
                                        g: g[0] as u8,
                                        b: b[0] as u8,
                                    }),
                                    _ => None,
                                }
                            }
                            _ => None,
                        },
                        _ => None,
                    };
                    if let Some(color) = color {
                        if code == 38 {
                            self.grid.set_current_fg(color);
                        } else {
                            self.grid.set_current_bg(color);
                        }
                    }
                }

                _ => {} // Ignore unknown SGR codes
            }
        }
    }

    fn sgr_reset(&mut self) {
        self.grid.set_current_attrs(CellAttributes::default());
        self.grid.set_current_fg(Color::Default);
        self.grid.set_current_bg(Color::Default);
    }

    fn update_attrs(&mut self, f: impl FnOnce(&mut CellAttributes)) {
        let mut attrs = *self.grid.current_attrs();
        f(&mut attrs);
        self.grid.set_current_attrs(attrs);
    }

    /// DEC private mode set/reset (CSI ? n h / l).
    fn private_mode(&mut self, params: &Params, set: bool) {
        for p in params.iter() {
            match p[0] {
                25 => self.grid.cursor_mut().visible = set,
                // Alternate screen is approximated: the grid is cleared on
                // both enter and leave; primary content is not kept.
                47 | 1047 | 1049 => {
                    if set {
                        self.grid.save_cursor();
                        self.grid.clear();
                        self.grid.move_cursor(0, 0);
                    } else {
                        self.grid.clear();
                        self.grid.restore_cursor();
                    }
                }
                _ => {}
            }
        }
    }
}

impl Perform for Performer {
    fn print(&mut self, c: char) {
        self.grid.put_char(c);
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            // Backspace (BS)
            0x08 => self.cursor_backward(1),

            // Horizontal Tab (HT): next 8-aligned tab stop
            0x09 => {
                let dims = self.grid.dimensions();
                let pos = self.grid.cursor().position;
                let next_tab = ((pos.col / 8) + 1) * 8;
                self.grid
                    .move_cursor(pos.row, next_tab.min(dims.cols.saturating_sub(1)));
            }

            // Line Feed, Vertical Tab, Form Feed
            0x0a | 0x0b | 0x0c => self.grid.linefeed(),

            // Carriage Return (CR)
            0x0d => {
                let row = self.grid.cursor().position.row;
                self.grid.move_cursor(row, 0);
            }

            _ => {} // Ignore other control codes
        }
    }

    fn hook(&mut self, _params: &Params, _intermediates: &[u8], _ignore: bool, _c: char) {}

    fn put(&mut self, _byte: u8) {}

    fn unhook(&mut self) {}

    fn osc_dispatch(&mut self, _params: &[&[u8]], _bell_terminated: bool) {}

    fn csi_dispatch(&mut self, params: &Params, intermediates: &[u8], _ignore: bool, c: char) {
        match intermediates.first() {
            Some(&b'?') => {
                match c {
                    'h' => self.private_mode(params, true),
                    'l' => self.private_mode(params, false),
                    _ => {}
                }
                return;
            }
            // Other markers (e.g. an echoed SGR mouse report's '<') must
            // not reach the standard dispatch below.
            Some(_) => return,
            None => {}
        }

        match c {
            // Cursor movement
            'A' => self.cursor_up(count_param(params, 0)),
            'B' => self.cursor_down(count_param(params, 0)),
            'C' => self.cursor_forward(count_param(params, 0)),
            'D' => self.cursor_backward(count_param(params, 0)),

            // Cursor Next/Previous Line
            'E' => {
                self.cursor_down(count_param(params, 0));
                let row = self.grid.cursor().position.row;
                self.grid.move_cursor(row, 0);
            }
            'F' => {
                self.cursor_up(count_param(params, 0));
                let row = self.grid.cursor().position.row;
                self.grid.move_cursor(row, 0);
            }

            // Cursor Horizontal Absolute / Vertical Position Absolute
            'G' => {
                let row = self.grid.cursor().position.row;
                self.grid
                    .move_cursor(row, param(params, 0, 1).saturating_sub(1));
            }
            'd' => {
                let col = self.grid.cursor().position.col;
                self.grid
                    .move_cursor(param(params, 0, 1).saturating_sub(1), col);
            }

            // Cursor Position
            'H' | 'f' => {
                let row = param(params, 0, 1).saturating_sub(1);
                let col = param(params, 1, 1).saturating_sub(1);
                self.grid.move_cursor(row, col);
            }

            // Erase in Display
            'J' => {
                let mode = param(params, 0, 0);
                let pos = self.grid.cursor().position;
                let dims = self.grid.dimensions();
                match mode {
                    0 => {
                        self.grid
                            .erase_chars(pos.row, pos.col, dims.cols - pos.col);
                        for row in (pos.row + 1)..dims.rows {
                            self.grid.clear_row(row);
                        }
                    }
                    1 => {
                        for row in 0..pos.row {
                            self.grid.clear_row(row);
                        }
                        self.grid.erase_chars(pos.row, 0, pos.col + 1);
                    }
                    2 | 3 => self.grid.clear(),
                    _ => {}
                }
            }

            // Erase in Line
            'K' => {
                let mode = param(params, 0, 0);
                let pos = self.grid.cursor().position;
                let dims = self.grid.dimensions();
                match mode {
                    0 => self
                        .grid
                        .erase_chars(pos.row, pos.col, dims.cols - pos.col),
                    1 => self.grid.erase_chars(pos.row, 0, pos.col + 1),
                    2 => self.grid.clear_row(pos.row),
                    _ => {}
                }
            }

            // Insert/Delete Lines
            'L' => {
                let row = self.grid.cursor().position.row;
                self.grid.insert_lines(row, count_param(params, 0));
            }
            'M' => {
                let row = self.grid.cursor().position.row;
                self.grid.delete_lines(row, count_param(params, 0));
            }

            // Insert/Delete/Erase Characters
            '@' => {
                let pos = self.grid.cursor().position;
                self.grid
                    .insert_chars(pos.row, pos.col, count_param(params, 0));
            }
            'P' => {
                let pos = self.grid.cursor().position;
                self.grid
                    .delete_chars(pos.row, pos.col, count_param(params, 0));
            }
            'X' => {
                let pos = self.grid.cursor().position;
                self.grid
                    .erase_chars(pos.row, pos.col, count_param(params, 0));
            }

            // Scroll Up/Down
            'S' => self.grid.scroll_up(count_param(params, 0)),
            'T' => self.grid.scroll_down(count_param(params, 0)),

            // Set Scroll Region
            'r' => {
                let dims = self.grid.dimensions();
                let top = param(params, 0, 1).saturating_sub(1);
                let bottom = param(params, 1, dims.rows).saturating_sub(1);
                self.grid.set_scroll_region(top, bottom);
                self.grid.move_cursor(0, 0);
            }

            // Select Graphic Rendition
            'm' => self.process_sgr(params),

            // Save/Restore Cursor Position
            's' => self.grid.save_cursor(),
            'u' => self.grid.restore_cursor(),

            _ => {} // Ignore unknown CSI sequences
        }
    }

    fn esc_dispatch(&mut self, intermediates: &[u8], _ignore: bool, byte: u8) {
        if !intermediates.is_empty() {
            return;
        }
        match byte {
            // Reverse Index
            b'M' => self.grid.reverse_linefeed(),
            // DECSC / DECRC
            b'7' => self.grid.save_cursor(),
            b'8' => self.grid.restore_cursor(),
            // RIS full reset
            b'c' => {
                self.grid.clear();
                self.grid.move_cursor(0, 0);
                self.sgr_reset();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tui_driver_core::Dimensions;

    fn parser(rows: u16, cols: u16) -> Parser {
        Parser::new(Grid::new(Dimensions::new(rows, cols)))
    }

    #[test]
    fn test_print_basic_text() {
        let mut parser = parser(24, 80);
        parser.feed(b"Hello, World!");
        assert_eq!(parser.grid().line_text(0).trim_end(), "Hello, World!");
        assert_eq!(parser.grid().cursor().position.col, 13);
    }

    #[test]
    fn test_crlf_moves_to_next_line() {
        let mut parser = parser(24, 80);
        parser.feed(b"one\r\ntwo");
        assert_eq!(parser.grid().line_text(0).trim_end(), "one");
        assert_eq!(parser.grid().line_text(1).trim_end(), "two");
    }

    #[test]
    fn test_carriage_return_overwrites() {
        let mut parser = parser(24, 80);
        parser.feed(b"abcdef\rXY");
        assert_eq!(parser.grid().line_text(0).trim_end(), "XYcdef");
    }

    #[test]
    fn test_cursor_position_csi() {
        let mut parser = parser(24, 80);
        parser.feed(b"\x1b[5;10Hx");
        assert_eq!(parser.grid().cell(4, 9).unwrap().character, 'x');
    }

    #[test]
    fn test_cursor_movement() {
        let mut parser = parser(24, 80);
        parser.feed(b"\x1b[3;3H\x1b[A\x1b[2C");
        let pos = parser.grid().cursor().position;
        assert_eq!((pos.row, pos.col), (1, 4));
    }

    #[test]
    fn test_sgr_classic_colors() {
        let mut parser = parser(2, 20);
        parser.feed(b"\x1b[31mred\x1b[0mplain");
        assert_eq!(parser.grid().cell(0, 0).unwrap().fg, Color::Indexed(1));
        assert_eq!(parser.grid().cell(0, 3).unwrap().fg, Color::Default);
    }

    #[test]
    fn test_sgr_bright_colors() {
        let mut parser = parser(2, 20);
        parser.feed(b"\x1b[92mok\x1b[m");
        assert_eq!(parser.grid().cell(0, 0).unwrap().fg, Color::Indexed(10));
    }

    #[test]
    fn test_sgr_256_color() {
        let mut parser = parser(2, 20);
        parser.feed(b"\x1b[38;5;243mgrey");
        assert_eq!(parser.grid().cell(0, 0).unwrap().fg, Color::Indexed(243));
    }

    #[test]
    fn test_sgr_rgb_color() {
        let mut parser = parser(2, 20);
        parser.feed(b"\x1b[38;2;255;136;0mo\x1b[48;2;0;0;255mb");
        assert_eq!(
            parser.grid().cell(0, 0).unwrap().fg,
            Color::Rgb {
                r: 255,
                g: 136,
                b: 0
            }
        );
        assert_eq!(
            parser.grid().cell(0, 1).unwrap().bg,
            Color::Rgb { r: 0, g: 0, b: 255 }
        );
    }

    #[test]
    fn test_sgr_attributes() {
        let mut parser = parser(2, 20);
        parser.feed(b"\x1b[1;3;4mx\x1b[22my");
        let styled = parser.grid().cell(0, 0).unwrap();
        assert!(styled.attrs.bold);
        assert!(styled.attrs.italic);
        assert!(styled.attrs.underline);
        let unbolded = parser.grid().cell(0, 1).unwrap();
        assert!(!unbolded.attrs.bold);
        assert!(unbolded.attrs.italic);
    }

    #[test]
    fn test_sgr_empty_resets() {
        let mut parser = parser(2, 20);
        parser.feed(b"\x1b[31;1m\x1b[mx");
        let cell = parser.grid().cell(0, 0).unwrap();
        assert_eq!(cell.fg, Color::Default);
        assert!(!cell.attrs.bold);
    }

    #[test]
    fn test_erase_in_line() {
        let mut parser = parser(2, 10);
        parser.feed(b"abcdef\x1b[3G\x1b[K");
        assert_eq!(parser.grid().line_text(0).trim_end(), "ab");
    }

    #[test]
    fn test_erase_in_display_clears_screen() {
        let mut parser = parser(3, 10);
        parser.feed(b"one\r\ntwo\r\nthree\x1b[2J");
        assert_eq!(parser.grid().to_plain_text(), "\n\n");
    }

    #[test]
    fn test_escape_split_across_feeds() {
        let mut parser = parser(2, 20);
        parser.feed(b"\x1b[");
        parser.feed(b"31m");
        parser.feed(b"red");
        assert_eq!(parser.grid().cell(0, 0).unwrap().fg, Color::Indexed(1));
        assert_eq!(parser.grid().line_text(0).trim_end(), "red");
    }

    #[test]
    fn test_line_wrap_and_scroll() {
        let mut parser = parser(2, 5);
        parser.feed(b"abcdefgh");
        assert_eq!(parser.grid().line_text(0), "abcde");
        assert_eq!(parser.grid().line_text(1).trim_end(), "fgh");
        // Another full line scrolls the first off.
        parser.feed(b"ij\r\nnew");
        assert_eq!(parser.grid().line_text(0).trim_end(), "fghij");
        assert_eq!(parser.grid().line_text(1).trim_end(), "new");
    }

    #[test]
    fn test_cursor_visibility_modes() {
        let mut parser = parser(2, 10);
        assert!(parser.grid().cursor().visible);
        parser.feed(b"\x1b[?25l");
        assert!(!parser.grid().cursor().visible);
        parser.feed(b"\x1b[?25h");
        assert!(parser.grid().cursor().visible);
    }

    #[test]
    fn test_alternate_screen_clears() {
        let mut parser = parser(2, 10);
        parser.feed(b"shell\x1b[?1049h");
        assert_eq!(parser.grid().to_plain_text(), "\n");
        parser.feed(b"tui\x1b[?1049l");
        assert_eq!(parser.grid().to_plain_text(), "\n");
    }

    #[test]
    fn test_delete_chars_shifts_line() {
        let mut parser = parser(1, 10);
        parser.feed(b"abcdef\x1b[1G\x1b[2P");
        assert_eq!(parser.grid().line_text(0).trim_end(), "cdef");
    }

    #[test]
    fn test_insert_lines_within_region() {
        let mut parser = parser(4, 10);
        parser.feed(b"aa\r\nbb\r\ncc\x1b[2;1H\x1b[1L");
        assert_eq!(parser.grid().line_text(0).trim_end(), "aa");
        assert_eq!(parser.grid().line_text(1).trim_end(), "");
        assert_eq!(parser.grid().line_text(2).trim_end(), "bb");
        assert_eq!(parser.grid().line_text(3).trim_end(), "cc");
    }

    #[test]
    fn test_scroll_region_linefeed() {
        let mut parser = parser(4, 10);
        parser.feed(b"top\x1b[2;3r\x1b[3;1Hmid\r\nnext");
        // Row 0 is outside the region and survives the scroll.
        assert_eq!(parser.grid().line_text(0).trim_end(), "top");
        assert_eq!(parser.grid().line_text(1).trim_end(), "mid");
        assert_eq!(parser.grid().line_text(2).trim_end(), "next");
    }

    #[test]
    fn test_wide_glyphs() {
        let mut parser = parser(1, 10);
        parser.feed("日本".as_bytes());
        assert_eq!(parser.grid().cursor().position.col, 4);
        assert_eq!(parser.grid().line_text(0).trim_end(), "日本");
        let total: u16 = parser.grid().spans(0).iter().map(|s| s.width).sum();
        assert_eq!(total, 10);
    }

    #[test]
    fn test_echoed_mouse_report_is_ignored() {
        let mut parser = parser(3, 20);
        parser.feed(b"one\r\ntwo\r\n\x1b[<0;6;4M\x1b[<0;6;4m");
        assert_eq!(parser.grid().line_text(0).trim_end(), "one");
        assert_eq!(parser.grid().line_text(1).trim_end(), "two");
    }

    #[test]
    fn test_garbage_bytes_do_not_panic() {
        let mut parser = parser(5, 20);
        parser.feed(&[0xff, 0xfe, 0x1b, 0x5b, 0xff, b'm', 0x00, 0x07]);
        parser.feed(b"\x1b]0;title\x07still fine");
        assert!(parser.grid().to_plain_text().contains("still fine"));
    }
}

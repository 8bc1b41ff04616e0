//! Cell, color, and span types for the terminal grid.

use serde::{Deserialize, Serialize};

/// Terminal color as resolved by the emulator.
///
/// Indexed palette entries render as their decimal number (`"4"`) and
/// 24-bit colors as a lowercase hex string (`"#ff8800"`). The two forms
/// are never normalized into each other, so a style filter on `"#ff0000"`
/// does not match an indexed red.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    /// Default terminal color
    Default,
    /// 256-color palette index; the 16 classic ANSI colors map to 0-15
    Indexed(u8),
    /// True color RGB (24-bit)
    Rgb {
        /// Red component
        r: u8,
        /// Green component
        g: u8,
        /// Blue component
        b: u8,
    },
}

impl Color {
    /// Render the color the way style filters compare it: indexed entries
    /// as their decimal number, RGB as lowercase `#rrggbb`. The default
    /// color has no rendering.
    pub fn render(&self) -> Option<String> {
        match self {
            Color::Default => None,
            Color::Indexed(n) => Some(n.to_string()),
            Color::Rgb { r, g, b } => Some(format!("#{r:02x}{g:02x}{b:02x}")),
        }
    }
}

/// Text attributes for a terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CellAttributes {
    /// Bold/bright text
    pub bold: bool,
    /// Dimmed text
    pub dim: bool,
    /// Italic text
    pub italic: bool,
    /// Underlined text
    pub underline: bool,
    /// Blinking text
    pub blink: bool,
    /// Reverse video (swap fg/bg)
    pub reverse: bool,
    /// Hidden text
    pub hidden: bool,
    /// Strikethrough text
    pub strikethrough: bool,
}

impl CellAttributes {
    /// Check if attributes are all default (no formatting).
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Create attributes with bold enabled.
    pub fn with_bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Create attributes with italic enabled.
    pub fn with_italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Create attributes with underline enabled.
    pub fn with_underline(mut self) -> Self {
        self.underline = true;
        self
    }
}

/// Single character cell in the terminal grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Unicode glyph (space if empty)
    pub character: char,
    /// Columns the glyph occupies: 1 for ordinary glyphs, 2 for wide
    /// glyphs, 0 for the spacer cell following a wide glyph
    pub width: u8,
    /// Foreground color
    pub fg: Color,
    /// Background color
    pub bg: Color,
    /// Text attributes
    pub attrs: CellAttributes,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            character: ' ',
            width: 1,
            fg: Color::Default,
            bg: Color::Default,
            attrs: CellAttributes::default(),
        }
    }
}

impl Cell {
    /// Create a new width-1 cell with a character and default styling.
    pub fn new(character: char) -> Self {
        Self {
            character,
            ..Default::default()
        }
    }

    /// Check if this is the spacer cell after a wide glyph.
    pub fn is_spacer(&self) -> bool {
        self.width == 0
    }
}

/// A run of adjacent cells on one line sharing identical style.
///
/// The widths of a line's spans sum to the grid's column count; a span's
/// text may hold fewer characters than its width when it contains wide
/// glyphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// The glyphs of the run, in order.
    pub text: String,
    /// Columns the run occupies.
    pub width: u16,
    /// Foreground color of every cell in the run.
    pub fg: Color,
    /// Background color of every cell in the run.
    pub bg: Color,
    /// Attributes of every cell in the run.
    pub attrs: CellAttributes,
}

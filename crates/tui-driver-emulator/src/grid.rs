//! Terminal grid state buffer and cursor tracking.

use serde::Serialize;
use unicode_width::UnicodeWidthChar;

use tui_driver_core::{Cell, CellAttributes, Color, Dimensions, Position, Span};

/// Cursor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cursor {
    /// Current position
    pub position: Position,
    /// Visibility
    pub visible: bool,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            position: Position::origin(),
            visible: true,
        }
    }
}

/// A styled copy of the grid at one instant: per-line spans plus cursor
/// state, consumed by the projector and the matcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenSnapshot {
    /// One entry per grid row, top to bottom; span widths sum to the
    /// column count.
    pub lines: Vec<Vec<Span>>,
    /// Cursor state at snapshot time.
    pub cursor: Cursor,
    /// Grid dimensions at snapshot time.
    pub dimensions: Dimensions,
}

/// Terminal grid state buffer.
///
/// Owns the cell matrix the parser paints into. Wide glyphs occupy a
/// width-2 cell followed by a width-0 spacer cell so that cell widths on
/// every row sum to the column count.
#[derive(Debug)]
pub struct Grid {
    /// Cell storage (row-major order)
    cells: Vec<Cell>,
    /// Grid dimensions
    dimensions: Dimensions,
    /// Cursor state
    cursor: Cursor,
    /// Saved cursor (for save/restore operations)
    saved_cursor: Option<Cursor>,
    /// Scroll region (top, bottom), 0-indexed inclusive; None = full screen
    scroll_region: Option<(u16, u16)>,
    /// Wrap is deferred until the next printed glyph
    pending_wrap: bool,
    /// Current cell attributes for new characters
    current_attrs: CellAttributes,
    /// Current foreground color
    current_fg: Color,
    /// Current background color
    current_bg: Color,
}

impl Grid {
    /// Create a new grid with the given dimensions, all cells empty.
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            cells: vec![Cell::default(); dimensions.cell_count()],
            dimensions,
            cursor: Cursor::default(),
            saved_cursor: None,
            scroll_region: None,
            pending_wrap: false,
            current_attrs: CellAttributes::default(),
            current_fg: Color::Default,
            current_bg: Color::Default,
        }
    }

    /// Get cell at position. Returns None if out of bounds.
    pub fn cell(&self, row: u16, col: u16) -> Option<&Cell> {
        if row < self.dimensions.rows && col < self.dimensions.cols {
            let idx = row as usize * self.dimensions.cols as usize + col as usize;
            self.cells.get(idx)
        } else {
            None
        }
    }

    /// Get mutable cell at position. Returns None if out of bounds.
    pub fn cell_mut(&mut self, row: u16, col: u16) -> Option<&mut Cell> {
        if row < self.dimensions.rows && col < self.dimensions.cols {
            let idx = row as usize * self.dimensions.cols as usize + col as usize;
            self.cells.get_mut(idx)
        } else {
            None
        }
    }

    /// Get an entire row as a slice. Returns None if out of bounds.
    pub fn row(&self, row: u16) -> Option<&[Cell]> {
        if row < self.dimensions.rows {
            let start = row as usize * self.dimensions.cols as usize;
            let end = start + self.dimensions.cols as usize;
            Some(&self.cells[start..end])
        } else {
            None
        }
    }

    /// Get dimensions.
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Get cursor reference.
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Get mutable cursor reference.
    pub fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }

    /// Get current cell attributes.
    pub fn current_attrs(&self) -> &CellAttributes {
        &self.current_attrs
    }

    /// Set current cell attributes.
    pub fn set_current_attrs(&mut self, attrs: CellAttributes) {
        self.current_attrs = attrs;
    }

    /// Get current foreground color.
    pub fn current_fg(&self) -> Color {
        self.current_fg
    }

    /// Set current foreground color.
    pub fn set_current_fg(&mut self, color: Color) {
        self.current_fg = color;
    }

    /// Get current background color.
    pub fn current_bg(&self) -> Color {
        self.current_bg
    }

    /// Set current background color.
    pub fn set_current_bg(&mut self, color: Color) {
        self.current_bg = color;
    }

    /// Save current cursor state.
    pub fn save_cursor(&mut self) {
        self.saved_cursor = Some(self.cursor);
    }

    /// Restore saved cursor state.
    pub fn restore_cursor(&mut self) {
        if let Some(saved) = self.saved_cursor.take() {
            self.cursor = saved;
        }
        self.pending_wrap = false;
    }

    /// Move the cursor, clamping to the grid and clearing deferred wrap.
    pub fn move_cursor(&mut self, row: u16, col: u16) {
        self.cursor.position.row = row.min(self.dimensions.rows.saturating_sub(1));
        self.cursor.position.col = col.min(self.dimensions.cols.saturating_sub(1));
        self.pending_wrap = false;
    }

    /// Set the scroll region (0-indexed, inclusive). Out-of-order or
    /// out-of-range bounds reset to full screen.
    pub fn set_scroll_region(&mut self, top: u16, bottom: u16) {
        if top < bottom && bottom < self.dimensions.rows {
            self.scroll_region = Some((top, bottom));
        } else {
            self.scroll_region = None;
        }
    }

    fn scroll_bounds(&self) -> (u16, u16) {
        self.scroll_region
            .unwrap_or((0, self.dimensions.rows.saturating_sub(1)))
    }

    /// Print a glyph at the cursor with the current style, handling wide
    /// glyphs and deferred wrap.
    pub fn put_char(&mut self, c: char) {
        let width = match c.width() {
            Some(w) if w > 0 => (w as u16).min(2),
            _ => return, // zero-width and control glyphs leave no cell
        };
        let dims = self.dimensions;
        if dims.cols == 0 || dims.rows == 0 {
            return;
        }

        if self.pending_wrap || self.cursor.position.col + width > dims.cols {
            self.pending_wrap = false;
            self.cursor.position.col = 0;
            self.advance_line();
        }

        let Position { row, col } = self.cursor.position;
        let (attrs, fg, bg) = (self.current_attrs, self.current_fg, self.current_bg);

        self.repair_wide_pair(row, col);
        if width == 2 {
            self.repair_wide_pair(row, col + 1);
        }

        if let Some(cell) = self.cell_mut(row, col) {
            *cell = Cell {
                character: c,
                width: width as u8,
                fg,
                bg,
                attrs,
            };
        }
        if width == 2 {
            if let Some(spacer) = self.cell_mut(row, col + 1) {
                *spacer = Cell {
                    character: ' ',
                    width: 0,
                    fg,
                    bg,
                    attrs,
                };
            }
        }

        let end = col + width;
        self.cursor.position.col = end.min(dims.cols - 1);
        self.pending_wrap = end >= dims.cols;
    }

    /// Overwriting half of a wide glyph blanks its partner cell.
    fn repair_wide_pair(&mut self, row: u16, col: u16) {
        let target_width = match self.cell(row, col) {
            Some(cell) => cell.width,
            None => return,
        };
        match target_width {
            2 => {
                if let Some(spacer) = self.cell_mut(row, col + 1) {
                    if spacer.is_spacer() {
                        *spacer = Cell::default();
                    }
                }
            }
            0 => {
                if col > 0 {
                    if let Some(wide) = self.cell_mut(row, col - 1) {
                        if wide.width == 2 {
                            *wide = Cell::default();
                        }
                    }
                }
            }
            _ => {}
        }
    }

    /// Line feed: move down one row, scrolling at the bottom of the
    /// scroll region.
    pub fn linefeed(&mut self) {
        self.pending_wrap = false;
        self.advance_line();
    }

    fn advance_line(&mut self) {
        let (_, bottom) = self.scroll_bounds();
        if self.cursor.position.row == bottom {
            self.scroll_up(1);
        } else if self.cursor.position.row + 1 < self.dimensions.rows {
            self.cursor.position.row += 1;
        }
    }

    /// Reverse line feed: move up one row, scrolling at the top of the
    /// scroll region.
    pub fn reverse_linefeed(&mut self) {
        self.pending_wrap = false;
        let (top, _) = self.scroll_bounds();
        if self.cursor.position.row == top {
            self.scroll_down(1);
        } else {
            self.cursor.position.row = self.cursor.position.row.saturating_sub(1);
        }
    }

    /// Scroll the scroll region up by `n` lines; vacated lines are blank.
    pub fn scroll_up(&mut self, n: u16) {
        let (top, bottom) = self.scroll_bounds();
        let height = bottom - top + 1;
        let n = n.min(height);
        for row in top..=bottom {
            if row + n <= bottom {
                self.copy_row(row + n, row);
            } else {
                self.clear_row(row);
            }
        }
    }

    /// Scroll the scroll region down by `n` lines; vacated lines are blank.
    pub fn scroll_down(&mut self, n: u16) {
        let (top, bottom) = self.scroll_bounds();
        let height = bottom - top + 1;
        let n = n.min(height);
        for row in (top..=bottom).rev() {
            if row >= top + n {
                self.copy_row(row - n, row);
            } else {
                self.clear_row(row);
            }
        }
    }

    /// Insert `n` blank lines at `row`, shifting lines below it toward the
    /// bottom of the scroll region.
    pub fn insert_lines(&mut self, at: u16, n: u16) {
        let (top, bottom) = self.scroll_bounds();
        if at < top || at > bottom || n == 0 {
            return;
        }
        for row in (at..=bottom).rev() {
            if row >= at + n {
                self.copy_row(row - n, row);
            } else {
                self.clear_row(row);
            }
        }
    }

    /// Delete `n` lines at `row`, pulling lines below it up and blanking
    /// the bottom of the scroll region.
    pub fn delete_lines(&mut self, at: u16, n: u16) {
        let (top, bottom) = self.scroll_bounds();
        if at < top || at > bottom || n == 0 {
            return;
        }
        for row in at..=bottom {
            if row + n <= bottom {
                self.copy_row(row + n, row);
            } else {
                self.clear_row(row);
            }
        }
    }

    /// Insert `n` blank cells at (row, col), shifting the rest of the line
    /// right; cells pushed past the edge are lost.
    pub fn insert_chars(&mut self, row: u16, col: u16, n: u16) {
        let cols = self.dimensions.cols;
        if row >= self.dimensions.rows || col >= cols || n == 0 {
            return;
        }
        for target in ((col + n)..cols).rev() {
            let src = target - n;
            if let Some(cell) = self.cell(row, src).cloned() {
                if let Some(dst) = self.cell_mut(row, target) {
                    *dst = cell;
                }
            }
        }
        for blank in col..(col + n).min(cols) {
            if let Some(cell) = self.cell_mut(row, blank) {
                *cell = Cell::default();
            }
        }
    }

    /// Delete `n` cells at (row, col), shifting the rest of the line left
    /// and blanking the tail.
    pub fn delete_chars(&mut self, row: u16, col: u16, n: u16) {
        let cols = self.dimensions.cols;
        if row >= self.dimensions.rows || col >= cols || n == 0 {
            return;
        }
        for target in col..cols {
            let src = target + n;
            let replacement = if src < cols {
                self.cell(row, src).cloned().unwrap_or_default()
            } else {
                Cell::default()
            };
            if let Some(dst) = self.cell_mut(row, target) {
                *dst = replacement;
            }
        }
    }

    /// Erase `n` cells at (row, col) in place, without shifting.
    pub fn erase_chars(&mut self, row: u16, col: u16, n: u16) {
        for c in col..(col + n).min(self.dimensions.cols) {
            if let Some(cell) = self.cell_mut(row, c) {
                *cell = Cell::default();
            }
        }
    }

    fn copy_row(&mut self, src: u16, dst: u16) {
        let cols = self.dimensions.cols as usize;
        let src_start = src as usize * cols;
        let dst_start = dst as usize * cols;
        for i in 0..cols {
            self.cells[dst_start + i] = self.cells[src_start + i].clone();
        }
    }

    /// Clear an entire row to default cells.
    pub fn clear_row(&mut self, row: u16) {
        for col in 0..self.dimensions.cols {
            if let Some(cell) = self.cell_mut(row, col) {
                *cell = Cell::default();
            }
        }
    }

    /// Clear the entire grid.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            *cell = Cell::default();
        }
    }

    /// Resize the grid, preserving content from the top-left corner up to
    /// the smaller of old and new dimensions. Cursor is clamped; the
    /// scroll region resets to full screen.
    pub fn resize(&mut self, new_dimensions: Dimensions) {
        let mut new_cells = vec![Cell::default(); new_dimensions.cell_count()];

        let copy_rows = self.dimensions.rows.min(new_dimensions.rows);
        let copy_cols = self.dimensions.cols.min(new_dimensions.cols);

        for row in 0..copy_rows {
            for col in 0..copy_cols {
                let old_idx = row as usize * self.dimensions.cols as usize + col as usize;
                let new_idx = row as usize * new_dimensions.cols as usize + col as usize;
                new_cells[new_idx] = self.cells[old_idx].clone();
            }
        }

        self.cells = new_cells;
        self.dimensions = new_dimensions;
        self.scroll_region = None;
        self.pending_wrap = false;

        self.cursor.position.row = self
            .cursor
            .position
            .row
            .min(new_dimensions.rows.saturating_sub(1));
        self.cursor.position.col = self
            .cursor
            .position
            .col
            .min(new_dimensions.cols.saturating_sub(1));
    }

    /// Group a row's cells into spans of identical style. Spacer cells
    /// fold into the wide glyph before them, so span widths sum to the
    /// column count.
    pub fn spans(&self, row: u16) -> Vec<Span> {
        let mut spans: Vec<Span> = Vec::new();
        let Some(cells) = self.row(row) else {
            return spans;
        };
        for cell in cells {
            if cell.is_spacer() {
                continue;
            }
            match spans.last_mut() {
                Some(span)
                    if span.fg == cell.fg && span.bg == cell.bg && span.attrs == cell.attrs =>
                {
                    span.text.push(cell.character);
                    span.width += cell.width as u16;
                }
                _ => spans.push(Span {
                    text: cell.character.to_string(),
                    width: cell.width as u16,
                    fg: cell.fg,
                    bg: cell.bg,
                    attrs: cell.attrs,
                }),
            }
        }
        spans
    }

    /// Take a styled snapshot of the whole grid.
    pub fn snapshot(&self) -> ScreenSnapshot {
        ScreenSnapshot {
            lines: (0..self.dimensions.rows).map(|r| self.spans(r)).collect(),
            cursor: self.cursor,
            dimensions: self.dimensions,
        }
    }

    /// A row's glyphs as a string (spacer cells skipped, no trimming).
    pub fn line_text(&self, row: u16) -> String {
        self.row(row)
            .map(|cells| {
                cells
                    .iter()
                    .filter(|c| !c.is_spacer())
                    .map(|c| c.character)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Convert the entire grid to plain text, one line per row with
    /// trailing whitespace trimmed.
    pub fn to_plain_text(&self) -> String {
        (0..self.dimensions.rows)
            .map(|r| self.line_text(r).trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

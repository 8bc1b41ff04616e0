//! Grid-to-text projection.
//!
//! Turns a styled screen snapshot into the newline-joined string the
//! assertion surface works with. Pure functions over snapshot data; the
//! PTY and idle tracker are never touched here.

use tui_driver_core::TextOptions;
use tui_driver_emulator::ScreenSnapshot;

/// Marker overlaid on the cursor cell when `show_cursor` is set.
const CURSOR_MARKER: char = '▮';

/// Project a snapshot into assertion-ready text.
///
/// Lines are walked top to bottom; spans failing the `only` filter are
/// replaced by spaces of the same width so horizontal layout survives
/// filtering. Each line is right-trimmed, `trim_end` drops trailing empty
/// lines, and the result always starts with a newline so it diffs cleanly
/// against indented literal blocks.
pub fn project(snapshot: &ScreenSnapshot, options: &TextOptions) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(snapshot.lines.len());

    for (row, spans) in snapshot.lines.iter().enumerate() {
        let mut line = String::with_capacity(snapshot.dimensions.cols as usize);
        for span in spans {
            let keep = options.only.as_ref().map_or(true, |f| f.matches(span));
            if keep {
                line.push_str(&span.text);
            } else {
                for _ in 0..span.width {
                    line.push(' ');
                }
            }
        }

        if options.show_cursor
            && snapshot.cursor.visible
            && snapshot.cursor.position.row as usize == row
        {
            line = overlay_cursor(&line, snapshot.cursor.position.col as usize);
        }

        let trimmed = line.trim_end();
        line.truncate(trimmed.len());
        lines.push(line);
    }

    if options.trim_end {
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
    }

    format!("\n{}", lines.join("\n"))
}

/// Project each line at full width with no filtering and no trimming,
/// for the pattern matcher.
pub fn raw_lines(snapshot: &ScreenSnapshot) -> Vec<String> {
    snapshot
        .lines
        .iter()
        .map(|spans| {
            let mut line = String::with_capacity(snapshot.dimensions.cols as usize);
            for span in spans {
                line.push_str(&span.text);
            }
            line
        })
        .collect()
}

fn overlay_cursor(line: &str, col: usize) -> String {
    let mut chars: Vec<char> = line.chars().collect();
    while chars.len() <= col {
        chars.push(' ');
    }
    chars[col] = CURSOR_MARKER;
    chars.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tui_driver_core::{CellAttributes, Color, Dimensions, Position, Span, StyleFilter};
    use tui_driver_emulator::Cursor;

    fn plain_span(text: &str) -> Span {
        Span {
            text: text.to_string(),
            width: text.chars().count() as u16,
            fg: Color::Default,
            bg: Color::Default,
            attrs: CellAttributes::default(),
        }
    }

    fn styled_span(text: &str, fg: Color, attrs: CellAttributes) -> Span {
        Span {
            attrs,
            fg,
            ..plain_span(text)
        }
    }

    fn snapshot(lines: Vec<Vec<Span>>) -> ScreenSnapshot {
        let cols = lines
            .first()
            .map(|spans| spans.iter().map(|s| s.width).sum())
            .unwrap_or(0);
        ScreenSnapshot {
            dimensions: Dimensions::new(lines.len() as u16, cols),
            cursor: Cursor {
                position: Position::origin(),
                visible: true,
            },
            lines,
        }
    }

    #[test]
    fn test_project_starts_with_newline() {
        let snap = snapshot(vec![vec![plain_span("hello     ")]]);
        let text = project(&snap, &TextOptions::new());
        assert_eq!(text, "\nhello");
    }

    #[test]
    fn test_project_right_trims_lines() {
        let snap = snapshot(vec![
            vec![plain_span("one       ")],
            vec![plain_span("   two    ")],
        ]);
        let text = project(&snap, &TextOptions::new());
        assert_eq!(text, "\none\n   two");
    }

    #[test]
    fn test_project_trim_end_drops_trailing_empty_lines() {
        let snap = snapshot(vec![
            vec![plain_span("content   ")],
            vec![plain_span("          ")],
            vec![plain_span("          ")],
        ]);
        assert_eq!(
            project(&snap, &TextOptions::new()),
            "\ncontent\n\n"
        );
        assert_eq!(
            project(&snap, &TextOptions::new().trim_end()),
            "\ncontent"
        );
    }

    #[test]
    fn test_project_filter_preserves_layout() {
        let bold = CellAttributes::default().with_bold();
        let snap = snapshot(vec![vec![
            plain_span("dim "),
            styled_span("BOLD", Color::Default, bold),
            plain_span(" tail"),
        ]]);

        let text = project(&snap, &TextOptions::new().only(StyleFilter::new().bold(true)));
        assert_eq!(text, "\n    BOLD");

        let text = project(
            &snap,
            &TextOptions::new().only(StyleFilter::new().bold(false)),
        );
        assert_eq!(text, "\ndim       tail");
    }

    #[test]
    fn test_project_filter_by_color() {
        let red = Color::Rgb { r: 255, g: 0, b: 0 };
        let snap = snapshot(vec![vec![
            styled_span("err", red, CellAttributes::default()),
            plain_span(" rest  "),
        ]]);

        let text = project(
            &snap,
            &TextOptions::new().only(StyleFilter::new().foreground("#ff0000")),
        );
        assert_eq!(text, "\nerr");

        // Indexed red does not match the RGB rendering.
        let text = project(
            &snap,
            &TextOptions::new().only(StyleFilter::new().foreground("1")),
        );
        assert_eq!(text, "\n");
    }

    #[test]
    fn test_project_idempotent_over_fixed_snapshot() {
        let snap = snapshot(vec![vec![plain_span("stable    ")]]);
        let options = TextOptions::new().trim_end();
        assert_eq!(project(&snap, &options), project(&snap, &options));
    }

    #[test]
    fn test_project_show_cursor_overlay() {
        let mut snap = snapshot(vec![vec![plain_span("ab        ")]]);
        snap.cursor.position = Position::new(0, 2);

        let text = project(&snap, &TextOptions::new().show_cursor());
        assert_eq!(text, "\nab▮");

        // An invisible cursor draws nothing.
        snap.cursor.visible = false;
        let text = project(&snap, &TextOptions::new().show_cursor());
        assert_eq!(text, "\nab");
    }

    #[test]
    fn test_raw_lines_keep_trailing_whitespace() {
        let snap = snapshot(vec![
            vec![plain_span("one       ")],
            vec![plain_span("          ")],
        ]);
        let lines = raw_lines(&snap);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "one       ");
        assert_eq!(lines[1], "          ");
    }

    proptest! {
        /// Filtered projections never place surviving glyphs at different
        /// columns than the unfiltered projection.
        #[test]
        fn prop_filter_preserves_columns(
            head in "[a-z]{0,6}",
            styled in "[A-Z]{1,6}",
            tail in "[a-z]{0,6}",
        ) {
            let bold = CellAttributes::default().with_bold();
            let snap = snapshot(vec![vec![
                plain_span(&head),
                styled_span(&styled, Color::Default, bold),
                plain_span(&tail),
            ]]);

            let unfiltered = project(&snap, &TextOptions::new());
            let filtered = project(
                &snap,
                &TextOptions::new().only(StyleFilter::new().bold(true)),
            );

            let expected_start = 1 + head.chars().count(); // leading newline
            let got = &filtered[expected_start..expected_start + styled.len()];
            prop_assert_eq!(got, styled.as_str());
            prop_assert!(unfiltered.len() >= filtered.len());
        }
    }
}

//! Pattern search over projected grid lines.

use serde::Serialize;

use tui_driver_core::Pattern;

/// One pattern occurrence on the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    /// Grid row of the match (0-based).
    pub row: u16,
    /// Character index of the match start within the raw line (0-based).
    pub col: u16,
    /// The matched text.
    pub text: String,
}

/// Find every occurrence of `pattern` on the raw per-line view of the
/// grid, in line-major order.
///
/// Literals match as plain substrings; regexes are applied per line and
/// always yield all non-overlapping matches on a line, so matches never
/// cross line boundaries.
pub fn find_matches(lines: &[String], pattern: &Pattern) -> Vec<Match> {
    let mut matches = Vec::new();
    for (row, line) in lines.iter().enumerate() {
        match pattern {
            Pattern::Literal(needle) => {
                if needle.is_empty() {
                    continue;
                }
                for (start, text) in line.match_indices(needle.as_str()) {
                    matches.push(Match {
                        row: row as u16,
                        col: char_col(line, start),
                        text: text.to_string(),
                    });
                }
            }
            Pattern::Regex(regex) => {
                for m in regex.find_iter(line) {
                    matches.push(Match {
                        row: row as u16,
                        col: char_col(line, m.start()),
                        text: m.as_str().to_string(),
                    });
                }
            }
        }
    }
    matches
}

/// Translate a byte offset into a character column.
fn char_col(line: &str, byte_offset: usize) -> u16 {
    line[..byte_offset].chars().count() as u16
}

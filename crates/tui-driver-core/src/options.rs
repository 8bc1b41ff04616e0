//! Launch and projection options.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cell::Span;

/// Options for launching a child command under a PTY.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchOptions {
    /// Program to execute.
    pub command: String,
    /// Arguments, in order.
    pub args: Vec<String>,
    /// Terminal width in columns.
    pub cols: u16,
    /// Terminal height in rows.
    pub rows: u16,
    /// Working directory; the parent's is inherited when absent.
    pub cwd: Option<PathBuf>,
    /// Extra environment entries, merged over the inherited environment.
    /// `TERM=xterm-truecolor` and `COLORTERM=truecolor` are forced on top.
    pub env: Vec<(String, String)>,
}

impl LaunchOptions {
    /// Create options for the given command with an 80x24 terminal.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            cols: 80,
            rows: 24,
            cwd: None,
            env: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set the terminal size.
    pub fn size(mut self, cols: u16, rows: u16) -> Self {
        self.cols = cols;
        self.rows = rows;
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Add an environment entry.
    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((name.into(), value.into()));
        self
    }
}

/// Style predicates applied per span by the projector; spans that fail
/// any present predicate are blanked to spaces of the same width.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleFilter {
    /// Require (or forbid) bold.
    pub bold: Option<bool>,
    /// Require (or forbid) italic.
    pub italic: Option<bool>,
    /// Require (or forbid) underline.
    pub underline: Option<bool>,
    /// Require an exact foreground rendering (`"1"`, `"#ff0000"`).
    pub foreground: Option<String>,
    /// Require an exact background rendering.
    pub background: Option<String>,
}

impl StyleFilter {
    /// Create an empty filter (matches every span).
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the given bold state.
    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = Some(bold);
        self
    }

    /// Require the given italic state.
    pub fn italic(mut self, italic: bool) -> Self {
        self.italic = Some(italic);
        self
    }

    /// Require the given underline state.
    pub fn underline(mut self, underline: bool) -> Self {
        self.underline = Some(underline);
        self
    }

    /// Require an exact foreground color rendering.
    pub fn foreground(mut self, color: impl Into<String>) -> Self {
        self.foreground = Some(color.into());
        self
    }

    /// Require an exact background color rendering.
    pub fn background(mut self, color: impl Into<String>) -> Self {
        self.background = Some(color.into());
        self
    }

    /// Check whether a span satisfies every present predicate.
    ///
    /// Color comparison is exact string equality on the rendered form;
    /// indexed and RGB renderings never match each other.
    pub fn matches(&self, span: &Span) -> bool {
        if let Some(bold) = self.bold {
            if span.attrs.bold != bold {
                return false;
            }
        }
        if let Some(italic) = self.italic {
            if span.attrs.italic != italic {
                return false;
            }
        }
        if let Some(underline) = self.underline {
            if span.attrs.underline != underline {
                return false;
            }
        }
        if let Some(fg) = &self.foreground {
            if span.fg.render().as_deref() != Some(fg.as_str()) {
                return false;
            }
        }
        if let Some(bg) = &self.background {
            if span.bg.render().as_deref() != Some(bg.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Predicate over projected text, used by `text` polling.
pub type TextPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Options controlling screen projection and the `text` wait loop.
#[derive(Clone, Default)]
pub struct TextOptions {
    /// Style filter; non-matching spans are blanked to spaces.
    pub only: Option<StyleFilter>,
    /// Predicate the projection must satisfy before `text` returns.
    /// Default: trimmed text is non-empty.
    pub wait_for: Option<TextPredicate>,
    /// Overall timeout for the `text` wait loop; default 1000 ms.
    pub timeout: Option<Duration>,
    /// Drop trailing all-empty lines.
    pub trim_end: bool,
    /// Skip the quiescence wait and project immediately.
    pub immediate: bool,
    /// Overlay a marker on the cursor cell when the cursor is visible.
    pub show_cursor: bool,
}

impl TextOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the style filter.
    pub fn only(mut self, filter: StyleFilter) -> Self {
        self.only = Some(filter);
        self
    }

    /// Set the wait predicate.
    pub fn wait_for(mut self, predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.wait_for = Some(Arc::new(predicate));
        self
    }

    /// Set the overall timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Drop trailing all-empty lines from the projection.
    pub fn trim_end(mut self) -> Self {
        self.trim_end = true;
        self
    }

    /// Project immediately, skipping the quiescence wait.
    pub fn immediate(mut self) -> Self {
        self.immediate = true;
        self
    }

    /// Overlay a marker on the cursor cell.
    pub fn show_cursor(mut self) -> Self {
        self.show_cursor = true;
        self
    }
}

impl fmt::Debug for TextOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextOptions")
            .field("only", &self.only)
            .field("wait_for", &self.wait_for.as_ref().map(|_| "<predicate>"))
            .field("timeout", &self.timeout)
            .field("trim_end", &self.trim_end)
            .field("immediate", &self.immediate)
            .field("show_cursor", &self.show_cursor)
            .finish()
    }
}

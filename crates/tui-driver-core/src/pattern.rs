//! String-or-regex pattern values.

use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::{Error, Result};

/// A search pattern: either a literal substring or a regular expression.
///
/// [`Pattern::parse`] recognizes the `/body/flags` convention used by the
/// text front-ends and builds the regex variant; any other input is taken
/// as a literal. Literals match as plain substrings with no anchoring and
/// no metacharacter interpretation.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// A literal substring.
    Literal(String),
    /// A compiled regular expression, applied per line by the matcher.
    Regex(Regex),
}

impl Pattern {
    /// Parse a pattern string.
    ///
    /// `/body/flags` becomes [`Pattern::Regex`] when `flags` is a valid
    /// flag set (`i`, `m`, `s`, `x` map to regex options; `g`, `u`, `y`
    /// are accepted and ignored since matching is always global and
    /// Unicode-aware). Anything else becomes [`Pattern::Literal`].
    pub fn parse(input: &str) -> Result<Self> {
        if let Some(rest) = input.strip_prefix('/') {
            if let Some(slash) = rest.rfind('/') {
                let body = &rest[..slash];
                let flags = &rest[slash + 1..];
                if flags
                    .chars()
                    .all(|c| matches!(c, 'i' | 'm' | 's' | 'x' | 'g' | 'u' | 'y'))
                {
                    let regex = RegexBuilder::new(body)
                        .case_insensitive(flags.contains('i'))
                        .multi_line(flags.contains('m'))
                        .dot_matches_new_line(flags.contains('s'))
                        .ignore_whitespace(flags.contains('x'))
                        .build()
                        .map_err(|e| Error::Pattern(e.to_string()))?;
                    return Ok(Pattern::Regex(regex));
                }
            }
        }
        Ok(Pattern::Literal(input.to_string()))
    }

    /// Check whether the pattern matches anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Pattern::Literal(needle) => text.contains(needle.as_str()),
            Pattern::Regex(regex) => regex.is_match(text),
        }
    }
}

impl From<&str> for Pattern {
    fn from(s: &str) -> Self {
        Pattern::Literal(s.to_string())
    }
}

impl From<String> for Pattern {
    fn from(s: String) -> Self {
        Pattern::Literal(s)
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        Pattern::Regex(regex)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Literal(s) => write!(f, "{s:?}"),
            Pattern::Regex(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

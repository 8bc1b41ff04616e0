//! Error types for the tui-driver toolkit.

use thiserror::Error;

/// Main error type for driver operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A key chord contained names outside the key enumeration.
    #[error(
        "unknown key(s) {keys:?}; valid keys are: {}, or any single printable character",
        .valid.join(", ")
    )]
    InvalidKey {
        /// The offending names, in input order.
        keys: Vec<String>,
        /// The recognized key names, sorted.
        valid: Vec<String>,
    },

    /// A bounded wait expired without its condition being met.
    #[error(
        "{operation} timed out after {timeout_ms}ms{}",
        .screen.as_deref().map(|s| format!("; current screen:{s}")).unwrap_or_default()
    )]
    Timeout {
        /// Name of the operation that timed out.
        operation: &'static str,
        /// The configured timeout in milliseconds.
        timeout_ms: u64,
        /// The projected screen content at expiry, when available.
        screen: Option<String>,
    },

    /// `click` located more than one match without `first` being set.
    #[error("click({pattern}): found {count} matches; pass first or use a more specific pattern")]
    AmbiguousClick {
        /// The pattern that matched multiple times.
        pattern: String,
        /// How many matches were found.
        count: usize,
    },

    /// `click` timed out without locating its pattern.
    #[error("click({pattern}): pattern not found")]
    ClickNotFound {
        /// The pattern that never matched.
        pattern: String,
    },

    /// An operation was invoked after `close`.
    #[error("session is closed")]
    ClosedSession,

    /// Spawning the child or initializing the emulator failed.
    #[error("launch failed: {0}")]
    Launch(String),

    /// A PTY write failed (e.g. the child closed its end).
    #[error("PTY write failed: {0}")]
    Write(String),

    /// A regex pattern failed to compile.
    #[error("invalid pattern: {0}")]
    Pattern(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_key_error() {
        let err = Error::InvalidKey {
            keys: vec!["bogus".to_string()],
            valid: vec!["enter".to_string(), "tab".to_string()],
        };
        let display = err.to_string();
        assert!(display.contains("bogus"));
        assert!(display.contains("enter, tab"));
        assert!(display.contains("single printable character"));
    }

    #[test]
    fn test_timeout_error_without_screen() {
        let err = Error::Timeout {
            operation: "wait_for_data",
            timeout_ms: 5000,
            screen: None,
        };
        assert_eq!(err.to_string(), "wait_for_data timed out after 5000ms");
    }

    #[test]
    fn test_timeout_error_with_screen() {
        let err = Error::Timeout {
            operation: "text",
            timeout_ms: 1000,
            screen: Some("\n$ ".to_string()),
        };
        let display = err.to_string();
        assert!(display.starts_with("text timed out after 1000ms; current screen:"));
        assert!(display.contains("$ "));
    }

    #[test]
    fn test_ambiguous_click_error() {
        let err = Error::AmbiguousClick {
            pattern: "aaa".to_string(),
            count: 4,
        };
        let display = err.to_string();
        assert!(display.contains("found 4 matches"));
        assert!(display.contains("first"));
    }

    #[test]
    fn test_click_not_found_error() {
        let err = Error::ClickNotFound {
            pattern: "missing".to_string(),
        };
        assert_eq!(err.to_string(), "click(missing): pattern not found");
    }

    #[test]
    fn test_closed_session_error() {
        assert_eq!(Error::ClosedSession.to_string(), "session is closed");
    }

    #[test]
    fn test_launch_error() {
        let err = Error::Launch("no such command".to_string());
        assert_eq!(err.to_string(), "launch failed: no such command");
    }

    #[test]
    fn test_write_error() {
        let err = Error::Write("broken pipe".to_string());
        assert_eq!(err.to_string(), "PTY write failed: broken pipe");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_result_type() {
        let success: Result<i32> = Ok(42);
        assert!(success.is_ok());

        let failure: Result<i32> = Err(Error::ClosedSession);
        assert!(failure.is_err());
    }
}

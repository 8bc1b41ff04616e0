//! # tui-driver-emulator
//!
//! Terminal emulation and PTY lifecycle for the tui-driver toolkit.
//!
//! This crate provides:
//! - VTE-based parsing of ANSI/VT escape sequences
//! - Terminal grid state management and styled snapshots
//! - PTY spawn/write/resize/kill with a chunked output stream
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends on tui-driver-core
//! and is consumed by the session orchestrator in the tui-driver crate.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod grid;
pub mod parser;
pub mod pty;

// Re-export commonly used types
pub use grid::{Cursor, Grid, ScreenSnapshot};
pub use parser::Parser;
pub use pty::PtyHandle;

//! # tui-driver
//!
//! Test-automation driver for terminal user interfaces.
//!
//! tui-driver launches an arbitrary command inside a pseudo-terminal,
//! maintains a faithful in-process emulation of the screen that command
//! paints, and exposes high-level operations to drive it and read it
//! back. It is to terminal applications what a headless browser driver
//! is to web pages.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::time::Duration;
//! use tui_driver::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let session = Session::launch_ready(
//!         LaunchOptions::new("bash")
//!             .arg("--norc")
//!             .size(80, 24)
//!             .env("PS1", "$ "),
//!     )
//!     .await?;
//!
//!     session.type_text("echo hello").await?;
//!     session.press(&["enter"]).await?;
//!     session
//!         .wait_for_text("hello", Duration::from_secs(5))
//!         .await?;
//!
//!     let screen = session.text(TextOptions::new().trim_end()).await?;
//!     assert!(screen.contains("hello"));
//!
//!     session.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! This is Layer 2, the orchestrator crate. It couples the PTY stream
//! and emulator grid from tui-driver-emulator with the quiescence
//! scheduler in [`idle`], the screen reader in [`projector`], and the
//! search engine in [`matcher`], all behind the [`Session`] surface.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod idle;
pub mod matcher;
pub mod prelude;
pub mod projector;
pub mod session;

// Re-export commonly used types
pub use session::{ClickOptions, FrameOptions, Session};
pub use tui_driver_core::{
    Cell, CellAttributes, Color, Dimensions, Error, Key, LaunchOptions, Pattern, Position, Result,
    Span, StyleFilter, TextOptions,
};
pub use tui_driver_emulator::{Cursor, Grid, Parser, PtyHandle, ScreenSnapshot};

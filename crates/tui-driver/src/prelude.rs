//! Convenient re-exports for driver users.

pub use crate::matcher::Match;
pub use crate::session::{ClickOptions, FrameOptions, Session};
pub use tui_driver_core::{
    Error, Key, LaunchOptions, Pattern, Result, StyleFilter, TextOptions,
};

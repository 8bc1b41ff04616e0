//! The session orchestrator: one driven child process per session.
//!
//! A `Session` couples three independent clocks - the PTY byte stream,
//! the emulator grid, and the caller's wait/act requests - into a serial,
//! idle-tracked automation surface. Every received chunk is fed to the
//! emulator before the idle tracker is notified, so a waiter that resolves
//! always observes a grid reflecting the bytes that resolved it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use tui_driver_core::{codec, Dimensions, Error, Key, LaunchOptions, Pattern, Result, TextOptions};
use tui_driver_emulator::{Grid, Parser, PtyHandle, ScreenSnapshot};

use crate::idle::IdleTracker;
use crate::matcher::{self, Match};
use crate::projector;

/// Default overall timeout for [`Session::text`].
const TEXT_TIMEOUT: Duration = Duration::from_millis(1000);
/// Default timeout for pattern-driven waits (`wait_for_text`, `click`).
const PATTERN_TIMEOUT: Duration = Duration::from_millis(5000);
/// Default timeout for [`Session::wait_idle`] and trailing quiescence.
const IDLE_TIMEOUT: Duration = Duration::from_millis(500);
/// Default timeout for [`Session::wait_for_data`].
const FIRST_DATA_TIMEOUT: Duration = Duration::from_millis(5000);
/// Quiescence slice used by the `text` and `click` poll loops.
const POLL_QUIESCENT: Duration = Duration::from_millis(15);
/// Inter-character pacing for [`Session::type_text`].
const TYPE_DELAY: Duration = Duration::from_millis(1);

/// Options for [`Session::click`].
#[derive(Debug, Clone, Default)]
pub struct ClickOptions {
    /// Click the first match instead of failing when several match.
    pub first: bool,
    /// Overall timeout; default 5000 ms.
    pub timeout: Option<Duration>,
}

/// Options for [`Session::capture_frames`].
#[derive(Debug, Clone)]
pub struct FrameOptions {
    /// Number of frames to capture.
    pub frame_count: usize,
    /// Sleep between consecutive frames.
    pub interval: Duration,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            frame_count: 5,
            interval: Duration::from_millis(10),
        }
    }
}

/// A terminal application driven inside a PTY.
///
/// Operations observe a serial happens-before order with respect to PTY
/// writes and quiescence waits. Sessions are independent of each other;
/// no cross-session synchronization exists.
#[derive(Debug)]
pub struct Session {
    pty: PtyHandle,
    parser: Arc<Mutex<Option<Parser>>>,
    idle: Arc<IdleTracker>,
    geometry: Mutex<Dimensions>,
    closed: Arc<AtomicBool>,
    feed_task: Mutex<Option<JoinHandle<()>>>,
    command: String,
    args: Vec<String>,
}

impl Session {
    /// Launch the configured command under a fresh PTY and emulator.
    ///
    /// Returns as soon as the child is spawned; use
    /// [`Session::launch_ready`] to also wait for the first output.
    pub async fn launch(options: LaunchOptions) -> Result<Self> {
        let dimensions = Dimensions::new(options.rows, options.cols);
        let (pty, chunks) = PtyHandle::spawn(&options)?;
        let parser = Arc::new(Mutex::new(Some(Parser::new(Grid::new(dimensions)))));
        let idle = Arc::new(IdleTracker::new());
        let closed = Arc::new(AtomicBool::new(false));

        let feed_task = tokio::spawn(feed_loop(
            chunks,
            Arc::clone(&parser),
            Arc::clone(&idle),
            Arc::clone(&closed),
        ));

        info!(command = %options.command, "session launched");
        Ok(Self {
            pty,
            parser,
            idle,
            geometry: Mutex::new(dimensions),
            closed,
            feed_task: Mutex::new(Some(feed_task)),
            command: options.command,
            args: options.args,
        })
    }

    /// Launch and wait for the child's first output plus an initial
    /// quiescence, so the returned session shows a settled first paint.
    pub async fn launch_ready(options: LaunchOptions) -> Result<Self> {
        let session = Self::launch(options).await?;
        session.wait_for_data(None).await?;
        session.wait_idle(None).await?;
        Ok(session)
    }

    /// The launched command.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// The launched command's arguments.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Current session geometry.
    pub fn geometry(&self) -> Dimensions {
        *self.geometry.lock().unwrap()
    }

    /// Whether the child process is still running.
    pub fn is_alive(&self) -> bool {
        !self.closed.load(Ordering::SeqCst) && self.pty.is_alive()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(Error::ClosedSession)
        } else {
            Ok(())
        }
    }

    fn write(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_open()?;
        self.pty.write(bytes)
    }

    /// Type text one code-point at a time with a small pacing delay, so
    /// per-keystroke handlers in the child see distinct events, then wait
    /// for the UI to settle.
    pub async fn type_text(&self, text: &str) -> Result<()> {
        self.ensure_open()?;
        debug!(chars = text.chars().count(), "typing text");
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            self.write(ch.encode_utf8(&mut buf).as_bytes())?;
            time::sleep(TYPE_DELAY).await;
        }
        self.idle.await_quiescent(IDLE_TIMEOUT).await
    }

    /// Press a key chord given by name (`&["ctrl", "c"]`, `&["enter"]`).
    ///
    /// Every element is validated first; unknown names collect into a
    /// single `InvalidKey` error. The encoded chord goes out in one PTY
    /// write, then the session waits for the UI to settle.
    pub async fn press(&self, keys: &[&str]) -> Result<()> {
        self.ensure_open()?;
        let chord = parse_chord(keys)?;
        self.press_chord(&chord).await
    }

    /// Press an already-parsed key chord.
    pub async fn press_chord(&self, chord: &[Key]) -> Result<()> {
        self.ensure_open()?;
        let bytes = codec::encode_chord(chord);
        debug!(bytes = bytes.len(), "pressing chord");
        self.write(&bytes)?;
        self.idle.await_quiescent(IDLE_TIMEOUT).await
    }

    /// Write raw bytes with no pacing and no quiescence wait.
    pub fn send_raw(&self, bytes: &[u8]) -> Result<()> {
        self.write(bytes)
    }

    fn snapshot(&self) -> Result<ScreenSnapshot> {
        let guard = self.parser.lock().unwrap();
        match guard.as_ref() {
            Some(parser) => Ok(parser.grid().snapshot()),
            None => Err(Error::ClosedSession),
        }
    }

    fn project_now(&self, options: &TextOptions) -> Result<String> {
        Ok(projector::project(&self.snapshot()?, options))
    }

    /// Read the screen as projected text.
    ///
    /// With `immediate` the current grid is projected at once. Otherwise
    /// the session polls - brief quiescence wait, then projection - until
    /// the `wait_for` predicate holds (default: trimmed text non-empty).
    /// On timeout the predicate is evaluated one final time on a fresh
    /// projection before failing with a `Timeout` that embeds the screen.
    pub async fn text(&self, options: TextOptions) -> Result<String> {
        self.ensure_open()?;
        if options.immediate {
            return self.project_now(&options);
        }

        let timeout = options.timeout.unwrap_or(TEXT_TIMEOUT);
        let deadline = Instant::now() + timeout;
        let satisfied = |projected: &str| match &options.wait_for {
            Some(predicate) => predicate(projected),
            None => !projected.trim().is_empty(),
        };

        while Instant::now() < deadline {
            self.idle.await_quiescent(POLL_QUIESCENT).await?;
            let projected = self.project_now(&options)?;
            if satisfied(&projected) {
                return Ok(projected);
            }
        }

        let projected = self.project_now(&options)?;
        if satisfied(&projected) {
            return Ok(projected);
        }
        Err(Error::Timeout {
            operation: "text",
            timeout_ms: timeout.as_millis() as u64,
            screen: Some(projected),
        })
    }

    /// Wait until `pattern` matches the projected text and return that
    /// projection. String patterns match as literal substrings.
    pub async fn wait_for_text(
        &self,
        pattern: impl Into<Pattern>,
        timeout: impl Into<Option<Duration>>,
    ) -> Result<String> {
        let pattern = pattern.into();
        let timeout = timeout.into().unwrap_or(PATTERN_TIMEOUT);
        debug!(%pattern, "waiting for text");

        let predicate_pattern = pattern.clone();
        let options = TextOptions::new()
            .timeout(timeout)
            .wait_for(move |projected| predicate_pattern.is_match(projected));

        match self.text(options).await {
            Err(Error::Timeout {
                timeout_ms, screen, ..
            }) => Err(Error::Timeout {
                operation: "wait_for_text",
                timeout_ms,
                screen,
            }),
            other => other,
        }
    }

    /// Wait for the byte stream to go quiescent (default 500 ms bound).
    pub async fn wait_idle(&self, timeout: impl Into<Option<Duration>>) -> Result<()> {
        self.ensure_open()?;
        self.idle
            .await_quiescent(timeout.into().unwrap_or(IDLE_TIMEOUT))
            .await
    }

    /// Wait for the first byte the child ever writes (default 5 s).
    pub async fn wait_for_data(&self, timeout: impl Into<Option<Duration>>) -> Result<()> {
        self.ensure_open()?;
        self.idle
            .await_first_data(timeout.into().unwrap_or(FIRST_DATA_TIMEOUT))
            .await
    }

    fn raw_lines(&self) -> Result<Vec<String>> {
        Ok(projector::raw_lines(&self.snapshot()?))
    }

    /// Locate `pattern` on the grid and click its position.
    ///
    /// Polls until the pattern appears. A unique match is clicked; more
    /// than one match fails with `AmbiguousClick` unless `first` is set;
    /// no match within the timeout fails with `ClickNotFound`.
    pub async fn click(&self, pattern: impl Into<Pattern>, options: ClickOptions) -> Result<()> {
        self.ensure_open()?;
        let pattern = pattern.into();
        let timeout = options.timeout.unwrap_or(PATTERN_TIMEOUT);
        let deadline = Instant::now() + timeout;

        loop {
            self.idle.await_quiescent(POLL_QUIESCENT).await?;
            let matches = matcher::find_matches(&self.raw_lines()?, &pattern);
            match matches.len() {
                0 => {
                    if Instant::now() >= deadline {
                        return Err(Error::ClickNotFound {
                            pattern: pattern.to_string(),
                        });
                    }
                }
                1 => return self.click_match(&matches[0]).await,
                count => {
                    if options.first {
                        return self.click_match(&matches[0]).await;
                    }
                    return Err(Error::AmbiguousClick {
                        pattern: pattern.to_string(),
                        count,
                    });
                }
            }
        }
    }

    async fn click_match(&self, m: &Match) -> Result<()> {
        debug!(row = m.row, col = m.col, text = %m.text, "clicking match");
        self.click_at(m.col, m.row).await
    }

    /// Send an SGR mouse press+release pair at cell (x, y), then wait for
    /// the UI to settle.
    pub async fn click_at(&self, x: u16, y: u16) -> Result<()> {
        self.ensure_open()?;
        self.write(&codec::mouse_click(x, y))?;
        self.idle.await_quiescent(IDLE_TIMEOUT).await
    }

    /// Send `lines` wheel-up events at `at` (default: screen center).
    pub async fn scroll_up(&self, lines: u16, at: Option<(u16, u16)>) -> Result<()> {
        self.ensure_open()?;
        let (x, y) = self.scroll_origin(at);
        self.write(&codec::mouse_scroll_up(x, y, lines))?;
        self.idle.await_quiescent(IDLE_TIMEOUT).await
    }

    /// Send `lines` wheel-down events at `at` (default: screen center).
    pub async fn scroll_down(&self, lines: u16, at: Option<(u16, u16)>) -> Result<()> {
        self.ensure_open()?;
        let (x, y) = self.scroll_origin(at);
        self.write(&codec::mouse_scroll_down(x, y, lines))?;
        self.idle.await_quiescent(IDLE_TIMEOUT).await
    }

    fn scroll_origin(&self, at: Option<(u16, u16)>) -> (u16, u16) {
        at.unwrap_or_else(|| {
            let dims = self.geometry();
            (dims.cols / 2, dims.rows / 2)
        })
    }

    /// Send a chord without waiting, then capture a burst of immediate
    /// projections to observe transient renders the debounce would hide.
    ///
    /// Frames are captured `interval` apart; after the last frame the
    /// session waits for the UI to settle.
    pub async fn capture_frames(
        &self,
        keys: &[&str],
        options: FrameOptions,
    ) -> Result<Vec<String>> {
        self.ensure_open()?;
        let chord = parse_chord(keys)?;
        self.send_raw(&codec::encode_chord(&chord))?;

        let project_options = TextOptions::new();
        let mut frames = Vec::with_capacity(options.frame_count);
        for frame in 0..options.frame_count {
            frames.push(self.project_now(&project_options)?);
            if frame + 1 < options.frame_count {
                time::sleep(options.interval).await;
            }
        }

        self.idle.await_quiescent(IDLE_TIMEOUT).await?;
        Ok(frames)
    }

    /// Resize the session: geometry, emulator, and PTY stay in lock-step.
    ///
    /// No quiescence wait; the child's SIGWINCH-driven repaint is
    /// observed by whatever operation comes next.
    pub fn resize(&self, cols: u16, rows: u16) -> Result<()> {
        self.ensure_open()?;
        info!(cols, rows, "resizing session");
        let dimensions = Dimensions::new(rows, cols);

        let mut geometry = self.geometry.lock().unwrap();
        {
            let mut guard = self.parser.lock().unwrap();
            if let Some(parser) = guard.as_mut() {
                parser.grid_mut().resize(dimensions);
            }
        }
        self.pty.resize(dimensions)?;
        *geometry = dimensions;
        Ok(())
    }

    /// Close the session: fail outstanding waiters, kill the child, then
    /// release the emulator. Idempotent; later calls are no-ops.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(command = %self.command, "closing session");
        self.idle.close();
        self.pty.kill();
        if let Some(task) = self.feed_task.lock().unwrap().take() {
            task.abort();
        }
        self.parser.lock().unwrap().take();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

/// Feed every received chunk to the emulator, then notify the idle
/// tracker. Runs until the stream ends or the session closes; emulation
/// is total over arbitrary bytes, so nothing here can fail the stream.
async fn feed_loop(
    mut chunks: UnboundedReceiver<Vec<u8>>,
    parser: Arc<Mutex<Option<Parser>>>,
    idle: Arc<IdleTracker>,
    closed: Arc<AtomicBool>,
) {
    while let Some(chunk) = chunks.recv().await {
        if closed.load(Ordering::SeqCst) {
            break;
        }
        {
            let mut guard = match parser.lock() {
                Ok(guard) => guard,
                Err(poisoned) => {
                    warn!("emulator lock poisoned; dropping chunk");
                    poisoned.into_inner()
                }
            };
            if let Some(parser) = guard.as_mut() {
                parser.feed(&chunk);
            }
        }
        idle.notify();
    }
    debug!("PTY stream ended");
}

/// Parse key names, collecting every unknown name into one error.
fn parse_chord(keys: &[&str]) -> Result<Vec<Key>> {
    let mut chord = Vec::with_capacity(keys.len());
    let mut unknown = Vec::new();
    for name in keys {
        match Key::parse(name) {
            Ok(key) => chord.push(key),
            Err(_) => unknown.push((*name).to_string()),
        }
    }
    if unknown.is_empty() {
        Ok(chord)
    } else {
        Err(Error::InvalidKey {
            keys: unknown,
            valid: Key::valid_names(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chord_collects_all_offenders() {
        let err = parse_chord(&["enter", "bogus", "ctrl", "nope"]).unwrap_err();
        match err {
            Error::InvalidKey { keys, valid } => {
                assert_eq!(keys, vec!["bogus".to_string(), "nope".to_string()]);
                assert!(valid.contains(&"enter".to_string()));
            }
            other => panic!("expected InvalidKey, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_chord_valid() {
        let chord = parse_chord(&["ctrl", "c"]).unwrap();
        assert_eq!(chord, vec![Key::Ctrl, Key::Char('c')]);
    }

    #[cfg(unix)]
    mod pty_backed {
        use super::*;

        #[tokio::test]
        async fn test_launch_and_close_idempotent() {
            let session = Session::launch(LaunchOptions::new("sh")).await.unwrap();
            assert!(session.is_alive());
            assert_eq!(session.command(), "sh");

            session.close();
            session.close();
            assert!(!session.is_alive());
        }

        #[tokio::test]
        async fn test_operations_fail_after_close() {
            let session = Session::launch(LaunchOptions::new("sh")).await.unwrap();
            session.close();

            assert!(matches!(
                session.text(TextOptions::new()).await,
                Err(Error::ClosedSession)
            ));
            assert!(matches!(
                session.press(&["enter"]).await,
                Err(Error::ClosedSession)
            ));
            assert!(matches!(
                session.type_text("x").await,
                Err(Error::ClosedSession)
            ));
            assert!(matches!(session.send_raw(b"x"), Err(Error::ClosedSession)));
            assert!(matches!(
                session.wait_idle(None).await,
                Err(Error::ClosedSession)
            ));
            assert!(matches!(
                session.wait_for_data(None).await,
                Err(Error::ClosedSession)
            ));
            assert!(matches!(
                session.click_at(0, 0).await,
                Err(Error::ClosedSession)
            ));
            assert!(matches!(session.resize(80, 24), Err(Error::ClosedSession)));
        }

        #[tokio::test]
        async fn test_press_invalid_key_names_offenders() {
            let session = Session::launch(LaunchOptions::new("sh")).await.unwrap();
            let err = session.press(&["enter", "warp"]).await.unwrap_err();
            let message = err.to_string();
            assert!(message.contains("warp"));
            assert!(message.contains("valid keys are"));
            session.close();
        }

        #[tokio::test]
        async fn test_resize_updates_geometry() {
            let session = Session::launch(LaunchOptions::new("sh")).await.unwrap();
            session.resize(100, 30).unwrap();
            let dims = session.geometry();
            assert_eq!((dims.cols, dims.rows), (100, 30));
            session.close();
        }
    }
}

//! Quiescence tracking for the PTY byte stream.
//!
//! The tracker watches chunk-arrival times and declares the stream idle a
//! fixed debounce after the last chunk. Every wait in the driver funnels
//! through here, which is what makes "the UI has settled" deterministic.

use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::{self, Instant};
use tracing::trace;

use tui_driver_core::{Error, Result};

/// Time after the last received chunk before the stream is declared idle.
pub const IDLE_DEBOUNCE: Duration = Duration::from_millis(60);

/// Resolution period for waiters armed while no debounce is pending.
pub const INITIAL_IDLE_FALLBACK: Duration = Duration::from_millis(20);

#[derive(Debug)]
struct IdleState {
    /// Arrival time of the most recent chunk.
    last_chunk: Option<Instant>,
    /// A chunk arrived since the last debounce fire.
    pending: bool,
    /// Completed debounce fires.
    fires: u64,
    /// At least one chunk has ever arrived.
    seen_data: bool,
    closed: bool,
}

/// Observes PTY data arrival and services quiescence waiters.
///
/// Multiple callers may wait concurrently; one debounce fire releases
/// every waiter pending at that moment.
#[derive(Debug)]
pub struct IdleTracker {
    state: Mutex<IdleState>,
    chunk_event: Notify,
    first_data: Notify,
}

impl Default for IdleTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl IdleTracker {
    /// Create a tracker with no data observed yet.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(IdleState {
                last_chunk: None,
                pending: false,
                fires: 0,
                seen_data: false,
                closed: false,
            }),
            chunk_event: Notify::new(),
            first_data: Notify::new(),
        }
    }

    /// Record an arriving chunk: restart the debounce and wake waiters so
    /// they re-arm their timers.
    pub fn notify(&self) {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return;
        }
        state.last_chunk = Some(Instant::now());
        state.pending = true;
        if !state.seen_data {
            state.seen_data = true;
            self.first_data.notify_waiters();
        }
        drop(state);
        self.chunk_event.notify_waiters();
    }

    /// Whether any chunk has ever arrived.
    pub fn seen_data(&self) -> bool {
        self.state.lock().unwrap().seen_data
    }

    /// Wait until the stream goes quiescent or `timeout` elapses,
    /// whichever comes first.
    ///
    /// When no debounce is pending (no chunk since the last fire), the
    /// wait resolves after `min(timeout, INITIAL_IDLE_FALLBACK)` instead.
    /// Fails with `ClosedSession` once the tracker is closed.
    pub async fn await_quiescent(&self, timeout: Duration) -> Result<()> {
        let armed_at = Instant::now();
        let deadline = armed_at + timeout;
        let armed_fires = {
            let state = self.state.lock().unwrap();
            if state.closed {
                return Err(Error::ClosedSession);
            }
            state.fires
        };

        loop {
            let wakeup = self.chunk_event.notified();
            tokio::pin!(wakeup);
            wakeup.as_mut().enable();

            let wake_at = {
                let state = self.state.lock().unwrap();
                if state.closed {
                    return Err(Error::ClosedSession);
                }
                if state.fires > armed_fires {
                    return Ok(());
                }
                match (state.pending, state.last_chunk) {
                    (true, Some(last)) => last + IDLE_DEBOUNCE,
                    _ => armed_at + INITIAL_IDLE_FALLBACK,
                }
            };

            tokio::select! {
                _ = &mut wakeup => continue,
                _ = time::sleep_until(wake_at.min(deadline)) => {
                    let mut state = self.state.lock().unwrap();
                    if state.closed {
                        return Err(Error::ClosedSession);
                    }
                    if state.fires > armed_fires {
                        return Ok(());
                    }
                    if !state.pending {
                        // Fallback period (or the timeout) elapsed.
                        return Ok(());
                    }
                    let now = Instant::now();
                    match state.last_chunk {
                        Some(last) if now >= last + IDLE_DEBOUNCE => {
                            // This waiter performs the fire; the
                            // notification releases the rest of the batch.
                            state.pending = false;
                            state.fires += 1;
                            trace!(fires = state.fires, "stream quiescent");
                            drop(state);
                            self.chunk_event.notify_waiters();
                            return Ok(());
                        }
                        _ => {
                            if now >= deadline {
                                return Ok(());
                            }
                            // A chunk arrived while sleeping; re-arm.
                        }
                    }
                }
            }
        }
    }

    /// Resolve as soon as the first chunk ever arrives; immediate success
    /// if one already has. Fails with `Timeout` otherwise.
    pub async fn await_first_data(&self, timeout: Duration) -> Result<()> {
        let wakeup = self.first_data.notified();
        tokio::pin!(wakeup);
        wakeup.as_mut().enable();

        {
            let state = self.state.lock().unwrap();
            if state.closed {
                return Err(Error::ClosedSession);
            }
            if state.seen_data {
                return Ok(());
            }
        }

        tokio::select! {
            _ = &mut wakeup => {
                let state = self.state.lock().unwrap();
                if state.closed {
                    return Err(Error::ClosedSession);
                }
                Ok(())
            }
            _ = time::sleep(timeout) => Err(Error::Timeout {
                operation: "wait_for_data",
                timeout_ms: timeout.as_millis() as u64,
                screen: None,
            }),
        }
    }

    /// Close the tracker: every pending and future wait fails with
    /// `ClosedSession`.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        drop(state);
        self.chunk_event.notify_waiters();
        self.first_data.notify_waiters();
    }

    #[cfg(test)]
    fn fires(&self) -> u64 {
        self.state.lock().unwrap().fires
    }
}

//! PTY (pseudo-terminal) handling with portable-pty.

use std::io::{Read, Write};
use std::sync::Mutex;

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task;
use tracing::{debug, info, warn};

use tui_driver_core::{Dimensions, Error, LaunchOptions, Result};

fn pty_size(dimensions: Dimensions) -> PtySize {
    PtySize {
        rows: dimensions.rows,
        cols: dimensions.cols,
        pixel_width: 0,
        pixel_height: 0,
    }
}

/// Handle to a spawned PTY process.
///
/// Output is delivered as a stream of byte chunks over the receiver
/// returned by [`PtyHandle::spawn`]; chunks read before the receiver is
/// first polled buffer in the channel, so no early output is lost.
pub struct PtyHandle {
    master: Mutex<Option<Box<dyn MasterPty + Send>>>,
    child: Mutex<Option<Box<dyn Child + Send + Sync>>>,
    writer: Mutex<Option<Box<dyn Write + Send>>>,
    dimensions: Mutex<Dimensions>,
}

impl std::fmt::Debug for PtyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyHandle")
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

impl PtyHandle {
    /// Spawn a new PTY running the configured command.
    ///
    /// The caller's environment is inherited, the entries in
    /// `options.env` are merged over it, and `TERM=xterm-truecolor` plus
    /// `COLORTERM=truecolor` are forced on top. A dedicated blocking task
    /// reads the child's output and forwards every chunk, in order, to
    /// the returned receiver until the stream ends.
    pub fn spawn(options: &LaunchOptions) -> Result<(Self, UnboundedReceiver<Vec<u8>>)> {
        let dimensions = Dimensions::new(options.rows, options.cols);
        info!(
            command = %options.command,
            args = ?options.args,
            cols = options.cols,
            rows = options.rows,
            "spawning PTY"
        );

        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(pty_size(dimensions))
            .map_err(|e| Error::Launch(format!("failed to open PTY: {e}")))?;

        let mut cmd = CommandBuilder::new(&options.command);
        for arg in &options.args {
            cmd.arg(arg);
        }
        if let Some(dir) = &options.cwd {
            cmd.cwd(dir);
        }
        for (name, value) in &options.env {
            cmd.env(name, value);
        }
        cmd.env("TERM", "xterm-truecolor");
        cmd.env("COLORTERM", "truecolor");

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| Error::Launch(format!("failed to spawn '{}': {e}", options.command)))?;
        // Drop the slave end so the master sees EOF when the child exits.
        drop(pair.slave);

        let writer = pair
            .master
            .take_writer()
            .map_err(|e| Error::Launch(format!("failed to take PTY writer: {e}")))?;
        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| Error::Launch(format!("failed to clone PTY reader: {e}")))?;

        let (tx, rx) = mpsc::unbounded_channel();
        task::spawn_blocking(move || {
            let mut buffer = [0u8; 4096];
            loop {
                match reader.read(&mut buffer) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(buffer[..n].to_vec()).is_err() {
                            break; // receiver dropped
                        }
                    }
                    Err(e) => {
                        // EIO is the normal end-of-stream on Linux PTYs
                        debug!("PTY reader finished: {e}");
                        break;
                    }
                }
            }
        });

        Ok((
            Self {
                master: Mutex::new(Some(pair.master)),
                child: Mutex::new(Some(child)),
                writer: Mutex::new(Some(writer)),
                dimensions: Mutex::new(dimensions),
            },
            rx,
        ))
    }

    /// Write bytes to the child's input.
    pub fn write(&self, data: &[u8]) -> Result<()> {
        debug!(bytes = data.len(), "writing to PTY");
        let mut writer_lock = self
            .writer
            .lock()
            .map_err(|_| Error::Write("writer lock poisoned".to_string()))?;
        let writer = writer_lock
            .as_mut()
            .ok_or_else(|| Error::Write("PTY released".to_string()))?;
        writer
            .write_all(data)
            .and_then(|_| writer.flush())
            .map_err(|e| Error::Write(e.to_string()))
    }

    /// Resize the PTY; the child is notified via SIGWINCH.
    pub fn resize(&self, new_dimensions: Dimensions) -> Result<()> {
        info!(
            cols = new_dimensions.cols,
            rows = new_dimensions.rows,
            "resizing PTY"
        );
        let master_lock = self
            .master
            .lock()
            .map_err(|_| Error::Write("master lock poisoned".to_string()))?;
        let master = master_lock
            .as_ref()
            .ok_or_else(|| Error::Write("PTY released".to_string()))?;
        master
            .resize(pty_size(new_dimensions))
            .map_err(|e| Error::Write(format!("resize failed: {e}")))?;
        drop(master_lock);

        let mut dims = self
            .dimensions
            .lock()
            .map_err(|_| Error::Write("dimensions lock poisoned".to_string()))?;
        *dims = new_dimensions;
        Ok(())
    }

    /// Get current PTY dimensions.
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions.lock().map(|d| *d).unwrap_or_default()
    }

    /// Check if the child process is still running.
    pub fn is_alive(&self) -> bool {
        let mut child_lock = match self.child.lock() {
            Ok(c) => c,
            Err(_) => return false,
        };
        match child_lock.as_mut() {
            Some(child) => child.try_wait().ok().flatten().is_none(),
            None => false,
        }
    }

    /// Kill the child and release the PTY file descriptors.
    ///
    /// Dropping the master and writer ends the reader task's stream.
    pub fn kill(&self) {
        info!("killing PTY child");
        if let Ok(mut child_lock) = self.child.lock() {
            if let Some(mut child) = child_lock.take() {
                if let Err(e) = child.kill() {
                    warn!("failed to kill child: {e}");
                }
                let _ = child.wait();
            }
        }
        if let Ok(mut writer) = self.writer.lock() {
            writer.take();
        }
        if let Ok(mut master) = self.master.lock() {
            master.take();
        }
    }
}

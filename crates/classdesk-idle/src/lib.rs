//! Inactivity timeout for Classdesk clients.
//!
//! An [`IdleMonitor`] runs a small Tokio task that sleeps until a
//! deadline. Every [`touch`](IdleMonitor::touch) (a click, a key press,
//! a navigation) pushes the deadline back by the configured timeout.
//! When the deadline passes untouched the callback runs once and the
//! monitor stops.
//!
//! # Integration
//!
//! The client wires the callback to its logout:
//!
//! ```ignore
//! let monitor = IdleMonitor::spawn(IdleConfig::default(), move || async move {
//!     client.logout().await;
//! });
//! // in the input handler:
//! monitor.touch();
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the inactivity monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdleConfig {
    /// How long without activity before the callback fires.
    /// Default: 10 minutes.
    pub timeout: Duration,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

impl IdleConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

    /// Shortest timeout accepted. Anything below is raised to this.
    pub const MIN_TIMEOUT: Duration = Duration::from_secs(1);

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Raises a too-short timeout to [`Self::MIN_TIMEOUT`].
    ///
    /// Called automatically by [`IdleMonitor::spawn`].
    pub fn validated(mut self) -> Self {
        if self.timeout < Self::MIN_TIMEOUT {
            warn!(
                timeout_ms = self.timeout.as_millis() as u64,
                "idle timeout below minimum, raising it"
            );
            self.timeout = Self::MIN_TIMEOUT;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Monitor
// ---------------------------------------------------------------------------

/// Queue depth for activity signals. A full queue already holds a
/// pending reset, so extra touches are dropped.
const COMMAND_BUFFER: usize = 16;

enum Command {
    Touch,
}

/// Handle to a running inactivity timer.
///
/// Dropping the handle cancels the timer.
pub struct IdleMonitor {
    tx: mpsc::Sender<Command>,
    task: JoinHandle<()>,
    timeout: Duration,
}

impl IdleMonitor {
    /// Starts the timer. `on_timeout` runs at most once.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<F, Fut>(config: IdleConfig, on_timeout: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let config = config.validated();
        let timeout = config.timeout;
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let task = tokio::spawn(run(timeout, rx, on_timeout));
        debug!(timeout_secs = timeout.as_secs(), "idle monitor started");
        Self { tx, task, timeout }
    }

    /// Records user activity, pushing the deadline back to a full
    /// timeout from now.
    pub fn touch(&self) {
        // Full: a reset is already queued. Closed: the monitor is done.
        let _ = self.tx.try_send(Command::Touch);
    }

    /// Cancels the timer without firing the callback.
    ///
    /// Takes effect immediately, however many touches are still queued.
    pub fn stop(&self) {
        self.task.abort();
        debug!("idle monitor stopped");
    }

    /// Whether the timer is still counting down.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Drop for IdleMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<F, Fut>(timeout: Duration, mut rx: mpsc::Receiver<Command>, on_timeout: F)
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut deadline = Instant::now() + timeout;
    loop {
        tokio::select! {
            cmd = rx.recv() => match cmd {
                Some(Command::Touch) => deadline = Instant::now() + timeout,
                None => return,
            },
            () = time::sleep_until(deadline) => {
                info!(timeout_secs = timeout.as_secs(), "idle timeout reached");
                on_timeout().await;
                return;
            }
        }
    }
}

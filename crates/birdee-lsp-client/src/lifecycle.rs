//! Session states and child process termination.

use std::fmt;
use std::io;
use std::process::{Child, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::session::CLIENT_TARGET;

/// Grace period between closing stdin and killing the server.
pub const EXIT_GRACE_PERIOD: Duration = Duration::from_millis(200);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Lifecycle of a [`crate::ClientSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nothing has been spawned yet.
    #[default]
    Uninitialized,
    /// The process is running and `initialize` is outstanding.
    Starting,
    /// The handshake completed.
    Running,
    /// Teardown is in progress.
    Stopping,
    /// The process has exited or never started.
    Stopped,
}

impl SessionState {
    /// Whether notifications can be written to the transport now.
    #[must_use]
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Uninitialized => "uninitialized",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.write_str(label)
    }
}

/// Waits up to `grace` for the child to exit, then kills it.
///
/// # Errors
///
/// Returns the operating system's error when the killed child cannot be
/// reaped.
pub fn terminate_child(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    let deadline = Instant::now() + grace;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(target: CLIENT_TARGET, ?status, "language server exited");
                return Ok(status);
            }
            Ok(None) if Instant::now() < deadline => thread::sleep(POLL_INTERVAL),
            Ok(None) => break,
            Err(error) => {
                warn!(
                    target: CLIENT_TARGET,
                    error = %error,
                    "failed to check process status"
                );
                break;
            }
        }
    }

    warn!(
        target: CLIENT_TARGET,
        pid = child.id(),
        "language server did not exit within the grace period, killing it"
    );
    if let Err(error) = child.kill() {
        debug!(target: CLIENT_TARGET, error = %error, "kill failed");
    }
    child.wait()
}

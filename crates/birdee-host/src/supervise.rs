//! The host's control loop.

use std::thread;
use std::time::Duration;

use birdee_lsp_client::{ServerLauncher, SessionEvent};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::HOST_TARGET;
use crate::activation::Activation;
use crate::errors::HostError;
use crate::shutdown::ShutdownSignal;

/// Pause between rounds of session events.
pub const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Why supervision ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A shutdown signal arrived; the session is still live.
    ShutdownRequested,
    /// The server's transport closed on its own.
    ServerExited,
}

/// Services session events until shutdown is requested or the server exits.
///
/// The session is not stopped here; the caller deactivates it afterwards in
/// both cases.
///
/// # Errors
///
/// Returns [`HostError::Session`] when the server rejects `initialize`.
/// Replies and file changes the session cannot write are only logged.
pub fn supervise<L, S>(
    activation: &mut Activation<L>,
    shutdown: &mut S,
    poll_interval: Duration,
) -> Result<Outcome, HostError>
where
    L: ServerLauncher,
    S: ShutdownSignal + ?Sized,
{
    loop {
        if shutdown.requested() {
            return Ok(Outcome::ShutdownRequested);
        }
        let events = activation
            .session_mut()
            .process_events()
            .map_err(|source| HostError::Session { source })?;
        for event in events {
            match event {
                SessionEvent::Ready => info!(target: HOST_TARGET, "language server ready"),
                SessionEvent::Notification { method, params } => {
                    log_notification(&method, params.as_ref());
                }
                SessionEvent::TransportClosed { exit_status } => {
                    warn!(
                        target: HOST_TARGET,
                        exit_status = ?exit_status,
                        "language server exited unexpectedly"
                    );
                    return Ok(Outcome::ServerExited);
                }
            }
        }
        thread::sleep(poll_interval);
    }
}

/// Surfaces `window/*` messages in the host log; everything else stays at
/// debug.
fn log_notification(method: &str, params: Option<&Value>) {
    let message = params
        .and_then(|params| params.get("message"))
        .and_then(Value::as_str);
    match (method, message) {
        ("window/showMessage" | "window/logMessage", Some(message)) => {
            info!(target: HOST_TARGET, method, message, "language server message");
        }
        _ => debug!(target: HOST_TARGET, method, "language server notification"),
    }
}

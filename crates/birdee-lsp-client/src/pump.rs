//! Reader thread routing server output.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::errors::ClientError;
use crate::jsonrpc::{JsonRpcMessage, JsonRpcResponse, ServerNotification, ServerRequest};
use crate::launcher::ServerOutput;
use crate::session::CLIENT_TARGET;
use crate::trace::{Direction, SharedTrace};
use crate::transport::MessageReader;

const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Messages the session handles on its own control flow.
#[derive(Debug)]
pub(crate) enum Inbound {
    Request(ServerRequest),
    Notification(ServerNotification),
    /// The server's output ended. `error` is set when it ended mid-message.
    Closed { error: Option<String> },
}

#[derive(Default)]
struct Waiters {
    closed: bool,
    by_id: HashMap<i64, Sender<JsonRpcResponse>>,
}

#[derive(Clone, Default)]
struct PendingResponses(Arc<Mutex<Waiters>>);

impl PendingResponses {
    fn lock(&self) -> MutexGuard<'_, Waiters> {
        self.0.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    fn resolve(&self, response: JsonRpcResponse) {
        let waiter = response.id.and_then(|id| self.lock().by_id.remove(&id));
        match waiter {
            Some(sender) => {
                let _ = sender.send(response);
            }
            None => warn!(
                target: CLIENT_TARGET,
                id = ?response.id,
                "dropping response nobody is waiting for"
            ),
        }
    }

    fn close(&self) {
        let mut waiters = self.lock();
        waiters.closed = true;
        waiters.by_id.clear();
    }
}

/// Disconnects every waiter when the reader thread ends, even by unwinding.
struct CloseOnExit(PendingResponses);

impl Drop for CloseOnExit {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Handle on the thread reading the server's stdout.
pub(crate) struct Pump {
    pending: PendingResponses,
    handle: Option<JoinHandle<()>>,
}

impl Pump {
    /// Starts reading `stdout`, sending everything but responses to `inbound`.
    pub(crate) fn spawn(
        stdout: ServerOutput,
        trace: SharedTrace,
        inbound: Sender<Inbound>,
    ) -> Result<Self, ClientError> {
        let pending = PendingResponses::default();
        let reader_pending = pending.clone();
        let handle = thread::Builder::new()
            .name(String::from("birdee-lsp-reader"))
            .spawn(move || {
                let guard = CloseOnExit(reader_pending);
                read_loop(MessageReader::new(stdout), &guard.0, &trace, &inbound);
            })
            .map_err(|source| ClientError::SpawnFailed {
                message: String::from("failed to start the reader thread"),
                source,
            })?;
        Ok(Self {
            pending,
            handle: Some(handle),
        })
    }

    /// Registers interest in the response to request `id`.
    ///
    /// Must be called before the request is written. Once the server's output
    /// has ended the returned receiver is already disconnected.
    pub(crate) fn expect_response(&self, id: i64) -> Receiver<JsonRpcResponse> {
        let (tx, rx) = mpsc::channel();
        let mut waiters = self.pending.lock();
        if !waiters.closed {
            waiters.by_id.insert(id, tx);
        }
        rx
    }

    /// Drops interest in request `id`.
    pub(crate) fn forget(&self, id: i64) {
        self.pending.lock().by_id.remove(&id);
    }

    /// Joins the reader if it finishes within `grace`; otherwise detaches it.
    pub(crate) fn join(mut self, grace: Duration) {
        if let Some(handle) = self.handle.take() {
            join_within(handle, grace, "reader");
        }
    }
}

/// Joins `handle` if the thread finishes within `grace`.
pub(crate) fn join_within(handle: JoinHandle<()>, grace: Duration, name: &str) {
    let deadline = Instant::now() + grace;
    while !handle.is_finished() && Instant::now() < deadline {
        thread::sleep(JOIN_POLL_INTERVAL);
    }
    if handle.is_finished() {
        if handle.join().is_err() {
            warn!(target: CLIENT_TARGET, thread = name, "helper thread panicked");
        }
    } else {
        debug!(
            target: CLIENT_TARGET,
            thread = name,
            "helper thread still blocked, detaching it"
        );
    }
}

fn read_loop(
    mut reader: MessageReader<ServerOutput>,
    pending: &PendingResponses,
    trace: &SharedTrace,
    inbound: &Sender<Inbound>,
) {
    let error = loop {
        let bytes = match reader.receive() {
            Ok(Some(bytes)) => bytes,
            Ok(None) => break None,
            Err(error) => break Some(error.to_string()),
        };
        let message = match JsonRpcMessage::from_bytes(&bytes) {
            Ok(message) => message,
            Err(error) => {
                warn!(
                    target: CLIENT_TARGET,
                    error = %error,
                    "discarding undecodable message from language server"
                );
                continue;
            }
        };
        trace.log_message(Direction::Received, &message.label(), &bytes);
        let forwarded = match message {
            JsonRpcMessage::Response(response) => {
                pending.resolve(response);
                Ok(())
            }
            JsonRpcMessage::ServerRequest(request) => inbound.send(Inbound::Request(request)),
            JsonRpcMessage::Notification(notification) => {
                inbound.send(Inbound::Notification(notification))
            }
        };
        if forwarded.is_err() {
            debug!(target: CLIENT_TARGET, "session gone, reader exiting");
            break None;
        }
    };

    pending.close();
    debug!(target: CLIENT_TARGET, error = ?error, "language server output closed");
    let _ = inbound.send(Inbound::Closed { error });
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor, Read};

    use rstest::rstest;

    use super::*;
    use crate::trace::TraceLevel;
    use crate::transport::MAX_FRAME_LENGTH;

    /// Output whose first read panics the reader thread.
    struct PanickingOutput;

    impl Read for PanickingOutput {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            panic!("server output exploded");
        }
    }

    fn framed(bodies: &[&str]) -> ServerOutput {
        let mut bytes = Vec::new();
        for body in bodies {
            bytes.extend_from_slice(format!("Content-Length: {}\r\n\r\n", body.len()).as_bytes());
            bytes.extend_from_slice(body.as_bytes());
        }
        Box::new(Cursor::new(bytes))
    }

    #[rstest]
    fn routes_responses_and_forwards_the_rest() {
        let output = framed(&[
            r#"{"jsonrpc":"2.0","method":"window/logMessage","params":{"type":3,"message":"hi"}}"#,
            r#"{"jsonrpc":"2.0","id":42,"result":{"ok":true}}"#,
            r#"{"jsonrpc":"2.0","id":9,"method":"workspace/configuration","params":{"items":[]}}"#,
        ]);
        let (tx, rx) = mpsc::channel();
        let pump = Pump::spawn(output, SharedTrace::new(TraceLevel::Off), tx).expect("spawn");
        let response = pump.expect_response(42);

        let reply = response
            .recv_timeout(Duration::from_secs(5))
            .expect("response should be routed");
        assert_eq!(reply.id, Some(42));

        let received: Vec<Inbound> = rx.iter().take(3).collect();
        assert!(matches!(
            received.as_slice(),
            [
                Inbound::Notification(notification),
                Inbound::Request(request),
                Inbound::Closed { error: None },
            ] if notification.method == "window/logMessage"
                && request.method == "workspace/configuration"
        ));
        pump.join(Duration::from_secs(1));
    }

    #[rstest]
    fn closing_disconnects_waiters() {
        let (tx, rx) = mpsc::channel();
        let pump =
            Pump::spawn(framed(&[]), SharedTrace::new(TraceLevel::Off), tx).expect("spawn");

        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(5)),
            Ok(Inbound::Closed { .. })
        ));
        let late = pump.expect_response(7);
        assert!(late.recv_timeout(Duration::from_millis(50)).is_err());
        pump.join(Duration::from_secs(1));
    }

    #[rstest]
    fn truncated_output_reports_an_error() {
        let output: ServerOutput =
            Box::new(Cursor::new(b"Content-Length: 40\r\n\r\n{".to_vec()));
        let (tx, rx) = mpsc::channel();
        let pump = Pump::spawn(output, SharedTrace::new(TraceLevel::Off), tx).expect("spawn");

        let closed = rx.recv_timeout(Duration::from_secs(5)).expect("closed event");
        assert!(matches!(closed, Inbound::Closed { error: Some(_) }));
        pump.join(Duration::from_secs(1));
    }

    #[rstest]
    fn oversized_frame_closes_with_an_error() {
        let header = format!("Content-Length: {}\r\n\r\n", MAX_FRAME_LENGTH + 1);
        let output: ServerOutput = Box::new(Cursor::new(header.into_bytes()));
        let (tx, rx) = mpsc::channel();
        let pump = Pump::spawn(output, SharedTrace::new(TraceLevel::Off), tx).expect("spawn");

        let closed = rx.recv_timeout(Duration::from_secs(5)).expect("closed event");
        assert!(matches!(
            closed,
            Inbound::Closed { error: Some(message) } if message.contains("exceeds")
        ));
        pump.join(Duration::from_secs(1));
    }

    #[rstest]
    fn a_panicking_reader_still_disconnects_waiters() {
        let (tx, rx) = mpsc::channel();
        let pump = Pump::spawn(
            Box::new(PanickingOutput),
            SharedTrace::new(TraceLevel::Off),
            tx,
        )
        .expect("spawn");
        let early = pump.expect_response(1);

        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(5)),
            Err(mpsc::RecvTimeoutError::Disconnected)
        ));
        assert!(matches!(
            early.recv_timeout(Duration::from_secs(1)),
            Err(mpsc::RecvTimeoutError::Disconnected)
        ));
        let late = pump.expect_response(2);
        assert!(matches!(late.try_recv(), Err(mpsc::TryRecvError::Disconnected)));
        pump.join(Duration::from_secs(1));
    }
}

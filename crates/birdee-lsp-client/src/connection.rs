//! A live link to the server: child process, writer and reader threads.

use std::io::{self, BufRead, BufReader};
use std::process::{Child, ExitStatus};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use lsp_types::request::Request;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::errors::{ClientError, TransportError};
use crate::jsonrpc::{JsonRpcNotification, JsonRpcReply, JsonRpcRequest, JsonRpcResponse};
use crate::launcher::{LaunchedServer, ServerInput, ServerOutput};
use crate::lifecycle::terminate_child;
use crate::pump::{Inbound, Pump, join_within};
use crate::session::CLIENT_TARGET;
use crate::trace::{Direction, SharedTrace};
use crate::transport::MessageWriter;

/// Log target carrying the server's stderr.
pub const SERVER_STDERR_TARGET: &str = "birdee_lsp_client::server";

/// A request whose response has not been collected yet.
pub(crate) struct PendingResponse {
    id: i64,
    method: &'static str,
    receiver: Receiver<JsonRpcResponse>,
}

impl PendingResponse {
    /// Returns the result if it has arrived.
    pub(crate) fn try_take(&self) -> Result<Option<Value>, ClientError> {
        match self.receiver.try_recv() {
            Ok(response) => into_result(response).map(Some),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(ClientError::TransportClosed),
        }
    }

    /// Blocks up to `timeout` for the result.
    pub(crate) fn wait(&self, timeout: Duration) -> Result<Value, ClientError> {
        match self.receiver.recv_timeout(timeout) {
            Ok(response) => into_result(response),
            Err(RecvTimeoutError::Timeout) => Err(ClientError::Timeout {
                method: self.method,
                timeout_ms: timeout.as_millis(),
            }),
            Err(RecvTimeoutError::Disconnected) => Err(ClientError::TransportClosed),
        }
    }

    pub(crate) fn id(&self) -> i64 {
        self.id
    }
}

fn into_result(response: JsonRpcResponse) -> Result<Value, ClientError> {
    match response.error {
        Some(error) => Err(ClientError::from_jsonrpc(error)),
        None => Ok(response.result.unwrap_or(Value::Null)),
    }
}

/// Owns the child and both directions of the transport.
pub(crate) struct Connection {
    child: Option<Child>,
    writer: Option<MessageWriter<ServerInput>>,
    pump: Option<Pump>,
    stderr: Option<JoinHandle<()>>,
    inbound: Receiver<Inbound>,
    trace: SharedTrace,
    closed: bool,
    reader_gone: bool,
}

impl Connection {
    /// Starts the helper threads. The child is killed if they cannot start.
    pub(crate) fn open(server: LaunchedServer, trace: SharedTrace) -> Result<Self, ClientError> {
        let LaunchedServer {
            mut child,
            stdout,
            stdin,
            stderr,
        } = server;
        let (tx, inbound) = mpsc::channel();

        let helpers = Pump::spawn(stdout, trace.clone(), tx).and_then(|pump| {
            let drain = stderr.map(spawn_stderr_drain).transpose()?;
            Ok((pump, drain))
        });
        let (pump, stderr) = match helpers {
            Ok(helpers) => helpers,
            Err(error) => {
                if let Some(child) = child.as_mut() {
                    let _ = child.kill();
                    let _ = child.wait();
                }
                return Err(error);
            }
        };

        Ok(Self {
            child,
            writer: Some(MessageWriter::new(stdin)),
            pump: Some(pump),
            stderr,
            inbound,
            trace,
            closed: false,
            reader_gone: false,
        })
    }

    pub(crate) fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    /// Marks the transport as gone; later writes fail with `TransportClosed`.
    pub(crate) fn mark_closed(&mut self) {
        self.closed = true;
    }

    /// Writes a request and returns the handle for its response.
    pub(crate) fn send_request<R: Request>(
        &mut self,
        params: R::Params,
    ) -> Result<PendingResponse, ClientError> {
        let request = JsonRpcRequest::typed::<R>(params)?;
        let pump = self.pump.as_ref().ok_or(ClientError::TransportClosed)?;
        let receiver = pump.expect_response(request.id);
        if let Err(error) = self.write(&request.method, &request) {
            if let Some(pump) = &self.pump {
                pump.forget(request.id);
            }
            return Err(error);
        }
        Ok(PendingResponse {
            id: request.id,
            method: R::METHOD,
            receiver,
        })
    }

    pub(crate) fn send_notification(
        &mut self,
        notification: &JsonRpcNotification,
    ) -> Result<(), ClientError> {
        self.write(&notification.method, notification)
    }

    pub(crate) fn send_reply(&mut self, reply: &JsonRpcReply) -> Result<(), ClientError> {
        let label = format!("reply #{}", reply.id);
        self.write(&label, reply)
    }

    fn write<T: Serialize>(&mut self, label: &str, message: &T) -> Result<(), ClientError> {
        if self.closed {
            return Err(ClientError::TransportClosed);
        }
        let writer = self.writer.as_mut().ok_or(ClientError::TransportClosed)?;
        let bytes = serde_json::to_vec(message)?;
        self.trace.log_message(Direction::Sent, label, &bytes);
        match writer.send(&bytes) {
            Ok(()) => Ok(()),
            Err(TransportError::Io(error)) if error.kind() == io::ErrorKind::BrokenPipe => {
                self.closed = true;
                Err(ClientError::TransportClosed)
            }
            Err(error) => Err(ClientError::Transport(error)),
        }
    }

    /// Next queued request, notification or closure, without blocking.
    ///
    /// A reader thread that dies without announcing it still yields one
    /// [`Inbound::Closed`].
    pub(crate) fn next_inbound(&mut self) -> Option<Inbound> {
        match self.inbound.try_recv() {
            Ok(message) => {
                if matches!(message, Inbound::Closed { .. }) {
                    self.reader_gone = true;
                }
                Some(message)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) if !self.reader_gone => {
                self.reader_gone = true;
                warn!(target: CLIENT_TARGET, "reader thread stopped without closing");
                Some(Inbound::Closed {
                    error: Some(String::from("reader thread stopped")),
                })
            }
            Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Exit status, if the child has already exited.
    pub(crate) fn exit_status(&mut self) -> Option<ExitStatus> {
        self.child
            .as_mut()
            .and_then(|child| child.try_wait().ok().flatten())
    }

    /// Closes stdin, reaps the child within `grace` and joins the helpers.
    ///
    /// The helpers are joined even when reaping fails.
    pub(crate) fn close(mut self, grace: Duration) -> io::Result<Option<ExitStatus>> {
        self.closed = true;
        drop(self.writer.take());
        let status = self
            .child
            .as_mut()
            .map(|child| terminate_child(child, grace))
            .transpose();
        if let Some(pump) = self.pump.take() {
            pump.join(grace);
        }
        if let Some(handle) = self.stderr.take() {
            join_within(handle, grace, "stderr");
        }
        status
    }

    /// Kills the child without any handshake.
    pub(crate) fn abort(&mut self) {
        self.closed = true;
        drop(self.writer.take());
        if let Some(child) = self.child.as_mut() {
            if matches!(child.try_wait(), Ok(None)) {
                warn!(
                    target: CLIENT_TARGET,
                    pid = child.id(),
                    "killing language server without shutdown"
                );
                let _ = child.kill();
            }
            let _ = child.wait();
        }
    }
}

fn spawn_stderr_drain(stderr: ServerOutput) -> Result<JoinHandle<()>, ClientError> {
    thread::Builder::new()
        .name(String::from("birdee-lsp-stderr"))
        .spawn(move || {
            for line in BufReader::new(stderr).lines() {
                match line {
                    Ok(line) => info!(target: SERVER_STDERR_TARGET, "{line}"),
                    Err(error) => {
                        debug!(target: SERVER_STDERR_TARGET, error = %error, "stderr closed");
                        break;
                    }
                }
            }
        })
        .map_err(|source| ClientError::SpawnFailed {
            message: String::from("failed to start the stderr thread"),
            source,
        })
}

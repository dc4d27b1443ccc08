//! In-process language server connected through anonymous pipes.

use std::io;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use birdee_config::ServerLaunchConfig;
use serde_json::{Value, json};

use crate::errors::ClientError;
use crate::launcher::{LaunchedServer, ServerLauncher};
use crate::transport::{MessageReader, MessageWriter};

/// How the fake server answers `initialize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitializeReply {
    /// Answers with an empty capability set.
    #[default]
    Answer,
    /// Answers with a JSON-RPC error.
    Reject,
    /// Never answers.
    Ignore,
}

/// Scripted behaviour of a [`FakeLauncher`]'s server.
#[derive(Debug, Clone)]
pub struct Script {
    /// Reply to `initialize`.
    pub initialize: InitializeReply,
    /// Raw messages sent once `initialized` arrives.
    pub after_initialized: Vec<Value>,
    /// Close both streams right after receiving this method.
    pub crash_after: Option<&'static str>,
    /// Whether `shutdown` is answered.
    pub answer_shutdown: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            initialize: InitializeReply::Answer,
            after_initialized: Vec::new(),
            crash_after: None,
            answer_shutdown: true,
        }
    }
}

/// Messages the fake server received, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    inner: Arc<(Mutex<Vec<Value>>, Condvar)>,
}

impl Recorder {
    fn lock(&self) -> MutexGuard<'_, Vec<Value>> {
        self.inner
            .0
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    fn push(&self, message: Value) {
        self.lock().push(message);
        self.inner.1.notify_all();
    }

    /// Snapshot of everything received so far.
    pub fn messages(&self) -> Vec<Value> {
        self.lock().clone()
    }

    /// Methods received so far; client replies appear as `"<reply>"`.
    pub fn methods(&self) -> Vec<String> {
        self.messages()
            .iter()
            .map(|message| {
                message
                    .get("method")
                    .and_then(Value::as_str)
                    .unwrap_or("<reply>")
                    .to_owned()
            })
            .collect()
    }

    /// Messages carrying `method`.
    pub fn with_method(&self, method: &str) -> Vec<Value> {
        self.messages()
            .into_iter()
            .filter(|message| message.get("method").and_then(Value::as_str) == Some(method))
            .collect()
    }

    /// Blocks until a message satisfies `predicate` or `timeout` elapses.
    pub fn wait_for(&self, timeout: Duration, predicate: impl Fn(&Value) -> bool) -> Option<Value> {
        let deadline = Instant::now() + timeout;
        let mut messages = self.lock();
        loop {
            if let Some(found) = messages.iter().find(|message| predicate(message)) {
                return Some(found.clone());
            }
            let remaining = deadline.checked_duration_since(Instant::now())?;
            messages = self
                .inner
                .1
                .wait_timeout(messages, remaining)
                .unwrap_or_else(|poison| poison.into_inner())
                .0;
        }
    }

    /// Blocks until a message with `method` arrives.
    pub fn wait_for_method(&self, method: &str, timeout: Duration) -> Option<Value> {
        self.wait_for(timeout, |message| {
            message.get("method").and_then(Value::as_str) == Some(method)
        })
    }
}

/// Launcher that runs a scripted server on a thread instead of a process.
#[derive(Debug, Clone, Default)]
pub struct FakeLauncher {
    script: Script,
    recorder: Recorder,
    launches: Arc<Mutex<Vec<Vec<String>>>>,
}

impl FakeLauncher {
    /// Launcher whose server follows `script`.
    pub fn new(script: Script) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }

    /// Handle on the messages the server receives.
    pub fn recorder(&self) -> Recorder {
        self.recorder.clone()
    }

    /// Argument vectors of every launch so far.
    pub fn launches(&self) -> Vec<Vec<String>> {
        self.launches
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }
}

impl ServerLauncher for FakeLauncher {
    fn launch(&self, config: &ServerLaunchConfig) -> Result<LaunchedServer, ClientError> {
        self.launches
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .push(config.args());

        let spawn_failed = |source: io::Error| ClientError::SpawnFailed {
            message: String::from("failed to start fake server"),
            source,
        };
        let (client_reads, server_writes) = io::pipe().map_err(spawn_failed)?;
        let (server_reads, client_writes) = io::pipe().map_err(spawn_failed)?;

        let script = self.script.clone();
        let recorder = self.recorder.clone();
        thread::Builder::new()
            .name(String::from("fake-birdee-server"))
            .spawn(move || {
                serve(
                    &script,
                    &recorder,
                    MessageReader::new(server_reads),
                    MessageWriter::new(server_writes),
                );
            })
            .map_err(spawn_failed)?;

        Ok(LaunchedServer::from_streams(client_reads, client_writes))
    }
}

fn serve<R: io::Read, W: io::Write>(
    script: &Script,
    recorder: &Recorder,
    mut reader: MessageReader<R>,
    mut writer: MessageWriter<W>,
) {
    let mut send = |message: &Value| {
        let bytes = serde_json::to_vec(message).expect("fake server message encodes");
        writer.send(&bytes).is_ok()
    };

    while let Ok(Some(bytes)) = reader.receive() {
        let Ok(message) = serde_json::from_slice::<Value>(&bytes) else {
            continue;
        };
        recorder.push(message.clone());
        let id = message.get("id").cloned().unwrap_or(Value::Null);
        let method = message.get("method").and_then(Value::as_str);

        match method {
            Some("initialize") => match script.initialize {
                InitializeReply::Answer => {
                    send(&json!({"jsonrpc": "2.0", "id": id, "result": {
                        "capabilities": {"textDocumentSync": 1},
                        "serverInfo": {"name": "fake-birdee"}
                    }}));
                }
                InitializeReply::Reject => {
                    send(&json!({"jsonrpc": "2.0", "id": id, "error": {
                        "code": -32603, "message": "cannot analyse workspace"
                    }}));
                }
                InitializeReply::Ignore => {}
            },
            Some("initialized") => {
                for scripted in &script.after_initialized {
                    send(scripted);
                }
            }
            Some("shutdown") if script.answer_shutdown => {
                send(&json!({"jsonrpc": "2.0", "id": id, "result": null}));
            }
            Some("exit") => return,
            _ => {}
        }
        if method.is_some() && method == script.crash_after {
            return;
        }
    }
}

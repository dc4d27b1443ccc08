//! The client session: lifecycle, document sync and configuration sync.

use std::mem;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;

use birdee_config::{BirdeeSettings, DEFAULT_SHUTDOWN_TIMEOUT_MS, ServerLaunchConfig};
use lsp_types::notification::{
    DidChangeConfiguration, DidChangeTextDocument, DidChangeWatchedFiles, DidCloseTextDocument,
    DidOpenTextDocument, DidSaveTextDocument, Exit, Initialized, Notification, SetTrace,
};
use lsp_types::request::{
    Initialize, RegisterCapability, Request, Shutdown, UnregisterCapability,
    WorkspaceConfiguration,
};
use lsp_types::{
    ClientCapabilities, ClientInfo, ConfigurationParams, DidChangeConfigurationParams,
    DidChangeTextDocumentParams, DidChangeWatchedFilesClientCapabilities,
    DidChangeWatchedFilesParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    DidSaveTextDocumentParams, DynamicRegistrationClientCapabilities, FileEvent,
    InitializeParams, InitializeResult, InitializedParams, ServerCapabilities, SetTraceParams,
    TextDocumentClientCapabilities, TextDocumentSyncClientCapabilities,
    WorkspaceClientCapabilities, WorkspaceFolder,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::connection::{Connection, PendingResponse};
use crate::documents::{DocumentSelector, OpenDocuments};
use crate::errors::ClientError;
use crate::jsonrpc::{JsonRpcError, JsonRpcNotification, JsonRpcReply, ServerRequest};
use crate::launcher::{ProcessLauncher, ServerLauncher};
use crate::lifecycle::{EXIT_GRACE_PERIOD, SessionState};
use crate::pump::Inbound;
use crate::trace::{SharedTrace, TraceLevel};
use crate::uri::path_to_uri;
use crate::watch::{FileChange, FileChangeKind, FileWatcher, WatchPattern};

/// Log target for session operations.
pub(crate) const CLIENT_TARGET: &str = "birdee_lsp_client::session";

/// Name reported to the server in `clientInfo`.
pub const CLIENT_NAME: &str = "birdee-lsp-client";

/// Tunables of a [`ClientSession`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Settings synchronised to the server.
    pub settings: BirdeeSettings,
    /// Initial protocol trace level.
    pub trace: TraceLevel,
    /// How long `stop` waits for the `shutdown` response.
    pub shutdown_timeout: Duration,
    /// Documents forwarded to the server.
    pub selector: DocumentSelector,
    /// Whether to watch the workspace root for changes.
    pub watch_files: bool,
    /// Files whose changes are forwarded.
    pub watch_pattern: WatchPattern,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            settings: BirdeeSettings::default(),
            trace: TraceLevel::default(),
            shutdown_timeout: Duration::from_millis(DEFAULT_SHUTDOWN_TIMEOUT_MS),
            selector: DocumentSelector::default(),
            watch_files: true,
            watch_pattern: WatchPattern::default(),
        }
    }
}

/// Something the host should know about, returned by
/// [`ClientSession::process_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The handshake completed and documents flow to the server.
    Ready,
    /// A notification sent by the server.
    Notification {
        /// Notification method.
        method: String,
        /// Notification parameters.
        params: Option<Value>,
    },
    /// The server's output ended while the session was live.
    TransportClosed {
        /// Exit status, if the process had already been reaped.
        exit_status: Option<ExitStatus>,
    },
}

/// Supervises one language server process.
///
/// The session is owned by whoever activated it and is consumed by
/// [`ClientSession::stop`]. All writes to the server happen on the caller's
/// thread; a background reader routes the server's output back.
///
/// # Example
///
/// ```ignore
/// let mut session = ClientSession::new(ClientOptions::default());
/// session.start(&config)?;
/// session.wait_ready(Duration::from_secs(10))?;
/// session.did_open(params)?;
/// session.stop()?;
/// ```
pub struct ClientSession<L = ProcessLauncher> {
    launcher: L,
    options: ClientOptions,
    state: SessionState,
    trace: SharedTrace,
    connection: Option<Connection>,
    initialize: Option<PendingResponse>,
    queued: Vec<JsonRpcNotification>,
    documents: OpenDocuments,
    watcher: Option<FileWatcher>,
    workspace_root: Option<PathBuf>,
    server_capabilities: Option<ServerCapabilities>,
    announce_ready: bool,
    closure_reported: bool,
}

impl ClientSession<ProcessLauncher> {
    /// Creates a session that spawns the compiler as a child process.
    #[must_use]
    pub fn new(options: ClientOptions) -> Self {
        Self::with_launcher(ProcessLauncher, options)
    }
}

impl<L: ServerLauncher> ClientSession<L> {
    /// Creates a session that starts its server through `launcher`.
    #[must_use]
    pub fn with_launcher(launcher: L, options: ClientOptions) -> Self {
        let trace = SharedTrace::new(options.trace);
        let documents = OpenDocuments::new(options.selector.clone());
        Self {
            launcher,
            options,
            state: SessionState::Uninitialized,
            trace,
            connection: None,
            initialize: None,
            queued: Vec::new(),
            documents,
            watcher: None,
            workspace_root: None,
            server_capabilities: None,
            announce_ready: false,
            closure_reported: false,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Current trace level.
    #[must_use]
    pub fn trace_level(&self) -> TraceLevel {
        self.trace.level()
    }

    /// Settings last synchronised (or to be synchronised) to the server.
    #[must_use]
    pub fn settings(&self) -> &BirdeeSettings {
        &self.options.settings
    }

    /// Capabilities announced in the `initialize` response.
    #[must_use]
    pub fn server_capabilities(&self) -> Option<&ServerCapabilities> {
        self.server_capabilities.as_ref()
    }

    /// Process id of the server, when it runs as a child process.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.connection.as_ref().and_then(Connection::pid)
    }

    /// Spawns the server and sends `initialize`.
    ///
    /// Returns as soon as the request is written; the session is then
    /// `Starting`. Use [`Self::poll_ready`], [`Self::wait_ready`] or
    /// [`Self::process_events`] to observe readiness.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::BinaryNotFound`] or [`ClientError::SpawnFailed`]
    /// when the process cannot be started, leaving the session `Stopped`, and
    /// [`ClientError::InvalidState`] when the session was already started.
    pub fn start(&mut self, config: &ServerLaunchConfig) -> Result<(), ClientError> {
        if self.state != SessionState::Uninitialized {
            return Err(ClientError::InvalidState {
                operation: "start",
                state: self.state,
            });
        }
        self.state = SessionState::Starting;

        let connection = self
            .launcher
            .launch(config)
            .and_then(|server| Connection::open(server, self.trace.clone()));
        let connection = match connection {
            Ok(connection) => self.connection.insert(connection),
            Err(error) => return Err(self.fail(error)),
        };
        debug!(
            target: CLIENT_TARGET,
            pid = ?connection.pid(),
            "language server transport open"
        );

        let root = config.workspace_root().as_std_path().to_path_buf();
        let pending = self
            .initialize_params(config)
            .and_then(|params| self.send_initialize(params));
        match pending {
            Ok(pending) => {
                debug!(target: CLIENT_TARGET, id = pending.id(), "initialize sent");
                self.initialize = Some(pending);
            }
            Err(error) => return Err(self.fail(error)),
        }

        if self.options.watch_files {
            self.watcher = FileWatcher::new(&root, self.options.watch_pattern.clone())
                .inspect_err(|error| {
                    warn!(
                        target: CLIENT_TARGET,
                        error = %error,
                        "file watching disabled"
                    );
                })
                .ok();
        }
        self.workspace_root = Some(root);

        info!(
            target: CLIENT_TARGET,
            executable = %config.executable_path(),
            "language server starting"
        );
        Ok(())
    }

    fn send_initialize(
        &mut self,
        params: InitializeParams,
    ) -> Result<PendingResponse, ClientError> {
        self.connection
            .as_mut()
            .ok_or(ClientError::TransportClosed)?
            .send_request::<Initialize>(params)
    }

    #[expect(
        deprecated,
        reason = "the server reads the workspace from rootPath and rootUri"
    )]
    fn initialize_params(
        &self,
        config: &ServerLaunchConfig,
    ) -> Result<InitializeParams, ClientError> {
        let root = config.workspace_root();
        let root_uri = path_to_uri(root.as_std_path())?;
        let name = root.file_name().unwrap_or(root.as_str()).to_owned();
        Ok(InitializeParams {
            process_id: Some(std::process::id()),
            root_path: Some(root.to_string()),
            root_uri: Some(root_uri.clone()),
            initialization_options: Some(self.options.settings.to_section_value()?),
            capabilities: client_capabilities(),
            trace: Some(self.trace.level().into()),
            workspace_folders: Some(vec![WorkspaceFolder {
                uri: root_uri,
                name,
            }]),
            client_info: Some(ClientInfo {
                name: CLIENT_NAME.to_owned(),
                version: Some(env!("CARGO_PKG_VERSION").to_owned()),
            }),
            ..InitializeParams::default()
        })
    }

    /// Checks for the `initialize` response without blocking.
    ///
    /// Completes the handshake when it has arrived and returns whether the
    /// session is `Running`.
    ///
    /// # Errors
    ///
    /// Returns the server's error for a rejected `initialize`,
    /// [`ClientError::TransportClosed`] if the server went away, and
    /// [`ClientError::InvalidState`] outside `Starting` and `Running`. The
    /// session is `Stopped` after the first two.
    pub fn poll_ready(&mut self) -> Result<bool, ClientError> {
        let Some(pending) = self.awaiting_initialize("poll readiness")? else {
            return Ok(true);
        };
        match pending.try_take() {
            Ok(None) => Ok(false),
            Ok(Some(result)) => self.complete_handshake(result).map(|()| true),
            Err(error) => Err(self.initialize_failed(error)),
        }
    }

    /// Blocks up to `timeout` for the handshake to complete.
    ///
    /// # Errors
    ///
    /// As [`Self::poll_ready`], plus [`ClientError::Timeout`] when no response
    /// arrived in time. The session stays `Starting` after a timeout.
    pub fn wait_ready(&mut self, timeout: Duration) -> Result<(), ClientError> {
        let Some(pending) = self.awaiting_initialize("wait for readiness")? else {
            return Ok(());
        };
        match pending.wait(timeout) {
            Ok(result) => self.complete_handshake(result),
            Err(error @ ClientError::Timeout { .. }) => Err(error),
            Err(error) => Err(self.initialize_failed(error)),
        }
    }

    fn awaiting_initialize(
        &self,
        operation: &'static str,
    ) -> Result<Option<&PendingResponse>, ClientError> {
        match (self.state, self.initialize.as_ref()) {
            (SessionState::Running, _) => Ok(None),
            (SessionState::Starting, Some(pending)) => Ok(Some(pending)),
            (state, _) => Err(ClientError::InvalidState { operation, state }),
        }
    }

    fn complete_handshake(&mut self, result: Value) -> Result<(), ClientError> {
        self.initialize = None;
        let capabilities = serde_json::from_value::<InitializeResult>(result)
            .map(|result| result.capabilities)
            .unwrap_or_else(|error| {
                warn!(
                    target: CLIENT_TARGET,
                    error = %error,
                    "unreadable initialize result, assuming no capabilities"
                );
                ServerCapabilities::default()
            });
        self.server_capabilities = Some(capabilities);

        if let Err(error) = self.send_handshake() {
            return Err(self.fail(error));
        }
        self.state = SessionState::Running;
        self.announce_ready = true;
        info!(target: CLIENT_TARGET, "language server ready");
        Ok(())
    }

    fn send_handshake(&mut self) -> Result<(), ClientError> {
        let mut handshake = vec![
            JsonRpcNotification::typed::<Initialized>(InitializedParams {})?,
            JsonRpcNotification::typed::<DidChangeConfiguration>(DidChangeConfigurationParams {
                settings: self.options.settings.to_scoped_value()?,
            })?,
            JsonRpcNotification::typed::<SetTrace>(SetTraceParams {
                value: self.trace.level().into(),
            })?,
        ];
        handshake.append(&mut self.queued);
        let connection = self.connection.as_mut().ok_or(ClientError::TransportClosed)?;
        for notification in &handshake {
            connection.send_notification(notification)?;
        }
        Ok(())
    }

    fn initialize_failed(&mut self, error: ClientError) -> ClientError {
        self.initialize = None;
        self.queued.clear();
        self.state = SessionState::Stopped;
        warn!(
            target: CLIENT_TARGET,
            error = %error,
            "language server failed to initialise"
        );
        error
    }

    /// Tears the session down after a start failure.
    fn fail(&mut self, error: ClientError) -> ClientError {
        if let Some(mut connection) = self.connection.take() {
            connection.abort();
        }
        self.initialize = None;
        self.queued.clear();
        self.watcher = None;
        self.state = SessionState::Stopped;
        warn!(
            target: CLIENT_TARGET,
            error = %error,
            "language server session failed"
        );
        error
    }

    /// Sends `notification` now, or queues it until the handshake completes.
    fn dispatch(
        &mut self,
        notification: JsonRpcNotification,
        operation: &'static str,
    ) -> Result<(), ClientError> {
        match self.state {
            SessionState::Running => self
                .connection
                .as_mut()
                .ok_or(ClientError::TransportClosed)?
                .send_notification(&notification),
            SessionState::Starting => {
                self.queued.push(notification);
                Ok(())
            }
            state => Err(ClientError::InvalidState { operation, state }),
        }
    }

    fn notify<N: Notification>(
        &mut self,
        params: N::Params,
        operation: &'static str,
    ) -> Result<(), ClientError> {
        let notification = JsonRpcNotification::typed::<N>(params)?;
        self.dispatch(notification, operation)
    }

    /// Forwards `textDocument/didOpen` for documents the selector accepts.
    ///
    /// Returns whether the notification was sent (or queued while starting).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidState`] when the session is not live, or
    /// a transport error when the write fails.
    pub fn did_open(&mut self, params: DidOpenTextDocumentParams) -> Result<bool, ClientError> {
        let document = &params.text_document;
        if !self.documents.accepts(&document.uri, &document.language_id) {
            debug!(
                target: CLIENT_TARGET,
                uri = document.uri.as_str(),
                language = %document.language_id,
                "document not selected, not forwarding"
            );
            return Ok(false);
        }
        let uri = document.uri.clone();
        self.notify::<DidOpenTextDocument>(params, "open a document")?;
        self.documents.track(&uri);
        Ok(true)
    }

    /// Forwards `textDocument/didChange` for documents opened on the server.
    ///
    /// # Errors
    ///
    /// As [`Self::did_open`].
    pub fn did_change(
        &mut self,
        params: DidChangeTextDocumentParams,
    ) -> Result<bool, ClientError> {
        if !self.documents.is_tracked(&params.text_document.uri) {
            return Ok(false);
        }
        self.notify::<DidChangeTextDocument>(params, "change a document")?;
        Ok(true)
    }

    /// Forwards `textDocument/didSave` for documents opened on the server.
    ///
    /// # Errors
    ///
    /// As [`Self::did_open`].
    pub fn did_save(&mut self, params: DidSaveTextDocumentParams) -> Result<bool, ClientError> {
        if !self.documents.is_tracked(&params.text_document.uri) {
            return Ok(false);
        }
        self.notify::<DidSaveTextDocument>(params, "save a document")?;
        Ok(true)
    }

    /// Forwards `textDocument/didClose` for documents opened on the server.
    ///
    /// # Errors
    ///
    /// As [`Self::did_open`].
    pub fn did_close(
        &mut self,
        params: DidCloseTextDocumentParams,
    ) -> Result<bool, ClientError> {
        let uri = params.text_document.uri.clone();
        if !self.documents.is_tracked(&uri) {
            return Ok(false);
        }
        self.notify::<DidCloseTextDocument>(params, "close a document")?;
        self.documents.release(&uri);
        Ok(true)
    }

    /// Replaces the settings and pushes them to a running server.
    ///
    /// While starting, the handshake pushes the new settings. Before start or
    /// after stop the settings are only stored.
    ///
    /// # Errors
    ///
    /// Returns a transport or codec error when the push fails.
    pub fn update_settings(&mut self, settings: BirdeeSettings) -> Result<(), ClientError> {
        self.options.settings = settings;
        if !self.state.is_running() {
            return Ok(());
        }
        let scoped = self.options.settings.to_scoped_value()?;
        self.notify::<DidChangeConfiguration>(
            DidChangeConfigurationParams { settings: scoped },
            "update settings",
        )
    }

    /// Forwards a change to `path` if it matches the watch pattern.
    ///
    /// Relative paths, and absolute paths under the workspace root, are matched
    /// relative to the root.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidState`] when the session is not live, or
    /// a transport error when the write fails.
    pub fn notify_file_changed(
        &mut self,
        path: &Path,
        kind: FileChangeKind,
    ) -> Result<bool, ClientError> {
        let absolute = match (&self.workspace_root, path.is_absolute()) {
            (Some(root), false) => root.join(path),
            _ => path.to_path_buf(),
        };
        let relative = self
            .workspace_root
            .as_deref()
            .and_then(|root| absolute.strip_prefix(root).ok())
            .unwrap_or(&absolute);
        if !self.options.watch_pattern.matches(relative) {
            return Ok(false);
        }
        let change = FileChange {
            path: absolute,
            kind,
        };
        self.forward_file_changes(vec![change])?;
        Ok(true)
    }

    fn forward_file_changes(&mut self, changes: Vec<FileChange>) -> Result<(), ClientError> {
        let changes = changes
            .into_iter()
            .map(|change| {
                path_to_uri(&change.path).map(|uri| FileEvent::new(uri, change.kind.into()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.notify::<DidChangeWatchedFiles>(
            DidChangeWatchedFilesParams { changes },
            "forward file changes",
        )
    }

    /// Changes the trace level, telling a running server.
    ///
    /// # Errors
    ///
    /// Returns a transport error when the notification cannot be written.
    pub fn set_trace(&mut self, level: TraceLevel) -> Result<(), ClientError> {
        self.trace.set(level);
        if !self.state.is_running() {
            return Ok(());
        }
        self.notify::<SetTrace>(
            SetTraceParams {
                value: level.into(),
            },
            "set the trace level",
        )
    }

    /// Handles everything the server and the file watcher produced since the
    /// last call.
    ///
    /// Completes a pending handshake, answers server requests and forwards
    /// watched file changes. A reply or change that cannot be written is
    /// logged and dropped; if the write found the transport closed, the
    /// closure is reported as [`SessionEvent::TransportClosed`] and the rest
    /// of the queue is still drained.
    ///
    /// # Errors
    ///
    /// Returns the server's error for a rejected `initialize`.
    pub fn process_events(&mut self) -> Result<Vec<SessionEvent>, ClientError> {
        if self.state == SessionState::Starting {
            match self.poll_ready() {
                Ok(_) | Err(ClientError::TransportClosed) => {}
                Err(error) => return Err(error),
            }
        }

        let mut events = Vec::new();
        if mem::take(&mut self.announce_ready) {
            events.push(SessionEvent::Ready);
        }

        let inbound: Vec<Inbound> = self
            .connection
            .as_mut()
            .map(|connection| std::iter::from_fn(|| connection.next_inbound()).collect())
            .unwrap_or_default();
        for message in inbound {
            match message {
                Inbound::Request(request) => {
                    let method = request.method.clone();
                    if let Err(error) = self.answer(request) {
                        self.write_failed(&method, error, &mut events);
                    }
                }
                Inbound::Notification(notification) => events.push(SessionEvent::Notification {
                    method: notification.method,
                    params: notification.params,
                }),
                Inbound::Closed { error } => events.extend(self.transport_closed(error)),
            }
        }

        let changes = self
            .watcher
            .as_ref()
            .map(FileWatcher::drain)
            .unwrap_or_default();
        let live = matches!(self.state, SessionState::Starting | SessionState::Running);
        if live && !changes.is_empty() {
            if let Err(error) = self.forward_file_changes(changes) {
                self.write_failed(DidChangeWatchedFiles::METHOD, error, &mut events);
            }
        }

        Ok(events)
    }

    fn write_failed(&mut self, method: &str, error: ClientError, events: &mut Vec<SessionEvent>) {
        warn!(
            target: CLIENT_TARGET,
            method,
            error = %error,
            "could not write to the language server"
        );
        if matches!(error, ClientError::TransportClosed) {
            events.extend(self.transport_closed(Some(error.to_string())));
        }
    }

    /// Records the end of the transport. Only the first call yields an event.
    fn transport_closed(&mut self, error: Option<String>) -> Option<SessionEvent> {
        if mem::replace(&mut self.closure_reported, true) {
            return None;
        }
        let exit_status = self.connection.as_mut().and_then(|connection| {
            connection.mark_closed();
            connection.exit_status()
        });
        if matches!(self.state, SessionState::Starting | SessionState::Running) {
            warn!(
                target: CLIENT_TARGET,
                error = ?error,
                ?exit_status,
                "language server transport closed"
            );
            self.initialize = None;
            self.queued.clear();
            self.state = SessionState::Stopped;
        }
        Some(SessionEvent::TransportClosed { exit_status })
    }

    fn answer(&mut self, request: ServerRequest) -> Result<(), ClientError> {
        let ServerRequest { id, method, params } = request;
        let reply = if method == WorkspaceConfiguration::METHOD {
            self.configuration_reply(id, params)?
        } else if method == RegisterCapability::METHOD || method == UnregisterCapability::METHOD {
            debug!(target: CLIENT_TARGET, %method, "acknowledging registration");
            JsonRpcReply::success(id, Value::Null)
        } else {
            warn!(
                target: CLIENT_TARGET,
                %method,
                "rejecting unsupported server request"
            );
            JsonRpcReply::failure(id, JsonRpcError::method_not_found(&method))
        };
        match self.connection.as_mut() {
            Some(connection) if !connection.is_closed() => connection.send_reply(&reply),
            _ => Ok(()),
        }
    }

    fn configuration_reply(
        &self,
        id: Value,
        params: Option<Value>,
    ) -> Result<JsonRpcReply, ClientError> {
        let params = params.unwrap_or(Value::Null);
        let params = match serde_json::from_value::<ConfigurationParams>(params) {
            Ok(params) => params,
            Err(error) => {
                return Ok(JsonRpcReply::failure(
                    id,
                    JsonRpcError::invalid_params(error.to_string()),
                ));
            }
        };
        let values = params
            .items
            .iter()
            .map(|item| self.options.settings.lookup(item.section.as_deref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(JsonRpcReply::success(id, Value::Array(values)))
    }

    /// Shuts the server down and consumes the session.
    ///
    /// Before `start` this is a no-op. Otherwise `shutdown` is sent and awaited
    /// up to the shutdown timeout, followed by `exit`. Stdin is then closed and
    /// the process is given a short grace period before it is killed.
    /// Handshake failures are logged and never prevent teardown.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Teardown`] when the process could not be reaped
    /// after being killed. The session is `Stopped` either way.
    pub fn stop(mut self) -> Result<(), ClientError> {
        self.watcher = None;
        let Some(mut connection) = self.connection.take() else {
            if self.state != SessionState::Uninitialized {
                self.state = SessionState::Stopped;
            }
            debug!(target: CLIENT_TARGET, state = %self.state, "nothing to stop");
            return Ok(());
        };

        let handshake = matches!(self.state, SessionState::Starting | SessionState::Running)
            && !connection.is_closed();
        self.state = SessionState::Stopping;
        self.initialize = None;
        if handshake {
            self.shutdown_handshake(&mut connection);
        }

        let reaped = connection.close(EXIT_GRACE_PERIOD);
        self.state = SessionState::Stopped;
        match reaped {
            Ok(status) => {
                info!(target: CLIENT_TARGET, ?status, "language server stopped");
                Ok(())
            }
            Err(source) => {
                warn!(
                    target: CLIENT_TARGET,
                    error = %source,
                    "language server could not be reaped"
                );
                Err(ClientError::Teardown { source })
            }
        }
    }

    fn shutdown_handshake(&self, connection: &mut Connection) {
        let acknowledged = connection
            .send_request::<Shutdown>(())
            .and_then(|pending| pending.wait(self.options.shutdown_timeout));
        match acknowledged {
            Ok(_) => debug!(target: CLIENT_TARGET, "language server acknowledged shutdown"),
            Err(error) => warn!(
                target: CLIENT_TARGET,
                error = %error,
                "shutdown request failed"
            ),
        }

        let exit = JsonRpcNotification::typed::<Exit>(())
            .map_err(ClientError::from)
            .and_then(|notification| connection.send_notification(&notification));
        if let Err(error) = exit {
            warn!(target: CLIENT_TARGET, error = %error, "exit notification failed");
        }
    }
}

impl<L> Drop for ClientSession<L> {
    fn drop(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.abort();
        }
    }
}

fn client_capabilities() -> ClientCapabilities {
    ClientCapabilities {
        workspace: Some(WorkspaceClientCapabilities {
            configuration: Some(true),
            workspace_folders: Some(true),
            did_change_configuration: Some(DynamicRegistrationClientCapabilities {
                dynamic_registration: Some(true),
            }),
            did_change_watched_files: Some(DidChangeWatchedFilesClientCapabilities {
                dynamic_registration: Some(true),
                relative_pattern_support: Some(false),
            }),
            ..WorkspaceClientCapabilities::default()
        }),
        text_document: Some(TextDocumentClientCapabilities {
            synchronization: Some(TextDocumentSyncClientCapabilities {
                dynamic_registration: Some(false),
                will_save: Some(false),
                will_save_wait_until: Some(false),
                did_save: Some(true),
            }),
            ..TextDocumentClientCapabilities::default()
        }),
        ..ClientCapabilities::default()
    }
}

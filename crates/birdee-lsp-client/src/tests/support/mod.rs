//! Shared fixtures and helpers for session tests.

mod fake_server;

use std::thread;
use std::time::{Duration, Instant};

use birdee_config::{BirdeeSettings, ConfigResolver, MapEnvironment, ServerLaunchConfig};
use camino::Utf8PathBuf;
use lsp_types::{
    DidCloseTextDocumentParams, DidOpenTextDocumentParams, TextDocumentIdentifier,
    TextDocumentItem, Uri,
};
use rstest::fixture;
use tempfile::TempDir;

use crate::session::{ClientOptions, ClientSession, SessionEvent};

pub use fake_server::{FakeLauncher, InitializeReply, Recorder, Script};

/// Upper bound for anything the fake server should do promptly.
pub const PATIENCE: Duration = Duration::from_secs(5);

/// Scratch workspace root.
#[fixture]
pub fn workspace() -> TempDir {
    tempfile::tempdir().expect("failed to create workspace directory")
}

/// Launch configuration rooted at `workspace`.
pub fn launch_config(workspace: &TempDir, settings: &BirdeeSettings) -> ServerLaunchConfig {
    let root = Utf8PathBuf::from_path_buf(workspace.path().to_path_buf())
        .expect("workspace path should be UTF-8");
    let mut settings = settings.clone();
    if settings.compiler_path.is_empty() {
        settings.compiler_path = String::from("/opt/birdee/bin/birdeec");
    }
    ConfigResolver::new("/ext", settings)
        .with_environment(MapEnvironment::new())
        .with_workspace_root(root)
        .resolve()
        .expect("launch configuration should resolve")
}

/// Options without a file watcher, so tests only see scripted traffic.
pub fn quiet_options() -> ClientOptions {
    ClientOptions {
        watch_files: false,
        shutdown_timeout: Duration::from_secs(1),
        ..ClientOptions::default()
    }
}

/// A started session and the handle on its fake server.
pub struct Started {
    /// The session under test.
    pub session: ClientSession<FakeLauncher>,
    /// Messages the server received.
    pub recorder: Recorder,
    /// The launcher, for inspecting launch arguments.
    pub launcher: FakeLauncher,
}

/// Starts a session against a server following `script`.
pub fn start_session(workspace: &TempDir, script: Script, options: ClientOptions) -> Started {
    let launcher = FakeLauncher::new(script);
    let recorder = launcher.recorder();
    let config = launch_config(workspace, &options.settings);
    let mut session = ClientSession::with_launcher(launcher.clone(), options);
    session.start(&config).expect("session should start");
    Started {
        session,
        recorder,
        launcher,
    }
}

/// Starts a session and completes the handshake.
pub fn running_session(workspace: &TempDir, script: Script, options: ClientOptions) -> Started {
    let mut started = start_session(workspace, script, options);
    started
        .session
        .wait_ready(PATIENCE)
        .expect("handshake should complete");
    started
}

/// Calls `process_events` until `done` accepts the collected events.
pub fn process_until(
    session: &mut ClientSession<FakeLauncher>,
    done: impl Fn(&[SessionEvent]) -> bool,
) -> Vec<SessionEvent> {
    let deadline = Instant::now() + PATIENCE;
    let mut events = Vec::new();
    loop {
        events.extend(session.process_events().expect("events should process"));
        if done(&events) || Instant::now() >= deadline {
            return events;
        }
        thread::sleep(Duration::from_millis(10));
    }
}

/// Calls `process_events` until the server has received a matching message.
pub fn process_until_received(
    session: &mut ClientSession<FakeLauncher>,
    recorder: &Recorder,
    predicate: impl Fn(&serde_json::Value) -> bool,
) -> Option<serde_json::Value> {
    let deadline = Instant::now() + PATIENCE;
    loop {
        session.process_events().expect("events should process");
        if let Some(found) = recorder.wait_for(Duration::from_millis(20), &predicate) {
            return Some(found);
        }
        if Instant::now() >= deadline {
            return None;
        }
    }
}

/// Parses a URI literal.
pub fn uri(raw: &str) -> Uri {
    raw.parse().expect("invalid test URI")
}

/// Builds a did-open notification.
pub fn did_open_params(raw_uri: &str, language_id: &str) -> DidOpenTextDocumentParams {
    DidOpenTextDocumentParams {
        text_document: TextDocumentItem {
            uri: uri(raw_uri),
            language_id: language_id.to_owned(),
            version: 1,
            text: String::from("print(\"hello\")\n"),
        },
    }
}

/// Builds a did-close notification.
pub fn did_close_params(raw_uri: &str) -> DidCloseTextDocumentParams {
    DidCloseTextDocumentParams {
        text_document: TextDocumentIdentifier { uri: uri(raw_uri) },
    }
}

/// Whether `message` is a `didOpen` for `raw_uri`.
pub fn is_open_of(message: &serde_json::Value, raw_uri: &str) -> bool {
    message.get("method").and_then(serde_json::Value::as_str) == Some("textDocument/didOpen")
        && message["params"]["textDocument"]["uri"] == raw_uri
}

/// Opens a Birdee sentinel document and checks that nothing mentioning
/// `raw_uri` reached the server before it.
pub fn assert_never_forwarded(started: &mut Started, raw_uri: &str) {
    const SENTINEL: &str = "file:///sentinel/after.bdm";
    let opened = started
        .session
        .did_open(did_open_params(SENTINEL, "Birdee"))
        .expect("sentinel open should succeed");
    assert!(opened, "sentinel should be forwarded");
    started
        .recorder
        .wait_for(PATIENCE, |message| is_open_of(message, SENTINEL))
        .expect("sentinel should reach the server");

    let leaked: Vec<_> = started
        .recorder
        .messages()
        .into_iter()
        .filter(|message| message.to_string().contains(raw_uri))
        .collect();
    assert!(leaked.is_empty(), "unexpected messages for {raw_uri}: {leaked:?}");
}

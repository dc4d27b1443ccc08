//! Stub servers and fixtures shared by the host tests.

use std::io::{self, Cursor, PipeWriter, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use birdee_config::{BirdeeSettings, ServerLaunchConfig};
use birdee_lsp_client::transport::MessageReader;
use birdee_lsp_client::{ClientError, LaunchedServer, ServerLauncher};
use camino::{Utf8Path, Utf8PathBuf};
use rstest::fixture;
use tempfile::TempDir;

use crate::activation::HostOptions;
use crate::shutdown::ShutdownSignal;

/// Executable configured through `compilerPath` in most tests.
pub(crate) const COMPILER: &str = "/opt/birdee/bin/birdeec";

#[fixture]
pub(crate) fn workspace() -> TempDir {
    tempfile::tempdir().expect("failed to create workspace directory")
}

pub(crate) fn utf8_path(workspace: &TempDir) -> &Utf8Path {
    Utf8Path::from_path(workspace.path()).expect("temporary directory should be UTF-8")
}

/// Options for one workspace, a configured compiler and a short shutdown
/// budget.
pub(crate) fn host_options(workspace: &TempDir) -> HostOptions {
    let root = utf8_path(workspace);
    HostOptions {
        settings: BirdeeSettings {
            compiler_path: String::from(COMPILER),
            ..BirdeeSettings::default()
        },
        shutdown_timeout: Duration::from_millis(50),
        watch_files: false,
        ..HostOptions::new(root, root)
    }
}

/// Collects what the client writes to the server's stdin.
#[derive(Clone, Default)]
struct SharedWriter(Arc<Mutex<Vec<u8>>>);

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct StubRecord {
    executables: Mutex<Vec<Utf8PathBuf>>,
    written: SharedWriter,
    open_pipes: Mutex<Vec<PipeWriter>>,
}

/// A server that never answers. With `exits` set its output ends at once,
/// as if the process died during startup.
#[derive(Clone, Default)]
pub(crate) struct StubServer {
    exits: bool,
    record: Arc<StubRecord>,
}

impl StubServer {
    pub(crate) fn silent() -> Self {
        Self::default()
    }

    pub(crate) fn exiting() -> Self {
        Self {
            exits: true,
            ..Self::default()
        }
    }

    /// Executables the host asked this stub to launch.
    pub(crate) fn launches(&self) -> Vec<Utf8PathBuf> {
        self.record
            .executables
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    /// Methods of every framed message the client wrote, in order.
    pub(crate) fn received_methods(&self) -> Vec<String> {
        let bytes = self
            .record
            .written
            .0
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone();
        let mut reader = MessageReader::new(Cursor::new(bytes));
        let mut methods = Vec::new();
        while let Some(body) = reader.receive().expect("client wrote a malformed frame") {
            let message: serde_json::Value =
                serde_json::from_slice(&body).expect("client wrote invalid JSON");
            if let Some(method) = message.get("method").and_then(serde_json::Value::as_str) {
                methods.push(String::from(method));
            }
        }
        methods
    }
}

impl ServerLauncher for StubServer {
    fn launch(&self, config: &ServerLaunchConfig) -> Result<LaunchedServer, ClientError> {
        self.record
            .executables
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .push(config.executable_path().to_path_buf());
        let stdin = self.record.written.clone();
        if self.exits {
            return Ok(LaunchedServer::from_streams(io::empty(), stdin));
        }
        let (stdout, keep_open) = io::pipe().map_err(|source| ClientError::SpawnFailed {
            message: String::from("failed to create stub pipe"),
            source,
        })?;
        self.record
            .open_pipes
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .push(keep_open);
        Ok(LaunchedServer::from_streams(stdout, stdin))
    }
}

/// Requests shutdown after a fixed number of polls.
pub(crate) struct AfterPolls(pub(crate) usize);

impl ShutdownSignal for AfterPolls {
    fn requested(&mut self) -> bool {
        if self.0 == 0 {
            return true;
        }
        self.0 -= 1;
        false
    }
}

/// Asserts that `first` was written before `second`.
pub(crate) fn assert_ordered(methods: &[String], first: &str, second: &str) {
    let index_of = |method: &str| methods.iter().position(|candidate| candidate == method);
    assert!(
        matches!((index_of(first), index_of(second)), (Some(a), Some(b)) if a < b),
        "expected {first} before {second}: {methods:?}"
    );
}

//! Spawning the language server.

use std::io::{self, Read, Write};
use std::process::{Child, Command, Stdio};

use birdee_config::ServerLaunchConfig;
use tracing::debug;

use crate::errors::ClientError;
use crate::session::CLIENT_TARGET;

/// Boxed stream the transport reads from.
pub type ServerOutput = Box<dyn Read + Send>;
/// Boxed stream the transport writes to.
pub type ServerInput = Box<dyn Write + Send>;

/// Streams of a started server and, for real processes, the child handle.
pub struct LaunchedServer {
    pub(crate) child: Option<Child>,
    pub(crate) stdout: ServerOutput,
    pub(crate) stdin: ServerInput,
    pub(crate) stderr: Option<ServerOutput>,
}

impl LaunchedServer {
    /// Takes ownership of a spawned child with piped standard streams.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::SpawnFailed`] when stdin or stdout was not
    /// piped. The child is killed in that case.
    pub fn from_child(mut child: Child) -> Result<Self, ClientError> {
        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (Some(stdin), Some(stdout)) = (stdin, stdout) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ClientError::SpawnFailed {
                message: String::from("failed to capture stdio"),
                source: io::Error::other("stdin or stdout not piped"),
            });
        };
        Ok(Self {
            child: Some(child),
            stdout: Box::new(stdout),
            stdin: Box::new(stdin),
            stderr: stderr.map(|stream| Box::new(stream) as ServerOutput),
        })
    }

    /// Wraps in-process streams. Used by hosts that embed a server and by tests.
    #[must_use]
    pub fn from_streams(
        stdout: impl Read + Send + 'static,
        stdin: impl Write + Send + 'static,
    ) -> Self {
        Self {
            child: None,
            stdout: Box::new(stdout),
            stdin: Box::new(stdin),
            stderr: None,
        }
    }

    /// Process id of the child, if there is one.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }
}

/// Starts a server for a resolved launch configuration.
pub trait ServerLauncher {
    /// Launches the server.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::BinaryNotFound`] or [`ClientError::SpawnFailed`].
    fn launch(&self, config: &ServerLaunchConfig) -> Result<LaunchedServer, ClientError>;
}

/// Launches the compiler as a child process with piped stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessLauncher;

impl ServerLauncher for ProcessLauncher {
    fn launch(&self, config: &ServerLaunchConfig) -> Result<LaunchedServer, ClientError> {
        let executable = config.executable_path();
        let args = config.args();
        debug!(
            target: CLIENT_TARGET,
            command = %executable,
            args = ?args,
            "spawning language server process"
        );

        let mut command = Command::new(executable.as_std_path());
        command
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if config.workspace_root().is_dir() {
            command.current_dir(config.workspace_root());
        }

        let child = command.spawn().map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ClientError::BinaryNotFound {
                    command: executable.to_string(),
                    source,
                }
            } else {
                ClientError::SpawnFailed {
                    message: format!("failed to start {executable}"),
                    source,
                }
            }
        })?;

        debug!(
            target: CLIENT_TARGET,
            pid = child.id(),
            "language server process spawned"
        );
        LaunchedServer::from_child(child)
    }
}

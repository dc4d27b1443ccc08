//! Failures of the client and its transport.

use std::io;

use birdee_config::ConfigError;
use thiserror::Error;

use crate::jsonrpc::JsonRpcError;
use crate::lifecycle::SessionState;

/// Errors raised while supervising the Birdee server.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The compiler executable does not exist.
    #[error("Birdee compiler not found at '{command}'")]
    BinaryNotFound {
        /// Executable that was spawned.
        command: String,
        /// Error reported by the operating system.
        #[source]
        source: io::Error,
    },

    /// The process or one of its helper threads could not be started.
    #[error("could not start the Birdee server: {message}")]
    SpawnFailed {
        /// What was being started.
        message: String,
        /// Error reported by the operating system.
        #[source]
        source: io::Error,
    },

    /// The killed server process could not be reaped.
    #[error("could not reap the Birdee server: {source}")]
    Teardown {
        /// Error reported by the operating system.
        #[source]
        source: io::Error,
    },

    /// Framing failed on the server's pipes.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A message could not be encoded or decoded.
    #[error("malformed JSON-RPC payload: {0}")]
    Codec(#[from] serde_json::Error),

    /// The settings section could not be encoded.
    #[error(transparent)]
    Settings(#[from] ConfigError),

    /// The server answered a request with an error.
    #[error("server rejected the request: {message} (code {code})")]
    ServerError {
        /// JSON-RPC error code.
        code: i64,
        /// Message supplied by the server.
        message: String,
    },

    /// The server did not answer in time.
    #[error("no response to `{method}` within {timeout_ms}ms")]
    Timeout {
        /// Method that went unanswered.
        method: &'static str,
        /// Time waited, in milliseconds.
        timeout_ms: u128,
    },

    /// The process exited or its pipes closed.
    #[error("language server transport closed")]
    TransportClosed,

    /// The operation is not valid in the session's current state.
    #[error("cannot {operation} while the session is {state}")]
    InvalidState {
        /// Operation that was attempted.
        operation: &'static str,
        /// State the session was in.
        state: SessionState,
    },

    /// A path could not be expressed as a `file://` URI.
    #[error("cannot convert '{path}' to a file URI")]
    Uri {
        /// Offending path.
        path: String,
    },

    /// The file system watcher could not be installed.
    #[error("failed to watch '{path}': {source}")]
    Watcher {
        /// Directory being watched.
        path: String,
        /// Underlying watcher error.
        #[source]
        source: notify::Error,
    },
}

impl ClientError {
    /// Converts the error object of a failed response.
    #[must_use]
    pub fn from_jsonrpc(error: JsonRpcError) -> Self {
        let JsonRpcError { code, message, .. } = error;
        Self::ServerError { code, message }
    }
}

/// Errors of the `Content-Length` framing layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Reading or writing a pipe failed, or a frame was cut short.
    #[error("pipe I/O failed: {0}")]
    Io(#[from] io::Error),

    /// A header block ended without `Content-Length`.
    #[error("frame has no Content-Length header")]
    MissingContentLength,

    /// A header line was not `name: value`, or the length was not a number.
    #[error("malformed frame header")]
    InvalidHeader,

    /// The announced body is larger than the reader accepts.
    #[error("frame of {length} bytes exceeds the {limit} byte limit")]
    FrameTooLarge {
        /// Announced `Content-Length`.
        length: usize,
        /// Largest accepted body.
        limit: usize,
    },
}

//! Errors raised while resolving the server launch configuration.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors surfaced by [`crate::ConfigResolver`].
///
/// All variants abort activation: the host reports them to the user instead
/// of spawning a process that cannot work.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither `compilerPath` nor the environment fallback is available.
    #[error(
        "the Birdee compiler path is not configured: set `compilerPath` or the {variable} environment variable"
    )]
    MissingExecutable {
        /// Environment variable consulted as the fallback.
        variable: &'static str,
    },

    /// The host did not provide any workspace root.
    #[error("no workspace folder is open; the cache directory cannot be resolved")]
    MissingWorkspaceRoot,

    /// A relative path could not be made absolute.
    #[error("failed to make '{path}' absolute: {source}")]
    Absolutise {
        /// Path that was being resolved.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A resolved path is not valid UTF-8.
    #[error("path '{path}' is not valid UTF-8")]
    NonUtf8Path {
        /// Lossy rendering of the offending path.
        path: String,
    },

    /// The settings section could not be decoded or encoded.
    #[error("invalid `{section}` settings: {source}")]
    Settings {
        /// Settings section name.
        section: &'static str,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

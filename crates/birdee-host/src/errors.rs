//! Errors surfaced by the host.

use std::io;

use birdee_config::ConfigError;
use birdee_lsp_client::ClientError;
use camino::Utf8PathBuf;
use thiserror::Error;

use crate::shutdown::ShutdownError;
use crate::telemetry::TelemetryError;

/// Errors that end the host.
#[derive(Debug, Error)]
pub enum HostError {
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The settings file could not be read.
    #[error("failed to read settings file '{path}': {source}")]
    SettingsFile {
        /// Path given on the command line.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Settings or launch configuration could not be resolved.
    #[error("invalid language server configuration: {source}")]
    Configuration {
        /// Underlying resolver error.
        #[source]
        source: ConfigError,
    },
    /// Installing the shutdown signal handlers failed.
    #[error("failed to listen for shutdown signals: {source}")]
    Signal {
        /// Underlying signal error.
        #[source]
        source: ShutdownError,
    },
    /// The language server could not be started.
    #[error("failed to start the Birdee language server: {source}")]
    Launch {
        /// Underlying client error.
        #[source]
        source: ClientError,
    },
    /// The running session failed.
    #[error("language server session failed: {source}")]
    Session {
        /// Underlying client error.
        #[source]
        source: ClientError,
    },
}

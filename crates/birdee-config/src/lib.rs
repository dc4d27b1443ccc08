//! Launch configuration for the Birdee language server.
//!
//! The crate gathers everything needed to start `birdeec` in server mode: the
//! executable (an explicit `compilerPath` setting, falling back to
//! `$BIRDEE_HOME/bin/birdeec`), the bundled analysis entry script, and the
//! cache directory rooted in the active workspace. The result is an immutable
//! [`ServerLaunchConfig`] that the client crate spawns without performing any
//! further lookups.

#![deny(missing_docs)]

mod defaults;
mod environment;
mod error;
mod launch;
mod logging;
mod resolver;
mod settings;

pub use defaults::{
    BIRDEE_HOME_VAR, CACHE_FLAG, DEFAULT_LOG_FILTER, DEFAULT_SHUTDOWN_TIMEOUT_MS,
    ENTRY_SCRIPT_RELATIVE_PATH, INPUT_FLAG, LANGUAGE_ID, OUTPUT_FLAG, OUTPUT_PLACEHOLDER,
    SERVER_BINARY_NAME, SETTINGS_SECTION, SILENT_FLAG, WATCH_GLOB, default_log_filter,
    default_log_format, server_binary_name,
};
pub use environment::{Environment, MapEnvironment, SystemEnvironment};
pub use error::ConfigError;
pub use launch::ServerLaunchConfig;
pub use logging::{LogFormat, LogFormatParseError};
pub use resolver::{ConfigResolver, resolve_cache_directory, resolve_executable};
pub use settings::BirdeeSettings;

//! Built-in values and platform-dependent names.

use std::env::consts::EXE_SUFFIX;

/// Settings section synchronised with the server.
pub const SETTINGS_SECTION: &str = "birdeeLanguageServer";

/// Environment variable naming the Birdee installation root.
pub const BIRDEE_HOME_VAR: &str = "BIRDEE_HOME";

/// File stem of the compiler binary under `$BIRDEE_HOME/bin`.
pub const SERVER_BINARY_NAME: &str = "birdeec";

/// Analysis entry script bundled with the extension, relative to its root.
pub const ENTRY_SCRIPT_RELATIVE_PATH: &str = "src/BirdeeLSP.py";

/// Puts the compiler into silent server mode.
pub const SILENT_FLAG: &str = "-s";

/// Precedes the entry script path.
pub const INPUT_FLAG: &str = "-i";

/// Precedes the output artefact name.
pub const OUTPUT_FLAG: &str = "-o";

/// Output artefact name expected by the compiler's command line parser.
///
/// The server never writes it; the compiler merely requires the flag.
pub const OUTPUT_PLACEHOLDER: &str = "111.obj";

/// Precedes the cache directory path.
pub const CACHE_FLAG: &str = "-l";

/// Language identifier of documents handled by the server.
pub const LANGUAGE_ID: &str = "Birdee";

/// Auxiliary control files whose changes are forwarded to the server.
pub const WATCH_GLOB: &str = "**/.clientrc";

/// Default log filter expression used by the host.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Time allowed for the server to answer `shutdown` before it is terminated.
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 2_000;

/// Default log filter expression used by the host.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format for the host.
#[must_use]
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Platform-specific file name of the compiler binary.
#[must_use]
pub fn server_binary_name() -> String {
    format!("{SERVER_BINARY_NAME}{EXE_SUFFIX}")
}

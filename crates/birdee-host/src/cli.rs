//! Command-line interface of the host binary.

use birdee_config::{DEFAULT_LOG_FILTER, DEFAULT_SHUTDOWN_TIMEOUT_MS, LogFormat};
use camino::Utf8PathBuf;
use clap::Parser;

/// Runs the Birdee language server for a workspace until interrupted.
#[derive(Parser, Debug)]
#[command(name = "birdee-host", version)]
pub(crate) struct Cli {
    /// Workspace folder. Repeatable; the first one anchors the cache directory.
    #[arg(long = "workspace", value_name = "DIR")]
    pub(crate) workspaces: Vec<Utf8PathBuf>,
    /// Root of the extension bundle holding `src/BirdeeLSP.py`.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub(crate) extension_root: Utf8PathBuf,
    /// JSON file with the `birdeeLanguageServer` settings section.
    #[arg(long, value_name = "FILE")]
    pub(crate) settings: Option<Utf8PathBuf>,
    /// Tracing filter expression.
    #[arg(long, value_name = "EXPR", default_value = DEFAULT_LOG_FILTER)]
    pub(crate) log_filter: String,
    /// Log output format (`json` or `compact`).
    #[arg(long, value_name = "FORMAT", default_value_t = LogFormat::Json)]
    pub(crate) log_format: LogFormat,
    /// How long the server may take to answer `shutdown`.
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_SHUTDOWN_TIMEOUT_MS)]
    pub(crate) shutdown_timeout_ms: u64,
    /// Do not forward `.clientrc` changes from the workspace.
    #[arg(long)]
    pub(crate) no_watch: bool,
}

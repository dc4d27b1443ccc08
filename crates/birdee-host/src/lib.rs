//! Host process for the Birdee language server.
//!
//! Stands in for an editor: it activates a [`ClientSession`] for the given
//! workspace, services its events on the main thread and deactivates it when a
//! termination signal arrives. The sequence is:
//!
//! 1. parse the command line and install telemetry;
//! 2. read the `birdeeLanguageServer` settings file, if any;
//! 3. resolve the launch configuration and start `birdeec -s`;
//! 4. poll session events until `SIGTERM`/`SIGINT` or server exit;
//! 5. send `shutdown` and `exit`, then reap the process.
//!
//! [`ClientSession`]: birdee_lsp_client::ClientSession

mod activation;
mod cli;
mod errors;
mod shutdown;
mod supervise;
mod telemetry;

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;

pub use activation::{Activation, HostOptions, load_settings};
pub use errors::HostError;
pub use shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};
pub use supervise::{Outcome, POLL_INTERVAL, supervise};
pub use telemetry::{TelemetryError, TelemetryHandle, initialise as initialise_telemetry};

use crate::cli::Cli;

/// Log target for host events.
pub(crate) const HOST_TARGET: &str = "birdee_host";

/// Runs the host with the provided arguments and output streams.
///
/// Usage errors and failures are written to `stderr`; help and version text
/// go to `stdout`.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) if is_informational(&error) => {
            let _ = write!(stdout, "{error}");
            return ExitCode::SUCCESS;
        }
        Err(error) => {
            let _ = write!(stderr, "{error}");
            return ExitCode::FAILURE;
        }
    };

    match host(&cli) {
        Ok(Outcome::ShutdownRequested) => ExitCode::SUCCESS,
        Ok(Outcome::ServerExited) => {
            let _ = writeln!(stderr, "birdee-host: the language server exited unexpectedly");
            ExitCode::FAILURE
        }
        Err(error) => {
            let _ = writeln!(stderr, "birdee-host: {error}");
            ExitCode::FAILURE
        }
    }
}

fn is_informational(error: &clap::Error) -> bool {
    matches!(
        error.kind(),
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
    )
}

fn host(cli: &Cli) -> Result<Outcome, HostError> {
    telemetry::initialise(&cli.log_filter, cli.log_format)
        .map_err(|source| HostError::Telemetry { source })?;
    let options = HostOptions::from_cli(cli)?;
    let mut shutdown =
        SystemShutdownSignal::install().map_err(|source| HostError::Signal { source })?;
    let mut activation = Activation::activate(&options)?;

    let outcome = supervise(&mut activation, &mut shutdown, POLL_INTERVAL);
    let deactivated = activation.deactivate();
    let finished = outcome?;
    deactivated?;
    Ok(finished)
}

#[cfg(test)]
mod tests;

//! Entry point for the `birdee-host` binary.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Unlocked handles: helper threads log to stderr while the host runs.
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    birdee_host::run(std::env::args_os(), &mut stdout, &mut stderr)
}

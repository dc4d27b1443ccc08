//! Client and process supervisor for the Birdee language server.
//!
//! A [`ClientSession`] spawns `birdeec` in server mode from a resolved
//! [`birdee_config::ServerLaunchConfig`], speaks JSON-RPC over the child's
//! standard streams, and shuts it down with the `shutdown`/`exit` handshake.
//! Between those points it forwards Birdee documents, keeps the
//! `birdeeLanguageServer` settings in sync and reports changes to
//! `.clientrc` files.
//!
//! All writes happen on the owner's thread. A reader thread routes responses
//! to waiting requests and queues everything else until the owner calls
//! [`ClientSession::process_events`].

#![deny(missing_docs)]

mod connection;
mod documents;
mod errors;
pub mod jsonrpc;
mod launcher;
mod lifecycle;
mod pump;
mod session;
mod trace;
pub mod transport;
mod uri;
mod watch;

#[cfg(test)]
mod tests;

pub use connection::SERVER_STDERR_TARGET;
pub use documents::DocumentSelector;
pub use errors::{ClientError, TransportError};
pub use launcher::{LaunchedServer, ProcessLauncher, ServerInput, ServerLauncher, ServerOutput};
pub use lifecycle::{EXIT_GRACE_PERIOD, SessionState};
pub use session::{CLIENT_NAME, ClientOptions, ClientSession, SessionEvent};
pub use trace::{TRACE_TARGET, TraceLevel};
pub use uri::{path_to_uri, uri_scheme, uri_to_path};
pub use watch::{FileChange, FileChangeKind, FileWatcher, WatchPattern};

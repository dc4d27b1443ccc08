//! Protocol trace level and message logging.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use lsp_types::TraceValue;
use tracing::info;

/// Log target carrying traced protocol messages.
pub const TRACE_TARGET: &str = "birdee_lsp_client::trace";

/// How much of the protocol traffic is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceLevel {
    /// Nothing is traced.
    Off,
    /// Method names and ids only.
    Messages,
    /// Messages with their payloads.
    #[default]
    Verbose,
}

impl TraceLevel {
    fn to_raw(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Messages => 1,
            Self::Verbose => 2,
        }
    }

    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Off,
            1 => Self::Messages,
            _ => Self::Verbose,
        }
    }
}

impl From<TraceLevel> for TraceValue {
    fn from(level: TraceLevel) -> Self {
        match level {
            TraceLevel::Off => Self::Off,
            TraceLevel::Messages => Self::Messages,
            TraceLevel::Verbose => Self::Verbose,
        }
    }
}

/// Direction of a traced message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Sent,
    Received,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Received => "received",
        }
    }
}

/// Trace level shared between the session and its reader thread.
#[derive(Debug, Clone)]
pub(crate) struct SharedTrace(Arc<AtomicU8>);

impl SharedTrace {
    pub(crate) fn new(level: TraceLevel) -> Self {
        Self(Arc::new(AtomicU8::new(level.to_raw())))
    }

    pub(crate) fn level(&self) -> TraceLevel {
        TraceLevel::from_raw(self.0.load(Ordering::Relaxed))
    }

    pub(crate) fn set(&self, level: TraceLevel) {
        self.0.store(level.to_raw(), Ordering::Relaxed);
    }

    pub(crate) fn log_message(&self, direction: Direction, label: &str, payload: &[u8]) {
        match self.level() {
            TraceLevel::Off => {}
            TraceLevel::Messages => info!(
                target: TRACE_TARGET,
                direction = direction.as_str(),
                message = label,
                "lsp message"
            ),
            TraceLevel::Verbose => info!(
                target: TRACE_TARGET,
                direction = direction.as_str(),
                message = label,
                payload = %String::from_utf8_lossy(payload),
                "lsp message"
            ),
        }
    }
}

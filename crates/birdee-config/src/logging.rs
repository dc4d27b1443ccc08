//! Log output layout selected on the host's command line.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How the host renders tracing events on stderr.
///
/// Parsing is case-insensitive, so `--log-format COMPACT` is accepted.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, with fields flattened.
    #[default]
    Json,
    /// Single-line text for terminals.
    Compact,
}

/// Error returned when text names no [`LogFormat`].
pub type LogFormatParseError = strum::ParseError;

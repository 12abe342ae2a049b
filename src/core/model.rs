// logdyn-viewer - core/model.rs
//
// Core data model types. Pure data definitions with no I/O, no UI,
// no host dependencies.
//
// These types are the shared vocabulary across all layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Log Record (normalised)
// =============================================================================

/// A single normalised log event.
///
/// Produced by `core::wire::normalize` and immutable afterwards: the level is
/// upper-case and the timestamp is always populated. Records have no identity
/// beyond insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Upper-case level name (`INFO`, `WARNING`, `UNKNOWN`, ...).
    pub level: String,

    /// Message text exactly as received (unescaped).
    pub message: String,

    /// Epoch milliseconds.
    pub timestamp: i64,

    /// HTTP session the record belongs to, when the server supplied one.
    #[serde(
        rename = "sessionId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub session_id: Option<String>,
}

impl LogRecord {
    /// Timestamp as a UTC date-time. `None` when the value is outside the
    /// range chrono can represent.
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

// =============================================================================
// Known levels
// =============================================================================

/// Level names understood by both ends of the channel, with their numeric
/// values, ordered from most to least severe.
///
/// The numeric values follow `java.util.logging.Level`, extended with the
/// `ERROR` and `WARN` names browsers use.
pub const KNOWN_LEVELS: &[(&str, i32)] = &[
    ("OFF", i32::MAX),
    ("SEVERE", 1000),
    ("ERROR", 950),
    ("WARNING", 900),
    ("WARN", 850),
    ("INFO", 800),
    ("CONFIG", 700),
    ("FINE", 500),
    ("FINER", 400),
    ("FINEST", 300),
    ("ALL", i32::MIN),
];

/// Name of the known level with exactly this numeric value.
pub fn level_name_for_value(value: i64) -> Option<&'static str> {
    KNOWN_LEVELS
        .iter()
        .find(|(_, known)| i64::from(*known) == value)
        .map(|(name, _)| *name)
}

// =============================================================================
// Console method
// =============================================================================

/// Console method a record is mirrored through, selected by level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsoleMethod {
    Info,
    Warn,
    Error,
    Log,
}

impl ConsoleMethod {
    /// Select the console method for an upper-case level name.
    pub fn for_level(level: &str) -> Self {
        match level {
            "INFO" => Self::Info,
            "WARN" | "WARNING" => Self::Warn,
            "ERROR" | "SEVERE" => Self::Error,
            _ => Self::Log,
        }
    }

    /// Lower-case method name as it appears on a browser console.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Log => "log",
        }
    }
}

// =============================================================================
// Channel lifecycle
// =============================================================================

/// Events a channel implementation feeds into the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The connection was established.
    Opened,

    /// A text message arrived.
    Message(String),

    /// The connection was closed by either side.
    Closed { code: u16, reason: String },

    /// The connection failed.
    Failed(String),
}

/// Connection state tracked by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    /// Created but not yet reported open.
    #[default]
    Connecting,
    Open,
    Closed,
}

/// Lifecycle transitions surfaced to the host, distinct from log records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Opened { handshake_sent: bool },
    Closed { code: u16, reason: String },
    Failed { reason: String },
}

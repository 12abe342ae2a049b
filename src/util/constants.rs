// logdyn-viewer - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "logdyn-viewer";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "logdyn-viewer";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Wire format
// =============================================================================

/// JSON key of the record level.
pub const LEVEL_LABEL: &str = "level";

/// JSON key of the record message.
pub const MESSAGE_LABEL: &str = "message";

/// JSON key of the record timestamp (epoch milliseconds).
pub const TIMESTAMP_LABEL: &str = "timestamp";

/// JSON key of the optional HTTP session id carried by a record.
pub const SESSION_ID_LABEL: &str = "sessionId";

/// JSON key of the one-time handshake sent when the channel opens.
pub const HANDSHAKE_SESSION_LABEL: &str = "httpSessionId";

/// Keys tried, in order, when the level arrives as an object.
pub const LEVEL_OBJECT_KEYS: &[&str] = &["name", "intValue", "localName"];

/// Level assigned to records that arrive without a usable level.
pub const UNKNOWN_LEVEL: &str = "UNKNOWN";

// =============================================================================
// Channel
// =============================================================================

/// Default path of the logging endpoint on the serving host.
pub const DEFAULT_ENDPOINT_PATH: &str = "/logdyn/LoggingEndpoint";

/// Maximum accepted length of a configured endpoint path.
pub const MAX_ENDPOINT_PATH_LENGTH: usize = 1_024;

/// Maximum accepted length of a configured session id.
pub const MAX_SESSION_ID_LENGTH: usize = 256;

// =============================================================================
// Surfaces and filtering
// =============================================================================

/// Name of the surface created when configuration names none.
pub const DEFAULT_SURFACE_NAME: &str = "logElement";

/// Maximum number of display surfaces a renderer manages.
pub const MAX_SURFACES: usize = 16;

/// Maximum length of a surface name.
pub const MAX_SURFACE_NAME_LENGTH: usize = 128;

/// Maximum filter pattern length compiled as a regex. Longer patterns are
/// matched literally.
pub const MAX_FILTER_PATTERN_LENGTH: usize = 4_096;

/// Compiled size limit for filter regexes (bytes).
pub const FILTER_REGEX_SIZE_LIMIT: usize = 1024 * 1024;

/// strftime pattern for the human-readable timestamp label.
pub const LOCAL_TIME_FORMAT: &str = "%H:%M:%S";

// =============================================================================
// Native replay
// =============================================================================

/// Maximum length of a single inbound message line accepted by the replay
/// reader. Longer lines are counted as rejected and skipped.
pub const MAX_REPLAY_LINE_BYTES: usize = 4 * 1024 * 1024;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// `tracing` target used by the native console sink.
pub const CONSOLE_TARGET: &str = "logdyn::console";

/// Maximum length of a payload preview included in diagnostics.
pub const DEBUG_MAX_PAYLOAD_PREVIEW: usize = 200;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

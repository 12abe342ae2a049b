// logdyn-viewer - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// All errors preserve the causal chain for diagnostic logging.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all viewer operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum ViewerError {
    /// An inbound or outbound payload could not be decoded/encoded.
    Wire(WireError),

    /// The transport could not deliver a record.
    Transport(TransportError),

    /// A surface could not be rendered.
    Render(RenderError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wire(e) => write!(f, "Wire error: {e}"),
            Self::Transport(e) => write!(f, "Transport error: {e}"),
            Self::Render(e) => write!(f, "Render error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for ViewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Wire(e) => Some(e),
            Self::Transport(e) => Some(e),
            Self::Render(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire errors
// ---------------------------------------------------------------------------

/// Errors decoding inbound payloads or encoding outbound records.
#[derive(Debug)]
pub enum WireError {
    /// The payload is not valid JSON.
    Json {
        /// Truncated copy of the offending payload.
        preview: String,
        source: serde_json::Error,
    },

    /// The payload is valid JSON but neither an object nor an array.
    UnexpectedShape { found: &'static str },

    /// An outbound value could not be serialised.
    Serialize { source: serde_json::Error },
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json { preview, source } => {
                write!(f, "Malformed JSON payload '{preview}': {source}")
            }
            Self::UnexpectedShape { found } => write!(
                f,
                "Expected a record object or an array of records, found {found}"
            ),
            Self::Serialize { source } => write!(f, "Failed to serialise record: {source}"),
        }
    }
}

impl std::error::Error for WireError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json { source, .. } => Some(source),
            Self::Serialize { source } => Some(source),
            Self::UnexpectedShape { .. } => None,
        }
    }
}

impl From<WireError> for ViewerError {
    fn from(e: WireError) -> Self {
        Self::Wire(e)
    }
}

// ---------------------------------------------------------------------------
// Validation issues (non-fatal)
// ---------------------------------------------------------------------------

/// A problem found while normalising a single record.
///
/// Issues never stop a record from being rendered; the offending field is
/// replaced by a default and the issue is reported alongside the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// A required field was absent or null.
    MissingField {
        field: &'static str,
        substituted: String,
    },

    /// A field was present but could not be interpreted.
    InvalidField { field: &'static str, reason: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { field, substituted } => write!(
                f,
                "Record is missing required field '{field}'; using '{substituted}'"
            ),
            Self::InvalidField { field, reason } => {
                write!(f, "Record field '{field}' is invalid: {reason}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Channel and transport errors
// ---------------------------------------------------------------------------

/// Errors raised by a channel implementation when pushing a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The underlying connection is closed.
    Closed,

    /// The host rejected the write.
    Send { reason: String },
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "Channel is closed"),
            Self::Send { reason } => write!(f, "Channel rejected message: {reason}"),
        }
    }
}

impl std::error::Error for ChannelError {}

/// Errors from transport operations.
#[derive(Debug)]
pub enum TransportError {
    /// `send` was called before the channel reported it was open.
    NotConnected,

    /// The channel failed to push the outbound message.
    Channel(ChannelError),

    /// The payload could not be decoded or encoded.
    Wire(WireError),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(
                f,
                "Channel is not connected; outbound record was rendered locally only"
            ),
            Self::Channel(e) => write!(f, "{e}"),
            Self::Wire(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotConnected => None,
            Self::Channel(e) => Some(e),
            Self::Wire(e) => Some(e),
        }
    }
}

impl From<ChannelError> for TransportError {
    fn from(e: ChannelError) -> Self {
        Self::Channel(e)
    }
}

impl From<WireError> for TransportError {
    fn from(e: WireError) -> Self {
        Self::Wire(e)
    }
}

impl From<TransportError> for ViewerError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Render errors
// ---------------------------------------------------------------------------

/// Errors rendering to a display surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// No surface is registered under this name.
    UnknownSurface { name: String },

    /// The surface was removed from its host view.
    SurfaceDetached { name: String },

    /// The host view rejected an update.
    Mount { surface: String, reason: String },

    /// A surface with this name is already registered.
    DuplicateSurface { name: String },

    /// The renderer already manages the maximum number of surfaces.
    TooManySurfaces { max: usize },

    /// The renderer is already borrowed by an outer call on the same thread.
    Busy,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSurface { name } => write!(f, "No display surface named '{name}'"),
            Self::SurfaceDetached { name } => {
                write!(f, "Display surface '{name}' is detached from its view")
            }
            Self::Mount { surface, reason } => {
                write!(f, "Display surface '{surface}' could not be updated: {reason}")
            }
            Self::DuplicateSurface { name } => {
                write!(f, "Display surface '{name}' is already registered")
            }
            Self::TooManySurfaces { max } => {
                write!(f, "Too many display surfaces, maximum is {max}")
            }
            Self::Busy => write!(f, "Renderer is busy with another update"),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<RenderError> for ViewerError {
    fn from(e: RenderError) -> Self {
        Self::Render(e)
    }
}

// ---------------------------------------------------------------------------
// Filter errors
// ---------------------------------------------------------------------------

/// Errors related to filter operations.
#[derive(Debug)]
pub enum FilterError {
    /// User-provided regex is invalid.
    InvalidRegex {
        pattern: String,
        source: regex::Error,
    },

    /// Pattern exceeds the maximum length compiled as a regex.
    PatternTooLong { length: usize, max_length: usize },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRegex { pattern, source } => {
                write!(f, "Invalid filter regex '{pattern}': {source}")
            }
            Self::PatternTooLong { length, max_length } => write!(
                f,
                "Filter pattern is {length} chars, exceeds maximum of {max_length}"
            ),
        }
    }
}

impl std::error::Error for FilterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidRegex { source, .. } => Some(source),
            Self::PatternTooLong { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            Self::ValueOutOfRange { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_transport_error_keeps_wire_source() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ViewerError = TransportError::from(WireError::Json {
            preview: "{".to_string(),
            source: json_err,
        })
        .into();
        assert!(err.to_string().starts_with("Transport error: Malformed JSON"));
        let transport = err.source().expect("transport source");
        assert!(transport.source().is_some());
    }

    #[test]
    fn test_validation_issue_display() {
        let issue = ValidationIssue::MissingField {
            field: "level",
            substituted: "UNKNOWN".to_string(),
        };
        assert_eq!(
            issue.to_string(),
            "Record is missing required field 'level'; using 'UNKNOWN'"
        );
    }
}

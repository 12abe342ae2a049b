// logdyn-viewer - core/wire.rs
//
// JSON wire format: decoding inbound payloads (single record or batch),
// normalising raw records, encoding outbound records and the session
// handshake.
// Core layer: pure logic, no I/O or host dependencies.

use crate::core::model::{level_name_for_value, now_millis, LogRecord};
use crate::util::constants::{
    DEBUG_MAX_PAYLOAD_PREVIEW, HANDSHAKE_SESSION_LABEL, LEVEL_LABEL, LEVEL_OBJECT_KEYS,
    MESSAGE_LABEL, SESSION_ID_LABEL, TIMESTAMP_LABEL, UNKNOWN_LEVEL,
};
use crate::util::error::{ValidationIssue, WireError};
use serde_json::{Map, Value};

// =============================================================================
// Raw records
// =============================================================================

/// A record as it appears on the wire, before normalisation.
///
/// Wraps the JSON object so that unknown fields survive and so that absent,
/// null and mistyped fields can be told apart during normalisation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    /// Build a raw record with a level and message and no timestamp.
    pub fn new(level: &str, message: &str) -> Self {
        let mut map = Map::new();
        map.insert(LEVEL_LABEL.to_string(), Value::from(level));
        map.insert(MESSAGE_LABEL.to_string(), Value::from(message));
        Self(map)
    }

    /// Set an explicit timestamp (epoch milliseconds).
    pub fn with_timestamp(mut self, millis: i64) -> Self {
        self.0
            .insert(TIMESTAMP_LABEL.to_string(), Value::from(millis));
        self
    }

    /// Wrap an already-decoded JSON object.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Field lookup by wire name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// Decoded inbound payload.
#[derive(Debug, Default)]
pub struct ParsedPayload {
    /// Records in payload order.
    pub records: Vec<RawRecord>,

    /// Array elements that were not objects and were skipped.
    pub skipped: Vec<ValidationIssue>,
}

/// Decode an inbound payload: either a single record object or an array of
/// record objects.
pub fn parse_payload(payload: &str) -> Result<ParsedPayload, WireError> {
    let value: Value = serde_json::from_str(payload).map_err(|e| WireError::Json {
        preview: preview(payload),
        source: e,
    })?;

    match value {
        Value::Object(map) => Ok(ParsedPayload {
            records: vec![RawRecord(map)],
            skipped: Vec::new(),
        }),
        Value::Array(items) => {
            let mut parsed = ParsedPayload::default();
            for (index, item) in items.into_iter().enumerate() {
                match item {
                    Value::Object(map) => parsed.records.push(RawRecord(map)),
                    other => parsed.skipped.push(ValidationIssue::InvalidField {
                        field: "record",
                        reason: format!("array element {index} is {}", json_kind(&other)),
                    }),
                }
            }
            Ok(parsed)
        }
        other => Err(WireError::UnexpectedShape {
            found: json_kind(&other),
        }),
    }
}

// =============================================================================
// Normalisation
// =============================================================================

/// A normalised record plus every problem found while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub record: LogRecord,
    pub issues: Vec<ValidationIssue>,
}

/// Normalise a raw record using the current time for a missing timestamp.
///
/// Never mutates `raw` and never fails: unusable fields are replaced by
/// defaults and reported in `issues`.
pub fn normalize(raw: &RawRecord) -> Normalized {
    normalize_at(raw, now_millis())
}

/// Normalise a raw record, using `receipt_millis` for a missing timestamp.
pub fn normalize_at(raw: &RawRecord, receipt_millis: i64) -> Normalized {
    let mut issues = Vec::new();

    let level = resolve_level(raw.get(LEVEL_LABEL), &mut issues);
    let message = resolve_message(raw.get(MESSAGE_LABEL), &mut issues);
    let timestamp = resolve_timestamp(raw.get(TIMESTAMP_LABEL), receipt_millis, &mut issues);
    let session_id = match raw.get(SESSION_ID_LABEL) {
        Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
        _ => None,
    };

    Normalized {
        record: LogRecord {
            level,
            message,
            timestamp,
            session_id,
        },
        issues,
    }
}

fn resolve_level(value: Option<&Value>, issues: &mut Vec<ValidationIssue>) -> String {
    let resolved = match value {
        None | Some(Value::Null) => None,
        Some(Value::String(name)) => non_empty_upper(name),
        Some(Value::Number(n)) => Some(level_from_number(n)),
        Some(Value::Object(obj)) => LEVEL_OBJECT_KEYS
            .iter()
            .filter_map(|key| obj.get(*key))
            .find_map(|v| match v {
                Value::String(name) => non_empty_upper(name),
                Value::Number(n) => Some(level_from_number(n)),
                _ => None,
            }),
        Some(other) => {
            issues.push(ValidationIssue::InvalidField {
                field: LEVEL_LABEL,
                reason: format!("expected a level name, found {}", json_kind(other)),
            });
            return UNKNOWN_LEVEL.to_string();
        }
    };

    resolved.unwrap_or_else(|| {
        issues.push(ValidationIssue::MissingField {
            field: LEVEL_LABEL,
            substituted: UNKNOWN_LEVEL.to_string(),
        });
        UNKNOWN_LEVEL.to_string()
    })
}

fn non_empty_upper(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

/// Integer levels map to their known name; unknown values keep their digits.
fn level_from_number(n: &serde_json::Number) -> String {
    n.as_i64()
        .and_then(level_name_for_value)
        .map(str::to_string)
        .unwrap_or_else(|| n.to_string())
}

fn resolve_message(value: Option<&Value>, issues: &mut Vec<ValidationIssue>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        None | Some(Value::Null) => {
            issues.push(ValidationIssue::MissingField {
                field: MESSAGE_LABEL,
                substituted: String::new(),
            });
            String::new()
        }
        Some(other) => other.to_string(),
    }
}

/// Falsy timestamps (absent, null, false, 0, empty string) take the receipt
/// time. Numeric strings and RFC 3339 strings are accepted.
fn resolve_timestamp(
    value: Option<&Value>,
    receipt_millis: i64,
    issues: &mut Vec<ValidationIssue>,
) -> i64 {
    let parsed = match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => None,
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Some(Value::String(text)) if text.trim().is_empty() => None,
        Some(Value::String(text)) => {
            let text = text.trim();
            let millis = text.parse::<i64>().ok().or_else(|| {
                chrono::DateTime::parse_from_rfc3339(text)
                    .ok()
                    .map(|dt| dt.timestamp_millis())
            });
            if millis.is_none() {
                issues.push(ValidationIssue::InvalidField {
                    field: TIMESTAMP_LABEL,
                    reason: format!("'{text}' is neither epoch millis nor RFC 3339"),
                });
            }
            millis
        }
        Some(other) => {
            issues.push(ValidationIssue::InvalidField {
                field: TIMESTAMP_LABEL,
                reason: format!("expected epoch millis, found {}", json_kind(other)),
            });
            None
        }
    };

    match parsed {
        Some(millis) if millis != 0 => millis,
        _ => receipt_millis,
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode a normalised record for the outbound channel.
pub fn encode_record(record: &LogRecord) -> Result<String, WireError> {
    serde_json::to_string(record).map_err(|e| WireError::Serialize { source: e })
}

/// Encode the one-time session handshake sent when the channel opens.
pub fn encode_handshake(session_id: &str) -> Result<String, WireError> {
    let mut map = Map::new();
    map.insert(
        HANDSHAKE_SESSION_LABEL.to_string(),
        Value::from(session_id),
    );
    serde_json::to_string(&Value::Object(map)).map_err(|e| WireError::Serialize { source: e })
}

/// Build the websocket URL for the logging endpoint from a page origin.
///
/// `http://` becomes `ws://` and `https://` becomes `wss://`; other schemes
/// are kept as given.
pub fn endpoint_url(origin: &str, path: &str) -> String {
    let origin = origin.trim_end_matches('/');
    let origin = if let Some(rest) = origin.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = origin.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        origin.to_string()
    };

    if path.starts_with('/') {
        format!("{origin}{path}")
    } else {
        format!("{origin}/{path}")
    }
}

/// Truncated copy of a payload for diagnostics.
pub fn preview(payload: &str) -> String {
    match payload.char_indices().nth(DEBUG_MAX_PAYLOAD_PREVIEW) {
        Some((cut, _)) => format!("{}...", &payload[..cut]),
        None => payload.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

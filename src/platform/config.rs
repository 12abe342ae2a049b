// logdyn-viewer - platform/config.rs
//
// Platform configuration directory resolution and config.toml loading with
// startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance on native hosts. The browser host has no config
// directory; it hands the same TOML text to `parse_config` directly.

use crate::app::transport::TransportConfig;
use crate::util::constants;
use crate::util::error::ConfigError;
use std::path::Path;
#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;

/// Resolved platform paths for configuration.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/logdyn-viewer/ or %APPDATA%\logdyn-viewer\config\)
    pub config_dir: PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
            Self { config_dir }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
            }
        }
    }
}

// =============================================================================
// config.toml shape
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored so that a newer config file can be used
/// with an older binary.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[channel]` section.
    pub channel: ChannelSection,
    /// `[viewer]` section.
    pub viewer: ViewerSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[channel]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ChannelSection {
    /// Path of the logging endpoint on the page origin.
    pub endpoint_path: Option<String>,
    /// Send the session handshake when the channel opens.
    pub send_session_handshake: Option<bool>,
    /// Session id used for the handshake.
    pub session_id: Option<String>,
}

/// `[viewer]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ViewerSection {
    /// Names (element ids) of the display surfaces.
    pub surfaces: Option<Vec<String>>,
    /// Levels hidden at startup.
    pub hidden_levels: Option<Vec<String>>,
    /// Search pattern applied at startup.
    pub filter: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
    /// Log file path (empty = stderr only).
    pub file: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    // -- Channel --
    pub endpoint_path: String,
    pub send_session_handshake: bool,
    pub session_id: Option<String>,

    // -- Viewer --
    /// Surface names in registration order; never empty.
    pub surfaces: Vec<String>,
    /// Upper-case levels hidden on every surface at startup.
    pub hidden_levels: Vec<String>,
    pub filter: Option<String>,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
    pub log_file: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint_path: constants::DEFAULT_ENDPOINT_PATH.to_string(),
            send_session_handshake: false,
            session_id: None,
            surfaces: vec![constants::DEFAULT_SURFACE_NAME.to_string()],
            hidden_levels: Vec::new(),
            filter: None,
            log_level: None,
            log_file: None,
        }
    }
}

impl AppConfig {
    /// Channel settings for the transport.
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            send_session_handshake: self.send_session_handshake,
            session_id: self.session_id.clone(),
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Load and validate `config.toml` from the given config directory.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// If the file does not exist, returns defaults with no warnings (first run).
pub fn load_config(config_dir: &Path) -> (AppConfig, Vec<String>) {
    load_config_file(&config_dir.join(constants::CONFIG_FILE_NAME))
}

/// Load and validate a specific config file.
///
/// An unreadable or unparseable file yields defaults plus a warning; the
/// viewer still starts but the user is informed.
pub fn load_config_file(config_path: &Path) -> (AppConfig, Vec<String>) {
    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), Vec::new());
    }

    let content = match std::fs::read_to_string(config_path) {
        Ok(c) => c,
        Err(e) => {
            let err = ConfigError::Io {
                path: config_path.to_path_buf(),
                source: e,
            };
            let msg = format!("{err}. Using defaults.");
            tracing::warn!("{}", msg);
            return (AppConfig::default(), vec![msg]);
        }
    };

    parse_config(&content, config_path)
}

/// Parse and validate config text. `origin` names the source in messages.
pub fn parse_config(content: &str, origin: &Path) -> (AppConfig, Vec<String>) {
    let raw: RawConfig = match toml::from_str(content) {
        Ok(r) => r,
        Err(e) => {
            let err = ConfigError::TomlParse {
                path: origin.to_path_buf(),
                source: e,
            };
            let msg = format!("{err}. Using defaults.");
            tracing::warn!("{}", msg);
            return (AppConfig::default(), vec![msg]);
        }
    };

    tracing::info!(path = %origin.display(), "Loaded config.toml");
    validate(raw)
}

/// Warning text for a rejected value.
fn out_of_range(field: &str, value: impl ToString, expected: impl ToString) -> String {
    let err = ConfigError::ValueOutOfRange {
        field: field.to_string(),
        value: value.to_string(),
        expected: expected.to_string(),
    };
    format!("{err}. Using default.")
}

/// Validate each field against named constants, accumulating all warnings.
fn validate(raw: RawConfig) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let mut config = AppConfig::default();

    // -- Channel: endpoint_path --
    if let Some(path) = raw.channel.endpoint_path {
        if path.starts_with('/') && path.len() <= constants::MAX_ENDPOINT_PATH_LENGTH {
            config.endpoint_path = path;
        } else {
            warnings.push(out_of_range(
                "channel.endpoint_path",
                path,
                format!(
                    "a path starting with '/' of at most {} bytes",
                    constants::MAX_ENDPOINT_PATH_LENGTH
                ),
            ));
        }
    }

    // -- Channel: session_id --
    if let Some(id) = raw.channel.session_id {
        if !id.is_empty() && id.len() <= constants::MAX_SESSION_ID_LENGTH {
            config.session_id = Some(id);
        } else {
            warnings.push(out_of_range(
                "channel.session_id",
                id,
                format!("1-{} bytes", constants::MAX_SESSION_ID_LENGTH),
            ));
        }
    }

    // -- Channel: send_session_handshake --
    if let Some(flag) = raw.channel.send_session_handshake {
        config.send_session_handshake = flag;
        if flag && config.session_id.is_none() {
            warnings.push(
                "channel.send_session_handshake is true but no valid session_id is set; \
                 the handshake will be skipped."
                    .to_string(),
            );
        }
    }

    // -- Viewer: surfaces --
    if let Some(names) = raw.viewer.surfaces {
        match validate_surfaces(&names) {
            Ok(()) => config.surfaces = names,
            Err(expected) => {
                warnings.push(out_of_range("viewer.surfaces", names.join(","), expected))
            }
        }
    }

    // -- Viewer: hidden_levels --
    if let Some(levels) = raw.viewer.hidden_levels {
        for level in levels {
            let level = level.trim().to_uppercase();
            if level.is_empty() {
                warnings.push(out_of_range("viewer.hidden_levels", "", "a non-empty level name"));
            } else if !config.hidden_levels.contains(&level) {
                config.hidden_levels.push(level);
            }
        }
    }

    // -- Viewer: filter --
    if let Some(pattern) = raw.viewer.filter {
        if pattern.chars().count() > constants::MAX_FILTER_PATTERN_LENGTH {
            warnings.push(out_of_range(
                "viewer.filter",
                format!("{} chars", pattern.chars().count()),
                format!("at most {} chars", constants::MAX_FILTER_PATTERN_LENGTH),
            ));
        } else if !pattern.is_empty() {
            config.filter = Some(pattern);
        }
    }

    // -- Logging: level --
    if let Some(level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level);
        } else {
            warnings.push(out_of_range(
                "logging.level",
                level,
                "one of error, warn, info, debug, trace",
            ));
        }
    }

    // -- Logging: file --
    if let Some(file) = raw.logging.file {
        if !file.is_empty() {
            config.log_file = Some(file);
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }

    (config, warnings)
}

/// Check surface names; on failure returns the expectation that was missed.
fn validate_surfaces(names: &[String]) -> Result<(), String> {
    if names.is_empty() || names.len() > constants::MAX_SURFACES {
        return Err(format!("1-{} surface names", constants::MAX_SURFACES));
    }
    for (i, name) in names.iter().enumerate() {
        if name.trim().is_empty() || name.len() > constants::MAX_SURFACE_NAME_LENGTH {
            return Err(format!(
                "non-blank names of at most {} bytes",
                constants::MAX_SURFACE_NAME_LENGTH
            ));
        }
        if names[..i].contains(name) {
            return Err("unique surface names".to_string());
        }
    }
    Ok(())
}

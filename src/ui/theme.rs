// logdyn-viewer - ui/theme.rs
//
// Level-to-style mapping and the class names the rendered markup uses.
// No dependencies on app state or business logic.

use std::fmt::Write;

/// Text style applied to a fragment, by level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelStyle {
    Success,
    Info,
    Warning,
    Danger,
    /// Any other level: styled by its own lower-cased name.
    Custom(String),
}

impl LevelStyle {
    /// CSS class for this style.
    pub fn css_class(&self) -> String {
        match self {
            Self::Success => "text-success".to_string(),
            Self::Info => "text-info".to_string(),
            Self::Warning => "text-warning".to_string(),
            Self::Danger => "text-danger".to_string(),
            Self::Custom(name) => format!("text-{name}"),
        }
    }
}

/// Icon shown before the timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelIcon {
    InfoSign,
    Alert,
    RemoveSign,
}

impl LevelIcon {
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::InfoSign => "glyphicon-info-sign",
            Self::Alert => "glyphicon-alert",
            Self::RemoveSign => "glyphicon-remove-sign",
        }
    }
}

/// Style and optional icon for an upper-case level name.
pub fn level_style(level: &str) -> (LevelStyle, Option<LevelIcon>) {
    match level {
        "FINE" => (LevelStyle::Success, None),
        "INFO" => (LevelStyle::Info, Some(LevelIcon::InfoSign)),
        "WARN" | "WARNING" => (LevelStyle::Warning, Some(LevelIcon::Alert)),
        "ERROR" | "SEVERE" => (LevelStyle::Danger, Some(LevelIcon::RemoveSign)),
        other => (LevelStyle::Custom(css_ident(other)), None),
    }
}

/// Level name encoded for use inside a class name.
///
/// ASCII letters and digits pass through lower-cased; every other byte
/// becomes `_` and two hex digits. Levels are upper-case once normalized, so
/// distinct levels never share a class.
pub fn css_ident(level: &str) -> String {
    let mut out = String::with_capacity(level.len());
    for byte in level.bytes() {
        if byte.is_ascii_alphanumeric() {
            out.push(char::from(byte.to_ascii_lowercase()));
        } else {
            let _ = write!(out, "_{byte:02x}");
        }
    }
    out
}

/// `text` as a quoted CSS string, safe inside a `<style>` element.
pub fn css_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            c if matches!(c, '"' | '\\' | '<' | '>' | '&') || c.is_control() => {
                let _ = write!(out, "\\{:x} ", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Selector matching the container of the named surface.
pub fn surface_selector(name: &str) -> String {
    format!("[id={}]", css_string(name))
}

/// Class every surface container carries.
pub const SURFACE_CLASS: &str = "logElement";

/// Class that marks a fragment as filtered out by the search pattern.
pub const FILTERED_CLASS: &str = "filtered";

/// Class on every fragment identifying its level, e.g. `level-warn`.
pub fn level_class(level: &str) -> String {
    format!("level-{}", css_ident(level))
}

/// Class on a surface container that hides one level, e.g. `hide-warn`.
pub fn hidden_level_class(level: &str) -> String {
    format!("hide-{}", css_ident(level))
}

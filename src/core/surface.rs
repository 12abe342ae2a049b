// logdyn-viewer - core/surface.rs
//
// Display surface: an append-only list of structured fragments with
// per-level visibility, a live search filter and auto-scroll state.
//
// A fragment is displayed iff it is not filtered out by the search pattern
// AND its level is not hidden. Filtering and level toggling only flip those
// markers; fragments are never reordered, and only `clear` removes them.

use crate::core::filter::FilterPattern;
use crate::core::model::LogRecord;
use crate::util::constants::LOCAL_TIME_FORMAT;
use crate::util::error::RenderError;
use chrono::{DateTime, Local, SecondsFormat, Utc};
use std::collections::BTreeSet;
use std::ops::Range;

// =============================================================================
// Fragment
// =============================================================================

/// Pre-rendered timestamp label in machine- and human-readable forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampLabel {
    /// ISO 8601 with millisecond precision, UTC (`2017-07-14T02:40:00.000Z`).
    pub iso: String,
    /// Local wall-clock time.
    pub local: String,
}

impl TimestampLabel {
    /// Build the label for an epoch-millisecond timestamp. Values chrono
    /// cannot represent fall back to the raw number.
    pub fn from_millis(millis: i64) -> Self {
        match DateTime::<Utc>::from_timestamp_millis(millis) {
            Some(utc) => Self {
                iso: utc.to_rfc3339_opts(SecondsFormat::Millis, true),
                local: utc
                    .with_timezone(&Local)
                    .format(LOCAL_TIME_FORMAT)
                    .to_string(),
            },
            None => Self {
                iso: millis.to_string(),
                local: millis.to_string(),
            },
        }
    }
}

/// One rendered record on one surface.
#[derive(Debug, Clone)]
pub struct Fragment {
    /// Upper-case level of the originating record.
    pub level: String,
    pub timestamp: TimestampLabel,
    /// Raw, unescaped message text: the search domain.
    pub message: String,
    filtered_out: bool,
    highlights: Vec<Range<usize>>,
}

impl Fragment {
    fn from_record(record: &LogRecord) -> Self {
        Self {
            level: record.level.clone(),
            timestamp: TimestampLabel::from_millis(record.timestamp),
            message: record.message.clone(),
            filtered_out: false,
            highlights: Vec::new(),
        }
    }

    /// True when the active search pattern does not match this fragment.
    pub fn is_filtered_out(&self) -> bool {
        self.filtered_out
    }

    /// Byte ranges of `message` matched by the active search pattern.
    pub fn highlights(&self) -> &[Range<usize>] {
        &self.highlights
    }

    fn apply(&mut self, pattern: Option<&FilterPattern>) {
        match pattern.map(|p| p.evaluate(&self.message)) {
            None => {
                self.filtered_out = false;
                self.highlights.clear();
            }
            Some(None) => {
                self.filtered_out = true;
                self.highlights.clear();
            }
            Some(Some(ranges)) => {
                self.filtered_out = false;
                self.highlights = ranges;
            }
        }
    }
}

// =============================================================================
// Display surface
// =============================================================================

/// Result of appending one record to a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    /// Index of the new fragment.
    pub index: usize,
    /// Whether the view followed the new fragment (false while hovered).
    pub auto_scrolled: bool,
}

/// A named region accumulating rendered log fragments.
#[derive(Debug, Clone)]
pub struct DisplaySurface {
    name: String,
    fragments: Vec<Fragment>,
    hidden_levels: BTreeSet<String>,
    pattern: Option<FilterPattern>,
    hovered: bool,
    scroll_anchor: Option<usize>,
    detached: bool,
}

impl DisplaySurface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fragments: Vec::new(),
            hidden_levels: BTreeSet::new(),
            pattern: None,
            hovered: false,
            scroll_anchor: None,
            detached: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All fragments in receipt order, including hidden ones.
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Append a record as a new fragment, apply the active search pattern
    /// to it and follow it unless the pointer is over the surface.
    pub fn append(&mut self, record: &LogRecord) -> Result<AppendOutcome, RenderError> {
        if self.detached {
            return Err(RenderError::SurfaceDetached {
                name: self.name.clone(),
            });
        }

        let mut fragment = Fragment::from_record(record);
        fragment.apply(self.pattern.as_ref());
        self.fragments.push(fragment);

        let index = self.fragments.len() - 1;
        let auto_scrolled = !self.hovered;
        if auto_scrolled {
            self.scroll_anchor = Some(index);
        }
        Ok(AppendOutcome {
            index,
            auto_scrolled,
        })
    }

    /// Hide or show every fragment of `level`. Fragments are kept either way.
    pub fn toggle_level_visible(&mut self, level: &str, hidden: bool) {
        let level = level.trim().to_uppercase();
        if hidden {
            self.hidden_levels.insert(level);
        } else {
            self.hidden_levels.remove(&level);
        }
    }

    pub fn is_level_hidden(&self, level: &str) -> bool {
        self.hidden_levels.contains(level)
    }

    /// Hidden levels in sorted order.
    pub fn hidden_levels(&self) -> impl Iterator<Item = &str> {
        self.hidden_levels.iter().map(String::as_str)
    }

    /// Re-filter every fragment against `pattern`. An empty pattern clears
    /// all highlights and filtered-out markers.
    pub fn filter(&mut self, pattern: &str) {
        self.pattern = if pattern.is_empty() {
            None
        } else {
            Some(FilterPattern::lenient(pattern))
        };
        let active = self.pattern.as_ref();
        for fragment in &mut self.fragments {
            fragment.apply(active);
        }
    }

    /// Pattern text currently applied, if any.
    pub fn active_pattern(&self) -> Option<&str> {
        self.pattern.as_ref().map(FilterPattern::as_str)
    }

    /// Remove every fragment. Level visibility, the search pattern and hover
    /// state are kept.
    pub fn clear(&mut self) {
        self.fragments.clear();
        self.scroll_anchor = None;
    }

    /// Pointer entered (`true`) or left (`false`) the surface.
    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    /// Index of the fragment the view was last scrolled to.
    pub fn scroll_anchor(&self) -> Option<usize> {
        self.scroll_anchor
    }

    /// Mark the surface as removed from its host view. Later appends fail.
    pub fn detach(&mut self) {
        self.detached = true;
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Whether `fragment` is currently shown.
    pub fn is_displayed(&self, fragment: &Fragment) -> bool {
        !fragment.filtered_out && !self.hidden_levels.contains(&fragment.level)
    }

    /// Fragments currently shown, in receipt order.
    pub fn displayed(&self) -> impl Iterator<Item = &Fragment> {
        self.fragments.iter().filter(|f| self.is_displayed(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(level: &str, message: &str) -> LogRecord {
        LogRecord {
            level: level.to_string(),
            message: message.to_string(),
            timestamp: 1_500_000_000_000,
            session_id: None,
        }
    }

    fn surface_with(records: &[(&str, &str)]) -> DisplaySurface {
        let mut surface = DisplaySurface::new("test");
        for (level, message) in records {
            surface.append(&make_record(level, message)).unwrap();
        }
        surface
    }

    #[test]
    fn test_append_keeps_receipt_order() {
        let surface = surface_with(&[("INFO", "a"), ("WARN", "b"), ("ERROR", "c")]);
        let levels: Vec<_> = surface.fragments().iter().map(|f| f.level.as_str()).collect();
        assert_eq!(levels, vec!["INFO", "WARN", "ERROR"]);
    }

    #[test]
    fn test_timestamp_label_iso() {
        let label = TimestampLabel::from_millis(1_500_000_000_123);
        assert_eq!(label.iso, "2017-07-14T02:40:00.123Z");
        assert!(!label.local.is_empty());
    }

    #[test]
    fn test_filter_marks_and_highlights() {
        let mut surface = surface_with(&[("INFO", "disk full"), ("INFO", "all good")]);
        surface.filter("FULL");
        let f = surface.fragments();
        assert!(!f[0].is_filtered_out());
        assert_eq!(f[0].highlights(), &[5..9]);
        assert!(f[1].is_filtered_out());
        assert_eq!(surface.displayed().count(), 1);
    }

    #[test]
    fn test_filter_searches_message_only() {
        let mut surface = surface_with(&[("INFO", "nothing here")]);
        surface.filter("INFO");
        assert!(surface.fragments()[0].is_filtered_out());
    }

    #[test]
    fn test_filter_twice_is_idempotent() {
        let mut surface = surface_with(&[("INFO", "x marks x"), ("WARN", "none")]);
        surface.filter("x");
        let once: Vec<_> = surface
            .fragments()
            .iter()
            .map(|f| (f.is_filtered_out(), f.highlights().to_vec()))
            .collect();
        surface.filter("x");
        let twice: Vec<_> = surface
            .fragments()
            .iter()
            .map(|f| (f.is_filtered_out(), f.highlights().to_vec()))
            .collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_filter_clears_everything() {
        let mut surface = surface_with(&[("INFO", "abc"), ("INFO", "def")]);
        surface.filter("abc");
        surface.filter("");
        assert!(surface.active_pattern().is_none());
        assert!(surface
            .fragments()
            .iter()
            .all(|f| !f.is_filtered_out() && f.highlights().is_empty()));
    }

    #[test]
    fn test_late_append_respects_active_filter() {
        let mut surface = surface_with(&[]);
        surface.filter("boom");
        surface.append(&make_record("INFO", "quiet")).unwrap();
        surface.append(&make_record("ERROR", "BOOM")).unwrap();
        assert!(surface.fragments()[0].is_filtered_out());
        assert_eq!(surface.fragments()[1].highlights(), &[0..4]);
    }

    #[test]
    fn test_level_hiding_keeps_fragments() {
        let mut surface = surface_with(&[("INFO", "a"), ("WARN", "b"), ("ERROR", "c")]);
        surface.toggle_level_visible("warn", true);
        assert_eq!(surface.len(), 3);
        let shown: Vec<_> = surface.displayed().map(|f| f.level.as_str()).collect();
        assert_eq!(shown, vec!["INFO", "ERROR"]);

        surface.toggle_level_visible("WARN", false);
        assert_eq!(surface.displayed().count(), 3);
    }

    #[test]
    fn test_hidden_and_filtered_combine() {
        let mut surface = surface_with(&[("INFO", "match"), ("WARN", "match"), ("INFO", "skip")]);
        surface.toggle_level_visible("WARN", true);
        surface.filter("match");
        assert_eq!(surface.displayed().count(), 1);
    }

    #[test]
    fn test_hover_suspends_auto_scroll() {
        let mut surface = surface_with(&[("INFO", "a")]);
        assert_eq!(surface.scroll_anchor(), Some(0));
        surface.set_hovered(true);
        let outcome = surface.append(&make_record("INFO", "b")).unwrap();
        assert!(!outcome.auto_scrolled);
        assert_eq!(surface.scroll_anchor(), Some(0));
        surface.set_hovered(false);
        surface.append(&make_record("INFO", "c")).unwrap();
        assert_eq!(surface.scroll_anchor(), Some(2));
    }

    #[test]
    fn test_clear_after_five_appends() {
        let mut surface = surface_with(&[
            ("INFO", "1"),
            ("INFO", "2"),
            ("WARN", "3"),
            ("ERROR", "4"),
            ("FINE", "5"),
        ]);
        surface.toggle_level_visible("FINE", true);
        surface.clear();
        assert!(surface.is_empty());
        assert!(surface.is_level_hidden("FINE"));
        assert_eq!(surface.scroll_anchor(), None);
    }

    #[test]
    fn test_detached_surface_rejects_append() {
        let mut surface = DisplaySurface::new("gone");
        surface.detach();
        let err = surface.append(&make_record("INFO", "x")).unwrap_err();
        assert_eq!(
            err,
            RenderError::SurfaceDetached {
                name: "gone".to_string()
            }
        );
    }
}

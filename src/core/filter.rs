// logdyn-viewer - core/filter.rs
//
// Search pattern used to filter and highlight rendered fragments.
// Matching is case-insensitive and runs over message text only.
// Core layer: pure logic, no I/O or UI dependencies.

use crate::util::constants::{FILTER_REGEX_SIZE_LIMIT, MAX_FILTER_PATTERN_LENGTH};
use crate::util::error::FilterError;
use regex::{Regex, RegexBuilder};
use std::ops::Range;

/// A compiled, case-insensitive search pattern.
#[derive(Debug, Clone)]
pub struct FilterPattern {
    /// Pattern text as typed by the user.
    source: String,

    /// `None` only if even the literal form failed to compile; such a
    /// pattern matches nothing.
    regex: Option<Regex>,

    /// True when the pattern is matched as literal text rather than a regex.
    literal: bool,
}

impl FilterPattern {
    /// Compile `pattern` as a case-insensitive regex.
    /// Returns an error if the pattern is invalid or too long.
    pub fn new(pattern: &str) -> Result<Self, FilterError> {
        let length = pattern.chars().count();
        if length > MAX_FILTER_PATTERN_LENGTH {
            return Err(FilterError::PatternTooLong {
                length,
                max_length: MAX_FILTER_PATTERN_LENGTH,
            });
        }
        let regex = build(pattern).map_err(|e| FilterError::InvalidRegex {
            pattern: pattern.to_string(),
            source: e,
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex: Some(regex),
            literal: false,
        })
    }

    /// Compile `pattern`, falling back to literal text matching when it is
    /// not a valid regex. Users type into a live search box, so half-typed
    /// patterns such as `[err` must still filter.
    pub fn lenient(pattern: &str) -> Self {
        match Self::new(pattern) {
            Ok(compiled) => compiled,
            Err(e) => {
                tracing::debug!(error = %e, "Filter pattern matched literally");
                let regex = match build(&regex::escape(pattern)) {
                    Ok(r) => Some(r),
                    Err(e) => {
                        tracing::warn!(error = %e, "Literal filter pattern failed to compile");
                        None
                    }
                };
                Self {
                    source: pattern.to_string(),
                    regex,
                    literal: true,
                }
            }
        }
    }

    /// Pattern text as typed.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True when the pattern is matched as literal text.
    pub fn is_literal(&self) -> bool {
        self.literal
    }

    /// Returns true if `text` contains at least one match.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.as_ref().is_some_and(|r| r.is_match(text))
    }

    /// Evaluate `text`: `None` if it does not match, otherwise the byte
    /// ranges of every non-empty match, in order.
    pub fn evaluate(&self, text: &str) -> Option<Vec<Range<usize>>> {
        let regex = self.regex.as_ref()?;
        if !regex.is_match(text) {
            return None;
        }
        Some(
            regex
                .find_iter(text)
                .filter(|m| !m.is_empty())
                .map(|m| m.range())
                .collect(),
        )
    }
}

fn build(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .size_limit(FILTER_REGEX_SIZE_LIMIT)
        .build()
}

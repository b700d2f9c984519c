//! `@`-trigger detection.
//!
//! A trigger is active when the text just before a collapsed caret ends with
//! a run of non-whitespace starting at the marker; regex-equivalent to
//! `@[^\s]*\z` over the preceding text. On acceptance the region to replace is
//! recomputed from the trigger's start as `@[^\s]* ?` so characters typed after
//! the original match (and one trailing space) are replaced too.

use core_text::{Utf16Range, byte_to_utf16, utf16_len, utf16_to_byte};
use regex::Regex;
use tracing::trace;

mod suggest;

pub use suggest::{StaticSuggestions, SuggestionSource};

/// An active trigger: `range` covers the marker and the partial query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerMatch {
    pub range: Utf16Range,
    pub partial_query: String,
}

#[derive(Debug, Clone)]
pub struct TriggerDetector {
    marker: char,
    active: Regex,
    completion: Regex,
}

impl TriggerDetector {
    pub fn new(marker: char) -> Result<Self, regex::Error> {
        let m = regex::escape(marker.encode_utf8(&mut [0u8; 4]));
        Ok(Self {
            marker,
            active: Regex::new(&format!(r"{m}[^\s]*\z"))?,
            completion: Regex::new(&format!(r"\A{m}[^\s]* ?"))?,
        })
    }

    pub fn from_config(cfg: &core_config::Config) -> Result<Self, regex::Error> {
        Self::new(cfg.file.trigger.marker_char())
    }

    pub fn marker(&self) -> char {
        self.marker
    }

    /// Trigger ending exactly at the caret, if any. A non-empty selection
    /// never has one.
    pub fn active_trigger(&self, text: &str, selection: Utf16Range) -> Option<TriggerMatch> {
        if !selection.is_empty() {
            return None;
        }
        let end = utf16_to_byte(text, selection.location).ok()?;
        let preceding = &text[..end];
        let m = self.active.find(preceding)?;
        let range = Utf16Range::from_bounds(byte_to_utf16(text, m.start()), selection.location);
        let partial_query = preceding[m.start() + self.marker.len_utf8()..].to_string();
        trace!(target: "mention.trigger", range = %range, query_len = partial_query.len(), "trigger_active");
        Some(TriggerMatch {
            range,
            partial_query,
        })
    }

    /// Full region to replace when a suggestion for `trigger_range` is
    /// accepted: the marker, every following non-whitespace character and at
    /// most one trailing space. `None` when the marker is no longer there.
    pub fn completion_replacement_range(
        &self,
        text: &str,
        trigger_range: Utf16Range,
    ) -> Option<Utf16Range> {
        let start = utf16_to_byte(text, trigger_range.location).ok()?;
        let m = self.completion.find(&text[start..])?;
        Some(Utf16Range::new(
            trigger_range.location,
            utf16_len(m.as_str()),
        ))
    }
}

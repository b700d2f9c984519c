//! The mention registry: span bookkeeping across edits.
//!
//! Every surface notification is one synchronous transform from the retained
//! snapshot to the new one. The transform is computed on copies and only
//! committed once all checks pass, so a rejected edit leaves spans and
//! snapshot exactly as they were.
//!
//! Repair rule for an edit replacing `[s, s + L)` with `R` units
//! (`delta = R - L`):
//! * span entirely after the edit (`s + L <= span.start`, or a pure
//!   insertion at `s <= span.start`): shift by `delta`;
//! * span entirely before (`s >= span.end`): unchanged;
//! * pure insertion strictly inside a span: unchanged;
//! * any other overlap deletes characters of the span: remove it, unless the
//!   edit replaces exactly the span's range with its own display text.
//!
//! With `atomic_delete`, a pure deletion that removes a span also deletes
//! whatever is left of that span's text.

use core_text::{BufferSnapshot, EditingContent, TextError, Utf16Range, replace_utf16, utf16_len};
use tracing::{debug, error, trace};

use crate::options::MentionOptions;
use crate::span::MentionSpan;
use crate::MentionError;
use crate::style::StyleRun;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    /// Buffer got longer.
    Growth,
    /// Buffer got shorter.
    Shrink,
    /// Text changed without changing length.
    Replace,
    /// Only the selection moved.
    SelectionOnly,
}

/// Result of `MentionRegistry::on_edit_applied`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub kind: EditKind,
    /// Content to apply back to the surface (selection possibly widened).
    pub content: EditingContent,
    pub spans: Vec<MentionSpan>,
    pub removed: Vec<MentionSpan>,
    pub selection_widened: bool,
    /// Leftover mention text deleted on top of the surface's edit, as a
    /// range of the surface's new text.
    pub trimmed: Option<Utf16Range>,
}

/// Result of `MentionRegistry::accept_suggestion`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionResult {
    pub content: EditingContent,
    /// The region of the previous buffer that was replaced.
    pub replaced: Utf16Range,
    /// Suggestion plus separator, as written into the buffer.
    pub inserted_text: String,
    pub span: MentionSpan,
    pub removed: Vec<MentionSpan>,
}

#[derive(Debug, Clone, Default)]
pub struct MentionRegistry {
    spans: Vec<MentionSpan>,
    snapshot: BufferSnapshot,
    options: MentionOptions,
}

impl MentionRegistry {
    pub fn new(options: MentionOptions) -> Self {
        Self {
            spans: Vec::new(),
            snapshot: BufferSnapshot::default(),
            options,
        }
    }

    /// Registry tracking an existing buffer that has no mentions yet.
    pub fn with_content(options: MentionOptions, content: EditingContent) -> Self {
        Self {
            spans: Vec::new(),
            snapshot: content,
            options,
        }
    }

    pub fn spans(&self) -> &[MentionSpan] {
        &self.spans
    }

    pub fn snapshot(&self) -> &BufferSnapshot {
        &self.snapshot
    }

    /// Replace the whole buffer programmatically; all spans are dropped.
    pub fn reset(&mut self, content: EditingContent) {
        debug!(target: "mention.registry", dropped = self.spans.len(), len = content.len_utf16(), "reset");
        self.spans.clear();
        self.snapshot = content;
    }

    /// Repair spans after the surface replaced `edited_range` of `old` with
    /// `replacement`, producing `new`.
    pub fn on_edit_applied(
        &mut self,
        old: &BufferSnapshot,
        new: &BufferSnapshot,
        edited_range: Utf16Range,
        replacement: &str,
    ) -> Result<EditOutcome, MentionError> {
        if old.text != self.snapshot.text {
            return Err(MentionError::StaleSnapshot);
        }
        let old_len = old.len_utf16();
        if !edited_range.is_within(old_len) {
            return Err(TextError::InvalidRange {
                range: edited_range,
                len: old_len,
            }
            .into());
        }
        let new_len = new.len_utf16();
        if !new.selection.is_within(new_len) {
            return Err(TextError::InvalidRange {
                range: new.selection,
                len: new_len,
            }
            .into());
        }
        if replace_utf16(&old.text, edited_range, replacement)? != new.text {
            return Err(MentionError::InconsistentEdit);
        }

        let kind = if old.text == new.text {
            EditKind::SelectionOnly
        } else {
            match new_len.cmp(&old_len) {
                std::cmp::Ordering::Greater => EditKind::Growth,
                std::cmp::Ordering::Less => EditKind::Shrink,
                std::cmp::Ordering::Equal => EditKind::Replace,
            }
        };

        let mut text = new.text.clone();
        let mut trimmed = None;
        let (spans, removed, selection) = if kind == EditKind::SelectionOnly {
            (self.spans.clone(), Vec::new(), self.widen_selection(new.selection))
        } else {
            let (mut kept, removed) = repair(&self.spans, edited_range, replacement);
            let mut selection = new.selection;
            if self.options.atomic_delete && replacement.is_empty() {
                if let Some(rest) = leftover(&removed, edited_range) {
                    text = replace_utf16(&text, rest, "")?;
                    kept = repair(&kept, rest, "").0;
                    selection = selection.moved_by_replacing(rest, 0);
                    trimmed = Some(rest);
                }
            }
            (kept, removed, selection)
        };
        enforce_invariants(&spans, utf16_len(&text))?;

        for span in &removed {
            trace!(target: "mention.registry", range = %span.range, "span_removed");
        }
        let selection_widened = selection != new.selection;
        debug!(
            target: "mention.registry",
            ?kind,
            edited = %edited_range,
            inserted = utf16_len(replacement),
            spans = spans.len(),
            removed = removed.len(),
            selection_widened,
            trimmed = ?trimmed,
            "edit_applied"
        );

        let content = EditingContent { text, selection };
        self.spans = spans.clone();
        self.snapshot = content.clone();
        Ok(EditOutcome {
            kind,
            content,
            spans,
            removed,
            selection_widened,
            trimmed,
        })
    }

    /// Substitute `suggestion_text` (plus the configured separator) for
    /// `trigger_range` of the retained buffer and track it as a new span.
    pub fn accept_suggestion(
        &mut self,
        suggestion_text: &str,
        trigger_range: Utf16Range,
    ) -> Result<SubstitutionResult, MentionError> {
        if suggestion_text.is_empty() {
            return Err(MentionError::EmptySuggestion);
        }
        let mut inserted_text = suggestion_text.to_string();
        if let Some(sep) = &self.options.separator {
            inserted_text.push_str(sep);
        }
        let text = replace_utf16(&self.snapshot.text, trigger_range, &inserted_text)?;

        let span = MentionSpan::new(
            suggestion_text,
            trigger_range.location,
            self.options.url_for(suggestion_text),
            self.options.span_style.clone(),
        );
        let (kept, mut removed) = repair(&self.spans, trigger_range, &inserted_text);
        // An empty trigger range strictly inside a span survives repair but
        // would sit under the new span.
        let (mut spans, covered): (Vec<_>, Vec<_>) = kept
            .into_iter()
            .partition(|s| !s.range.intersects(&span.range));
        removed.extend(covered);
        let idx = spans.partition_point(|s| s.range.location < span.range.location);
        spans.insert(idx, span.clone());

        let content = EditingContent {
            selection: Utf16Range::caret(trigger_range.location + utf16_len(&inserted_text)),
            text,
        };
        enforce_invariants(&spans, content.len_utf16())?;

        debug!(
            target: "mention.registry",
            replaced = %trigger_range,
            span = %span.range,
            index = idx,
            removed = removed.len(),
            "suggestion_accepted"
        );
        self.spans = spans;
        self.snapshot = content.clone();
        Ok(SubstitutionResult {
            content,
            replaced: trigger_range,
            inserted_text,
            span,
            removed,
        })
    }

    /// Spans touched by `range`, in buffer order. An empty `range` matches a
    /// span strictly containing that position.
    pub fn spans_intersecting(&self, range: Utf16Range) -> Vec<&MentionSpan> {
        self.spans
            .iter()
            .filter(|span| {
                if range.is_empty() {
                    span.range.strictly_contains(range.location)
                } else {
                    span.range.intersects(&range)
                }
            })
            .collect()
    }

    /// Decoration for one redraw: the base style over the whole buffer, then
    /// one run per span.
    pub fn style_runs(&self) -> Vec<StyleRun> {
        let len = self.snapshot.len_utf16();
        let mut runs = Vec::with_capacity(self.spans.len() + 1);
        if !self.options.base_style.is_empty() && len > 0 {
            runs.push(StyleRun {
                range: Utf16Range::new(0, len),
                attributes: self.options.base_style.clone(),
            });
        }
        runs.extend(self.spans.iter().map(|span| StyleRun {
            range: span.range,
            attributes: span.style.clone(),
        }));
        runs
    }

    /// Check ordering, overlap and bounds against the retained snapshot.
    pub fn validate(&self) -> Result<(), MentionError> {
        check_invariants(&self.spans, self.snapshot.len_utf16())
    }

    /// A caret strictly inside a span, or a selection overlapping one, grows
    /// to cover the whole span.
    fn widen_selection(&self, selection: Utf16Range) -> Utf16Range {
        let mut out = selection;
        for span in &self.spans {
            let hit = if out.is_empty() {
                span.range.strictly_contains(out.location)
            } else {
                span.range.intersects(&out)
            };
            if hit {
                out = out.union(&span.range);
            }
        }
        out
    }
}

/// Apply the repair rule to every span. Returns `(kept, removed)`, both in
/// buffer order.
fn repair(
    spans: &[MentionSpan],
    edited: Utf16Range,
    replacement: &str,
) -> (Vec<MentionSpan>, Vec<MentionSpan>) {
    let delta = utf16_len(replacement) as isize - edited.length as isize;
    let mut kept = Vec::with_capacity(spans.len());
    let mut removed = Vec::new();
    for span in spans {
        let r = span.range;
        let after = if edited.is_empty() {
            edited.location <= r.location
        } else {
            edited.end() <= r.location
        };
        if after {
            kept.push(span.clone().shifted(delta));
        } else if edited.location >= r.end() || edited.is_empty() {
            // Before the edit, or a pure insertion strictly inside the span.
            kept.push(span.clone());
        } else if edited == r && replacement == span.display_text {
            kept.push(span.clone());
        } else {
            removed.push(span.clone());
        }
    }
    (kept, removed)
}

/// What remains of the `cut` spans once `deleted` is gone, as one range of
/// the new text. The pieces before and after the deletion meet at its start.
fn leftover(cut: &[MentionSpan], deleted: Utf16Range) -> Option<Utf16Range> {
    let start = cut.iter().map(|s| s.range.location).min()?.min(deleted.location);
    let tail = cut
        .iter()
        .map(|s| s.range.end().saturating_sub(deleted.end()))
        .max()
        .unwrap_or(0);
    let rest = Utf16Range::from_bounds(start, deleted.location + tail);
    (!rest.is_empty()).then_some(rest)
}

fn check_invariants(spans: &[MentionSpan], len: usize) -> Result<(), MentionError> {
    if let Some(span) = spans.iter().find(|s| !s.range.is_within(len)) {
        return Err(TextError::InvalidRange {
            range: span.range,
            len,
        }
        .into());
    }
    if let Some(pair) = spans
        .windows(2)
        .find(|pair| pair[1].range.location < pair[0].range.end())
    {
        return Err(MentionError::OverlapInvariantViolation {
            first: pair[0].range,
            second: pair[1].range,
        });
    }
    Ok(())
}

/// Invariant failures mean an earlier edit was mis-applied: loud in debug
/// builds, an error (with state left untouched) in release.
fn enforce_invariants(spans: &[MentionSpan], len: usize) -> Result<(), MentionError> {
    let result = check_invariants(spans, len);
    if let Err(e) = &result {
        error!(target: "mention.registry", error = %e, "invariant_violation");
        debug_assert!(result.is_ok(), "mention invariant violated: {e}");
    }
    result
}

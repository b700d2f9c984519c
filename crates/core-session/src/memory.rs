//! In-memory `TextSurface` used by the demo binary and tests.
//!
//! The `user_*` methods model what an editing widget does on its own (typing,
//! backspace, caret moves) and return the before/after pair the widget would
//! report through `MentionSession::notify_changed`.

use anyhow::Result;
use core_text::{Buffer, EditingContent, Utf16Range, utf16_len};
use tracing::trace;

use crate::{SurfaceEdit, TextSurface};

/// Before/after states of one widget-originated change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceChange {
    pub old: EditingContent,
    pub new: EditingContent,
}

#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    buffer: Buffer,
    selection: Utf16Range,
    applied: Vec<SurfaceEdit>,
}

impl MemorySurface {
    pub fn new(content: &EditingContent) -> Self {
        Self {
            buffer: Buffer::from_str(&content.text),
            selection: content.selection,
            applied: Vec::new(),
        }
    }

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    pub fn selection(&self) -> Utf16Range {
        self.selection
    }

    pub fn content(&self) -> EditingContent {
        EditingContent::new(self.text(), self.selection)
    }

    /// Edits the core instructed, oldest first.
    pub fn applied_edits(&self) -> &[SurfaceEdit] {
        &self.applied
    }

    fn change(&mut self, range: Utf16Range, text: &str, selection: Utf16Range) -> Result<SurfaceChange> {
        let old = self.content();
        self.buffer.replace(range, text)?;
        self.selection = selection;
        Ok(SurfaceChange {
            old,
            new: self.content(),
        })
    }

    /// Typing or pasting: replace the selection, caret after the new text.
    pub fn user_insert(&mut self, text: &str) -> Result<SurfaceChange> {
        let range = self.selection;
        let caret = Utf16Range::caret(range.location + utf16_len(text));
        self.change(range, text, caret)
    }

    /// Delete the selection, or the grapheme cluster before the caret.
    pub fn user_backspace(&mut self) -> Result<SurfaceChange> {
        let range = if self.selection.is_empty() {
            let caret = self.selection.location;
            Utf16Range::from_bounds(self.buffer.prev_grapheme_boundary(caret)?, caret)
        } else {
            self.selection
        };
        self.change(range, "", Utf16Range::caret(range.location))
    }

    /// Move the caret or selection without touching the text.
    pub fn user_select(&mut self, selection: Utf16Range) -> Result<SurfaceChange> {
        let len = self.buffer.len_utf16();
        if !selection.is_within(len) {
            anyhow::bail!("selection {selection} outside buffer of length {len}");
        }
        let old = self.content();
        self.selection = selection;
        Ok(SurfaceChange {
            old,
            new: self.content(),
        })
    }

    /// Replace an arbitrary range (drop, programmatic replace), caret after it.
    pub fn user_replace(&mut self, range: Utf16Range, text: &str) -> Result<SurfaceChange> {
        let caret = Utf16Range::caret(range.location + utf16_len(text));
        self.change(range, text, caret)
    }

    /// Insert at `at` without the user's involvement (autocorrect, a remote
    /// change); the selection moves with the text around it.
    pub fn external_insert(&mut self, at: usize, text: &str) -> Result<SurfaceChange> {
        let range = Utf16Range::caret(at);
        let selection = self.selection.moved_by_replacing(range, utf16_len(text));
        self.change(range, text, selection)
    }
}

impl TextSurface for MemorySurface {
    fn apply_edit(&mut self, edit: &SurfaceEdit) -> Result<()> {
        let len = self.buffer.len_utf16();
        let new_len = len - edit.range.length.min(len) + utf16_len(&edit.replacement);
        if !edit.selection.is_within(new_len) {
            anyhow::bail!("selection {} outside resulting buffer of length {new_len}", edit.selection);
        }
        self.buffer.replace(edit.range, &edit.replacement)?;
        self.selection = edit.selection;
        trace!(target: "mention.surface", range = %edit.range, selection = %edit.selection, "apply_edit");
        self.applied.push(edit.clone());
        Ok(())
    }
}

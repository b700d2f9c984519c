//! Character filtering for incoming editing content.
//!
//! BiDi control characters are invisible and reorder surrounding text, which
//! makes mention ranges look wrong on screen. Surfaces strip them from every
//! edit before it reaches the registry. Removing characters moves the
//! selection, so the filter carries the selection along.

use std::borrow::Cow;

use crate::{EditingContent, Utf16Range};

/// Unicode `Bidi_Control` characters.
pub fn is_bidi_control(c: char) -> bool {
    matches!(
        c,
        '\u{061C}' | '\u{200E}' | '\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}'
    )
}

/// Keep only the characters accepted by `keep`. Borrows when nothing is dropped.
pub fn filter_text(text: &str, keep: impl Fn(char) -> bool) -> Cow<'_, str> {
    if text.chars().all(&keep) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|&c| keep(c)).collect())
    }
}

/// Filter `content`, moving its selection as rejected characters disappear.
pub fn filter_content(content: &EditingContent, keep: impl Fn(char) -> bool) -> EditingContent {
    let mut text = String::with_capacity(content.text.len());
    let mut selection = content.selection;
    let mut index = 0usize;
    for c in content.text.chars() {
        if keep(c) {
            text.push(c);
            index += c.len_utf16();
        } else {
            selection = selection.moved_by_replacing(Utf16Range::new(index, c.len_utf16()), 0);
        }
    }
    EditingContent { text, selection }
}

pub fn strip_bidi_controls(content: &EditingContent) -> EditingContent {
    filter_content(content, |c| !is_bidi_control(c))
}

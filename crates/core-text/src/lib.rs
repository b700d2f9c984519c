//! Rope-backed text buffer and UTF-16 offset utilities.
//!
//! Editing surfaces report carets, selections and edited ranges in UTF-16 code
//! units while Rust strings are UTF-8. Everything crossing that boundary goes
//! through the helpers here so the rest of the workspace can stay in one unit.
//! Offsets that would land between the two halves of a surrogate pair are
//! rejected rather than rounded.

use ropey::Rope;
use thiserror::Error;

pub mod diff;
pub mod filter;
mod range;

pub use range::{BufferSnapshot, EditingContent, Utf16Range};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextError {
    #[error("range {range} outside buffer of length {len}")]
    InvalidRange { range: Utf16Range, len: usize },
    #[error("offset {offset} splits a surrogate pair")]
    SplitSurrogate { offset: usize },
}

/// Length of `s` in UTF-16 code units.
pub fn utf16_len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}

/// Map a UTF-16 offset to a UTF-8 byte index into `s`.
pub fn utf16_to_byte(s: &str, offset: usize) -> Result<usize, TextError> {
    let mut units = 0usize;
    for (byte, ch) in s.char_indices() {
        if units == offset {
            return Ok(byte);
        }
        if units > offset {
            return Err(TextError::SplitSurrogate { offset });
        }
        units += ch.len_utf16();
    }
    match units.cmp(&offset) {
        std::cmp::Ordering::Equal => Ok(s.len()),
        std::cmp::Ordering::Greater => Err(TextError::SplitSurrogate { offset }),
        std::cmp::Ordering::Less => Err(TextError::InvalidRange {
            range: Utf16Range::caret(offset),
            len: units,
        }),
    }
}

/// Map a UTF-8 byte index (on a char boundary) to a UTF-16 offset.
pub fn byte_to_utf16(s: &str, byte: usize) -> usize {
    let byte = byte.min(s.len());
    debug_assert!(s.is_char_boundary(byte));
    utf16_len(&s[..byte])
}

/// Byte range of `range` inside `s`.
pub fn byte_range(s: &str, range: Utf16Range) -> Result<std::ops::Range<usize>, TextError> {
    let len = utf16_len(s);
    if !range.is_within(len) {
        return Err(TextError::InvalidRange { range, len });
    }
    let start = utf16_to_byte(s, range.location)?;
    let end = utf16_to_byte(s, range.end())?;
    Ok(start..end)
}

/// Borrow the UTF-16 range `range` of `s`.
pub fn slice_utf16(s: &str, range: Utf16Range) -> Result<&str, TextError> {
    let bytes = byte_range(s, range)?;
    Ok(&s[bytes])
}

/// Return `s` with `range` replaced by `replacement`.
pub fn replace_utf16(s: &str, range: Utf16Range, replacement: &str) -> Result<String, TextError> {
    let bytes = byte_range(s, range)?;
    let mut out = String::with_capacity(s.len() - bytes.len() + replacement.len());
    out.push_str(&s[..bytes.start]);
    out.push_str(replacement);
    out.push_str(&s[bytes.end..]);
    Ok(out)
}

/// A text buffer backed by a `ropey::Rope`, addressed in UTF-16 code units.
#[derive(Clone, Debug, Default)]
pub struct Buffer {
    rope: Rope,
}

impl Buffer {
    pub fn from_str(content: &str) -> Self {
        Self {
            rope: Rope::from_str(content),
        }
    }

    pub fn len_utf16(&self) -> usize {
        self.rope.len_utf16_cu()
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    fn char_index(&self, offset: usize) -> Result<usize, TextError> {
        let len = self.len_utf16();
        if offset > len {
            return Err(TextError::InvalidRange {
                range: Utf16Range::caret(offset),
                len,
            });
        }
        let ch = self.rope.utf16_cu_to_char(offset);
        if self.rope.char_to_utf16_cu(ch) != offset {
            return Err(TextError::SplitSurrogate { offset });
        }
        Ok(ch)
    }

    fn char_range(&self, range: Utf16Range) -> Result<std::ops::Range<usize>, TextError> {
        let len = self.len_utf16();
        if !range.is_within(len) {
            return Err(TextError::InvalidRange { range, len });
        }
        Ok(self.char_index(range.location)?..self.char_index(range.end())?)
    }

    pub fn slice(&self, range: Utf16Range) -> Result<String, TextError> {
        let chars = self.char_range(range)?;
        Ok(self.rope.slice(chars).to_string())
    }

    /// Replace `range` with `text`; nothing is modified on error.
    pub fn replace(&mut self, range: Utf16Range, text: &str) -> Result<(), TextError> {
        let chars = self.char_range(range)?;
        let start = chars.start;
        if !chars.is_empty() {
            self.rope.remove(chars);
        }
        if !text.is_empty() {
            self.rope.insert(start, text);
        }
        Ok(())
    }

    /// Offset of the grapheme cluster boundary preceding `offset` (backspace
    /// target). Returns 0 at the start of the buffer.
    pub fn prev_grapheme_boundary(&self, offset: usize) -> Result<usize, TextError> {
        let ch = self.char_index(offset)?;
        if ch == 0 {
            return Ok(0);
        }
        let line = self.rope.char_to_line(ch);
        let line_start = self.rope.line_to_char(line);
        if line_start == ch {
            // Caret at the start of a line: step over the previous line
            // break, "\r\n" being a single cluster.
            let crlf = ch >= 2 && self.rope.char(ch - 2) == '\r' && self.rope.char(ch - 1) == '\n';
            let back = if crlf { 2 } else { 1 };
            return Ok(self.rope.char_to_utf16_cu(ch - back));
        }
        let prefix = self.rope.slice(line_start..ch).to_string();
        let last = grapheme::prev_boundary(&prefix, prefix.len());
        Ok(self.rope.char_to_utf16_cu(line_start) + byte_to_utf16(&prefix, last))
    }
}

/// Grapheme helpers operating on a single line.
pub mod grapheme {
    use unicode_segmentation::UnicodeSegmentation;

    /// Previous grapheme boundary (returns 0 if already at or below 1st boundary).
    pub fn prev_boundary(line: &str, byte: usize) -> usize {
        if byte == 0 || byte > line.len() {
            return 0;
        }
        let mut last = 0;
        for (idx, _) in line.grapheme_indices(true) {
            if idx >= byte {
                break;
            }
            last = idx;
        }
        last
    }
}

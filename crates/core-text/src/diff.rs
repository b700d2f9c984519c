//! Recover the single edit that turned one buffer state into another.
//!
//! Surfaces notify us with whole before/after texts. The edit is the region
//! between the longest common prefix and the longest common suffix. When the
//! two overlap (typing a character next to an identical one) several edits
//! explain the change equally well; the caller's caret hint picks the one the
//! user actually made so that span boundaries in the ambiguous run are not
//! attributed to the wrong side.

use crate::Utf16Range;

/// `range` (in the old text) was replaced by `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: Utf16Range,
    pub replacement: String,
}

impl TextEdit {
    /// Signed change in buffer length caused by this edit.
    pub fn delta(&self) -> isize {
        crate::utf16_len(&self.replacement) as isize - self.range.length as isize
    }
}

fn is_high_surrogate(u: u16) -> bool {
    (0xD800..0xDC00).contains(&u)
}

fn is_low_surrogate(u: u16) -> bool {
    (0xDC00..0xE000).contains(&u)
}

/// Reconstruct the edit from `old` to `new`. `hint` is the UTF-16 offset where
/// the edit most likely starts (for insertions the new caret minus the growth,
/// for deletions the new caret). Returns `None` when the texts are equal.
pub fn reconstruct_edit(old: &str, new: &str, hint: usize) -> Option<TextEdit> {
    if old == new {
        return None;
    }
    let old16: Vec<u16> = old.encode_utf16().collect();
    let new16: Vec<u16> = new.encode_utf16().collect();
    let min_len = old16.len().min(new16.len());

    let max_prefix = old16
        .iter()
        .zip(new16.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let max_suffix = old16
        .iter()
        .rev()
        .zip(new16.iter().rev())
        .take_while(|(a, b)| a == b)
        .count()
        .min(min_len);

    let (mut prefix, mut suffix) = if max_prefix + max_suffix >= min_len {
        // Ambiguous: any split with prefix in [min_len - max_suffix, max_prefix] works.
        let lo = min_len - max_suffix;
        let prefix = hint.clamp(lo, max_prefix);
        (prefix, min_len - prefix)
    } else {
        (max_prefix, max_suffix)
    };

    if prefix > 0 && is_high_surrogate(old16[prefix - 1]) {
        prefix -= 1;
    }
    if suffix > 0 && is_low_surrogate(old16[old16.len() - suffix]) {
        suffix -= 1;
    }

    let range = Utf16Range::from_bounds(prefix, old16.len() - suffix);
    let replacement = String::from_utf16_lossy(&new16[prefix..new16.len() - suffix]);
    Some(TextEdit { range, replacement })
}

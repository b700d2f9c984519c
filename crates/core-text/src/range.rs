//! UTF-16 addressed ranges and the (text, selection) pair shared by every
//! layer of the mention pipeline.
//!
//! Ranges are half-open `[location, location + length)` measured in UTF-16
//! code units, the unit editing surfaces report carets and selections in.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Utf16Range {
    pub location: usize,
    pub length: usize,
}

impl Utf16Range {
    pub const fn new(location: usize, length: usize) -> Self {
        Self { location, length }
    }

    /// Zero-length range (collapsed caret) at `location`.
    pub const fn caret(location: usize) -> Self {
        Self {
            location,
            length: 0,
        }
    }

    /// Build from `[start, end)`. Endpoints are swapped when given out of order.
    pub fn from_bounds(start: usize, end: usize) -> Self {
        let (s, e) = if start <= end {
            (start, end)
        } else {
            (end, start)
        };
        Self {
            location: s,
            length: e - s,
        }
    }

    pub const fn end(&self) -> usize {
        self.location + self.length
    }

    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// True when the range fits inside a buffer of `len` code units.
    pub fn is_within(&self, len: usize) -> bool {
        self.location <= len && self.length <= len - self.location
    }

    /// Non-empty overlap of the two ranges.
    pub fn intersection(&self, other: &Utf16Range) -> Option<Utf16Range> {
        let start = self.location.max(other.location);
        let end = self.end().min(other.end());
        (start < end).then(|| Utf16Range::from_bounds(start, end))
    }

    pub fn intersects(&self, other: &Utf16Range) -> bool {
        self.intersection(other).is_some()
    }

    /// `location < pos < end`; a caret on either boundary is outside.
    pub fn strictly_contains(&self, pos: usize) -> bool {
        self.location < pos && pos < self.end()
    }

    pub fn union(&self, other: &Utf16Range) -> Utf16Range {
        Utf16Range::from_bounds(
            self.location.min(other.location),
            self.end().max(other.end()),
        )
    }

    /// Where this range ends up after `replaced` is substituted by
    /// `new_length` code units. Endpoints inside the replaced region snap to
    /// the end of the replacement.
    pub fn moved_by_replacing(&self, replaced: Utf16Range, new_length: usize) -> Utf16Range {
        let map = |p: usize| {
            if p <= replaced.location {
                p
            } else if p >= replaced.end() {
                p - replaced.length + new_length
            } else {
                replaced.location + new_length
            }
        };
        Utf16Range::from_bounds(map(self.location), map(self.end()))
    }
}

impl fmt::Display for Utf16Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{})", self.location, self.end())
    }
}

/// Buffer content together with its selection (a collapsed caret when empty).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditingContent {
    pub text: String,
    pub selection: Utf16Range,
}

/// The registry keeps exactly one of these: the state observed after the last
/// processed edit.
pub type BufferSnapshot = EditingContent;

impl EditingContent {
    pub fn new(text: impl Into<String>, selection: Utf16Range) -> Self {
        Self {
            text: text.into(),
            selection,
        }
    }

    /// Content with the caret placed at the end of `text`.
    pub fn with_caret_at_end(text: impl Into<String>) -> Self {
        let text = text.into();
        let len = crate::utf16_len(&text);
        Self {
            text,
            selection: Utf16Range::caret(len),
        }
    }

    pub fn len_utf16(&self) -> usize {
        crate::utf16_len(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersection_requires_shared_units() {
        let a = Utf16Range::new(6, 5);
        assert_eq!(a.intersection(&Utf16Range::new(7, 2)), Some(Utf16Range::new(7, 2)));
        assert_eq!(a.intersection(&Utf16Range::new(11, 3)), None);
        assert_eq!(a.intersection(&Utf16Range::new(0, 6)), None);
        assert!(!a.intersects(&Utf16Range::caret(8)));
    }

    #[test]
    fn strictly_contains_excludes_boundaries() {
        let a = Utf16Range::new(6, 5);
        assert!(!a.strictly_contains(6));
        assert!(a.strictly_contains(7));
        assert!(a.strictly_contains(10));
        assert!(!a.strictly_contains(11));
    }

    #[test]
    fn union_covers_both() {
        let a = Utf16Range::caret(8);
        let b = Utf16Range::new(6, 5);
        assert_eq!(a.union(&b), b);
        assert_eq!(Utf16Range::new(2, 2).union(&b), Utf16Range::new(2, 9));
    }

    #[test]
    fn moved_by_replacing_shifts_following_and_snaps_inner() {
        let sel = Utf16Range::caret(10);
        // removal before the caret
        assert_eq!(sel.moved_by_replacing(Utf16Range::new(2, 3), 0), Utf16Range::caret(7));
        // insertion after the caret does not move it
        assert_eq!(sel.moved_by_replacing(Utf16Range::caret(12), 4), sel);
        // selection partially covered by the replaced region
        let wide = Utf16Range::new(4, 6);
        assert_eq!(
            wide.moved_by_replacing(Utf16Range::new(8, 4), 1),
            Utf16Range::new(4, 5)
        );
    }

    #[test]
    fn is_within_checks_both_ends_without_overflow() {
        assert!(Utf16Range::new(2, 3).is_within(5));
        assert!(Utf16Range::caret(5).is_within(5));
        assert!(!Utf16Range::new(2, 4).is_within(5));
        assert!(!Utf16Range::new(1, usize::MAX).is_within(5));
    }

    #[test]
    fn display_is_half_open() {
        assert_eq!(Utf16Range::new(6, 3).to_string(), "[6,9)");
    }
}

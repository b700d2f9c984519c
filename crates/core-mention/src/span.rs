use core_text::{Utf16Range, utf16_len};

use crate::style::{StyleAttributes, StyleKey, StyleValue};

/// A tracked mention: the substituted text and where it currently sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionSpan {
    pub display_text: String,
    pub range: Utf16Range,
    pub target_url: Option<String>,
    pub style: StyleAttributes,
}

impl MentionSpan {
    /// Span covering `display_text` starting at `location`. A target URL is
    /// mirrored into the style as a `Link` attribute.
    pub fn new(
        display_text: impl Into<String>,
        location: usize,
        target_url: Option<String>,
        mut style: StyleAttributes,
    ) -> Self {
        let display_text = display_text.into();
        let range = Utf16Range::new(location, utf16_len(&display_text));
        if let Some(url) = &target_url {
            style.insert(StyleKey::Link, StyleValue::Url(url.clone()));
        }
        Self {
            display_text,
            range,
            target_url,
            style,
        }
    }

    pub(crate) fn shifted(mut self, delta: isize) -> Self {
        self.range.location = self.range.location.saturating_add_signed(delta);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_length_is_utf16() {
        let span = MentionSpan::new("かわいい🐱", 3, None, StyleAttributes::new());
        assert_eq!(span.range, Utf16Range::new(3, 6));
    }

    #[test]
    fn url_becomes_link_attribute() {
        let span = MentionSpan::new(
            "alice",
            0,
            Some("https://example.com/alice".into()),
            StyleAttributes::new(),
        );
        assert_eq!(
            span.style.get(&StyleKey::Link),
            Some(&StyleValue::Url("https://example.com/alice".into()))
        );
    }
}

//! Presentation attributes attached to mention spans.
//!
//! The registry only carries these; renderers read them once per redraw via
//! `MentionRegistry::style_runs` and never hand them back.

use core_text::Utf16Range;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StyleKey {
    /// Render as a link to the value's URL.
    Link,
    ForegroundColor,
    Underline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleValue {
    Url(String),
    Color(Rgb),
    Flag(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const BLUE: Rgb = Rgb::new(0, 0, 0xff);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb`.
    pub fn from_hex(s: &str) -> Option<Self> {
        core_config::parse_hex_color(s).map(|(r, g, b)| Rgb::new(r, g, b))
    }
}

pub type StyleAttributes = BTreeMap<StyleKey, StyleValue>;

/// One decorated range handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRun {
    pub range: Utf16Range,
    pub attributes: StyleAttributes,
}

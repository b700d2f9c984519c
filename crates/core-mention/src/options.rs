use core_config::Config;

use crate::style::{Rgb, StyleAttributes, StyleKey, StyleValue};

/// Registry parameters: what goes after an accepted suggestion and how
/// mentions (and the rest of the text) are decorated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionOptions {
    pub separator: Option<String>,
    pub span_style: StyleAttributes,
    pub base_style: StyleAttributes,
    /// `{name}` is replaced by the accepted suggestion.
    pub url_template: Option<String>,
    /// A deletion that cuts into a mention removes the mention's remaining
    /// text too.
    pub atomic_delete: bool,
}

impl Default for MentionOptions {
    fn default() -> Self {
        Self {
            separator: Some(" ".to_string()),
            span_style: StyleAttributes::from([(
                StyleKey::ForegroundColor,
                StyleValue::Color(Rgb::BLUE),
            )]),
            base_style: StyleAttributes::from([(
                StyleKey::ForegroundColor,
                StyleValue::Color(Rgb::BLACK),
            )]),
            url_template: None,
            atomic_delete: false,
        }
    }
}

impl MentionOptions {
    pub fn from_config(cfg: &Config) -> Self {
        let style = &cfg.file.style;
        let mut span_style = StyleAttributes::new();
        span_style.insert(
            StyleKey::ForegroundColor,
            StyleValue::Color(Rgb::from_hex(&style.mention_color).unwrap_or(Rgb::BLUE)),
        );
        if style.underline {
            span_style.insert(StyleKey::Underline, StyleValue::Flag(true));
        }
        let base_style = StyleAttributes::from([(
            StyleKey::ForegroundColor,
            StyleValue::Color(Rgb::from_hex(&style.base_color).unwrap_or(Rgb::BLACK)),
        )]);
        Self {
            separator: cfg.separator().map(str::to_string),
            span_style,
            base_style,
            url_template: style.url_template.clone(),
            atomic_delete: cfg.file.completion.atomic_delete,
        }
    }

    pub fn url_for(&self, name: &str) -> Option<String> {
        self.url_template
            .as_ref()
            .map(|template| template.replace("{name}", name))
    }
}

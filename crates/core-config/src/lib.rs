//! Configuration loading and parsing.
//!
//! Parses `mentions.toml` (or an override path supplied by the binary). Every
//! field has a default so a missing file, a missing section or a file that
//! fails to parse all yield a usable configuration; parse failures are logged
//! and otherwise ignored. Unknown fields are ignored (TOML deserialization
//! tolerance) to allow forward evolution without immediate warnings.
//!
//! Values that need validation beyond their TOML type (the trigger marker must
//! be exactly one character, colors must be `#rrggbb`) are checked by
//! `Config::validate` so consumers can rely on them afterwards.

use anyhow::{Result, bail};
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "mentions.toml";

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TriggerConfig {
    #[serde(default = "TriggerConfig::default_marker")]
    pub marker: String,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            marker: Self::default_marker(),
        }
    }
}

impl TriggerConfig {
    fn default_marker() -> String {
        "@".to_string()
    }

    /// The marker as a single character (validated by `Config::validate`).
    pub fn marker_char(&self) -> char {
        self.marker.chars().next().unwrap_or('@')
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CompletionConfig {
    /// Appended after an accepted suggestion; empty disables it.
    #[serde(default = "CompletionConfig::default_separator")]
    pub separator: String,
    #[serde(default = "CompletionConfig::default_candidates")]
    pub candidates: Vec<String>,
    /// Narrow candidates to those starting with the partial query.
    #[serde(default = "CompletionConfig::default_filter_by_query")]
    pub filter_by_query: bool,
    /// Deleting part of a mention deletes the rest of its text as well.
    #[serde(default)]
    pub atomic_delete: bool,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            separator: Self::default_separator(),
            candidates: Self::default_candidates(),
            filter_by_query: Self::default_filter_by_query(),
            atomic_delete: false,
        }
    }
}

impl CompletionConfig {
    fn default_separator() -> String {
        " ".to_string()
    }
    fn default_candidates() -> Vec<String> {
        ["meow", "cat", "wowcat", "かわいい🐱"]
            .into_iter()
            .map(String::from)
            .collect()
    }
    const fn default_filter_by_query() -> bool {
        true
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct StyleConfig {
    #[serde(default = "StyleConfig::default_mention_color")]
    pub mention_color: String,
    #[serde(default = "StyleConfig::default_base_color")]
    pub base_color: String,
    #[serde(default)]
    pub underline: bool,
    /// `{name}` is replaced by the accepted suggestion.
    #[serde(default)]
    pub url_template: Option<String>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            mention_color: Self::default_mention_color(),
            base_color: Self::default_base_color(),
            underline: false,
            url_template: None,
        }
    }
}

impl StyleConfig {
    fn default_mention_color() -> String {
        "#0000ff".to_string()
    }
    fn default_base_color() -> String {
        "#000000".to_string()
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct InputConfig {
    #[serde(default = "InputConfig::default_strip_bidi_controls")]
    pub strip_bidi_controls: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            strip_bidi_controls: Self::default_strip_bidi_controls(),
        }
    }
}

impl InputConfig {
    const fn default_strip_bidi_controls() -> bool {
        true
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub trigger: TriggerConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub style: StyleConfig,
    #[serde(default)]
    pub input: InputConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
}

/// Parse `#rrggbb` into its components.
pub fn parse_hex_color(s: &str) -> Option<(u8, u8, u8)> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Best-effort config path: working directory first, then the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("mentions").join(CONFIG_FILE_NAME);
    }
    PathBuf::from(CONFIG_FILE_NAME)
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    let file = match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => file,
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
            return Ok(Config::default());
        }
    };
    let cfg = Config {
        raw: Some(content),
        file,
    };
    if let Err(e) = cfg.validate() {
        warn!(target: "config", path = %path.display(), error = %e, "config_invalid_using_defaults");
        return Ok(Config::default());
    }
    info!(
        target: "config",
        path = %path.display(),
        candidates = cfg.file.completion.candidates.len(),
        strip_bidi = cfg.file.input.strip_bidi_controls,
        "config_loaded"
    );
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        let marker = &self.file.trigger.marker;
        if marker.chars().count() != 1 {
            bail!("trigger.marker must be a single character, got {marker:?}");
        }
        if self.file.trigger.marker_char().is_whitespace() {
            bail!("trigger.marker must not be whitespace");
        }
        for (name, value) in [
            ("style.mention_color", &self.file.style.mention_color),
            ("style.base_color", &self.file.style.base_color),
        ] {
            if parse_hex_color(value).is_none() {
                bail!("{name} must be #rrggbb, got {value:?}");
            }
        }
        Ok(())
    }

    /// Separator appended after accepted suggestions, if any.
    pub fn separator(&self) -> Option<&str> {
        let sep = self.file.completion.separator.as_str();
        (!sep.is_empty()).then_some(sep)
    }
}

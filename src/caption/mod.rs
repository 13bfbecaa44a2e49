//! Caption transformation.
//!
//! [`CaptionTransformer`] is a pure function of `(raw caption, formatted
//! sequence number)` configured once at startup with a [`Mode`] and a rule
//! record. It holds no mutable state, so one instance can be shared across
//! tasks without locking. Captions that lack the expected structure never
//! produce errors; every mode ends in a defined fallback.

mod clean;
mod config;
mod extract;
mod glyphs;
mod markup;
mod modes;
mod numbering;

use regex::Regex;
use serde::Serialize;

pub use clean::{collapse_whitespace, strip_leading_ordinal, CharClass, Cleaner, CleaningRules};
pub use config::{AfterRule, CaptionConfig, Mode};
pub use extract::{find_ignore_case, locate, Located, Marker};
pub use glyphs::{stylize, GlyphStyle};
pub use markup::{blockquote, escape_html, fill_empty_blockquotes, PLACEHOLDER};
pub use numbering::{NumberFormat, NumberWrap};

use crate::contracts::ConfigError;

/// Caption text to apply. Empty means "clear the caption".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformResult {
    pub text: String,
}

impl TransformResult {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

#[derive(Debug, Clone)]
pub struct CaptionTransformer {
    mode: Mode,
    numbering: NumberFormat,
    glyphs: GlyphStyle,
    cleaner: Cleaner,
    /// Raw phrases for `Mode::Scrub`, removed verbatim.
    scrub_phrases: Vec<String>,
    /// Compiled `AfterRule::truncate_at` for `Mode::TwoFieldSplit`.
    truncate: Option<Regex>,
    escape_html: bool,
}

impl CaptionTransformer {
    /// Validates `config` and compiles its patterns.
    pub fn new(config: CaptionConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let cleaner = Cleaner::new(&config.cleaning)?;
        let truncate = match &config.mode {
            Mode::TwoFieldSplit {
                after:
                    AfterRule {
                        truncate_at: Some(keyword),
                        ..
                    },
                ..
            } => Some(clean::keyword_regex(keyword, "mode.after.truncate_at")?),
            _ => None,
        };

        tracing::debug!(mode = config.mode.name(), "Caption transformer configured");

        Ok(Self {
            mode: config.mode,
            numbering: config.numbering,
            glyphs: config.glyphs,
            cleaner,
            scrub_phrases: config.cleaning.unwanted_phrases,
            truncate,
            escape_html: config.escape_html,
        })
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn consumes_sequence(&self) -> bool {
        self.mode.consumes_sequence()
    }

    /// Renders `sequence` in the configured numbering style.
    pub fn format_sequence(&self, sequence: u64) -> String {
        self.numbering.format(sequence, self.glyphs)
    }

    /// Transforms `raw` using an already formatted sequence number.
    pub fn transform(&self, raw: &str, numbering: &str) -> TransformResult {
        TransformResult {
            text: self.render(raw, numbering),
        }
    }

    /// Formats `sequence` and transforms `raw` with it.
    pub fn transform_sequence(&self, raw: &str, sequence: u64) -> TransformResult {
        self.transform(raw, &self.format_sequence(sequence))
    }
}

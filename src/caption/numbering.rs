use serde::{Deserialize, Serialize};

use super::glyphs::{stylize, GlyphStyle};

/// How the padded number is wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberWrap {
    /// `[001]`
    #[default]
    Bracketed,
    /// `001)`
    TrailingParen,
    /// `001.`
    TrailingDot,
    /// `001`
    Bare,
}

/// Display format of a sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberFormat {
    /// Minimum digit count; shorter numbers are zero-padded.
    pub width: usize,
    pub wrap: NumberWrap,
    /// Render the digits in the configured glyph style.
    pub stylize: bool,
    /// Fixed text placed before the number, e.g. `Class` for `Class [001]`.
    pub label: Option<String>,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            width: 3,
            wrap: NumberWrap::Bracketed,
            stylize: true,
            label: None,
        }
    }
}

impl NumberFormat {
    /// Bracketed, three digits, plain ASCII.
    pub fn plain() -> Self {
        Self {
            stylize: false,
            ..Self::default()
        }
    }

    pub fn format(&self, sequence: u64, glyphs: GlyphStyle) -> String {
        let digits = format!("{:0width$}", sequence, width = self.width);
        let digits = if self.stylize {
            stylize(&digits, glyphs)
        } else {
            digits
        };

        let wrapped = match self.wrap {
            NumberWrap::Bracketed => format!("[{}]", digits),
            NumberWrap::TrailingParen => format!("{})", digits),
            NumberWrap::TrailingDot => format!("{}.", digits),
            NumberWrap::Bare => digits,
        };

        match self.label.as_deref().map(str::trim) {
            Some(label) if !label.is_empty() => format!("{} {}", label, wrapped),
            _ => wrapped,
        }
    }
}

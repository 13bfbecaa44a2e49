use serde::{Deserialize, Serialize};

use super::clean::CleaningRules;
use super::extract::Marker;
use super::glyphs::GlyphStyle;
use super::numbering::NumberFormat;
use crate::contracts::ConfigError;

/// Rule set applied by the transformer. Chosen by configuration, never
/// inferred from the caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mode {
    /// `template` with `{numbering}` and `{caption}` substituted. No quote.
    PlainPrefix {
        #[serde(default = "default_template")]
        template: String,
        #[serde(default)]
        clean: bool,
    },
    /// `<blockquote>{numbering} {cleaned caption}</blockquote>`
    SingleField,
    /// Quoted, cleaned text before `delimiter`; text after it on the next line.
    TwoFieldSplit {
        delimiter: String,
        #[serde(default)]
        after: AfterRule,
    },
    /// Quoted, stylized suffix starting at `keyword`; prefix on the next line.
    SuffixAnchored {
        keyword: String,
        #[serde(default = "default_true")]
        stylize_suffix: bool,
        #[serde(default)]
        stylize_fallback: bool,
    },
    /// Always the empty caption.
    Clear,
    /// Quoted numbering (plus optional heading); text between the markers
    /// on the next line.
    MarkerSpan {
        start: Marker,
        #[serde(default)]
        end: Option<Marker>,
        #[serde(default)]
        heading: Option<String>,
        /// Treat a missing end marker like a missing start marker.
        #[serde(default)]
        require_end: bool,
        /// Cut at the first end marker before searching for `start`; with no
        /// start marker in the remainder the whole remainder is kept.
        #[serde(default)]
        truncate_first: bool,
        #[serde(default)]
        clean: bool,
    },
    /// Removes unwanted phrases verbatim and repairs empty block quotes,
    /// keeping all other markup.
    Scrub,
}

/// Handling of the text after a two-field delimiter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AfterRule {
    /// Drop everything from this keyword (case-insensitive, starting at a
    /// word boundary) on. `Batch` also cuts at `Batches`.
    pub truncate_at: Option<String>,
    pub clean: bool,
}

fn default_template() -> String {
    "{numbering} {caption}".into()
}

fn default_true() -> bool {
    true
}

impl Default for Mode {
    fn default() -> Self {
        Mode::TwoFieldSplit {
            delimiter: "//".into(),
            after: AfterRule {
                truncate_at: Some("Batch".into()),
                clean: false,
            },
        }
    }
}

impl Mode {
    /// Whether applying this mode draws a sequence number.
    pub fn consumes_sequence(&self) -> bool {
        !matches!(self, Mode::Clear | Mode::Scrub)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mode::PlainPrefix { .. } => "plain_prefix",
            Mode::SingleField => "single_field",
            Mode::TwoFieldSplit { .. } => "two_field_split",
            Mode::SuffixAnchored { .. } => "suffix_anchored",
            Mode::Clear => "clear",
            Mode::MarkerSpan { .. } => "marker_span",
            Mode::Scrub => "scrub",
        }
    }
}

/// Everything the transformer needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    pub mode: Mode,
    pub numbering: NumberFormat,
    /// Glyph block for stylized numbers and text.
    pub glyphs: GlyphStyle,
    pub cleaning: CleaningRules,
    /// Escape `&`, `<`, `>` in caption text placed into generated markup.
    pub escape_html: bool,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            numbering: NumberFormat::default(),
            glyphs: GlyphStyle::default(),
            cleaning: CleaningRules::default(),
            escape_html: true,
        }
    }
}

impl CaptionConfig {
    /// Default rules with the given mode.
    pub fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Checks literals and numbering settings. Regex compilation errors are
    /// reported by `CaptionTransformer::new`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=20).contains(&self.numbering.width) {
            return Err(ConfigError::invalid(
                "numbering.width",
                format!("must be between 1 and 20, got {}", self.numbering.width),
            ));
        }

        match &self.mode {
            Mode::PlainPrefix { template, .. } => {
                if !template.contains("{numbering}") {
                    return Err(ConfigError::invalid(
                        "mode.template",
                        "must contain {numbering}",
                    ));
                }
            }
            Mode::TwoFieldSplit { delimiter, after } => {
                require_literal(delimiter, "mode.delimiter")?;
                if let Some(ref keyword) = after.truncate_at {
                    require_literal(keyword, "mode.after.truncate_at")?;
                }
            }
            Mode::SuffixAnchored { keyword, .. } => require_literal(keyword, "mode.keyword")?,
            Mode::MarkerSpan {
                start,
                end,
                require_end,
                truncate_first,
                ..
            } => {
                require_marker(start, "mode.start")?;
                match end {
                    Some(end) => require_marker(end, "mode.end")?,
                    None if *require_end => {
                        return Err(ConfigError::invalid(
                            "mode.require_end",
                            "set without an end marker",
                        ))
                    }
                    None if *truncate_first => {
                        return Err(ConfigError::invalid(
                            "mode.truncate_first",
                            "set without an end marker",
                        ))
                    }
                    None => {}
                }
            }
            Mode::SingleField | Mode::Clear | Mode::Scrub => {}
        }

        Ok(())
    }
}

fn require_literal(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Missing(field.into()));
    }
    Ok(())
}

fn require_marker(marker: &Marker, field: &str) -> Result<(), ConfigError> {
    require_literal(&marker.text, &format!("{}.text", field))?;
    if marker.occurrence == 0 {
        return Err(ConfigError::invalid(
            &format!("{}.occurrence", field),
            "occurrences are counted from 1",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_two_field_split() {
        let config = CaptionConfig::default();
        assert_eq!(config.mode.name(), "two_field_split");
        assert!(config.escape_html);
        config.validate().unwrap();
    }

    #[test]
    fn consumes_sequence() {
        assert!(Mode::SingleField.consumes_sequence());
        assert!(Mode::default().consumes_sequence());
        assert!(!Mode::Clear.consumes_sequence());
        assert!(!Mode::Scrub.consumes_sequence());
    }

    #[test]
    fn parses_tagged_modes_from_toml() {
        let config = CaptionConfig::from_toml_str(
            r##"
            glyphs = "double_struck"

            [mode]
            kind = "marker_span"
            heading = "Indian Geography"
            require_end = true

            [mode.start]
            text = "indian geography-"
            case_insensitive = true

            [mode.end]
            text = "#END"

            [numbering]
            stylize = false
            wrap = "trailing_paren"
            "##,
        )
        .unwrap();

        assert_eq!(config.glyphs, GlyphStyle::DoubleStruck);
        assert!(!config.numbering.stylize);
        match config.mode {
            Mode::MarkerSpan {
                start,
                end,
                heading,
                require_end,
                truncate_first,
                clean,
            } => {
                assert!(start.case_insensitive);
                assert_eq!(start.occurrence, 1);
                assert_eq!(end.unwrap().text, "#END");
                assert_eq!(heading.as_deref(), Some("Indian Geography"));
                assert!(require_end);
                assert!(!truncate_first);
                assert!(!clean);
            }
            other => panic!("unexpected mode {:?}", other),
        }
    }

    #[test]
    fn unit_modes_parse() {
        let config = CaptionConfig::from_toml_str("[mode]\nkind = \"clear\"\n").unwrap();
        assert_eq!(config.mode, Mode::Clear);
    }

    #[test]
    fn rejects_bad_toml() {
        let err = CaptionConfig::from_toml_str("[mode]\nkind = \"sideways\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn validate_rejects_missing_literals() {
        let empty_delimiter = CaptionConfig::with_mode(Mode::TwoFieldSplit {
            delimiter: " ".into(),
            after: AfterRule::default(),
        });
        assert!(matches!(
            empty_delimiter.validate(),
            Err(ConfigError::Missing(_))
        ));

        let empty_keyword = CaptionConfig::with_mode(Mode::SuffixAnchored {
            keyword: String::new(),
            stylize_suffix: true,
            stylize_fallback: false,
        });
        assert!(empty_keyword.validate().is_err());

        let template = CaptionConfig::with_mode(Mode::PlainPrefix {
            template: "{caption}".into(),
            clean: false,
        });
        assert!(matches!(
            template.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn validate_checks_markers_and_width() {
        let zero_occurrence = CaptionConfig::with_mode(Mode::MarkerSpan {
            start: Marker::literal(":").nth(0),
            end: None,
            heading: None,
            require_end: false,
            truncate_first: false,
            clean: false,
        });
        assert!(zero_occurrence.validate().is_err());

        let dangling = CaptionConfig::with_mode(Mode::MarkerSpan {
            start: Marker::literal(":"),
            end: None,
            heading: None,
            require_end: true,
            truncate_first: false,
            clean: false,
        });
        assert!(dangling.validate().is_err());

        let unbounded_cut = CaptionConfig::with_mode(Mode::MarkerSpan {
            start: Marker::literal(":"),
            end: None,
            heading: None,
            require_end: false,
            truncate_first: true,
            clean: false,
        });
        assert!(matches!(
            unbounded_cut.validate(),
            Err(ConfigError::Invalid { .. })
        ));

        let mut wide = CaptionConfig::default();
        wide.numbering.width = 0;
        assert!(wide.validate().is_err());
    }
}

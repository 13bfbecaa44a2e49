//! Per-mode rendering rules.

use std::borrow::Cow;

use super::clean::{collapse_whitespace, strip_leading_ordinal};
use super::config::{AfterRule, Mode};
use super::extract::{locate, Located, Marker};
use super::glyphs::stylize;
use super::markup::{blockquote, escape_html, fill_empty_blockquotes};
use super::CaptionTransformer;

impl CaptionTransformer {
    pub(super) fn render(&self, raw: &str, numbering: &str) -> String {
        match &self.mode {
            Mode::PlainPrefix { template, clean } => {
                self.plain_prefix(raw, numbering, template, *clean)
            }
            Mode::SingleField => self.quote_line(numbering, &self.cleaner.clean(raw)),
            Mode::TwoFieldSplit { delimiter, after } => {
                self.two_field_split(raw, numbering, delimiter, after)
            }
            Mode::SuffixAnchored {
                keyword,
                stylize_suffix,
                stylize_fallback,
            } => self.suffix_anchored(raw, numbering, keyword, *stylize_suffix, *stylize_fallback),
            Mode::Clear => String::new(),
            Mode::MarkerSpan {
                start,
                end,
                heading,
                require_end,
                truncate_first,
                clean,
            } => {
                let extracted = if *truncate_first {
                    end_truncated_span(raw, start, end.as_ref(), *require_end)
                } else {
                    span_after_start(raw, start, end.as_ref(), *require_end)
                };
                self.render_span(raw, numbering, extracted, heading.as_deref(), *clean)
            }
            Mode::Scrub => self.scrub(raw),
        }
    }

    fn plain_prefix(&self, raw: &str, numbering: &str, template: &str, clean: bool) -> String {
        let body = if clean {
            self.cleaner.clean(raw)
        } else {
            raw.trim().to_string()
        };
        template
            .replace("{original_caption}", "{caption}")
            .replace("{numbering}", &self.escaped(numbering.trim()))
            .replace("{caption}", &self.escaped(&body))
            .trim()
            .to_string()
    }

    fn two_field_split(
        &self,
        raw: &str,
        numbering: &str,
        delimiter: &str,
        after: &AfterRule,
    ) -> String {
        let (before, rest) = match locate(raw, &Marker::literal(delimiter), None) {
            Located::Partial { before, rest, .. } => (before, rest),
            // No delimiter: the whole caption is the primary field
            _ => (raw, ""),
        };

        let mut tail = rest;
        if let Some(ref re) = self.truncate {
            if let Some(m) = re.find(tail) {
                tail = &tail[..m.start()];
            }
        }
        let tail = if after.clean {
            self.cleaner.clean(tail)
        } else {
            tail.trim().to_string()
        };

        self.with_tail(self.quote_line(numbering, &self.cleaner.clean(before)), &tail)
    }

    fn suffix_anchored(
        &self,
        raw: &str,
        numbering: &str,
        keyword: &str,
        stylize_suffix: bool,
        stylize_fallback: bool,
    ) -> String {
        match locate(raw, &Marker::ignore_case(keyword), None) {
            Located::Partial {
                before,
                start,
                rest,
            } => {
                let suffix = collapse_whitespace(&format!("{}{}", start, rest));
                let suffix = if stylize_suffix {
                    stylize(&suffix, self.glyphs)
                } else {
                    suffix
                };
                self.with_tail(
                    self.quote_line(numbering, &suffix),
                    strip_leading_ordinal(before),
                )
            }
            _ => {
                let body = raw.trim();
                let body = if stylize_fallback {
                    stylize(body, self.glyphs)
                } else {
                    body.to_string()
                };
                self.with_tail(self.quote_line(numbering, ""), &body)
            }
        }
    }

    /// `extracted` is `None` when the markers were not found; the caption
    /// is then kept whole under a bare numbering quote.
    fn render_span(
        &self,
        raw: &str,
        numbering: &str,
        extracted: Option<&str>,
        heading: Option<&str>,
        clean: bool,
    ) -> String {
        let Some(extracted) = extracted else {
            return self.with_tail(self.quote_line(numbering, ""), raw);
        };

        let body = if clean {
            self.cleaner.clean(extracted)
        } else {
            extracted.trim().to_string()
        };
        let head = heading.map(str::trim).unwrap_or_default();
        self.with_tail(self.quote_line(numbering, head), &body)
    }

    fn scrub(&self, raw: &str) -> String {
        let scrubbed = self
            .scrub_phrases
            .iter()
            .filter(|p| !p.is_empty())
            .fold(raw.to_string(), |acc, phrase| acc.replace(phrase.as_str(), ""));
        fill_empty_blockquotes(&scrubbed)
    }

    /// `<blockquote>{numbering} {body}</blockquote>`, or the numbering alone
    /// when `body` is blank.
    fn quote_line(&self, numbering: &str, body: &str) -> String {
        let numbering = self.escaped(numbering.trim());
        let body = self.escaped(body.trim());
        if body.is_empty() {
            blockquote(&numbering)
        } else {
            blockquote(&format!("{} {}", numbering, body))
        }
    }

    /// Appends `tail` on the next line unless it is blank.
    fn with_tail(&self, quote: String, tail: &str) -> String {
        let tail = tail.trim();
        if tail.is_empty() {
            quote
        } else {
            format!("{}\n{}", quote, self.escaped(tail))
        }
    }

    fn escaped<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if self.escape_html {
            escape_html(text)
        } else {
            Cow::Borrowed(text)
        }
    }
}

/// Text after `start`, up to `end` when it follows. `None` when `start` is
/// absent, or `end` is required and absent.
fn span_after_start<'a>(
    raw: &'a str,
    start: &Marker,
    end: Option<&Marker>,
    require_end: bool,
) -> Option<&'a str> {
    match locate(raw, start, end) {
        Located::Full { inner, .. } => Some(inner),
        Located::Partial { rest, .. } if !(require_end && end.is_some()) => Some(rest),
        _ => None,
    }
}

/// Cuts `raw` at the first `end`, then keeps the text after `start` within
/// that prefix, or the whole prefix when `start` does not occur in it.
fn end_truncated_span<'a>(
    raw: &'a str,
    start: &Marker,
    end: Option<&Marker>,
    require_end: bool,
) -> Option<&'a str> {
    let scope = match end.and_then(|marker| marker.find_in(raw, 0)) {
        Some(e) => &raw[..e.start],
        None if require_end => return None,
        None => raw,
    };
    match locate(scope, start, None) {
        Located::Partial { rest, .. } => Some(rest),
        _ => Some(scope),
    }
}

#[cfg(test)]
mod tests {
    use crate::caption::{
        AfterRule, CaptionConfig, CaptionTransformer, CharClass, CleaningRules, GlyphStyle,
        Marker, Mode, NumberFormat, NumberWrap,
    };

    fn transformer(mode: Mode, cleaning: CleaningRules) -> CaptionTransformer {
        CaptionTransformer::new(CaptionConfig {
            mode,
            numbering: NumberFormat::plain(),
            cleaning,
            ..CaptionConfig::default()
        })
        .unwrap()
    }

    fn render(t: &CaptionTransformer, raw: &str, sequence: u64) -> String {
        t.transform_sequence(raw, sequence).into_text()
    }

    // ---------------------------------------------------------------------
    // Plain prefix
    // ---------------------------------------------------------------------

    #[test]
    fn plain_prefix_default_template() {
        let t = transformer(
            Mode::PlainPrefix {
                template: "{numbering} {caption}".into(),
                clean: false,
            },
            CleaningRules::default(),
        );
        assert_eq!(render(&t, "  Lecture 4  ", 12), "[012] Lecture 4");
        assert_eq!(render(&t, "", 12), "[012]");
    }

    #[test]
    fn plain_prefix_custom_template_and_wrap() {
        let t = CaptionTransformer::new(CaptionConfig {
            mode: Mode::PlainPrefix {
                template: "{numbering} {caption} | archive".into(),
                clean: true,
            },
            numbering: NumberFormat {
                wrap: NumberWrap::TrailingParen,
                ..NumberFormat::plain()
            },
            ..CaptionConfig::default()
        })
        .unwrap();
        assert_eq!(render(&t, "• Optics!!", 3), "003) Optics | archive");
    }

    #[test]
    fn plain_prefix_accepts_original_caption_placeholder() {
        let t = transformer(
            Mode::PlainPrefix {
                template: "{numbering}. {original_caption}".into(),
                clean: false,
            },
            CleaningRules::default(),
        );
        assert_eq!(render(&t, "Lecture 4", 7), "[007]. Lecture 4");
    }

    #[test]
    fn plain_prefix_escapes_numbering_label() {
        let t = CaptionTransformer::new(CaptionConfig {
            mode: Mode::PlainPrefix {
                template: "{numbering} {caption}".into(),
                clean: false,
            },
            numbering: NumberFormat {
                label: Some("Q&A".into()),
                ..NumberFormat::plain()
            },
            ..CaptionConfig::default()
        })
        .unwrap();
        let quoted = CaptionTransformer::new(CaptionConfig {
            mode: Mode::SingleField,
            numbering: NumberFormat {
                label: Some("Q&A".into()),
                ..NumberFormat::plain()
            },
            ..CaptionConfig::default()
        })
        .unwrap();
        assert_eq!(render(&t, "x", 1), "Q&amp;A [001] x");
        assert_eq!(render(&quoted, "", 1), "<blockquote>Q&amp;A [001]</blockquote>");
    }

    // ---------------------------------------------------------------------
    // Single field
    // ---------------------------------------------------------------------

    #[test]
    fn single_field_cleans_and_quotes() {
        let t = transformer(
            Mode::SingleField,
            CleaningRules {
                unwanted_phrases: vec!["Join @channel".into()],
                ..CleaningRules::default()
            },
        );
        assert_eq!(
            render(&t, "1. Work & Energy\nJoin @channel", 4),
            "<blockquote>[004] Work Energy</blockquote>"
        );
        assert_eq!(render(&t, "!!!", 5), "<blockquote>[005]</blockquote>");
    }

    // ---------------------------------------------------------------------
    // Two-field split
    // ---------------------------------------------------------------------

    #[test]
    fn two_field_split_without_delimiter_quotes_whole_caption() {
        let t = transformer(Mode::default(), CleaningRules::default());
        assert_eq!(
            render(&t, "Algebra Basics Batch 7", 1),
            "<blockquote>[001] Algebra Basics Batch 7</blockquote>"
        );
    }

    #[test]
    fn two_field_split_empty_parts() {
        let t = transformer(Mode::default(), CleaningRules::default());
        assert_eq!(render(&t, " // Batch 2024", 6), "<blockquote>[006]</blockquote>");
        assert_eq!(render(&t, "", 6), "<blockquote>[006]</blockquote>");
    }

    #[test]
    fn two_field_split_keeps_after_text_verbatim_unless_cleaned() {
        let verbatim = transformer(
            Mode::TwoFieldSplit {
                delimiter: "||".into(),
                after: AfterRule::default(),
            },
            CleaningRules::default(),
        );
        assert_eq!(
            render(&verbatim, "Title || notes: part #2 || more", 7),
            "<blockquote>[007] Title</blockquote>\nnotes: part #2 || more"
        );

        let cleaned = transformer(
            Mode::TwoFieldSplit {
                delimiter: "||".into(),
                after: AfterRule {
                    truncate_at: None,
                    clean: true,
                },
            },
            CleaningRules::default(),
        );
        assert_eq!(
            render(&cleaned, "Title || notes: part #2", 7),
            "<blockquote>[007] Title</blockquote>\nnotes part 2"
        );
    }

    #[test]
    fn two_field_split_truncation_cuts_at_keyword_prefix() {
        let t = transformer(Mode::default(), CleaningRules::default());
        assert_eq!(
            render(&t, "Stats // Batches explained BATCH 9", 2),
            "<blockquote>[002] Stats</blockquote>"
        );
        assert_eq!(
            render(&t, "Stats // Subbatch notes", 3),
            "<blockquote>[003] Stats</blockquote>\nSubbatch notes"
        );
    }

    // ---------------------------------------------------------------------
    // Suffix anchored
    // ---------------------------------------------------------------------

    #[test]
    fn suffix_anchored_moves_suffix_into_quote() {
        let t = transformer(
            Mode::SuffixAnchored {
                keyword: "class date".into(),
                stylize_suffix: false,
                stylize_fallback: false,
            },
            CleaningRules::default(),
        );
        assert_eq!(
            render(&t, "3. Thermodynamics\nClass Date:\n 12/05", 8),
            "<blockquote>[008] Class Date: 12/05</blockquote>\nThermodynamics"
        );
    }

    #[test]
    fn suffix_anchored_stylizes_suffix() {
        let t = transformer(
            Mode::SuffixAnchored {
                keyword: "Class".into(),
                stylize_suffix: true,
                stylize_fallback: false,
            },
            CleaningRules::default(),
        );
        assert_eq!(
            render(&t, "Optics Class 1", 1),
            "<blockquote>[001] \u{1D5A2}\u{1D5C5}\u{1D5BA}\u{1D5CC}\u{1D5CC} \u{1D7E3}</blockquote>\nOptics"
        );
    }

    #[test]
    fn suffix_anchored_fallback_can_stylize() {
        let t = CaptionTransformer::new(CaptionConfig {
            mode: Mode::SuffixAnchored {
                keyword: "Class".into(),
                stylize_suffix: true,
                stylize_fallback: true,
            },
            numbering: NumberFormat::plain(),
            glyphs: GlyphStyle::Monospace,
            ..CaptionConfig::default()
        })
        .unwrap();
        assert_eq!(
            render(&t, "Hi", 2),
            "<blockquote>[002]</blockquote>\n\u{1D677}\u{1D692}"
        );
        assert_eq!(render(&t, "   ", 2), "<blockquote>[002]</blockquote>");
    }

    // ---------------------------------------------------------------------
    // Marker span
    // ---------------------------------------------------------------------

    fn geography() -> Mode {
        Mode::MarkerSpan {
            start: Marker::ignore_case("indian geography-"),
            end: Some(Marker::literal("#END")),
            heading: Some("Indian Geography".into()),
            require_end: true,
            truncate_first: false,
            clean: false,
        }
    }

    #[test]
    fn marker_span_full_match() {
        let t = transformer(geography(), CleaningRules::default());
        assert_eq!(
            render(&t, "INDIAN GEOGRAPHY- Rivers of India. #END extra", 1),
            "<blockquote>[001] Indian Geography</blockquote>\nRivers of India."
        );
    }

    #[test]
    fn marker_span_required_end_missing_falls_back() {
        let t = transformer(geography(), CleaningRules::default());
        assert_eq!(
            render(&t, "Indian Geography- Rivers", 2),
            "<blockquote>[002]</blockquote>\nIndian Geography- Rivers"
        );
    }

    #[test]
    fn marker_span_partial_uses_rest() {
        let t = transformer(
            Mode::MarkerSpan {
                start: Marker::literal(":").nth(2),
                end: Some(Marker::ignore_case(".mkv")),
                heading: None,
                require_end: false,
                truncate_first: false,
                clean: true,
            },
            CleaningRules {
                unwanted_phrases: vec!["VIDEO".into()],
                strip_bracketed: true,
                ..CleaningRules::default()
            },
        );
        assert_eq!(
            render(&t, "Batch: Physics: [HD] VIDEO Kinematics - Part 1.MKV", 3),
            "<blockquote>[003]</blockquote>\nKinematics Part 1"
        );
        assert_eq!(
            render(&t, "Only: Kinematics Part 2", 4),
            "<blockquote>[004]</blockquote>\nKinematics Part 2"
        );
    }

    #[test]
    fn marker_span_missing_start_keeps_caption() {
        let t = transformer(geography(), CleaningRules::default());
        assert_eq!(
            render(&t, "  Plain caption  ", 5),
            "<blockquote>[005]</blockquote>\nPlain caption"
        );
        assert_eq!(render(&t, "", 5), "<blockquote>[005]</blockquote>");
    }

    #[test]
    fn marker_span_empty_extraction_is_quote_only() {
        let t = transformer(geography(), CleaningRules::default());
        assert_eq!(
            render(&t, "Indian Geography-   #END", 6),
            "<blockquote>[006] Indian Geography</blockquote>"
        );
    }

    #[test]
    fn labelled_numbering_in_marker_span() {
        let t = CaptionTransformer::new(CaptionConfig {
            mode: Mode::MarkerSpan {
                start: Marker::literal(":").nth(2),
                end: Some(Marker::literal("~~")),
                heading: None,
                require_end: false,
                truncate_first: false,
                clean: false,
            },
            numbering: NumberFormat {
                label: Some("Class".into()),
                ..NumberFormat::plain()
            },
            ..CaptionConfig::default()
        })
        .unwrap();
        assert_eq!(
            render(&t, "Sub: Topic: Plate tectonics ~~ promo", 11),
            "<blockquote>Class [011]</blockquote>\nPlate tectonics"
        );
    }

    fn signature_cut(start: Marker, end: Marker, clean: bool) -> Mode {
        Mode::MarkerSpan {
            start,
            end: Some(end),
            heading: None,
            require_end: false,
            truncate_first: true,
            clean,
        }
    }

    #[test]
    fn truncate_first_without_start_keeps_cut_text() {
        let t = transformer(
            signature_cut(Marker::literal(":").nth(2), Marker::literal("~~"), false),
            CleaningRules::default(),
        );
        assert_eq!(
            render(&t, "Tenses part 1 ~~ promo", 4),
            "<blockquote>[004]</blockquote>\nTenses part 1"
        );
        assert_eq!(
            render(&t, "No signature here", 5),
            "<blockquote>[005]</blockquote>\nNo signature here"
        );
    }

    #[test]
    fn truncate_first_ignores_markers_after_the_cut() {
        let t = transformer(
            signature_cut(Marker::literal(":").nth(2), Marker::literal("~~"), false),
            CleaningRules::default(),
        );
        assert_eq!(
            render(&t, "English: Tenses ~~ join: here", 6),
            "<blockquote>[006]</blockquote>\nTenses"
        );
        assert_eq!(
            render(&t, "English: Grammar: Tenses ~~ a: b: c", 7),
            "<blockquote>[007]</blockquote>\nTenses"
        );
    }

    #[test]
    fn truncate_first_cleans_file_names_without_colons() {
        let t = transformer(
            signature_cut(
                Marker::literal(":").nth(2),
                Marker::ignore_case(".mkv"),
                true,
            ),
            CleaningRules {
                unwanted_phrases: vec!["VIDEO".into()],
                strip_bracketed: true,
                ..CleaningRules::default()
            },
        );
        assert_eq!(
            render(&t, "Kinematics [HD] VIDEO.mkv", 8),
            "<blockquote>[008]</blockquote>\nKinematics"
        );
        assert_eq!(
            render(&t, "Batch: Physics: Optics - Part 2.MKV trailing: text", 9),
            "<blockquote>[009]</blockquote>\nOptics Part 2"
        );
    }

    #[test]
    fn truncate_first_with_required_end_falls_back() {
        let t = transformer(
            Mode::MarkerSpan {
                start: Marker::literal(":"),
                end: Some(Marker::literal("#END")),
                heading: Some("Notes".into()),
                require_end: true,
                truncate_first: true,
                clean: false,
            },
            CleaningRules::default(),
        );
        assert_eq!(
            render(&t, "Topic: Rivers", 1),
            "<blockquote>[001]</blockquote>\nTopic: Rivers"
        );
        assert_eq!(
            render(&t, "Topic: Rivers #END x", 2),
            "<blockquote>[002] Notes</blockquote>\nRivers"
        );
    }

    // ---------------------------------------------------------------------
    // Scrub
    // ---------------------------------------------------------------------

    #[test]
    fn scrub_removes_phrase_and_repairs_quotes() {
        let t = transformer(
            Mode::Scrub,
            CleaningRules {
                unwanted_phrases: vec!["Class Date »".into()],
                ..CleaningRules::default()
            },
        );
        assert_eq!(
            render(&t, "<blockquote>Class Date »</blockquote>\n<b>Optics</b>", 1),
            "<blockquote>\u{00A0}</blockquote>\n<b>Optics</b>"
        );
    }

    // ---------------------------------------------------------------------
    // Markup safety
    // ---------------------------------------------------------------------

    #[test]
    fn caption_text_is_escaped() {
        let t = transformer(
            Mode::TwoFieldSplit {
                delimiter: "//".into(),
                after: AfterRule::default(),
            },
            CleaningRules {
                allowed: CharClass::Any,
                ..CleaningRules::default()
            },
        );
        assert_eq!(
            render(&t, "a<b // x & y", 1),
            "<blockquote>[001] a&lt;b</blockquote>\nx &amp; y"
        );
    }

    #[test]
    fn escaping_can_be_disabled() {
        let t = CaptionTransformer::new(CaptionConfig {
            mode: Mode::SuffixAnchored {
                keyword: "zzz".into(),
                stylize_suffix: false,
                stylize_fallback: false,
            },
            numbering: NumberFormat::plain(),
            escape_html: false,
            ..CaptionConfig::default()
        })
        .unwrap();
        assert_eq!(
            render(&t, "<i>kept</i>", 1),
            "<blockquote>[001]</blockquote>\n<i>kept</i>"
        );
    }
}

//! Table-driven remapping of ASCII letters and digits into the Unicode
//! mathematical alphanumeric blocks.

use serde::{Deserialize, Serialize};

/// Alternate glyph block used for stylized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlyphStyle {
    /// Mathematical Sans-Serif (plain weight).
    #[default]
    SansSerif,
    SansSerifBold,
    Monospace,
    DoubleStruck,
}

struct GlyphTable {
    upper: u32,
    lower: u32,
    digit: u32,
    /// Letters whose slot in the block is reserved; Unicode places them in
    /// the Letterlike Symbols block instead.
    upper_exceptions: &'static [(char, char)],
}

const SANS_SERIF: GlyphTable = GlyphTable {
    upper: 0x1D5A0,
    lower: 0x1D5BA,
    digit: 0x1D7E2,
    upper_exceptions: &[],
};

const SANS_SERIF_BOLD: GlyphTable = GlyphTable {
    upper: 0x1D5D4,
    lower: 0x1D5EE,
    digit: 0x1D7EC,
    upper_exceptions: &[],
};

const MONOSPACE: GlyphTable = GlyphTable {
    upper: 0x1D670,
    lower: 0x1D68A,
    digit: 0x1D7F6,
    upper_exceptions: &[],
};

const DOUBLE_STRUCK: GlyphTable = GlyphTable {
    upper: 0x1D538,
    lower: 0x1D552,
    digit: 0x1D7D8,
    upper_exceptions: &[
        ('C', '\u{2102}'),
        ('H', '\u{210D}'),
        ('N', '\u{2115}'),
        ('P', '\u{2119}'),
        ('Q', '\u{211A}'),
        ('R', '\u{211D}'),
        ('Z', '\u{2124}'),
    ],
};

impl GlyphStyle {
    fn table(self) -> &'static GlyphTable {
        match self {
            GlyphStyle::SansSerif => &SANS_SERIF,
            GlyphStyle::SansSerifBold => &SANS_SERIF_BOLD,
            GlyphStyle::Monospace => &MONOSPACE,
            GlyphStyle::DoubleStruck => &DOUBLE_STRUCK,
        }
    }

    /// Maps one character. Anything outside `A-Z`, `a-z`, `0-9` is returned
    /// unchanged.
    pub fn map_char(self, c: char) -> char {
        let table = self.table();
        let mapped = match c {
            'A'..='Z' => {
                if let Some(&(_, special)) =
                    table.upper_exceptions.iter().find(|(from, _)| *from == c)
                {
                    return special;
                }
                table.upper + (c as u32 - 'A' as u32)
            }
            'a'..='z' => table.lower + (c as u32 - 'a' as u32),
            '0'..='9' => table.digit + (c as u32 - '0' as u32),
            _ => return c,
        };
        char::from_u32(mapped).unwrap_or(c)
    }
}

/// Stylizes every ASCII letter and digit of `text`.
///
/// Output codepoints all lie outside the ASCII ranges, so stylizing twice is
/// the same as stylizing once.
pub fn stylize(text: &str, style: GlyphStyle) -> String {
    text.chars().map(|c| style.map_char(c)).collect()
}

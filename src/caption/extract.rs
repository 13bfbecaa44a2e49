//! Marker search shared by every extraction mode.
//!
//! `locate` finds a start marker, then looks for the end marker only after
//! it, and reports one of three outcomes: both found, start only, or neither.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// A literal anchor inside a caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub text: String,
    #[serde(default)]
    pub case_insensitive: bool,
    /// Which occurrence to anchor on, counting from 1. When the caption has
    /// fewer occurrences the last one present is used.
    #[serde(default = "default_occurrence")]
    pub occurrence: usize,
}

fn default_occurrence() -> usize {
    1
}

impl Marker {
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            case_insensitive: false,
            occurrence: 1,
        }
    }

    pub fn ignore_case(text: impl Into<String>) -> Self {
        Self {
            case_insensitive: true,
            ..Self::literal(text)
        }
    }

    pub fn nth(mut self, occurrence: usize) -> Self {
        self.occurrence = occurrence;
        self
    }

    /// Byte range of the configured occurrence at or after `from`.
    pub fn find_in(&self, haystack: &str, from: usize) -> Option<Range<usize>> {
        let mut found = None;
        let mut cursor = from;
        for _ in 0..self.occurrence.max(1) {
            match self.find_once(haystack, cursor) {
                Some(range) => {
                    cursor = range.end;
                    found = Some(range);
                }
                None => break,
            }
        }
        found
    }

    fn find_once(&self, haystack: &str, from: usize) -> Option<Range<usize>> {
        if self.text.is_empty() {
            return None;
        }
        if self.case_insensitive {
            find_ignore_case(haystack, &self.text, from)
        } else {
            let tail = haystack.get(from..)?;
            tail.find(&self.text)
                .map(|i| from + i..from + i + self.text.len())
        }
    }
}

/// Outcome of a start/end marker search. All slices borrow the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Located<'a> {
    /// Both markers present, end after start.
    Full {
        before: &'a str,
        start: &'a str,
        inner: &'a str,
        after: &'a str,
    },
    /// Start present; end absent or not requested.
    Partial {
        before: &'a str,
        start: &'a str,
        rest: &'a str,
    },
    Missing,
}

pub fn locate<'a>(text: &'a str, start: &Marker, end: Option<&Marker>) -> Located<'a> {
    let Some(s) = start.find_in(text, 0) else {
        return Located::Missing;
    };

    match end.and_then(|marker| marker.find_in(text, s.end)) {
        Some(e) => Located::Full {
            before: &text[..s.start],
            start: &text[s.clone()],
            inner: &text[s.end..e.start],
            after: &text[e.end..],
        },
        None => Located::Partial {
            before: &text[..s.start],
            start: &text[s.clone()],
            rest: &text[s.end..],
        },
    }
}

/// Finds `needle` in `haystack[from..]` comparing characters by their
/// lowercase forms. Returns the byte range in `haystack`.
pub fn find_ignore_case(haystack: &str, needle: &str, from: usize) -> Option<Range<usize>> {
    if needle.is_empty() {
        return None;
    }
    let tail = haystack.get(from..)?;
    tail.char_indices().find_map(|(i, _)| {
        match_ignore_case_at(&tail[i..], needle).map(|len| from + i..from + i + len)
    })
}

/// If `haystack` starts with `needle` (ignoring case), returns the byte
/// length of the matched prefix.
pub fn match_ignore_case_at(haystack: &str, needle: &str) -> Option<usize> {
    let mut hay = haystack.char_indices();
    for n in needle.chars() {
        let (_, h) = hay.next()?;
        if !chars_eq_ignore_case(h, n) {
            return None;
        }
    }
    Some(hay.next().map(|(i, _)| i).unwrap_or(haystack.len()))
}

fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

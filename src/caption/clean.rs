use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::contracts::ConfigError;

/// Characters removed when `strip_bullets` is on.
const BULLETS: &[char] = &[
    '•', '◦', '▪', '▫', '‣', '⁃', '●', '○', '■', '□', '►', '▶', '➤', '➢', '✓', '✔',
];

/// Characters that survive cleaning besides whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharClass {
    Letters,
    #[default]
    LettersDigits,
    Any,
}

impl CharClass {
    fn allows(self, c: char) -> bool {
        match self {
            CharClass::Letters => c.is_alphabetic(),
            CharClass::LettersDigits => c.is_alphanumeric(),
            CharClass::Any => true,
        }
    }
}

/// Cleaning configuration, compiled into a [`Cleaner`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningRules {
    /// Removed case-insensitively; word-bounded where the phrase starts or
    /// ends with a word character.
    pub unwanted_phrases: Vec<String>,
    pub strip_bullets: bool,
    /// Drop `12.` / `3)` at the start of a line.
    pub strip_ordinals: bool,
    /// Drop `[ ... ]` segments.
    pub strip_bracketed: bool,
    pub allowed: CharClass,
    /// Extra characters kept regardless of `allowed`.
    pub extra_allowed: String,
}

impl Default for CleaningRules {
    fn default() -> Self {
        Self {
            unwanted_phrases: Vec::new(),
            strip_bullets: true,
            strip_ordinals: true,
            strip_bracketed: false,
            allowed: CharClass::LettersDigits,
            extra_allowed: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cleaner {
    phrases: Vec<Regex>,
    ordinals: Option<Regex>,
    bracketed: Option<Regex>,
    strip_bullets: bool,
    allowed: CharClass,
    extra_allowed: Vec<char>,
}

impl Cleaner {
    pub fn new(rules: &CleaningRules) -> Result<Self, ConfigError> {
        let phrases = rules
            .unwanted_phrases
            .iter()
            .map(|p| phrase_regex(p, "cleaning.unwanted_phrases"))
            .collect::<Result<Vec<_>, _>>()?;

        let ordinals = if rules.strip_ordinals {
            Some(compile(r"(?m)^[ \t]*\d+[.)][ \t]*", "cleaning.strip_ordinals")?)
        } else {
            None
        };

        let bracketed = if rules.strip_bracketed {
            Some(compile(r"\[[^\]]*\]", "cleaning.strip_bracketed")?)
        } else {
            None
        };

        Ok(Self {
            phrases,
            ordinals,
            bracketed,
            strip_bullets: rules.strip_bullets,
            allowed: rules.allowed,
            extra_allowed: rules.extra_allowed.chars().collect(),
        })
    }

    /// Runs the full pipeline: phrases, brackets, bullets, ordinals,
    /// character filter, whitespace collapse.
    pub fn clean(&self, text: &str) -> String {
        let mut text = self.remove_phrases(text);

        if let Some(ref re) = self.bracketed {
            text = re.replace_all(&text, " ").into_owned();
        }
        if self.strip_bullets {
            text.retain(|c| !BULLETS.contains(&c));
        }
        if let Some(ref re) = self.ordinals {
            text = re.replace_all(&text, "").into_owned();
        }

        text.retain(|c| c.is_whitespace() || self.allowed.allows(c) || self.extra_allowed.contains(&c));
        collapse_whitespace(&text)
    }

    pub fn remove_phrases(&self, text: &str) -> String {
        self.phrases
            .iter()
            .fold(text.to_string(), |acc, re| re.replace_all(&acc, "").into_owned())
    }
}

/// Case-insensitive pattern for a literal phrase, anchored on word
/// boundaries at whichever ends are word characters.
pub fn phrase_regex(phrase: &str, field: &str) -> Result<Regex, ConfigError> {
    let phrase = phrase.trim();
    if phrase.is_empty() {
        return Err(ConfigError::invalid(field, "phrase must not be empty"));
    }
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    let lead = if is_word(phrase.chars().next()) { r"\b" } else { "" };
    let trail = if is_word(phrase.chars().last()) { r"\b" } else { "" };
    compile(
        &format!("(?i){}{}{}", lead, regex::escape(phrase), trail),
        field,
    )
}

/// Case-insensitive pattern for a truncation keyword. Only the start is
/// word-bounded, so the keyword also matches as a prefix of a longer word.
pub fn keyword_regex(keyword: &str, field: &str) -> Result<Regex, ConfigError> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Err(ConfigError::invalid(field, "keyword must not be empty"));
    }
    let lead = if keyword.starts_with(|c: char| c.is_alphanumeric() || c == '_') {
        r"\b"
    } else {
        ""
    };
    compile(&format!("(?i){}{}", lead, regex::escape(keyword)), field)
}

fn compile(pattern: &str, field: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::invalid(field, e.to_string()))
}

/// Collapses every whitespace run (newlines included) to one space and
/// trims both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drops a leading `12.` or `3)` marker and surrounding whitespace.
pub fn strip_leading_ordinal(text: &str) -> &str {
    let trimmed = text.trim_start();
    let digits = trimmed.len() - trimmed.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return trimmed;
    }
    match trimmed[digits..].chars().next() {
        Some('.') | Some(')') => trimmed[digits + 1..].trim_start(),
        _ => trimmed,
    }
}

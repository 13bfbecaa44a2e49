use std::borrow::Cow;

use super::extract::{find_ignore_case, match_ignore_case_at};

/// Content substituted into a block quote that would otherwise be empty.
pub const PLACEHOLDER: char = '\u{00A0}';

const OPEN: &str = "<blockquote>";
const CLOSE: &str = "</blockquote>";

/// Wraps `inner` in a block quote. Blank content becomes [`PLACEHOLDER`] so
/// the quote still renders.
pub fn blockquote(inner: &str) -> String {
    if inner.trim().is_empty() {
        format!("{OPEN}{PLACEHOLDER}{CLOSE}")
    } else {
        format!("{OPEN}{inner}{CLOSE}")
    }
}

/// Escapes the characters the HTML caption parser treats as markup.
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Puts [`PLACEHOLDER`] inside every existing block quote whose content is
/// empty or whitespace. Tags are matched case-insensitively; all other
/// markup is left as is.
pub fn fill_empty_blockquotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    while let Some(open) = find_ignore_case(text, OPEN, cursor) {
        let tail = &text[open.end..];
        let content = tail.trim_start();
        out.push_str(&text[cursor..open.end]);
        if match_ignore_case_at(content, CLOSE).is_some() {
            out.push(PLACEHOLDER);
            cursor = open.end + (tail.len() - content.len());
        } else {
            cursor = open.end;
        }
    }

    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blockquote_wraps_content() {
        assert_eq!(blockquote("[001] Algebra"), "<blockquote>[001] Algebra</blockquote>");
    }

    #[test]
    fn empty_blockquote_gets_placeholder() {
        for blank in ["", "   ", "\n\t"] {
            let quoted = blockquote(blank);
            assert_eq!(quoted, "<blockquote>\u{00A0}</blockquote>");
            assert!(quoted.contains(PLACEHOLDER));
        }
    }

    #[test]
    fn escape_html_only_allocates_when_needed() {
        assert!(matches!(escape_html("plain text"), Cow::Borrowed(_)));
        assert_eq!(escape_html("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
    }

    #[test]
    fn fill_empty_blockquotes_rewrites_blank_quotes() {
        let input = "<blockquote> </blockquote>\n<BlockQuote></BLOCKQUOTE><blockquote>kept</blockquote>";
        assert_eq!(
            fill_empty_blockquotes(input),
            "<blockquote>\u{00A0}</blockquote>\n<BlockQuote>\u{00A0}</BLOCKQUOTE><blockquote>kept</blockquote>"
        );
    }

    #[test]
    fn fill_empty_blockquotes_leaves_other_text() {
        assert_eq!(fill_empty_blockquotes("no quotes <b>bold</b>"), "no quotes <b>bold</b>");
        assert_eq!(fill_empty_blockquotes("<blockquote>"), "<blockquote>");
    }
}

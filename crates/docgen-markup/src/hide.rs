//! Hidden text spans: `\\*` ... `*\\`.
//!
//! The span content would otherwise be reinterpreted by the standard inline
//! parser (`\\` is an escaped backslash, `*` an emphasis marker), so each span
//! is swapped for a private-use placeholder character before the text is
//! parsed. The tokenizer maps placeholders back to `HideText` tokens.

use std::ops::Range;

use crate::skip::skip_inline;

pub const HIDE_OPEN: &str = "\\\\*";
pub const HIDE_CLOSE: &str = "*\\\\";

/// First code point of Supplementary Private Use Area-A.
const PLACEHOLDER_BASE: u32 = 0xF_0000;
const PLACEHOLDER_LIMIT: u32 = 0xF_FFFD;

/// Source text with hidden spans replaced by placeholders.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct HiddenText {
    pub text: String,
    /// Verbatim span contents, markers included, indexed by placeholder.
    pub spans: Vec<String>,
}

impl HiddenText {
    /// Hidden span content for a placeholder character.
    pub(crate) fn span_for(&self, c: char) -> Option<&str> {
        placeholder_index(c).and_then(|i| self.spans.get(i).map(String::as_str))
    }
}

pub(crate) fn placeholder_index(c: char) -> Option<usize> {
    let code = u32::from(c);
    if (PLACEHOLDER_BASE..=PLACEHOLDER_LIMIT).contains(&code) {
        usize::try_from(code - PLACEHOLDER_BASE).ok()
    } else {
        None
    }
}

fn placeholder(index: usize) -> Option<char> {
    let offset = u32::try_from(index).ok()?;
    let code = PLACEHOLDER_BASE.checked_add(offset)?;
    if code > PLACEHOLDER_LIMIT {
        return None;
    }
    char::from_u32(code)
}

/// Range of a complete hidden span starting at `pos`, if there is one.
///
/// The span must close before `limit`; an unterminated opener is not a span.
pub(crate) fn span_at(text: &str, pos: usize, limit: usize) -> Option<Range<usize>> {
    let window = text.get(pos..limit)?;
    if !window.starts_with(HIDE_OPEN) {
        return None;
    }
    let close = window[HIDE_OPEN.len()..].find(HIDE_CLOSE)?;
    Some(pos..pos + HIDE_OPEN.len() + close + HIDE_CLOSE.len())
}

/// Replace hidden spans inside the given inline ranges.
///
/// Returns `None` when the text has no hidden spans.
pub(crate) fn replace_hidden(text: &str, ranges: &[Range<usize>]) -> Option<HiddenText> {
    let mut found = Vec::new();
    for range in ranges {
        let mut pos = range.start;
        while pos < range.end {
            if let Some(span) = span_at(text, pos, range.end) {
                pos = span.end;
                found.push(span);
            } else {
                pos = skip_inline(text, pos, range.end);
            }
        }
    }
    if found.is_empty() {
        return None;
    }

    let mut hidden = HiddenText::default();
    let mut copied = 0;
    for span in found {
        let Some(marker) = placeholder(hidden.spans.len()) else {
            tracing::warn!("Too many hidden text spans, keeping the rest as text");
            break;
        };
        hidden.text.push_str(&text[copied..span.start]);
        hidden.text.push(marker);
        hidden.spans.push(text[span.clone()].to_owned());
        copied = span.end;
    }
    hidden.text.push_str(&text[copied..]);
    Some(hidden)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_span_at() {
        let text = r"a \\*secret*\\ b";
        assert_eq!(span_at(text, 2, text.len()), Some(2..14));
        assert_eq!(span_at(text, 0, text.len()), None);
    }

    #[test]
    fn test_unterminated_span() {
        let text = r"\\*secret";
        assert_eq!(span_at(text, 0, text.len()), None);
    }

    #[test]
    fn test_span_must_close_within_limit() {
        let text = r"\\*a*\\";
        assert_eq!(span_at(text, 0, 5), None);
    }

    #[test]
    fn test_replace_hidden() {
        let text = r"one \\*two*\\ three \\**\\";
        let hidden = replace_hidden(text, &[0..text.len()]).unwrap();

        assert_eq!(hidden.spans, vec![r"\\*two*\\".to_owned(), r"\\**\\".to_owned()]);
        let mut chars = hidden.text.chars().filter(|c| placeholder_index(*c).is_some());
        assert_eq!(hidden.span_for(chars.next().unwrap()), Some(r"\\*two*\\"));
        assert_eq!(hidden.span_for(chars.next().unwrap()), Some(r"\\**\\"));
        assert!(hidden.text.starts_with("one "));
        assert!(hidden.text.contains(" three "));
    }

    #[test]
    fn test_replace_outside_ranges_is_ignored() {
        let text = r"\\*a*\\ b";
        assert_eq!(replace_hidden(text, &[8..9]), None);
    }

    #[test]
    fn test_code_span_hides_markers() {
        let text = r"`\\*a*\\`";
        assert_eq!(replace_hidden(text, &[0..text.len()]), None);
    }

    #[test]
    fn test_placeholder_round_trip_index() {
        assert_eq!(placeholder(3).and_then(placeholder_index), Some(3));
        assert_eq!(placeholder_index('a'), None);
    }
}

//! Inline skipping used while scanning for custom markers.
//!
//! Escapes, code spans, autolinks and raw inline HTML are opaque to the custom
//! delimiters: markers inside them never open or close a span.

/// Byte offset just past the inline construct starting at `pos`.
///
/// Always advances by at least one character and never goes past `limit`.
pub(crate) fn skip_inline(text: &str, pos: usize, limit: usize) -> usize {
    let limit = limit.min(text.len());
    let rest = &text[pos..limit];
    let Some(first) = rest.chars().next() else {
        return limit;
    };

    let skipped = match first {
        '\\' => skip_escape(rest),
        '`' => skip_code_span(rest),
        '<' => skip_angle(rest),
        _ => None,
    };
    pos + skipped.unwrap_or(first.len_utf8())
}

fn skip_escape(rest: &str) -> Option<usize> {
    let next = rest[1..].chars().next()?;
    next.is_ascii_punctuation().then_some(2)
}

fn skip_code_span(rest: &str) -> Option<usize> {
    let open = rest.bytes().take_while(|&b| b == b'`').count();
    let mut pos = open;
    while let Some(found) = rest[pos..].find('`') {
        let start = pos + found;
        let run = rest[start..].bytes().take_while(|&b| b == b'`').count();
        if run == open {
            return Some(start + run);
        }
        pos = start + run;
    }
    // An unmatched opening run is literal backticks.
    Some(open)
}

fn skip_angle(rest: &str) -> Option<usize> {
    let close = rest.find(['>', '\n'])?;
    if rest.as_bytes()[close] != b'>' || close < 2 {
        return None;
    }
    let inner = &rest[1..close];
    let autolink = !inner.contains(char::is_whitespace) && inner.contains([':', '@']);
    let html = inner
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'));
    (autolink || html).then_some(close + 1)
}

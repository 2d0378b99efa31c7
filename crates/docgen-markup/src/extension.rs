//! Custom inline delimiter spans: justify (`:`) and hanging indent (`!`).
//!
//! Both extensions share one matcher. Opening runs are pushed on a length
//! stack, and a closing run consumes stack entries until the lengths balance.
//! A partial close leaves the remainder open, and an opener with no reachable
//! closer degrades to literal text.

use std::ops::Range;

use crate::delimiter::DelimiterRun;
use crate::skip::skip_inline;
use crate::token::{Alignment, Custom};

/// The custom span kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extension {
    Justify,
    HangingIndent,
}

impl Extension {
    pub const ALL: [Self; 2] = [Self::Justify, Self::HangingIndent];

    #[must_use]
    pub fn marker(self) -> char {
        match self {
            Self::Justify => ':',
            Self::HangingIndent => '!',
        }
    }

    #[must_use]
    pub fn for_marker(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|ext| ext.marker() == c)
    }

    /// Custom token for a span matched with `run_len` markers on each side.
    #[must_use]
    pub fn custom(self, run_len: usize) -> Custom {
        match self {
            Self::Justify => Custom::Justify(Alignment::from_run_length(run_len)),
            Self::HangingIndent => Custom::HangingIndent,
        }
    }
}

/// A matched span: `len` markers at `open_start` and at `close_start`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpanMatch {
    pub extension: Extension,
    pub open_start: usize,
    pub close_start: usize,
    /// Markers consumed on each side.
    pub len: usize,
}

impl SpanMatch {
    fn marker_bytes(&self) -> usize {
        self.len * self.extension.marker().len_utf8()
    }

    #[must_use]
    pub fn open_range(&self) -> Range<usize> {
        self.open_start..self.open_start + self.marker_bytes()
    }

    #[must_use]
    pub fn inner(&self) -> Range<usize> {
        self.open_range().end..self.close_start
    }

    #[must_use]
    pub fn close_range(&self) -> Range<usize> {
        self.close_start..self.close_start + self.marker_bytes()
    }
}

/// Outcome of trying to open a span at a marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The run cannot open; its `len` markers are literal.
    Literal { len: usize },
    /// No closing run was reachable; the first marker is literal.
    Unmatched,
    Matched(SpanMatch),
}

/// Try to match a custom span whose opening run starts at `start`.
#[must_use]
pub fn match_span(text: &str, start: usize, limit: usize) -> MatchOutcome {
    let Some(opening) = DelimiterRun::scan(text, start, limit) else {
        return MatchOutcome::Unmatched;
    };
    let Some(extension) = Extension::for_marker(opening.marker) else {
        return MatchOutcome::Unmatched;
    };
    if !opening.can_open {
        return MatchOutcome::Literal { len: opening.len };
    }

    let mut stack = vec![opening.len];
    let mut pos = opening.end();

    while pos < limit {
        let Some(c) = text[pos..limit].chars().next() else {
            break;
        };
        if c != opening.marker {
            pos = skip_inline(text, pos, limit);
            continue;
        }
        let Some(run) = DelimiterRun::scan(text, pos, limit) else {
            break;
        };

        if run.can_close {
            if let Some(found) = close_run(&mut stack, &run) {
                return MatchOutcome::Matched(SpanMatch {
                    extension,
                    open_start: start,
                    close_start: found.close_start,
                    len: found.len,
                });
            }
        } else if run.can_open {
            stack.push(run.len);
        }
        pos = run.end();
    }

    MatchOutcome::Unmatched
}

struct Closed {
    close_start: usize,
    len: usize,
}

/// Apply a closing run to the length stack.
///
/// Returns the outermost match once the stack empties. The close then starts
/// after whatever inner openers the run already balanced, and spans the
/// outermost opener's length.
fn close_run(stack: &mut Vec<usize>, run: &DelimiterRun) -> Option<Closed> {
    let mut remaining = run.len;
    let mut consumed = 0;
    let mut open = stack.pop()?;

    while open != remaining {
        if remaining < open {
            stack.push(open - remaining);
            return None;
        }
        remaining -= open;
        let Some(next) = stack.pop() else {
            // Excess closers beyond every opener stay literal.
            return Some(Closed {
                close_start: run.start + run.byte_len(consumed),
                len: open,
            });
        };
        consumed += open;
        open = next;
    }

    stack.is_empty().then(|| Closed {
        close_start: run.start + run.byte_len(consumed),
        len: open,
    })
}

/// A marker run to be turned into a custom open or close token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct MarkerEdit {
    pub range: Range<usize>,
    /// Pairs an open edit with its close.
    pub span: usize,
    pub custom: Custom,
    pub opening: bool,
}

/// Collect custom spans in `text[start..limit]`, in source order.
///
/// Matched content is scanned again for nested spans.
pub(crate) fn collect_spans(
    text: &str,
    start: usize,
    limit: usize,
    edits: &mut Vec<MarkerEdit>,
    next_span: &mut usize,
) {
    let mut pos = start;
    while pos < limit {
        let Some(c) = text[pos..limit].chars().next() else {
            break;
        };
        let Some(extension) = Extension::for_marker(c) else {
            pos = skip_inline(text, pos, limit);
            continue;
        };
        // `![` belongs to image syntax.
        if extension == Extension::HangingIndent && text[pos + 1..limit].starts_with('[') {
            pos += 1;
            continue;
        }

        match match_span(text, pos, limit) {
            MatchOutcome::Literal { len } => pos += len * c.len_utf8(),
            MatchOutcome::Unmatched => pos += c.len_utf8(),
            MatchOutcome::Matched(found) => {
                let span = *next_span;
                *next_span += 1;
                let custom = extension.custom(found.len);
                edits.push(MarkerEdit {
                    range: found.open_range(),
                    span,
                    custom,
                    opening: true,
                });
                let inner = found.inner();
                collect_spans(text, inner.start, inner.end, edits, next_span);
                edits.push(MarkerEdit {
                    range: found.close_range(),
                    span,
                    custom,
                    opening: false,
                });
                pos = found.close_range().end;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn matched(text: &str) -> SpanMatch {
        match match_span(text, 0, text.len()) {
            MatchOutcome::Matched(found) => found,
            other => panic!("expected a match for {text:?}, got {other:?}"),
        }
    }

    fn spans(text: &str) -> Vec<(String, Custom, bool)> {
        let mut edits = Vec::new();
        let mut next = 0;
        collect_spans(text, 0, text.len(), &mut edits, &mut next);
        edits
            .into_iter()
            .map(|e| (text[e.range].to_owned(), e.custom, e.opening))
            .collect()
    }

    #[test]
    fn test_single_marker_span() {
        let found = matched(":text:");
        assert_eq!(found.len, 1);
        assert_eq!(found.inner(), 1..5);
        assert_eq!(found.close_range(), 5..6);
    }

    #[test]
    fn test_triple_marker_span() {
        let found = matched(":::text:::");
        assert_eq!(found.len, 3);
        assert_eq!(found.inner(), 3..7);
    }

    #[test]
    fn test_run_lengths_map_to_alignment() {
        assert_eq!(
            Extension::Justify.custom(matched(":a:").len),
            Custom::Justify(Alignment::Left)
        );
        assert_eq!(
            Extension::Justify.custom(matched("::a::").len),
            Custom::Justify(Alignment::Center)
        );
        assert_eq!(
            Extension::Justify.custom(matched(":::a:::").len),
            Custom::Justify(Alignment::Right)
        );
    }

    #[test]
    fn test_unclosed_run_is_unmatched() {
        assert_eq!(match_span(":text", 0, 5), MatchOutcome::Unmatched);
    }

    #[test]
    fn test_run_that_cannot_open_is_literal() {
        assert_eq!(match_span(": text:", 0, 7), MatchOutcome::Literal { len: 1 });
    }

    #[test]
    fn test_partial_close_keeps_remainder_open() {
        // `:` closes one of the two openers; the final `:` closes the rest.
        let found = matched("::a: b:");
        assert_eq!(found.open_start, 0);
        assert_eq!(found.close_start, 6);
        assert_eq!(found.len, 1);
    }

    #[test]
    fn test_close_beyond_inner_opener() {
        // The inner `:` is balanced first, the outer `::` closes after it.
        let found = matched("::a :b:::");
        assert_eq!(found.len, 2);
        assert_eq!(found.close_start, 7);
        assert_eq!(found.inner(), 2..7);
    }

    #[test]
    fn test_markers_in_code_span_are_skipped() {
        let found = matched(":a `:` b:");
        assert_eq!(found.close_start, 8);
    }

    #[test]
    fn test_escaped_marker_is_skipped() {
        assert_eq!(match_span(":a\\:", 0, 4), MatchOutcome::Unmatched);
    }

    #[test]
    fn test_limit_bounds_the_search() {
        assert_eq!(match_span(":a:", 0, 2), MatchOutcome::Unmatched);
    }

    #[test]
    fn test_collect_nested_spans_in_order() {
        assert_eq!(
            spans("!a :b: c!"),
            vec![
                ("!".to_owned(), Custom::HangingIndent, true),
                (":".to_owned(), Custom::Justify(Alignment::Left), true),
                (":".to_owned(), Custom::Justify(Alignment::Left), false),
                ("!".to_owned(), Custom::HangingIndent, false),
            ]
        );
    }

    #[test]
    fn test_collect_skips_image_syntax() {
        assert!(spans("![alt](x.png) and!").is_empty());
    }

    #[test]
    fn test_collect_leaves_plain_text_alone() {
        assert!(spans("Note: nothing here").is_empty());
        assert!(spans("Wow! Really!").is_empty());
    }
}

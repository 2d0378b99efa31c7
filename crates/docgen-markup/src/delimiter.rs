//! Delimiter run scanning with CommonMark flanking rules.

/// Character class used to decide whether a delimiter run is flanking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharClass {
    /// Whitespace, or the start/end of the text.
    Whitespace,
    Punctuation,
    Other,
}

impl CharClass {
    #[must_use]
    pub fn of(c: Option<char>) -> Self {
        match c {
            None => Self::Whitespace,
            Some(c) if c.is_whitespace() => Self::Whitespace,
            Some(c) if is_punctuation(c) => Self::Punctuation,
            Some(_) => Self::Other,
        }
    }
}

/// ASCII punctuation plus the common Unicode punctuation blocks.
#[must_use]
pub fn is_punctuation(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_punctuation();
    }
    matches!(
        c,
        '\u{00A1}'
            | '\u{00A7}'
            | '\u{00AB}'
            | '\u{00B6}'
            | '\u{00B7}'
            | '\u{00BB}'
            | '\u{00BF}'
            | '\u{037E}'
            | '\u{0387}'
            | '\u{055A}'..='\u{055F}'
            | '\u{0589}'
            | '\u{05BE}'
            | '\u{05C0}'
            | '\u{05C3}'
            | '\u{05F3}'
            | '\u{05F4}'
            | '\u{060C}'
            | '\u{061B}'
            | '\u{061F}'
            | '\u{066A}'..='\u{066D}'
            | '\u{0964}'
            | '\u{0965}'
            | '\u{2010}'..='\u{2027}'
            | '\u{2030}'..='\u{2043}'
            | '\u{2045}'..='\u{2051}'
            | '\u{2053}'..='\u{205E}'
            | '\u{2E00}'..='\u{2E4F}'
            | '\u{3001}'..='\u{3003}'
            | '\u{3008}'..='\u{3011}'
            | '\u{3014}'..='\u{301F}'
            | '\u{FE10}'..='\u{FE19}'
            | '\u{FE30}'..='\u{FE52}'
            | '\u{FE54}'..='\u{FE61}'
            | '\u{FF01}'..='\u{FF03}'
            | '\u{FF05}'..='\u{FF0A}'
            | '\u{FF0C}'..='\u{FF0F}'
            | '\u{FF1A}'
            | '\u{FF1B}'
            | '\u{FF1F}'
            | '\u{FF20}'
            | '\u{FF3B}'..='\u{FF3D}'
            | '\u{FF3F}'
            | '\u{FF5B}'
            | '\u{FF5D}'
            | '\u{FF5F}'..='\u{FF65}'
    )
}

/// A maximal run of one marker character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DelimiterRun {
    pub marker: char,
    /// Byte offset of the first marker.
    pub start: usize,
    /// Number of marker characters.
    pub len: usize,
    pub can_open: bool,
    pub can_close: bool,
}

impl DelimiterRun {
    /// Scan the run of `text[start]`'s character, stopping at `limit`.
    ///
    /// Flanking is judged against the characters just outside the run
    /// within `text`, so a run at the edge of `limit` still sees its real
    /// neighbours.
    #[must_use]
    pub fn scan(text: &str, start: usize, limit: usize) -> Option<Self> {
        let limit = limit.min(text.len());
        let marker = text.get(start..limit)?.chars().next()?;

        let len = text[start..limit]
            .chars()
            .take_while(|&c| c == marker)
            .count();
        let end = start + len * marker.len_utf8();

        let before = CharClass::of(text[..start].chars().next_back());
        let after = CharClass::of(text[end..].chars().next());

        let left_flanking = after != CharClass::Whitespace
            && (after != CharClass::Punctuation || before != CharClass::Other);
        let right_flanking = before != CharClass::Whitespace
            && (before != CharClass::Punctuation || after != CharClass::Other);

        Some(Self {
            marker,
            start,
            len,
            can_open: left_flanking,
            can_close: right_flanking,
        })
    }

    /// Byte offset just past the run.
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.byte_len(self.len)
    }

    /// Byte length of `count` marker characters.
    #[must_use]
    pub fn byte_len(&self, count: usize) -> usize {
        count * self.marker.len_utf8()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(text: &str, start: usize) -> DelimiterRun {
        DelimiterRun::scan(text, start, text.len()).unwrap()
    }

    #[test]
    fn test_run_length_and_end() {
        let run = scan("a:::b", 1);
        assert_eq!(run.marker, ':');
        assert_eq!(run.len, 3);
        assert_eq!(run.end(), 4);
    }

    #[test]
    fn test_run_at_start_opens_only() {
        let run = scan(":text:", 0);
        assert!(run.can_open);
        assert!(!run.can_close);
    }

    #[test]
    fn test_run_at_end_closes_only() {
        let run = scan(":text:", 5);
        assert!(!run.can_open);
        assert!(run.can_close);
    }

    #[test]
    fn test_intraword_run_both() {
        let run = scan("a:b", 1);
        assert!(run.can_open);
        assert!(run.can_close);
    }

    #[test]
    fn test_surrounded_by_spaces_neither() {
        let run = scan("a : b", 2);
        assert!(!run.can_open);
        assert!(!run.can_close);
    }

    #[test]
    fn test_punctuation_rules() {
        // Followed by punctuation, preceded by a letter: not left flanking.
        let run = scan("a:(b", 1);
        assert!(!run.can_open);
        assert!(run.can_close);

        // Preceded by punctuation, followed by a letter: not right flanking.
        let run = scan("(:b", 1);
        assert!(run.can_open);
        assert!(!run.can_close);
    }

    #[test]
    fn test_limit_truncates_run() {
        let run = DelimiterRun::scan("::::", 0, 2).unwrap();
        assert_eq!(run.len, 2);
    }

    #[test]
    fn test_scan_past_limit_is_none() {
        assert!(DelimiterRun::scan("abc", 3, 3).is_none());
    }

    #[test]
    fn test_unicode_punctuation() {
        assert!(is_punctuation('\u{2014}'));
        assert!(is_punctuation('\u{00BF}'));
        assert!(is_punctuation('\u{3002}'));
        assert!(!is_punctuation('é'));
        assert!(!is_punctuation('\u{F0000}'));
    }
}

//! Small helpers shared by the tokenizer.

use pulldown_cmark::HeadingLevel;

/// Convert a heading level to its number (1-6).
#[must_use]
pub(crate) fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// The bullet character that opens a list whose source starts in `src`.
pub(crate) fn bullet_char(src: &str) -> char {
    src.chars()
        .find(|c| matches!(c, '-' | '*' | '+'))
        .unwrap_or('-')
}

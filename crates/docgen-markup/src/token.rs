//! Token stream produced by the tokenizer.
//!
//! Container tokens come in open/close pairs and are always well nested.
//! Custom spans (justify, hanging indent) nest strictly inside a single
//! inline container.

use crate::block::TableHeaderSettings;

/// A single element of the tokenized document.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    BlockOpen(Block),
    BlockClose(Block),
    InlineOpen(Inline),
    InlineClose(Inline),
    CustomOpen(Custom),
    CustomClose(Custom),
    Text(String),
    /// Inline code span content.
    Code(String),
    InlineHtml(String),
    SoftBreak,
    HardBreak,
    /// Indented code block content.
    CodeBlock(String),
    /// Fenced code block with its info string.
    Fence {
        info: String,
        content: String,
    },
    HorizontalRule,
    HtmlBlock(String),
    /// `\page` at the start of a line.
    PageBreak,
    /// `\thead` options for the next table.
    TableSettings(TableHeaderSettings),
    /// Verbatim `\\*...*\\` span, markers included.
    HideText(String),
}

impl Token {
    /// Plain text token.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub(crate) fn is_open(&self) -> bool {
        matches!(
            self,
            Self::BlockOpen(_) | Self::InlineOpen(_) | Self::CustomOpen(_)
        )
    }

    pub(crate) fn is_close(&self) -> bool {
        matches!(
            self,
            Self::BlockClose(_) | Self::InlineClose(_) | Self::CustomClose(_)
        )
    }
}

/// Block-level containers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    Blockquote,
    /// Unordered list with the bullet character used in the source.
    BulletList(char),
    /// Ordered list with its start number.
    OrderedList(u64),
    /// List item with its number: the list start plus its position.
    ListItem(u64),
    /// Heading level, 1 to 6.
    Heading(u8),
    Paragraph,
    Table,
    TableRow,
    TableHeadCell,
    TableBodyCell,
}

/// Inline formatting containers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inline {
    Emphasis,
    Strong,
    Strikethrough,
    Link(String),
}

/// Custom inline spans recognised on top of standard markup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Custom {
    Justify(Alignment),
    HangingIndent,
}

/// Horizontal text alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    /// Alignment selected by the length of a matched justify marker run.
    ///
    /// One marker means left, three mean right, anything else centers.
    #[must_use]
    pub fn from_run_length(len: usize) -> Self {
        match len {
            1 => Self::Left,
            3 => Self::Right,
            _ => Self::Center,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_from_run_length() {
        assert_eq!(Alignment::from_run_length(1), Alignment::Left);
        assert_eq!(Alignment::from_run_length(2), Alignment::Center);
        assert_eq!(Alignment::from_run_length(3), Alignment::Right);
        assert_eq!(Alignment::from_run_length(5), Alignment::Center);
    }

    #[test]
    fn test_open_close_classification() {
        assert!(Token::BlockOpen(Block::Paragraph).is_open());
        assert!(Token::CustomClose(Custom::HangingIndent).is_close());
        assert!(!Token::text("a").is_open());
        assert!(!Token::PageBreak.is_close());
    }
}

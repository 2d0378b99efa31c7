//! Markup tokenizer.
//!
//! Standard markup is parsed by pulldown-cmark. The custom syntax is layered
//! around it:
//!
//! 1. Top-level block marker lines split the source into markdown segments;
//!    marker lines inside containers become placeholders.
//! 2. Hidden text spans are swapped for placeholders so the inline parser
//!    leaves them alone.
//! 3. Justify and hanging-indent spans are matched on the source inside each
//!    inline run, and spliced into the verbatim text events.
//! 4. Custom spans that interleave with standard inline containers are
//!    demoted back to their literal markers.

use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};

use crate::block::{BlockMarker, Segment, nested_marker, split_segments};
use crate::extension::{MarkerEdit, collect_spans};
use crate::hide::{HiddenText, replace_hidden};
use crate::token::{Block, Custom, Inline, Token};
use crate::util::{bullet_char, heading_level_to_num};

type OffsetEvents<'a> = Vec<(Event<'a>, Range<usize>)>;

/// Converts markup source into a [`Token`] stream.
///
/// Tokenization never fails: malformed custom syntax degrades to literal
/// text.
#[derive(Clone, Debug)]
pub struct Tokenizer {
    options: Options,
}

impl Tokenizer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH,
        }
    }

    /// Parser options used for standard markup.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        self.options
    }

    /// Create a configured parser for the given markdown text.
    #[must_use]
    pub fn create_parser<'a>(&self, markdown: &'a str) -> Parser<'a> {
        Parser::new_ext(markdown, self.options)
    }

    /// Tokenize a complete document.
    #[must_use]
    pub fn tokenize(&self, src: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        for segment in split_segments(src) {
            match segment {
                Segment::Markdown { text, markers } => {
                    self.tokenize_markdown(&text, &markers, &mut tokens);
                }
                Segment::Marker(marker) => tokens.push(marker.into_token()),
            }
        }
        tokens
    }

    fn tokenize_markdown(&self, text: &str, markers: &[BlockMarker], out: &mut Vec<Token>) {
        let ranges = inline_ranges(text, &self.offset_events(text));
        let hidden = replace_hidden(text, &ranges);
        let source = hidden.as_ref().map_or(text, |h| h.text.as_str());

        let events = coalesce_text(source, self.offset_events(source));
        let ranges = if hidden.is_some() {
            inline_ranges(source, &events)
        } else {
            ranges
        };

        let mut edits = Vec::new();
        let mut next_span = 0;
        for range in &ranges {
            collect_spans(source, range.start, range.end, &mut edits, &mut next_span);
        }

        let mut converter = Converter::new(source, &edits, hidden.as_ref(), markers);
        for (event, range) in events {
            converter.process_event(event, range);
        }
        out.extend(repair_nesting(converter.pieces));
    }

    fn offset_events<'a>(&self, text: &'a str) -> OffsetEvents<'a> {
        self.create_parser(text).into_offset_iter().collect()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

fn is_inline(event: &Event<'_>) -> bool {
    matches!(
        event,
        Event::Text(_)
            | Event::Code(_)
            | Event::InlineHtml(_)
            | Event::SoftBreak
            | Event::HardBreak
            | Event::FootnoteReference(_)
            | Event::InlineMath(_)
            | Event::Start(
                Tag::Emphasis
                    | Tag::Strong
                    | Tag::Strikethrough
                    | Tag::Link { .. }
                    | Tag::Image { .. }
            )
            | Event::End(
                TagEnd::Emphasis
                    | TagEnd::Strong
                    | TagEnd::Strikethrough
                    | TagEnd::Link
                    | TagEnd::Image
            )
    )
}

/// Source ranges covered by maximal runs of inline events.
///
/// Each run is the content of one paragraph, heading, table cell or tight
/// list item. Text inside code and HTML blocks is not inline.
fn inline_ranges(source: &str, events: &[(Event<'_>, Range<usize>)]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut current: Option<Range<usize>> = None;
    let mut in_literal = false;

    for (event, range) in events {
        match event {
            Event::Start(Tag::CodeBlock(_) | Tag::HtmlBlock) => in_literal = true,
            Event::End(TagEnd::CodeBlock | TagEnd::HtmlBlock) => in_literal = false,
            _ => {}
        }

        if !in_literal && is_inline(event) {
            current = Some(match current {
                Some(run) => run.start.min(range.start)..run.end.max(range.end),
                None => escape_start(source, range.start)..range.end,
            });
        } else if let Some(run) = current.take() {
            ranges.push(run);
        }
    }
    ranges.extend(current);
    ranges
}

/// Start of an inline run, moved back over the backslash of an escape.
///
/// The parser reports an escaped character from the character itself, so a
/// run opening with `\\` would otherwise start one byte late.
fn escape_start(source: &str, start: usize) -> usize {
    if source[..start].ends_with('\\') {
        start - 1
    } else {
        start
    }
}

/// Join verbatim text events that are adjacent in the source.
///
/// The parser may split a run of marker characters across events; joining
/// keeps every marker run inside one verbatim event. Events whose text
/// differs from their source, such as entity references, stay on their own.
fn coalesce_text<'a>(source: &str, events: OffsetEvents<'a>) -> OffsetEvents<'a> {
    let verbatim = |text: &str, range: &Range<usize>| source.get(range.clone()) == Some(text);
    let mut merged: OffsetEvents<'a> = Vec::with_capacity(events.len());
    for (event, range) in events {
        if let (Event::Text(text), Some((Event::Text(prev), prev_range))) =
            (&event, merged.last_mut())
            && prev_range.end == range.start
            && verbatim(text, &range)
            && verbatim(prev, prev_range)
        {
            let mut joined = prev.to_string();
            joined.push_str(text);
            *prev = CowStr::from(joined);
            prev_range.end = range.end;
            continue;
        }
        merged.push((event, range));
    }
    merged
}

/// Converter output before nesting repair.
#[derive(Debug)]
enum Piece {
    Token(Token),
    Open {
        span: usize,
        custom: Custom,
        literal: String,
    },
    Close {
        span: usize,
        custom: Custom,
        literal: String,
    },
}

/// What a start event opened, so its end event can close it.
#[derive(Debug)]
enum Opened {
    Block(Block),
    Inline(Inline),
    Literal,
    Ignored,
    /// A block closed early by a nested marker, reopened by later content.
    Suspended(Block),
}

/// Code and HTML block content being collected.
#[derive(Debug)]
enum LiteralBlock {
    Indented(String),
    Fenced { info: String, content: String },
    Html(String),
}

impl LiteralBlock {
    fn push(&mut self, text: &str) {
        match self {
            Self::Indented(content) | Self::Fenced { content, .. } | Self::Html(content) => {
                content.push_str(text);
            }
        }
    }

    fn into_token(self) -> Token {
        match self {
            Self::Indented(content) => Token::CodeBlock(content),
            Self::Fenced { info, content } => Token::Fence { info, content },
            Self::Html(content) => Token::HtmlBlock(content),
        }
    }
}

/// Maps pulldown events to pieces, splicing in custom marker edits.
struct Converter<'s> {
    source: &'s str,
    edits: &'s [MarkerEdit],
    hidden: Option<&'s HiddenText>,
    markers: &'s [BlockMarker],
    pieces: Vec<Piece>,
    opened: Vec<Opened>,
    /// Next ordinal for each open list.
    ordinals: Vec<u64>,
    in_table_head: bool,
    literal: Option<LiteralBlock>,
    image_depth: usize,
    /// The previous event was a nested marker; its line break is dropped.
    after_marker: bool,
}

impl<'s> Converter<'s> {
    fn new(
        source: &'s str,
        edits: &'s [MarkerEdit],
        hidden: Option<&'s HiddenText>,
        markers: &'s [BlockMarker],
    ) -> Self {
        Self {
            source,
            edits,
            hidden,
            markers,
            pieces: Vec::new(),
            opened: Vec::new(),
            ordinals: Vec::new(),
            in_table_head: false,
            literal: None,
            image_depth: 0,
            after_marker: false,
        }
    }

    fn push(&mut self, token: Token) {
        self.pieces.push(Piece::Token(token));
    }

    fn process_event(&mut self, event: Event<'_>, range: Range<usize>) {
        if self.image_depth > 0 {
            match event {
                Event::Start(Tag::Image { .. }) => self.image_depth += 1,
                Event::End(TagEnd::Image) => self.image_depth -= 1,
                _ => {}
            }
            return;
        }

        if let Event::Text(text) = &event
            && self.literal.is_none()
            && let Some(marker) = nested_marker(self.markers, text)
        {
            self.block_marker(marker.clone());
            return;
        }
        let after_marker = std::mem::take(&mut self.after_marker);
        match &event {
            Event::SoftBreak if after_marker => return,
            Event::End(_) => {}
            _ => self.resume_block(),
        }

        match event {
            Event::Start(tag) => self.start_tag(tag, &range),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => match &mut self.literal {
                Some(block) => block.push(&text),
                None => self.text(&text, range),
            },
            Event::Code(code) => self.push(Token::Code(code.into_string())),
            Event::Html(html) => match &mut self.literal {
                Some(block) => block.push(&html),
                None => self.push(Token::HtmlBlock(html.into_string())),
            },
            Event::InlineHtml(html) => self.push(Token::InlineHtml(html.into_string())),
            Event::SoftBreak => self.push(Token::SoftBreak),
            Event::HardBreak => self.push(Token::HardBreak),
            Event::Rule => self.push(Token::HorizontalRule),
            _ => {}
        }
    }

    fn open_block(&mut self, block: Block) {
        self.opened.push(Opened::Block(block.clone()));
        self.push(Token::BlockOpen(block));
    }

    fn open_inline(&mut self, inline: Inline) {
        self.opened.push(Opened::Inline(inline.clone()));
        self.push(Token::InlineOpen(inline));
    }

    fn open_literal(&mut self, block: LiteralBlock) {
        self.literal = Some(block);
        self.opened.push(Opened::Literal);
    }

    fn start_tag(&mut self, tag: Tag<'_>, range: &Range<usize>) {
        match tag {
            Tag::Paragraph => self.open_block(Block::Paragraph),
            Tag::Heading { level, .. } => {
                self.open_block(Block::Heading(heading_level_to_num(level)));
            }
            Tag::BlockQuote(_) => self.open_block(Block::Blockquote),
            Tag::CodeBlock(CodeBlockKind::Indented) => {
                self.open_literal(LiteralBlock::Indented(String::new()));
            }
            Tag::CodeBlock(CodeBlockKind::Fenced(info)) => {
                self.open_literal(LiteralBlock::Fenced {
                    info: info.into_string(),
                    content: String::new(),
                });
            }
            Tag::HtmlBlock => self.open_literal(LiteralBlock::Html(String::new())),
            Tag::List(start) => {
                self.ordinals.push(start.unwrap_or(1));
                let block = match start {
                    Some(start) => Block::OrderedList(start),
                    None => Block::BulletList(bullet_char(&self.source[range.clone()])),
                };
                self.open_block(block);
            }
            Tag::Item => {
                let ordinal = self.ordinals.last_mut().map_or(1, |next| {
                    let ordinal = *next;
                    *next += 1;
                    ordinal
                });
                self.open_block(Block::ListItem(ordinal));
            }
            Tag::Table(_) => self.open_block(Block::Table),
            Tag::TableHead => {
                self.in_table_head = true;
                self.open_block(Block::TableRow);
            }
            Tag::TableRow => self.open_block(Block::TableRow),
            Tag::TableCell => {
                let cell = if self.in_table_head {
                    Block::TableHeadCell
                } else {
                    Block::TableBodyCell
                };
                self.open_block(cell);
            }
            Tag::Emphasis => self.open_inline(Inline::Emphasis),
            Tag::Strong => self.open_inline(Inline::Strong),
            Tag::Strikethrough => self.open_inline(Inline::Strikethrough),
            Tag::Link { dest_url, .. } => self.open_inline(Inline::Link(dest_url.into_string())),
            Tag::Image { dest_url, .. } => {
                tracing::debug!(src = %dest_url, "Dropping image");
                self.image_depth = 1;
            }
            _ => self.opened.push(Opened::Ignored),
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::List(_) => {
                self.ordinals.pop();
            }
            TagEnd::TableHead => self.in_table_head = false,
            _ => {}
        }

        match self.opened.pop() {
            Some(Opened::Block(block)) => self.push(Token::BlockClose(block)),
            Some(Opened::Inline(inline)) => self.push(Token::InlineClose(inline)),
            Some(Opened::Literal) => {
                if let Some(block) = self.literal.take() {
                    self.push(block.into_token());
                }
            }
            Some(Opened::Ignored | Opened::Suspended(_)) | None => {}
        }
    }

    /// Emit a marker nested in a container.
    ///
    /// A paragraph holding the marker is closed before it and reopened by
    /// whatever content follows, as a top-level marker would split it.
    fn block_marker(&mut self, marker: BlockMarker) {
        if matches!(self.pieces.last(), Some(Piece::Token(Token::SoftBreak))) {
            self.pieces.pop();
        }
        if matches!(self.opened.last(), Some(Opened::Block(Block::Paragraph))) {
            self.opened.pop();
            self.opened.push(Opened::Suspended(Block::Paragraph));
            if matches!(
                self.pieces.last(),
                Some(Piece::Token(Token::BlockOpen(Block::Paragraph)))
            ) {
                self.pieces.pop();
            } else {
                self.push(Token::BlockClose(Block::Paragraph));
            }
        }
        self.push(marker.into_token());
        self.after_marker = true;
    }

    /// Reopen a block suspended by a nested marker.
    fn resume_block(&mut self) {
        if let Some(Opened::Suspended(block)) = self.opened.last() {
            let block = block.clone();
            self.opened.pop();
            self.open_block(block);
        }
    }

    /// Emit text, splitting verbatim text at custom marker edits.
    fn text(&mut self, text: &str, range: Range<usize>) {
        let source = self.source;
        if source.get(range.clone()) != Some(text) {
            self.plain(text);
            return;
        }

        let edits = self.edits;
        let first = edits.partition_point(|e| e.range.start < range.start);
        let mut cursor = range.start;
        for edit in edits[first..]
            .iter()
            .take_while(|e| e.range.end <= range.end)
        {
            self.plain(&source[cursor..edit.range.start]);
            let literal = source[edit.range.clone()].to_owned();
            self.pieces.push(if edit.opening {
                Piece::Open {
                    span: edit.span,
                    custom: edit.custom,
                    literal,
                }
            } else {
                Piece::Close {
                    span: edit.span,
                    custom: edit.custom,
                    literal,
                }
            });
            cursor = edit.range.end;
        }
        self.plain(&source[cursor..range.end]);
    }

    /// Emit text, turning hidden text placeholders into tokens.
    fn plain(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let Some(hidden) = self.hidden else {
            self.push(Token::text(text));
            return;
        };

        let mut start = 0;
        for (i, c) in text.char_indices() {
            if let Some(span) = hidden.span_for(c) {
                if start < i {
                    self.push(Token::text(&text[start..i]));
                }
                self.push(Token::HideText(span.to_owned()));
                start = i + c.len_utf8();
            }
        }
        if start < text.len() {
            self.push(Token::text(&text[start..]));
        }
    }
}

enum Frame {
    Standard,
    Custom {
        span: usize,
        index: usize,
        literal: String,
    },
}

/// Resolve custom pieces into a well-nested token stream.
///
/// A custom span must close inside the same standard container it opened
/// in. Otherwise both markers are demoted to literal text.
fn repair_nesting(pieces: Vec<Piece>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(pieces.len());
    let mut frames: Vec<Frame> = Vec::new();

    for piece in pieces {
        match piece {
            Piece::Token(token) => {
                if token.is_open() {
                    frames.push(Frame::Standard);
                } else if token.is_close() {
                    while let Some(Frame::Custom { .. }) = frames.last() {
                        if let Some(Frame::Custom { index, literal, .. }) = frames.pop() {
                            out[index] = Token::Text(literal);
                        }
                    }
                    frames.pop();
                }
                out.push(token);
            }
            Piece::Open {
                span,
                custom,
                literal,
            } => {
                frames.push(Frame::Custom {
                    span,
                    index: out.len(),
                    literal,
                });
                out.push(Token::CustomOpen(custom));
            }
            Piece::Close {
                span,
                custom,
                literal,
            } => {
                let position = frames
                    .iter()
                    .rposition(|f| matches!(f, Frame::Custom { span: s, .. } if *s == span));
                match position {
                    Some(pos) if pos + 1 == frames.len() => {
                        frames.pop();
                        out.push(Token::CustomClose(custom));
                    }
                    Some(pos) => {
                        if let Frame::Custom {
                            index,
                            literal: open_literal,
                            ..
                        } = frames.remove(pos)
                        {
                            out[index] = Token::Text(open_literal);
                        }
                        out.push(Token::Text(literal));
                    }
                    None => out.push(Token::Text(literal)),
                }
            }
        }
    }

    for frame in frames {
        if let Frame::Custom { index, literal, .. } = frame {
            out[index] = Token::Text(literal);
        }
    }

    merge_text(out)
}

fn merge_text(tokens: Vec<Token>) -> Vec<Token> {
    let mut merged: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if let (Token::Text(text), Some(Token::Text(prev))) = (&token, merged.last_mut()) {
            prev.push_str(text);
            continue;
        }
        merged.push(token);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{SizeMode, TableHeaderSettings};
    use crate::token::Alignment;
    use pretty_assertions::assert_eq;

    fn tokenize(src: &str) -> Vec<Token> {
        Tokenizer::new().tokenize(src)
    }

    fn paragraph(inner: Vec<Token>) -> Vec<Token> {
        let mut tokens = vec![Token::BlockOpen(Block::Paragraph)];
        tokens.extend(inner);
        tokens.push(Token::BlockClose(Block::Paragraph));
        tokens
    }

    fn justify(alignment: Alignment, text: &str) -> Vec<Token> {
        vec![
            Token::CustomOpen(Custom::Justify(alignment)),
            Token::text(text),
            Token::CustomClose(Custom::Justify(alignment)),
        ]
    }

    fn assert_well_nested(tokens: &[Token]) {
        let mut stack = Vec::new();
        for token in tokens {
            match token {
                Token::BlockOpen(_) | Token::InlineOpen(_) | Token::CustomOpen(_) => {
                    stack.push(token.clone());
                }
                Token::BlockClose(b) => {
                    assert_eq!(stack.pop(), Some(Token::BlockOpen(b.clone())));
                }
                Token::InlineClose(i) => {
                    assert_eq!(stack.pop(), Some(Token::InlineOpen(i.clone())));
                }
                Token::CustomClose(c) => assert_eq!(stack.pop(), Some(Token::CustomOpen(*c))),
                _ => {}
            }
        }
        assert!(stack.is_empty(), "unclosed: {stack:?}");
    }

    #[test]
    fn test_plain_paragraph() {
        assert_eq!(tokenize("Hello world\n"), paragraph(vec![Token::text("Hello world")]));
    }

    #[test]
    fn test_justify_left_center_right() {
        assert_eq!(tokenize(":text:\n"), paragraph(justify(Alignment::Left, "text")));
        assert_eq!(tokenize("::text::\n"), paragraph(justify(Alignment::Center, "text")));
        assert_eq!(tokenize(":::text:::\n"), paragraph(justify(Alignment::Right, "text")));
    }

    #[test]
    fn test_unmatched_marker_is_literal() {
        assert_eq!(tokenize(":open only\n"), paragraph(vec![Token::text(":open only")]));
        assert_eq!(tokenize("Note: fine\n"), paragraph(vec![Token::text("Note: fine")]));
    }

    #[test]
    fn test_hanging_indent_around_emphasis() {
        assert_eq!(
            tokenize("!hang *em* text!\n"),
            paragraph(vec![
                Token::CustomOpen(Custom::HangingIndent),
                Token::text("hang "),
                Token::InlineOpen(Inline::Emphasis),
                Token::text("em"),
                Token::InlineClose(Inline::Emphasis),
                Token::text(" text"),
                Token::CustomClose(Custom::HangingIndent),
            ])
        );
    }

    #[test]
    fn test_interleaved_span_is_demoted() {
        let tokens = tokenize(":a *b: c*\n");
        assert_eq!(
            tokens,
            paragraph(vec![
                Token::text(":a "),
                Token::InlineOpen(Inline::Emphasis),
                Token::text("b: c"),
                Token::InlineClose(Inline::Emphasis),
            ])
        );
        assert_well_nested(&tokens);
    }

    #[test]
    fn test_nested_custom_spans() {
        let tokens = tokenize("!a ::b:: c!\n");
        assert_eq!(
            tokens,
            paragraph(vec![
                Token::CustomOpen(Custom::HangingIndent),
                Token::text("a "),
                Token::CustomOpen(Custom::Justify(Alignment::Center)),
                Token::text("b"),
                Token::CustomClose(Custom::Justify(Alignment::Center)),
                Token::text(" c"),
                Token::CustomClose(Custom::HangingIndent),
            ])
        );
    }

    #[test]
    fn test_markers_in_code_span() {
        assert_eq!(
            tokenize(":a `b:` c:\n"),
            paragraph(vec![
                Token::CustomOpen(Custom::Justify(Alignment::Left)),
                Token::text("a "),
                Token::Code("b:".to_owned()),
                Token::text(" c"),
                Token::CustomClose(Custom::Justify(Alignment::Left)),
            ])
        );
    }

    #[test]
    fn test_justify_in_heading() {
        let mut expected = vec![Token::BlockOpen(Block::Heading(1))];
        expected.extend(justify(Alignment::Center, "Title"));
        expected.push(Token::BlockClose(Block::Heading(1)));
        assert_eq!(tokenize("# ::Title::\n"), expected);
    }

    #[test]
    fn test_justify_in_tight_list_item() {
        let tokens = tokenize("- :a:\n");
        assert_eq!(
            tokens,
            vec![
                Token::BlockOpen(Block::BulletList('-')),
                Token::BlockOpen(Block::ListItem(1)),
                Token::CustomOpen(Custom::Justify(Alignment::Left)),
                Token::text("a"),
                Token::CustomClose(Custom::Justify(Alignment::Left)),
                Token::BlockClose(Block::ListItem(1)),
                Token::BlockClose(Block::BulletList('-')),
            ]
        );
    }

    #[test]
    fn test_hidden_text() {
        assert_eq!(
            tokenize("a \\\\*x*\\\\ b\n"),
            paragraph(vec![
                Token::text("a "),
                Token::HideText("\\\\*x*\\\\".to_owned()),
                Token::text(" b"),
            ])
        );
    }

    #[test]
    fn test_hidden_text_opens_container() {
        let hidden = || Token::HideText("\\\\*x*\\\\".to_owned());

        assert_eq!(
            tokenize("\\\\*x*\\\\ b\n"),
            paragraph(vec![hidden(), Token::text(" b")])
        );
        assert_eq!(
            tokenize("# \\\\*x*\\\\ T\n"),
            vec![
                Token::BlockOpen(Block::Heading(1)),
                hidden(),
                Token::text(" T"),
                Token::BlockClose(Block::Heading(1)),
            ]
        );
        assert_eq!(
            tokenize("- \\\\*x*\\\\ T\n"),
            vec![
                Token::BlockOpen(Block::BulletList('-')),
                Token::BlockOpen(Block::ListItem(1)),
                hidden(),
                Token::text(" T"),
                Token::BlockClose(Block::ListItem(1)),
                Token::BlockClose(Block::BulletList('-')),
            ]
        );

        let tokens = tokenize("| \\\\*x*\\\\ a | b |\n| - | - |\n| c | d |\n");
        assert!(tokens.windows(3).any(|w| w
            == [
                Token::BlockOpen(Block::TableHeadCell),
                hidden(),
                Token::text(" a"),
            ]));
        assert_well_nested(&tokens);
    }

    #[test]
    fn test_escaped_marker_opens_container() {
        assert_eq!(tokenize("\\:a:\n"), paragraph(vec![Token::text(":a:")]));
    }

    #[test]
    fn test_entities_inside_custom_span() {
        assert_eq!(
            tokenize("::Tom &amp; Jerry::\n"),
            paragraph(justify(Alignment::Center, "Tom & Jerry"))
        );
        assert_eq!(
            tokenize("::a&#42;b::\n"),
            paragraph(justify(Alignment::Center, "a*b"))
        );
        assert_eq!(
            tokenize("!x &lt; y!\n"),
            paragraph(vec![
                Token::CustomOpen(Custom::HangingIndent),
                Token::text("x < y"),
                Token::CustomClose(Custom::HangingIndent),
            ])
        );
    }

    #[test]
    fn test_escape_inside_custom_span() {
        assert_eq!(
            tokenize("::Tom \\& Jerry::\n"),
            paragraph(justify(Alignment::Center, "Tom & Jerry"))
        );
    }

    #[test]
    fn test_unterminated_hidden_text_is_not_hidden() {
        let tokens = tokenize("a \\\\*x\n");
        assert!(!tokens.iter().any(|t| matches!(t, Token::HideText(_))));
    }

    #[test]
    fn test_page_break() {
        assert_eq!(
            tokenize("one\n\\page\ntwo\n"),
            vec![
                Token::BlockOpen(Block::Paragraph),
                Token::text("one"),
                Token::BlockClose(Block::Paragraph),
                Token::PageBreak,
                Token::BlockOpen(Block::Paragraph),
                Token::text("two"),
                Token::BlockClose(Block::Paragraph),
            ]
        );
    }

    #[test]
    fn test_page_break_in_blockquote() {
        assert_eq!(
            tokenize("> \\page\n"),
            vec![
                Token::BlockOpen(Block::Blockquote),
                Token::PageBreak,
                Token::BlockClose(Block::Blockquote),
            ]
        );
    }

    #[test]
    fn test_page_break_splits_quoted_paragraph() {
        assert_eq!(
            tokenize("> one\n> \\page\n> two\n"),
            vec![
                Token::BlockOpen(Block::Blockquote),
                Token::BlockOpen(Block::Paragraph),
                Token::text("one"),
                Token::BlockClose(Block::Paragraph),
                Token::PageBreak,
                Token::BlockOpen(Block::Paragraph),
                Token::text("two"),
                Token::BlockClose(Block::Paragraph),
                Token::BlockClose(Block::Blockquote),
            ]
        );
    }

    #[test]
    fn test_page_break_in_ordered_list_keeps_numbering() {
        let tokens = tokenize("1. a\n\n   \\page\n2. b\n");
        let lists = tokens
            .iter()
            .filter(|t| matches!(t, Token::BlockOpen(Block::OrderedList(_))))
            .count();
        assert_eq!(lists, 1);
        assert_eq!(tokens[0], Token::BlockOpen(Block::OrderedList(1)));

        let page = tokens.iter().position(|t| *t == Token::PageBreak).unwrap();
        let first_close = tokens
            .iter()
            .position(|t| *t == Token::BlockClose(Block::ListItem(1)))
            .unwrap();
        let second = tokens
            .iter()
            .position(|t| *t == Token::BlockOpen(Block::ListItem(2)))
            .unwrap();
        assert!(page < first_close && first_close < second);
        assert_well_nested(&tokens);
    }

    #[test]
    fn test_table_settings_in_tight_list_item() {
        let tokens = tokenize("- a\n  \\thead al\n- b\n");
        assert_eq!(
            &tokens[..4],
            &[
                Token::BlockOpen(Block::BulletList('-')),
                Token::BlockOpen(Block::ListItem(1)),
                Token::text("a"),
                Token::TableSettings(TableHeaderSettings {
                    alignment: Alignment::Left,
                    ..TableHeaderSettings::default()
                }),
            ]
        );
        assert_eq!(tokens[4], Token::BlockClose(Block::ListItem(1)));
        assert_well_nested(&tokens);
    }

    #[test]
    fn test_page_marker_inside_fence() {
        assert_eq!(
            tokenize("```\n\\page\n```\n"),
            vec![Token::Fence {
                info: String::new(),
                content: "\\page\n".to_owned(),
            }]
        );
    }

    #[test]
    fn test_table_settings_then_table() {
        let tokens = tokenize("\\thead al s sfull\n\n| a | b |\n| --- | --- |\n| x | y |\n");
        assert_eq!(
            tokens[0],
            Token::TableSettings(TableHeaderSettings {
                lines: true,
                size_mode: SizeMode::Full,
                alignment: Alignment::Left,
                column_weights: Vec::new(),
                column_weight_sum: 0.0,
            })
        );
        assert_eq!(
            &tokens[1..5],
            &[
                Token::BlockOpen(Block::Table),
                Token::BlockOpen(Block::TableRow),
                Token::BlockOpen(Block::TableHeadCell),
                Token::text("a"),
            ]
        );
        assert!(tokens.contains(&Token::BlockOpen(Block::TableBodyCell)));
        assert_well_nested(&tokens);
    }

    #[test]
    fn test_lists() {
        let tokens = tokenize("3. x\n4. y\n");
        assert_eq!(tokens[0], Token::BlockOpen(Block::OrderedList(3)));
        assert!(tokens.contains(&Token::BlockOpen(Block::ListItem(4))));

        let tokens = tokenize("+ a\n");
        assert_eq!(tokens[0], Token::BlockOpen(Block::BulletList('+')));
    }

    #[test]
    fn test_fenced_code() {
        assert_eq!(
            tokenize("```rust\nfn x() {}\n```\n"),
            vec![Token::Fence {
                info: "rust".to_owned(),
                content: "fn x() {}\n".to_owned(),
            }]
        );
    }

    #[test]
    fn test_image_is_dropped() {
        assert_eq!(tokenize("![alt](x.png)\n"), paragraph(Vec::new()));
    }

    #[test]
    fn test_link() {
        assert_eq!(
            tokenize("[a](http://x.y)\n"),
            paragraph(vec![
                Token::InlineOpen(Inline::Link("http://x.y".to_owned())),
                Token::text("a"),
                Token::InlineClose(Inline::Link("http://x.y".to_owned())),
            ])
        );
    }

    #[test]
    fn test_well_nested_for_awkward_inputs() {
        for src in [
            ":a **b: c**\n",
            "**a :b** c:\n",
            "!a :b! c:\n",
            "::a: b:\n",
            "> :quote\n> more:\n",
            "| :a | b: |\n| - | - |\n",
            "[x:](y) :z:\n",
            "::::\n",
            "!!\n",
        ] {
            assert_well_nested(&tokenize(src));
        }
    }
}

//! Line-level block markers: `\page` and `\thead`.
//!
//! Markers are recognised at the start of a line (after at most three spaces
//! of indentation) outside fenced code. At top level the source is split
//! into markdown segments around marker lines so each marker can interrupt a
//! paragraph. Inside a blockquote or list item the marker line is replaced
//! by a placeholder character instead, so the container stays whole.

use std::num::ParseFloatError;

use crate::fence::FenceTracker;
use crate::token::{Alignment, Token};

pub const PAGE_BREAK_MARKER: &str = "\\page";
pub const TABLE_SETTINGS_MARKER: &str = "\\thead";

/// Placeholders for nested markers live in the Private Use Area.
const NESTED_MARKER_BASE: u32 = 0xE000;
const NESTED_MARKER_LIMIT: u32 = 0xF8FF;

/// How table column widths are chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SizeMode {
    /// Natural widths, shrunk to fit the available width.
    #[default]
    Wrap,
    /// Half the available width.
    Half,
    /// The full available width.
    Full,
}

/// Options from a `\thead` line, applied to the next table.
#[derive(Clone, Debug, PartialEq)]
pub struct TableHeaderSettings {
    /// Draw cell borders.
    pub lines: bool,
    pub size_mode: SizeMode,
    pub alignment: Alignment,
    /// Relative column widths from a `c` option.
    pub column_weights: Vec<f64>,
    pub column_weight_sum: f64,
}

impl Default for TableHeaderSettings {
    fn default() -> Self {
        Self {
            lines: true,
            size_mode: SizeMode::Wrap,
            alignment: Alignment::Center,
            column_weights: Vec::new(),
            column_weight_sum: 0.0,
        }
    }
}

/// A `c` option with a weight that is not a non-negative number.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid column weight `{weight}`: {source}")]
    Weight {
        weight: String,
        source: ParseFloatError,
    },
    #[error("column weight `{0}` must be a finite non-negative number")]
    OutOfRange(String),
}

impl TableHeaderSettings {
    /// Parse the whitespace-separated options following `\thead`.
    ///
    /// Options are dispatched on their first letter: `a` alignment
    /// (`al`, `ar`, anything else centers), `l` lines (`lt`/`ll` on,
    /// anything else off), `s` size mode (`shalf`, `sfull`, anything else
    /// wraps), `c` colon-separated column weights. Unknown options are
    /// ignored; the last occurrence of an option wins.
    ///
    /// # Errors
    ///
    /// Returns an error when a column weight is not a finite non-negative
    /// number.
    pub fn parse(options: &str) -> Result<Self, SettingsError> {
        let mut settings = Self::default();

        for option in options.split_whitespace() {
            let mut chars = option.chars();
            let Some(kind) = chars.next() else {
                continue;
            };
            let value = chars.as_str();
            match kind {
                'a' => {
                    settings.alignment = match value {
                        "l" => Alignment::Left,
                        "r" => Alignment::Right,
                        _ => Alignment::Center,
                    };
                }
                'l' => settings.lines = matches!(value, "t" | "l"),
                's' => {
                    settings.size_mode = match value {
                        "half" => SizeMode::Half,
                        "full" => SizeMode::Full,
                        _ => SizeMode::Wrap,
                    };
                }
                'c' => {
                    let weights = parse_weights(value)?;
                    settings.column_weight_sum = weights.iter().sum();
                    settings.column_weights = weights;
                }
                _ => {}
            }
        }

        Ok(settings)
    }
}

fn parse_weights(value: &str) -> Result<Vec<f64>, SettingsError> {
    value
        .split(':')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let weight: f64 = w.parse().map_err(|source| SettingsError::Weight {
                weight: w.to_owned(),
                source,
            })?;
            if weight.is_finite() && weight >= 0.0 {
                Ok(weight)
            } else {
                Err(SettingsError::OutOfRange(w.to_owned()))
            }
        })
        .collect()
}

/// A recognised block marker line.
#[derive(Clone, Debug, PartialEq)]
pub enum BlockMarker {
    PageBreak,
    TableSettings(TableHeaderSettings),
}

impl BlockMarker {
    #[must_use]
    pub fn into_token(self) -> Token {
        match self {
            Self::PageBreak => Token::PageBreak,
            Self::TableSettings(settings) => Token::TableSettings(settings),
        }
    }
}

/// Classification of a single source line.
#[derive(Clone, Debug, PartialEq)]
pub enum LineMatch {
    Marker(BlockMarker),
    /// A `\thead` line with bad options: not a marker, but it still ends
    /// the preceding paragraph.
    Interrupt,
    Plain,
}

/// Classify a line against the block marker rules.
#[must_use]
pub fn match_line(line: &str) -> LineMatch {
    let Some(body) = strip_indent(line) else {
        return LineMatch::Plain;
    };

    if body.starts_with(PAGE_BREAK_MARKER) {
        return LineMatch::Marker(BlockMarker::PageBreak);
    }
    if let Some(options) = body.strip_prefix(TABLE_SETTINGS_MARKER) {
        return match TableHeaderSettings::parse(options) {
            Ok(settings) => LineMatch::Marker(BlockMarker::TableSettings(settings)),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring table settings line");
                LineMatch::Interrupt
            }
        };
    }
    LineMatch::Plain
}

/// Strip up to three spaces of indentation; `None` if the line is indented
/// further (or by a tab).
fn strip_indent(line: &str) -> Option<&str> {
    let spaces = line.bytes().take_while(|&b| b == b' ').count();
    if spaces > 3 || line[spaces..].starts_with('\t') {
        return None;
    }
    Some(&line[spaces..])
}

/// A piece of source between top-level marker lines.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Segment {
    /// Markdown text. Markers nested in containers appear as placeholder
    /// characters indexing `markers`.
    Markdown {
        text: String,
        markers: Vec<BlockMarker>,
    },
    Marker(BlockMarker),
}

/// Marker for text consisting of exactly one nested marker placeholder.
pub(crate) fn nested_marker<'m>(
    markers: &'m [BlockMarker],
    text: &str,
) -> Option<&'m BlockMarker> {
    let mut chars = text.chars();
    let code = u32::from(chars.next()?);
    if chars.next().is_some() || !(NESTED_MARKER_BASE..=NESTED_MARKER_LIMIT).contains(&code) {
        return None;
    }
    markers.get(usize::try_from(code - NESTED_MARKER_BASE).ok()?)
}

fn nested_placeholder(index: usize) -> Option<char> {
    let code = NESTED_MARKER_BASE.checked_add(u32::try_from(index).ok()?)?;
    if code > NESTED_MARKER_LIMIT {
        return None;
    }
    char::from_u32(code)
}

/// Split source into markdown segments and block markers.
pub(crate) fn split_segments(src: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut markers = Vec::new();
    let mut fence = FenceTracker::new();
    let mut lists = ListTracker::default();

    for line in src.split_inclusive('\n') {
        if fence.update(line) || fence.in_fence() {
            current.push_str(line);
            continue;
        }
        let list_column = lists.update(line);
        match match_line(line) {
            LineMatch::Marker(marker) if list_column.is_none() => {
                flush(&mut segments, &mut current, &mut markers);
                segments.push(Segment::Marker(marker));
                lists.clear();
            }
            LineMatch::Interrupt if list_column.is_none() => {
                flush(&mut segments, &mut current, &mut markers);
                current.push_str(line);
            }
            _ => push_line(line, list_column, &mut current, &mut markers),
        }
    }
    flush(&mut segments, &mut current, &mut markers);
    segments
}

/// Append a line, swapping a marker nested in a container for a placeholder.
fn push_line(
    line: &str,
    list_column: Option<usize>,
    current: &mut String,
    markers: &mut Vec<BlockMarker>,
) {
    let nested =
        container_body(line, list_column).and_then(|start| match match_line(&line[start..]) {
            LineMatch::Marker(marker) => Some((start, marker)),
            _ => None,
        });
    let Some((start, marker)) = nested else {
        current.push_str(line);
        return;
    };
    let Some(placeholder) = nested_placeholder(markers.len()) else {
        tracing::warn!("Too many nested block markers, keeping the rest as text");
        current.push_str(line);
        return;
    };

    current.push_str(&line[..start]);
    current.push(placeholder);
    if line.ends_with('\n') {
        current.push('\n');
    }
    markers.push(marker);
}

fn flush(segments: &mut Vec<Segment>, current: &mut String, markers: &mut Vec<BlockMarker>) {
    if !current.is_empty() {
        segments.push(Segment::Markdown {
            text: std::mem::take(current),
            markers: std::mem::take(markers),
        });
    }
}

/// Offset where a container's content starts on this line, if the line
/// belongs to a blockquote or list item.
fn container_body(line: &str, list_column: Option<usize>) -> Option<usize> {
    let quoted = quote_prefix_len(line);
    if quoted > 0 {
        return Some(quoted);
    }
    if let Some(column) = list_item_column(line) {
        return Some(column);
    }
    list_column.map(|column| indent_width(line).min(column))
}

fn indent_width(line: &str) -> usize {
    line.bytes().take_while(|&b| b == b' ').count()
}

/// Length of the leading `>` markers, each with one optional space.
fn quote_prefix_len(line: &str) -> usize {
    let mut end = 0;
    loop {
        let rest = &line[end..];
        let spaces = indent_width(rest);
        if spaces > 3 || !rest[spaces..].starts_with('>') {
            return end;
        }
        end += spaces + 1;
        if line[end..].starts_with(' ') {
            end += 1;
        }
    }
}

/// Content column of a list item line: bullet or ordinal, then spaces.
fn list_item_column(line: &str) -> Option<usize> {
    let indent = indent_width(line);
    let rest = &line[indent..];
    if is_thematic_break(rest) {
        return None;
    }
    let marker = if rest.starts_with(['-', '*', '+']) {
        1
    } else {
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 || digits > 9 || !rest[digits..].starts_with(['.', ')']) {
            return None;
        }
        digits + 1
    };

    let after = &rest[marker..];
    let spaces = indent_width(after);
    if spaces == 0 || after[spaces..].trim().is_empty() {
        return None;
    }
    // Five or more spaces start indented code one column after the marker.
    let gap = if spaces > 4 { 1 } else { spaces };
    Some(indent + marker + gap)
}

fn is_thematic_break(rest: &str) -> bool {
    let mut marks = rest.chars().filter(|c| !c.is_whitespace());
    let Some(first) = marks.next() else {
        return false;
    };
    matches!(first, '-' | '*' | '_') && marks.clone().all(|c| c == first) && marks.count() >= 2
}

/// Content columns of the open list items, innermost last.
#[derive(Debug, Default)]
struct ListTracker {
    columns: Vec<usize>,
    after_blank: bool,
}

impl ListTracker {
    /// Feed one line. Returns the content column of the list item the line
    /// belongs to, if any.
    ///
    /// A line continues an item when it is indented to the item's content,
    /// or lazily when no blank line separates it from the item.
    fn update(&mut self, line: &str) -> Option<usize> {
        if line.trim().is_empty() {
            self.after_blank = true;
            return None;
        }
        let after_blank = std::mem::take(&mut self.after_blank);
        let indent = indent_width(line);
        let limit = self.columns.last().copied().unwrap_or(0) + 4;

        if indent < limit
            && let Some(column) = list_item_column(line)
        {
            self.columns.retain(|&c| c <= indent);
            self.columns.push(column);
            return Some(column);
        }
        if after_blank {
            self.columns.retain(|&c| c <= indent);
        }
        self.columns.last().copied()
    }

    fn clear(&mut self) {
        self.columns.clear();
        self.after_blank = false;
    }
}

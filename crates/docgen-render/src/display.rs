//! Recording canvas that lays text out into a serialisable display list.
//!
//! Text is measured with a fixed width model (half an em per character,
//! slightly wider for bold), so layouts are deterministic and independent of
//! any font files.

use docgen_config::PageGeometry;
use docgen_markup::Alignment;
use serde::Serialize;

use crate::canvas::{Canvas, Color, FontStyle, Margins, PageDecorator};
use crate::error::CanvasError;

/// Font families the canvas can measure.
pub const KNOWN_FONTS: [&str; 4] = ["Arial", "Helvetica", "Courier", "Times"];

const REGULAR_EM: f64 = 0.5;
const BOLD_EM: f64 = 0.55;
const DEFAULT_FONT_SIZE: f64 = 12.0;
const CELL_PADDING_MM: f64 = 1.0;
const LINE_WIDTH_MM: f64 = 0.2;
const EPSILON: f64 = 1e-9;

/// A recorded drawing primitive.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    /// A run of text; `y` is the top of its line. Invisible text has size 0.
    Text {
        x: f64,
        y: f64,
        text: String,
        font: String,
        style: FontStyle,
        size: f64,
    },
    /// Clickable area over previously drawn text.
    Link {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        href: String,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Option<Color>,
        stroke: bool,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        width: f64,
    },
}

/// One page of recorded primitives.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Page {
    pub number: usize,
    pub ops: Vec<DrawOp>,
}

/// The finished document.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DisplayList {
    pub width: f64,
    pub height: f64,
    pub margins: Margins,
    pub pages: Vec<Page>,
}

impl DisplayList {
    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Clone, Debug)]
struct Font {
    family: String,
    style: FontStyle,
    size: f64,
}

/// Graphics state kept unchanged across page decorations.
struct SavedState {
    font: Font,
    fill: Color,
    line_width: f64,
}

#[derive(Clone, Copy)]
enum Decoration {
    Header,
    Footer,
}

/// A placed piece of flowing text.
struct Placed {
    page: usize,
    x: f64,
    y: f64,
    width: f64,
}

/// Canvas that records every primitive into a [`DisplayList`].
pub struct DisplayCanvas {
    width: f64,
    height: f64,
    page_margins: Margins,
    margins: Margins,
    points_per_unit: f64,
    cell_padding: f64,
    x: f64,
    y: f64,
    font: Font,
    line_width: f64,
    fill: Color,
    pages: Vec<Page>,
    fault: Option<CanvasError>,
    decorator: Option<Box<dyn PageDecorator>>,
    decorating: bool,
}

#[allow(clippy::cast_precision_loss)]
fn char_count(text: &str) -> f64 {
    text.chars().count() as f64
}

impl DisplayCanvas {
    /// Create a canvas with no pages yet; the first drawing call opens one.
    #[must_use]
    pub fn new(page: &PageGeometry) -> Self {
        let margins = Margins {
            left: page.margin,
            top: page.margin,
            right: page.margin,
            bottom: page.margin,
        };
        Self {
            width: page.width,
            height: page.height,
            page_margins: margins,
            margins,
            points_per_unit: page.unit.points_per_unit(),
            cell_padding: page.unit.from_mm(CELL_PADDING_MM),
            x: margins.left,
            y: margins.top,
            font: Font {
                family: KNOWN_FONTS[0].to_owned(),
                style: FontStyle::default(),
                size: DEFAULT_FONT_SIZE,
            },
            line_width: page.unit.from_mm(LINE_WIDTH_MM),
            fill: Color::default(),
            pages: Vec::new(),
            fault: None,
            decorator: None,
            decorating: false,
        }
    }

    /// Close the last page and return the display list.
    ///
    /// # Errors
    ///
    /// Returns the sticky fault if any drawing call failed.
    pub fn finish(mut self) -> Result<DisplayList, CanvasError> {
        self.check()?;
        if self.pages.is_empty() {
            self.add_page()?;
        }
        let saved = self.save_state();
        self.decorate(Decoration::Footer)?;
        self.restore_state(saved);
        self.check()?;

        Ok(DisplayList {
            width: self.width,
            height: self.height,
            margins: self.page_margins,
            pages: self.pages,
        })
    }

    fn check(&self) -> Result<(), CanvasError> {
        match &self.fault {
            Some(fault) => Err(fault.clone()),
            None => Ok(()),
        }
    }

    /// Record a fault; the first fault wins.
    fn fail(&mut self, error: CanvasError) -> CanvasError {
        self.fault.get_or_insert(error).clone()
    }

    fn ensure_page(&mut self) -> Result<(), CanvasError> {
        if self.pages.is_empty() {
            self.add_page()?;
        }
        Ok(())
    }

    fn push_op(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    fn right_edge(&self) -> f64 {
        self.width - self.margins.right
    }

    fn page_break_trigger(&self) -> f64 {
        self.height - self.margins.bottom
    }

    /// Break the page when a line of `line_height` no longer fits.
    ///
    /// Decorations draw into the margins, and a line taller than the whole
    /// printable area is placed anyway rather than looping.
    fn make_room(&mut self, line_height: f64) -> Result<bool, CanvasError> {
        if self.decorating
            || self.y + line_height <= self.page_break_trigger() + EPSILON
            || self.y <= self.margins.top + EPSILON
        {
            return Ok(false);
        }
        self.add_page()?;
        Ok(true)
    }

    fn line_break(&mut self, line_height: f64) {
        self.x = self.margins.left;
        self.y += line_height;
    }

    fn em(&self) -> f64 {
        if self.font.style.bold { BOLD_EM } else { REGULAR_EM }
    }

    fn text_op(&self, x: f64, text: &str, visible: bool) -> DrawOp {
        DrawOp::Text {
            x,
            y: self.y,
            text: text.to_owned(),
            font: self.font.family.clone(),
            style: self.font.style,
            size: if visible { self.font.size } else { 0.0 },
        }
    }

    fn place(
        &mut self,
        line_height: f64,
        x: f64,
        text: &str,
        visible: bool,
    ) -> Result<Placed, CanvasError> {
        let x = if self.make_room(line_height)? {
            self.x
        } else {
            x
        };
        let op = self.text_op(x, text, visible);
        self.push_op(op);
        Ok(Placed {
            page: self.pages.len(),
            x,
            y: self.y,
            width: self.string_width(text),
        })
    }

    /// Lay out flowing text from the cursor, wrapping at the right margin.
    fn flow(
        &mut self,
        line_height: f64,
        text: &str,
        visible: bool,
    ) -> Result<Vec<Placed>, CanvasError> {
        self.check()?;
        self.ensure_page()?;

        let mut placed = Vec::new();
        for (i, segment) in text.split('\n').enumerate() {
            if i > 0 {
                self.line_break(line_height);
            }

            let mut run = String::new();
            let mut run_x = self.x;
            for word in segment.split_inclusive(' ') {
                let needed = self.string_width(&run) + self.string_width(word.trim_end());
                let line_started = !run.is_empty() || run_x > self.margins.left + EPSILON;
                if line_started && run_x + needed > self.right_edge() + EPSILON {
                    if !run.is_empty() {
                        placed.push(self.place(line_height, run_x, &run, visible)?);
                    }
                    self.line_break(line_height);
                    run.clear();
                    run_x = self.x;
                    if word.trim().is_empty() {
                        continue;
                    }
                }
                run.push_str(word);
            }

            if !run.is_empty() {
                let piece = self.place(line_height, run_x, &run, visible)?;
                self.x = piece.x + piece.width;
                placed.push(piece);
            }
        }
        Ok(placed)
    }

    fn write_aligned(
        &mut self,
        line_height: f64,
        text: &str,
        align: Alignment,
    ) -> Result<(), CanvasError> {
        self.check()?;
        self.ensure_page()?;

        let available = self.right_edge() - self.margins.left;
        for (i, line) in self.wrap(text, available).iter().enumerate() {
            if i > 0 {
                self.line_break(line_height);
            }
            if line.is_empty() {
                continue;
            }
            let line_width = self.string_width(line);
            let x = match align {
                Alignment::Left => self.x,
                Alignment::Center => self.margins.left + (available - line_width) / 2.0,
                Alignment::Right => self.margins.left + available - line_width,
            };
            let piece = self.place(line_height, x, line, true)?;
            self.x = piece.x + piece.width;
        }
        Ok(())
    }

    /// Greedy word wrap; `\n` always breaks.
    fn wrap(&self, text: &str, width: f64) -> Vec<String> {
        let mut lines = Vec::new();
        for segment in text.split('\n') {
            let mut line = String::new();
            for word in segment.split_inclusive(' ') {
                let needed = self.string_width(&line) + self.string_width(word.trim_end());
                if !line.trim().is_empty() && needed > width + EPSILON {
                    lines.push(line.trim_end().to_owned());
                    line.clear();
                    if word.trim().is_empty() {
                        continue;
                    }
                }
                line.push_str(word);
            }
            lines.push(line.trim_end().to_owned());
        }
        lines
    }

    fn save_state(&self) -> SavedState {
        SavedState {
            font: self.font.clone(),
            fill: self.fill,
            line_width: self.line_width,
        }
    }

    fn restore_state(&mut self, saved: SavedState) {
        self.font = saved.font;
        self.fill = saved.fill;
        self.line_width = saved.line_width;
    }

    fn decorate(&mut self, kind: Decoration) -> Result<(), CanvasError> {
        let Some(mut decorator) = self.decorator.take() else {
            return Ok(());
        };
        let page = self.page();

        self.decorating = true;
        let result = match kind {
            Decoration::Header => decorator.header(self, page),
            Decoration::Footer => decorator.footer(self, page),
        };
        self.decorating = false;
        self.decorator = Some(decorator);

        result.map_err(|e| self.fail(CanvasError::Decoration(e.to_string())))
    }
}

impl Canvas for DisplayCanvas {
    fn page_size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn margins(&self) -> Margins {
        self.margins
    }

    fn set_left_margin(&mut self, margin: f64) {
        self.margins.left = margin;
        if !self.pages.is_empty() && self.x < margin {
            self.x = margin;
        }
    }

    fn x(&self) -> f64 {
        self.x
    }

    fn y(&self) -> f64 {
        self.y
    }

    fn set_x(&mut self, x: f64) {
        self.x = x;
    }

    fn set_y(&mut self, y: f64) {
        self.x = self.margins.left;
        self.y = y;
    }

    fn font_style(&self) -> FontStyle {
        self.font.style
    }

    fn font_size(&self) -> f64 {
        self.font.size
    }

    fn set_font(&mut self, family: &str, style: FontStyle, size: f64) -> Result<(), CanvasError> {
        self.check()?;
        let Some(known) = KNOWN_FONTS.iter().find(|f| f.eq_ignore_ascii_case(family)) else {
            return Err(self.fail(CanvasError::UnknownFont(family.to_owned())));
        };
        self.font = Font {
            family: (*known).to_owned(),
            style,
            size,
        };
        Ok(())
    }

    fn string_width(&self, text: &str) -> f64 {
        char_count(text) * self.em() * self.font.size / self.points_per_unit
    }

    fn split_lines(&self, text: &str, width: f64) -> Vec<String> {
        self.wrap(text, width - 2.0 * self.cell_padding)
    }

    fn line_width(&self) -> f64 {
        self.line_width
    }

    fn set_line_width(&mut self, width: f64) {
        self.line_width = width;
    }

    fn fill_color(&self) -> Color {
        self.fill
    }

    fn set_fill_color(&mut self, color: Color) {
        self.fill = color;
    }

    fn page(&self) -> usize {
        self.pages.len()
    }

    fn error(&self) -> Option<CanvasError> {
        self.fault.clone()
    }

    fn write(&mut self, line_height: f64, text: &str, align: Alignment) -> Result<(), CanvasError> {
        match align {
            Alignment::Left => self.flow(line_height, text, true).map(drop),
            Alignment::Center | Alignment::Right => self.write_aligned(line_height, text, align),
        }
    }

    fn write_link(&mut self, line_height: f64, text: &str, href: &str) -> Result<(), CanvasError> {
        for piece in self.flow(line_height, text, true)? {
            if let Some(page) = self.pages.get_mut(piece.page - 1) {
                page.ops.push(DrawOp::Link {
                    x: piece.x,
                    y: piece.y,
                    width: piece.width,
                    height: line_height,
                    href: href.to_owned(),
                });
            }
        }
        Ok(())
    }

    fn write_invisible(&mut self, line_height: f64, text: &str) -> Result<(), CanvasError> {
        self.flow(line_height, text, false).map(drop)
    }

    fn multi_cell(
        &mut self,
        width: f64,
        line_height: f64,
        text: &str,
        align: Alignment,
        fill: bool,
    ) -> Result<(), CanvasError> {
        self.check()?;
        self.ensure_page()?;

        let x = self.x;
        for line in self.split_lines(text, width) {
            self.make_room(line_height)?;
            if fill {
                self.push_op(DrawOp::Rect {
                    x,
                    y: self.y,
                    width,
                    height: line_height,
                    fill: Some(self.fill),
                    stroke: false,
                });
            }
            if !line.is_empty() {
                let line_width = self.string_width(&line);
                let text_x = match align {
                    Alignment::Left => x + self.cell_padding,
                    Alignment::Center => x + (width - line_width) / 2.0,
                    Alignment::Right => x + width - self.cell_padding - line_width,
                };
                let op = self.text_op(text_x, &line, true);
                self.push_op(op);
            }
            self.y += line_height;
        }
        self.x = self.margins.left;
        Ok(())
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> Result<(), CanvasError> {
        self.check()?;
        self.ensure_page()?;
        self.push_op(DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill: None,
            stroke: true,
        });
        Ok(())
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<(), CanvasError> {
        self.check()?;
        self.ensure_page()?;
        self.push_op(DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            width: self.line_width,
        });
        Ok(())
    }

    fn add_page(&mut self) -> Result<(), CanvasError> {
        self.check()?;
        if self.decorating {
            tracing::warn!(
                page = self.page(),
                "Ignoring page break requested while drawing a page decoration"
            );
            return Ok(());
        }

        if !self.pages.is_empty() {
            let saved = self.save_state();
            self.decorate(Decoration::Footer)?;
            self.restore_state(saved);
        }

        let number = self.pages.len() + 1;
        self.pages.push(Page {
            number,
            ops: Vec::new(),
        });
        self.x = self.margins.left;
        self.y = self.margins.top;

        let saved = self.save_state();
        self.decorate(Decoration::Header)?;
        self.restore_state(saved);
        Ok(())
    }

    fn set_page_decorator(&mut self, decorator: Option<Box<dyn PageDecorator>>) {
        self.decorator = decorator;
    }
}

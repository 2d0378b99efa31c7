//! Canvas trait for paginated drawing.
//!
//! The renderer never produces output itself: it drives a [`Canvas`] with
//! text runs, rectangles, lines and page breaks. [`DisplayCanvas`] is the
//! built-in implementation.
//!
//! [`DisplayCanvas`]: crate::DisplayCanvas

use docgen_markup::Alignment;
use serde::Serialize;

use crate::error::CanvasError;

/// A single font style flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StyleFlag {
    Bold,
    Italic,
    Underline,
}

/// Set of active font style flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FontStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl FontStyle {
    /// Plain bold style.
    pub const BOLD: Self = Self {
        bold: true,
        italic: false,
        underline: false,
    };

    #[must_use]
    pub fn contains(self, flag: StyleFlag) -> bool {
        match flag {
            StyleFlag::Bold => self.bold,
            StyleFlag::Italic => self.italic,
            StyleFlag::Underline => self.underline,
        }
    }

    /// Add a flag. Adding a flag that is already set is a no-op.
    pub fn insert(&mut self, flag: StyleFlag) {
        self.set(flag, true);
    }

    /// Remove a flag. Removing an absent flag is a no-op.
    pub fn remove(&mut self, flag: StyleFlag) {
        self.set(flag, false);
    }

    fn set(&mut self, flag: StyleFlag, on: bool) {
        match flag {
            StyleFlag::Bold => self.bold = on,
            StyleFlag::Italic => self.italic = on,
            StyleFlag::Underline => self.underline = on,
        }
    }
}

/// Page margins in page units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Margins {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// An RGB fill colour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Paginated drawing surface.
///
/// Coordinates are in page units with the origin at the top-left corner.
/// Methods that draw return the canvas fault, if any; queries and cursor
/// setters never fail.
pub trait Canvas {
    /// Page width and height.
    fn page_size(&self) -> (f64, f64);

    fn margins(&self) -> Margins;

    /// Set the left margin used when text wraps or breaks a line.
    fn set_left_margin(&mut self, margin: f64);

    fn x(&self) -> f64;

    fn y(&self) -> f64;

    fn set_x(&mut self, x: f64);

    /// Move to line `y`, returning to the left margin.
    fn set_y(&mut self, y: f64);

    fn set_xy(&mut self, x: f64, y: f64) {
        self.set_y(y);
        self.set_x(x);
    }

    fn font_style(&self) -> FontStyle;

    /// Current font size in points.
    fn font_size(&self) -> f64;

    /// Select a font.
    fn set_font(&mut self, family: &str, style: FontStyle, size: f64) -> Result<(), CanvasError>;

    /// Width of `text` in the current font.
    fn string_width(&self, text: &str) -> f64;

    /// Split `text` into the lines a [`Canvas::multi_cell`] of `width`
    /// would draw.
    fn split_lines(&self, text: &str, width: f64) -> Vec<String>;

    fn line_width(&self) -> f64;

    fn set_line_width(&mut self, width: f64);

    fn fill_color(&self) -> Color;

    fn set_fill_color(&mut self, color: Color);

    /// Current page number, 0 before the first page.
    fn page(&self) -> usize;

    /// The sticky fault, if the canvas has failed.
    fn error(&self) -> Option<CanvasError>;

    /// Write flowing text at the cursor, wrapping at the right margin.
    ///
    /// `\n` moves to the next line. Centered and right-aligned text is
    /// placed line by line within the printable width.
    fn write(&mut self, line_height: f64, text: &str, align: Alignment) -> Result<(), CanvasError>;

    /// Write flowing text annotated with a hyperlink.
    fn write_link(&mut self, line_height: f64, text: &str, href: &str) -> Result<(), CanvasError>;

    /// Write text at zero size: it takes up layout space but has no visible
    /// glyphs.
    fn write_invisible(&mut self, line_height: f64, text: &str) -> Result<(), CanvasError>;

    /// Draw wrapped text in a box of `width` at the cursor, optionally
    /// filled. Afterwards the cursor is at the left margin below the box.
    fn multi_cell(
        &mut self,
        width: f64,
        line_height: f64,
        text: &str,
        align: Alignment,
        fill: bool,
    ) -> Result<(), CanvasError>;

    /// Draw a rectangle outline.
    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> Result<(), CanvasError>;

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<(), CanvasError>;

    /// Start a new page, running the page decorator's footer and header.
    fn add_page(&mut self) -> Result<(), CanvasError>;

    /// Install the callbacks that draw page headers and footers.
    fn set_page_decorator(&mut self, decorator: Option<Box<dyn PageDecorator>>);
}

/// Page lifecycle callbacks.
///
/// Invoked synchronously by [`Canvas::add_page`]: the footer of the page
/// being closed first, then the header of the new page. The canvas keeps its
/// font, fill colour and line width unchanged across the calls.
pub trait PageDecorator {
    fn header(&mut self, canvas: &mut dyn Canvas, page: usize) -> Result<(), CanvasError>;

    fn footer(&mut self, canvas: &mut dyn Canvas, page: usize) -> Result<(), CanvasError>;
}

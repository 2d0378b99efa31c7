//! Paginated rendering of docgen markup.
//!
//! [`Renderer`] walks the token stream produced by `docgen-markup` in a
//! single pass and drives a [`Canvas`]: it keeps the margin stack, font
//! style, write mode and table accumulator, and lays tables out with
//! [`solve_column_widths`]. [`Document`] adds the document header and the
//! page header and footer decorations on top.
//!
//! [`DisplayCanvas`] is the built-in canvas. It records every primitive into
//! a [`DisplayList`] that serializes to JSON.
//!
//! # Example
//!
//! ```
//! use docgen_config::RenderConfig;
//! use docgen_render::{DisplayCanvas, Renderer};
//!
//! let config = RenderConfig::default();
//! let mut canvas = DisplayCanvas::new(&config.page);
//! Renderer::new(&mut canvas, &config)
//!     .render(&docgen_markup::tokenize("Hello **world**\n"))
//!     .unwrap();
//! let list = canvas.finish().unwrap();
//! assert_eq!(list.pages.len(), 1);
//! ```

mod canvas;
mod display;
mod document;
mod error;
mod renderer;
mod state;
mod table;

pub use canvas::{Canvas, Color, FontStyle, Margins, PageDecorator, StyleFlag};
pub use display::{DisplayCanvas, DisplayList, DrawOp, KNOWN_FONTS, Page};
pub use document::Document;
pub use error::{CanvasError, RenderError};
pub use renderer::Renderer;
pub use state::{ListStyle, WriteMode};
pub use table::{ColumnStats, solve_column_widths};

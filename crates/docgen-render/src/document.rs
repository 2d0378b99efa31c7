//! Document façade: body plus header and footer decorations.

use docgen_config::RenderConfig;
use docgen_markup::{Alignment, Token, Tokenizer};

use crate::canvas::{Canvas, PageDecorator};
use crate::display::{DisplayCanvas, DisplayList};
use crate::error::{CanvasError, RenderError};
use crate::renderer::Renderer;

const PARAGRAPH_BREAK: &str = "\n\n";

/// A markup document with optional decorations.
///
/// # Example
///
/// ```
/// use docgen_config::RenderConfig;
/// use docgen_render::Document;
///
/// let list = Document::new(RenderConfig::default())
///     .with_page_footer("::page footer::")
///     .render_to_display("# Title\n\nBody text.\n")
///     .unwrap();
/// assert_eq!(list.pages.len(), 1);
/// ```
pub struct Document {
    config: RenderConfig,
    tokenizer: Tokenizer,
    document_header: Option<String>,
    page_header: Option<String>,
    page_footer: Option<String>,
}

impl Document {
    #[must_use]
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            tokenizer: Tokenizer::new(),
            document_header: None,
            page_header: None,
            page_footer: None,
        }
    }

    /// Markup rendered once before the body.
    #[must_use]
    pub fn with_document_header(mut self, markup: impl Into<String>) -> Self {
        self.document_header = Some(markup.into());
        self
    }

    /// Markup rendered at the top of every page after the first.
    #[must_use]
    pub fn with_page_header(mut self, markup: impl Into<String>) -> Self {
        self.page_header = Some(markup.into());
        self
    }

    /// Markup rendered at the bottom of every page.
    #[must_use]
    pub fn with_page_footer(mut self, markup: impl Into<String>) -> Self {
        self.page_footer = Some(markup.into());
        self
    }

    /// Render `markup` onto `canvas`.
    ///
    /// Opens the first page if the canvas has none, then installs the page
    /// decorations so the page header starts from the second page.
    ///
    /// # Errors
    ///
    /// Returns the first canvas fault.
    pub fn render<C: Canvas + ?Sized>(&self, markup: &str, canvas: &mut C) -> Result<(), CanvasError> {
        if canvas.page() == 0 {
            canvas.add_page()?;
        }
        if self.page_header.is_some() || self.page_footer.is_some() {
            canvas.set_page_decorator(Some(Box::new(MarkupDecorator {
                config: self.config.clone(),
                header: self.page_header.as_deref().map(|m| self.tokenizer.tokenize(m)),
                footer: self
                    .page_footer
                    .as_deref()
                    .map(|m| (m.to_owned(), self.tokenizer.tokenize(m))),
            })));
        }

        if let Some(header) = &self.document_header {
            Renderer::new(&mut *canvas, &self.config).render(&self.tokenizer.tokenize(header))?;
            canvas.write(self.config.line_height, PARAGRAPH_BREAK, Alignment::Left)?;
        }

        let tokens = self.tokenizer.tokenize(markup);
        tracing::debug!(tokens = tokens.len(), "Rendering document body");
        Renderer::new(&mut *canvas, &self.config).render(&tokens)
    }

    /// Render onto a fresh [`DisplayCanvas`] and return its display list.
    ///
    /// # Errors
    ///
    /// Returns the first canvas fault.
    pub fn render_to_display(&self, markup: &str) -> Result<DisplayList, RenderError> {
        let mut canvas = DisplayCanvas::new(&self.config.page);
        self.render(markup, &mut canvas)?;
        Ok(canvas.finish()?)
    }

    /// Render and serialize the display list as JSON.
    ///
    /// # Errors
    ///
    /// Returns the first canvas fault or a serialization error.
    pub fn render_to_json(&self, markup: &str) -> Result<String, RenderError> {
        Ok(self.render_to_display(markup)?.to_json()?)
    }
}

/// Page decorator drawing pre-tokenized header and footer markup.
struct MarkupDecorator {
    config: RenderConfig,
    header: Option<Vec<Token>>,
    /// Footer source (for measuring) and tokens.
    footer: Option<(String, Vec<Token>)>,
}

impl PageDecorator for MarkupDecorator {
    fn header(&mut self, canvas: &mut dyn Canvas, _page: usize) -> Result<(), CanvasError> {
        let Some(tokens) = &self.header else {
            return Ok(());
        };
        Renderer::new(&mut *canvas, &self.config).render(tokens)?;
        canvas.write(self.config.line_height, PARAGRAPH_BREAK, Alignment::Left)
    }

    /// Draw the footer at the foot of the page, or right below the content
    /// when the content already reaches past that point.
    fn footer(&mut self, canvas: &mut dyn Canvas, _page: usize) -> Result<(), CanvasError> {
        let Some((markup, tokens)) = &self.footer else {
            return Ok(());
        };
        let line_height = self.config.line_height;
        let (page_width, page_height) = canvas.page_size();
        let margins = canvas.margins();
        let printable = page_width - margins.left - margins.right;
        let footer_lines = (canvas.string_width(markup) / printable).ceil().max(1.0);
        let top = page_height - (margins.bottom + 2.0 * line_height + footer_lines * line_height);

        if canvas.y() <= top {
            canvas.set_y(top);
            canvas.write(line_height, PARAGRAPH_BREAK, Alignment::Left)?;
        }
        Renderer::new(&mut *canvas, &self.config).render(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DrawOp;
    use pretty_assertions::assert_eq;

    fn texts_on(list: &DisplayList, page: usize) -> Vec<(f64, String)> {
        list.pages[page]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { y, text, .. } => Some((*y, text.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_document_header_precedes_body() {
        let list = Document::new(RenderConfig::default())
            .with_document_header("Report")
            .render_to_display("Body\n")
            .unwrap();
        assert_eq!(
            texts_on(&list, 0),
            vec![(10.0, "Report".to_owned()), (30.0, "Body".to_owned())]
        );
    }

    #[test]
    fn test_page_header_skips_first_page() {
        let list = Document::new(RenderConfig::default())
            .with_page_header("Running head")
            .render_to_display("one\n\n\\page\n\ntwo\n")
            .unwrap();
        assert_eq!(list.pages.len(), 2);
        assert_eq!(texts_on(&list, 0), vec![(10.0, "one".to_owned())]);
        assert_eq!(
            texts_on(&list, 1),
            vec![
                (10.0, "Running head".to_owned()),
                (30.0, "two".to_owned())
            ]
        );
    }

    #[test]
    fn test_page_footer_on_every_page() {
        let list = Document::new(RenderConfig::default())
            .with_page_footer("Footer")
            .render_to_display("one\n\n\\page\n\ntwo\n")
            .unwrap();
        // 297 - (10 + 2 * 5 + 5) is where the footer block starts, then a
        // paragraph break.
        for page in 0..2 {
            let texts = texts_on(&list, page);
            assert_eq!(texts.last(), Some(&(282.0, "Footer".to_owned())));
        }
    }

    #[test]
    fn test_render_to_json() {
        let json = Document::new(RenderConfig::default())
            .render_to_json("Hello\n")
            .unwrap();
        assert!(json.contains("Hello"));
    }

    #[test]
    fn test_fault_propagates() {
        let config = RenderConfig {
            font_family: "Wingdings".to_owned(),
            ..RenderConfig::default()
        };
        let err = Document::new(config).render_to_display("text\n").unwrap_err();
        assert!(matches!(
            err,
            RenderError::Canvas(CanvasError::UnknownFont(ref family)) if family == "Wingdings"
        ));
    }
}

//! Token-to-canvas renderer.

use docgen_config::RenderConfig;
use docgen_markup::{Alignment, Block, Custom, Inline, Token};

use crate::canvas::{Canvas, Color, FontStyle, StyleFlag};
use crate::error::CanvasError;
use crate::state::{ListStyle, MarginStack, TableState, WriteMode};

/// Fill colour behind code blocks.
const CODE_FILL: Color = Color::rgb(180, 180, 180);

/// How much narrower than the printable width a code block is drawn.
const CODE_BLOCK_INSET: f64 = 20.0;

const TAB_EXPANSION: &str = "    ";

pub(crate) const EPSILON: f64 = 1e-9;

/// Renders a token stream onto a [`Canvas`] in a single pass.
///
/// The renderer owns all layout state (margins, font style, write mode,
/// the table accumulator) for one render. Every canvas fault aborts the
/// pass and is returned to the caller.
pub struct Renderer<'a, C: Canvas + ?Sized> {
    pub(crate) canvas: &'a mut C,
    pub(crate) config: &'a RenderConfig,
    pub(crate) margins: MarginStack,
    pub(crate) style: FontStyle,
    pub(crate) font_size: f64,
    pub(crate) line_height: f64,
    alignment: Alignment,
    /// Line height in force before the open heading.
    heading_line_height: Option<f64>,
    lists: Vec<ListStyle>,
    modes: Vec<WriteMode>,
    pub(crate) table: TableState,
}

impl<'a, C: Canvas + ?Sized> Renderer<'a, C> {
    /// Create a renderer whose base margin is the canvas' current left margin.
    pub fn new(canvas: &'a mut C, config: &'a RenderConfig) -> Self {
        let margins = MarginStack::new(canvas.margins().left);
        Self {
            canvas,
            config,
            margins,
            style: FontStyle::default(),
            font_size: config.sizes.nominal_font_size,
            line_height: config.line_height,
            alignment: Alignment::Left,
            heading_line_height: None,
            lists: Vec::new(),
            modes: vec![WriteMode::Normal],
            table: TableState::default(),
        }
    }

    /// Render `tokens` at the canvas cursor.
    ///
    /// # Errors
    ///
    /// Returns the first fault reported by the canvas, including one it
    /// already carried before rendering started.
    pub fn render(&mut self, tokens: &[Token]) -> Result<(), CanvasError> {
        if let Some(fault) = self.canvas.error() {
            return Err(fault);
        }
        self.apply_font()?;
        for token in tokens {
            self.process_token(token)?;
        }
        Ok(())
    }

    /// Left margin currently in force.
    pub fn left_margin(&self) -> f64 {
        self.margins.current()
    }

    fn process_token(&mut self, token: &Token) -> Result<(), CanvasError> {
        match token {
            Token::BlockOpen(block) => self.open_block(block),
            Token::BlockClose(block) => self.close_block(block),
            Token::InlineOpen(inline) => self.open_inline(inline),
            Token::InlineClose(inline) => self.close_inline(inline),
            Token::CustomOpen(custom) => self.open_custom(*custom),
            Token::CustomClose(custom) => self.close_custom(*custom),
            Token::Text(text) => {
                let text = self.expand_tabs(text);
                self.route(&text)
            }
            Token::Code(code) => self.route(code),
            Token::InlineHtml(html) => self.route(&strip_tags(html)),
            Token::SoftBreak | Token::HardBreak => self.line_break(),
            Token::CodeBlock(content) | Token::Fence { content, .. } => self.code_block(content),
            Token::HorizontalRule => self.horizontal_rule(),
            Token::HtmlBlock(html) => {
                self.route(&strip_tags(html))?;
                self.canvas.set_x(self.margins.current());
                Ok(())
            }
            Token::PageBreak => self.canvas.add_page(),
            Token::TableSettings(settings) => {
                self.table.set_settings(settings.clone());
                Ok(())
            }
            Token::HideText(content) => self.hide_text(content),
        }
    }

    fn open_block(&mut self, block: &Block) -> Result<(), CanvasError> {
        match block {
            Block::Blockquote => self.indent(self.config.sizes.nominal_indent),
            Block::BulletList(_) | Block::OrderedList(_) => {
                self.lists
                    .push(ListStyle::for_list(block).unwrap_or(ListStyle::Dash));
                self.finish_line()?;
                self.indent(self.config.sizes.nominal_indent)
            }
            Block::ListItem(ordinal) => self.list_item(*ordinal),
            Block::Heading(level) => {
                let size = self.config.sizes.heading_font_size(*level);
                self.heading_line_height = Some(self.line_height);
                self.line_height *= size / self.config.sizes.nominal_font_size;
                self.font_size = size;
                self.apply_font()
            }
            Block::Table => {
                self.table.start();
                Ok(())
            }
            Block::TableRow => {
                self.table.start_row();
                Ok(())
            }
            Block::TableHeadCell => {
                self.table.start_cell(true);
                self.modes.push(WriteMode::TableHeadCell);
                Ok(())
            }
            Block::TableBodyCell => {
                self.table.start_cell(false);
                self.modes.push(WriteMode::TableBodyCell);
                Ok(())
            }
            Block::Paragraph => Ok(()),
        }
    }

    fn close_block(&mut self, block: &Block) -> Result<(), CanvasError> {
        match block {
            Block::Blockquote => self.outdent(),
            Block::BulletList(_) | Block::OrderedList(_) => {
                self.lists.pop();
                self.outdent()
            }
            Block::ListItem(_) => {
                self.finish_line()?;
                self.outdent()
            }
            Block::Heading(_) => {
                self.line_height = self
                    .heading_line_height
                    .take()
                    .unwrap_or(self.config.line_height);
                self.font_size = self.config.sizes.nominal_font_size;
                self.apply_font()?;
                self.write("\n\n")
            }
            Block::Paragraph => {
                self.write("\n\n")?;
                self.canvas.set_x(self.margins.current());
                Ok(())
            }
            Block::Table => self.draw_table(),
            Block::TableRow => Ok(()),
            Block::TableHeadCell | Block::TableBodyCell => {
                self.pop_mode();
                Ok(())
            }
        }
    }

    fn open_inline(&mut self, inline: &Inline) -> Result<(), CanvasError> {
        match inline {
            Inline::Emphasis => self.add_style(StyleFlag::Italic),
            Inline::Strong => self.add_style(StyleFlag::Bold),
            Inline::Strikethrough => {
                self.modes.push(WriteMode::Strikethrough {
                    text: String::new(),
                });
                Ok(())
            }
            Inline::Link(href) => {
                self.modes.push(WriteMode::LinkText {
                    href: href.clone(),
                    text: String::new(),
                });
                Ok(())
            }
        }
    }

    fn close_inline(&mut self, inline: &Inline) -> Result<(), CanvasError> {
        match inline {
            Inline::Emphasis => self.remove_style(StyleFlag::Italic),
            Inline::Strong => self.remove_style(StyleFlag::Bold),
            Inline::Strikethrough | Inline::Link(_) => self.close_capture(),
        }
    }

    fn open_custom(&mut self, custom: Custom) -> Result<(), CanvasError> {
        match custom {
            Custom::Justify(alignment) => self.alignment = alignment,
            Custom::HangingIndent => {
                let margin = self.margins.push_absolute(self.canvas.x());
                self.canvas.set_left_margin(margin);
            }
        }
        Ok(())
    }

    fn close_custom(&mut self, custom: Custom) -> Result<(), CanvasError> {
        match custom {
            Custom::Justify(_) => self.alignment = Alignment::Left,
            Custom::HangingIndent => {
                let margin = self.margins.pop();
                self.canvas.set_left_margin(margin);
            }
        }
        Ok(())
    }

    /// Select the current family, style and size on the canvas.
    pub(crate) fn apply_font(&mut self) -> Result<(), CanvasError> {
        self.canvas
            .set_font(&self.config.font_family, self.style, self.font_size)
    }

    fn add_style(&mut self, flag: StyleFlag) -> Result<(), CanvasError> {
        self.style.insert(flag);
        self.apply_font()
    }

    fn remove_style(&mut self, flag: StyleFlag) -> Result<(), CanvasError> {
        self.style.remove(flag);
        self.apply_font()
    }

    /// Push an indent. Style is flushed first so text already laid out
    /// keeps its font.
    fn indent(&mut self, delta: f64) -> Result<(), CanvasError> {
        self.apply_font()?;
        let margin = self.margins.push_indent(delta);
        self.canvas.set_left_margin(margin);
        if self.canvas.x() < margin {
            self.canvas.set_x(margin);
        }
        Ok(())
    }

    fn outdent(&mut self) -> Result<(), CanvasError> {
        self.apply_font()?;
        let margin = self.margins.pop();
        self.canvas.set_left_margin(margin);
        self.canvas.set_x(margin);
        Ok(())
    }

    fn list_item(&mut self, ordinal: u64) -> Result<(), CanvasError> {
        let style = self.lists.last().copied().unwrap_or(ListStyle::Dash);
        self.canvas.set_x(self.margins.current());
        self.canvas
            .write(self.line_height, &style.marker(ordinal), Alignment::Left)?;
        self.indent(self.config.sizes.bullet_indent)
    }

    /// Break the line if the cursor is past the left margin.
    fn finish_line(&mut self) -> Result<(), CanvasError> {
        if self.canvas.x() > self.margins.current() + EPSILON {
            self.write("\n")?;
        }
        Ok(())
    }

    /// Write directly to the canvas with the current alignment.
    fn write(&mut self, text: &str) -> Result<(), CanvasError> {
        self.canvas.write(self.line_height, text, self.alignment)
    }

    fn mode(&self) -> &WriteMode {
        self.modes.last().unwrap_or(&WriteMode::Normal)
    }

    fn pop_mode(&mut self) -> Option<WriteMode> {
        if self.modes.len() > 1 {
            self.modes.pop()
        } else {
            tracing::warn!("Write mode stack empty, staying in normal mode");
            None
        }
    }

    /// Send text wherever the current write mode routes it.
    fn route(&mut self, text: &str) -> Result<(), CanvasError> {
        match self.modes.last_mut() {
            None | Some(WriteMode::Normal) => {
                self.canvas.write(self.line_height, text, self.alignment)
            }
            Some(WriteMode::TableHeadCell | WriteMode::TableBodyCell) => {
                self.table.push_str(text);
                Ok(())
            }
            Some(WriteMode::LinkText { text: buffer, .. } | WriteMode::Strikethrough { text: buffer }) => {
                buffer.push_str(text);
                Ok(())
            }
        }
    }

    fn line_break(&mut self) -> Result<(), CanvasError> {
        if *self.mode() == WriteMode::Normal {
            self.write("\n")
        } else {
            self.route(" ")
        }
    }

    /// Close a link or strikethrough capture. Captured text is drawn when
    /// the enclosing mode is normal and folded into the enclosing buffer
    /// otherwise.
    fn close_capture(&mut self) -> Result<(), CanvasError> {
        let Some(mode) = self.pop_mode() else {
            return Ok(());
        };
        let outer_normal = *self.mode() == WriteMode::Normal;
        match mode {
            WriteMode::LinkText { href, text } if outer_normal => self.emit_link(&href, &text),
            WriteMode::Strikethrough { text } if outer_normal => self.emit_strikethrough(&text),
            WriteMode::LinkText { text, .. } | WriteMode::Strikethrough { text } => {
                self.route(&text)
            }
            other => {
                tracing::warn!(mode = ?other, "Inline close without a matching capture");
                self.modes.push(other);
                Ok(())
            }
        }
    }

    fn emit_link(&mut self, href: &str, text: &str) -> Result<(), CanvasError> {
        self.add_style(StyleFlag::Underline)?;
        if href.is_empty() {
            self.write(text)?;
        } else {
            self.canvas.write_link(self.line_height, text, href)?;
        }
        self.remove_style(StyleFlag::Underline)
    }

    /// Write text and strike it through at half the line height.
    fn emit_strikethrough(&mut self, text: &str) -> Result<(), CanvasError> {
        let page = self.canvas.page();
        let (start_x, start_y) = (self.canvas.x(), self.canvas.y());
        self.write(text)?;
        if self.canvas.page() != page {
            tracing::debug!("Strikethrough text crossed a page break, not struck");
            return Ok(());
        }

        let (end_x, end_y) = (self.canvas.x(), self.canvas.y());
        let offset = self.line_height / 2.0;
        if (end_y - start_y).abs() < EPSILON {
            let width = self.canvas.string_width(text);
            return self
                .canvas
                .line(end_x - width, start_y + offset, end_x, start_y + offset);
        }

        let (page_width, _) = self.canvas.page_size();
        let margins = self.canvas.margins();
        let right = page_width - margins.right;
        self.canvas
            .line(start_x, start_y + offset, right, start_y + offset)?;
        let mut y = start_y + self.line_height;
        while y < end_y - EPSILON {
            self.canvas.line(margins.left, y + offset, right, y + offset)?;
            y += self.line_height;
        }
        self.canvas
            .line(margins.left, end_y + offset, end_x, end_y + offset)
    }

    fn hide_text(&mut self, content: &str) -> Result<(), CanvasError> {
        if *self.mode() == WriteMode::Normal {
            self.canvas.write_invisible(self.line_height, content)
        } else {
            tracing::debug!("Dropping hidden text outside normal text flow");
            Ok(())
        }
    }

    fn code_block(&mut self, content: &str) -> Result<(), CanvasError> {
        let content = content.strip_suffix('\n').unwrap_or(content);
        let (page_width, _) = self.canvas.page_size();
        let margins = self.canvas.margins();
        let width = page_width - (margins.left + margins.right) - CODE_BLOCK_INSET;

        let fill = self.canvas.fill_color();
        self.canvas.set_fill_color(CODE_FILL);
        self.indent(self.config.sizes.nominal_indent)?;
        self.canvas.set_x(self.margins.current());
        self.canvas
            .multi_cell(width, self.line_height, content, Alignment::Left, true)?;
        self.outdent()?;
        self.canvas.set_fill_color(fill);
        self.write("\n")
    }

    fn horizontal_rule(&mut self) -> Result<(), CanvasError> {
        let (page_width, _) = self.canvas.page_size();
        let left = self.canvas.margins().left;
        let y = self.canvas.y();
        self.canvas.line(left, y, page_width - left, y)?;
        self.write("\n")
    }

    fn expand_tabs(&self, text: &str) -> String {
        let text = text.replace('\t', TAB_EXPANSION);
        if self.config.visual_tab.is_empty() {
            text
        } else {
            text.replace(&self.config.visual_tab, TAB_EXPANSION)
        }
    }
}

/// Drop HTML tags, keeping the text between them.
fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text
}

//! State structs tracked while walking the token stream.

use docgen_markup::{Block, TableHeaderSettings};

/// Stack of left margins.
///
/// Every indenting open pushes the margin in force before it; the matching
/// close pops it back. An empty pop is a nesting defect: it is logged and the
/// margin falls back to the base margin.
#[derive(Debug)]
pub struct MarginStack {
    base: f64,
    current: f64,
    saved: Vec<f64>,
}

impl MarginStack {
    /// Create a stack whose base is `margin`.
    pub fn new(margin: f64) -> Self {
        Self {
            base: margin,
            current: margin,
            saved: Vec::new(),
        }
    }

    /// Margin currently in force.
    pub fn current(&self) -> f64 {
        self.current
    }

    /// Number of unmatched pushes.
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    /// Indent by `delta` and return the new margin.
    pub fn push_indent(&mut self, delta: f64) -> f64 {
        self.push_absolute(self.current + delta)
    }

    /// Move the margin to `margin` and return it.
    pub fn push_absolute(&mut self, margin: f64) -> f64 {
        self.saved.push(self.current);
        self.current = margin;
        self.current
    }

    /// Restore the margin in force before the last push and return it.
    pub fn pop(&mut self) -> f64 {
        self.current = self.saved.pop().unwrap_or_else(|| {
            tracing::warn!(margin = self.base, "Margin stack empty, resetting to base margin");
            self.base
        });
        self.current
    }
}

/// Marker style of a list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListStyle {
    /// `-` and `*` bullets.
    Dash,
    /// `+` bullets.
    Caret,
    /// Ordered list starting at `start`.
    Numbered { start: u64 },
}

impl ListStyle {
    /// Style of a list container; `None` for any other block.
    pub fn for_list(block: &Block) -> Option<Self> {
        match block {
            Block::BulletList('+') => Some(Self::Caret),
            Block::BulletList(_) => Some(Self::Dash),
            Block::OrderedList(start) => Some(Self::Numbered { start: *start }),
            _ => None,
        }
    }

    /// Marker drawn before the item numbered `ordinal`.
    pub fn marker(self, ordinal: u64) -> String {
        match self {
            Self::Dash => "-".to_owned(),
            Self::Caret => ">".to_owned(),
            Self::Numbered { start } => format!("{}.", ordinal.saturating_sub(start) + 1),
        }
    }
}

/// Where text tokens go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteMode {
    /// Written to the canvas at the cursor.
    Normal,
    /// Appended to the current table header cell.
    TableHeadCell,
    /// Appended to the current table body cell.
    TableBodyCell,
    /// Captured until the link closes.
    LinkText { href: String, text: String },
    /// Captured until the strikethrough closes.
    Strikethrough { text: String },
}

/// A table cell accumulated while its row is open.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub head: bool,
}

/// State for accumulating a table until it closes.
#[derive(Default)]
pub struct TableState {
    /// Rows of the open table.
    rows: Vec<Vec<Cell>>,
    /// Settings waiting for the next table close.
    settings: Option<TableHeaderSettings>,
}

impl TableState {
    /// Start a new table, discarding any leftover rows.
    pub fn start(&mut self) {
        self.rows.clear();
    }

    pub fn start_row(&mut self) {
        self.rows.push(Vec::new());
    }

    /// Open a cell in the last row.
    pub fn start_cell(&mut self, head: bool) {
        if self.rows.is_empty() {
            self.rows.push(Vec::new());
        }
        if let Some(row) = self.rows.last_mut() {
            row.push(Cell {
                text: String::new(),
                head,
            });
        }
    }

    /// Append text to the open cell; `\n` escapes become line breaks.
    pub fn push_str(&mut self, text: &str) {
        if let Some(cell) = self.rows.last_mut().and_then(|row| row.last_mut()) {
            cell.text.push_str(&text.replace("\\n", "\n"));
        }
    }

    /// Take the accumulated rows, dropping empty ones.
    pub fn take_rows(&mut self) -> Vec<Vec<Cell>> {
        let mut rows = std::mem::take(&mut self.rows);
        rows.retain(|row| !row.is_empty());
        rows
    }

    /// Keep settings for the next table close.
    pub fn set_settings(&mut self, settings: TableHeaderSettings) {
        self.settings = Some(settings);
    }

    /// Consume pending settings, falling back to the defaults.
    pub fn take_settings(&mut self) -> TableHeaderSettings {
        self.settings.take().unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use docgen_markup::SizeMode;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_margin_stack_balances() {
        let mut margins = MarginStack::new(10.0);
        assert_eq!(margins.push_indent(10.0), 20.0);
        assert_eq!(margins.push_absolute(42.5), 42.5);
        assert_eq!(margins.depth(), 2);
        assert_eq!(margins.pop(), 20.0);
        assert_eq!(margins.pop(), 10.0);
        assert_eq!(margins.depth(), 0);
    }

    #[test]
    fn test_margin_stack_empty_pop_resets() {
        let mut margins = MarginStack::new(10.0);
        assert_eq!(margins.pop(), 10.0);
        assert_eq!(margins.current(), 10.0);
    }

    #[test]
    fn test_list_style_markers() {
        assert_eq!(ListStyle::for_list(&Block::BulletList('-')), Some(ListStyle::Dash));
        assert_eq!(ListStyle::for_list(&Block::BulletList('*')), Some(ListStyle::Dash));
        assert_eq!(ListStyle::for_list(&Block::BulletList('+')), Some(ListStyle::Caret));
        assert_eq!(ListStyle::for_list(&Block::Paragraph), None);

        let numbered = ListStyle::for_list(&Block::OrderedList(3)).unwrap();
        assert_eq!(numbered.marker(3), "1.");
        assert_eq!(numbered.marker(5), "3.");
        assert_eq!(ListStyle::Caret.marker(1), ">");
    }

    #[test]
    fn test_table_state_accumulates_cells() {
        let mut table = TableState::default();
        table.start();
        table.start_row();
        table.start_cell(true);
        table.push_str("a\\nb");
        table.start_cell(true);
        table.push_str("c");
        table.push_str("d");

        assert_eq!(
            table.take_rows(),
            vec![vec![
                Cell {
                    text: "a\nb".to_owned(),
                    head: true
                },
                Cell {
                    text: "cd".to_owned(),
                    head: true
                },
            ]]
        );
        assert!(table.take_rows().is_empty());
    }

    #[test]
    fn test_table_settings_consumed_once() {
        let mut table = TableState::default();
        let settings = TableHeaderSettings {
            size_mode: SizeMode::Full,
            ..TableHeaderSettings::default()
        };
        table.set_settings(settings.clone());
        assert_eq!(table.take_settings(), settings);
        assert_eq!(table.take_settings(), TableHeaderSettings::default());
    }
}

//! Table layout: column sizing and row drawing.

use docgen_markup::{Alignment, SizeMode, TableHeaderSettings};

use crate::canvas::{Canvas, StyleFlag};
use crate::error::CanvasError;
use crate::renderer::{EPSILON, Renderer};
use crate::state::Cell;

/// Extra spaces of padding added to every measured cell line.
const CELL_PADDING_SPACES: usize = 5;

/// Measured widths of one column.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ColumnStats {
    /// Widest cell in the column.
    pub max: f64,
    /// Mean cell width in the column.
    pub average: f64,
}

/// Choose column widths for a table.
///
/// Explicit column weights win when there is one for every column. Otherwise
/// `Wrap` keeps natural (max) widths when they fit in `available` and shares
/// `available` by average width when they don't; `Full` and `Half` always
/// share the full or half width by average width.
#[must_use]
pub fn solve_column_widths(
    stats: &[ColumnStats],
    available: f64,
    settings: &TableHeaderSettings,
) -> Vec<f64> {
    if stats.is_empty() {
        return Vec::new();
    }
    let target = match settings.size_mode {
        SizeMode::Half => available / 2.0,
        SizeMode::Wrap | SizeMode::Full => available,
    };

    if !settings.column_weights.is_empty() {
        if let Some(weights) = settings.column_weights.get(..stats.len()) {
            let sum: f64 = weights.iter().sum();
            if sum > 0.0 {
                return weights.iter().map(|w| w / sum * target).collect();
            }
            tracing::warn!("Column weights sum to zero, ignoring them");
        } else {
            tracing::warn!(
                columns = stats.len(),
                weights = settings.column_weights.len(),
                "Fewer column weights than columns, ignoring them"
            );
        }
    }

    if settings.size_mode == SizeMode::Wrap {
        let natural: f64 = stats.iter().map(|s| s.max).sum();
        if natural <= available + EPSILON {
            return stats.iter().map(|s| s.max).collect();
        }
    }
    share_by_average(stats, target)
}

#[allow(clippy::cast_precision_loss)]
fn share_by_average(stats: &[ColumnStats], target: f64) -> Vec<f64> {
    let total: f64 = stats.iter().map(|s| s.average).sum();
    if total <= 0.0 {
        return vec![target / stats.len() as f64; stats.len()];
    }
    stats.iter().map(|s| s.average / total * target).collect()
}

impl<C: Canvas + ?Sized> Renderer<'_, C> {
    /// Lay out and draw the accumulated table, then resume normal flow.
    pub(crate) fn draw_table(&mut self) -> Result<(), CanvasError> {
        let rows = self.table.take_rows();
        let settings = self.table.take_settings();
        if rows.is_empty() {
            return Ok(());
        }

        let stats = self.column_stats(&rows)?;
        let (page_width, _) = self.canvas.page_size();
        let margins = self.canvas.margins();
        let available = page_width - margins.left - margins.right;
        let widths = solve_column_widths(&stats, available, &settings);
        tracing::debug!(
            columns = widths.len(),
            size_mode = ?settings.size_mode,
            available,
            "Laid out table columns"
        );

        let line_width = self.canvas.line_width();
        self.canvas.set_line_width(line_width / 4.0);
        let drawn = self.draw_rows(&rows, &widths, &settings);
        self.canvas.set_line_width(line_width);
        drawn?;

        self.apply_font()?;
        let margin = self.margins.current();
        self.canvas.set_left_margin(margin);
        self.canvas.set_x(margin);
        self.canvas.write(self.line_height, "\n", Alignment::Left)
    }

    /// Measure every column without bold so header cells don't widen it.
    #[allow(clippy::cast_precision_loss)]
    fn column_stats(&mut self, rows: &[Vec<Cell>]) -> Result<Vec<ColumnStats>, CanvasError> {
        let mut style = self.style;
        style.remove(StyleFlag::Bold);
        self.canvas
            .set_font(&self.config.font_family, style, self.font_size)?;

        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut stats = vec![ColumnStats::default(); columns];
        for (index, column) in stats.iter_mut().enumerate() {
            let widths: Vec<f64> = rows
                .iter()
                .filter_map(|row| row.get(index))
                .map(|cell| self.cell_width(&cell.text))
                .collect();
            column.max = widths.iter().copied().fold(0.0, f64::max);
            if !widths.is_empty() {
                column.average = widths.iter().sum::<f64>() / widths.len() as f64;
            }
        }
        Ok(stats)
    }

    /// Widest line of a cell plus room for the gaps between its words.
    #[allow(clippy::cast_precision_loss)]
    fn cell_width(&self, text: &str) -> f64 {
        let space = self.canvas.string_width(" ").ceil();
        text.split('\n')
            .map(|line| {
                let spaces = line.matches(' ').count() + CELL_PADDING_SPACES;
                self.canvas.string_width(line) + space * spaces as f64
            })
            .fold(0.0, f64::max)
    }

    fn cell_font(&mut self, head: bool) -> Result<(), CanvasError> {
        let mut style = self.style;
        if head {
            style.insert(StyleFlag::Bold);
        }
        self.canvas
            .set_font(&self.config.font_family, style, self.font_size)
    }

    /// Height of a row: its tallest cell in wrapped lines.
    #[allow(clippy::cast_precision_loss)]
    fn row_height(&mut self, row: &[Cell], widths: &[f64]) -> Result<f64, CanvasError> {
        let cell_line_height = self.line_height + self.config.sizes.cell_margin;
        let mut height: f64 = 0.0;
        for (cell, width) in row.iter().zip(widths) {
            self.cell_font(cell.head)?;
            let lines = self.canvas.split_lines(&cell.text, *width).len();
            height = height.max(lines as f64 * cell_line_height);
        }
        Ok(height)
    }

    /// Draw rows top to bottom. A row that doesn't fit above the bottom
    /// margin moves whole to the next page.
    fn draw_rows(
        &mut self,
        rows: &[Vec<Cell>],
        widths: &[f64],
        settings: &TableHeaderSettings,
    ) -> Result<(), CanvasError> {
        let cell_line_height = self.line_height + self.config.sizes.cell_margin;
        for row in rows {
            let height = self.row_height(row, widths)?;
            let (_, page_height) = self.canvas.page_size();
            let bottom = page_height - self.canvas.margins().bottom;
            if self.canvas.y() + height > bottom + EPSILON {
                self.canvas.add_page()?;
            }

            let left = self.margins.current();
            let y = self.canvas.y();
            let mut x = left;
            for (cell, width) in row.iter().zip(widths) {
                self.cell_font(cell.head)?;
                if settings.lines {
                    self.canvas.rect(x, y, *width, height)?;
                }
                self.canvas.set_xy(x, y);
                self.canvas.multi_cell(
                    *width,
                    cell_line_height,
                    &cell.text,
                    settings.alignment,
                    false,
                )?;
                x += width;
            }
            self.canvas.set_xy(left, y + height);
        }
        Ok(())
    }
}

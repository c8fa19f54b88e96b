//! Table rendering
//!
//! Two interchangeable renderers sit behind [`TableRenderer`]:
//!
//! - [`AutoTable`] measures content to size columns, wraps cells and repeats
//!   the header on every page a table spans (`autotable` feature).
//! - [`GridTable`] is the manual fallback: equal columns, truncated cells,
//!   a single header band.
//!
//! [`TablePipeline`] picks the renderer once from [`BackendCapabilities`]
//! and falls back to the grid when the auto layout cannot place a table.

use super::layout::{
    CONTENT_TOP, CONTENT_WIDTH, DrawOp, MARGIN, PRIMARY, PRINTABLE_BOTTOM, PageBuilder, SECONDARY,
};
use super::metrics::{self, Font};
use super::ReportError;
use crate::score::{Rgb, classify_cell};
use crate::url_utils::truncate_chars;
use thiserror::Error;

pub const ALTERNATE_ROW: Rgb = Rgb(248, 249, 250);
pub const BORDER: Rgb = Rgb(221, 226, 230);
/// Characters a grid cell shows before it is cut with `...`
pub const GRID_CELL_CHARS: usize = 25;

const HEADER_SIZE: f32 = 11.0;
const BODY_SIZE: f32 = 10.0;
const CELL_PAD_X: f32 = 2.0;
const CELL_PAD_Y: f32 = 1.6;
const BODY_LINE_HEIGHT: f32 = 4.4;
const GRID_ROW_HEIGHT: f32 = 8.0;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
        self
    }
}

/// What a renderer placed, comparable across renderers
#[derive(Debug, Clone, PartialEq)]
pub struct TableOutcome {
    pub renderer: &'static str,
    pub rows_drawn: usize,
    /// Band color of every body cell holding an `x/10` score
    pub cell_colors: Vec<Vec<Option<Rgb>>>,
    /// Cursor just below the last row
    pub end_y: f32,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    #[error("table has no columns")]
    NoColumns,
    #[error("row {row} has {found} cells but the table has {expected} columns")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("columns need {required:.1}mm but only {available:.1}mm is available")]
    DoesNotFit { required: f32, available: f32 },
    #[error("row {row} is {height:.1}mm tall but a page holds {available:.1}mm below the header")]
    RowTooTall {
        row: usize,
        height: f32,
        available: f32,
    },
}

/// Places a table at the cursor and advances past it.
///
/// Implementations must validate before drawing: an `Err` leaves the
/// page untouched so another renderer can take over.
pub trait TableRenderer {
    fn name(&self) -> &'static str;

    fn render(&self, page: &mut PageBuilder, table: &Table) -> Result<TableOutcome, TableError>;
}

/// Band colors for every body cell
fn cell_colors(table: &Table) -> Vec<Vec<Option<Rgb>>> {
    table
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| classify_cell(cell).and_then(|c| c.color))
                .collect()
        })
        .collect()
}

fn cell_text_color(cell: &str) -> Rgb {
    classify_cell(cell)
        .and_then(|c| c.color)
        .unwrap_or(SECONDARY)
}

/// Manual grid: equal column widths and single-line cells
#[derive(Debug, Clone, Copy, Default)]
pub struct GridTable;

impl TableRenderer for GridTable {
    fn name(&self) -> &'static str {
        "grid"
    }

    fn render(&self, page: &mut PageBuilder, table: &Table) -> Result<TableOutcome, TableError> {
        let columns = table.headers.len();
        if columns == 0 {
            return Err(TableError::NoColumns);
        }
        let column_width = CONTENT_WIDTH / columns as f32;
        let text_offset = GRID_ROW_HEIGHT / 2.0 + 1.5;

        page.ensure_space(GRID_ROW_HEIGHT * 2.0);
        let top = page.cursor();
        page.fill_rect(MARGIN, top, CONTENT_WIDTH, GRID_ROW_HEIGHT, PRIMARY);
        for (index, header) in table.headers.iter().enumerate() {
            let x = MARGIN + index as f32 * column_width + CELL_PAD_X;
            let label = truncate_chars(header, GRID_CELL_CHARS);
            page.text(x, top + text_offset, label, Font::Bold, BODY_SIZE, Rgb::WHITE);
        }
        page.advance(GRID_ROW_HEIGHT);

        for (row_index, row) in table.rows.iter().enumerate() {
            page.ensure_space(GRID_ROW_HEIGHT);
            let y = page.cursor();
            if row_index % 2 == 1 {
                page.fill_rect(MARGIN, y, CONTENT_WIDTH, GRID_ROW_HEIGHT, ALTERNATE_ROW);
            }
            page.push(DrawOp::StrokeRect {
                x: MARGIN,
                y,
                width: CONTENT_WIDTH,
                height: GRID_ROW_HEIGHT,
                color: BORDER,
                line_width: 0.1,
            });
            for column in 0..columns {
                let cell = row.get(column).map(String::as_str).unwrap_or_default();
                if cell.is_empty() {
                    continue;
                }
                let x = MARGIN + column as f32 * column_width + CELL_PAD_X;
                let color = cell_text_color(cell);
                let shown = truncate_chars(cell, GRID_CELL_CHARS);
                page.text(x, y + text_offset, shown, Font::Regular, BODY_SIZE, color);
            }
            page.advance(GRID_ROW_HEIGHT);
        }

        Ok(TableOutcome {
            renderer: self.name(),
            rows_drawn: table.rows.len(),
            cell_colors: cell_colors(table),
            end_y: page.cursor(),
        })
    }
}

/// Auto-layout tables: measured columns, wrapped cells, repeated headers
#[cfg(feature = "autotable")]
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoTable;

#[cfg(feature = "autotable")]
struct Plan {
    widths: Vec<f32>,
    header_lines: Vec<Vec<String>>,
    header_height: f32,
    rows: Vec<(Vec<Vec<String>>, f32)>,
}

#[cfg(feature = "autotable")]
impl AutoTable {
    fn plan(&self, table: &Table) -> Result<Plan, TableError> {
        let columns = table.headers.len();
        if columns == 0 {
            return Err(TableError::NoColumns);
        }
        if let Some((row, cells)) = table
            .rows
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != columns)
        {
            return Err(TableError::RaggedRow {
                row,
                found: cells.len(),
                expected: columns,
            });
        }

        let mut natural = vec![0.0f32; columns];
        let mut minimum = vec![0.0f32; columns];
        let mut measure = |column: usize, text: &str, font: Font, size: f32| {
            let full = metrics::text_width(text, font, size) + 2.0 * CELL_PAD_X;
            let longest_word = text
                .split_whitespace()
                .map(|w| metrics::text_width(w, font, size))
                .fold(0.0f32, f32::max)
                + 2.0 * CELL_PAD_X;
            natural[column] = natural[column].max(full);
            minimum[column] = minimum[column].max(longest_word);
        };
        for (column, header) in table.headers.iter().enumerate() {
            measure(column, header, Font::Bold, HEADER_SIZE);
        }
        for row in &table.rows {
            for (column, cell) in row.iter().enumerate() {
                measure(column, cell, Font::Regular, BODY_SIZE);
            }
        }

        let required: f32 = minimum.iter().sum();
        if required > CONTENT_WIDTH {
            return Err(TableError::DoesNotFit {
                required,
                available: CONTENT_WIDTH,
            });
        }

        let natural_total: f32 = natural.iter().sum();
        let widths: Vec<f32> = if natural_total <= CONTENT_WIDTH {
            natural
                .iter()
                .map(|w| w * CONTENT_WIDTH / natural_total)
                .collect()
        } else {
            let spare = CONTENT_WIDTH - required;
            let wants: Vec<f32> = natural.iter().zip(&minimum).map(|(n, m)| n - m).collect();
            let want_total: f32 = wants.iter().sum();
            minimum
                .iter()
                .zip(&wants)
                .map(|(m, want)| {
                    if want_total > 0.0 {
                        m + spare * want / want_total
                    } else {
                        m + spare / columns as f32
                    }
                })
                .collect()
        };

        let wrap = |text: &str, width: f32, font: Font, size: f32| {
            let lines = metrics::wrap_text(text, font, size, width - 2.0 * CELL_PAD_X);
            if lines.is_empty() { vec![String::new()] } else { lines }
        };

        let header_lines: Vec<Vec<String>> = table
            .headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| wrap(h, *w, Font::Bold, HEADER_SIZE))
            .collect();
        let header_height = block_height(&header_lines);

        let rows: Vec<(Vec<Vec<String>>, f32)> = table
            .rows
            .iter()
            .map(|row| {
                let lines: Vec<Vec<String>> = row
                    .iter()
                    .zip(&widths)
                    .map(|(cell, w)| wrap(cell, *w, Font::Regular, BODY_SIZE))
                    .collect();
                let height = block_height(&lines);
                (lines, height)
            })
            .collect();

        // A row is never split, so it has to fit on a fresh page under the header.
        let available = PRINTABLE_BOTTOM - CONTENT_TOP - header_height;
        if let Some((row, (_, height))) = rows
            .iter()
            .enumerate()
            .find(|(_, (_, height))| *height > available)
        {
            return Err(TableError::RowTooTall {
                row,
                height: *height,
                available,
            });
        }

        Ok(Plan {
            widths,
            header_lines,
            header_height,
            rows,
        })
    }

    fn draw_header(&self, page: &mut PageBuilder, plan: &Plan) {
        let top = page.cursor();
        page.fill_rect(MARGIN, top, CONTENT_WIDTH, plan.header_height, PRIMARY);
        let mut x = MARGIN;
        for (lines, width) in plan.header_lines.iter().zip(&plan.widths) {
            draw_cell_lines(page, x, top, lines, Font::Bold, HEADER_SIZE, Rgb::WHITE);
            x += width;
        }
        page.advance(plan.header_height);
    }
}

#[cfg(feature = "autotable")]
fn block_height(cells: &[Vec<String>]) -> f32 {
    let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
    lines as f32 * BODY_LINE_HEIGHT + 2.0 * CELL_PAD_Y
}

#[cfg(feature = "autotable")]
fn draw_cell_lines(
    page: &mut PageBuilder,
    x: f32,
    top: f32,
    lines: &[String],
    font: Font,
    size: f32,
    color: Rgb,
) {
    for (index, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let baseline = top + CELL_PAD_Y + (index + 1) as f32 * BODY_LINE_HEIGHT - 1.0;
        page.text(x + CELL_PAD_X, baseline, line.clone(), font, size, color);
    }
}

#[cfg(feature = "autotable")]
impl TableRenderer for AutoTable {
    fn name(&self) -> &'static str {
        "autotable"
    }

    fn render(&self, page: &mut PageBuilder, table: &Table) -> Result<TableOutcome, TableError> {
        let plan = self.plan(table)?;

        let first_row = plan.rows.first().map_or(0.0, |(_, h)| *h);
        page.ensure_space(plan.header_height + first_row);
        self.draw_header(page, &plan);

        for (row_index, ((lines, height), cells)) in plan.rows.iter().zip(&table.rows).enumerate() {
            if page.cursor() + height > PRINTABLE_BOTTOM {
                page.add_page();
                self.draw_header(page, &plan);
            }
            let top = page.cursor();
            if row_index % 2 == 1 {
                page.fill_rect(MARGIN, top, CONTENT_WIDTH, *height, ALTERNATE_ROW);
            }
            page.push(DrawOp::StrokeRect {
                x: MARGIN,
                y: top,
                width: CONTENT_WIDTH,
                height: *height,
                color: BORDER,
                line_width: 0.1,
            });
            let mut x = MARGIN;
            for ((cell_lines, width), cell) in lines.iter().zip(&plan.widths).zip(cells) {
                let color = cell_text_color(cell);
                draw_cell_lines(page, x, top, cell_lines, Font::Regular, BODY_SIZE, color);
                x += width;
            }
            page.advance(*height);
        }

        Ok(TableOutcome {
            renderer: self.name(),
            rows_drawn: plan.rows.len(),
            cell_colors: cell_colors(table),
            end_y: page.cursor(),
        })
    }
}

/// Which optional drawing capabilities this build provides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendCapabilities {
    pub auto_table: bool,
}

impl BackendCapabilities {
    pub fn detect() -> Self {
        Self {
            auto_table: cfg!(feature = "autotable"),
        }
    }

    pub fn none() -> Self {
        Self { auto_table: false }
    }
}

impl Default for BackendCapabilities {
    fn default() -> Self {
        Self::detect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableStrategy {
    /// Auto layout when available, grid otherwise
    #[default]
    Auto,
    /// Always use the manual grid
    Grid,
}

/// Primary renderer chosen at construction plus the grid fallback
pub struct TablePipeline {
    primary: Option<Box<dyn TableRenderer>>,
    fallback: GridTable,
}

impl TablePipeline {
    pub fn new(capabilities: BackendCapabilities, strategy: TableStrategy) -> Self {
        let primary = match strategy {
            TableStrategy::Auto if capabilities.auto_table => auto_renderer(),
            _ => None,
        };
        if primary.is_none() {
            tracing::debug!(?strategy, "auto table layout unavailable, using grid tables");
        }
        Self {
            primary,
            fallback: GridTable,
        }
    }

    pub fn primary_name(&self) -> &'static str {
        self.primary
            .as_ref()
            .map_or(self.fallback.name(), |renderer| renderer.name())
    }

    /// Render with the primary renderer, falling back to the grid once
    pub fn render(
        &self,
        page: &mut PageBuilder,
        table: &Table,
        section: &str,
    ) -> Result<TableOutcome, ReportError> {
        let primary_error = match &self.primary {
            Some(renderer) => match renderer.render(page, table) {
                Ok(outcome) => return Ok(outcome),
                Err(err) => {
                    tracing::warn!(
                        section,
                        renderer = renderer.name(),
                        error = %err,
                        "table layout failed, falling back to grid"
                    );
                    Some(err)
                }
            },
            None => None,
        };

        self.fallback
            .render(page, table)
            .map_err(|fallback| ReportError::TableRendering {
                section: section.to_string(),
                primary: primary_error,
                fallback,
            })
    }
}

#[cfg(feature = "autotable")]
fn auto_renderer() -> Option<Box<dyn TableRenderer>> {
    Some(Box::new(AutoTable))
}

#[cfg(not(feature = "autotable"))]
fn auto_renderer() -> Option<Box<dyn TableRenderer>> {
    None
}

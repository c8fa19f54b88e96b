//! Paginated PDF report generation
//!
//! [`generate_report`] lays an [`AnalysisResult`] out into a
//! [`ReportDocument`] of draw operations; [`PdfBackend`] turns that into
//! PDF bytes. Missing analysis data never fails a report; only an
//! unusable document backend or table engine does.

mod assembler;
pub mod layout;
pub mod metrics;
mod pdf;
pub mod table;

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::types::AnalysisResult;

pub use assembler::generate_report;
pub use layout::{DrawOp, Page, PageBuilder, ReportDocument, TextStyle};
pub use pdf::PdfBackend;
pub use table::{BackendCapabilities, Table, TableError, TableOutcome, TableStrategy};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("document backend unavailable: {0}")]
    Backend(String),
    #[error("table layout engine not loaded for '{section}' and the grid fallback failed: {fallback}")]
    TableRendering {
        section: String,
        primary: Option<TableError>,
        fallback: TableError,
    },
}

/// Knobs for one export
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Timestamp printed in the title block and footers
    pub generated_at: DateTime<Local>,
    /// Draw a drop shadow under the overall score badge
    pub badge_shadow: bool,
    pub table_strategy: TableStrategy,
    pub capabilities: BackendCapabilities,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            generated_at: Local::now(),
            badge_shadow: true,
            table_strategy: TableStrategy::Auto,
            capabilities: BackendCapabilities::detect(),
        }
    }
}

/// Lay out and serialize the report in one step
pub fn render_pdf(
    analysis: &AnalysisResult,
    url: &str,
    options: &ReportOptions,
) -> Result<Vec<u8>, ReportError> {
    let backend = PdfBackend::new(layout::PAGE_WIDTH, layout::PAGE_HEIGHT)?;
    let document = generate_report(analysis, url, options)?;
    backend.render(&document)
}

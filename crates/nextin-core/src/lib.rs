//! # nextin-core
//!
//! Core library for Nextin Vision website analysis reports.
//!
//! This library provides:
//! - The analysis payload model, tolerant of missing and malformed fields
//! - Score classification into bands, colors and priorities
//! - A paginated PDF report generator with table fallback
//! - JSON export of finished analyses
//!
//! ## Features
//!
//! - `default`: enables `autotable`
//! - `autotable`: measured auto-layout tables; without it every table uses the fixed grid
//! - `client`: async HTTP client for the remote analysis service
//!
//! ## Example
//!
//! ```no_run
//! use nextin_core::{AnalysisResult, ReportOptions, render_pdf};
//!
//! # fn example() -> anyhow::Result<()> {
//! let analysis: AnalysisResult = serde_json::from_str(r#"{"overall_score": 7.5}"#)?;
//! let pdf = render_pdf(&analysis, "https://example.com", &ReportOptions::default())?;
//! std::fs::write("report.pdf", pdf)?;
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod report;
pub mod score;
pub mod types;
pub mod url_utils;

#[cfg(feature = "client")]
pub mod client;

// Re-export commonly used types
pub use types::{AnalysisResult, Category, CategoryDetail, ListSection, Loose, TechnicalMetrics};

pub use score::{Classification, Rgb, ScoreBand, classify};

pub use report::{ReportDocument, ReportError, ReportOptions, generate_report, render_pdf};

pub use export::{ExportEnvelope, SavedAnalysis};

pub use url_utils::{InputError, validate_target_url};

#[cfg(feature = "client")]
pub use client::{AnalyzerClient, ApiError, ClientConfig};

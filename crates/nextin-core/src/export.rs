//! JSON export and file naming for finished analyses

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::types::AnalysisResult;

pub const EXPORT_VERSION: &str = "1.0";
const EXPORT_TYPE: &str = "complete";

/// File written by the JSON export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportEnvelope {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub analysis: AnalysisResult,
    pub metadata: ExportMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub version: String,
    #[serde(rename = "exportType")]
    pub export_type: String,
    pub parameters_analyzed: u64,
}

impl ExportEnvelope {
    pub fn new(url: impl Into<String>, analysis: AnalysisResult, timestamp: DateTime<Utc>) -> Self {
        let parameters_analyzed = analysis.parameters_analyzed();
        Self {
            url: url.into(),
            timestamp,
            analysis,
            metadata: ExportMetadata {
                version: EXPORT_VERSION.to_string(),
                export_type: EXPORT_TYPE.to_string(),
                parameters_analyzed,
            },
        }
    }

    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize analysis export")
    }
}

/// A saved analysis, either a full export or the bare service payload
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SavedAnalysis {
    Envelope(Box<ExportEnvelope>),
    Bare(Box<AnalysisResult>),
}

impl SavedAnalysis {
    /// URL recorded in the export, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            SavedAnalysis::Envelope(envelope) => Some(&envelope.url),
            SavedAnalysis::Bare(_) => None,
        }
    }

    pub fn into_analysis(self) -> AnalysisResult {
        match self {
            SavedAnalysis::Envelope(envelope) => envelope.analysis,
            SavedAnalysis::Bare(analysis) => *analysis,
        }
    }
}

pub fn parse_saved(json: &str) -> Result<SavedAnalysis> {
    let value: serde_json::Value =
        serde_json::from_str(json).context("saved analysis is not valid JSON")?;
    if !value.is_object() {
        anyhow::bail!("saved analysis must be a JSON object");
    }
    serde_json::from_value(value).context("saved analysis has an unrecognized shape")
}

pub fn read_saved(path: &Path) -> Result<SavedAnalysis> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_saved(&json).with_context(|| format!("failed to load {}", path.display()))
}

pub fn json_filename(date: NaiveDate) -> String {
    format!("website-analysis-complete-{}.json", date.format("%Y-%m-%d"))
}

pub fn pdf_filename(date: NaiveDate) -> String {
    format!("nextin-vision-complete-analysis-{}.pdf", date.format("%Y-%m-%d"))
}

pub fn write_json(path: &Path, envelope: &ExportEnvelope) -> Result<()> {
    let json = envelope.to_pretty_json()?;
    write_file(path, json.as_bytes())
}

pub fn write_pdf(path: &Path, bytes: &[u8]) -> Result<()> {
    write_file(path, bytes)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| {
            format!("failed to create output directory {}", parent.display())
        })?;
    }
    fs::write(path, bytes).with_context(|| format!("failed to write output file {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "export written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, ListSection};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> AnalysisResult {
        serde_json::from_value(json!({
            "overall_score": 7.2,
            "category_scores": {"seo": 9, "mobile_optimization": "4"},
            "priority_actions": ["Compress images", "Add meta descriptions"],
            "analysis_metadata": {"total_parameters_analyzed": 40},
            "screenshot": "https://cdn.example/shot.png"
        }))
        .unwrap()
    }

    #[test]
    fn filenames_carry_the_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(json_filename(date), "website-analysis-complete-2024-03-07.json");
        assert_eq!(pdf_filename(date), "nextin-vision-complete-analysis-2024-03-07.pdf");
    }

    #[test]
    fn envelope_records_export_metadata() {
        let envelope = ExportEnvelope::new("https://example.com", sample(), Utc::now());
        let value: serde_json::Value =
            serde_json::from_str(&envelope.to_pretty_json().unwrap()).unwrap();
        assert_eq!(value["url"], "https://example.com");
        assert_eq!(value["metadata"]["exportType"], "complete");
        assert_eq!(value["metadata"]["parameters_analyzed"], 40);
        assert_eq!(value["analysis"]["screenshot"], "https://cdn.example/shot.png");
    }

    #[test]
    fn written_export_reads_back_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("export.json");
        let envelope = ExportEnvelope::new("https://example.com", sample(), Utc::now());

        write_json(&path, &envelope).unwrap();
        let saved = read_saved(&path).unwrap();

        assert_eq!(saved.url(), Some("https://example.com"));
        let analysis = saved.into_analysis();
        assert_eq!(analysis, sample());
        assert_eq!(
            analysis.category_score(Category::MobileOptimization).and_then(|s| s.as_f64()),
            Some(4.0)
        );
    }

    #[test]
    fn bare_payloads_are_accepted() {
        let saved = parse_saved(r#"{"overall_score": 5, "key_insights": ["Slow"]}"#).unwrap();
        assert!(saved.url().is_none());
        assert_eq!(saved.into_analysis().list(ListSection::KeyInsights), vec!["Slow"]);
    }

    #[test]
    fn non_objects_are_rejected() {
        assert!(parse_saved("[1, 2]").is_err());
        assert!(parse_saved("not json").is_err());
    }
}

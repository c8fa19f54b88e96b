//! Analysis payload returned by the remote analysis service
//!
//! The service only loosely guarantees its output shape, so every field
//! besides `overall_score` is optional and anything of the wrong JSON
//! type is kept as [`Field::Malformed`]. Malformed values survive a JSON
//! round trip but read as absent everywhere else.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::fmt;

/// Parameter count quoted in the report when the payload does not say.
pub const DEFAULT_PARAMETERS_ANALYZED: u64 = 32;

/// A field that is either well-formed or kept verbatim for round-tripping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field<T> {
    Present(T),
    Malformed(JsonValue),
}

impl<T> Field<T> {
    /// The value when it has the expected shape
    pub fn present(&self) -> Option<&T> {
        match self {
            Field::Present(value) => Some(value),
            Field::Malformed(raw) => {
                tracing::debug!(?raw, "ignoring malformed analysis field");
                None
            }
        }
    }
}

/// Read an optional, possibly malformed field
pub fn read<T>(field: &Option<Field<T>>) -> Option<&T> {
    field.as_ref().and_then(Field::present)
}

/// A raw JSON scalar read leniently as a number, flag or label.
///
/// Scores arrive as `8`, `8.5`, `"8"` or `"8/10"` depending on the
/// service version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Loose(pub JsonValue);

impl Loose {
    pub fn as_f64(&self) -> Option<f64> {
        let value = match &self.0 {
            JsonValue::Number(n) => n.as_f64()?,
            JsonValue::String(s) => parse_numeric(s)?,
            _ => return None,
        };
        value.is_finite().then_some(value)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match &self.0 {
            JsonValue::Bool(b) => Some(*b),
            JsonValue::Number(n) => n.as_f64().map(|v| v != 0.0),
            JsonValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Text form for display; `None` for null, arrays and objects
    pub fn as_text(&self) -> Option<String> {
        match &self.0 {
            JsonValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            JsonValue::Number(n) => Some(n.to_string()),
            JsonValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl From<f64> for Loose {
    fn from(value: f64) -> Self {
        Loose(serde_json::json!(value))
    }
}

impl From<&str> for Loose {
    fn from(value: &str) -> Self {
        Loose(JsonValue::String(value.to_string()))
    }
}

/// Parse `"7"`, `" 7.5 "` or `"7/10"` into a number.
///
/// Fractions over anything but 10 are not on the scale and read as `None`.
fn parse_numeric(raw: &str) -> Option<f64> {
    match raw.trim().split_once('/') {
        Some((numerator, denominator)) if denominator.trim() == "10" => {
            numerator.trim().parse::<f64>().ok()
        }
        Some(_) => None,
        None => raw.trim().parse::<f64>().ok(),
    }
}

/// Readable entries of a string list; other entries are dropped with a warning
fn text_items(field: &Option<Field<Vec<Loose>>>, list: &str) -> Vec<String> {
    let Some(items) = read(field) else {
        return Vec::new();
    };
    let texts: Vec<String> = items.iter().filter_map(Loose::as_text).collect();
    let dropped = items
        .iter()
        .filter(|item| item.as_text().is_none())
        .filter(|item| !matches!(&item.0, JsonValue::String(_)))
        .count();
    if dropped > 0 {
        tracing::warn!(list, dropped, kept = texts.len(), "skipping unreadable list entries");
    }
    texts
}

/// The eight fixed analysis dimensions, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Seo,
    UserExperience,
    ContentQuality,
    ConversionOptimization,
    TechnicalPerformance,
    SecurityAccessibility,
    MobileOptimization,
    SocialIntegration,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Seo,
        Category::UserExperience,
        Category::ContentQuality,
        Category::ConversionOptimization,
        Category::TechnicalPerformance,
        Category::SecurityAccessibility,
        Category::MobileOptimization,
        Category::SocialIntegration,
    ];

    /// Key used by the service payload
    pub fn key(self) -> &'static str {
        match self {
            Category::Seo => "seo",
            Category::UserExperience => "user_experience",
            Category::ContentQuality => "content_quality",
            Category::ConversionOptimization => "conversion_optimization",
            Category::TechnicalPerformance => "technical_performance",
            Category::SecurityAccessibility => "security_accessibility",
            Category::MobileOptimization => "mobile_optimization",
            Category::SocialIntegration => "social_integration",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Category::Seo => "SEO",
            Category::UserExperience => "User Experience",
            Category::ContentQuality => "Content Quality",
            Category::ConversionOptimization => "Conversion Optimization",
            Category::TechnicalPerformance => "Technical Performance",
            Category::SecurityAccessibility => "Security & Accessibility",
            Category::MobileOptimization => "Mobile Optimization",
            Category::SocialIntegration => "Social Integration",
        }
    }

    pub fn from_key(key: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.key() == key)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Per-category findings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues: Option<Field<Vec<Loose>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Field<Vec<Loose>>>,
    /// Sub-metric scores such as `"meta_tags": "8/10"`
    #[serde(flatten)]
    pub sub_scores: BTreeMap<String, Loose>,
}

impl CategoryDetail {
    pub fn issues(&self) -> Vec<String> {
        text_items(&self.issues, "issues")
    }

    pub fn recommendations(&self) -> Vec<String> {
        text_items(&self.recommendations, "recommendations")
    }

    /// Sub-metric scores that have a printable value, in key order
    pub fn sub_scores(&self) -> impl Iterator<Item = (&str, String)> {
        self.sub_scores
            .iter()
            .filter_map(|(key, value)| value.as_text().map(|text| (key.as_str(), text)))
    }

    pub fn is_empty(&self) -> bool {
        let no_text = |field: &Option<Field<Vec<Loose>>>| {
            read(field).is_none_or(|items| items.iter().all(|item| item.as_text().is_none()))
        };
        no_text(&self.issues)
            && no_text(&self.recommendations)
            && self.sub_scores().next().is_none()
    }
}

/// Crawl-level measurements reported alongside the scores
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalMetrics {
    /// Bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<Loose>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_count: Option<Loose>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_count: Option<Loose>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_https: Option<Loose>,
    /// Milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_time: Option<Loose>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_code: Option<Loose>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl TechnicalMetrics {
    /// Display rows in report order; absent values read `N/A`
    ///
    /// Older services send `images_count`, `links_count`, `https`,
    /// `load_time_ms` and `status_code`; those keys land in `extra` and are
    /// read when the current name is missing.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        let number = |field: &Option<Loose>, alternate: &str| {
            self.lookup(field, alternate, Loose::as_f64)
        };
        vec![
            (
                "Page Size",
                self.page_size
                    .as_ref()
                    .and_then(Loose::as_f64)
                    .map_or_else(na, format_bytes),
            ),
            (
                "Images",
                number(&self.image_count, "images_count").map_or_else(na, |n| format!("{n:.0}")),
            ),
            (
                "Links",
                number(&self.link_count, "links_count").map_or_else(na, |n| format!("{n:.0}")),
            ),
            (
                "HTTPS",
                self.lookup(&self.has_https, "https", Loose::as_bool)
                    .map_or_else(na, |b| if b { "Yes" } else { "No" }.to_string()),
            ),
            (
                "Load Time",
                number(&self.load_time, "load_time_ms").map_or_else(na, format_millis),
            ),
            (
                "Response Code",
                number(&self.response_code, "status_code").map_or_else(na, |n| format!("{n:.0}")),
            ),
        ]
    }

    fn lookup<T>(
        &self,
        field: &Option<Loose>,
        alternate: &str,
        read: impl Fn(&Loose) -> Option<T>,
    ) -> Option<T> {
        field.as_ref().and_then(&read).or_else(|| {
            self.extra
                .get(alternate)
                .and_then(|raw| read(&Loose(raw.clone())))
        })
    }
}

fn na() -> String {
    "N/A".to_string()
}

fn format_bytes(bytes: f64) -> String {
    if bytes >= 1024.0 * 1024.0 {
        format!("{:.2} MB", bytes / (1024.0 * 1024.0))
    } else if bytes >= 1024.0 {
        format!("{:.1} KB", bytes / 1024.0)
    } else {
        format!("{bytes:.0} B")
    }
}

fn format_millis(ms: f64) -> String {
    if ms >= 1000.0 {
        format!("{:.2} s", ms / 1000.0)
    } else {
        format!("{ms:.0} ms")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_parameters_analyzed: Option<Loose>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// The ordered string lists at the top level of the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSection {
    KeyInsights,
    PriorityActions,
    CompetitiveAdvantages,
    RiskFactors,
}

impl ListSection {
    pub fn title(self) -> &'static str {
        match self {
            ListSection::KeyInsights => "Key Insights",
            ListSection::PriorityActions => "Priority Actions",
            ListSection::CompetitiveAdvantages => "Competitive Advantages",
            ListSection::RiskFactors => "Risk Factors",
        }
    }
}

/// Report payload from `POST /api/analyze`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub overall_score: Loose,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_scores: Option<Field<BTreeMap<String, Loose>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_analysis: Option<Field<BTreeMap<String, Field<CategoryDetail>>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_metrics: Option<Field<TechnicalMetrics>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_insights: Option<Field<Vec<Loose>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_actions: Option<Field<Vec<Loose>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitive_advantages: Option<Field<Vec<Loose>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_factors: Option<Field<Vec<Loose>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_metadata: Option<Field<AnalysisMetadata>>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl AnalysisResult {
    /// A payload carrying nothing but the overall score
    pub fn with_score(score: f64) -> Self {
        AnalysisResult {
            overall_score: Loose::from(score),
            ..Default::default()
        }
    }

    pub fn category_score(&self, category: Category) -> Option<&Loose> {
        read(&self.category_scores).and_then(|scores| scores.get(category.key()))
    }

    pub fn category_detail(&self, category: Category) -> Option<&CategoryDetail> {
        read(&self.detailed_analysis)
            .and_then(|details| details.get(category.key()))
            .and_then(Field::present)
            .filter(|detail| !detail.is_empty())
    }

    pub fn technical_metrics(&self) -> Option<&TechnicalMetrics> {
        read(&self.technical_metrics)
    }

    /// Non-blank, readable entries of one of the top-level lists
    pub fn list(&self, section: ListSection) -> Vec<String> {
        let field = match section {
            ListSection::KeyInsights => &self.key_insights,
            ListSection::PriorityActions => &self.priority_actions,
            ListSection::CompetitiveAdvantages => &self.competitive_advantages,
            ListSection::RiskFactors => &self.risk_factors,
        };
        text_items(field, section.title())
    }

    pub fn parameters_analyzed(&self) -> u64 {
        read(&self.analysis_metadata)
            .and_then(|meta| meta.total_parameters_analyzed.as_ref())
            .and_then(Loose::as_f64)
            .filter(|n| *n >= 1.0)
            .map(|n| n.round() as u64)
            .unwrap_or(DEFAULT_PARAMETERS_ANALYZED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loose_reads_numbers_and_numeric_strings() {
        assert_eq!(Loose(json!(7)).as_f64(), Some(7.0));
        assert_eq!(Loose(json!("7.5")).as_f64(), Some(7.5));
        assert_eq!(Loose(json!(" 8/10 ")).as_f64(), Some(8.0));
        assert_eq!(Loose(json!("great")).as_f64(), None);
        assert_eq!(Loose(json!(null)).as_f64(), None);
    }

    #[test]
    fn fractions_only_count_out_of_ten() {
        assert_eq!(Loose(json!("7/10")).as_f64(), Some(7.0));
        assert_eq!(Loose(json!("4/5")).as_f64(), None);
        assert_eq!(Loose(json!("80/100")).as_f64(), None);
        assert_eq!(Loose(json!("7/")).as_f64(), None);
    }

    #[test]
    fn numeric_flags_read_as_booleans() {
        assert_eq!(Loose(json!(1)).as_bool(), Some(true));
        assert_eq!(Loose(json!(1.0)).as_bool(), Some(true));
        assert_eq!(Loose(json!(0.0)).as_bool(), Some(false));
        assert_eq!(Loose(json!(0)).as_bool(), Some(false));
    }

    #[test]
    fn lists_keep_readable_entries_around_bad_ones() {
        let analysis: AnalysisResult = serde_json::from_value(json!({
            "overall_score": 7,
            "key_insights": ["Fast pages", "Good headings", null, "Clean URLs"],
            "risk_factors": [{"text": "nested"}, "  ", "Thin content"],
            "detailed_analysis": {
                "seo": {"issues": ["No sitemap", null], "recommendations": [["x"], "Add one"]}
            }
        }))
        .unwrap();

        assert_eq!(
            analysis.list(ListSection::KeyInsights),
            vec!["Fast pages", "Good headings", "Clean URLs"]
        );
        assert_eq!(analysis.list(ListSection::RiskFactors), vec!["Thin content"]);
        let seo = analysis.category_detail(Category::Seo).unwrap();
        assert_eq!(seo.issues(), vec!["No sitemap"]);
        assert_eq!(seo.recommendations(), vec!["Add one"]);
    }

    #[test]
    fn malformed_fields_read_as_absent() {
        let analysis: AnalysisResult = serde_json::from_value(json!({
            "overall_score": 6,
            "key_insights": "not a list",
            "category_scores": {"seo": 9},
            "technical_metrics": 42
        }))
        .unwrap();

        assert!(analysis.list(ListSection::KeyInsights).is_empty());
        assert!(matches!(analysis.key_insights, Some(Field::Malformed(_))));
        assert_eq!(
            analysis.category_score(Category::Seo).and_then(Loose::as_f64),
            Some(9.0)
        );
        assert!(analysis.technical_metrics().is_none());
    }

    #[test]
    fn category_detail_collects_sub_scores() {
        let analysis: AnalysisResult = serde_json::from_value(json!({
            "overall_score": 6,
            "detailed_analysis": {
                "seo": {
                    "meta_tags": "8/10",
                    "headings": 6,
                    "issues": ["Missing meta description"],
                    "recommendations": []
                },
                "mobile_optimization": {}
            }
        }))
        .unwrap();

        let seo = analysis.category_detail(Category::Seo).unwrap();
        let subs: Vec<_> = seo.sub_scores().collect();
        assert_eq!(
            subs,
            vec![("headings", "6".to_string()), ("meta_tags", "8/10".to_string())]
        );
        assert_eq!(seo.issues(), ["Missing meta description".to_string()]);
        assert!(seo.recommendations().is_empty());
        assert!(analysis.category_detail(Category::MobileOptimization).is_none());
    }

    #[test]
    fn parameters_default_to_thirty_two() {
        let analysis = AnalysisResult::with_score(5.0);
        assert_eq!(analysis.parameters_analyzed(), 32);

        let analysis: AnalysisResult = serde_json::from_value(json!({
            "overall_score": 5,
            "analysis_metadata": {"total_parameters_analyzed": "48"}
        }))
        .unwrap();
        assert_eq!(analysis.parameters_analyzed(), 48);
    }

    #[test]
    fn technical_metrics_read_older_key_names() {
        let metrics: TechnicalMetrics = serde_json::from_value(json!({
            "page_size": 524288,
            "images_count": 12,
            "https": true,
            "load_time_ms": 1830
        }))
        .unwrap();

        let rows = metrics.rows();
        assert_eq!(rows[0], ("Page Size", "512.0 KB".to_string()));
        assert_eq!(rows[1], ("Images", "12".to_string()));
        assert_eq!(rows[2], ("Links", "N/A".to_string()));
        assert_eq!(rows[3], ("HTTPS", "Yes".to_string()));
        assert_eq!(rows[4], ("Load Time", "1.83 s".to_string()));
        assert_eq!(rows[5], ("Response Code", "N/A".to_string()));
    }

    #[test]
    fn technical_metrics_tolerate_both_spellings() {
        let analysis: AnalysisResult = serde_json::from_value(json!({
            "overall_score": 7,
            "technical_metrics": {
                "image_count": 12,
                "images_count": 12,
                "page_size": 2048,
                "has_https": true
            }
        }))
        .unwrap();

        let rows = analysis.technical_metrics().unwrap().rows();
        assert_eq!(rows[0], ("Page Size", "2.0 KB".to_string()));
        assert_eq!(rows[1], ("Images", "12".to_string()));
        assert_eq!(rows[3], ("HTTPS", "Yes".to_string()));
    }

    #[test]
    fn current_metric_names_win_over_older_ones() {
        let metrics: TechnicalMetrics = serde_json::from_value(json!({
            "link_count": 40,
            "links_count": 3,
            "response_code": "200"
        }))
        .unwrap();

        let rows = metrics.rows();
        assert_eq!(rows[2], ("Links", "40".to_string()));
        assert_eq!(rows[5], ("Response Code", "200".to_string()));
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let raw = json!({
            "overall_score": 7.5,
            "crawl_id": "abc",
            "category_scores": {"seo": "7", "made_up": 3}
        });
        let analysis: AnalysisResult = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&analysis).unwrap(), raw);
    }
}

use std::fmt::Write as FmtWrite;

use nextin_core::client::{RecentAnalysis, ServiceHealth};
use nextin_core::types::ListSection;
use nextin_core::{AnalysisResult, Category, classify};

const DIVIDER: &str = "─────────────────────────────────────────────────────────────";
const LABEL_WIDTH: usize = 26;

fn push_section_header(buf: &mut String, icon: &str, title: &str) {
    let _ = writeln!(buf, "{DIVIDER}");
    let _ = writeln!(buf, "{icon} {title}");
    let _ = writeln!(buf, "{DIVIDER}");
}

fn push_key_value(buf: &mut String, label: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    let _ = writeln!(buf, "• {:<width$} : {}", label, value, width = LABEL_WIDTH);
}

/// Terminal rendition of an analysis
pub fn render_analysis(analysis: &AnalysisResult, url: &str) -> String {
    let mut output = String::new();

    let overall = classify(Some(&analysis.overall_score));
    push_section_header(&mut output, "📊", &format!("Website Analysis: {url}"));
    push_key_value(&mut output, "Overall Score", &overall.display_out_of_ten());
    push_key_value(&mut output, "Performance", overall.band.performance_caption());
    push_key_value(
        &mut output,
        "Parameters Analyzed",
        &analysis.parameters_analyzed().to_string(),
    );
    let _ = writeln!(&mut output);

    push_section_header(&mut output, "🏷️", "Category Scores");
    for category in Category::ALL {
        let score = classify(analysis.category_score(category));
        let value = format!(
            "{:<7} {:<9} priority {}",
            score.display_out_of_ten(),
            score.band.label(),
            score.priority()
        );
        push_key_value(&mut output, category.title(), &value);
    }
    let _ = writeln!(&mut output);

    if let Some(metrics) = analysis.technical_metrics() {
        push_section_header(&mut output, "⚙️", "Technical Metrics");
        for (name, value) in metrics.rows() {
            push_key_value(&mut output, name, &value);
        }
        let _ = writeln!(&mut output);
    }

    for (icon, section) in [
        ("💡", ListSection::KeyInsights),
        ("🎯", ListSection::PriorityActions),
        ("🏆", ListSection::CompetitiveAdvantages),
        ("⚠️", ListSection::RiskFactors),
    ] {
        let items = analysis.list(section);
        if items.is_empty() {
            continue;
        }
        push_section_header(&mut output, icon, section.title());
        for (index, item) in items.into_iter().enumerate() {
            if section == ListSection::PriorityActions {
                let _ = writeln!(&mut output, "{}. {item}", index + 1);
            } else {
                let _ = writeln!(&mut output, "• {item}");
            }
        }
        let _ = writeln!(&mut output);
    }

    output
}

pub fn render_recent(entries: &[RecentAnalysis]) -> String {
    let mut output = String::new();
    push_section_header(&mut output, "🕘", "Recent Analyses");
    if entries.is_empty() {
        let _ = writeln!(&mut output, "No analyses yet");
        return output;
    }
    for entry in entries {
        let score = classify(Some(&entry.overall_score));
        let url = entry.url.as_deref().unwrap_or("(unknown site)");
        let _ = write!(&mut output, "• {url} - {}", score.display_out_of_ten());
        if let Some(date) = entry.created_at.as_deref().and_then(analysis_date) {
            let _ = write!(&mut output, " - analyzed on {date}");
        }
        if let Some(id) = entry.id.as_text() {
            let _ = write!(&mut output, " [{id}]");
        }
        let _ = writeln!(&mut output);
    }
    output
}

pub fn render_health(base_url: &str, health: &ServiceHealth) -> String {
    let mut output = String::new();
    let (icon, state) = if health.is_healthy() {
        ("✅", "up")
    } else {
        ("❌", "degraded")
    };
    push_section_header(&mut output, icon, &format!("Analysis service {state}"));
    push_key_value(&mut output, "Endpoint", base_url);
    push_key_value(&mut output, "Status", health.status.as_deref().unwrap_or("ok"));
    for (key, value) in &health.details {
        let text = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        push_key_value(&mut output, key, &text);
    }
    output
}

/// Calendar date of an RFC 3339 timestamp, or the raw text when it is not one
fn analysis_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Some(
        chrono::DateTime::parse_from_rfc3339(raw)
            .map(|ts| ts.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|_| raw.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_lists_every_category() {
        let analysis: AnalysisResult = serde_json::from_value(json!({
            "overall_score": 8.5,
            "category_scores": {"seo": 9},
            "priority_actions": ["Compress hero image", "Add alt text"]
        }))
        .unwrap();

        let output = render_analysis(&analysis, "https://example.com");
        assert!(output.contains("8.5/10"));
        assert!(output.contains("Excellent"));
        for category in Category::ALL {
            assert!(output.contains(category.title()));
        }
        assert!(output.contains("1. Compress hero image"));
        assert!(output.contains("2. Add alt text"));
        assert!(!output.contains("Key Insights"));
    }

    #[test]
    fn recent_entries_show_scores_and_dates() {
        let entries: Vec<RecentAnalysis> = serde_json::from_value(json!([
            {"id": 7, "url": "https://a.example", "overall_score": 6, "created_at": "2024-05-01T10:00:00Z"},
            {"url": "https://b.example"}
        ]))
        .unwrap();

        let output = render_recent(&entries);
        assert!(output.contains("https://a.example - 6/10 - analyzed on 2024-05-01 [7]"));
        assert!(output.contains("https://b.example - N/A"));
    }

    #[test]
    fn empty_recent_list_says_so() {
        assert!(render_recent(&[]).contains("No analyses yet"));
    }
}

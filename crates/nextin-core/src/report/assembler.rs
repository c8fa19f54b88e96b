//! Fixed section sequence of the analysis report

use super::layout::{
    FOOTER_RULE_Y, MARGIN, PAGE_HEIGHT, PAGE_WIDTH, PRIMARY, PageBuilder, ReportDocument,
    SECONDARY, TextStyle,
};
use super::metrics::{self, Font};
use super::table::{Table, TablePipeline};
use super::{DrawOp, ReportError, ReportOptions};
use crate::score::{Rgb, classify};
use crate::types::{AnalysisResult, Category, CategoryDetail, ListSection};
use crate::url_utils::truncate_chars;

pub const BRAND: &str = "NEXTIN VISION";
pub const TAGLINE: &str = "Website Analysis & Digital Solutions";
const REPORT_TYPE: &str = "WEBSITE ANALYSIS REPORT";
const HEADER_BAND_HEIGHT: f32 = 25.0;
/// URLs longer than this are cut in the title block
const TITLE_URL_CHARS: usize = 65;
/// Room a section needs below its header before it is worth starting
const SECTION_MIN_SPACE: f32 = 30.0;
const TABLE_GAP: f32 = 10.0;
const LIST_GAP: f32 = 6.0;

const TIMELINE: [(&str, &str); 4] = [
    (
        "Weeks 1-2: Critical fixes",
        "Resolve the high-priority technical and SEO issues listed above, starting with anything that blocks crawling, indexing or secure delivery.",
    ),
    (
        "Weeks 3-4: Experience and content",
        "Improve page content, navigation and readability, and address the user experience findings for each category.",
    ),
    (
        "Month 2: Conversion and mobile",
        "Optimize calls to action, forms and the mobile experience, then re-test load times on real devices.",
    ),
    (
        "Month 3: Measure and iterate",
        "Track rankings, engagement and conversions against this baseline, strengthen social integration and schedule a follow-up analysis.",
    ),
];

/// Lay out the full report for one analysis.
///
/// Sections run in a fixed order; sections whose data is missing are
/// skipped. A table that neither renderer can place aborts the whole
/// report.
pub fn generate_report(
    analysis: &AnalysisResult,
    url: &str,
    options: &ReportOptions,
) -> Result<ReportDocument, ReportError> {
    let tables = TablePipeline::new(options.capabilities, options.table_strategy);
    tracing::debug!(url, tables = tables.primary_name(), "generating analysis report");

    let mut report = ReportAssembler {
        page: PageBuilder::new(),
        tables,
        analysis,
        options,
    };

    report.header_band();
    report.title_block(url);
    report.executive_summary();
    report.overall_score();

    report.page.add_page();
    report.category_scores()?;
    report.category_details();
    report.technical_metrics()?;
    report.bulleted(ListSection::KeyInsights);
    report.numbered(ListSection::PriorityActions);
    report.bulleted(ListSection::CompetitiveAdvantages);
    report.bulleted(ListSection::RiskFactors);
    report.timeline();
    report.footers();

    let document = report.page.finish();
    tracing::info!(pages = document.page_count(), "report laid out");
    Ok(document)
}

struct ReportAssembler<'a> {
    page: PageBuilder,
    tables: TablePipeline,
    analysis: &'a AnalysisResult,
    options: &'a ReportOptions,
}

impl ReportAssembler<'_> {
    fn begin_section(&mut self, title: &str) -> f32 {
        self.page.ensure_space(SECTION_MIN_SPACE);
        self.page.draw_section_header(title)
    }

    fn header_band(&mut self) {
        self.page
            .fill_rect(0.0, 0.0, PAGE_WIDTH, HEADER_BAND_HEIGHT, PRIMARY);
        self.page
            .text(MARGIN, 15.0, BRAND, Font::Bold, 24.0, Rgb::WHITE);
        self.page
            .text(MARGIN, 21.0, TAGLINE, Font::Regular, 10.0, Rgb::WHITE);
        let width = metrics::text_width(REPORT_TYPE, Font::Bold, 11.0);
        self.page.text(
            PAGE_WIDTH - MARGIN - width,
            15.0,
            REPORT_TYPE,
            Font::Bold,
            11.0,
            Rgb(236, 240, 241),
        );
        self.page.move_to(35.0);
    }

    fn title_block(&mut self, url: &str) {
        self.page
            .write_text("Website Performance Analysis", TextStyle::TITLE);
        let url_line = format!("Website: {}", truncate_chars(url, TITLE_URL_CHARS));
        let url_style = TextStyle::BODY.with_spacing(3.0);
        self.page.write_text(&url_line, TextStyle { size: 12.0, ..url_style });
        let date = self.options.generated_at.format("%B %-d, %Y");
        let date_style = TextStyle::BODY.with_spacing(10.0);
        self.page
            .write_text(&format!("Analysis Date: {date}"), TextStyle { size: 12.0, ..date_style });
    }

    fn executive_summary(&mut self) {
        self.begin_section("Executive Summary");
        let parameters = self.analysis.parameters_analyzed();
        let summary = format!(
            "This comprehensive website analysis evaluates {parameters} parameters across eight critical areas: \
             SEO, user experience, content quality, conversion optimization, technical performance, \
             security and accessibility, mobile optimization, and social integration. \
             It provides actionable insights to enhance your website's effectiveness and drive better business results."
        );
        self.page.write_text(&summary, TextStyle::BODY);
    }

    fn overall_score(&mut self) {
        self.begin_section("Overall Performance Score");
        let overall = classify(Some(&self.analysis.overall_score));
        let caption = overall.band.performance_caption();
        self.page
            .draw_score_badge(&overall, caption, self.options.badge_shadow);
    }

    fn category_scores(&mut self) -> Result<(), ReportError> {
        self.begin_section("Category Score Breakdown");
        let mut table = Table::new(["Category", "Score", "Status", "Priority"]);
        for category in Category::ALL {
            let score = classify(self.analysis.category_score(category));
            table = table.row([
                category.title().to_string(),
                score.display_out_of_ten(),
                score.band.label().to_string(),
                score.priority().to_string(),
            ]);
        }
        let outcome = self.tables.render(&mut self.page, &table, "Category Score Breakdown")?;
        self.page.move_to(outcome.end_y + TABLE_GAP);
        Ok(())
    }

    fn category_details(&mut self) {
        let analysis = self.analysis;
        let details: Vec<(Category, &CategoryDetail)> = Category::ALL
            .into_iter()
            .filter_map(|c| analysis.category_detail(c).map(|d| (c, d)))
            .collect();
        if details.is_empty() {
            return;
        }

        self.begin_section("Detailed Category Analysis");
        for (category, detail) in details {
            self.category_block(category, detail);
        }
    }

    fn category_block(&mut self, category: Category, detail: &CategoryDetail) {
        self.page.ensure_space(20.0);
        let score = classify(self.analysis.category_score(category));
        let heading = format!("{} - {}", category.title(), score.display_out_of_ten());
        self.page.write_text(&heading, TextStyle::SUBHEADING);

        let sub_style = TextStyle::LIST_ITEM.with_spacing(1.0);
        let mut wrote_sub_scores = false;
        for (key, value) in detail.sub_scores() {
            self.page
                .write_text(&format!("{}: {value}", humanize_key(key)), sub_style);
            wrote_sub_scores = true;
        }
        if wrote_sub_scores {
            self.page.advance(2.0);
        }

        self.finding_list("Issues:", detail.issues(), Rgb::DANGER);
        self.finding_list("Recommendations:", detail.recommendations(), Rgb(39, 174, 96));
        self.page.advance(4.0);
    }

    fn finding_list(&mut self, label: &str, items: Vec<String>, color: Rgb) {
        if items.is_empty() {
            return;
        }
        self.page.ensure_space(12.0);
        self.page
            .write_text(label, TextStyle::LABEL.with_color(color));
        for item in &items {
            self.page.write_list_item(None, item, TextStyle::LIST_ITEM);
        }
    }

    fn technical_metrics(&mut self) -> Result<(), ReportError> {
        let analysis = self.analysis;
        let Some(metrics) = analysis.technical_metrics() else {
            return Ok(());
        };
        self.begin_section("Technical Metrics");
        let table = metrics
            .rows()
            .into_iter()
            .fold(Table::new(["Metric", "Value"]), |table, (name, value)| {
                table.row([name.to_string(), value])
            });
        let outcome = self.tables.render(&mut self.page, &table, "Technical Metrics")?;
        self.page.move_to(outcome.end_y + TABLE_GAP);
        Ok(())
    }

    fn bulleted(&mut self, section: ListSection) {
        let analysis = self.analysis;
        let items = analysis.list(section);
        if items.is_empty() {
            return;
        }
        self.begin_section(section.title());
        for item in &items {
            self.page.write_list_item(None, item, TextStyle::LIST_ITEM);
        }
        self.page.advance(LIST_GAP);
    }

    fn numbered(&mut self, section: ListSection) {
        let analysis = self.analysis;
        let items = analysis.list(section);
        if items.is_empty() {
            return;
        }
        self.begin_section(section.title());
        for (index, item) in items.into_iter().enumerate() {
            let label = format!("{}.", index + 1);
            self.page
                .write_list_item(Some(&label), &item, TextStyle::LIST_ITEM);
        }
        self.page.advance(LIST_GAP);
    }

    fn timeline(&mut self) {
        self.begin_section("Implementation Timeline");
        self.page.write_text(
            "A phased plan for acting on this report. Adjust the pacing to your team's capacity.",
            TextStyle::BODY.with_spacing(4.0),
        );
        for (phase, description) in TIMELINE {
            self.page.ensure_space(15.0);
            self.page
                .write_text(phase, TextStyle::LABEL.with_color(PRIMARY));
            self.page
                .write_text(description, TextStyle::LIST_ITEM.with_spacing(4.0));
        }
    }

    /// Footer rule, branding, page number and timestamp on every page
    fn footers(&mut self) {
        let total = self.page.page_count();
        let generated = self.options.generated_at.format("%B %-d, %Y %H:%M").to_string();
        let branding = format!("{BRAND} - {TAGLINE}");

        for index in 0..total {
            self.page.push_to(
                index,
                DrawOp::Line {
                    from: (MARGIN, FOOTER_RULE_Y),
                    to: (PAGE_WIDTH - MARGIN, FOOTER_RULE_Y),
                    color: PRIMARY,
                    line_width: 0.5,
                },
            );
            self.page.push_to(index, footer_text(MARGIN, PAGE_HEIGHT - 15.0, &branding));

            let number = format!("Page {} of {}", index + 1, total);
            let width = metrics::text_width(&number, Font::Regular, 8.0);
            self.page.push_to(
                index,
                footer_text(PAGE_WIDTH - MARGIN - width, PAGE_HEIGHT - 15.0, &number),
            );
            self.page.push_to(
                index,
                footer_text(MARGIN, PAGE_HEIGHT - 10.0, &format!("Generated: {generated}")),
            );
        }
    }
}

fn footer_text(x: f32, y: f32, text: &str) -> DrawOp {
    DrawOp::Text {
        x,
        y,
        text: text.to_string(),
        font: Font::Regular,
        size: 8.0,
        color: SECONDARY,
    }
}

/// `"meta_tags"` -> `"Meta Tags"`
fn humanize_key(key: &str) -> String {
    key.split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn humanizes_metric_keys() {
        assert_eq!(humanize_key("meta_tags"), "Meta Tags");
        assert_eq!(humanize_key("alt-text_coverage"), "Alt Text Coverage");
        assert_eq!(humanize_key("h1"), "H1");
    }
}

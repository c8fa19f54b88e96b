//! Cursor-based page layout
//!
//! [`PageBuilder`] owns the pages being laid out and the vertical cursor.
//! Every drawing call returns the cursor after the block it placed, and a
//! new page is started whenever a block would cross the printable area.
//! Coordinates are millimetres on an A4 page with the origin top-left;
//! text is positioned by its baseline.

use super::metrics::{self, Font};
use crate::score::{Classification, Rgb};

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const MARGIN: f32 = 20.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
/// Cursor position at the top of every page after the first
pub const CONTENT_TOP: f32 = 30.0;
/// Section headers starting below this line move to a new page
pub const SECTION_BREAK_Y: f32 = 250.0;
/// Lowest baseline content may use; the footer lives below it
pub const PRINTABLE_BOTTOM: f32 = 265.0;
pub const FOOTER_RULE_Y: f32 = PAGE_HEIGHT - 25.0;

pub const SECTION_HEADER_HEIGHT: f32 = 10.0;
pub const SECTION_HEADER_ADVANCE: f32 = 15.0;
pub const BADGE_RADIUS: f32 = 20.0;
pub const BADGE_HEIGHT: f32 = 60.0;
pub const BULLET_RADIUS: f32 = 0.8;

pub const PRIMARY: Rgb = Rgb(41, 128, 185);
pub const SECONDARY: Rgb = Rgb(52, 73, 94);
pub const BADGE_BACKGROUND: Rgb = Rgb(240, 240, 240);
pub const BADGE_SHADOW: Rgb = Rgb(205, 210, 214);

/// One low-level drawing primitive
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgb,
    },
    StrokeRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgb,
        line_width: f32,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        color: Rgb,
        line_width: f32,
    },
    Circle {
        cx: f32,
        cy: f32,
        radius: f32,
        color: Rgb,
    },
    Text {
        x: f32,
        y: f32,
        text: String,
        font: Font,
        size: f32,
        color: Rgb,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// A laid-out report, ready for a document backend
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub width: f32,
    pub height: f32,
    pub pages: Vec<Page>,
}

impl ReportDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every text run in page order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(Page::texts)
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.contains(needle))
    }

    /// Number of circles drawn with the given radius
    pub fn circles_with_radius(&self, radius: f32) -> usize {
        self.pages
            .iter()
            .flat_map(|p| &p.ops)
            .filter(|op| matches!(op, DrawOp::Circle { radius: r, .. } if (*r - radius).abs() < 1e-3))
            .count()
    }
}

/// Font, color and spacing for a block of text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: Font,
    pub size: f32,
    pub color: Rgb,
    /// Distance between consecutive baselines
    pub line_height: f32,
    /// Extra advance after the block
    pub spacing: f32,
    /// Left offset from the margin
    pub indent: f32,
}

impl TextStyle {
    pub const TITLE: TextStyle = TextStyle {
        font: Font::Bold,
        size: 18.0,
        color: SECONDARY,
        line_height: 7.0,
        spacing: 8.0,
        indent: 0.0,
    };
    pub const BODY: TextStyle = TextStyle {
        font: Font::Regular,
        size: 11.0,
        color: SECONDARY,
        line_height: 5.0,
        spacing: 10.0,
        indent: 0.0,
    };
    pub const SUBHEADING: TextStyle = TextStyle {
        font: Font::Bold,
        size: 12.0,
        color: PRIMARY,
        line_height: 6.0,
        spacing: 2.0,
        indent: 0.0,
    };
    pub const LABEL: TextStyle = TextStyle {
        font: Font::Bold,
        size: 10.0,
        color: SECONDARY,
        line_height: 5.0,
        spacing: 1.0,
        indent: 0.0,
    };
    pub const LIST_ITEM: TextStyle = TextStyle {
        font: Font::Regular,
        size: 10.0,
        color: SECONDARY,
        line_height: 4.0,
        spacing: 3.0,
        indent: 5.0,
    };

    pub const fn with_spacing(self, spacing: f32) -> TextStyle {
        TextStyle { spacing, ..self }
    }

    pub const fn with_color(self, color: Rgb) -> TextStyle {
        TextStyle { color, ..self }
    }
}

/// Owns the pages of one report and the cursor walking down them
#[derive(Debug)]
pub struct PageBuilder {
    pages: Vec<Page>,
    y: f32,
}

impl Default for PageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PageBuilder {
    /// Start with a single page and the cursor at the top margin
    pub fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y: MARGIN,
        }
    }

    pub fn cursor(&self) -> f32 {
        self.y
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Place the cursor at an absolute position on the current page
    pub fn move_to(&mut self, y: f32) -> f32 {
        self.y = y;
        self.y
    }

    pub fn advance(&mut self, dy: f32) -> f32 {
        self.y += dy;
        self.y
    }

    /// Append a page and reset the cursor to the content top
    pub fn add_page(&mut self) -> f32 {
        self.pages.push(Page::default());
        self.y = CONTENT_TOP;
        tracing::trace!(page = self.pages.len(), "started new page");
        self.y
    }

    /// Break the page unless a block of `height` fits below the cursor
    pub fn ensure_space(&mut self, height: f32) -> f32 {
        if self.y + height > PRINTABLE_BOTTOM && self.y > CONTENT_TOP {
            self.add_page();
        }
        self.y
    }

    /// Draw on the current page
    pub fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    /// Draw on an earlier page, used by passes that run after layout
    pub fn push_to(&mut self, page_index: usize, op: DrawOp) {
        if let Some(page) = self.pages.get_mut(page_index) {
            page.ops.push(op);
        }
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb) {
        self.push(DrawOp::FillRect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    pub fn circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb) {
        self.push(DrawOp::Circle {
            cx,
            cy,
            radius,
            color,
        });
    }

    /// A single unwrapped text run at an absolute position
    pub fn text(&mut self, x: f32, y: f32, text: impl Into<String>, font: Font, size: f32, color: Rgb) {
        self.push(DrawOp::Text {
            x,
            y,
            text: text.into(),
            font,
            size,
            color,
        });
    }

    /// Write wrapped text at the cursor.
    ///
    /// Lines are wrapped to the content width minus the style indent and
    /// each line gets its own page-break check, so long blocks continue on
    /// the next page instead of running into the footer.
    pub fn write_text(&mut self, text: &str, style: TextStyle) -> f32 {
        let width = CONTENT_WIDTH - style.indent;
        for line in metrics::wrap_text(text, style.font, style.size, width) {
            self.ensure_space(style.line_height);
            let y = self.y;
            self.text(MARGIN + style.indent, y, line, style.font, style.size, style.color);
            self.y += style.line_height;
        }
        self.advance(style.spacing)
    }

    /// Write one list entry with a round bullet and optional label
    /// (`"3."`) before the text; continuation lines hang under the text.
    pub fn write_list_item(&mut self, label: Option<&str>, text: &str, style: TextStyle) -> f32 {
        let bullet_x = MARGIN + style.indent + BULLET_RADIUS;
        let text_x = MARGIN + style.indent + 4.0;
        let body = match label {
            Some(label) => format!("{label} {text}"),
            None => text.to_string(),
        };
        let lines = metrics::wrap_text(&body, style.font, style.size, PAGE_WIDTH - MARGIN - text_x);

        for (index, line) in lines.into_iter().enumerate() {
            self.ensure_space(style.line_height);
            let y = self.y;
            if index == 0 {
                let cy = y - style.size * metrics::MM_PER_PT * 0.3;
                self.circle(bullet_x, cy, BULLET_RADIUS, style.color);
            }
            self.text(text_x, y, line, style.font, style.size, style.color);
            self.y += style.line_height;
        }
        self.advance(style.spacing)
    }

    /// Draw a full-width colored bar with a white label
    pub fn draw_section_header(&mut self, title: &str) -> f32 {
        if self.y > SECTION_BREAK_Y {
            self.add_page();
        }
        let y = self.y;
        self.fill_rect(
            MARGIN,
            y - SECTION_HEADER_HEIGHT / 2.0,
            CONTENT_WIDTH,
            SECTION_HEADER_HEIGHT,
            PRIMARY,
        );
        self.text(MARGIN + 2.0, y + 2.0, title, Font::Bold, 14.0, Rgb::WHITE);
        self.advance(SECTION_HEADER_ADVANCE)
    }

    /// Draw the round score badge centred on the page.
    ///
    /// Unrated scores print `N/A` on a neutral disc.
    pub fn draw_score_badge(&mut self, score: &Classification, caption: &str, shadow: bool) -> f32 {
        self.ensure_space(BADGE_HEIGHT);
        let cx = PAGE_WIDTH / 2.0;
        let cy = self.y + 25.0;

        if shadow {
            self.circle(cx + 1.0, cy + 1.0, BADGE_RADIUS, BADGE_SHADOW);
        }
        self.circle(cx, cy, BADGE_RADIUS, BADGE_BACKGROUND);
        self.circle(cx, cy, BADGE_RADIUS - 3.0, score.fill());

        let value = score.display();
        let value_width = metrics::text_width(&value, Font::Bold, 24.0);
        if score.is_rated() {
            let suffix_width = metrics::text_width("/10", Font::Regular, 12.0);
            let start = cx - (value_width + 1.0 + suffix_width) / 2.0;
            self.text(start, cy + 4.0, value, Font::Bold, 24.0, Rgb::WHITE);
            self.text(start + value_width + 1.0, cy + 4.0, "/10", Font::Regular, 12.0, Rgb::WHITE);
        } else {
            self.text(cx - value_width / 2.0, cy + 4.0, value, Font::Bold, 24.0, Rgb::WHITE);
        }

        let caption_width = metrics::text_width(caption, Font::Regular, 10.0);
        self.text(
            cx - caption_width / 2.0,
            cy + BADGE_RADIUS + 7.0,
            caption,
            Font::Regular,
            10.0,
            SECONDARY,
        );
        self.advance(BADGE_HEIGHT)
    }

    pub fn finish(self) -> ReportDocument {
        ReportDocument {
            width: PAGE_WIDTH,
            height: PAGE_HEIGHT,
            pages: self.pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::classify_value;

    #[test]
    fn add_page_resets_cursor() {
        let mut page = PageBuilder::new();
        page.move_to(200.0);
        assert_eq!(page.add_page(), CONTENT_TOP);
        assert_eq!(page.page_count(), 2);
    }

    #[test]
    fn write_text_advances_by_lines_and_spacing() {
        let mut page = PageBuilder::new();
        let start = page.move_to(40.0);
        let end = page.write_text("one\ntwo\nthree", TextStyle::BODY);
        assert_eq!(end, start + 3.0 * TextStyle::BODY.line_height + TextStyle::BODY.spacing);
        assert_eq!(page.finish().texts().count(), 3);
    }

    #[test]
    fn long_text_continues_on_next_page() {
        let mut page = PageBuilder::new();
        page.move_to(250.0);
        let text = (0..20).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        page.write_text(&text, TextStyle::LIST_ITEM);
        let doc = page.finish();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.texts().count(), 20);
        for op in doc.pages.iter().flat_map(|p| &p.ops) {
            if let DrawOp::Text { y, .. } = op {
                assert!(*y <= PRINTABLE_BOTTOM);
            }
        }
    }

    #[test]
    fn section_header_breaks_when_low_on_page() {
        let mut page = PageBuilder::new();
        page.move_to(SECTION_BREAK_Y + 1.0);
        let y = page.draw_section_header("Key Insights");
        assert_eq!(page.page_count(), 2);
        assert_eq!(y, CONTENT_TOP + SECTION_HEADER_ADVANCE);
    }

    #[test]
    fn section_header_stays_when_room_left() {
        let mut page = PageBuilder::new();
        page.move_to(100.0);
        assert_eq!(page.draw_section_header("Summary"), 115.0);
        assert_eq!(page.page_count(), 1);
    }

    #[test]
    fn badge_uses_band_color_and_shadow() {
        let mut page = PageBuilder::new();
        page.move_to(50.0);
        let end = page.draw_score_badge(&classify_value(Some(9.0)), "Excellent Performance", true);
        assert_eq!(end, 50.0 + BADGE_HEIGHT);

        let doc = page.finish();
        let circles: Vec<_> = doc.pages[0]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Circle { radius, color, .. } => Some((*radius, *color)),
                _ => None,
            })
            .collect();
        assert_eq!(circles.len(), 3);
        assert_eq!(circles[2], (BADGE_RADIUS - 3.0, Rgb::SUCCESS));
        assert!(doc.contains_text("/10"));
    }

    #[test]
    fn badge_without_score_prints_na() {
        let mut page = PageBuilder::new();
        page.draw_score_badge(&classify_value(None), "Needs Improvement", false);
        let doc = page.finish();
        assert!(doc.contains_text("N/A"));
        assert!(!doc.contains_text("/10"));
        assert_eq!(doc.circles_with_radius(BADGE_RADIUS - 3.0), 1);
    }

    #[test]
    fn list_item_draws_one_bullet_for_wrapped_text() {
        let mut page = PageBuilder::new();
        page.move_to(40.0);
        let long = "word ".repeat(80);
        page.write_list_item(Some("1."), &long, TextStyle::LIST_ITEM);
        let doc = page.finish();
        assert_eq!(doc.circles_with_radius(BULLET_RADIUS), 1);
        assert!(doc.texts().count() > 1);
        assert!(doc.texts().next().unwrap().starts_with("1. word"));
    }
}

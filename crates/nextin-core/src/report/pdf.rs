//! PDF serialization of a laid-out report

use pdf_writer::{Content, Name, Pdf, Rect, Ref, Str, TextStr};

use super::ReportError;
use super::layout::{DrawOp, Page, ReportDocument};
use super::metrics::{self, Font};
use crate::score::Rgb;

const PT_PER_MM: f32 = 72.0 / 25.4;
/// Control point distance for a quarter circle drawn as a Bézier curve
const KAPPA: f32 = 0.552_284_8;
const DOCUMENT_TITLE: &str = "Website Analysis Report";

/// Writes [`ReportDocument`]s as PDF using the standard Helvetica fonts
#[derive(Debug, Clone)]
pub struct PdfBackend {
    width: f32,
    height: f32,
}

impl PdfBackend {
    /// Backend for pages of `width` x `height` millimetres
    pub fn new(width: f32, height: f32) -> Result<Self, ReportError> {
        let valid = |v: f32| v.is_finite() && v > 0.0 && v * PT_PER_MM <= 14_400.0;
        if !valid(width) || !valid(height) {
            return Err(ReportError::Backend(format!(
                "unsupported page size {width}x{height}mm"
            )));
        }
        Ok(Self { width, height })
    }

    pub fn render(&self, document: &ReportDocument) -> Result<Vec<u8>, ReportError> {
        if document.pages.is_empty() {
            return Err(ReportError::Backend("document has no pages".to_string()));
        }
        if (document.width - self.width).abs() > f32::EPSILON
            || (document.height - self.height).abs() > f32::EPSILON
        {
            return Err(ReportError::Backend(format!(
                "document is {}x{}mm but the backend writes {}x{}mm pages",
                document.width, document.height, self.width, self.height
            )));
        }

        let catalog_id = Ref::new(1);
        let pages_id = Ref::new(2);
        let regular_id = Ref::new(3);
        let bold_id = Ref::new(4);
        let info_id = Ref::new(5);
        let mut next_id = 6;
        let mut alloc = || {
            let id = Ref::new(next_id);
            next_id += 1;
            id
        };

        let page_refs: Vec<(Ref, Ref)> = document.pages.iter().map(|_| (alloc(), alloc())).collect();

        let mut pdf = Pdf::new();
        pdf.catalog(catalog_id).pages(pages_id);
        pdf.pages(pages_id)
            .kids(page_refs.iter().map(|(page_id, _)| *page_id))
            .count(page_refs.len() as i32);

        for (font, id) in [(Font::Regular, regular_id), (Font::Bold, bold_id)] {
            pdf.type1_font(id)
                .base_font(Name(font.base_font()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
        }

        let media_box = Rect::new(0.0, 0.0, self.width * PT_PER_MM, self.height * PT_PER_MM);
        for (page, (page_id, content_id)) in document.pages.iter().zip(&page_refs) {
            {
                let mut writer = pdf.page(*page_id);
                writer
                    .media_box(media_box)
                    .parent(pages_id)
                    .contents(*content_id);
                let mut resources = writer.resources();
                let mut fonts = resources.fonts();
                fonts.pair(Name(Font::Regular.resource_name()), regular_id);
                fonts.pair(Name(Font::Bold.resource_name()), bold_id);
            }
            let content = self.page_content(page);
            pdf.stream(*content_id, &content.finish());
        }

        pdf.document_info(info_id)
            .title(TextStr(DOCUMENT_TITLE))
            .producer(TextStr(concat!("nextin-core ", env!("CARGO_PKG_VERSION"))));

        let bytes = pdf.finish();
        tracing::debug!(pages = page_refs.len(), bytes = bytes.len(), "pdf written");
        Ok(bytes)
    }

    fn page_content(&self, page: &Page) -> Content {
        let mut content = Content::new();
        for op in &page.ops {
            match op {
                DrawOp::FillRect {
                    x,
                    y,
                    width,
                    height,
                    color,
                } => {
                    let (r, g, b) = color.unit();
                    content.save_state();
                    content.set_fill_rgb(r, g, b);
                    content.rect(
                        pt(*x),
                        self.flip(*y + *height),
                        pt(*width),
                        pt(*height),
                    );
                    content.fill_nonzero();
                    content.restore_state();
                }
                DrawOp::StrokeRect {
                    x,
                    y,
                    width,
                    height,
                    color,
                    line_width,
                } => {
                    let (r, g, b) = color.unit();
                    content.save_state();
                    content.set_stroke_rgb(r, g, b);
                    content.set_line_width(pt(*line_width));
                    content.rect(
                        pt(*x),
                        self.flip(*y + *height),
                        pt(*width),
                        pt(*height),
                    );
                    content.stroke();
                    content.restore_state();
                }
                DrawOp::Line {
                    from,
                    to,
                    color,
                    line_width,
                } => {
                    let (r, g, b) = color.unit();
                    content.save_state();
                    content.set_stroke_rgb(r, g, b);
                    content.set_line_width(pt(*line_width));
                    content.move_to(pt(from.0), self.flip(from.1));
                    content.line_to(pt(to.0), self.flip(to.1));
                    content.stroke();
                    content.restore_state();
                }
                DrawOp::Circle {
                    cx,
                    cy,
                    radius,
                    color,
                } => {
                    self.circle(&mut content, *cx, *cy, *radius, *color);
                }
                DrawOp::Text {
                    x,
                    y,
                    text,
                    font,
                    size,
                    color,
                } => {
                    let (r, g, b) = color.unit();
                    let bytes = metrics::encode_winansi(text);
                    content.save_state();
                    content.set_fill_rgb(r, g, b);
                    content
                        .begin_text()
                        .set_font(Name(font.resource_name()), *size)
                        .next_line(pt(*x), self.flip(*y))
                        .show(Str(&bytes))
                        .end_text();
                    content.restore_state();
                }
            }
        }
        content
    }

    fn circle(&self, content: &mut Content, cx: f32, cy: f32, radius: f32, color: Rgb) {
        let (x, y, r) = (pt(cx), self.flip(cy), pt(radius));
        let k = r * KAPPA;
        let (red, green, blue) = color.unit();
        content.save_state();
        content.set_fill_rgb(red, green, blue);
        content.move_to(x + r, y);
        content.cubic_to(x + r, y + k, x + k, y + r, x, y + r);
        content.cubic_to(x - k, y + r, x - r, y + k, x - r, y);
        content.cubic_to(x - r, y - k, x - k, y - r, x, y - r);
        content.cubic_to(x + k, y - r, x + r, y - k, x + r, y);
        content.close_path();
        content.fill_nonzero();
        content.restore_state();
    }

    /// Convert a top-down millimetre offset into a bottom-up PDF coordinate
    fn flip(&self, y: f32) -> f32 {
        (self.height - y) * PT_PER_MM
    }
}

fn pt(mm: f32) -> f32 {
    mm * PT_PER_MM
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::layout::{PAGE_HEIGHT, PAGE_WIDTH, PageBuilder, TextStyle};

    fn sample_document() -> ReportDocument {
        let mut page = PageBuilder::new();
        page.draw_section_header("Executive Summary");
        page.write_text("Plain (parenthesised) text \u{2022} with a bullet", TextStyle::BODY);
        page.circle(50.0, 50.0, 5.0, Rgb::SUCCESS);
        page.add_page();
        page.write_text("Second page", TextStyle::BODY);
        page.finish()
    }

    #[test]
    fn writes_a_pdf_with_every_page() {
        let backend = PdfBackend::new(PAGE_WIDTH, PAGE_HEIGHT).unwrap();
        let bytes = backend.render(&sample_document()).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Count 2"));
        assert!(text.contains("/Helvetica-Bold"));
        assert!(text.contains("WinAnsiEncoding"));
    }

    #[test]
    fn rejects_unusable_page_sizes() {
        assert!(matches!(
            PdfBackend::new(0.0, PAGE_HEIGHT),
            Err(ReportError::Backend(_))
        ));
        assert!(PdfBackend::new(f32::NAN, PAGE_HEIGHT).is_err());
    }

    #[test]
    fn rejects_mismatched_documents() {
        let backend = PdfBackend::new(216.0, 279.0).unwrap();
        assert!(backend.render(&sample_document()).is_err());
    }

    #[test]
    fn flips_to_bottom_up_coordinates() {
        let backend = PdfBackend::new(PAGE_WIDTH, PAGE_HEIGHT).unwrap();
        assert!((backend.flip(0.0) - PAGE_HEIGHT * PT_PER_MM).abs() < 1e-3);
        assert!(backend.flip(PAGE_HEIGHT).abs() < 1e-3);
    }
}

//! Helvetica metrics and WinAnsi encoding for the standard PDF fonts
//!
//! The report only uses the two non-embedded base fonts, so advance
//! widths come from the Adobe core font metrics rather than font files.

/// Millimetres per PDF point
pub const MM_PER_PT: f32 = 25.4 / 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    /// Resource name used in page content streams
    pub fn resource_name(self) -> &'static [u8] {
        match self {
            Font::Regular => b"F1",
            Font::Bold => b"F2",
        }
    }

    pub fn base_font(self) -> &'static [u8] {
        match self {
            Font::Regular => b"Helvetica",
            Font::Bold => b"Helvetica-Bold",
        }
    }

    fn ascii_widths(self) -> &'static [u16; 95] {
        match self {
            Font::Regular => &HELVETICA,
            Font::Bold => &HELVETICA_BOLD,
        }
    }

    /// Advance width in thousandths of the font size
    pub fn char_width(self, ch: char) -> u16 {
        let code = ch as u32;
        if (32..=126).contains(&code) {
            return self.ascii_widths()[(code - 32) as usize];
        }
        match ch {
            '\u{2022}' => 350,
            '\u{2026}' | '\u{2014}' => 1000,
            '\u{2013}' => 556,
            '\u{2018}' | '\u{2019}' => 222,
            '\u{201C}' | '\u{201D}' => 333,
            _ => 556,
        }
    }
}

// Printable ASCII, space (32) through tilde (126)
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Rendered width of `text` in millimetres
pub fn text_width(text: &str, font: Font, size_pt: f32) -> f32 {
    let units: u32 = text.chars().map(|ch| font.char_width(ch) as u32).sum();
    units as f32 / 1000.0 * size_pt * MM_PER_PT
}

/// Break `text` into lines no wider than `max_width` millimetres.
///
/// Explicit newlines always start a new line; words longer than the
/// available width are split between characters.
pub fn wrap_text(text: &str, font: Font, size_pt: f32, max_width: f32) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let trimmed = normalized.trim_matches('\n');
    if trimmed.trim().is_empty() {
        return Vec::new();
    }

    let space = text_width(" ", font, size_pt);
    let mut lines = Vec::new();

    for paragraph in trimmed.split('\n') {
        let mut line = String::new();
        let mut line_width = 0.0f32;

        for word in paragraph.split_whitespace() {
            let word_width = text_width(word, font, size_pt);

            if !line.is_empty() && line_width + space + word_width <= max_width {
                line.push(' ');
                line.push_str(word);
                line_width += space + word_width;
                continue;
            }

            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }

            if word_width <= max_width {
                line.push_str(word);
                line_width = word_width;
            } else {
                let mut pieces = split_word(word, font, size_pt, max_width);
                let last = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
                line_width = text_width(&last, font, size_pt);
                line = last;
            }
        }

        lines.push(line);
    }

    lines
}

fn split_word(word: &str, font: Font, size_pt: f32, max_width: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut width = 0.0f32;

    for ch in word.chars() {
        let ch_width = font.char_width(ch) as f32 / 1000.0 * size_pt * MM_PER_PT;
        if !current.is_empty() && width + ch_width > max_width {
            pieces.push(std::mem::take(&mut current));
            width = 0.0;
        }
        current.push(ch);
        width += ch_width;
    }

    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Encode text for a WinAnsi Type1 font; unmappable characters become `?`
pub fn encode_winansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            ' '..='~' => ch as u8,
            '\u{A0}'..='\u{FF}' => ch as u32 as u8,
            '\u{20AC}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            _ => b'?',
        })
        .collect()
}

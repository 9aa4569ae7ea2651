//! Page layout
//!
//! Flows a list of [`Block`]s onto A4 pages. Layout knows nothing about PDF:
//! it places text lines and rules in millimetres from the bottom-left corner,
//! which is what the PDF writer consumes. Text width is estimated from an
//! average glyph width, good enough for the builtin Helvetica faces.

use tracing::debug;

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 25.0;

const PT_TO_MM: f32 = 0.352_778;
const AVG_GLYPH_EM: f32 = 0.5;
const LINE_SPACING: f32 = 1.35;

/// Font face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Regular,
    Bold,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// RGB color with components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color(pub f32, pub f32, pub f32);

impl Color {
    pub const fn hex(rgb: u32) -> Self {
        Self(
            ((rgb >> 16) & 0xff) as f32 / 255.0,
            ((rgb >> 8) & 0xff) as f32 / 255.0,
            (rgb & 0xff) as f32 / 255.0,
        )
    }
}

/// How a text block is set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Font size in points
    pub size: f32,
    pub face: Face,
    pub align: Align,
    pub color: Color,
    pub indent_mm: f32,
    pub space_before_mm: f32,
    pub space_after_mm: f32,
}

impl TextStyle {
    pub const fn new(size: f32, face: Face, color: Color) -> Self {
        Self {
            size,
            face,
            align: Align::Left,
            color,
            indent_mm: 0.0,
            space_before_mm: 0.0,
            space_after_mm: 0.0,
        }
    }

    pub const fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }

    pub const fn indent(mut self, mm: f32) -> Self {
        self.indent_mm = mm;
        self
    }

    pub const fn spacing(mut self, before_mm: f32, after_mm: f32) -> Self {
        self.space_before_mm = before_mm;
        self.space_after_mm = after_mm;
        self
    }

    fn line_height_mm(&self) -> f32 {
        self.size * LINE_SPACING * PT_TO_MM
    }

    fn glyph_width_mm(&self) -> f32 {
        self.size * AVG_GLYPH_EM * PT_TO_MM
    }
}

/// One unit of document content
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Wrapped text; embedded newlines start new lines
    Text { text: String, style: TextStyle },
    /// Horizontal rule across the text width
    Rule { color: Color, thickness_pt: f32, space_after_mm: f32 },
    /// Vertical space
    Space(f32),
    PageBreak,
}

impl Block {
    pub fn text(text: impl Into<String>, style: TextStyle) -> Self {
        Block::Text {
            text: text.into(),
            style,
        }
    }
}

/// Something placed on a page
#[derive(Debug, Clone, PartialEq)]
pub enum Mark {
    /// A single line of text; `y_mm` is the baseline
    Text {
        x_mm: f32,
        y_mm: f32,
        size: f32,
        face: Face,
        color: Color,
        text: String,
    },
    Line {
        x1_mm: f32,
        x2_mm: f32,
        y_mm: f32,
        color: Color,
        thickness_pt: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub marks: Vec<Mark>,
}

impl Page {
    /// Text of all lines on the page, in placement order
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.marks.iter().filter_map(|m| match m {
            Mark::Text { text, .. } => Some(text.as_str()),
            Mark::Line { .. } => None,
        })
    }
}

/// Greedy word wrap to at most `max_chars` characters per line
///
/// Words longer than a line are split. Blank input yields one empty line so
/// a paragraph always takes up space.
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_len = 0usize;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            while word.len() > max_chars {
                if line_len > 0 {
                    lines.push(std::mem::take(&mut line));
                    line_len = 0;
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let needed = if line_len == 0 { word.len() } else { line_len + 1 + word.len() };
            if needed > max_chars && line_len > 0 {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            if line_len > 0 {
                line.push(' ');
                line_len += 1;
            }
            line.extend(word.iter());
            line_len += word.len();
        }

        lines.push(line);
    }

    lines
}

struct Cursor {
    pages: Vec<Page>,
    y_mm: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y_mm: PAGE_HEIGHT_MM - MARGIN_MM,
        }
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y_mm = PAGE_HEIGHT_MM - MARGIN_MM;
    }

    fn page(&mut self) -> &mut Page {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn at_top(&self) -> bool {
        (self.y_mm - (PAGE_HEIGHT_MM - MARGIN_MM)).abs() < f32::EPSILON
    }

    /// Move down by `mm`, breaking the page when it doesn't fit
    fn advance(&mut self, mm: f32) {
        if self.y_mm - mm < MARGIN_MM {
            self.new_page();
        }
        self.y_mm -= mm;
    }

    fn skip(&mut self, mm: f32) {
        if self.at_top() {
            return;
        }
        self.y_mm = (self.y_mm - mm).max(MARGIN_MM);
    }
}

/// Lay out blocks on A4 pages
///
/// Always returns at least one page.
pub fn layout(blocks: &[Block]) -> Vec<Page> {
    debug!(block_count = blocks.len(), "layout: called");
    let text_width = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
    let mut cursor = Cursor::new();

    for block in blocks {
        match block {
            Block::Text { text, style } => {
                cursor.skip(style.space_before_mm);
                let width = text_width - style.indent_mm;
                let max_chars = (width / style.glyph_width_mm()).floor() as usize;
                for line in wrap(text, max_chars) {
                    cursor.advance(style.line_height_mm());
                    let x_mm = match style.align {
                        Align::Left => MARGIN_MM + style.indent_mm,
                        Align::Center => {
                            let estimated = line.chars().count() as f32 * style.glyph_width_mm();
                            MARGIN_MM + ((text_width - estimated) / 2.0).max(0.0)
                        }
                    };
                    let y_mm = cursor.y_mm;
                    cursor.page().marks.push(Mark::Text {
                        x_mm,
                        y_mm,
                        size: style.size,
                        face: style.face,
                        color: style.color,
                        text: line,
                    });
                }
                cursor.skip(style.space_after_mm);
            }
            Block::Rule {
                color,
                thickness_pt,
                space_after_mm,
            } => {
                cursor.advance(2.0);
                let y_mm = cursor.y_mm;
                cursor.page().marks.push(Mark::Line {
                    x1_mm: MARGIN_MM,
                    x2_mm: PAGE_WIDTH_MM - MARGIN_MM,
                    y_mm,
                    color: *color,
                    thickness_pt: *thickness_pt,
                });
                cursor.skip(*space_after_mm);
            }
            Block::Space(mm) => cursor.skip(*mm),
            Block::PageBreak => {
                if !cursor.at_top() {
                    cursor.new_page();
                }
            }
        }
    }

    debug!(page_count = cursor.pages.len(), "layout: done");
    cursor.pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BODY: TextStyle = TextStyle::new(11.0, Face::Regular, Color(0.0, 0.0, 0.0));

    #[test]
    fn test_wrap_greedy() {
        assert_eq!(wrap("een twee drie vier", 9), vec!["een twee", "drie vier"]);
        assert_eq!(wrap("een", 80), vec!["een"]);
    }

    #[test]
    fn test_wrap_newlines_and_blank() {
        assert_eq!(wrap("a\nb", 80), vec!["a", "b"]);
        assert_eq!(wrap("", 80), vec![""]);
    }

    #[test]
    fn test_wrap_splits_long_words() {
        assert_eq!(wrap("ab abcdefgh", 3), vec!["ab", "abc", "def", "gh"]);
    }

    #[test]
    fn test_wrap_counts_chars_not_bytes() {
        assert_eq!(wrap("één één", 3), vec!["één", "één"]);
    }

    #[test]
    fn test_layout_stays_in_margins() {
        let blocks: Vec<Block> = (0..200).map(|i| Block::text(format!("Regel {}", i), BODY)).collect();
        let pages = layout(&blocks);
        assert!(pages.len() > 1);
        for page in &pages {
            for mark in &page.marks {
                if let Mark::Text { y_mm, x_mm, .. } = mark {
                    assert!(*y_mm >= MARGIN_MM);
                    assert!(*y_mm <= PAGE_HEIGHT_MM - MARGIN_MM);
                    assert!(*x_mm >= MARGIN_MM);
                }
            }
        }
        let total: usize = pages.iter().map(|p| p.lines().count()).sum();
        assert_eq!(total, 200);
    }

    #[test]
    fn test_page_break() {
        let blocks = vec![
            Block::text("Eerste", BODY),
            Block::PageBreak,
            Block::PageBreak,
            Block::text("Tweede", BODY),
        ];
        let pages = layout(&blocks);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].lines().collect::<Vec<_>>(), vec!["Tweede"]);
    }

    #[test]
    fn test_empty_layout_has_one_page() {
        assert_eq!(layout(&[]).len(), 1);
    }

    proptest! {
        #[test]
        fn prop_wrap_keeps_words_within_width(
            words in proptest::collection::vec("[a-zé]{1,12}", 0..40),
            max_chars in 4usize..60,
        ) {
            let text = words.join(" ");
            let lines = wrap(&text, max_chars);
            for line in &lines {
                prop_assert!(line.chars().count() <= max_chars);
            }
            let rejoined: String = lines.concat();
            let original: String = words.concat();
            prop_assert_eq!(rejoined.replace(' ', ""), original);
        }
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(Color::hex(0xff0000), Color(1.0, 0.0, 0.0));
    }
}

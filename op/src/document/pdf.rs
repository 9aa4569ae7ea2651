//! PDF writer
//!
//! Draws laid-out pages with printpdf using the builtin Helvetica faces.

use printpdf::{
    BuiltinFont, Color as PdfColor, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Rgb,
};
use tracing::debug;

use super::DocumentError;
use super::layout::{Color, Face, Mark, PAGE_HEIGHT_MM, PAGE_WIDTH_MM, Page};

const LAYER: &str = "Inhoud";

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl Fonts {
    fn get(&self, face: Face) -> &IndirectFontRef {
        match face {
            Face::Regular => &self.regular,
            Face::Bold => &self.bold,
            Face::Italic => &self.italic,
        }
    }
}

fn pdf_color(color: Color) -> PdfColor {
    PdfColor::Rgb(Rgb::new(color.0, color.1, color.2, None))
}

/// Render pages to PDF bytes
pub fn write_pdf(title: &str, pages: &[Page]) -> Result<Vec<u8>, DocumentError> {
    debug!(%title, page_count = pages.len(), "write_pdf: called");
    let (doc, first_page, first_layer) = PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER);

    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold)?,
        italic: doc.add_builtin_font(BuiltinFont::HelveticaOblique)?,
    };

    for (index, page) in pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_ref, layer_ref) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER);
            doc.get_page(page_ref).get_layer(layer_ref)
        };
        draw_page(&layer, page, &fonts);
    }

    Ok(doc.save_to_bytes()?)
}

fn draw_page(layer: &PdfLayerReference, page: &Page, fonts: &Fonts) {
    for mark in &page.marks {
        match mark {
            Mark::Text {
                x_mm,
                y_mm,
                size,
                face,
                color,
                text,
            } => {
                if text.is_empty() {
                    continue;
                }
                layer.set_fill_color(pdf_color(*color));
                layer.use_text(text.as_str(), *size, Mm(*x_mm), Mm(*y_mm), fonts.get(*face));
            }
            Mark::Line {
                x1_mm,
                x2_mm,
                y_mm,
                color,
                thickness_pt,
            } => {
                layer.set_outline_color(pdf_color(*color));
                layer.set_outline_thickness(*thickness_pt);
                layer.add_line(Line {
                    points: vec![
                        (Point::new(Mm(*x1_mm), Mm(*y_mm)), false),
                        (Point::new(Mm(*x2_mm), Mm(*y_mm)), false),
                    ],
                    is_closed: false,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::layout::{Block, TextStyle, layout};

    #[test]
    fn test_write_pdf_bytes() {
        let style = TextStyle::new(11.0, Face::Bold, Color(0.0, 0.0, 0.0));
        let blocks = vec![
            Block::text("Titel", style),
            Block::Rule {
                color: Color(0.5, 0.5, 0.5),
                thickness_pt: 1.0,
                space_after_mm: 2.0,
            },
            Block::PageBreak,
            Block::text("Tweede pagina", style),
        ];
        let bytes = write_pdf("Test", &layout(&blocks)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}

//! PDF renderer: built-in Helvetica faces on A4, greedy wrapping from the static width
//! tables, automatic page breaks.

use printpdf::{
    BuiltinFont, Color as PdfColor, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Pt, Rgb,
};

use super::document::{Block, Color, ResumeDocument, Template};
use super::metrics::{metrics, wrap_text, Face};
use super::RenderError;

const PAGE_WIDTH_PT: f32 = 595.28;
const PAGE_HEIGHT_PT: f32 = 841.89;
const MARGIN_X_PT: f32 = 72.0;
const MARGIN_TOP_PT: f32 = 72.0;
const MARGIN_BOTTOM_PT: f32 = 36.0;
const TEXT_WIDTH_PT: f32 = PAGE_WIDTH_PT - 2.0 * MARGIN_X_PT;
const BULLET_INDENT_PT: f32 = 12.0;
const BULLET_TEXT_INDENT_PT: f32 = 24.0;
const LEADING: f32 = 1.3;

const BLACK: Color = Color::new(0x11, 0x18, 0x27);
const MUTED: Color = Color::new(0x4b, 0x55, 0x63);

struct Sizes {
    title: f32,
    heading: f32,
    body: f32,
}

impl Sizes {
    fn for_template(template: Template) -> Self {
        Self {
            title: if template == Template::Modern { 24.0 } else { 22.0 },
            heading: match template {
                Template::Modern | Template::Professional => 16.0,
                _ => 15.0,
            },
            body: if template == Template::Modern { 11.0 } else { 10.5 },
        }
    }
}

pub fn render_pdf(document: &ResumeDocument) -> Result<Vec<u8>, RenderError> {
    let (doc, _pages) = write_document(document)?;
    doc.save_to_bytes()
        .map_err(|e| RenderError::Pdf(e.to_string()))
}

/// Lays the document out and returns it with its page count.
fn write_document(document: &ResumeDocument) -> Result<(PdfDocumentReference, usize), RenderError> {
    let sizes = Sizes::for_template(document.theme.template);
    let accent = document.theme.accent;
    let mut writer = PdfWriter::new(&pdf_text(&document.title))?;

    writer.centered(&document.title, Face::Bold, sizes.title, accent);
    if !document.contact.is_empty() {
        writer.gap(4.0);
        writer.centered(&document.contact.join(" | "), Face::Regular, sizes.body, MUTED);
    }

    for section in &document.sections {
        writer.gap(sizes.heading * 0.9);
        writer.paragraph(&section.heading, Face::Bold, sizes.heading, accent, 0.0);
        writer.gap(2.0);

        for block in &section.blocks {
            match block {
                Block::Subheading(text) => {
                    writer.gap(4.0);
                    writer.paragraph(text, Face::Bold, sizes.body, BLACK, 0.0);
                }
                Block::Meta(text) => {
                    writer.paragraph(text, Face::Regular, sizes.body - 1.0, MUTED, 0.0);
                }
                Block::Paragraph(text) => {
                    writer.paragraph(text, Face::Regular, sizes.body, BLACK, 0.0);
                }
                Block::Bullet(text) => writer.bullet(text, sizes.body),
            }
        }
    }

    let pages = writer.pages;
    Ok((writer.doc, pages))
}

struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// Baseline of the last written line, in points from the page bottom.
    y: f32,
    pages: usize,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self, RenderError> {
        let (doc, page, layer) = PdfDocument::new(
            title,
            Mm::from(Pt(PAGE_WIDTH_PT)),
            Mm::from(Pt(PAGE_HEIGHT_PT)),
            "Layer 1",
        );
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT_PT - MARGIN_TOP_PT,
            pages: 1,
        })
    }

    fn gap(&mut self, points: f32) {
        self.y -= points;
    }

    /// Moves to the next baseline, starting a new page when the line would not fit.
    fn advance(&mut self, line_height: f32) {
        if self.y - line_height < MARGIN_BOTTOM_PT {
            let (page, layer) = self.doc.add_page(
                Mm::from(Pt(PAGE_WIDTH_PT)),
                Mm::from(Pt(PAGE_HEIGHT_PT)),
                format!("Layer {}", self.pages + 1),
            );
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.pages += 1;
            self.y = PAGE_HEIGHT_PT - MARGIN_TOP_PT;
        }
        self.y -= line_height;
    }

    fn draw(&self, text: &str, face: Face, size: f32, color: Color, x: f32) {
        let font = match face {
            Face::Regular => &self.regular,
            Face::Bold => &self.bold,
        };
        let (r, g, b) = color.unit_rgb();
        self.layer
            .set_fill_color(PdfColor::Rgb(Rgb::new(r, g, b, None)));
        self.layer.use_text(
            text,
            size,
            Mm::from(Pt(x)),
            Mm::from(Pt(self.y)),
            font,
        );
    }

    fn paragraph(&mut self, text: &str, face: Face, size: f32, color: Color, indent: f32) {
        let text = pdf_text(text);
        for line in wrap_text(&text, face, size, TEXT_WIDTH_PT - indent) {
            self.advance(size * LEADING);
            self.draw(&line, face, size, color, MARGIN_X_PT + indent);
        }
    }

    fn bullet(&mut self, text: &str, size: f32) {
        let text = pdf_text(text);
        let lines = wrap_text(&text, Face::Regular, size, TEXT_WIDTH_PT - BULLET_TEXT_INDENT_PT);
        for (i, line) in lines.iter().enumerate() {
            self.advance(size * LEADING);
            if i == 0 {
                self.draw("-", Face::Regular, size, BLACK, MARGIN_X_PT + BULLET_INDENT_PT);
            }
            self.draw(line, Face::Regular, size, BLACK, MARGIN_X_PT + BULLET_TEXT_INDENT_PT);
        }
        self.gap(size * 0.3);
    }

    fn centered(&mut self, text: &str, face: Face, size: f32, color: Color) {
        let text = pdf_text(text);
        for line in wrap_text(&text, face, size, TEXT_WIDTH_PT) {
            let width = metrics(face).width_pt(&line, size);
            self.advance(size * LEADING);
            self.draw(&line, face, size, color, (PAGE_WIDTH_PT - width) / 2.0);
        }
    }
}

/// Folds typographic punctuation to ASCII and replaces characters the built-in
/// fonts' Latin-1 range cannot show.
fn pdf_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' | '\u{2022}' => '-',
            '\u{2026}' => '.',
            '\t' => ' ',
            c if c == '\n' || (' '..='~').contains(&c) || ('\u{A0}'..='\u{FF}').contains(&c) => c,
            _ => '?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{ExperienceEntry, PersonalInfo, ResumeData};

    fn document(descriptions: usize) -> ResumeDocument {
        let data = ResumeData {
            personal_info: PersonalInfo {
                full_name: "Ada Lovelace".into(),
                email: "ada@example.com".into(),
                summary: "Analyst of engines.".into(),
                ..Default::default()
            },
            experience: (0..descriptions)
                .map(|i| ExperienceEntry {
                    title: format!("Engineer {i}"),
                    company: "Acme".into(),
                    description: "Designed and shipped parsers, compilers and linters for \
                                  an analytical engine used across the company."
                        .into(),
                    ..Default::default()
                })
                .collect(),
            skills: "Rust, Go".into(),
            projects: "A compiler\n\nA linter".into(),
            ..Default::default()
        };
        ResumeDocument::from_resume(&data)
    }

    #[test]
    fn test_renders_pdf_bytes() {
        let bytes = render_pdf(&document(2)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_short_document_fits_one_page() {
        let (_, pages) = write_document(&document(2)).unwrap();
        assert_eq!(pages, 1);
    }

    #[test]
    fn test_long_document_breaks_pages() {
        let (_, pages) = write_document(&document(60)).unwrap();
        assert!(pages > 1, "expected several pages, got {pages}");
    }

    #[test]
    fn test_pdf_text_folds_typography() {
        assert_eq!(pdf_text("Ada’s “engine” – café • 日本"), "Ada's \"engine\" - café - ??");
    }
}

use std::io::Cursor;

use docx_rs::{AlignmentType, Docx, Paragraph, Run};

use super::document::{Block, ResumeDocument};
use super::RenderError;

// Run sizes are in half-points.
const TITLE_SIZE: usize = 40;
const HEADING_SIZE: usize = 28;
const SUBHEADING_SIZE: usize = 24;
const BODY_SIZE: usize = 22;
const META_SIZE: usize = 20;
const MUTED_HEX: &str = "4b5563";

pub fn render_docx(document: &ResumeDocument) -> Result<Vec<u8>, RenderError> {
    let accent = document.theme.accent.hex();

    let mut docx = Docx::new().add_paragraph(
        Paragraph::new()
            .align(AlignmentType::Center)
            .add_run(
                Run::new()
                    .add_text(&document.title)
                    .bold()
                    .size(TITLE_SIZE)
                    .color(&accent),
            ),
    );

    if !document.contact.is_empty() {
        docx = docx.add_paragraph(
            Paragraph::new().align(AlignmentType::Center).add_run(
                Run::new()
                    .add_text(document.contact.join(" • "))
                    .size(BODY_SIZE)
                    .color(MUTED_HEX),
            ),
        );
    }

    for section in &document.sections {
        docx = docx
            .add_paragraph(Paragraph::new())
            .add_paragraph(
                Paragraph::new().add_run(
                    Run::new()
                        .add_text(&section.heading)
                        .bold()
                        .size(HEADING_SIZE)
                        .color(&accent),
                ),
            );

        for block in &section.blocks {
            docx = docx.add_paragraph(block_paragraph(block));
        }
    }

    let mut buffer = Vec::new();
    docx.build()
        .pack(Cursor::new(&mut buffer))
        .map_err(|e| RenderError::Docx(e.to_string()))?;
    Ok(buffer)
}

fn block_paragraph(block: &Block) -> Paragraph {
    match block {
        Block::Subheading(text) => Paragraph::new().add_run(
            Run::new()
                .add_text(text)
                .bold()
                .size(SUBHEADING_SIZE),
        ),
        Block::Meta(text) => Paragraph::new().add_run(
            Run::new()
                .add_text(text)
                .italic()
                .size(META_SIZE)
                .color(MUTED_HEX),
        ),
        Block::Paragraph(text) => {
            Paragraph::new().add_run(Run::new().add_text(text).size(BODY_SIZE))
        }
        Block::Bullet(text) => Paragraph::new()
            .add_run(Run::new().add_text(format!("• {text}")).size(BODY_SIZE)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{PersonalInfo, ResumeData};

    #[test]
    fn test_renders_zip_container() {
        let data = ResumeData {
            personal_info: PersonalInfo {
                full_name: "Ada Lovelace".into(),
                email: "ada@example.com".into(),
                summary: "Analyst of engines.".into(),
                ..Default::default()
            },
            skills: "Rust, Go".into(),
            projects: "A compiler\n\nA linter".into(),
            ..Default::default()
        };
        let bytes = render_docx(&ResumeDocument::from_resume(&data)).unwrap();
        // DOCX is a zip archive.
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_empty_document_still_renders() {
        let bytes = render_docx(&ResumeDocument::from_resume(&ResumeData::default())).unwrap();
        assert!(!bytes.is_empty());
    }
}

// Document Assembler: ResumeData → ResumeDocument → DOCX or PDF bytes.

pub mod document;
pub mod docx;
pub mod handlers;
pub mod metrics;
pub mod pdf;

use thiserror::Error;

use crate::errors::AppError;
use document::Theme;

pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF rendering failed: {0}")]
    Pdf(String),

    #[error("DOCX rendering failed: {0}")]
    Docx(String),
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        AppError::Render(err.to_string())
    }
}

/// `resume_<template>[_<color>].docx`
pub fn docx_filename(theme: &Theme) -> String {
    let mut name = format!("resume_{}", theme.template.name());
    if theme.custom_color {
        name.push('_');
        name.push_str(&theme.accent.hex());
    }
    name.push_str(".docx");
    name
}

/// `<full name>.pdf`, restricted to characters that are safe in a header value.
pub fn pdf_filename(full_name: &str) -> String {
    let stem: String = full_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = stem.trim_matches(|c: char| c == '.' || c == ' ');
    if stem.is_empty() {
        "Resume.pdf".to_string()
    } else {
        format!("{stem}.pdf")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::ResumeData;

    #[test]
    fn test_docx_filename_includes_custom_color_only() {
        let mut data = ResumeData {
            template: Some("elegant".into()),
            ..Default::default()
        };
        assert_eq!(docx_filename(&Theme::from_resume(&data)), "resume_elegant.docx");

        data.color = Some("#1E40AF".into());
        assert_eq!(
            docx_filename(&Theme::from_resume(&data)),
            "resume_elegant_1e40af.docx"
        );
    }

    #[test]
    fn test_pdf_filename_is_header_safe() {
        assert_eq!(pdf_filename("Ada Lovelace"), "Ada Lovelace.pdf");
        assert_eq!(pdf_filename("  "), "Resume.pdf");
        assert_eq!(pdf_filename("Zoë \"Z\" O'Neil"), "Zo_ _Z_ O_Neil.pdf");
    }
}

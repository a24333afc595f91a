//! Document Assembler — turns a `ResumeData` payload into a format-neutral
//! `ResumeDocument` that exactly one renderer (DOCX or PDF) consumes.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::resume::{EducationEntry, ExperienceEntry, ResumeData};

const BULLET_MARKERS: &[char] = &['-', '•', '*'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    Modern,
    Professional,
    Minimal,
    Elegant,
}

impl Template {
    /// Unknown or missing names fall back to `Modern`.
    pub fn parse(name: Option<&str>) -> Self {
        match name.map(|n| n.trim().to_lowercase()).as_deref() {
            Some("professional") => Template::Professional,
            Some("minimal") => Template::Minimal,
            Some("elegant") => Template::Elegant,
            _ => Template::Modern,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Template::Modern => "modern",
            Template::Professional => "professional",
            Template::Minimal => "minimal",
            Template::Elegant => "elegant",
        }
    }

    fn default_accent(self) -> Color {
        match self {
            Template::Modern => Color::new(0x1e, 0x40, 0xaf),
            Template::Professional => Color::new(0x03, 0x69, 0xa1),
            Template::Minimal => Color::new(0x1f, 0x29, 0x37),
            Template::Elegant => Color::new(0x5b, 0x21, 0xb6),
        }
    }

    fn experience_heading(self) -> &'static str {
        match self {
            Template::Professional => "Professional Experience",
            _ => "Work Experience",
        }
    }

    fn education_heading(self) -> &'static str {
        match self {
            Template::Modern | Template::Professional => "Education",
            _ => "Academic Background",
        }
    }

    fn skills_heading(self) -> &'static str {
        match self {
            Template::Professional => "Core Competencies",
            _ => "Skills",
        }
    }

    fn projects_heading(self) -> &'static str {
        match self {
            Template::Professional | Template::Minimal => "Key Projects",
            _ => "Projects",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` (the leading `#` is optional).
    pub fn parse_hex(value: &str) -> Option<Self> {
        let hex = value.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Lower-case hex without `#`, as docx and filenames want it.
    pub fn hex(self) -> String {
        format!("{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn unit_rgb(self) -> (f32, f32, f32) {
        (
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub template: Template,
    pub accent: Color,
    /// Set when a valid custom color overrode the template accent.
    pub custom_color: bool,
}

impl Theme {
    pub fn from_resume(data: &ResumeData) -> Self {
        let template = Template::parse(data.template.as_deref());
        match data.color.as_deref().and_then(Color::parse_hex) {
            Some(accent) => Self {
                template,
                accent,
                custom_color: true,
            },
            None => Self {
                template,
                accent: template.default_accent(),
                custom_color: false,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Entry title line, e.g. "Engineer at Acme".
    Subheading(String),
    /// Dates / GPA line under a subheading.
    Meta(String),
    Paragraph(String),
    Bullet(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSection {
    pub heading: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone)]
pub struct ResumeDocument {
    pub title: String,
    pub contact: Vec<String>,
    pub theme: Theme,
    pub sections: Vec<DocumentSection>,
}

impl ResumeDocument {
    pub fn from_resume(data: &ResumeData) -> Self {
        let theme = Theme::from_resume(data);
        let template = theme.template;
        let personal = &data.personal_info;

        let title = non_blank(&personal.full_name).unwrap_or("Resume").to_string();
        let contact = [
            &personal.email,
            &personal.phone,
            &personal.location,
            &personal.linkedin,
            &personal.github,
        ]
        .into_iter()
        .filter_map(|field| non_blank(field))
        .map(str::to_string)
        .collect();

        let mut sections = Vec::new();

        if let Some(summary) = non_blank(&personal.summary) {
            sections.push(DocumentSection {
                heading: "Professional Summary".to_string(),
                blocks: text_blocks(summary),
            });
        }

        let experience: Vec<Block> = data.experience.iter().flat_map(experience_blocks).collect();
        if !experience.is_empty() {
            sections.push(DocumentSection {
                heading: template.experience_heading().to_string(),
                blocks: experience,
            });
        }

        let education: Vec<Block> = data.education.iter().flat_map(education_blocks).collect();
        if !education.is_empty() {
            sections.push(DocumentSection {
                heading: template.education_heading().to_string(),
                blocks: education,
            });
        }

        if let Some(skills) = non_blank(&data.skills) {
            sections.push(DocumentSection {
                heading: template.skills_heading().to_string(),
                blocks: vec![Block::Paragraph(skills.to_string())],
            });
        }

        let projects = split_projects(&data.projects);
        if !projects.is_empty() {
            sections.push(DocumentSection {
                heading: template.projects_heading().to_string(),
                blocks: projects.into_iter().map(Block::Bullet).collect(),
            });
        }

        Self {
            title,
            contact,
            theme,
            sections,
        }
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Lines opening with a bullet marker become bullets; other lines are paragraphs.
fn text_blocks(text: &str) -> Vec<Block> {
    text.lines()
        .filter_map(non_blank)
        .map(|line| match line.strip_prefix(BULLET_MARKERS) {
            Some(rest) => Block::Bullet(rest.trim().to_string()),
            None => Block::Paragraph(line.to_string()),
        })
        .collect()
}

fn experience_blocks(entry: &ExperienceEntry) -> Vec<Block> {
    let title = non_blank(&entry.title);
    let company = non_blank(&entry.company);
    let heading = match (title, company) {
        (Some(t), Some(c)) => format!("{t} at {c}"),
        (Some(only), None) | (None, Some(only)) => only.to_string(),
        (None, None) => return Vec::new(),
    };

    let mut blocks = vec![Block::Subheading(heading)];
    let start = non_blank(&entry.start_date);
    let end = if entry.current {
        Some("Present")
    } else {
        non_blank(&entry.end_date)
    };
    let dates = match (start, end) {
        (Some(s), Some(e)) => Some(format!("{s} - {e}")),
        (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
        (None, None) => None,
    };
    blocks.extend(dates.map(Block::Meta));
    blocks.extend(text_blocks(&entry.description));
    blocks
}

fn education_blocks(entry: &EducationEntry) -> Vec<Block> {
    let degree = non_blank(&entry.degree);
    let school = non_blank(&entry.school);
    if degree.is_none() && school.is_none() {
        return Vec::new();
    }

    let mut heading = degree.unwrap_or("Degree").to_string();
    if let Some(field) = non_blank(&entry.field) {
        heading.push_str(&format!(" in {field}"));
    }
    if let Some(school) = school {
        heading.push_str(&format!(" from {school}"));
    }

    let mut blocks = vec![Block::Subheading(heading)];
    let mut meta = Vec::new();
    if let Some(date) = non_blank(&entry.graduation_date) {
        meta.push(format!("Graduated: {date}"));
    }
    if let Some(gpa) = non_blank(&entry.gpa) {
        meta.push(format!("GPA: {gpa}"));
    }
    if !meta.is_empty() {
        blocks.push(Block::Meta(meta.join(" • ")));
    }
    blocks.extend(text_blocks(&entry.description));
    blocks
}

/// Splits free-form projects text into one entry per project: on blank lines, or on
/// single lines (bullet markers removed) when there is at most one blank-line entry.
pub fn split_projects(text: &str) -> Vec<String> {
    static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n+").unwrap());
    static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[-•*]?\s*").unwrap());

    let text = text.replace("\r\n", "\n");
    let entries: Vec<&str> = BLANK_LINES
        .split(&text)
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .collect();

    let entries = if entries.len() <= 1 {
        LINE_BREAK
            .split(&text)
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .collect()
    } else {
        entries
    };

    entries
        .into_iter()
        .map(|entry| {
            let entry = entry.trim_start_matches(BULLET_MARKERS).trim();
            entry.split_whitespace().collect::<Vec<_>>().join(" ")
        })
        .filter(|entry| !entry.is_empty())
        .collect()
}

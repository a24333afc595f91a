//! Section Registry — immutable table of per-section prompt instructions and limits.
//!
//! Built once at startup and shared as `Arc<SectionRegistry>`; never mutated afterwards.

use std::collections::HashMap;

use serde::Serialize;

use crate::enhancement::EnhanceError;

/// Fallback cap for sections without an explicit one.
const DEFAULT_WORD_CAP: usize = 150;

/// How the sanitized output of a section is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputShape {
    /// Free prose; sentence capitalization only.
    Paragraph,
    /// Comma-separated list whose entries must match the user's input (skills).
    List,
    /// Blank-line-separated entries (projects).
    MultiEntry,
}

/// Target word range stated in the prompt. Distinct from the hard cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WordRange {
    pub min: usize,
    pub max: usize,
    /// Range applies per entry rather than to the whole section.
    pub per_entry: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionSpec {
    pub id: &'static str,
    /// Human-facing name, used for prefix stripping ("Experience:" / "EXPERIENCE:").
    pub title: &'static str,
    pub instructions: &'static str,
    pub word_range: Option<WordRange>,
    pub word_cap: usize,
    pub shape: OutputShape,
}

/// Case-insensitive lookup table over all known sections.
#[derive(Debug, Clone)]
pub struct SectionRegistry {
    order: Vec<&'static str>,
    specs: HashMap<&'static str, SectionSpec>,
}

impl SectionRegistry {
    pub fn new(specs: Vec<SectionSpec>) -> Self {
        let order = specs.iter().map(|s| s.id).collect();
        let specs = specs.into_iter().map(|s| (s.id, s)).collect();
        Self { order, specs }
    }

    /// The registry of resume sections the service knows how to enhance.
    pub fn standard() -> Self {
        Self::new(vec![
            SectionSpec {
                id: "summary",
                title: "Summary",
                instructions: SUMMARY_INSTRUCTIONS,
                word_range: Some(WordRange { min: 50, max: 70, per_entry: false }),
                word_cap: 100,
                shape: OutputShape::Paragraph,
            },
            SectionSpec {
                id: "experience",
                title: "Experience",
                instructions: EXPERIENCE_INSTRUCTIONS,
                word_range: Some(WordRange { min: 70, max: 120, per_entry: false }),
                word_cap: 140,
                shape: OutputShape::Paragraph,
            },
            SectionSpec {
                id: "skills",
                title: "Skills",
                instructions: SKILLS_INSTRUCTIONS,
                word_range: None,
                word_cap: 200,
                shape: OutputShape::List,
            },
            SectionSpec {
                id: "education",
                title: "Education",
                instructions: EDUCATION_INSTRUCTIONS,
                word_range: Some(WordRange { min: 50, max: 100, per_entry: false }),
                word_cap: 120,
                shape: OutputShape::Paragraph,
            },
            SectionSpec {
                id: "projects",
                title: "Projects",
                instructions: PROJECTS_INSTRUCTIONS,
                word_range: Some(WordRange { min: 30, max: 60, per_entry: true }),
                word_cap: 200,
                shape: OutputShape::MultiEntry,
            },
            SectionSpec {
                id: "certifications",
                title: "Certifications",
                instructions: CERTIFICATIONS_INSTRUCTIONS,
                word_range: Some(WordRange { min: 30, max: 60, per_entry: false }),
                word_cap: DEFAULT_WORD_CAP,
                shape: OutputShape::Paragraph,
            },
            SectionSpec {
                id: "achievements",
                title: "Achievements",
                instructions: ACHIEVEMENTS_INSTRUCTIONS,
                word_range: Some(WordRange { min: 40, max: 80, per_entry: false }),
                word_cap: DEFAULT_WORD_CAP,
                shape: OutputShape::Paragraph,
            },
            SectionSpec {
                id: "hobbies",
                title: "Hobbies",
                instructions: HOBBIES_INSTRUCTIONS,
                word_range: Some(WordRange { min: 20, max: 40, per_entry: false }),
                word_cap: DEFAULT_WORD_CAP,
                shape: OutputShape::Paragraph,
            },
        ])
    }

    /// Looks up a section by id, ignoring case and surrounding whitespace.
    pub fn lookup(&self, section_id: &str) -> Result<&SectionSpec, EnhanceError> {
        let key = section_id.trim().to_lowercase();
        self.specs
            .get(key.as_str())
            .ok_or_else(|| EnhanceError::UnknownSection(section_id.to_string()))
    }

    /// Section ids in canonical resume order.
    pub fn ids(&self) -> &[&'static str] {
        &self.order
    }
}

impl Default for SectionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Section instructions
// ────────────────────────────────────────────────────────────────────────────

const SUMMARY_INSTRUCTIONS: &str = "\
Role: Expert Resume Consultant
Objective: Craft a highly professional, targeted resume summary.
Instruction 1: Write 2-4 concise sentences.
Instruction 2: Start with the professional title and years of relevant experience when the input states them.
Instruction 3: Highlight top skills, key strengths, career goals and 1-2 measurable achievements if the input provides them.
Instruction 4: Use strong, varied professional adjectives while keeping a factual tone.
Instruction 5: Return only the single best, polished version.";

const EXPERIENCE_INSTRUCTIONS: &str = "\
Role: Expert Resume Consultant
Objective: Enhance the work experience description.
Instruction 1: Use 3-5 bullet points per role; start each bullet with a strong action verb (e.g. Managed, Led, Improved).
Instruction 2: Emphasize measurable outcomes and transferable skills that the input supports.
Instruction 3: Use ATS-friendly plain-text bullets (dash or •); avoid +, * or markdown symbols.
Instruction 4: Return only the single best version.";

const SKILLS_INSTRUCTIONS: &str = "\
Role: Expert Resume Consultant
Objective: Fix spelling and capitalization in the skills list.
Instruction 1: Keep ALL skills exactly as provided by the user.
Instruction 2: Use proper capitalization for technology names (e.g. 'JavaScript', 'React', 'Node.js').
Instruction 3: Do NOT add, remove, reorder, group or categorize skills.
Instruction 4: Return a simple comma-separated list.";

const EDUCATION_INSTRUCTIONS: &str = "\
Role: Expert Resume Consultant
Objective: Improve the education description.
Instruction 1: Clearly present degree, institution, dates, certifications and relevant coursework that the input mentions.
Instruction 2: Focus on what supports career goals; concise and factual sentences.
Instruction 3: Return only the single best version.";

const PROJECTS_INSTRUCTIONS: &str = "\
Role: Expert Resume Consultant
Objective: Enhance the projects section with proper formatting and corrections.
Instruction 1: Preserve every project in the input; do NOT combine projects or add new ones.
Instruction 2: Highlight scope, technologies, contributions and results for each project.
Instruction 3: Capitalize the first letter of each sentence and proper nouns.
Instruction 4: Separate projects with a single blank line, in the input order.";

const CERTIFICATIONS_INSTRUCTIONS: &str = "\
Role: Expert Resume Consultant
Objective: Refine the certifications section.
Instruction 1: Highlight relevance and impact of each certification listed.
Instruction 2: Return only the single best version.";

const ACHIEVEMENTS_INSTRUCTIONS: &str = "\
Role: Expert Resume Consultant
Objective: Improve the achievements section.
Instruction 1: Make achievements concise, quantifiable and professional using only the numbers given.
Instruction 2: Return only the single best version.";

const HOBBIES_INSTRUCTIONS: &str = "\
Role: Expert Resume Consultant
Objective: Present hobbies and interests professionally.
Instruction 1: Reflect skills or traits valued in the workplace without exaggeration.
Instruction 2: Return only the single best version.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = SectionRegistry::standard();
        assert_eq!(registry.lookup("Skills").unwrap().id, "skills");
        assert_eq!(registry.lookup("  PROJECTS ").unwrap().id, "projects");
    }

    #[test]
    fn test_unknown_section_is_an_error() {
        let registry = SectionRegistry::standard();
        let err = registry.lookup("not-a-section").unwrap_err();
        assert!(matches!(err, EnhanceError::UnknownSection(ref s) if s == "not-a-section"));
    }

    #[test]
    fn test_all_resume_sections_are_registered_in_order() {
        let registry = SectionRegistry::standard();
        assert_eq!(
            registry.ids(),
            &[
                "summary",
                "experience",
                "skills",
                "education",
                "projects",
                "certifications",
                "achievements",
                "hobbies"
            ]
        );
    }

    #[test]
    fn test_shapes_match_section_kinds() {
        let registry = SectionRegistry::standard();
        assert_eq!(registry.lookup("skills").unwrap().shape, OutputShape::List);
        assert_eq!(
            registry.lookup("projects").unwrap().shape,
            OutputShape::MultiEntry
        );
        assert_eq!(
            registry.lookup("summary").unwrap().shape,
            OutputShape::Paragraph
        );
    }

    #[test]
    fn test_word_cap_exceeds_prompt_range() {
        let registry = SectionRegistry::standard();
        for id in registry.ids() {
            let spec = registry.lookup(id).unwrap();
            if let Some(range) = spec.word_range {
                assert!(range.min < range.max, "{id}: empty range");
                if !range.per_entry {
                    assert!(spec.word_cap >= range.max, "{id}: cap below range");
                }
            }
        }
    }
}

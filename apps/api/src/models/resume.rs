use serde::Deserialize;

use crate::enhancement::EnhancementRequest;

/// Structured resume payload accepted by the document generation endpoints.
/// Field names follow the frontend's camelCase JSON.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeData {
    pub personal_info: PersonalInfo,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub skills: String,
    pub projects: String,
    pub template: Option<String>,
    pub color: Option<String>,
    pub enhance: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub linkedin: String,
    pub github: String,
    pub summary: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperienceEntry {
    pub title: String,
    pub company: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(alias = "isCurrentJob")]
    pub current: bool,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationEntry {
    pub degree: String,
    pub school: String,
    pub field: String,
    pub graduation_date: String,
    pub gpa: String,
    pub description: String,
}

impl ResumeData {
    /// One enhancement request per enhanceable field, in a fixed order:
    /// summary, skills, projects, then each experience and education description.
    /// Blank fields are included; they pass through without a model call.
    pub fn enhancement_requests(&self) -> Vec<EnhancementRequest> {
        let mut requests = vec![
            EnhancementRequest::new("summary", self.personal_info.summary.clone()),
            EnhancementRequest::new("skills", self.skills.clone()),
            EnhancementRequest::new("projects", self.projects.clone()),
        ];
        requests.extend(
            self.experience
                .iter()
                .map(|e| EnhancementRequest::new("experience", e.description.clone())),
        );
        requests.extend(
            self.education
                .iter()
                .map(|e| EnhancementRequest::new("education", e.description.clone())),
        );
        requests
    }

    /// Writes enhanced contents back, consuming them in `enhancement_requests` order.
    pub fn apply_enhancements(&mut self, contents: Vec<String>) {
        let targets = [
            &mut self.personal_info.summary,
            &mut self.skills,
            &mut self.projects,
        ]
        .into_iter()
        .chain(self.experience.iter_mut().map(|e| &mut e.description))
        .chain(self.education.iter_mut().map(|e| &mut e.description));

        for (target, content) in targets.zip(contents) {
            *target = content;
        }
    }
}

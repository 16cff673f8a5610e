//! Upload preview: the flattened section list and parse metadata returned to
//! the uploader so they can check what was recognised.

use serde::Serialize;

use crate::models::resume::ParsedResume;

/// Technologies reported back to the uploader when found anywhere in the text.
const TECH_KEYWORDS: &[&str] = &[
    "JavaScript", "TypeScript", "React", "Node.js", "Python", "Java", "C++", "C#", "Rust",
    "AWS", "Azure", "Docker", "Kubernetes", "MongoDB", "PostgreSQL", "MySQL", "Git", "Jenkins",
    "CI/CD", "Agile", "Scrum", "REST", "GraphQL", "HTML", "CSS",
];

const STRUCTURED_CONFIDENCE: f32 = 0.85;
const UNSTRUCTURED_CONFIDENCE: f32 = 0.3;

#[derive(Debug, Clone, Serialize)]
pub struct SectionPreview {
    pub id: String,
    pub section_type: String,
    pub title: String,
    pub content: String,
    pub confidence: f32,
    pub word_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParseMetadata {
    pub confidence: f32,
    pub parsing_method: String,
    pub word_count: usize,
    pub technologies_found: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadPreview {
    pub sections: Vec<SectionPreview>,
    pub metadata: ParseMetadata,
}

fn section(id: String, kind: &str, title: String, content: &str, confidence: f32) -> SectionPreview {
    SectionPreview {
        id,
        section_type: kind.to_string(),
        title,
        content: content.to_string(),
        confidence,
        word_count: word_count(content),
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn build_preview(resume: &ParsedResume) -> UploadPreview {
    let s = &resume.sections;
    let mut sections = Vec::new();

    if let Some(summary) = &s.summary {
        sections.push(section(
            "summary".into(),
            "summary",
            "Professional Summary".into(),
            summary,
            0.9,
        ));
    }
    for (i, exp) in s.experience.iter().enumerate() {
        sections.push(section(
            format!("experience-{i}"),
            "experience",
            format!("{} - {}", exp.role, exp.company),
            &exp.original,
            0.8,
        ));
    }
    if let Some(education) = &s.education {
        sections.push(section(
            "education".into(),
            "education",
            "Education".into(),
            education,
            0.85,
        ));
    }
    if let Some(skills) = &s.skills {
        sections.push(section("skills".into(), "skills", "Skills".into(), skills, 0.75));
    }
    for (i, proj) in s.projects.iter().enumerate() {
        sections.push(section(
            format!("project-{i}"),
            "projects",
            proj.title.clone(),
            &proj.original,
            0.8,
        ));
    }

    let mut warnings = Vec::new();
    let structured = !resume.is_unstructured();
    if !structured {
        warnings.push(
            "No section headings were detected; the document was stored as unstructured text."
                .to_string(),
        );
    } else if s.experience.is_empty() {
        warnings.push("No experience entries were recognised.".to_string());
    }

    UploadPreview {
        sections,
        metadata: ParseMetadata {
            confidence: if structured {
                STRUCTURED_CONFIDENCE
            } else {
                UNSTRUCTURED_CONFIDENCE
            },
            parsing_method: if structured { "header-based" } else { "unstructured" }.to_string(),
            word_count: word_count(&resume.raw_text),
            technologies_found: detect_technologies(&resume.raw_text),
            warnings,
        },
    }
}

/// Case-insensitive substring match against the known technology list.
pub fn detect_technologies(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TECH_KEYWORDS
        .iter()
        .filter(|tech| lower.contains(&tech.to_lowercase()))
        .map(|tech| tech.to_string())
        .collect()
}

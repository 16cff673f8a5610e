//! Export of an optimized job/resume pairing as Markdown or JSON.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::resume::{Entry, ParsedResume};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Markdown,
    Json,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportDocument {
    pub job_resume_id: Uuid,
    pub title: String,
    pub job_title: String,
    pub company: String,
    pub match_score: Option<f64>,
    pub content: ParsedResume,
}

fn push_entries(md: &mut String, heading: &str, entries: &[Entry], with_company: bool) {
    if entries.is_empty() {
        return;
    }
    md.push_str(&format!("## {heading}\n\n"));
    for entry in entries {
        if with_company {
            md.push_str(&format!("### {} - {}\n", entry.role, entry.company));
        } else {
            md.push_str(&format!("### {}\n", entry.title));
        }
        match (&entry.start_date, &entry.end_date) {
            (Some(start), Some(end)) => md.push_str(&format!("*{start} – {end}*\n")),
            (Some(start), None) => md.push_str(&format!("*{start}*\n")),
            _ => {}
        }
        md.push('\n');
        md.push_str(entry.live_text().trim());
        md.push_str("\n\n");
    }
}

/// Renders the live document. Entries show their rewrite when one exists.
pub fn render_markdown(doc: &ExportDocument) -> String {
    let s = &doc.content.sections;
    let mut md = format!("# {}\n\n", doc.title);
    md.push_str(&format!("_Tailored for {} at {}", doc.job_title, doc.company));
    if let Some(score) = doc.match_score {
        md.push_str(&format!(" · match score {score:.0}"));
    }
    md.push_str("_\n\n");

    if let Some(summary) = s.summary.as_deref().filter(|t| !t.trim().is_empty()) {
        md.push_str("## Professional Summary\n\n");
        md.push_str(summary.trim());
        md.push_str("\n\n");
    }
    if let Some(skills) = s.skills.as_deref().filter(|t| !t.trim().is_empty()) {
        md.push_str("## Skills\n\n");
        md.push_str(skills.trim());
        md.push_str("\n\n");
    }
    push_entries(&mut md, "Professional Experience", &s.experience, true);
    push_entries(&mut md, "Projects", &s.projects, false);
    if let Some(education) = s.education.as_deref().filter(|t| !t.trim().is_empty()) {
        md.push_str("## Education\n\n");
        md.push_str(education.trim());
        md.push_str("\n\n");
    }
    md
}

//! Resume document parsing: decode → segment → extract entries → redact.
//!
//! Everything here is synchronous and pure apart from the decoder, which is
//! CPU bound and should run on a blocking thread.

pub mod decode;
pub mod entries;
pub mod preview;
pub mod redact;
pub mod segmenter;

use tracing::debug;

use crate::models::resume::{Entry, ParsedResume, ResumeSections};
use decode::{decode_document, DecodeError, DocumentFormat};
use entries::{extract_experience, extract_projects};
use redact::redact_pii;
use segmenter::{segment_text, SectionKind, SegmenterConfig};

/// Builds the structured document from decoded text. No redaction is applied.
pub fn parse_resume_text(text: &str, config: &SegmenterConfig) -> ParsedResume {
    let mut sections = segment_text(text, config);
    debug!(
        "Segmented resume into {} sections: {:?}",
        sections.len(),
        sections.keys().collect::<Vec<_>>()
    );

    let experience = sections
        .get(&SectionKind::Experience)
        .map(|block| extract_experience(block))
        .unwrap_or_default();
    let projects = sections
        .get(&SectionKind::Projects)
        .map(|block| extract_projects(block))
        .unwrap_or_default();

    ParsedResume {
        sections: ResumeSections {
            summary: sections.remove(&SectionKind::Summary),
            experience,
            education: sections.remove(&SectionKind::Education),
            skills: sections.remove(&SectionKind::Skills),
            projects,
        },
        raw_text: text.to_string(),
    }
}

/// Applies PII redaction to every text field of the document.
pub fn redact_resume(resume: ParsedResume) -> ParsedResume {
    let redact_opt = |field: Option<String>| field.map(|t| redact_pii(&t));
    let redact_entry = |entry: Entry| Entry {
        company: redact_pii(&entry.company),
        role: redact_pii(&entry.role),
        title: redact_pii(&entry.title),
        original: redact_pii(&entry.original),
        optimized: redact_opt(entry.optimized),
        ..entry
    };

    let ParsedResume { sections, raw_text } = resume;
    ParsedResume {
        sections: ResumeSections {
            summary: redact_opt(sections.summary),
            experience: sections.experience.into_iter().map(redact_entry).collect(),
            education: redact_opt(sections.education),
            skills: redact_opt(sections.skills),
            projects: sections.projects.into_iter().map(redact_entry).collect(),
        },
        raw_text: redact_pii(&raw_text),
    }
}

/// Full upload pipeline for one document.
pub fn parse_resume_file(
    bytes: &[u8],
    format: DocumentFormat,
    config: &SegmenterConfig,
) -> Result<ParsedResume, DecodeError> {
    let text = decode_document(bytes, format)?;
    Ok(redact_resume(parse_resume_text(&text, config)))
}

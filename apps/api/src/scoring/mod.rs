//! Similarity Scorer: embeds resume sections and compares them with a job
//! description embedding.
//!
//! The aggregate match score is the mean similarity over the sections that
//! are present, scaled to a percentage. Absent sections are skipped rather
//! than counted as zero.

pub mod similarity;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use crate::llm_client::{LlmClient, LlmError};
use crate::models::resume::ParsedResume;
pub use similarity::cosine_similarity;

/// Cap applied to post-optimization scores. Override with `MATCH_SCORE_CAP`.
pub const DEFAULT_SCORE_CAP: f64 = 95.0;

/// Text in, fixed-length vector out.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError>;
}

#[async_trait]
impl Embedder for LlmClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.embedding(text).await
    }
}

/// One resume section prepared for scoring.
#[derive(Debug, Clone)]
pub struct ScorableSection<'a> {
    pub key: String,
    pub label: String,
    pub text: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionScore {
    pub key: String,
    pub label: String,
    pub similarity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResumeScore {
    pub sections: Vec<SectionScore>,
    /// 0 – 100
    pub match_score: f64,
    /// Sections that could not be embedded or compared.
    pub skipped: Vec<String>,
}

/// Sections that take part in scoring: summary, skills, and every
/// experience/project entry, each using its live text.
pub fn scorable_sections(resume: &ParsedResume) -> Vec<ScorableSection<'_>> {
    let s = &resume.sections;
    let mut out = Vec::new();
    let non_blank = |t: &&String| !t.trim().is_empty();

    if let Some(summary) = s.summary.as_ref().filter(non_blank) {
        out.push(ScorableSection {
            key: "summary".to_string(),
            label: "Summary".to_string(),
            text: summary,
        });
    }
    if let Some(skills) = s.skills.as_ref().filter(non_blank) {
        out.push(ScorableSection {
            key: "skills".to_string(),
            label: "Skills".to_string(),
            text: skills,
        });
    }
    for entry in s.experience.iter().chain(&s.projects) {
        let text = entry.live_text();
        if text.trim().is_empty() {
            continue;
        }
        out.push(ScorableSection {
            key: entry.reference(),
            label: entry.title.clone(),
            text,
        });
    }
    out
}

/// Mean similarity × 100, clamped to `[0, 100]`. No sections scores 0.
pub fn aggregate_match_score(similarities: &[f64]) -> f64 {
    if similarities.is_empty() {
        return 0.0;
    }
    let mean = similarities.iter().sum::<f64>() / similarities.len() as f64;
    (mean * 100.0).clamp(0.0, 100.0)
}

/// Applies the post-optimization cap.
pub fn cap_score(score: f64, cap: f64) -> f64 {
    score.min(cap)
}

/// Embeds a job description, bounded by `timeout`.
pub async fn embed_with_timeout(
    embedder: &dyn Embedder,
    text: &str,
    timeout: Duration,
) -> Result<Vec<f32>, LlmError> {
    tokio::time::timeout(timeout, embedder.embed(text))
        .await
        .map_err(|_| LlmError::Timeout(timeout))?
}

/// Scores every present section of `resume` against `job_embedding`.
/// A section whose embedding or comparison fails is logged and skipped.
pub async fn score_resume(
    embedder: &dyn Embedder,
    job_embedding: &[f32],
    resume: &ParsedResume,
    timeout: Duration,
) -> ResumeScore {
    let mut sections = Vec::new();
    let mut skipped = Vec::new();

    for section in scorable_sections(resume) {
        let outcome = embed_with_timeout(embedder, section.text, timeout)
            .await
            .map_err(|e| e.to_string())
            .and_then(|v| cosine_similarity(job_embedding, &v).map_err(|e| e.to_string()));

        match outcome {
            Ok(similarity) => sections.push(SectionScore {
                key: section.key,
                label: section.label,
                similarity,
            }),
            Err(reason) => {
                warn!("Skipping section '{}' in scoring: {reason}", section.label);
                skipped.push(section.key);
            }
        }
    }

    let similarities: Vec<f64> = sections.iter().map(|s| s.similarity).collect();
    ResumeScore {
        match_score: aggregate_match_score(&similarities),
        sections,
        skipped,
    }
}

//! The optimization job.
//!
//! `optimize_resume` walks PARSED → SCORED(initial) → REWRITTEN → SCORED(final).
//! Each rewrite is persisted together with its audit entry before the next
//! one starts, so the final score always reads committed state.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::{rewrite_with_timeout, OptimizerSettings, ResumeLocks, Rewriter};
use crate::errors::AppError;
use crate::models::audit::{AuditAction, AuditEntry, AuditMetadata, NewAuditEntry, SectionType};
use crate::models::job::{JobResumeRow, DEFAULT_JOB_COMPANY, DEFAULT_JOB_TITLE};
use crate::models::resume::{Entry, ParsedResume};
use crate::scoring::{cap_score, embed_with_timeout, score_resume, Embedder};
use crate::state::AppState;
use crate::store::{JobLookup, ResumeStore};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct OptimizeRequest {
    pub user_id: Uuid,
    pub resume_id: Uuid,
    pub job_description: String,
    pub job_title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptimizeEntryRequest {
    pub user_id: Uuid,
    pub job_resume_id: Uuid,
    pub entry_id: String,
    pub custom_prompt: Option<String>,
    /// Falls back to the stored job description when absent.
    pub job_description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteStatus {
    Optimized,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionOutcome {
    pub section: String,
    pub section_type: SectionType,
    pub entry_id: Option<String>,
    pub status: RewriteStatus,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizationReport {
    pub job_id: Uuid,
    pub job_resume_id: Uuid,
    pub initial_score: Option<f64>,
    pub final_score: Option<f64>,
    pub improvement: Option<f64>,
    pub sections_optimized: usize,
    pub outcomes: Vec<SectionOutcome>,
    pub optimized_content: ParsedResume,
}

impl OptimizationReport {
    pub fn failures(&self) -> impl Iterator<Item = &SectionOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == RewriteStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryRewrite {
    pub job_resume_id: Uuid,
    pub audit_entry_id: Uuid,
    pub entry: Entry,
}

// ────────────────────────────────────────────────────────────────────────────
// Rewrite targets
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Summary,
    Skills,
    Experience(usize),
}

/// Rewrite order: summary, skills, then each experience entry in order.
fn rewrite_targets(resume: &ParsedResume) -> Vec<Target> {
    let present = |field: &Option<String>| field.as_deref().is_some_and(|t| !t.trim().is_empty());
    let s = &resume.sections;

    let mut targets = Vec::new();
    if present(&s.summary) {
        targets.push(Target::Summary);
    }
    if present(&s.skills) {
        targets.push(Target::Skills);
    }
    targets.extend((0..s.experience.len()).map(Target::Experience));
    targets
}

struct TargetView {
    section_type: SectionType,
    prompt_label: &'static str,
    audit_label: String,
    entry_id: Option<String>,
    text: String,
}

fn view(resume: &ParsedResume, target: Target) -> TargetView {
    let s = &resume.sections;
    match target {
        Target::Summary => TargetView {
            section_type: SectionType::Summary,
            prompt_label: "Summary",
            audit_label: "Summary".to_string(),
            entry_id: None,
            text: s.summary.clone().unwrap_or_default(),
        },
        Target::Skills => TargetView {
            section_type: SectionType::Skills,
            prompt_label: "Skills",
            audit_label: "Skills".to_string(),
            entry_id: None,
            text: s.skills.clone().unwrap_or_default(),
        },
        Target::Experience(i) => {
            let entry = &s.experience[i];
            TargetView {
                section_type: SectionType::Experience,
                prompt_label: "Experience",
                audit_label: format!("Experience: {}", entry.title),
                entry_id: Some(entry.reference()),
                text: entry.original.clone(),
            }
        }
    }
}

/// Writes a rewrite into the committed document and returns the live text it
/// replaced, or `None` when the target is no longer there.
fn apply(
    resume: &mut ParsedResume,
    section_type: SectionType,
    entry_id: Option<&str>,
    text: String,
) -> Option<String> {
    match (section_type, entry_id) {
        (SectionType::Summary, _) => resume.sections.summary.replace(text),
        (SectionType::Skills, _) => resume.sections.skills.replace(text),
        (_, Some(key)) => {
            let entry = resume.find_entry_mut(key)?;
            let previous = entry.live_text().to_string();
            entry.optimized = Some(text);
            Some(previous)
        }
        (_, None) => None,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

/// Borrowed handles to everything an optimization pass touches.
pub struct Optimizer<'a> {
    pub store: &'a dyn ResumeStore,
    pub embedder: &'a dyn Embedder,
    pub rewriter: &'a dyn Rewriter,
    pub locks: &'a ResumeLocks,
    pub settings: OptimizerSettings,
}

impl<'a> Optimizer<'a> {
    pub fn from_state(state: &'a AppState) -> Self {
        Self {
            store: state.store.as_ref(),
            embedder: state.embedder.as_ref(),
            rewriter: state.rewriter.as_ref(),
            locks: &state.locks,
            settings: state.optimizer,
        }
    }

    /// Full optimization job for one resume against one job description.
    pub async fn optimize_resume(
        &self,
        request: &OptimizeRequest,
    ) -> Result<OptimizationReport, AppError> {
        let job_description = request.job_description.trim();
        if job_description.is_empty() {
            return Err(AppError::Validation(
                "job_description cannot be empty".to_string(),
            ));
        }

        let resume_row = self
            .store
            .find_resume(request.user_id, request.resume_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Resume {} not found", request.resume_id)))?;
        let mut base = ParsedResume::from_value(resume_row.content)?;
        base.assign_durable_ids();

        let job_title = request
            .job_title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_JOB_TITLE);
        let job = self
            .store
            .find_or_create_job(JobLookup {
                user_id: request.user_id,
                title: job_title,
                company: DEFAULT_JOB_COMPANY,
                description: job_description,
            })
            .await?;

        // SCORED(initial)
        let timeout = self.settings.call_timeout;
        let job_embedding = match embed_with_timeout(self.embedder, job_description, timeout).await
        {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Job description embedding failed for job {}: {e}; scores unavailable", job.id);
                None
            }
        };
        let initial_score = match &job_embedding {
            Some(jd) => Some(score_resume(self.embedder, jd, &base, timeout).await.match_score),
            None => None,
        };

        let pairing: JobResumeRow = self
            .store
            .upsert_job_resume(job.id, resume_row.id, base.to_value()?, initial_score)
            .await?;
        info!(
            "Optimizing resume {} for job {} (pairing {}), initial score {:?}",
            resume_row.id, job.id, pairing.id, initial_score
        );

        // REWRITTEN
        let mut outcomes = Vec::new();
        for target in rewrite_targets(&base) {
            let TargetView {
                section_type,
                prompt_label,
                audit_label,
                entry_id,
                text,
            } = view(&base, target);

            let result = match rewrite_with_timeout(
                self.rewriter,
                &text,
                job_description,
                prompt_label,
                None,
                timeout,
            )
            .await
            {
                Ok(rewritten) => self
                    .commit(request.user_id, pairing.id, resume_row.id, |live| {
                        let replaced =
                            apply(live, section_type, entry_id.as_deref(), rewritten.clone());
                        let previous = replaced.ok_or_else(|| {
                            AppError::NotFound(format!("{audit_label} is no longer in the document"))
                        })?;
                        Ok(NewAuditEntry {
                            resume_id: resume_row.id,
                            action: AuditAction::AiOptimization,
                            section: audit_label.clone(),
                            original: Some(previous),
                            modified: Some(rewritten.clone()),
                            metadata: AuditMetadata {
                                job_id: Some(job.id),
                                section_type: Some(section_type),
                                entry_id: entry_id.clone(),
                                ..Default::default()
                            },
                        })
                    })
                    .await
                    .map(|_| ())
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };

            let (status, error) = match result {
                Ok(()) => (RewriteStatus::Optimized, None),
                Err(reason) => {
                    warn!("Rewrite of '{audit_label}' skipped, original kept: {reason}");
                    (RewriteStatus::Failed, Some(reason))
                }
            };
            outcomes.push(SectionOutcome {
                section: audit_label,
                section_type,
                entry_id,
                status,
                error,
            });
        }

        // SCORED(final), over the committed document
        let document = self.load_live(request.user_id, pairing.id).await?;
        let final_score = match &job_embedding {
            Some(jd) => {
                let score = score_resume(self.embedder, jd, &document, timeout).await;
                Some(cap_score(score.match_score, self.settings.score_cap))
            }
            None => None,
        };
        self.store.set_match_score(pairing.id, final_score).await?;

        let sections_optimized = outcomes
            .iter()
            .filter(|o| o.status == RewriteStatus::Optimized)
            .count();
        info!(
            "Optimization of resume {} finished: {}/{} sections rewritten, score {:?} -> {:?}",
            resume_row.id,
            sections_optimized,
            outcomes.len(),
            initial_score,
            final_score
        );

        Ok(OptimizationReport {
            job_id: job.id,
            job_resume_id: pairing.id,
            initial_score,
            final_score,
            improvement: initial_score.zip(final_score).map(|(i, f)| f - i),
            sections_optimized,
            outcomes,
            optimized_content: document,
        })
    }

    /// Rewrites a single experience or project entry with an optional custom instruction.
    pub async fn optimize_entry(
        &self,
        request: &OptimizeEntryRequest,
    ) -> Result<EntryRewrite, AppError> {
        let pairing = self
            .store
            .find_job_resume(request.user_id, request.job_resume_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Job resume {} not found", request.job_resume_id))
            })?;

        let job_description = match request
            .job_description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
        {
            Some(d) => d.to_string(),
            None => {
                self.store
                    .find_job(request.user_id, pairing.job_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Job {} not found", pairing.job_id)))?
                    .description
            }
        };
        let custom_prompt = request
            .custom_prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        let document = ParsedResume::from_value(pairing.optimized_content)?;
        let (section_type, entry) = locate_entry(&document, &request.entry_id)
            .ok_or_else(|| AppError::NotFound(format!("Entry {} not found", request.entry_id)))?;
        let (prompt_label, audit_prefix) = match section_type {
            SectionType::Projects => ("Project", "Project"),
            _ => ("Experience", "Experience"),
        };
        let original = entry.original.clone();
        let audit_label = format!("{audit_prefix}: {}", entry.title);
        let reference = entry.reference();

        let rewritten = rewrite_with_timeout(
            self.rewriter,
            &original,
            &job_description,
            prompt_label,
            custom_prompt.as_deref(),
            self.settings.call_timeout,
        )
        .await?;

        let (live, audit_entry) = self
            .commit(request.user_id, pairing.id, pairing.resume_id, |live| {
                let entry = live.find_entry_mut(&reference).ok_or_else(|| {
                    AppError::NotFound(format!("Entry {} not found", request.entry_id))
                })?;
                let previous = entry.live_text().to_string();
                entry.optimized = Some(rewritten.clone());
                entry.custom_prompt = custom_prompt.clone();
                Ok(NewAuditEntry {
                    resume_id: pairing.resume_id,
                    action: AuditAction::CustomOptimization,
                    section: audit_label.clone(),
                    original: Some(previous),
                    modified: Some(rewritten.clone()),
                    metadata: AuditMetadata {
                        job_id: Some(pairing.job_id),
                        section_type: Some(section_type),
                        entry_id: Some(reference.clone()),
                        custom_prompt: custom_prompt.clone(),
                        ..Default::default()
                    },
                })
            })
            .await?;
        let entry = locate_entry(&live, &reference)
            .map(|(_, e)| e.clone())
            .ok_or_else(|| AppError::NotFound(format!("Entry {} not found", request.entry_id)))?;

        info!(
            "Custom rewrite of entry {} in pairing {} recorded as {}",
            request.entry_id, pairing.id, audit_entry.id
        );
        Ok(EntryRewrite {
            job_resume_id: pairing.id,
            audit_entry_id: audit_entry.id,
            entry,
        })
    }

    /// Applies `change` to the pairing's committed document and saves it with
    /// the audit entry `change` returns. The read, the change and the save all
    /// happen under the resume lock, so concurrent writers (reverts included)
    /// never overwrite each other.
    async fn commit<F>(
        &self,
        user_id: Uuid,
        job_resume_id: Uuid,
        resume_id: Uuid,
        change: F,
    ) -> Result<(ParsedResume, AuditEntry), AppError>
    where
        F: FnOnce(&mut ParsedResume) -> Result<NewAuditEntry, AppError> + Send,
    {
        let _guard = self.locks.lock(resume_id).await;
        let mut live = self.load_live(user_id, job_resume_id).await?;
        let audit = change(&mut live)?;
        let stored = self
            .store
            .save_job_resume_content(job_resume_id, live.to_value()?, Some(audit))
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("audit entry was not stored")))?;
        Ok((live, stored))
    }

    async fn load_live(&self, user_id: Uuid, job_resume_id: Uuid) -> Result<ParsedResume, AppError> {
        let pairing = self
            .store
            .find_job_resume(user_id, job_resume_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job resume {job_resume_id} not found")))?;
        Ok(ParsedResume::from_value(pairing.optimized_content)?)
    }
}

fn locate_entry<'r>(resume: &'r ParsedResume, key: &str) -> Option<(SectionType, &'r Entry)> {
    let s = &resume.sections;
    s.experience
        .iter()
        .find(|e| e.matches(key))
        .map(|e| (SectionType::Experience, e))
        .or_else(|| {
            s.projects
                .iter()
                .find(|e| e.matches(key))
                .map(|e| (SectionType::Projects, e))
        })
}

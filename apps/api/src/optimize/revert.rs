use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::orchestrator::Optimizer;
use crate::errors::AppError;
use crate::models::audit::{AuditAction, AuditEntry, AuditMetadata, NewAuditEntry, SectionType};
use crate::models::resume::ParsedResume;

#[derive(Debug, Clone, Deserialize)]
pub struct RevertRequest {
    pub user_id: Uuid,
    pub audit_log_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevertOutcome {
    pub job_resume_id: Uuid,
    pub audit_entry: AuditEntry,
    pub document: ParsedResume,
}

/// Writes `text` back into the section an audit entry describes.
/// Fails without touching `resume` when that section cannot be located.
pub fn apply_revert(
    resume: &mut ParsedResume,
    metadata: &AuditMetadata,
    text: &str,
) -> Result<(), AppError> {
    match (metadata.section_type, metadata.entry_id.as_deref()) {
        (Some(SectionType::Summary), _) => resume.sections.summary = Some(text.to_string()),
        (Some(SectionType::Skills), _) => resume.sections.skills = Some(text.to_string()),
        (_, Some(key)) => {
            let entry = resume
                .find_entry_mut(key)
                .ok_or_else(|| AppError::NotFound(format!("Entry {key} not found")))?;
            entry.optimized = (text != entry.original).then(|| text.to_string());
        }
        (_, None) => {
            return Err(AppError::NotFound(
                "Audit entry does not reference a resume section".to_string(),
            ))
        }
    }
    Ok(())
}

impl Optimizer<'_> {
    /// Restores the pre-change text of one audit entry and records a REVERT.
    pub async fn revert(&self, user_id: Uuid, audit_id: Uuid) -> Result<RevertOutcome, AppError> {
        let target = self
            .store
            .find_audit_entry(user_id, audit_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Audit entry {audit_id} not found")))?;

        let _guard = self.locks.lock(target.resume_id).await;

        let original = target.original.clone().ok_or(AppError::NoOriginalContent)?;
        let metadata = target.metadata().map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "audit entry {audit_id} has malformed metadata: {e}"
            ))
        })?;
        let job_id = metadata.job_id.ok_or_else(|| {
            AppError::NotFound(format!("Audit entry {audit_id} is not tied to a job"))
        })?;

        let pairing = self
            .store
            .find_job_resume_for(user_id, job_id, target.resume_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Job resume for job {job_id} and resume {} not found",
                    target.resume_id
                ))
            })?;

        let mut document = ParsedResume::from_value(pairing.optimized_content)?;
        apply_revert(&mut document, &metadata, &original)?;

        let audit = NewAuditEntry {
            resume_id: target.resume_id,
            action: AuditAction::Revert,
            section: target.section.clone(),
            original: target.modified.clone(),
            modified: Some(original),
            metadata: AuditMetadata {
                job_id: Some(job_id),
                section_type: metadata.section_type,
                entry_id: metadata.entry_id.clone(),
                reverted_from_id: Some(audit_id),
                ..Default::default()
            },
        };

        let audit_entry = self
            .store
            .save_job_resume_content(pairing.id, document.to_value()?, Some(audit))
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("revert entry was not stored")))?;

        info!(
            "Reverted audit entry {} on resume {} as {}",
            audit_id, target.resume_id, audit_entry.id
        );
        Ok(RevertOutcome {
            job_resume_id: pairing.id,
            audit_entry,
            document,
        })
    }
}

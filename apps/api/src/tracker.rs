//! Career tracker push: moves the job behind a job/resume pairing to a new
//! stage and records the move in the resume's audit log.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::audit::{AuditAction, AuditMetadata, NewAuditEntry};
use crate::models::job::{JobRow, STAGE_APPLIED};
use crate::optimize::ResumeLocks;
use crate::state::AppState;
use crate::store::ResumeStore;

const PUSH_SECTION: &str = "Job Application";

#[derive(Debug, Clone, Deserialize)]
pub struct PushRequest {
    pub user_id: Uuid,
    pub job_resume_id: Uuid,
    pub stage: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PushResponse {
    pub job: JobRow,
    pub audit_entry_id: Uuid,
}

pub async fn push_to_tracker(
    store: &dyn ResumeStore,
    locks: &ResumeLocks,
    request: &PushRequest,
) -> Result<PushResponse, AppError> {
    let stage = request
        .stage
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(STAGE_APPLIED);

    let pairing = store
        .find_job_resume(request.user_id, request.job_resume_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Job resume {} not found", request.job_resume_id))
        })?;
    let job = store
        .find_job(request.user_id, pairing.job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", pairing.job_id)))?;

    // Only an `applied` push stamps the date; other stages keep the previous one.
    let applied_date = if stage == STAGE_APPLIED {
        Some(Utc::now())
    } else {
        job.applied_date
    };
    let job = store.update_job_stage(job.id, stage, applied_date).await?;

    let audit = {
        let _guard = locks.lock(pairing.resume_id).await;
        store
            .append_audit(NewAuditEntry {
                resume_id: pairing.resume_id,
                action: AuditAction::CareerTrackerPush,
                section: PUSH_SECTION.to_string(),
                original: None,
                modified: None,
                metadata: AuditMetadata {
                    job_id: Some(job.id),
                    stage: Some(stage.to_string()),
                    match_score: pairing.match_score,
                    ..Default::default()
                },
            })
            .await?
    };

    info!("Pushed job {} to stage '{}' (pairing {})", job.id, stage, pairing.id);
    Ok(PushResponse {
        job,
        audit_entry_id: audit.id,
    })
}

/// POST /api/v1/career-tracker/push
pub async fn handle_push(
    State(state): State<AppState>,
    Json(request): Json<PushRequest>,
) -> Result<Json<PushResponse>, AppError> {
    let response = push_to_tracker(state.store.as_ref(), &state.locks, &request).await?;
    Ok(Json(response))
}

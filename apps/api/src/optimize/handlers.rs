//! Axum route handlers for optimization, the audit log and revert.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::orchestrator::{
    EntryRewrite, OptimizationReport, OptimizeEntryRequest, OptimizeRequest, Optimizer,
};
use super::revert::{RevertOutcome, RevertRequest};
use crate::errors::AppError;
use crate::models::audit::AuditEntry;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct AuditLogResponse {
    pub resume_id: Uuid,
    pub entries: Vec<AuditEntry>,
}

/// POST /api/v1/resumes/optimize
///
/// Runs the full optimization job. Sections whose rewrite failed are listed
/// in `outcomes` with status `failed`; the rest are already persisted.
pub async fn handle_optimize(
    State(state): State<AppState>,
    Json(request): Json<OptimizeRequest>,
) -> Result<Json<OptimizationReport>, AppError> {
    let report = Optimizer::from_state(&state)
        .optimize_resume(&request)
        .await?;
    Ok(Json(report))
}

/// POST /api/v1/resumes/optimize/entry
pub async fn handle_optimize_entry(
    State(state): State<AppState>,
    Json(request): Json<OptimizeEntryRequest>,
) -> Result<Json<EntryRewrite>, AppError> {
    if request.entry_id.trim().is_empty() {
        return Err(AppError::Validation("entry_id cannot be empty".to_string()));
    }
    let rewrite = Optimizer::from_state(&state)
        .optimize_entry(&request)
        .await?;
    Ok(Json(rewrite))
}

/// GET /api/v1/audit-log/:resume_id
///
/// Returns the audit trail of a resume, newest first.
pub async fn handle_audit_log(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<AuditLogResponse>, AppError> {
    state
        .store
        .find_resume(params.user_id, resume_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {resume_id} not found")))?;

    let entries = state
        .store
        .list_audit_entries(params.user_id, resume_id)
        .await?;
    Ok(Json(AuditLogResponse { resume_id, entries }))
}

/// POST /api/v1/audit-log/revert
pub async fn handle_revert(
    State(state): State<AppState>,
    Json(request): Json<RevertRequest>,
) -> Result<Json<RevertOutcome>, AppError> {
    let outcome = Optimizer::from_state(&state)
        .revert(request.user_id, request.audit_log_id)
        .await?;
    Ok(Json(outcome))
}

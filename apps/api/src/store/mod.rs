//! Persistence boundary. Handlers and the orchestrator only see `ResumeStore`;
//! `PgStore` is the production implementation.
//!
//! Every lookup that takes a `user_id` enforces ownership: rows owned by
//! another user are reported as absent.

pub mod archive;
#[cfg(test)]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::models::audit::{AuditEntry, NewAuditEntry};
use crate::models::job::{JobResumeRow, JobRow};
use crate::models::resume::ResumeRow;

pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, sqlx::Error>;

/// Fields for a job looked up (or created) by `find_or_create_job`.
#[derive(Debug, Clone)]
pub struct JobLookup<'a> {
    pub user_id: Uuid,
    pub title: &'a str,
    pub company: &'a str,
    pub description: &'a str,
}

#[async_trait]
pub trait ResumeStore: Send + Sync {
    async fn create_resume(&self, user_id: Uuid, title: &str, content: Value)
        -> StoreResult<ResumeRow>;

    async fn find_resume(&self, user_id: Uuid, resume_id: Uuid) -> StoreResult<Option<ResumeRow>>;

    /// Finds a job by (user, title, description), creating it if absent.
    async fn find_or_create_job(&self, lookup: JobLookup<'_>) -> StoreResult<JobRow>;

    async fn find_job(&self, user_id: Uuid, job_id: Uuid) -> StoreResult<Option<JobRow>>;

    /// Creates the (job, resume) pairing or resets its live document.
    async fn upsert_job_resume(
        &self,
        job_id: Uuid,
        resume_id: Uuid,
        content: Value,
        initial_score: Option<f64>,
    ) -> StoreResult<JobResumeRow>;

    async fn find_job_resume(
        &self,
        user_id: Uuid,
        job_resume_id: Uuid,
    ) -> StoreResult<Option<JobResumeRow>>;

    async fn find_job_resume_for(
        &self,
        user_id: Uuid,
        job_id: Uuid,
        resume_id: Uuid,
    ) -> StoreResult<Option<JobResumeRow>>;

    /// Replaces the live document and appends `audit` in one transaction.
    async fn save_job_resume_content(
        &self,
        job_resume_id: Uuid,
        content: Value,
        audit: Option<NewAuditEntry>,
    ) -> StoreResult<Option<AuditEntry>>;

    async fn set_match_score(&self, job_resume_id: Uuid, score: Option<f64>) -> StoreResult<()>;

    async fn append_audit(&self, entry: NewAuditEntry) -> StoreResult<AuditEntry>;

    async fn find_audit_entry(&self, user_id: Uuid, audit_id: Uuid)
        -> StoreResult<Option<AuditEntry>>;

    /// Newest first.
    async fn list_audit_entries(&self, user_id: Uuid, resume_id: Uuid)
        -> StoreResult<Vec<AuditEntry>>;

    async fn update_job_stage(
        &self,
        job_id: Uuid,
        stage: &str,
        applied_date: Option<DateTime<Utc>>,
    ) -> StoreResult<JobRow>;
}

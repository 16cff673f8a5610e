//! In-memory `ResumeStore` for unit and router tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::{JobLookup, ResumeStore, StoreResult};
use crate::models::audit::{AuditEntry, NewAuditEntry};
use crate::models::job::{JobResumeRow, JobRow};
use crate::models::resume::ResumeRow;

#[derive(Default)]
struct Tables {
    resumes: Vec<ResumeRow>,
    jobs: Vec<JobRow>,
    job_resumes: Vec<JobResumeRow>,
    audit_logs: Vec<AuditEntry>,
}

impl Tables {
    fn owns_resume(&self, user_id: Uuid, resume_id: Uuid) -> bool {
        self.resumes
            .iter()
            .any(|r| r.id == resume_id && r.user_id == user_id)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All audit entries in insertion order.
    pub fn audit_log(&self) -> Vec<AuditEntry> {
        self.tables.lock().unwrap().audit_logs.clone()
    }

    /// Stores a row exactly as given, bypassing typed metadata.
    pub fn insert_raw_audit(&self, row: AuditEntry) {
        self.tables.lock().unwrap().audit_logs.push(row);
    }

    pub fn job_resume(&self, id: Uuid) -> Option<JobResumeRow> {
        let tables = self.tables.lock().unwrap();
        tables.job_resumes.iter().find(|jr| jr.id == id).cloned()
    }
}

fn audit_row(entry: &NewAuditEntry) -> AuditEntry {
    AuditEntry {
        id: Uuid::new_v4(),
        resume_id: entry.resume_id,
        action: entry.action.as_str().to_string(),
        section: entry.section.clone(),
        original: entry.original.clone(),
        modified: entry.modified.clone(),
        metadata: serde_json::to_value(&entry.metadata).unwrap(),
        created_at: Utc::now(),
    }
}

#[async_trait]
impl ResumeStore for MemoryStore {
    async fn create_resume(
        &self,
        user_id: Uuid,
        title: &str,
        content: Value,
    ) -> StoreResult<ResumeRow> {
        let now = Utc::now();
        let row = ResumeRow {
            id: Uuid::new_v4(),
            user_id,
            title: title.to_string(),
            content,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().unwrap().resumes.push(row.clone());
        Ok(row)
    }

    async fn find_resume(&self, user_id: Uuid, resume_id: Uuid) -> StoreResult<Option<ResumeRow>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .resumes
            .iter()
            .find(|r| r.id == resume_id && r.user_id == user_id)
            .cloned())
    }

    async fn find_or_create_job(&self, lookup: JobLookup<'_>) -> StoreResult<JobRow> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(job) = tables.jobs.iter().find(|j| {
            j.user_id == lookup.user_id
                && j.title == lookup.title
                && j.description == lookup.description
        }) {
            return Ok(job.clone());
        }
        let now = Utc::now();
        let job = JobRow {
            id: Uuid::new_v4(),
            user_id: lookup.user_id,
            title: lookup.title.to_string(),
            company: lookup.company.to_string(),
            description: lookup.description.to_string(),
            stage: "saved".to_string(),
            applied_date: None,
            created_at: now,
            updated_at: now,
        };
        tables.jobs.push(job.clone());
        Ok(job)
    }

    async fn find_job(&self, user_id: Uuid, job_id: Uuid) -> StoreResult<Option<JobRow>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .jobs
            .iter()
            .find(|j| j.id == job_id && j.user_id == user_id)
            .cloned())
    }

    async fn upsert_job_resume(
        &self,
        job_id: Uuid,
        resume_id: Uuid,
        content: Value,
        initial_score: Option<f64>,
    ) -> StoreResult<JobResumeRow> {
        let mut tables = self.tables.lock().unwrap();
        let now = Utc::now();
        if let Some(row) = tables
            .job_resumes
            .iter_mut()
            .find(|jr| jr.job_id == job_id && jr.resume_id == resume_id)
        {
            row.optimized_content = content;
            row.initial_score = initial_score;
            row.match_score = None;
            row.updated_at = now;
            return Ok(row.clone());
        }
        let row = JobResumeRow {
            id: Uuid::new_v4(),
            job_id,
            resume_id,
            optimized_content: content,
            initial_score,
            match_score: None,
            created_at: now,
            updated_at: now,
        };
        tables.job_resumes.push(row.clone());
        Ok(row)
    }

    async fn find_job_resume(
        &self,
        user_id: Uuid,
        job_resume_id: Uuid,
    ) -> StoreResult<Option<JobResumeRow>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .job_resumes
            .iter()
            .find(|jr| jr.id == job_resume_id && tables.owns_resume(user_id, jr.resume_id))
            .cloned())
    }

    async fn find_job_resume_for(
        &self,
        user_id: Uuid,
        job_id: Uuid,
        resume_id: Uuid,
    ) -> StoreResult<Option<JobResumeRow>> {
        let tables = self.tables.lock().unwrap();
        if !tables.owns_resume(user_id, resume_id) {
            return Ok(None);
        }
        Ok(tables
            .job_resumes
            .iter()
            .find(|jr| jr.job_id == job_id && jr.resume_id == resume_id)
            .cloned())
    }

    async fn save_job_resume_content(
        &self,
        job_resume_id: Uuid,
        content: Value,
        audit: Option<NewAuditEntry>,
    ) -> StoreResult<Option<AuditEntry>> {
        let mut tables = self.tables.lock().unwrap();
        let row = tables
            .job_resumes
            .iter_mut()
            .find(|jr| jr.id == job_resume_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        row.optimized_content = content;
        row.updated_at = Utc::now();

        let stored = audit.as_ref().map(audit_row);
        if let Some(entry) = &stored {
            tables.audit_logs.push(entry.clone());
        }
        Ok(stored)
    }

    async fn set_match_score(&self, job_resume_id: Uuid, score: Option<f64>) -> StoreResult<()> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(row) = tables.job_resumes.iter_mut().find(|jr| jr.id == job_resume_id) {
            row.match_score = score;
        }
        Ok(())
    }

    async fn append_audit(&self, entry: NewAuditEntry) -> StoreResult<AuditEntry> {
        let stored = audit_row(&entry);
        self.tables.lock().unwrap().audit_logs.push(stored.clone());
        Ok(stored)
    }

    async fn find_audit_entry(
        &self,
        user_id: Uuid,
        audit_id: Uuid,
    ) -> StoreResult<Option<AuditEntry>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .audit_logs
            .iter()
            .find(|a| a.id == audit_id && tables.owns_resume(user_id, a.resume_id))
            .cloned())
    }

    async fn list_audit_entries(
        &self,
        user_id: Uuid,
        resume_id: Uuid,
    ) -> StoreResult<Vec<AuditEntry>> {
        let tables = self.tables.lock().unwrap();
        if !tables.owns_resume(user_id, resume_id) {
            return Ok(Vec::new());
        }
        Ok(tables
            .audit_logs
            .iter()
            .rev()
            .filter(|a| a.resume_id == resume_id)
            .cloned()
            .collect())
    }

    async fn update_job_stage(
        &self,
        job_id: Uuid,
        stage: &str,
        applied_date: Option<DateTime<Utc>>,
    ) -> StoreResult<JobRow> {
        let mut tables = self.tables.lock().unwrap();
        let job = tables
            .jobs
            .iter_mut()
            .find(|j| j.id == job_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        job.stage = stage.to_string();
        job.applied_date = applied_date;
        job.updated_at = Utc::now();
        Ok(job.clone())
    }
}

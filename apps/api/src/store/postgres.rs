use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use super::{JobLookup, ResumeStore, StoreResult};
use crate::models::audit::{AuditEntry, NewAuditEntry};
use crate::models::job::{JobResumeRow, JobRow};
use crate::models::resume::ResumeRow;

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Audit rows are INSERT-only. Never UPDATE or DELETE them.
async fn insert_audit(
    tx: &mut Transaction<'_, Postgres>,
    entry: &NewAuditEntry,
) -> StoreResult<AuditEntry> {
    sqlx::query_as::<_, AuditEntry>(
        r#"
        INSERT INTO audit_logs (id, resume_id, action, section, original, modified, metadata)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(entry.resume_id)
    .bind(entry.action.as_str())
    .bind(&entry.section)
    .bind(&entry.original)
    .bind(&entry.modified)
    .bind(Json(&entry.metadata))
    .fetch_one(&mut **tx)
    .await
}

#[async_trait]
impl ResumeStore for PgStore {
    async fn create_resume(
        &self,
        user_id: Uuid,
        title: &str,
        content: Value,
    ) -> StoreResult<ResumeRow> {
        let row = sqlx::query_as::<_, ResumeRow>(
            "INSERT INTO resumes (id, user_id, title, content) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(title)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        info!("Stored resume {} for user {}", row.id, user_id);
        Ok(row)
    }

    async fn find_resume(&self, user_id: Uuid, resume_id: Uuid) -> StoreResult<Option<ResumeRow>> {
        sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1 AND user_id = $2")
            .bind(resume_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_or_create_job(&self, lookup: JobLookup<'_>) -> StoreResult<JobRow> {
        let existing = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT * FROM jobs
            WHERE user_id = $1 AND title = $2 AND description = $3
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(lookup.user_id)
        .bind(lookup.title)
        .bind(lookup.description)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(job) = existing {
            return Ok(job);
        }

        let job = sqlx::query_as::<_, JobRow>(
            r#"
            INSERT INTO jobs (id, user_id, title, company, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(lookup.user_id)
        .bind(lookup.title)
        .bind(lookup.company)
        .bind(lookup.description)
        .fetch_one(&self.pool)
        .await?;

        info!("Created job {} '{}' for user {}", job.id, job.title, lookup.user_id);
        Ok(job)
    }

    async fn find_job(&self, user_id: Uuid, job_id: Uuid) -> StoreResult<Option<JobRow>> {
        sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1 AND user_id = $2")
            .bind(job_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn upsert_job_resume(
        &self,
        job_id: Uuid,
        resume_id: Uuid,
        content: Value,
        initial_score: Option<f64>,
    ) -> StoreResult<JobResumeRow> {
        sqlx::query_as::<_, JobResumeRow>(
            r#"
            INSERT INTO job_resumes (id, job_id, resume_id, optimized_content, initial_score)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (job_id, resume_id) DO UPDATE
            SET optimized_content = EXCLUDED.optimized_content,
                initial_score = EXCLUDED.initial_score,
                match_score = NULL,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(job_id)
        .bind(resume_id)
        .bind(content)
        .bind(initial_score)
        .fetch_one(&self.pool)
        .await
    }

    async fn find_job_resume(
        &self,
        user_id: Uuid,
        job_resume_id: Uuid,
    ) -> StoreResult<Option<JobResumeRow>> {
        sqlx::query_as::<_, JobResumeRow>(
            r#"
            SELECT jr.* FROM job_resumes jr
            JOIN resumes r ON r.id = jr.resume_id
            WHERE jr.id = $1 AND r.user_id = $2
            "#,
        )
        .bind(job_resume_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_job_resume_for(
        &self,
        user_id: Uuid,
        job_id: Uuid,
        resume_id: Uuid,
    ) -> StoreResult<Option<JobResumeRow>> {
        sqlx::query_as::<_, JobResumeRow>(
            r#"
            SELECT jr.* FROM job_resumes jr
            JOIN resumes r ON r.id = jr.resume_id
            WHERE jr.job_id = $1 AND jr.resume_id = $2 AND r.user_id = $3
            "#,
        )
        .bind(job_id)
        .bind(resume_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn save_job_resume_content(
        &self,
        job_resume_id: Uuid,
        content: Value,
        audit: Option<NewAuditEntry>,
    ) -> StoreResult<Option<AuditEntry>> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE job_resumes SET optimized_content = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(content)
        .bind(job_resume_id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        let stored = match audit {
            Some(entry) => Some(insert_audit(&mut tx, &entry).await?),
            None => None,
        };

        tx.commit().await?;
        Ok(stored)
    }

    async fn set_match_score(&self, job_resume_id: Uuid, score: Option<f64>) -> StoreResult<()> {
        sqlx::query("UPDATE job_resumes SET match_score = $1, updated_at = NOW() WHERE id = $2")
            .bind(score)
            .bind(job_resume_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn append_audit(&self, entry: NewAuditEntry) -> StoreResult<AuditEntry> {
        let mut tx = self.pool.begin().await?;
        let stored = insert_audit(&mut tx, &entry).await?;
        tx.commit().await?;
        Ok(stored)
    }

    async fn find_audit_entry(
        &self,
        user_id: Uuid,
        audit_id: Uuid,
    ) -> StoreResult<Option<AuditEntry>> {
        sqlx::query_as::<_, AuditEntry>(
            r#"
            SELECT a.* FROM audit_logs a
            JOIN resumes r ON r.id = a.resume_id
            WHERE a.id = $1 AND r.user_id = $2
            "#,
        )
        .bind(audit_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_audit_entries(
        &self,
        user_id: Uuid,
        resume_id: Uuid,
    ) -> StoreResult<Vec<AuditEntry>> {
        sqlx::query_as::<_, AuditEntry>(
            r#"
            SELECT a.* FROM audit_logs a
            JOIN resumes r ON r.id = a.resume_id
            WHERE a.resume_id = $1 AND r.user_id = $2
            ORDER BY a.created_at DESC
            "#,
        )
        .bind(resume_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn update_job_stage(
        &self,
        job_id: Uuid,
        stage: &str,
        applied_date: Option<DateTime<Utc>>,
    ) -> StoreResult<JobRow> {
        sqlx::query_as::<_, JobRow>(
            r#"
            UPDATE jobs SET stage = $1, applied_date = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(stage)
        .bind(applied_date)
        .bind(job_id)
        .fetch_one(&self.pool)
        .await
    }
}

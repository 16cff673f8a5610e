use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_JOB_TITLE: &str = "Untitled Position";
pub const DEFAULT_JOB_COMPANY: &str = "Unknown Company";
pub const STAGE_APPLIED: &str = "applied";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub stage: String,
    pub applied_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A resume tailored to one job. `optimized_content` holds the live document.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobResumeRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub resume_id: Uuid,
    pub optimized_content: Value,
    pub initial_score: Option<f64>,
    pub match_score: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

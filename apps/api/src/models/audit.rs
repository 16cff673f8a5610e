use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    AiOptimization,
    CustomOptimization,
    Revert,
    CareerTrackerPush,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::AiOptimization => "AI_OPTIMIZATION",
            AuditAction::CustomOptimization => "CUSTOM_OPTIMIZATION",
            AuditAction::Revert => "REVERT",
            AuditAction::CareerTrackerPush => "CAREER_TRACKER_PUSH",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AI_OPTIMIZATION" => Ok(AuditAction::AiOptimization),
            "CUSTOM_OPTIMIZATION" => Ok(AuditAction::CustomOptimization),
            "REVERT" => Ok(AuditAction::Revert),
            "CAREER_TRACKER_PUSH" => Ok(AuditAction::CareerTrackerPush),
            other => Err(format!("unknown audit action '{other}'")),
        }
    }
}

/// Which part of the live document an audit entry touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    Summary,
    Skills,
    Experience,
    Projects,
}

/// Structured view of the `metadata` column. Unknown keys are ignored on read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_type: Option<SectionType>,
    #[serde(default, alias = "projectId", skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverted_from_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_score: Option<f64>,
}

/// An audit entry that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub resume_id: Uuid,
    pub action: AuditAction,
    pub section: String,
    pub original: Option<String>,
    pub modified: Option<String>,
    pub metadata: AuditMetadata,
}

/// Stored audit entry. Rows are insert-only; nothing ever updates them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditEntry {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub action: String,
    pub section: String,
    pub original: Option<String>,
    pub modified: Option<String>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn metadata(&self) -> Result<AuditMetadata, serde_json::Error> {
        AuditMetadata::deserialize(&self.metadata)
    }

    pub fn action(&self) -> Option<AuditAction> {
        self.action.parse().ok()
    }
}

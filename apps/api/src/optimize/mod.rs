//! Optimization pipeline: score, rewrite section by section, persist each
//! rewrite with its audit entry, re-score. Also hosts single-entry rewrites
//! and revert.

pub mod handlers;
pub mod locks;
pub mod orchestrator;
pub mod revert;

use std::time::Duration;

use async_trait::async_trait;

use crate::llm_client::prompts::{build_rewrite_prompt, OPTIMIZER_SYSTEM};
use crate::llm_client::{LlmClient, LlmError};
use crate::scoring::DEFAULT_SCORE_CAP;

pub use locks::ResumeLocks;

/// Rewrites one section of a resume against a job description.
#[async_trait]
pub trait Rewriter: Send + Sync {
    async fn rewrite(
        &self,
        section_text: &str,
        job_description: &str,
        section_label: &str,
        custom_instruction: Option<&str>,
    ) -> Result<String, LlmError>;
}

#[async_trait]
impl Rewriter for LlmClient {
    async fn rewrite(
        &self,
        section_text: &str,
        job_description: &str,
        section_label: &str,
        custom_instruction: Option<&str>,
    ) -> Result<String, LlmError> {
        let prompt =
            build_rewrite_prompt(section_text, job_description, section_label, custom_instruction);
        self.complete(&prompt, OPTIMIZER_SYSTEM).await
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OptimizerSettings {
    pub call_timeout: Duration,
    pub score_cap: f64,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(30),
            score_cap: DEFAULT_SCORE_CAP,
        }
    }
}

/// One rewrite call, bounded by `timeout`.
pub async fn rewrite_with_timeout(
    rewriter: &dyn Rewriter,
    section_text: &str,
    job_description: &str,
    section_label: &str,
    custom_instruction: Option<&str>,
    timeout: Duration,
) -> Result<String, LlmError> {
    tokio::time::timeout(
        timeout,
        rewriter.rewrite(section_text, job_description, section_label, custom_instruction),
    )
    .await
    .map_err(|_| LlmError::Timeout(timeout))?
}

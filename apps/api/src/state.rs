use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;

use crate::config::Config;
use crate::optimize::{OptimizerSettings, ResumeLocks, Rewriter};
use crate::scoring::Embedder;
use crate::store::ResumeStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ResumeStore>,
    pub s3: S3Client,
    /// Embedding side of the AI client. Swappable for tests.
    pub embedder: Arc<dyn Embedder>,
    /// Rewrite side of the AI client. Swappable for tests.
    pub rewriter: Arc<dyn Rewriter>,
    pub config: Config,
    /// Serializes audit appends and reverts per resume.
    pub locks: ResumeLocks,
    pub optimizer: OptimizerSettings,
}

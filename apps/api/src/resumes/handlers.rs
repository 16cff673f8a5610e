//! Axum route handlers for resume upload, retrieval and export.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::export::{render_markdown, ExportDocument, ExportFormat};
use crate::errors::AppError;
use crate::models::resume::{ParsedResume, ResumeRow};
use crate::parser::decode::DocumentFormat;
use crate::parser::parse_resume_file;
use crate::parser::preview::{build_preview, UploadPreview};
use crate::state::AppState;
use crate::store::archive::{archive_upload, upload_key};

/// Upper bound on an uploaded document.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const DEFAULT_RESUME_TITLE: &str = "Untitled Resume";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct ExportQuery {
    pub user_id: Uuid,
    #[serde(default)]
    pub format: ExportFormat,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub resume_id: Uuid,
    pub title: String,
    pub preview: UploadPreview,
}

#[derive(Debug, Serialize)]
pub struct ResumeDetailResponse {
    pub resume: ResumeRow,
    pub parsed: ParsedResume,
}

#[derive(Default)]
struct UploadForm {
    bytes: Option<Bytes>,
    content_type: Option<String>,
    file_name: Option<String>,
    title: Option<String>,
    user_id: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let bad_form = |e: axum::extract::multipart::MultipartError| {
        AppError::Validation(format!("malformed multipart body: {e}"))
    };
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                form.content_type = field.content_type().map(str::to_string);
                form.file_name = field.file_name().map(str::to_string);
                form.bytes = Some(field.bytes().await.map_err(bad_form)?);
            }
            "title" => form.title = Some(field.text().await.map_err(bad_form)?),
            "user_id" => form.user_id = Some(field.text().await.map_err(bad_form)?),
            _ => {}
        }
    }
    Ok(form)
}

fn title_from(form: &UploadForm) -> String {
    form.title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .or_else(|| {
            form.file_name
                .as_deref()
                .map(|name| name.rsplit_once('.').map_or(name, |(stem, _)| stem))
                .filter(|stem| !stem.trim().is_empty())
        })
        .unwrap_or(DEFAULT_RESUME_TITLE)
        .to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes/upload
///
/// Multipart fields: `file` (PDF or DOCX), `user_id`, optional `title`.
/// Decodes, segments and redacts the document, stores it and returns a preview.
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let form = read_form(multipart).await?;

    let user_id = form
        .user_id
        .as_deref()
        .ok_or_else(|| AppError::Validation("user_id is required".to_string()))?
        .trim()
        .parse::<Uuid>()
        .map_err(|_| AppError::Validation("user_id must be a UUID".to_string()))?;
    let format = DocumentFormat::from_mime(
        form.content_type
            .as_deref()
            .unwrap_or("application/octet-stream"),
    )?;
    let title = title_from(&form);
    let bytes = form
        .bytes
        .filter(|b| !b.is_empty())
        .ok_or_else(|| AppError::Validation("file is required".to_string()))?;

    // Decoding is CPU bound
    let segmenter = state.config.segmenter.clone();
    let (parsed, bytes) = tokio::task::spawn_blocking(move || {
        let parsed = parse_resume_file(&bytes, format, &segmenter);
        (parsed, bytes)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("decode task failed: {e}")))?;

    let mut resume = parsed?;
    resume.assign_durable_ids();
    let preview = build_preview(&resume);

    let row = state
        .store
        .create_resume(user_id, &title, resume.to_value()?)
        .await?;
    info!(
        "Parsed upload '{}' into resume {} ({} sections, confidence {:.2})",
        title,
        row.id,
        preview.sections.len(),
        preview.metadata.confidence
    );

    let key = upload_key(user_id, row.id, format);
    if let Err(e) = archive_upload(&state.s3, &state.config.s3_bucket, &key, bytes, format).await {
        warn!("Resume {} stored but original upload not archived: {e}", row.id);
    }

    Ok(Json(UploadResponse {
        resume_id: row.id,
        title,
        preview,
    }))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ResumeDetailResponse>, AppError> {
    let resume = state
        .store
        .find_resume(params.user_id, resume_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {resume_id} not found")))?;
    let parsed = ParsedResume::from_value(resume.content.clone())?;
    Ok(Json(ResumeDetailResponse { resume, parsed }))
}

/// GET /api/v1/job-resumes/:id/export
///
/// `format=markdown` (default) returns `text/markdown`; `format=json` the
/// structured document.
pub async fn handle_export(
    State(state): State<AppState>,
    Path(job_resume_id): Path<Uuid>,
    Query(params): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let not_found = || AppError::NotFound(format!("Job resume {job_resume_id} not found"));

    let pairing = state
        .store
        .find_job_resume(params.user_id, job_resume_id)
        .await?
        .ok_or_else(not_found)?;
    let resume = state
        .store
        .find_resume(params.user_id, pairing.resume_id)
        .await?
        .ok_or_else(not_found)?;
    let job = state
        .store
        .find_job(params.user_id, pairing.job_id)
        .await?
        .ok_or_else(not_found)?;

    let doc = ExportDocument {
        job_resume_id,
        title: resume.title,
        job_title: job.title,
        company: job.company,
        match_score: pairing.match_score,
        content: ParsedResume::from_value(pairing.optimized_content)?,
    };

    Ok(match params.format {
        ExportFormat::Json => Json(doc).into_response(),
        ExportFormat::Markdown => (
            [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
            render_markdown(&doc),
        )
            .into_response(),
    })
}

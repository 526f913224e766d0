use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::error;

use crate::errors::AppError;
use crate::resume::models::{ResumeError, ResumeSummary};
use crate::resume::pipeline::ResumeUpload;
use crate::state::AppState;

const FILE_FIELD: &str = "file";

/// POST /api/ai/summarize-resume
///
/// Multipart form with a single `file` field (PDF, PNG or JPEG).
/// Every failure is a 400 with `{"error": "<message>"}`.
pub async fn handle_summarize_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ResumeSummary>, AppError> {
    let result = match read_upload(&mut multipart, state.config.max_file_mb).await {
        Ok(upload) => state.resume.summarize(upload).await,
        Err(e) => Err(e),
    };

    result.map(Json).map_err(|e| {
        error!("Resume summarization error: {e}");
        AppError::from(e)
    })
}

/// Pulls the `file` field out of the form; other fields are skipped.
async fn read_upload(multipart: &mut Multipart, max_file_mb: usize) -> Result<ResumeUpload, ResumeError> {
    let upload_error = |e: MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ResumeError::TooLarge { max_mb: max_file_mb }
        } else {
            ResumeError::Upload(e.body_text())
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let mime = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(upload_error)?;

        return Ok(ResumeUpload {
            bytes,
            filename,
            mime,
        });
    }

    Err(ResumeError::NoFile)
}

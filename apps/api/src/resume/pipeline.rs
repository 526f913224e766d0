//! Resume Normalizer pipeline: file-type dispatch, local text extraction or
//! multimodal upload, one model call, then JSON recovery and field coercion.
//!
//! Stateless: every call is independent and nothing is persisted.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use tracing::{info, warn};

use crate::llm_client::{FileUpload, InputPart, MessageContent, ModelProvider, ModelRequest};
use crate::resume::extract::{clean_extracted_text, truncate_chars, PdfTextExtractor};
use crate::resume::models::{ResumeError, ResumeSummary};
use crate::resume::normalize::{normalize_summary, parse_model_json};
use crate::resume::prompts::{plaintext_prompt, RESUME_STRUCTURE, RESUME_SYSTEM};

/// Below this many characters of extracted text the PDF goes to the provider as a file.
pub const MIN_PDF_TEXT_CHARS: usize = 80;
/// Extracted text is truncated to this many characters before prompting.
pub const MAX_PROMPT_TEXT_CHARS: usize = 18_000;
const DEFAULT_PDF_NAME: &str = "resume.pdf";

/// One uploaded file as received from the multipart form.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub bytes: Bytes,
    pub filename: Option<String>,
    pub mime: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Image,
}

/// Dispatch by declared MIME type. PDFs are also recognised by filename since
/// some browsers send `application/octet-stream`.
pub fn classify(mime: &str, filename: Option<&str>) -> Option<FileKind> {
    let mime = mime.trim().to_ascii_lowercase();
    let pdf_name = filename
        .map(|f| f.to_ascii_lowercase().ends_with("pdf"))
        .unwrap_or(false);

    if mime == "application/pdf" || pdf_name {
        Some(FileKind::Pdf)
    } else if matches!(mime.as_str(), "image/png" | "image/jpeg" | "image/jpg") {
        Some(FileKind::Image)
    } else {
        None
    }
}

/// The resume summarization pipeline. Cheap to clone; shared through `AppState`.
#[derive(Clone)]
pub struct ResumeNormalizer {
    provider: Arc<dyn ModelProvider>,
    extractor: Arc<dyn PdfTextExtractor>,
    max_file_mb: usize,
}

impl ResumeNormalizer {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        extractor: Arc<dyn PdfTextExtractor>,
        max_file_mb: usize,
    ) -> Self {
        Self {
            provider,
            extractor,
            max_file_mb,
        }
    }

    /// Validates the upload, routes it to the right model call and returns a
    /// summary that always satisfies the `ResumeSummary` constraints.
    pub async fn summarize(&self, upload: ResumeUpload) -> Result<ResumeSummary, ResumeError> {
        info!(
            file_name = upload.filename.as_deref().unwrap_or(""),
            mime = %upload.mime,
            size = upload.bytes.len(),
            "Summarizing resume"
        );

        if upload.bytes.len() > self.max_file_mb * 1024 * 1024 {
            return Err(ResumeError::TooLarge {
                max_mb: self.max_file_mb,
            });
        }

        let kind = classify(&upload.mime, upload.filename.as_deref())
            .ok_or(ResumeError::UnsupportedType)?;

        let output = match kind {
            FileKind::Pdf => self.summarize_pdf(&upload).await?,
            FileKind::Image => self.summarize_image(&upload).await?,
        };

        let raw = parse_model_json(&output)?;
        Ok(normalize_summary(&raw))
    }

    /// PDF: local text first; if it yields too little, upload the file itself.
    async fn summarize_pdf(&self, upload: &ResumeUpload) -> Result<String, ResumeError> {
        match self.extract_pdf_text(upload.bytes.clone()).await {
            Some(text) if text.chars().count() >= MIN_PDF_TEXT_CHARS => {
                info!(chars = text.chars().count(), "Using locally extracted PDF text");
                let prompt = plaintext_prompt(truncate_chars(&text, MAX_PROMPT_TEXT_CHARS));
                let request = ModelRequest {
                    system: RESUME_SYSTEM.to_string(),
                    user: MessageContent::Text(prompt),
                };
                return Ok(self.provider.respond(&request).await?);
            }
            Some(text) => warn!(
                chars = text.chars().count(),
                "PDF text extraction yielded too little text, falling back to file upload"
            ),
            None => warn!("PDF text extraction failed, falling back to file upload"),
        }

        let file_id = self
            .provider
            .upload_file(FileUpload {
                bytes: upload.bytes.clone(),
                filename: upload
                    .filename
                    .clone()
                    .filter(|f| !f.is_empty())
                    .unwrap_or_else(|| DEFAULT_PDF_NAME.to_string()),
                mime: "application/pdf".to_string(),
            })
            .await?;

        let request = ModelRequest {
            system: RESUME_SYSTEM.to_string(),
            user: MessageContent::Parts(vec![
                InputPart::text(RESUME_STRUCTURE),
                InputPart::file(file_id),
            ]),
        };
        Ok(self.provider.respond(&request).await?)
    }

    /// PNG/JPEG: inline the image as a base64 data URL.
    async fn summarize_image(&self, upload: &ResumeUpload) -> Result<String, ResumeError> {
        let data_url = format!(
            "data:{};base64,{}",
            upload.mime.trim().to_ascii_lowercase(),
            BASE64.encode(&upload.bytes)
        );
        let request = ModelRequest {
            system: RESUME_SYSTEM.to_string(),
            user: MessageContent::Parts(vec![
                InputPart::text(RESUME_STRUCTURE),
                InputPart::image(data_url),
            ]),
        };
        Ok(self.provider.respond(&request).await?)
    }

    /// Runs the extractor on the blocking pool. Errors and panics both yield `None`.
    async fn extract_pdf_text(&self, bytes: Bytes) -> Option<String> {
        let extractor = Arc::clone(&self.extractor);
        match tokio::task::spawn_blocking(move || extractor.extract_text(&bytes)).await {
            Ok(Ok(raw)) => Some(clean_extracted_text(&raw)),
            Ok(Err(e)) => {
                warn!("PDF text extraction error: {e}");
                None
            }
            Err(e) => {
                warn!("PDF text extraction panicked: {e}");
                None
            }
        }
    }
}

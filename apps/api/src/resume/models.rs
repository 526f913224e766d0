use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::AppError;
use crate::llm_client::LlmError;

/// Fixed-shape summary of one uploaded resume. Produced fresh per request,
/// never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeSummary {
    pub name: String,
    /// Lowercase, `local@domain.tld` shaped, or empty.
    pub email: String,
    pub short_description: String,
    /// At most 12 entries.
    pub skills: Vec<String>,
    pub university: String,
    /// -1 graduated, 0 unknown, 1..=8 current year of study.
    #[serde(rename = "yearOfStudy")]
    pub year_of_study: i32,
    #[serde(rename = "yearsExperience")]
    pub years_experience: u32,
}

/// Every way a resume summarization can fail. All are terminal for the request
/// and surface to the client as a 400 with the display text.
#[derive(Debug, Error)]
pub enum ResumeError {
    #[error("No file provided.")]
    NoFile,

    #[error("Failed to read upload: {0}")]
    Upload(String),

    #[error("File too large (max {max_mb}MB).")]
    TooLarge { max_mb: usize },

    #[error("Unsupported file type. Please upload a PDF, PNG, or JPG resume.")]
    UnsupportedType,

    #[error("{0}")]
    Provider(#[from] LlmError),

    #[error("Model did not return valid JSON")]
    InvalidJson,
}

impl From<ResumeError> for AppError {
    fn from(e: ResumeError) -> Self {
        AppError::Validation(e.to_string())
    }
}

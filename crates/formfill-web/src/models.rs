//! Request/response shapes for the JSON API.

use axum::http::StatusCode;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use formfill_core::{ExtractionMode, FieldDescriptor, FieldMapping, SourceDocument};
use formfill_match::MatchError;

/// How much extracted text the response echoes back (a debugging aid for
/// the extension; the full text never leaves the request lifetime).
const TEXT_PREVIEW_CHARS: usize = 500;

/// One document in the batch upload shape.
#[derive(Debug, Deserialize)]
pub struct FilePayload {
    #[serde(default)]
    pub name: Option<String>,
    pub file_base64: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProcessFileRequest {
    /// Single-file shape. Ignored when `files` is non-empty.
    #[serde(default)]
    pub file_base64: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Batch shape: every document contributes to one combined text.
    #[serde(default)]
    pub files: Vec<FilePayload>,
    pub form_fields: Vec<FieldDescriptor>,
    /// Per-request credential; overrides the server-side default key.
    #[serde(default)]
    pub openai_api_key: Option<String>,
    /// Extraction mode; the server default applies when absent.
    #[serde(default)]
    pub ocr_mode: Option<ExtractionMode>,
}

impl ProcessFileRequest {
    /// Decode the upload into source documents. The batch shape wins over
    /// the single-file one; an empty result means the caller sent neither.
    pub fn documents(&self) -> Result<Vec<SourceDocument>, base64::DecodeError> {
        if !self.files.is_empty() {
            return self
                .files
                .iter()
                .map(|f| {
                    let bytes = BASE64.decode(f.file_base64.trim())?;
                    let mut doc = SourceDocument::new(bytes);
                    if let Some(name) = &f.name {
                        doc = doc.with_name(name.clone());
                    }
                    if let Some(mime) = &f.mime_type {
                        doc = doc.with_mime(mime.clone());
                    }
                    Ok(doc)
                })
                .collect();
        }

        match &self.file_base64 {
            Some(encoded) => {
                let bytes = BASE64.decode(encoded.trim())?;
                let mut doc = SourceDocument::new(bytes);
                if let Some(mime) = &self.mime_type {
                    doc = doc.with_mime(mime.clone());
                }
                Ok(vec![doc])
            }
            None => Ok(Vec::new()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProcessFileResponse {
    pub success: bool,
    pub mappings: Vec<FieldMapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessFileResponse {
    pub fn ok(mappings: Vec<FieldMapping>, extracted_text: &str) -> Self {
        Self {
            success: true,
            mappings,
            extracted_text: Some(extracted_text.chars().take(TEXT_PREVIEW_CHARS).collect()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            mappings: Vec::new(),
            extracted_text: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Map a matching failure onto the status the extension distinguishes on.
pub fn status_for(err: &MatchError) -> StatusCode {
    match err {
        MatchError::MissingApiKey | MatchError::Auth => StatusCode::UNAUTHORIZED,
        MatchError::Connectivity(_) => StatusCode::SERVICE_UNAVAILABLE,
        MatchError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        // Handled before the matcher runs; kept total for safety.
        MatchError::NoExtractedText => StatusCode::OK,
        MatchError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

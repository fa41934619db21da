use serde::{Deserialize, Serialize};

pub mod backend;
pub mod capabilities;
pub mod config_file;
pub mod detect;

// Re-export for convenience
pub use backend::{BackendError, OcrBackend, PdfBackend, StructuredBackend, StructuredPage, TableBlock};
pub use capabilities::{Capabilities, supported_formats};
pub use config_file::{ConfigFile, Settings};
pub use detect::{DocumentKind, detect_kind};

/// How the extraction engine should trade latency for fidelity.
///
/// `Fast` is best-effort plain OCR; `Structured` goes through the
/// layout-aware analyzer (when available) and preserves table structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    #[default]
    Fast,
    Structured,
}

impl ExtractionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Structured => "structured",
        }
    }
}

fn default_field_type() -> String {
    "text".to_string()
}

/// One form field the caller wants filled, as scraped from the page.
///
/// Read-only input; `id` is caller-assigned and must be unique within a
/// request. `options` carries the allowed values for select/radio-style
/// fields and constrains the matcher to an exact member of the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl FieldDescriptor {
    /// Display name for the field: label when present, name otherwise.
    pub fn display_name(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.name
        } else {
            &self.label
        }
    }
}

/// The matcher's best-guess value for one [`FieldDescriptor`].
///
/// `value == ""` means "no match". The output list always has the same
/// length and order as the input descriptor list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    #[serde(rename = "fieldId", default)]
    pub field_id: String,
    #[serde(rename = "fieldName", default)]
    pub field_name: String,
    #[serde(rename = "fieldType", default = "default_field_type")]
    pub field_type: String,
    #[serde(default)]
    pub value: String,
}

impl FieldMapping {
    /// The empty ("no match") mapping for a descriptor.
    pub fn empty_for(field: &FieldDescriptor) -> Self {
        Self {
            field_id: field.id.clone(),
            field_name: field.display_name().to_string(),
            field_type: if field.field_type.trim().is_empty() {
                default_field_type()
            } else {
                field.field_type.clone()
            },
            value: String::new(),
        }
    }
}

/// A document submitted for extraction. Immutable once received and scoped
/// to a single request; never persisted.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Original filename, used to annotate multi-document output.
    pub name: Option<String>,
    pub bytes: Vec<u8>,
    /// Caller-declared MIME type. Takes precedence over byte sniffing when
    /// it names a kind we understand.
    pub declared_mime: Option<String>,
}

impl SourceDocument {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            name: None,
            bytes,
            declared_mime: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.declared_mime = Some(mime.into());
        self
    }

    /// Resolve the document kind: declared MIME wins, bytes otherwise.
    pub fn kind(&self) -> DocumentKind {
        self.declared_mime
            .as_deref()
            .and_then(DocumentKind::from_mime)
            .unwrap_or_else(|| detect_kind(&self.bytes))
    }
}

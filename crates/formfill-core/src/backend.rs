//! Extraction backend traits.
//!
//! The engine in `formfill-extract` drives these; implementations live in
//! their own crates (`formfill-pdf-mupdf`) or modules so that heavyweight
//! dependencies stay out of code paths that do not need them.

use std::path::Path;

use image::RgbImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    /// The input bytes could not be decoded at all. This is the one
    /// backend failure the engine does not degrade on.
    #[error("failed to open document: {0}")]
    Open(String),
    #[error("extraction failed: {0}")]
    Extraction(String),
    /// An optional backend is not installed or not configured.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// PDF operations: structural text-layer extraction and page rasterization.
pub trait PdfBackend: Send + Sync {
    /// Extract the embedded text layer without rendering. An empty string
    /// is a valid result and means "scanned / image-only PDF".
    fn extract_text(&self, bytes: &[u8]) -> Result<String, BackendError>;

    /// Render every page to an RGB bitmap, upscaled by `scale` for better
    /// OCR accuracy.
    fn render_pages(&self, bytes: &[u8], scale: f32) -> Result<Vec<RgbImage>, BackendError>;
}

/// Plain-text OCR over a decoded bitmap.
pub trait OcrBackend: Send + Sync {
    fn recognize(&self, image: &RgbImage) -> Result<String, BackendError>;
}

/// A detected table from the layout-aware analyzer.
///
/// Analyzers that expose a typed cell model report `Rows`; `Html` is kept
/// as a fallback for analyzers that only emit an HTML rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableBlock {
    Rows(Vec<Vec<String>>),
    Html(String),
}

/// One page from the layout-aware analyzer: reading-order text followed by
/// the tables detected on that page.
#[derive(Debug, Clone, Default)]
pub struct StructuredPage {
    pub text: String,
    pub tables: Vec<TableBlock>,
}

/// Layout/table-aware document analysis.
///
/// The analyzer consumes a file path rather than in-memory bytes; callers
/// are responsible for staging temp files and removing them on every exit
/// path.
pub trait StructuredBackend: Send + Sync {
    fn analyze(&self, path: &Path) -> Result<Vec<StructuredPage>, BackendError>;
}

//! Strategy selection, fallback chain and multi-document concatenation.

use std::sync::Arc;

use image::RgbImage;
use tracing::{debug, warn};

use formfill_core::{
    BackendError, Capabilities, DocumentKind, ExtractionMode, OcrBackend, PdfBackend,
    SourceDocument, StructuredBackend, supported_formats,
};

use crate::ExtractError;
use crate::table;

/// Upscale factor applied when rasterizing PDF pages for OCR.
pub const RENDER_SCALE: f32 = 2.0;

/// One extraction strategy, in the order the chain may attempt them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    DirectText,
    StructuredOcr,
    RasterOcr,
}

/// Decide the ordered strategy chain for one document.
///
/// Pure decision table over (kind, mode, structured availability). The
/// engine runs the chain and stops at the first non-empty result, so a
/// Structured request with the analyzer missing collapses to exactly the
/// Fast chain.
pub fn plan(kind: DocumentKind, mode: ExtractionMode, structured_available: bool) -> Vec<Strategy> {
    let mut chain = Vec::new();
    if kind == DocumentKind::Pdf {
        chain.push(Strategy::DirectText);
    }
    if mode == ExtractionMode::Structured && structured_available {
        chain.push(Strategy::StructuredOcr);
    }
    chain.push(Strategy::RasterOcr);
    chain
}

/// The extraction engine. Holds one backend per concern; optional backends
/// are resolved once at construction (production constructors read the
/// process-wide probes).
pub struct ExtractionEngine {
    pdf: Arc<dyn PdfBackend>,
    ocr: Option<Arc<dyn OcrBackend>>,
    structured: Option<Arc<dyn StructuredBackend>>,
}

impl ExtractionEngine {
    /// Build the production engine: MuPDF for PDFs, the discovered
    /// tesseract binary for raster OCR, and the structured analyzer if its
    /// probe succeeded. Missing optional backends are capability flags,
    /// not errors.
    #[cfg(feature = "pdf")]
    pub fn from_settings(settings: &formfill_core::Settings) -> Self {
        let ocr = crate::raster::TesseractOcr::discover(settings.tesseract_path.as_deref())
            .map(|t| Arc::new(t) as Arc<dyn OcrBackend>);
        if ocr.is_none() {
            warn!("tesseract not found; raster OCR disabled for this process");
        }
        let structured =
            crate::structured::probe(settings.structured_cmd.as_deref()).map(|a| a as Arc<dyn StructuredBackend>);

        Self {
            pdf: Arc::new(formfill_pdf_mupdf::MupdfBackend::new()),
            ocr,
            structured,
        }
    }

    /// Build an engine from explicit backends (tests inject stand-ins here).
    pub fn with_backends(
        pdf: Arc<dyn PdfBackend>,
        ocr: Option<Arc<dyn OcrBackend>>,
        structured: Option<Arc<dyn StructuredBackend>>,
    ) -> Self {
        Self {
            pdf,
            ocr,
            structured,
        }
    }

    /// Capability report for the boundary layer, computed from the probes
    /// and the detector's signature table.
    pub fn capabilities(&self, default_mode: ExtractionMode) -> Capabilities {
        Capabilities {
            raster_available: self.ocr.is_some(),
            structured_available: self.structured.is_some(),
            default_mode,
            supported_formats: supported_formats(),
        }
    }

    /// Extract text from one document.
    ///
    /// Returns `Ok("")` when no strategy produced text — an empty terminal
    /// result, not an error. Fails only when the input bytes cannot be
    /// decoded as the resolved kind.
    pub fn extract(&self, doc: &SourceDocument, mode: ExtractionMode) -> Result<String, ExtractError> {
        let kind = doc.kind();

        // Outermost decode step: malformed image bytes are a caller error.
        // (For PDFs the equivalent check is the backend's open step below.)
        let bitmap = if kind.is_image() {
            Some(decode_image(&doc.bytes)?)
        } else {
            None
        };

        for strategy in plan(kind, mode, self.structured.is_some()) {
            match self.run(strategy, doc, kind, bitmap.as_ref()) {
                Ok(text) if !text.trim().is_empty() => {
                    debug!(?strategy, chars = text.len(), "extraction strategy succeeded");
                    return Ok(text);
                }
                Ok(_) => {
                    debug!(?strategy, "strategy produced no text, trying next");
                }
                Err(BackendError::Open(e)) => return Err(ExtractError::Decode(e)),
                Err(e) => {
                    warn!(?strategy, error = %e, "strategy failed, degrading to next");
                }
            }
        }

        Ok(String::new())
    }

    /// Extract text from every document and concatenate the results.
    ///
    /// With more than one document, each non-empty segment is prefixed with
    /// a filename annotation. Documents yielding no text contribute nothing.
    /// All-empty input yields `Ok("")`.
    pub fn extract_all(
        &self,
        docs: &[SourceDocument],
        mode: ExtractionMode,
    ) -> Result<String, ExtractError> {
        let annotate = docs.len() > 1;
        let mut segments = Vec::new();

        for (i, doc) in docs.iter().enumerate() {
            let text = self.extract(doc, mode)?;
            if text.trim().is_empty() {
                continue;
            }
            if annotate {
                let name = doc
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("document {}", i + 1));
                segments.push(format!("--- Content from: {name} ---\n{text}"));
            } else {
                segments.push(text);
            }
        }

        Ok(segments.join("\n\n"))
    }

    fn run(
        &self,
        strategy: Strategy,
        doc: &SourceDocument,
        kind: DocumentKind,
        bitmap: Option<&RgbImage>,
    ) -> Result<String, BackendError> {
        match strategy {
            Strategy::DirectText => self.pdf.extract_text(&doc.bytes),
            Strategy::RasterOcr => self.run_raster(doc, kind, bitmap),
            Strategy::StructuredOcr => self.run_structured(doc, kind),
        }
    }

    fn run_raster(
        &self,
        doc: &SourceDocument,
        kind: DocumentKind,
        bitmap: Option<&RgbImage>,
    ) -> Result<String, BackendError> {
        let ocr = self
            .ocr
            .as_ref()
            .ok_or_else(|| BackendError::Unavailable("no OCR backend".into()))?;

        match bitmap {
            // Image input: OCR the decoded bitmap directly.
            Some(img) => ocr.recognize(img),
            // PDF input: rasterize each page, OCR them, join with newlines.
            None => {
                debug_assert_eq!(kind, DocumentKind::Pdf);
                let pages = self.pdf.render_pages(&doc.bytes, RENDER_SCALE)?;
                let mut parts = Vec::with_capacity(pages.len());
                for page in &pages {
                    parts.push(ocr.recognize(page)?);
                }
                Ok(parts.join("\n"))
            }
        }
    }

    fn run_structured(&self, doc: &SourceDocument, kind: DocumentKind) -> Result<String, BackendError> {
        let structured = self
            .structured
            .as_ref()
            .ok_or_else(|| BackendError::Unavailable("no structured backend".into()))?;

        // The analyzer consumes a file path; stage the bytes in a temp dir
        // that is removed on every exit path (including panics) via Drop.
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(format!("input.{}", kind.extension()));
        std::fs::write(&path, &doc.bytes)?;

        let pages = structured.analyze(&path)?;
        Ok(table::linearize_pages(&pages))
    }
}

fn decode_image(bytes: &[u8]) -> Result<RgbImage, ExtractError> {
    let img = image::load_from_memory(bytes).map_err(|e| ExtractError::Decode(e.to_string()))?;
    // OCR backends expect RGB; flatten palettes/alpha/grayscale here.
    Ok(img.to_rgb8())
}

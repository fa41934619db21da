use image::RgbImage;
use mupdf::{Colorspace, Document, Matrix, TextPageFlags};

use formfill_core::{BackendError, PdfBackend};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// Lives in its own crate to keep the AGPL-3.0 mupdf dependency out of
/// code paths that never touch a PDF.
///
/// Text extraction walks the structural text layer block by block, so
/// born-digital PDFs never touch the OCR pipeline. Rasterization renders
/// each page through the same engine the OCR fallback feeds on.
#[derive(Debug, Default, Clone)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }
}

fn open(bytes: &[u8]) -> Result<Document, BackendError> {
    Document::from_bytes(bytes, "pdf").map_err(|e| BackendError::Open(e.to_string()))
}

impl PdfBackend for MupdfBackend {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, BackendError> {
        let document = open(bytes)?;

        let mut pages_text = Vec::new();
        for page_result in document
            .pages()
            .map_err(|e| BackendError::Extraction(e.to_string()))?
        {
            let page = page_result.map_err(|e| BackendError::Extraction(e.to_string()))?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(|e| BackendError::Extraction(e.to_string()))?;

            let mut page_text = String::new();
            for block in text_page.blocks() {
                for line in block.lines() {
                    let line_text: String = line
                        .chars()
                        .map(|c| c.char().unwrap_or('\u{FFFD}'))
                        .collect();
                    page_text.push_str(&line_text);
                    page_text.push('\n');
                }
            }
            pages_text.push(page_text);
        }

        Ok(pages_text.join("\n"))
    }

    fn render_pages(&self, bytes: &[u8], scale: f32) -> Result<Vec<RgbImage>, BackendError> {
        let document = open(bytes)?;
        let matrix = Matrix::new_scale(scale, scale);
        let colorspace = Colorspace::device_rgb();

        let mut images = Vec::new();
        for page_result in document
            .pages()
            .map_err(|e| BackendError::Extraction(e.to_string()))?
        {
            let page = page_result.map_err(|e| BackendError::Extraction(e.to_string()))?;
            let pixmap = page
                .to_pixmap(&matrix, &colorspace, false, false)
                .map_err(|e| BackendError::Extraction(e.to_string()))?;

            let width = pixmap.width() as u32;
            let height = pixmap.height() as u32;
            let samples = pixmap.samples().to_vec();
            let img = RgbImage::from_raw(width, height, samples).ok_or_else(|| {
                BackendError::Extraction(format!(
                    "pixmap sample buffer does not match {width}x{height} RGB"
                ))
            })?;
            images.push(img);
        }

        Ok(images)
    }
}

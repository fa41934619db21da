//! Document text extraction engine.
//!
//! Turns submitted documents (PDF or raster image) into plain text by
//! selecting among three strategies per document:
//!
//! 1. **DirectText** — a PDF's embedded text layer, no rendering. Always
//!    tried first for PDFs regardless of the requested mode.
//! 2. **RasterOCR** — OCR over rendered page bitmaps (or the decoded image).
//! 3. **StructuredOCR** — a layout-aware analyzer that preserves reading
//!    order and linearizes tables.
//!
//! Strategy failures degrade to the next strategy in the chain rather than
//! aborting; only malformed input bytes fail hard.

use thiserror::Error;

pub mod engine;
pub mod raster;
pub mod structured;
pub mod table;

// Re-export domain types for convenience
pub use engine::{ExtractionEngine, RENDER_SCALE, Strategy, plan};
pub use formfill_core::{ExtractionMode, SourceDocument};
pub use raster::TesseractOcr;
pub use structured::AnalyzerCli;
pub use table::{PAGE_SEPARATOR, TABLE_CLOSE, TABLE_OPEN};

#[derive(Error, Debug)]
pub enum ExtractError {
    /// The input bytes could not be decoded as the resolved document kind.
    /// A caller error; never degraded over.
    #[error("could not decode input bytes: {0}")]
    Decode(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

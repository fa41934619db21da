//! Capability reporting consumed by the boundary layer.

use serde::Serialize;

use crate::ExtractionMode;
use crate::detect::DocumentKind;

/// What this process can do right now, computed from the signature table
/// and the backend probes rather than hardcoded.
#[derive(Debug, Clone, Serialize)]
pub struct Capabilities {
    pub raster_available: bool,
    pub structured_available: bool,
    pub default_mode: ExtractionMode,
    pub supported_formats: Vec<String>,
}

/// Supported file extensions (dotted), derived from the detector's kinds.
pub fn supported_formats() -> Vec<String> {
    DocumentKind::ALL
        .iter()
        .map(|k| format!(".{}", k.extension()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_follow_the_signature_table() {
        let formats = supported_formats();
        assert_eq!(formats.len(), DocumentKind::ALL.len());
        assert_eq!(formats[0], ".pdf");
        assert!(formats.contains(&".webp".to_string()));
        assert!(formats.iter().all(|f| f.starts_with('.')));
    }
}

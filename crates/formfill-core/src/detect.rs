//! Content-signature file type detection.
//!
//! Classification looks only at fixed-offset magic bytes; a caller-declared
//! content-type label is never trusted when bytes are available (that
//! resolution lives on [`SourceDocument::kind`](crate::SourceDocument::kind),
//! which consults the declared MIME first by design of the request schema).

/// The document kinds the extraction engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Pdf,
    Png,
    Jpeg,
    Webp,
    Gif,
    Bmp,
    Tiff,
}

impl DocumentKind {
    /// All supported kinds, in capability-report order.
    pub const ALL: [DocumentKind; 7] = [
        DocumentKind::Pdf,
        DocumentKind::Png,
        DocumentKind::Jpeg,
        DocumentKind::Webp,
        DocumentKind::Gif,
        DocumentKind::Bmp,
        DocumentKind::Tiff,
    ];

    pub fn is_image(&self) -> bool {
        !matches!(self, DocumentKind::Pdf)
    }

    /// Canonical file extension (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Png => "png",
            DocumentKind::Jpeg => "jpg",
            DocumentKind::Webp => "webp",
            DocumentKind::Gif => "gif",
            DocumentKind::Bmp => "bmp",
            DocumentKind::Tiff => "tiff",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Png => "image/png",
            DocumentKind::Jpeg => "image/jpeg",
            DocumentKind::Webp => "image/webp",
            DocumentKind::Gif => "image/gif",
            DocumentKind::Bmp => "image/bmp",
            DocumentKind::Tiff => "image/tiff",
        }
    }

    /// Parse a caller-declared MIME type. Returns `None` for anything we do
    /// not recognize so the caller can fall back to byte sniffing.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.trim().to_ascii_lowercase();
        // Strip parameters like "; charset=binary"
        let mime = mime.split(';').next().unwrap_or("").trim().to_string();
        match mime.as_str() {
            "application/pdf" | "application/x-pdf" => Some(DocumentKind::Pdf),
            "image/png" => Some(DocumentKind::Png),
            "image/jpeg" | "image/jpg" => Some(DocumentKind::Jpeg),
            "image/webp" => Some(DocumentKind::Webp),
            "image/gif" => Some(DocumentKind::Gif),
            "image/bmp" | "image/x-bmp" | "image/x-ms-bmp" => Some(DocumentKind::Bmp),
            "image/tiff" | "image/tif" => Some(DocumentKind::Tiff),
            _ => None,
        }
    }
}

/// Classify raw bytes by magic number.
///
/// Signatures are checked in priority order. Unmatched input degrades to
/// [`DocumentKind::Pdf`] (the dominant caller intent) rather than failing;
/// there is deliberately no error path here.
pub fn detect_kind(bytes: &[u8]) -> DocumentKind {
    if bytes.starts_with(b"%PDF") {
        return DocumentKind::Pdf;
    }
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return DocumentKind::Png;
    }
    if bytes.starts_with(&[0xFF, 0xD8]) {
        return DocumentKind::Jpeg;
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return DocumentKind::Gif;
    }
    if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        return DocumentKind::Webp;
    }
    if bytes.starts_with(b"BM") {
        return DocumentKind::Bmp;
    }
    // TIFF: little-endian "II*\0" or big-endian "MM\0*"
    if bytes.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || bytes.starts_with(&[0x4D, 0x4D, 0x00, 0x2A]) {
        return DocumentKind::Tiff;
    }
    DocumentKind::Pdf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_signatures() {
        assert_eq!(detect_kind(b"%PDF-1.4 rest"), DocumentKind::Pdf);
        assert_eq!(
            detect_kind(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00]),
            DocumentKind::Png
        );
        assert_eq!(detect_kind(&[0xFF, 0xD8, 0xFF, 0xE0]), DocumentKind::Jpeg);
        assert_eq!(detect_kind(b"GIF87a......"), DocumentKind::Gif);
        assert_eq!(detect_kind(b"GIF89a......"), DocumentKind::Gif);
        assert_eq!(detect_kind(b"RIFF\x10\x00\x00\x00WEBPVP8 "), DocumentKind::Webp);
        assert_eq!(detect_kind(b"BM\x00\x00"), DocumentKind::Bmp);
        assert_eq!(detect_kind(&[0x49, 0x49, 0x2A, 0x00]), DocumentKind::Tiff);
        assert_eq!(detect_kind(&[0x4D, 0x4D, 0x00, 0x2A]), DocumentKind::Tiff);
    }

    #[test]
    fn unrecognized_defaults_to_pdf() {
        assert_eq!(detect_kind(b""), DocumentKind::Pdf);
        assert_eq!(detect_kind(b"hello world"), DocumentKind::Pdf);
        // RIFF without the WEBP fourcc is not webp
        assert_eq!(detect_kind(b"RIFF\x10\x00\x00\x00WAVEfmt "), DocumentKind::Pdf);
        // Truncated PNG signature
        assert_eq!(detect_kind(&[0x89, b'P', b'N']), DocumentKind::Pdf);
    }

    #[test]
    fn mime_round_trips() {
        for kind in DocumentKind::ALL {
            assert_eq!(DocumentKind::from_mime(kind.mime()), Some(kind));
        }
        assert_eq!(DocumentKind::from_mime("IMAGE/JPEG; charset=binary"), Some(DocumentKind::Jpeg));
        assert_eq!(DocumentKind::from_mime("text/html"), None);
    }
}

//! Raster OCR via the system `tesseract` binary.
//!
//! The binary is located once per process: an explicitly configured path
//! wins, then `PATH`, then the usual per-platform install locations. A
//! missing binary is a capability flag, not an error — extraction degrades
//! to the empty-text result instead.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::RgbImage;
use once_cell::sync::OnceCell;
use tracing::info;

use formfill_core::{BackendError, OcrBackend};

static TESSERACT: OnceCell<Option<PathBuf>> = OnceCell::new();

#[cfg(target_os = "windows")]
fn platform_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![
        PathBuf::from(r"C:\Program Files\Tesseract-OCR\tesseract.exe"),
        PathBuf::from(r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe"),
        PathBuf::from(r"C:\ProgramData\chocolatey\bin\tesseract.exe"),
    ];
    if let Ok(local) = std::env::var("LOCALAPPDATA") {
        candidates.push(PathBuf::from(&local).join(r"Programs\Tesseract-OCR\tesseract.exe"));
        candidates.push(PathBuf::from(&local).join(r"Tesseract-OCR\tesseract.exe"));
    }
    if let Ok(profile) = std::env::var("USERPROFILE") {
        candidates.push(PathBuf::from(&profile).join(r"scoop\apps\tesseract\current\tesseract.exe"));
    }
    candidates
}

#[cfg(target_os = "macos")]
fn platform_candidates() -> Vec<PathBuf> {
    vec![
        PathBuf::from("/usr/local/bin/tesseract"),
        PathBuf::from("/opt/homebrew/bin/tesseract"),
        PathBuf::from("/usr/bin/tesseract"),
    ]
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn platform_candidates() -> Vec<PathBuf> {
    vec![
        PathBuf::from("/usr/bin/tesseract"),
        PathBuf::from("/usr/local/bin/tesseract"),
        PathBuf::from("/snap/bin/tesseract"),
    ]
}

#[cfg(target_os = "windows")]
const BINARY_NAME: &str = "tesseract.exe";
#[cfg(not(target_os = "windows"))]
const BINARY_NAME: &str = "tesseract";

fn search_path() -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(BINARY_NAME))
        .find(|candidate| candidate.is_file())
}

fn discover_binary(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
    }
    if let Some(found) = search_path() {
        return Some(found);
    }
    platform_candidates().into_iter().find(|p| p.is_file())
}

/// Locate the tesseract binary, probing at most once per process.
pub fn find_tesseract(configured: Option<&Path>) -> Option<PathBuf> {
    TESSERACT
        .get_or_init(|| {
            let found = discover_binary(configured);
            match &found {
                Some(path) => info!(path = %path.display(), "tesseract found"),
                None => info!("tesseract not found; raster OCR unavailable"),
            }
            found
        })
        .clone()
}

/// [`OcrBackend`] backed by the tesseract executable.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: PathBuf,
}

impl TesseractOcr {
    /// Probe for the binary; `None` means raster OCR is unavailable.
    pub fn discover(configured: Option<&Path>) -> Option<Self> {
        find_tesseract(configured).map(|binary| Self { binary })
    }

    /// Use a specific binary without probing (tests, unusual installs).
    pub fn at(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl OcrBackend for TesseractOcr {
    fn recognize(&self, image: &RgbImage) -> Result<String, BackendError> {
        // tesseract reads files, not pipes; stage a PNG that Drop removes
        // on every exit path.
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("page.png");
        image
            .save(&input)
            .map_err(|e| BackendError::Extraction(format!("cannot write OCR input: {e}")))?;

        let output = Command::new(&self.binary)
            .arg(&input)
            .arg("stdout")
            .output()?;

        if !output.status.success() {
            return Err(BackendError::Extraction(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
